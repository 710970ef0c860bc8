use anyhow::Context;
use clap::Parser;
use infraview_dashboard::cli::DashboardCli;
use infraview_dashboard::{DashboardConfig, render, run};
use log::{debug, info};

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::try_init()?;

    let args = DashboardCli::try_parse()?;
    info!("{CRATE_NAME} {CRATE_VERSION}");

    let config = match &args.config {
        Some(path) => {
            info!("Using config file: {}", path.display());
            DashboardConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => DashboardConfig::default(),
    };
    let config = args.apply(config);
    let request = args.request();

    info!(
        "Using sources: {}",
        config
            .sources
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    debug!("Config: {config:?}");
    debug!("Request: {request:?}");

    run(&config, &request, |outcome| {
        println!("{}", render(outcome, args.format)?);
        Ok(())
    })
}
