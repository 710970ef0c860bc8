use crate::config::DashboardConfig;
use crate::render::OutputFormat;
use crate::view::ViewRequest;
use clap::Parser;
use infraview_model::{AlertFilter, TrackedMetric, View};
use std::path::PathBuf;
use std::str::FromStr;
use strum::VariantNames;

#[derive(Debug, Parser)]
#[command(about, version, long_about = None)]
pub struct DashboardCli {
    /// Path to a TOML config file. Every key is optional.
    #[arg(long, env = "INFRAVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// A CSV file to load metrics from.
    ///
    /// Can be given multiple times, sources are concatenated in order. Replaces the sources from
    /// the config file.
    #[arg(long = "source", short)]
    pub sources: Vec<PathBuf>,

    /// Seconds to wait between two refresh cycles, at least 1.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_interval: Option<u64>,

    /// Run a single refresh cycle and exit, failing if the cycle failed.
    #[arg(long, alias = "once", default_value = "false")]
    pub no_auto_refresh: bool,

    /// The view to show: dashboard, summary, cpu, memory, disk, network, processes or alerts.
    #[arg(long, default_value = "dashboard", value_parser = parse_named::<View>)]
    pub view: View,

    /// The host to show, defaults to the first host found.
    #[arg(long)]
    pub host: Option<String>,

    /// Which alerts to list on the alerts view: all, critical or warning.
    #[arg(long, default_value = "all", value_parser = parse_named::<AlertFilter>)]
    pub alert_filter: AlertFilter,

    /// Metric to sort alerts by: cpu_percent, memory_percent or disk_percent.
    #[arg(long, default_value = "cpu_percent", value_parser = parse_named::<TrackedMetric>)]
    pub sort_by: TrackedMetric,

    /// Host whose history is shown on the alerts view, defaults to the first listed alert.
    #[arg(long)]
    pub history_host: Option<String>,

    /// Output format: table or json.
    #[arg(long, default_value = "table", value_parser = parse_named::<OutputFormat>)]
    pub format: OutputFormat,
}

impl DashboardCli {
    /// Apply the command line overrides to a loaded config.
    pub fn apply(&self, mut config: DashboardConfig) -> DashboardConfig {
        if !self.sources.is_empty() {
            config = config.sources(self.sources.clone());
        }
        if let Some(seconds) = self.refresh_interval {
            config = config.refresh_interval_seconds(seconds);
        }
        if self.no_auto_refresh {
            config = config.auto_refresh(false);
        }
        config
    }

    pub fn request(&self) -> ViewRequest {
        ViewRequest {
            view: self.view,
            host: self.host.clone(),
            alert_filter: self.alert_filter,
            sort_by: self.sort_by,
            history_host: self.history_host.clone(),
        }
    }
}

fn parse_named<T>(s: &str) -> anyhow::Result<T>
where
    T: FromStr + VariantNames,
{
    T::from_str(s).map_err(|_| {
        anyhow::anyhow!(
            "Unknown value `{s}`, expected one of: {}",
            T::VARIANTS.join(", ")
        )
    })
}
