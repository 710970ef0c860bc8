use infraview_model::MetricField;
use itertools::Itertools;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors which abort a refresh cycle.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No data available: none of the configured sources could be loaded")]
    NoDataAvailable,
    #[error(
        "Missing required columns: [{}]. Available columns: [{}]",
        .fields.iter().join(", "),
        .available.iter().join(", ")
    )]
    MissingRequiredColumn {
        fields: Vec<MetricField>,
        available: Vec<String>,
    },
    #[error("Failed to process metric table: {0}")]
    Frame(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid refresh interval: must be at least 1 second")]
    RefreshInterval,
    #[error("Invalid thresholds for {name}: warn ({warn}) must not be above crit ({crit})")]
    Thresholds { name: String, warn: f64, crit: f64 },
}
