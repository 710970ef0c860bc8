//! Ingestion, normalization and alerting pipeline of the InfraView fleet dashboard.
//!
//! A refresh cycle loads CSV sources into one table, resolves its columns against the canonical
//! metric vocabulary, reduces it to the latest sample per host and builds the requested view.

pub mod alert;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod latest;
pub mod load;
pub mod refresh;
pub mod render;
pub mod schema;
pub mod view;

pub use config::{DashboardConfig, ViewThresholds, Windows};
pub use error::{ConfigError, PipelineError};
pub use refresh::{CycleOutcome, refresh, refresh_at, run};
pub use render::{OutputFormat, render};
pub use view::ViewRequest;
