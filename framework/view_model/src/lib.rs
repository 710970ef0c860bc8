//! Data model shared between the InfraView pipeline and its presentation layers.

mod field;
mod render;
mod sample;
mod severity;
mod units;
mod warning;

pub use field::{MetricField, REQUIRED_FIELDS};
pub use render::{
    AlertEntry, AlertFilter, AlertPanel, Banner, CapacityPanel, CapacityPoint, CpuPanel,
    DashboardPanel, HostHistory, HostStatus, NetworkPanel, NetworkPoint, Panel, PercentPoint,
    ProcessPanel, ProcessPoint, RenderModel, SummaryPanel, TaggedSample, View,
};
pub use sample::{FieldValue, Sample};
pub use severity::{KpiTriple, MetricThresholds, Reading, Severity, ThresholdSet, TrackedMetric};
pub use units::{bytes_to_gigabytes, round_two_places, seconds_to_duration, Uptime};
pub use warning::DashboardWarning;
