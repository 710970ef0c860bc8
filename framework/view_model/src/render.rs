use crate::field::MetricField;
use crate::sample::Sample;
use crate::severity::{KpiTriple, Reading, Severity, TrackedMetric};
use crate::units::Uptime;
use crate::warning::DashboardWarning;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The dashboard views.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::EnumString,
    strum_macros::EnumIter,
    strum_macros::VariantNames,
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Top-level view of a single host.
    #[default]
    Dashboard,
    /// Latest KPIs of every host.
    Summary,
    Cpu,
    Memory,
    Disk,
    Network,
    Processes,
    Alerts,
}

impl View {
    /// Fields this view needs on top of [`crate::REQUIRED_FIELDS`].
    pub fn required_fields(&self) -> &'static [MetricField] {
        match self {
            View::Memory => &[MetricField::MemoryUsed, MetricField::MemoryTotal],
            View::Disk => &[
                MetricField::DiskTotal,
                MetricField::DiskUsed,
                MetricField::DiskFree,
            ],
            View::Network => &[MetricField::BytesSent, MetricField::BytesRecv],
            View::Processes => &[
                MetricField::TopProcessName,
                MetricField::TopProcessPid,
                MetricField::TopProcessCpuPercent,
            ],
            View::Dashboard | View::Summary | View::Cpu | View::Alerts => &[],
        }
    }
}

/// Which alerts to display.
///
/// Filters replace each other, they never stack.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::EnumString,
    strum_macros::VariantNames,
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertFilter {
    /// Every host with at least one metric at or above its warning threshold.
    #[default]
    #[strum(serialize = "all")]
    All,
    /// Hosts with any metric at or above its critical threshold.
    #[strum(serialize = "critical")]
    CriticalOnly,
    /// Hosts with a metric in the warning band and none critical.
    #[strum(serialize = "warning")]
    WarningOnly,
}

impl AlertFilter {
    pub fn matches(&self, kpis: &KpiTriple) -> bool {
        match self {
            AlertFilter::All => kpis.worst().is_alert(),
            AlertFilter::CriticalOnly => kpis.any(Severity::Critical),
            AlertFilter::WarningOnly => {
                kpis.any(Severity::Warning) && !kpis.any(Severity::Critical)
            }
        }
    }
}

/// The latest state of one host, classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostStatus {
    pub host: String,
    pub timestamp: Option<String>,
    pub kpis: KpiTriple,
}

impl HostStatus {
    pub fn severity(&self) -> Severity {
        self.kpis.worst()
    }
}

/// A host status which raised at least one warning.
pub type AlertEntry = HostStatus;

/// A sample with its KPIs classified, for tables and charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedSample {
    #[serde(flatten)]
    pub sample: Sample,
    pub kpis: KpiTriple,
}

/// A threshold breach shown prominently on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub metric: TrackedMetric,
    pub severity: Severity,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPanel {
    pub host: String,
    pub latest: KpiTriple,
    pub uptime: Option<Uptime>,
    pub bytes_sent: Option<f64>,
    pub bytes_recv: Option<f64>,
    pub banners: Vec<Banner>,
    pub chart: Vec<TaggedSample>,
    pub recent: Vec<TaggedSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPanel {
    pub host_count: usize,
    pub hosts: Vec<HostStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentPoint {
    pub timestamp: Option<String>,
    pub reading: Reading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuPanel {
    pub host: String,
    pub latest: Reading,
    pub chart: Vec<PercentPoint>,
    pub recent: Vec<PercentPoint>,
}

/// Used, total and free capacity of a memory or disk sample, in gigabytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPoint {
    pub timestamp: Option<String>,
    pub used_gb: Option<f64>,
    pub total_gb: Option<f64>,
    pub free_gb: Option<f64>,
    pub percent: Reading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPanel {
    pub host: String,
    pub latest: CapacityPoint,
    pub chart: Vec<CapacityPoint>,
    pub recent: Vec<CapacityPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPoint {
    pub timestamp: Option<String>,
    pub bytes_sent: Option<f64>,
    pub bytes_recv: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPanel {
    pub host: String,
    pub series: Vec<NetworkPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPoint {
    pub timestamp: Option<String>,
    pub name: Option<String>,
    pub pid: Option<String>,
    pub cpu_percent: Reading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPanel {
    pub host: String,
    pub latest: Option<ProcessPoint>,
    pub recent: Vec<ProcessPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostHistory {
    pub host: String,
    pub rows: Vec<TaggedSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPanel {
    /// Number of alerts before the display filter was applied.
    pub detected: usize,
    pub filter: AlertFilter,
    pub sort_by: TrackedMetric,
    pub entries: Vec<AlertEntry>,
    pub history: Option<HostHistory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Dashboard(DashboardPanel),
    Summary(SummaryPanel),
    Cpu(CpuPanel),
    Memory(CapacityPanel),
    Disk(CapacityPanel),
    Network(NetworkPanel),
    Processes(ProcessPanel),
    Alerts(AlertPanel),
}

/// Everything the presentation layer needs to draw one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderModel {
    pub view: View,
    pub generated_at: NaiveDateTime,
    pub hosts: Vec<String>,
    pub selected_host: Option<String>,
    pub panel: Panel,
    pub warnings: Vec<DashboardWarning>,
}
