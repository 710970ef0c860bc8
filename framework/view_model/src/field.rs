use serde::{Deserialize, Serialize};

/// The canonical metric vocabulary.
///
/// Every view reads samples through these names, whatever the source columns were called. The
/// string form of each variant is the canonical column name, e.g. `cpu_percent`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::EnumString,
    strum_macros::EnumIter,
    strum_macros::VariantNames,
    strum_macros::IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Host,
    Timestamp,
    CpuPercent,
    MemoryPercent,
    DiskPercent,
    UptimeSeconds,
    BytesSent,
    BytesRecv,
    MemoryUsed,
    MemoryTotal,
    DiskTotal,
    DiskUsed,
    DiskFree,
    TopProcessName,
    TopProcessPid,
    TopProcessCpuPercent,
}

/// Fields that every source table must provide, one way or another.
pub const REQUIRED_FIELDS: [MetricField; 4] = [
    MetricField::Host,
    MetricField::CpuPercent,
    MetricField::MemoryPercent,
    MetricField::DiskPercent,
];

impl MetricField {
    /// The canonical column name.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Raw column names accepted for this field, in order of preference.
    ///
    /// The canonical name always comes first. Aliases are compared after column name
    /// normalization, so `CPU %` and `cpu-percent` both match `cpu_percent`.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            MetricField::Host => &["host", "hostname", "server"],
            MetricField::Timestamp => &["timestamp", "time", "date"],
            MetricField::CpuPercent => &[
                "cpu_percent",
                "cpu",
                "cpu_usage",
                "cpu_percentage",
                "cpu%",
            ],
            MetricField::MemoryPercent => &[
                "memory_percent",
                "memory",
                "mem_percent",
                "mem",
                "memory_usage",
                "memory%",
            ],
            MetricField::DiskPercent => &[
                "disk_percent",
                "disk",
                "disk_usage",
                "disk_percent_used",
                "disk%",
            ],
            MetricField::UptimeSeconds => &["uptime_seconds"],
            MetricField::BytesSent => &["bytes_sent"],
            MetricField::BytesRecv => &["bytes_recv"],
            MetricField::MemoryUsed => &["memory_used"],
            MetricField::MemoryTotal => &["memory_total"],
            MetricField::DiskTotal => &["disk_total"],
            MetricField::DiskUsed => &["disk_used"],
            MetricField::DiskFree => &["disk_free"],
            MetricField::TopProcessName => &["top_process_name"],
            MetricField::TopProcessPid => &["top_process_pid"],
            MetricField::TopProcessCpuPercent => &["top_process_cpu_percent"],
        }
    }

    pub fn is_required(&self) -> bool {
        REQUIRED_FIELDS.contains(self)
    }
}
