use crate::field::MetricField;
use crate::sample::Sample;
use serde::{Deserialize, Serialize};

/// Three-tier status of a metric value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Severity {
    /// Classify a value against a warning and a critical threshold.
    ///
    /// Values below `warn` are [`Severity::Normal`], values in `[warn, crit)` are
    /// [`Severity::Warning`] and values at or above `crit` are [`Severity::Critical`].
    /// `NaN` compares below everything and so is [`Severity::Normal`].
    pub fn classify(value: f64, warn: f64, crit: f64) -> Self {
        if value >= crit {
            Severity::Critical
        } else if value >= warn {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    /// Whether this severity should raise an alert.
    pub fn is_alert(&self) -> bool {
        *self != Severity::Normal
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Normal => "OK",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }
}

/// Warning and critical thresholds for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholds {
    pub warn: f64,
    pub crit: f64,
}

impl MetricThresholds {
    pub const fn new(warn: f64, crit: f64) -> Self {
        Self { warn, crit }
    }

    /// Classify an optional value. Missing values are [`Severity::Normal`].
    pub fn classify(&self, value: Option<f64>) -> Severity {
        value.map_or(Severity::Normal, |v| Severity::classify(v, self.warn, self.crit))
    }
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self::new(70.0, 90.0)
    }
}

/// The percentage metrics that drive KPIs and alerts.
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
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrackedMetric {
    CpuPercent,
    MemoryPercent,
    DiskPercent,
}

impl TrackedMetric {
    pub const ALL: [TrackedMetric; 3] = [
        TrackedMetric::CpuPercent,
        TrackedMetric::MemoryPercent,
        TrackedMetric::DiskPercent,
    ];

    pub fn field(&self) -> MetricField {
        match self {
            TrackedMetric::CpuPercent => MetricField::CpuPercent,
            TrackedMetric::MemoryPercent => MetricField::MemoryPercent,
            TrackedMetric::DiskPercent => MetricField::DiskPercent,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TrackedMetric::CpuPercent => "CPU",
            TrackedMetric::MemoryPercent => "Memory",
            TrackedMetric::DiskPercent => "Disk",
        }
    }
}

/// Thresholds for each [`TrackedMetric`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSet {
    pub cpu_percent: MetricThresholds,
    pub memory_percent: MetricThresholds,
    pub disk_percent: MetricThresholds,
}

impl ThresholdSet {
    pub const fn uniform(thresholds: MetricThresholds) -> Self {
        Self {
            cpu_percent: thresholds,
            memory_percent: thresholds,
            disk_percent: thresholds,
        }
    }

    /// Builds a [`ThresholdSet`] with the thresholds for `metric` replaced.
    pub fn with(mut self, metric: TrackedMetric, thresholds: MetricThresholds) -> Self {
        match metric {
            TrackedMetric::CpuPercent => self.cpu_percent = thresholds,
            TrackedMetric::MemoryPercent => self.memory_percent = thresholds,
            TrackedMetric::DiskPercent => self.disk_percent = thresholds,
        }
        self
    }

    pub fn get(&self, metric: TrackedMetric) -> MetricThresholds {
        match metric {
            TrackedMetric::CpuPercent => self.cpu_percent,
            TrackedMetric::MemoryPercent => self.memory_percent,
            TrackedMetric::DiskPercent => self.disk_percent,
        }
    }
}

/// A metric value together with its classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: Option<f64>,
    pub severity: Severity,
}

impl Reading {
    pub fn classify(value: Option<f64>, thresholds: MetricThresholds) -> Self {
        Self {
            value,
            severity: thresholds.classify(value),
        }
    }
}

/// The CPU, memory and disk readings of one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiTriple {
    pub cpu_percent: Reading,
    pub memory_percent: Reading,
    pub disk_percent: Reading,
}

impl KpiTriple {
    pub fn from_sample(sample: &Sample, thresholds: &ThresholdSet) -> Self {
        let reading = |metric: TrackedMetric| {
            Reading::classify(sample.number(metric.field()), thresholds.get(metric))
        };

        Self {
            cpu_percent: reading(TrackedMetric::CpuPercent),
            memory_percent: reading(TrackedMetric::MemoryPercent),
            disk_percent: reading(TrackedMetric::DiskPercent),
        }
    }

    pub fn get(&self, metric: TrackedMetric) -> Reading {
        match metric {
            TrackedMetric::CpuPercent => self.cpu_percent,
            TrackedMetric::MemoryPercent => self.memory_percent,
            TrackedMetric::DiskPercent => self.disk_percent,
        }
    }

    /// The highest severity among the three readings.
    pub fn worst(&self) -> Severity {
        TrackedMetric::ALL
            .iter()
            .map(|metric| self.get(*metric).severity)
            .max()
            .unwrap_or_default()
    }

    pub fn any(&self, severity: Severity) -> bool {
        TrackedMetric::ALL
            .iter()
            .any(|metric| self.get(*metric).severity == severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_boundaries() {
        assert_eq!(Severity::classify(69.999, 70.0, 90.0), Severity::Normal);
        assert_eq!(Severity::classify(70.0, 70.0, 90.0), Severity::Warning);
        assert_eq!(Severity::classify(89.999, 70.0, 90.0), Severity::Warning);
        assert_eq!(Severity::classify(90.0, 70.0, 90.0), Severity::Critical);
        assert_eq!(Severity::classify(100.0, 70.0, 90.0), Severity::Critical);
    }

    #[test]
    fn classify_missing_or_nan_is_normal() {
        let thresholds = MetricThresholds::default();
        assert_eq!(thresholds.classify(None), Severity::Normal);
        assert_eq!(thresholds.classify(Some(f64::NAN)), Severity::Normal);
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Normal < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn threshold_set_overrides_single_metric() {
        let set = ThresholdSet::default()
            .with(TrackedMetric::DiskPercent, MetricThresholds::new(90.0, 95.0));

        assert_eq!(set.get(TrackedMetric::CpuPercent), MetricThresholds::new(70.0, 90.0));
        assert_eq!(set.get(TrackedMetric::DiskPercent), MetricThresholds::new(90.0, 95.0));
    }

    #[test]
    fn kpis_from_sample() {
        let sample = Sample::new(0)
            .with_host("db-1")
            .with_field(MetricField::CpuPercent, 95.0)
            .with_field(MetricField::MemoryPercent, 72.0)
            .with_field(MetricField::DiskPercent, "broken");

        let kpis = KpiTriple::from_sample(&sample, &ThresholdSet::default());

        assert_eq!(kpis.cpu_percent.severity, Severity::Critical);
        assert_eq!(kpis.memory_percent.severity, Severity::Warning);
        assert_eq!(kpis.disk_percent, Reading::default());
        assert_eq!(kpis.worst(), Severity::Critical);
        assert!(kpis.any(Severity::Warning));
    }
}
