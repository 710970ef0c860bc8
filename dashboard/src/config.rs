use crate::error::ConfigError;
use infraview_model::{MetricThresholds, ThresholdSet, TrackedMetric, View};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pause between two refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 5;

/// Thresholds used by each view.
///
/// A config file only overrides the metrics it names. A metric omitted from a view table keeps
/// that view's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ViewThresholdOverrides")]
pub struct ViewThresholds {
    pub dashboard: ThresholdSet,
    /// Thresholds at which the dashboard shows a banner.
    pub banners: ThresholdSet,
    pub summary: ThresholdSet,
    pub cpu: ThresholdSet,
    pub memory: ThresholdSet,
    pub disk: ThresholdSet,
    pub alerts: ThresholdSet,
    /// Thresholds for the CPU usage of the top process.
    pub process_cpu_percent: MetricThresholds,
}

impl Default for ViewThresholds {
    fn default() -> Self {
        let disk = MetricThresholds::new(90.0, 95.0);
        Self {
            dashboard: ThresholdSet::default().with(TrackedMetric::DiskPercent, disk),
            banners: ThresholdSet::uniform(MetricThresholds::new(80.0, 90.0))
                .with(TrackedMetric::DiskPercent, disk),
            summary: ThresholdSet::default(),
            cpu: ThresholdSet::default()
                .with(TrackedMetric::CpuPercent, MetricThresholds::new(50.0, 80.0)),
            memory: ThresholdSet::default(),
            disk: ThresholdSet::default(),
            alerts: ThresholdSet::default(),
            process_cpu_percent: MetricThresholds::new(30.0, 70.0),
        }
    }
}

/// The metrics named in one view table of a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThresholdOverrides {
    cpu_percent: Option<MetricThresholds>,
    memory_percent: Option<MetricThresholds>,
    disk_percent: Option<MetricThresholds>,
}

impl ThresholdOverrides {
    fn apply(self, base: ThresholdSet) -> ThresholdSet {
        [
            (TrackedMetric::CpuPercent, self.cpu_percent),
            (TrackedMetric::MemoryPercent, self.memory_percent),
            (TrackedMetric::DiskPercent, self.disk_percent),
        ]
        .into_iter()
        .fold(base, |set, (metric, thresholds)| match thresholds {
            Some(thresholds) => set.with(metric, thresholds),
            None => set,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViewThresholdOverrides {
    dashboard: ThresholdOverrides,
    banners: ThresholdOverrides,
    summary: ThresholdOverrides,
    cpu: ThresholdOverrides,
    memory: ThresholdOverrides,
    disk: ThresholdOverrides,
    alerts: ThresholdOverrides,
    process_cpu_percent: Option<MetricThresholds>,
}

impl From<ViewThresholdOverrides> for ViewThresholds {
    fn from(overrides: ViewThresholdOverrides) -> Self {
        let defaults = ViewThresholds::default();
        Self {
            dashboard: overrides.dashboard.apply(defaults.dashboard),
            banners: overrides.banners.apply(defaults.banners),
            summary: overrides.summary.apply(defaults.summary),
            cpu: overrides.cpu.apply(defaults.cpu),
            memory: overrides.memory.apply(defaults.memory),
            disk: overrides.disk.apply(defaults.disk),
            alerts: overrides.alerts.apply(defaults.alerts),
            process_cpu_percent: overrides
                .process_cpu_percent
                .unwrap_or(defaults.process_cpu_percent),
        }
    }
}

impl ViewThresholds {
    /// The threshold set used to classify KPIs in `view`.
    pub fn for_view(&self, view: View) -> ThresholdSet {
        match view {
            View::Dashboard => self.dashboard,
            View::Summary | View::Network | View::Processes => self.summary,
            View::Cpu => self.cpu,
            View::Memory => self.memory,
            View::Disk => self.disk,
            View::Alerts => self.alerts,
        }
    }

    fn named(&self) -> [(&'static str, &ThresholdSet); 7] {
        [
            ("dashboard", &self.dashboard),
            ("banners", &self.banners),
            ("summary", &self.summary),
            ("cpu", &self.cpu),
            ("memory", &self.memory),
            ("disk", &self.disk),
            ("alerts", &self.alerts),
        ]
    }

    /// Check that no warning threshold is above its critical threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sets = self.named().into_iter().flat_map(|(view, set)| {
            TrackedMetric::ALL
                .into_iter()
                .map(move |metric| (format!("{view}.{metric}"), set.get(metric)))
        });
        let process = std::iter::once((
            "process_cpu_percent".to_string(),
            self.process_cpu_percent,
        ));

        for (name, thresholds) in sets.chain(process) {
            if thresholds.warn > thresholds.crit {
                return Err(ConfigError::Thresholds {
                    name,
                    warn: thresholds.warn,
                    crit: thresholds.crit,
                });
            }
        }

        Ok(())
    }
}

/// Number of rows shown in each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Windows {
    /// Recent rows table on the dashboard.
    pub table_rows: usize,
    /// Chart window on the dashboard.
    pub chart_rows: usize,
    pub drilldown_chart_rows: usize,
    pub drilldown_table_rows: usize,
    pub process_rows: usize,
    /// History of the selected host on the alerts view.
    pub alert_history_rows: usize,
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            table_rows: 20,
            chart_rows: 100,
            drilldown_chart_rows: 40,
            drilldown_table_rows: 15,
            process_rows: 20,
            alert_history_rows: 50,
        }
    }
}

/// Everything a refresh cycle needs to know, passed in explicitly at the start of each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// CSV sources, loaded and concatenated in this order.
    pub sources: Vec<PathBuf>,
    pub refresh_interval_seconds: u64,
    pub auto_refresh: bool,
    pub thresholds: ViewThresholds,
    pub windows: Windows,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("s1.csv"), PathBuf::from("s2.csv")],
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS,
            auto_refresh: true,
            thresholds: ViewThresholds::default(),
            windows: Windows::default(),
        }
    }
}

impl DashboardConfig {
    /// Load a config file. Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        log::debug!("Loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Check that the refresh interval is at least a second and that every threshold is ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_seconds == 0 {
            return Err(ConfigError::RefreshInterval);
        }
        self.thresholds.validate()
    }

    /// Builds a [`DashboardConfig`] with the specified sources.
    pub fn sources(mut self, sources: Vec<PathBuf>) -> Self {
        self.sources = sources;
        self
    }

    /// Builds a [`DashboardConfig`] with the specified refresh interval.
    pub fn refresh_interval_seconds(mut self, seconds: u64) -> Self {
        self.refresh_interval_seconds = seconds;
        self
    }

    /// Builds a [`DashboardConfig`] with auto-refresh enabled or disabled.
    pub fn auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    /// Builds a [`DashboardConfig`] with the specified thresholds.
    pub fn thresholds(mut self, thresholds: ViewThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Builds a [`DashboardConfig`] with the specified windows.
    pub fn windows(mut self, windows: Windows) -> Self {
        self.windows = windows;
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}
