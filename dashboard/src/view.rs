use crate::alert::{evaluate_alerts, filter_alerts, host_statuses, sort_alerts};
use crate::config::DashboardConfig;
use crate::error::PipelineError;
use crate::latest::{LatestState, recent_for_host};
use chrono::NaiveDateTime;
use infraview_model::{
    AlertFilter, AlertPanel, Banner, CapacityPanel, CapacityPoint, CpuPanel, DashboardPanel,
    DashboardWarning, HostHistory, KpiTriple, MetricField, MetricThresholds, NetworkPanel,
    NetworkPoint, Panel, PercentPoint, ProcessPanel, ProcessPoint, Reading, RenderModel, Sample,
    SummaryPanel, TaggedSample, ThresholdSet, TrackedMetric, Uptime, View, bytes_to_gigabytes,
    round_two_places,
};

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub view: View,
    /// Host to display, the first host if unset or unknown.
    pub host: Option<String>,
    pub alert_filter: AlertFilter,
    pub sort_by: TrackedMetric,
    /// Host whose history is shown on the alerts view, the first listed alert if unset.
    pub history_host: Option<String>,
}

impl Default for ViewRequest {
    fn default() -> Self {
        Self {
            view: View::default(),
            host: None,
            alert_filter: AlertFilter::default(),
            sort_by: TrackedMetric::CpuPercent,
            history_host: None,
        }
    }
}

impl ViewRequest {
    pub fn new(view: View) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }

    /// Builds a [`ViewRequest`] for the specified host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Builds a [`ViewRequest`] with the specified alert filter.
    pub fn alert_filter(mut self, filter: AlertFilter) -> Self {
        self.alert_filter = filter;
        self
    }

    /// Builds a [`ViewRequest`] sorting alerts by the specified metric.
    pub fn sort_by(mut self, metric: TrackedMetric) -> Self {
        self.sort_by = metric;
        self
    }

    /// Builds a [`ViewRequest`] showing the history of the specified host on the alerts view.
    pub fn history_host(mut self, host: impl Into<String>) -> Self {
        self.history_host = Some(host.into());
        self
    }
}

/// Build the render model of the requested view.
///
/// Fails with [`PipelineError::NoDataAvailable`] if the table has no host at all. The returned
/// model carries no warnings, the caller attaches the ones collected during the cycle.
pub fn build_view(
    config: &DashboardConfig,
    request: &ViewRequest,
    samples: &[Sample],
    latest: &LatestState,
    now: NaiveDateTime,
    warnings: &mut Vec<DashboardWarning>,
) -> Result<RenderModel, PipelineError> {
    let hosts = latest.hosts();
    if hosts.is_empty() {
        return Err(PipelineError::NoDataAvailable);
    }

    let builder = ViewBuilder {
        config,
        samples,
        latest,
    };

    let (selected_host, panel) = match request.view {
        View::Summary => (None, Panel::Summary(builder.summary())),
        View::Alerts => {
            let panel = builder.alerts(request, &hosts, warnings);
            let selected = panel.history.as_ref().map(|h| h.host.clone());
            (selected, Panel::Alerts(panel))
        }
        view => {
            let host = select_host(&hosts, request.host.as_deref(), warnings);
            let panel = match view {
                View::Cpu => Panel::Cpu(builder.cpu(&host)),
                View::Memory => Panel::Memory(builder.memory(&host)),
                View::Disk => Panel::Disk(builder.disk(&host)),
                View::Network => Panel::Network(builder.network(&host)),
                View::Processes => Panel::Processes(builder.processes(&host)),
                _ => Panel::Dashboard(builder.dashboard(&host)),
            };
            (Some(host), panel)
        }
    };

    Ok(RenderModel {
        view: request.view,
        generated_at: now,
        hosts,
        selected_host,
        panel,
        warnings: Vec::new(),
    })
}

/// The requested host if it is known, otherwise the first host.
fn select_host(
    hosts: &[String],
    requested: Option<&str>,
    warnings: &mut Vec<DashboardWarning>,
) -> String {
    // Callers guarantee at least one host
    let first = hosts.first().cloned().unwrap_or_default();
    match requested {
        None => first,
        Some(host) if hosts.iter().any(|h| h == host) => host.to_string(),
        Some(host) => {
            let warning = DashboardWarning::UnknownHost {
                host: host.to_string(),
                fallback: first.clone(),
            };
            log::warn!("{warning}");
            warnings.push(warning);
            first
        }
    }
}

struct ViewBuilder<'a> {
    config: &'a DashboardConfig,
    samples: &'a [Sample],
    latest: &'a LatestState<'a>,
}

impl ViewBuilder<'_> {
    fn thresholds(&self, view: View) -> ThresholdSet {
        self.config.thresholds.for_view(view)
    }

    fn recent(&self, host: &str, count: usize) -> Vec<&Sample> {
        recent_for_host(self.samples, host, count)
    }

    fn tagged(&self, host: &str, count: usize, thresholds: &ThresholdSet) -> Vec<TaggedSample> {
        self.recent(host, count)
            .into_iter()
            .map(|sample| TaggedSample {
                sample: sample.clone(),
                kpis: KpiTriple::from_sample(sample, thresholds),
            })
            .collect()
    }

    fn latest_sample(&self, host: &str) -> Option<&Sample> {
        self.latest.get(host)
    }

    fn dashboard(&self, host: &str) -> DashboardPanel {
        let thresholds = self.thresholds(View::Dashboard);
        let windows = &self.config.windows;
        let latest = self.latest_sample(host);

        let kpis = latest
            .map(|sample| KpiTriple::from_sample(sample, &thresholds))
            .unwrap_or_default();
        let number = |field: MetricField| latest.and_then(|sample| sample.number(field));

        DashboardPanel {
            host: host.to_string(),
            latest: kpis,
            uptime: number(MetricField::UptimeSeconds).and_then(Uptime::from_seconds),
            bytes_sent: number(MetricField::BytesSent),
            bytes_recv: number(MetricField::BytesRecv),
            banners: banners(&kpis, &self.config.thresholds.banners),
            chart: self.tagged(host, windows.chart_rows, &thresholds),
            recent: self.tagged(host, windows.table_rows, &thresholds),
        }
    }

    fn summary(&self) -> SummaryPanel {
        let hosts = host_statuses(self.latest, &self.thresholds(View::Summary));
        SummaryPanel {
            host_count: hosts.len(),
            hosts,
        }
    }

    fn cpu(&self, host: &str) -> CpuPanel {
        let thresholds = self.thresholds(View::Cpu).cpu_percent;
        let windows = &self.config.windows;
        let point = |sample: &Sample| PercentPoint {
            timestamp: sample.timestamp.clone(),
            reading: Reading::classify(sample.number(MetricField::CpuPercent), thresholds),
        };

        CpuPanel {
            host: host.to_string(),
            latest: self
                .latest_sample(host)
                .map(|sample| point(sample).reading)
                .unwrap_or_default(),
            chart: self
                .recent(host, windows.drilldown_chart_rows)
                .into_iter()
                .map(point)
                .collect(),
            recent: self
                .recent(host, windows.drilldown_table_rows)
                .into_iter()
                .map(point)
                .collect(),
        }
    }

    fn memory(&self, host: &str) -> CapacityPanel {
        let thresholds = self.thresholds(View::Memory).memory_percent;
        self.capacity(host, |sample| {
            let used_gb = sample.number(MetricField::MemoryUsed).map(bytes_to_gigabytes);
            let total_gb = sample.number(MetricField::MemoryTotal).map(bytes_to_gigabytes);
            // Free is derived from the displayed values, so used + free always adds up to total.
            CapacityPoint {
                timestamp: sample.timestamp.clone(),
                used_gb,
                total_gb,
                free_gb: total_gb.zip(used_gb).map(|(t, u)| round_two_places(t - u)),
                percent: Reading::classify(sample.number(MetricField::MemoryPercent), thresholds),
            }
        })
    }

    fn disk(&self, host: &str) -> CapacityPanel {
        let thresholds = self.thresholds(View::Disk).disk_percent;
        self.capacity(host, |sample| {
            let gigabytes = |field: MetricField| sample.number(field).map(bytes_to_gigabytes);
            CapacityPoint {
                timestamp: sample.timestamp.clone(),
                used_gb: gigabytes(MetricField::DiskUsed),
                total_gb: gigabytes(MetricField::DiskTotal),
                free_gb: gigabytes(MetricField::DiskFree),
                percent: Reading::classify(sample.number(MetricField::DiskPercent), thresholds),
            }
        })
    }

    fn capacity(&self, host: &str, point: impl Fn(&Sample) -> CapacityPoint) -> CapacityPanel {
        let windows = &self.config.windows;
        let latest = self.latest_sample(host).map(&point).unwrap_or(CapacityPoint {
            timestamp: None,
            used_gb: None,
            total_gb: None,
            free_gb: None,
            percent: Reading::default(),
        });

        CapacityPanel {
            host: host.to_string(),
            latest,
            chart: self
                .recent(host, windows.drilldown_chart_rows)
                .into_iter()
                .map(&point)
                .collect(),
            recent: self
                .recent(host, windows.drilldown_table_rows)
                .into_iter()
                .map(&point)
                .collect(),
        }
    }

    fn network(&self, host: &str) -> NetworkPanel {
        NetworkPanel {
            host: host.to_string(),
            series: self
                .recent(host, self.config.windows.drilldown_chart_rows)
                .into_iter()
                .map(|sample| NetworkPoint {
                    timestamp: sample.timestamp.clone(),
                    bytes_sent: sample.number(MetricField::BytesSent),
                    bytes_recv: sample.number(MetricField::BytesRecv),
                })
                .collect(),
        }
    }

    fn processes(&self, host: &str) -> ProcessPanel {
        let thresholds = self.config.thresholds.process_cpu_percent;
        let point = |sample: &Sample| process_point(sample, thresholds);

        ProcessPanel {
            host: host.to_string(),
            latest: self.latest_sample(host).and_then(point),
            recent: self
                .recent(host, self.config.windows.process_rows)
                .into_iter()
                .filter_map(point)
                .collect(),
        }
    }

    fn alerts(
        &self,
        request: &ViewRequest,
        hosts: &[String],
        warnings: &mut Vec<DashboardWarning>,
    ) -> AlertPanel {
        let thresholds = self.thresholds(View::Alerts);
        let evaluated = evaluate_alerts(self.latest, &thresholds);
        let entries = sort_alerts(
            &filter_alerts(&evaluated, request.alert_filter),
            request.sort_by,
        );

        let history_host = match request.history_host.as_deref() {
            Some(host) => Some(select_host(hosts, Some(host), warnings)),
            None => entries.first().map(|entry| entry.host.clone()),
        };
        let history = history_host.map(|host| HostHistory {
            rows: self.tagged(&host, self.config.windows.alert_history_rows, &thresholds),
            host,
        });

        AlertPanel {
            detected: evaluated.len(),
            filter: request.alert_filter,
            sort_by: request.sort_by,
            entries,
            history,
        }
    }
}

/// Banners for every metric at or above its banner threshold.
fn banners(kpis: &KpiTriple, thresholds: &ThresholdSet) -> Vec<Banner> {
    TrackedMetric::ALL
        .into_iter()
        .filter_map(|metric| {
            let value = kpis.get(metric).value?;
            let severity = thresholds.get(metric).classify(Some(value));
            severity.is_alert().then_some(Banner {
                metric,
                severity,
                value,
            })
        })
        .collect()
}

/// The top process of a sample, if it has any top-process field.
fn process_point(sample: &Sample, thresholds: MetricThresholds) -> Option<ProcessPoint> {
    let name = sample.text(MetricField::TopProcessName);
    let pid = sample.text(MetricField::TopProcessPid);
    let cpu_percent = sample.number(MetricField::TopProcessCpuPercent);

    if name.is_none() && pid.is_none() && cpu_percent.is_none() {
        return None;
    }

    Some(ProcessPoint {
        timestamp: sample.timestamp.clone(),
        name,
        pid,
        cpu_percent: Reading::classify(cpu_percent, thresholds),
    })
}
