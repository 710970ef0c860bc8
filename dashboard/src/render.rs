use crate::refresh::CycleOutcome;
use infraview_model::{
    AlertPanel, CapacityPanel, CapacityPoint, CpuPanel, DashboardPanel, DashboardWarning,
    HostStatus, KpiTriple, NetworkPanel, Panel, ProcessPanel, ProcessPoint, Reading,
    RenderModel, SummaryPanel, TaggedSample, TrackedMetric, bytes_to_gigabytes,
};
use serde::Serialize;
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// How a refresh cycle is written to the terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum_macros::EnumString,
    strum_macros::VariantNames,
    strum_macros::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Render the outcome of a refresh cycle.
pub fn render(outcome: &CycleOutcome, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(outcome)?),
        OutputFormat::Json => Ok(render_json(outcome)?),
    }
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a RenderModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    warnings: &'a [DashboardWarning],
}

pub fn render_json(outcome: &CycleOutcome) -> serde_json::Result<String> {
    let json = JsonOutcome {
        model: outcome.result.as_ref().ok(),
        error: outcome.result.as_ref().err().map(ToString::to_string),
        warnings: &outcome.warnings,
    };
    serde_json::to_string_pretty(&json)
}

pub fn render_table(outcome: &CycleOutcome) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    for warning in &outcome.warnings {
        writeln!(out, "Warning: {warning}")?;
    }

    match &outcome.result {
        Ok(model) => write_model(&mut out, model)?,
        Err(e) => writeln!(out, "Error: {e}")?,
    }

    Ok(out)
}

fn write_model(out: &mut String, model: &RenderModel) -> std::fmt::Result {
    writeln!(
        out,
        "\nInfraView {} view, generated at {}",
        model.view,
        model.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "Hosts ({}): {}", model.hosts.len(), model.hosts.join(", "))?;

    match &model.panel {
        Panel::Dashboard(panel) => write_dashboard(out, panel),
        Panel::Summary(panel) => write_summary(out, panel),
        Panel::Cpu(panel) => write_cpu(out, panel),
        Panel::Memory(panel) => write_capacity(out, "Memory", panel),
        Panel::Disk(panel) => write_capacity(out, "Disk", panel),
        Panel::Network(panel) => write_network(out, panel),
        Panel::Processes(panel) => write_processes(out, panel),
        Panel::Alerts(panel) => write_alerts(out, panel),
    }
}

fn table<T: Tabled>(rows: Vec<T>) -> Table {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

fn optional_float2(n: &Option<f64>) -> String {
    n.as_ref().map_or_else(|| "-".to_string(), float2)
}

/// A reading with its severity, e.g. `91.00 (Critical)`. Normal readings show the value only.
fn reading(reading: &Reading) -> String {
    match reading.value {
        None => "-".to_string(),
        Some(value) if reading.severity.is_alert() => {
            format!("{} ({})", float2(&value), reading.severity.label())
        }
        Some(value) => float2(&value),
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
struct KpiRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value %", display = "optional_float2")]
    value: Option<f64>,
    #[tabled(rename = "Status")]
    status: &'static str,
}

fn kpi_rows(kpis: &KpiTriple) -> Vec<KpiRow> {
    TrackedMetric::ALL
        .into_iter()
        .map(|metric| {
            let reading = kpis.get(metric);
            KpiRow {
                metric: metric.title(),
                value: reading.value,
                status: reading.severity.label(),
            }
        })
        .collect()
}

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time", display = "text")]
    timestamp: Option<String>,
    #[tabled(rename = "CPU %", display = "reading")]
    cpu_percent: Reading,
    #[tabled(rename = "Memory %", display = "reading")]
    memory_percent: Reading,
    #[tabled(rename = "Disk %", display = "reading")]
    disk_percent: Reading,
}

impl From<&TaggedSample> for SampleRow {
    fn from(tagged: &TaggedSample) -> Self {
        Self {
            timestamp: tagged.sample.timestamp.clone(),
            cpu_percent: tagged.kpis.cpu_percent,
            memory_percent: tagged.kpis.memory_percent,
            disk_percent: tagged.kpis.disk_percent,
        }
    }
}

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Time", display = "text")]
    timestamp: Option<String>,
    #[tabled(rename = "CPU %", display = "reading")]
    cpu_percent: Reading,
    #[tabled(rename = "Memory %", display = "reading")]
    memory_percent: Reading,
    #[tabled(rename = "Disk %", display = "reading")]
    disk_percent: Reading,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl From<&HostStatus> for HostRow {
    fn from(status: &HostStatus) -> Self {
        Self {
            host: status.host.clone(),
            timestamp: status.timestamp.clone(),
            cpu_percent: status.kpis.cpu_percent,
            memory_percent: status.kpis.memory_percent,
            disk_percent: status.kpis.disk_percent,
            status: status.severity().label(),
        }
    }
}

/// Min and max of a series, for a one-line trend summary.
fn trend(values: impl Iterator<Item = Option<f64>>) -> Option<(f64, f64)> {
    values.flatten().fold(None, |range, value| match range {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

fn write_trend(
    out: &mut String,
    label: &str,
    count: usize,
    values: impl Iterator<Item = Option<f64>>,
) -> std::fmt::Result {
    match trend(values) {
        Some((min, max)) => writeln!(
            out,
            "{label} over the last {count} samples: min {}, max {}",
            float2(&min),
            float2(&max)
        ),
        None => writeln!(out, "{label}: no data"),
    }
}

fn write_dashboard(out: &mut String, panel: &DashboardPanel) -> std::fmt::Result {
    writeln!(out, "\nHost {}", panel.host)?;
    for banner in &panel.banners {
        writeln!(
            out,
            "{}: {} at {}%",
            banner.severity.label().to_uppercase(),
            banner.metric.title(),
            float2(&banner.value)
        )?;
    }

    writeln!(out, "{}", table(kpi_rows(&panel.latest)))?;
    writeln!(
        out,
        "Uptime: {}",
        panel
            .uptime
            .map_or_else(|| "-".to_string(), |uptime| uptime.to_string())
    )?;
    writeln!(
        out,
        "Network: {} GB sent, {} GB received",
        optional_float2(&panel.bytes_sent.map(bytes_to_gigabytes)),
        optional_float2(&panel.bytes_recv.map(bytes_to_gigabytes))
    )?;

    for metric in TrackedMetric::ALL {
        write_trend(
            out,
            metric.title(),
            panel.chart.len(),
            panel.chart.iter().map(|tagged| tagged.kpis.get(metric).value),
        )?;
    }

    writeln!(out, "\nRecent samples")?;
    writeln!(
        out,
        "{}",
        table(panel.recent.iter().map(SampleRow::from).collect())
    )
}

fn write_summary(out: &mut String, panel: &SummaryPanel) -> std::fmt::Result {
    writeln!(out, "\nMonitored hosts: {}", panel.host_count)?;
    writeln!(
        out,
        "{}",
        table(panel.hosts.iter().map(HostRow::from).collect())
    )
}

#[derive(Tabled)]
struct PercentRow {
    #[tabled(rename = "Time", display = "text")]
    timestamp: Option<String>,
    #[tabled(rename = "CPU %", display = "reading")]
    reading: Reading,
}

fn write_cpu(out: &mut String, panel: &CpuPanel) -> std::fmt::Result {
    writeln!(out, "\nHost {}", panel.host)?;
    writeln!(out, "Current CPU: {}", reading(&panel.latest))?;
    write_trend(
        out,
        "CPU",
        panel.chart.len(),
        panel.chart.iter().map(|point| point.reading.value),
    )?;
    let rows = panel
        .recent
        .iter()
        .map(|point| PercentRow {
            timestamp: point.timestamp.clone(),
            reading: point.reading,
        })
        .collect();
    writeln!(out, "{}", table(rows))
}

#[derive(Tabled)]
struct CapacityRow {
    #[tabled(rename = "Time", display = "text")]
    timestamp: Option<String>,
    #[tabled(rename = "Used GB", display = "optional_float2")]
    used_gb: Option<f64>,
    #[tabled(rename = "Total GB", display = "optional_float2")]
    total_gb: Option<f64>,
    #[tabled(rename = "Free GB", display = "optional_float2")]
    free_gb: Option<f64>,
    #[tabled(rename = "Usage %", display = "reading")]
    percent: Reading,
}

impl From<&CapacityPoint> for CapacityRow {
    fn from(point: &CapacityPoint) -> Self {
        Self {
            timestamp: point.timestamp.clone(),
            used_gb: point.used_gb,
            total_gb: point.total_gb,
            free_gb: point.free_gb,
            percent: point.percent,
        }
    }
}

fn write_capacity(out: &mut String, title: &str, panel: &CapacityPanel) -> std::fmt::Result {
    writeln!(out, "\nHost {}", panel.host)?;
    let latest = &panel.latest;
    writeln!(
        out,
        "{title}: {} GB used of {} GB, {} GB free, usage {}",
        optional_float2(&latest.used_gb),
        optional_float2(&latest.total_gb),
        optional_float2(&latest.free_gb),
        reading(&latest.percent)
    )?;
    write_trend(
        out,
        &format!("{title} used GB"),
        panel.chart.len(),
        panel.chart.iter().map(|point| point.used_gb),
    )?;
    writeln!(
        out,
        "{}",
        table(panel.recent.iter().map(CapacityRow::from).collect())
    )
}

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Time", display = "text")]
    timestamp: Option<String>,
    #[tabled(rename = "Sent GB", display = "optional_float2")]
    sent_gb: Option<f64>,
    #[tabled(rename = "Received GB", display = "optional_float2")]
    recv_gb: Option<f64>,
}

fn write_network(out: &mut String, panel: &NetworkPanel) -> std::fmt::Result {
    writeln!(out, "\nHost {}", panel.host)?;
    let rows = panel
        .series
        .iter()
        .map(|point| NetworkRow {
            timestamp: point.timestamp.clone(),
            sent_gb: point.bytes_sent.map(bytes_to_gigabytes),
            recv_gb: point.bytes_recv.map(bytes_to_gigabytes),
        })
        .collect();
    writeln!(out, "{}", table(rows))
}

#[derive(Tabled)]
struct ProcessRow {
    #[tabled(rename = "Time", display = "text")]
    timestamp: Option<String>,
    #[tabled(rename = "Process", display = "text")]
    name: Option<String>,
    #[tabled(rename = "PID", display = "text")]
    pid: Option<String>,
    #[tabled(rename = "CPU %", display = "reading")]
    cpu_percent: Reading,
}

impl From<&ProcessPoint> for ProcessRow {
    fn from(point: &ProcessPoint) -> Self {
        Self {
            timestamp: point.timestamp.clone(),
            name: point.name.clone(),
            pid: point.pid.clone(),
            cpu_percent: point.cpu_percent,
        }
    }
}

fn write_processes(out: &mut String, panel: &ProcessPanel) -> std::fmt::Result {
    writeln!(out, "\nHost {}", panel.host)?;
    match &panel.latest {
        Some(latest) => writeln!(
            out,
            "Top process: {} (PID {}), CPU {}",
            text(&latest.name),
            text(&latest.pid),
            reading(&latest.cpu_percent)
        )?,
        None => writeln!(out, "Top process: no data")?,
    }
    writeln!(
        out,
        "{}",
        table(panel.recent.iter().map(ProcessRow::from).collect())
    )
}

fn write_alerts(out: &mut String, panel: &AlertPanel) -> std::fmt::Result {
    writeln!(
        out,
        "\nAlerts detected: {} (showing {}, filter {}, sorted by {})",
        panel.detected,
        panel.entries.len(),
        panel.filter,
        panel.sort_by
    )?;
    if panel.entries.is_empty() {
        writeln!(out, "No alerts")?;
    } else {
        writeln!(
            out,
            "{}",
            table(panel.entries.iter().map(HostRow::from).collect())
        )?;
    }

    if let Some(history) = &panel.history {
        writeln!(out, "\nHistory of {}", history.host)?;
        writeln!(
            out,
            "{}",
            table(history.rows.iter().map(SampleRow::from).collect())
        )?;
    }

    Ok(())
}
