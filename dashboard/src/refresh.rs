use crate::config::DashboardConfig;
use crate::error::PipelineError;
use crate::latest::{SampleOrder, latest_by_host};
use crate::load::load_sources;
use crate::schema::{TimestampSource, normalize_schema};
use crate::view::{ViewRequest, build_view};
use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use infraview_model::{DashboardWarning, RenderModel, Sample};

/// The result of one refresh cycle.
///
/// Warnings are kept even when the cycle failed, so that they can be shown next to the error.
#[derive(Debug)]
pub struct CycleOutcome {
    pub result: Result<RenderModel, PipelineError>,
    pub warnings: Vec<DashboardWarning>,
}

/// Run one refresh cycle at the current local time.
pub fn refresh(config: &DashboardConfig, request: &ViewRequest) -> CycleOutcome {
    refresh_at(config, request, Local::now().naive_local())
}

/// Run one refresh cycle, anchoring any synthesized timeline at `now`.
///
/// Every cycle reloads its sources from scratch, nothing is carried over between cycles.
pub fn refresh_at(
    config: &DashboardConfig,
    request: &ViewRequest,
    now: NaiveDateTime,
) -> CycleOutcome {
    let mut warnings = Vec::new();
    let result = run_cycle(config, request, now, &mut warnings).map(|mut model| {
        model.warnings = warnings.clone();
        model
    });

    if let Err(e) = &result {
        log::error!("Refresh cycle failed: {e}");
    }

    CycleOutcome { result, warnings }
}

fn run_cycle(
    config: &DashboardConfig,
    request: &ViewRequest,
    now: NaiveDateTime,
    warnings: &mut Vec<DashboardWarning>,
) -> Result<RenderModel, PipelineError> {
    let table = load_sources(&config.sources, warnings)?;
    log::debug!(
        "Loaded {} rows with columns {:?}",
        table.height(),
        table.column_names()
    );

    let schema = normalize_schema(&table.column_names())?;
    schema.require(request.view.required_fields())?;

    let timestamp = schema.timestamp();
    if timestamp == TimestampSource::Synthesized {
        let warning = DashboardWarning::TimestampUnavailable;
        log::warn!("{warning}");
        warnings.push(warning);
    }

    let samples = table.samples(&schema, now)?;
    let latest = latest_by_host(&samples);

    if let (TimestampSource::Column(column), SampleOrder::RowOrder) = (&timestamp, latest.order) {
        let warning = DashboardWarning::TimestampUnparseable {
            column: column.clone(),
            example: unparseable_example(&samples).unwrap_or_default(),
        };
        log::warn!("{warning}");
        warnings.push(warning);
    }

    build_view(config, request, &samples, &latest, now, warnings)
}

/// The first raw timestamp of a host sample which could not be parsed.
fn unparseable_example(samples: &[Sample]) -> Option<String> {
    samples
        .iter()
        .filter(|sample| sample.host.is_some() && sample.time.is_none())
        .find_map(|sample| sample.timestamp.clone())
}

/// Run refresh cycles and hand each outcome to `present`.
///
/// With auto-refresh enabled this sleeps for the configured interval between cycles and only
/// returns if `present` fails. Otherwise a single cycle runs and its fatal error, if any, is
/// returned.
pub fn run<F>(config: &DashboardConfig, request: &ViewRequest, mut present: F) -> anyhow::Result<()>
where
    F: FnMut(&CycleOutcome) -> anyhow::Result<()>,
{
    loop {
        let outcome = refresh(config, request);
        present(&outcome).context("Failed to present refresh cycle")?;

        if !config.auto_refresh {
            return outcome
                .result
                .map(|_| ())
                .context("Refresh cycle failed");
        }

        log::debug!(
            "Next refresh in {} seconds",
            config.refresh_interval_seconds
        );
        std::thread::sleep(config.refresh_interval());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use infraview_model::{MetricField, Panel, Severity, View};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_timestamp_column_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "a.csv", "host,cpu,mem,disk\na,1,2,3\na,4,5,6\n");
        let config = DashboardConfig::default().sources(vec![source]);

        let outcome = refresh_at(&config, &ViewRequest::default(), now());

        let model = outcome.result.unwrap();
        assert_eq!(outcome.warnings, vec![DashboardWarning::TimestampUnavailable]);
        assert_eq!(model.warnings, outcome.warnings);
        let Panel::Dashboard(panel) = model.panel else {
            panic!("Expected a dashboard panel");
        };
        assert_eq!(panel.latest.cpu_percent.value, Some(4.0));
        assert_eq!(
            panel.recent.last().and_then(|r| r.sample.timestamp.clone()).as_deref(),
            Some("2024-03-10 08:00:00")
        );
    }

    #[test]
    fn unparseable_timestamps_use_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            &dir,
            "a.csv",
            "host,timestamp,cpu,mem,disk\na,2024-03-01 10:00:00,1,2,3\na,soon,4,5,6\na,2024-03-01 09:00:00,7,8,9\n",
        );
        let config = DashboardConfig::default().sources(vec![source]);

        let outcome = refresh_at(&config, &ViewRequest::new(View::Summary), now());

        assert_eq!(
            outcome.warnings,
            vec![DashboardWarning::TimestampUnparseable {
                column: "timestamp".to_string(),
                example: "soon".to_string(),
            }]
        );
        let Panel::Summary(panel) = outcome.result.unwrap().panel else {
            panic!("Expected a summary panel");
        };
        assert_eq!(panel.hosts[0].kpis.cpu_percent.value, Some(7.0));
    }

    #[test]
    fn late_non_numeric_cell_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = String::from("host,cpu,mem,disk\n");
        for row in 0..1500 {
            if row == 1200 {
                content.push_str("db-1,n/a,40,50\n");
            } else {
                content.push_str(&format!("web-1,{},40,50\n", row % 100));
            }
        }
        let source = write_source(&dir, "a.csv", &content);
        let config = DashboardConfig::default().sources(vec![source]);

        let outcome = refresh_at(&config, &ViewRequest::new(View::Summary), now());

        assert_eq!(outcome.warnings, vec![DashboardWarning::TimestampUnavailable]);
        let Panel::Summary(panel) = outcome.result.unwrap().panel else {
            panic!("Expected a summary panel");
        };
        assert_eq!(panel.host_count, 2);
        let db = &panel.hosts[1];
        assert_eq!(db.host, "db-1");
        assert_eq!(db.kpis.cpu_percent.value, None);
        assert_eq!(db.kpis.cpu_percent.severity, Severity::Normal);
        assert_eq!(db.kpis.memory_percent.value, Some(40.0));
    }

    #[test]
    fn missing_view_columns_abort_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "a.csv", "host,cpu,mem,disk\na,1,2,3\n");
        let config = DashboardConfig::default().sources(vec![source]);

        let outcome = refresh_at(&config, &ViewRequest::new(View::Memory), now());

        let Err(PipelineError::MissingRequiredColumn { fields, .. }) = outcome.result else {
            panic!("Expected a missing column error");
        };
        assert_eq!(fields, vec![MetricField::MemoryUsed, MetricField::MemoryTotal]);
    }

    #[test]
    fn warnings_survive_a_failed_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::default().sources(vec![dir.path().join("gone.csv")]);

        let outcome = refresh_at(&config, &ViewRequest::default(), now());

        assert!(matches!(outcome.result, Err(PipelineError::NoDataAvailable)));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn single_cycle_without_auto_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "a.csv", "host,cpu,mem,disk\na,1,2,3\n");
        let config = DashboardConfig::default()
            .sources(vec![source])
            .auto_refresh(false);

        let mut cycles = 0;
        run(&config, &ViewRequest::default(), |outcome| {
            cycles += 1;
            assert!(outcome.result.is_ok());
            Ok(())
        })
        .unwrap();

        assert_eq!(cycles, 1);
    }

    #[test]
    fn single_failed_cycle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::default()
            .sources(vec![dir.path().join("gone.csv")])
            .auto_refresh(false);

        let result = run(&config, &ViewRequest::default(), |_| Ok(()));

        assert!(result.is_err());
    }
}
