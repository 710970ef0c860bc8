use crate::latest::LatestState;
use infraview_model::{AlertEntry, AlertFilter, HostStatus, KpiTriple, ThresholdSet, TrackedMetric};
use std::cmp::Ordering;

/// Classify the latest state of every host.
pub fn host_statuses(latest: &LatestState, thresholds: &ThresholdSet) -> Vec<HostStatus> {
    latest
        .entries
        .iter()
        .filter_map(|sample| {
            Some(HostStatus {
                host: sample.host.clone()?,
                timestamp: sample.timestamp.clone(),
                kpis: KpiTriple::from_sample(sample, thresholds),
            })
        })
        .collect()
}

/// Hosts whose latest state has at least one tracked metric at or above its warning threshold.
///
/// Entries keep the order of `latest`.
pub fn evaluate_alerts(latest: &LatestState, thresholds: &ThresholdSet) -> Vec<AlertEntry> {
    host_statuses(latest, thresholds)
        .into_iter()
        .filter(|status| status.severity().is_alert())
        .collect()
}

/// Select the evaluated entries matching `filter`.
///
/// Always applied to the full evaluated set, so filters never stack.
pub fn filter_alerts(entries: &[AlertEntry], filter: AlertFilter) -> Vec<AlertEntry> {
    entries
        .iter()
        .filter(|entry| filter.matches(&entry.kpis))
        .cloned()
        .collect()
}

/// Sort entries by `metric`, highest first.
///
/// Missing values sort last and ties keep their evaluation order.
pub fn sort_alerts(entries: &[AlertEntry], metric: TrackedMetric) -> Vec<AlertEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        let a = a.kpis.get(metric).value;
        let b = b.kpis.get(metric).value;
        match (a, b) {
            (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latest::latest_by_host;
    use infraview_model::{MetricField, Sample, Severity};
    use pretty_assertions::assert_eq;

    fn sample(row: usize, host: &str, cpu: f64) -> Sample {
        Sample::new(row)
            .with_host(host)
            .with_field(MetricField::CpuPercent, cpu)
            .with_field(MetricField::MemoryPercent, 20.0)
            .with_field(MetricField::DiskPercent, 30.0)
    }

    fn hosts(entries: &[AlertEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.host.as_str()).collect()
    }

    fn fleet() -> Vec<Sample> {
        vec![
            sample(0, "calm", 65.0),
            sample(1, "busy", 75.0),
            sample(2, "burning", 95.0),
        ]
    }

    #[test]
    fn only_hosts_at_or_above_warning_are_evaluated() {
        let samples = fleet();
        let entries = evaluate_alerts(&latest_by_host(&samples), &ThresholdSet::default());

        assert_eq!(hosts(&entries), vec!["busy", "burning"]);
        assert_eq!(entries[0].kpis.cpu_percent.severity, Severity::Warning);
        assert_eq!(entries[1].kpis.cpu_percent.severity, Severity::Critical);
    }

    #[test]
    fn filters_select_exclusive_tiers() {
        let samples = fleet();
        let entries = evaluate_alerts(&latest_by_host(&samples), &ThresholdSet::default());

        assert_eq!(filter_alerts(&entries, AlertFilter::All).len(), 2);
        assert_eq!(hosts(&filter_alerts(&entries, AlertFilter::CriticalOnly)), vec!["burning"]);
        assert_eq!(hosts(&filter_alerts(&entries, AlertFilter::WarningOnly)), vec!["busy"]);
    }

    #[test]
    fn filters_replace_rather_than_stack() {
        let samples = fleet();
        let entries = evaluate_alerts(&latest_by_host(&samples), &ThresholdSet::default());

        let critical = filter_alerts(&entries, AlertFilter::CriticalOnly);
        let warning = filter_alerts(&entries, AlertFilter::WarningOnly);

        assert_eq!(hosts(&critical), vec!["burning"]);
        assert_eq!(hosts(&warning), vec!["busy"]);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn warning_on_one_metric_critical_on_another_is_critical_only() {
        let samples = vec![Sample::new(0)
            .with_host("mixed")
            .with_field(MetricField::CpuPercent, 75.0)
            .with_field(MetricField::MemoryPercent, 10.0)
            .with_field(MetricField::DiskPercent, 99.0)];
        let entries = evaluate_alerts(&latest_by_host(&samples), &ThresholdSet::default());

        assert_eq!(filter_alerts(&entries, AlertFilter::CriticalOnly).len(), 1);
        assert!(filter_alerts(&entries, AlertFilter::WarningOnly).is_empty());
    }

    #[test]
    fn sort_descending_with_missing_last() {
        let samples = vec![
            sample(0, "a", 75.0),
            Sample::new(1)
                .with_host("b")
                .with_field(MetricField::MemoryPercent, 95.0),
            sample(2, "c", 99.0),
            sample(3, "d", 75.0),
        ];
        let entries = evaluate_alerts(&latest_by_host(&samples), &ThresholdSet::default());

        let sorted = sort_alerts(&entries, TrackedMetric::CpuPercent);

        assert_eq!(hosts(&sorted), vec!["c", "a", "d", "b"]);
        assert_eq!(hosts(&entries), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn non_numeric_metric_is_normal() {
        let samples = vec![Sample::new(0)
            .with_host("odd")
            .with_field(MetricField::CpuPercent, "busy")];
        let latest = latest_by_host(&samples);

        assert!(evaluate_alerts(&latest, &ThresholdSet::default()).is_empty());
        assert_eq!(host_statuses(&latest, &ThresholdSet::default()).len(), 1);
    }
}
