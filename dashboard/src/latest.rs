use infraview_model::Sample;
use itertools::Itertools;

/// How samples were ordered to find the latest one per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    /// By parsed timestamp, ties broken by row order.
    Chronological,
    /// By row order, because some timestamps could not be parsed.
    RowOrder,
}

/// The most recent sample of every host.
#[derive(Debug, Clone)]
pub struct LatestState<'a> {
    /// One entry per distinct host, in order of first appearance.
    pub entries: Vec<&'a Sample>,
    pub order: SampleOrder,
}

impl<'a> LatestState<'a> {
    pub fn hosts(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|sample| sample.host.clone())
            .collect()
    }

    pub fn get(&self, host: &str) -> Option<&'a Sample> {
        self.entries
            .iter()
            .find(|sample| sample.host.as_deref() == Some(host))
            .copied()
    }
}

/// Reduce samples to the latest one per host.
///
/// Samples are grouped by host and sorted by timestamp with a stable sort, so the last of
/// equally timestamped samples wins. If any host sample lacks a parseable timestamp the whole
/// table falls back to row order. Samples without a host are ignored.
pub fn latest_by_host(samples: &[Sample]) -> LatestState<'_> {
    let with_host = || samples.iter().filter(|sample| sample.host.is_some());

    let order = if with_host().all(|sample| sample.time.is_some()) {
        SampleOrder::Chronological
    } else {
        SampleOrder::RowOrder
    };

    let mut latest = with_host()
        .into_group_map_by(|sample| sample.host.clone().unwrap_or_default())
        .into_values()
        .filter_map(|mut group| {
            let first_row = group.first()?.row;
            if order == SampleOrder::Chronological {
                group.sort_by_key(|sample| sample.time);
            }
            group.last().map(|sample| (first_row, *sample))
        })
        .collect::<Vec<_>>();
    latest.sort_by_key(|(first_row, _)| *first_row);

    LatestState {
        entries: latest.into_iter().map(|(_, sample)| sample).collect(),
        order,
    }
}

/// The last `count` samples of `host`, in row order.
pub fn recent_for_host<'a>(samples: &'a [Sample], host: &str, count: usize) -> Vec<&'a Sample> {
    let rows: Vec<&Sample> = samples
        .iter()
        .filter(|sample| sample.host.as_deref() == Some(host))
        .collect();
    let skip = rows.len().saturating_sub(count);
    rows.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use infraview_model::MetricField;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample(row: usize, host: &str, hour: u32, cpu: f64) -> Sample {
        Sample::new(row)
            .with_host(host)
            .with_time(at(hour))
            .with_field(MetricField::CpuPercent, cpu)
    }

    fn cpu_by_host(state: &LatestState) -> Vec<(String, Option<f64>)> {
        state
            .entries
            .iter()
            .map(|s| (s.host.clone().unwrap(), s.number(MetricField::CpuPercent)))
            .collect()
    }

    #[test]
    fn latest_is_max_timestamp_regardless_of_row_order() {
        let samples = vec![
            sample(0, "web-1", 3, 30.0),
            sample(1, "web-1", 1, 10.0),
            sample(2, "web-1", 2, 20.0),
        ];

        let state = latest_by_host(&samples);

        assert_eq!(state.order, SampleOrder::Chronological);
        assert_eq!(cpu_by_host(&state), vec![("web-1".to_string(), Some(30.0))]);
    }

    #[test]
    fn one_entry_per_host_in_first_appearance_order() {
        let samples = vec![
            sample(0, "web-2", 1, 1.0),
            sample(1, "web-1", 1, 2.0),
            sample(2, "web-2", 2, 3.0),
            sample(3, "db-1", 1, 4.0),
        ];

        let state = latest_by_host(&samples);

        assert_eq!(
            cpu_by_host(&state),
            vec![
                ("web-2".to_string(), Some(3.0)),
                ("web-1".to_string(), Some(2.0)),
                ("db-1".to_string(), Some(4.0)),
            ]
        );
        assert_eq!(state.hosts(), vec!["web-2", "web-1", "db-1"]);
    }

    #[test]
    fn ties_keep_last_occurrence() {
        let samples = vec![sample(0, "a", 5, 1.0), sample(1, "a", 5, 2.0)];

        let state = latest_by_host(&samples);

        assert_eq!(state.entries[0].row, 1);
    }

    #[test]
    fn single_sample_is_latest() {
        let samples = vec![sample(0, "solo", 1, 42.0)];
        let state = latest_by_host(&samples);
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.get("solo").map(|s| s.row), Some(0));
    }

    #[test]
    fn unparseable_timestamps_fall_back_to_row_order() {
        let samples = vec![
            sample(0, "a", 9, 1.0),
            Sample::new(1)
                .with_host("a")
                .with_raw_timestamp("not a time")
                .with_field(MetricField::CpuPercent, 2.0),
            sample(2, "a", 1, 3.0),
        ];

        let state = latest_by_host(&samples);

        assert_eq!(state.order, SampleOrder::RowOrder);
        assert_eq!(state.entries[0].row, 2);
    }

    #[test]
    fn samples_without_host_are_ignored() {
        let samples = vec![
            Sample::new(0).with_time(at(1)),
            sample(1, "a", 1, 1.0),
        ];

        let state = latest_by_host(&samples);

        assert_eq!(state.hosts(), vec!["a"]);
    }

    #[test]
    fn empty_table_has_no_latest_state() {
        let state = latest_by_host(&[]);
        assert!(state.entries.is_empty());
    }

    #[test]
    fn recent_window_keeps_row_order() {
        let samples = vec![
            sample(0, "a", 1, 1.0),
            sample(1, "b", 1, 2.0),
            sample(2, "a", 2, 3.0),
            sample(3, "a", 3, 4.0),
        ];

        let rows: Vec<usize> = recent_for_host(&samples, "a", 2)
            .iter()
            .map(|s| s.row)
            .collect();
        assert_eq!(rows, vec![2, 3]);
        assert_eq!(recent_for_host(&samples, "a", 10).len(), 3);
        assert!(recent_for_host(&samples, "c", 10).is_empty());
    }
}
