use crate::error::PipelineError;
use crate::schema::{ResolvedSchema, TimestampSource};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use infraview_model::{FieldValue, MetricField, Sample};
use polars::prelude::*;

/// Spacing in days of the synthesized timeline used when a table has no timestamp column.
const SYNTHESIZED_TICK_DAYS: i64 = 1;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// The unified table of every sample loaded in a refresh cycle.
///
/// Wraps the concatenated [`DataFrame`] with its original column names. Samples are extracted
/// through a [`ResolvedSchema`], which never renames the frame itself.
#[derive(Debug, Clone)]
pub struct MetricTable {
    frame: DataFrame,
}

impl MetricTable {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Extract every row as a [`Sample`] keyed by canonical field names.
    ///
    /// `now` anchors the synthesized timeline when the schema has no timestamp column.
    pub fn samples(
        &self,
        schema: &ResolvedSchema,
        now: NaiveDateTime,
    ) -> Result<Vec<Sample>, PipelineError> {
        let height = self.height();
        let mut samples: Vec<Sample> = (0..height).map(Sample::new).collect();

        if let Some(raw) = schema.column(MetricField::Host) {
            for (sample, host) in samples.iter_mut().zip(self.column_text(raw)?) {
                sample.host = host
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty());
            }
        }

        match schema.timestamp() {
            TimestampSource::Column(raw) => {
                for (sample, timestamp) in samples.iter_mut().zip(self.column_text(&raw)?) {
                    sample.time = timestamp.as_deref().and_then(parse_timestamp);
                    sample.timestamp = timestamp;
                }
            }
            TimestampSource::Synthesized => {
                for (sample, time) in samples.iter_mut().zip(synthesize_timeline(height, now)) {
                    sample.set_time(time);
                }
            }
        }

        let metric_columns = schema
            .fields()
            .filter(|(field, _)| !matches!(field, MetricField::Host | MetricField::Timestamp))
            .map(|(field, raw)| (field.name().to_string(), raw.to_string()));
        let extra_columns = schema.extras().iter().cloned();

        for (name, raw) in metric_columns.chain(extra_columns) {
            for (sample, value) in samples.iter_mut().zip(self.column_text(&raw)?) {
                if let Some(value) = value.as_deref().and_then(FieldValue::parse) {
                    sample.fields.insert(name.clone(), value);
                }
            }
        }

        Ok(samples)
    }

    /// Read a column as text, whatever its inferred type.
    fn column_text(&self, name: &str) -> Result<Vec<Option<String>>, PolarsError> {
        let column = self.frame.column(name)?.cast(&DataType::String)?;
        let values = column
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect();
        Ok(values)
    }
}

impl From<DataFrame> for MetricTable {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

/// Parse a timestamp cell.
///
/// Accepts RFC 3339, the common `date time` layouts, a bare date and Unix epoch seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.naive_utc());
    }

    if let Some(time) = TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(time);
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    raw.parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map(|time| time.naive_utc())
}

/// A timeline of `len` ticks ending at `end`, oldest first.
pub fn synthesize_timeline(len: usize, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    (0..len)
        .map(|i| end - Duration::days(SYNTHESIZED_TICK_DAYS * (len - 1 - i) as i64))
        .collect()
}
