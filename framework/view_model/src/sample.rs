use crate::field::MetricField;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell value of a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret a raw cell.
    ///
    /// Blank cells and `NaN` are treated as absent, anything that parses as a float is a number
    /// and everything else is kept as text.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_nan() => None,
            Ok(value) => Some(FieldValue::Number(value)),
            Err(_) => Some(FieldValue::Text(trimmed.to_string())),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One row of ingested data, keyed by canonical field names.
///
/// Columns which are not part of the canonical vocabulary are kept under their normalized name.
/// A field that was empty or missing in the source is absent from [`Sample::fields`], which is
/// not the same as a zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Position of the row in the unified table.
    pub row: usize,
    pub host: Option<String>,
    /// The timestamp as written in the source, or the synthesized one when the source had none.
    pub timestamp: Option<String>,
    /// The parsed timestamp, if it could be parsed.
    pub time: Option<NaiveDateTime>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Sample {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            host: None,
            timestamp: None,
            time: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builds a [`Sample`] with the given host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Builds a [`Sample`] with a parsed timestamp, using its display form as the raw timestamp.
    pub fn with_time(mut self, time: NaiveDateTime) -> Self {
        self.set_time(time);
        self
    }

    /// Builds a [`Sample`] with a raw timestamp that could not be parsed.
    pub fn with_raw_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self.time = None;
        self
    }

    /// Builds a [`Sample`] with the given canonical field set.
    pub fn with_field(mut self, field: MetricField, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.name().to_string(), value.into());
        self
    }

    /// Set the parsed timestamp, replacing the raw one with its display form.
    pub fn set_time(&mut self, time: NaiveDateTime) {
        self.timestamp = Some(time.format(TIMESTAMP_DISPLAY_FORMAT).to_string());
        self.time = Some(time);
    }

    pub fn get(&self, field: MetricField) -> Option<&FieldValue> {
        self.fields.get(field.name())
    }

    /// The numeric value of a field, or [`None`] if it is absent or not a number.
    pub fn number(&self, field: MetricField) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// The display text of a field, whatever its type.
    pub fn text(&self, field: MetricField) -> Option<String> {
        self.get(field).map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_values() {
        assert_eq!(FieldValue::parse(" 75.5 "), Some(FieldValue::Number(75.5)));
        assert_eq!(FieldValue::parse("42"), Some(FieldValue::Number(42.0)));
        assert_eq!(
            FieldValue::parse("postgres"),
            Some(FieldValue::Text("postgres".to_string()))
        );
        assert_eq!(FieldValue::parse(""), None);
        assert_eq!(FieldValue::parse("   "), None);
        assert_eq!(FieldValue::parse("NaN"), None);
    }

    #[test]
    fn whole_numbers_display_without_fraction() {
        assert_eq!(FieldValue::Number(1234.0).to_string(), "1234");
        assert_eq!(FieldValue::Number(12.5).to_string(), "12.5");
    }

    #[test]
    fn absent_field_is_not_zero() {
        let sample = Sample::new(0)
            .with_host("web-1")
            .with_field(MetricField::CpuPercent, 0.0);

        assert_eq!(sample.number(MetricField::CpuPercent), Some(0.0));
        assert_eq!(sample.number(MetricField::MemoryPercent), None);
    }

    #[test]
    fn text_value_is_not_a_number() {
        let sample = Sample::new(0).with_field(MetricField::CpuPercent, "n/a");

        assert_eq!(sample.number(MetricField::CpuPercent), None);
        assert_eq!(sample.text(MetricField::CpuPercent).as_deref(), Some("n/a"));
    }
}
