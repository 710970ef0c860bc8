use serde::{Deserialize, Serialize};

/// A problem that degrades a refresh cycle without stopping it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardWarning {
    /// A source could not be read and was skipped.
    #[display("Could not load {path} ({reason})")]
    SourceReadFailure { path: String, reason: String },
    /// No column resolved to a timestamp, so one was synthesized from row order.
    #[display("No timestamp column found, using the current row order")]
    TimestampUnavailable,
    /// Some timestamps could not be parsed, so samples are ordered by row.
    #[display("Timestamp column `{column}` has unparseable values (e.g. `{example}`), using the current row order")]
    TimestampUnparseable { column: String, example: String },
    /// The requested host is not present in the data.
    #[display("Host `{host}` not found, showing `{fallback}` instead")]
    UnknownHost { host: String, fallback: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_source() {
        let warning = DashboardWarning::SourceReadFailure {
            path: "s1.csv".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(warning.to_string(), "Could not load s1.csv (not found)");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(DashboardWarning::TimestampUnavailable).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "timestamp_unavailable" }));
    }
}
