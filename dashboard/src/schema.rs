use crate::error::PipelineError;
use infraview_model::{MetricField, REQUIRED_FIELDS};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Canonicalize a raw column name.
///
/// Trims whitespace, replaces `%` with `percent`, spaces and hyphens with `_`, then lowercases.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .replace('%', "percent")
        .replace(' ', "_")
        .replace('-', "_")
        .to_lowercase()
}

/// Find the first alias of `field` present among already normalized column names.
///
/// Returns the matching normalized name, or [`None`] if no alias matches.
pub fn find_column<'a>(field: MetricField, normalized: &'a [String]) -> Option<&'a str> {
    field.aliases().iter().find_map(|alias| {
        let alias = normalize_column_name(alias);
        normalized
            .iter()
            .find(|column| **column == alias)
            .map(String::as_str)
    })
}

/// Where sample timestamps come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampSource {
    /// The raw name of the column holding timestamps.
    Column(String),
    /// No timestamp column, a timeline is synthesized from row order.
    Synthesized,
}

/// The result of reconciling a table's columns with the canonical vocabulary.
///
/// Maps fields to *raw* column names, the table itself is never renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    fields: BTreeMap<MetricField, String>,
    /// Non-canonical columns as (normalized name, raw name).
    extras: Vec<(String, String)>,
    available: Vec<String>,
}

impl ResolvedSchema {
    /// Resolve every canonical field against the given raw column names.
    ///
    /// This never fails, fields without a matching column are simply unresolved. Use
    /// [`ResolvedSchema::require`] to enforce the presence of fields.
    pub fn resolve(raw_columns: &[String]) -> Self {
        let normalized: Vec<String> = raw_columns
            .iter()
            .map(|c| normalize_column_name(c))
            .collect();

        // First raw column wins when several normalize to the same name
        let raw_for = |name: &str| {
            normalized
                .iter()
                .position(|n| n == name)
                .map(|i| raw_columns[i].clone())
        };

        let fields: BTreeMap<MetricField, String> = MetricField::iter()
            .filter_map(|field| {
                find_column(field, &normalized)
                    .and_then(&raw_for)
                    .map(|raw| (field, raw))
            })
            .collect();

        let mut extras: Vec<(String, String)> = Vec::new();
        for (name, raw) in normalized.iter().zip(raw_columns) {
            let taken = fields.values().any(|r| r == raw)
                || fields.keys().any(|f| f.name() == name.as_str())
                || extras.iter().any(|(n, _)| n == name);
            if !taken {
                extras.push((name.clone(), raw.clone()));
            }
        }

        log::debug!("Resolved columns {fields:?}, extra columns {extras:?}");

        Self {
            fields,
            extras,
            available: raw_columns.to_vec(),
        }
    }

    /// The raw column for a canonical field.
    pub fn column(&self, field: MetricField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Resolved canonical fields and their raw columns.
    pub fn fields(&self) -> impl Iterator<Item = (MetricField, &str)> {
        self.fields.iter().map(|(f, raw)| (*f, raw.as_str()))
    }

    /// Columns outside the canonical vocabulary, as (normalized name, raw name).
    pub fn extras(&self) -> &[(String, String)] {
        &self.extras
    }

    /// The raw column names the schema was resolved from.
    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn timestamp(&self) -> TimestampSource {
        match self.column(MetricField::Timestamp) {
            Some(raw) => TimestampSource::Column(raw.to_string()),
            None => TimestampSource::Synthesized,
        }
    }

    /// Fail with [`PipelineError::MissingRequiredColumn`] if any of `required` is unresolved.
    pub fn require(&self, required: &[MetricField]) -> Result<(), PipelineError> {
        let missing: Vec<MetricField> = required
            .iter()
            .filter(|field| !self.fields.contains_key(field))
            .copied()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::MissingRequiredColumn {
                fields: missing,
                available: self.available.clone(),
            })
        }
    }
}

/// Resolve the schema of a table and check the fields every view depends on.
pub fn normalize_schema(raw_columns: &[String]) -> Result<ResolvedSchema, PipelineError> {
    let schema = ResolvedSchema::resolve(raw_columns);
    schema.require(&REQUIRED_FIELDS)?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn normalize_raw_names() {
        assert_eq!(normalize_column_name("  CPU %  "), "cpu_percent");
        assert_eq!(normalize_column_name("Memory-Usage"), "memory_usage");
        assert_eq!(normalize_column_name("disk%"), "diskpercent");
        assert_eq!(normalize_column_name("Top Process Name"), "top_process_name");
    }

    #[test]
    fn normalization_is_idempotent_on_canonical_names() {
        for field in MetricField::iter() {
            assert_eq!(normalize_column_name(field.name()), field.name());
        }
    }

    #[test]
    fn every_alias_resolves_in_any_spelling() {
        for field in MetricField::iter() {
            for alias in field.aliases() {
                let variants = [
                    alias.to_string(),
                    alias.to_uppercase(),
                    alias.replace('_', " "),
                    alias.replace('_', "-"),
                    format!("  {alias} "),
                ];
                for variant in variants {
                    let schema = ResolvedSchema::resolve(&[variant.clone()]);
                    assert_eq!(
                        schema.column(field),
                        Some(variant.as_str()),
                        "{variant} should resolve to {field}"
                    );
                }
            }
        }
    }

    #[test]
    fn percent_sign_variants_resolve() {
        let schema = ResolvedSchema::resolve(&columns(&["Hostname", "CPU%", "Memory %", "Disk-Usage"]));

        assert_eq!(schema.column(MetricField::Host), Some("Hostname"));
        assert_eq!(schema.column(MetricField::CpuPercent), Some("CPU%"));
        assert_eq!(schema.column(MetricField::MemoryPercent), Some("Memory %"));
        assert_eq!(schema.column(MetricField::DiskPercent), Some("Disk-Usage"));
    }

    #[test]
    fn first_alias_in_preference_order_wins() {
        // `cpu_percent` precedes `cpu` in the alias list, whatever the column order
        let schema = ResolvedSchema::resolve(&columns(&["cpu", "cpu_percent"]));
        assert_eq!(schema.column(MetricField::CpuPercent), Some("cpu_percent"));
    }

    #[test]
    fn first_raw_column_wins_on_normalized_collision() {
        let schema = ResolvedSchema::resolve(&columns(&["CPU Percent", "cpu_percent"]));
        assert_eq!(schema.column(MetricField::CpuPercent), Some("CPU Percent"));
    }

    #[test]
    fn extra_columns_keep_normalized_names() {
        let schema =
            ResolvedSchema::resolve(&columns(&["host", "cpu", "Load Avg", "load_avg", "cpu_percent"]));

        // `cpu` lost to `cpu_percent` and is kept as a plain column
        assert_eq!(
            schema.extras(),
            &[
                ("cpu".to_string(), "cpu".to_string()),
                ("load_avg".to_string(), "Load Avg".to_string())
            ]
        );
        assert_eq!(schema.column(MetricField::CpuPercent), Some("cpu_percent"));
    }

    #[test]
    fn canonical_schema_is_unchanged() {
        let raw = columns(&[
            "host",
            "timestamp",
            "cpu_percent",
            "memory_percent",
            "disk_percent",
        ]);
        let schema = normalize_schema(&raw).unwrap();

        let resolved: Vec<(MetricField, &str)> = schema.fields().collect();
        assert_eq!(
            resolved,
            vec![
                (MetricField::Host, "host"),
                (MetricField::Timestamp, "timestamp"),
                (MetricField::CpuPercent, "cpu_percent"),
                (MetricField::MemoryPercent, "memory_percent"),
                (MetricField::DiskPercent, "disk_percent"),
            ]
        );
        assert!(schema.extras().is_empty());
    }

    #[test]
    fn missing_host_fails() {
        let raw = columns(&["name", "cpu", "mem", "disk"]);
        let err = normalize_schema(&raw).unwrap_err();

        match err {
            PipelineError::MissingRequiredColumn { fields, available } => {
                assert_eq!(fields, vec![MetricField::Host]);
                assert_eq!(available, raw);
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let err = normalize_schema(&columns(&["server"])).unwrap_err();
        let PipelineError::MissingRequiredColumn { fields, .. } = err else {
            panic!("Expected missing column error");
        };
        assert_eq!(
            fields,
            vec![
                MetricField::CpuPercent,
                MetricField::MemoryPercent,
                MetricField::DiskPercent
            ]
        );
    }

    #[test]
    fn timestamp_falls_back_to_synthesized() {
        let schema = ResolvedSchema::resolve(&columns(&["host", "Date"]));
        assert_eq!(schema.timestamp(), TimestampSource::Column("Date".to_string()));

        let schema = ResolvedSchema::resolve(&columns(&["host"]));
        assert_eq!(schema.timestamp(), TimestampSource::Synthesized);
    }
}
