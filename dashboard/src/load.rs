use crate::error::PipelineError;
use crate::frame::MetricTable;
use infraview_model::DashboardWarning;
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Read a single CSV source with a header row.
///
/// Every column is read as text. Cells are interpreted one by one when samples are extracted,
/// so a stray non-numeric value never fails the whole source.
pub fn read_source(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Load every source and concatenate them in order.
///
/// A source that cannot be read is skipped and reported in `warnings`. Columns are combined
/// diagonally, so a column missing from one source is null for that source's rows. Fails with
/// [`PipelineError::NoDataAvailable`] if no source could be read.
pub fn load_sources(
    sources: &[PathBuf],
    warnings: &mut Vec<DashboardWarning>,
) -> Result<MetricTable, PipelineError> {
    let mut frames = Vec::with_capacity(sources.len());

    for path in sources {
        log::debug!("Loading source {}", path.display());
        match read_source(path) {
            Ok(frame) => {
                log::debug!("Loaded {} rows from {}", frame.height(), path.display());
                frames.push(frame.lazy());
            }
            Err(e) => {
                let warning = DashboardWarning::SourceReadFailure {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                };
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    if frames.is_empty() {
        return Err(PipelineError::NoDataAvailable);
    }

    let frame = concat_lf_diagonal(
        frames,
        UnionArgs {
            to_supertypes: true,
            ..Default::default()
        },
    )?
    .collect()?;

    Ok(MetricTable::new(frame))
}
