//! Driver: read → sort → condense.

use std::path::Path;

use tracing::instrument;

use crate::condense::Condenser;
use crate::config::FieldRules;
use crate::io::reader::{self, ReadError};
use crate::record::{Aggregate, Record};
use crate::sort::sort_by_cluster_key;
use crate::timing::StageTimings;

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Rows decoded from the input.
    pub rows_read: usize,
    /// One aggregate per cluster, ascending by cluster key.
    pub aggregates: Vec<Aggregate>,
}

/// Sort records by cluster key, then condense each cluster.
#[must_use]
pub fn sort_and_condense<K: PartialOrd>(
    records: Vec<Record<K>>,
    condenser: &Condenser,
    timings: &mut StageTimings,
) -> Vec<Aggregate> {
    let sorted = timings.time("sort", || sort_by_cluster_key(records));
    timings.time("condense", || condenser.condense(&sorted))
}

/// Read a CSV file and condense it under `rules`.
///
/// # Errors
///
/// Returns [`ReadError`] if the file cannot be opened or decoded. Sorting and
/// condensing never fail.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn run_pipeline(
    path: &Path,
    rules: &FieldRules,
    timings: &mut StageTimings,
) -> Result<PipelineOutput, ReadError> {
    let records = timings.time("read", || reader::read_path(path, rules))?;
    let rows_read = records.len();

    let condenser = Condenser::new(rules.clone());
    let aggregates = sort_and_condense(records, &condenser, timings);

    Ok(PipelineOutput {
        rows_read,
        aggregates,
    })
}
