//! CSV → [`Record`] decoding.
//!
//! The header row names the fields. The configured cluster-key column is
//! lifted out of the field map and parsed into an `i64`; rows where that
//! fails carry an absent key rather than a sentinel number.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::config::FieldRules;
use crate::error::ErrorCode;
use crate::record::{Fields, Record};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode CSV: {0}")]
    Decode(#[from] csv::Error),
}

impl ReadError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Open { .. } => ErrorCode::InputNotFound,
            Self::Decode(_) => ErrorCode::InputDecodeFailed,
        }
    }
}

/// Open and decode a CSV file.
///
/// # Errors
///
/// Returns [`ReadError::Open`] if the file cannot be opened and
/// [`ReadError::Decode`] on malformed CSV.
pub fn read_path(path: &Path, rules: &FieldRules) -> Result<Vec<Record<i64>>, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(file, rules)
}

/// Decode CSV from any reader. The first row must be a header.
///
/// # Errors
///
/// Returns [`ReadError::Decode`] on malformed CSV or rows whose column
/// count differs from the header.
#[instrument(skip_all, fields(key_column = %rules.cluster_key))]
pub fn read_records<R: Read>(input: R, rules: &FieldRules) -> Result<Vec<Record<i64>>, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let key_index = headers.iter().position(|h| h == rules.cluster_key);
    if key_index.is_none() {
        tracing::warn!(
            column = %rules.cluster_key,
            "cluster key column not in header; every row will have an absent key"
        );
    }

    let mut records = Vec::new();
    let mut unkeyed = 0_usize;

    for row in reader.records() {
        let row = row?;
        let mut cluster_key = None;
        let mut fields = Fields::with_capacity(headers.len());

        for (index, (name, cell)) in headers.iter().zip(row.iter()).enumerate() {
            if Some(index) == key_index {
                cluster_key = parse_cluster_key(cell);
                continue;
            }
            let value = (!cell.is_empty()).then(|| cell.to_string());
            fields.insert(name.to_string(), value);
        }

        if cluster_key.is_none() {
            unkeyed += 1;
            tracing::debug!(
                line = row.position().map(csv::Position::line),
                "row has no usable cluster key"
            );
        }

        records.push(Record {
            cluster_key,
            fields,
        });
    }

    tracing::info!(rows = records.len(), unkeyed, "CSV file successfully processed");
    Ok(records)
}

/// Parse a cluster id leniently: surrounding whitespace is ignored and the
/// longest leading integer is used, so `"12"`, `" 12 "` and `"12.0"` all
/// give `12`. Returns `None` when no leading integer exists.
#[must_use]
pub fn parse_cluster_key(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let sign_len = trimmed.len() - unsigned.len();
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    trimmed[..sign_len + digits].parse().ok()
}
