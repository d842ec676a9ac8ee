//! Aggregate encoders: CSV and JSON.
//!
//! Appending to an existing CSV file reuses that file's header. Rows are laid
//! out in its column order, and a batch that carries a column the header
//! lacks is rejected before anything is written.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use indexmap::IndexSet;

use crate::error::ErrorCode;
use crate::record::{Aggregate, ID_COLUMN};

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column {0:?} is not in the existing output header")]
    UnknownColumn(String),
}

impl WriteError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) | Self::Csv(_) | Self::Json(_) | Self::UnknownColumn(_) => {
                ErrorCode::OutputWriteFailed
            }
        }
    }
}

/// Output columns: the id column, then every field name in first-seen order.
#[must_use]
pub fn columns(aggregates: &[Aggregate]) -> Vec<&str> {
    let mut names: IndexSet<&str> = IndexSet::new();
    names.insert(ID_COLUMN);
    for aggregate in aggregates {
        names.extend(aggregate.fields.keys().map(String::as_str));
    }
    names.into_iter().collect()
}

/// Write aggregates as CSV with a header row. Absent values become empty
/// cells.
///
/// # Errors
///
/// Returns [`WriteError`] if encoding or the underlying writer fails.
pub fn write_csv<W: Write>(output: W, aggregates: &[Aggregate]) -> Result<(), WriteError> {
    let columns = columns(aggregates);
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&columns)?;
    write_rows(&mut writer, &columns, aggregates)
}

/// Write aggregates as CSV rows under an existing `header`, without
/// repeating it.
///
/// Header columns an aggregate does not have become empty cells.
///
/// # Errors
///
/// Returns [`WriteError::UnknownColumn`] if any aggregate has a field (or
/// the id column) missing from `header`. Nothing is written in that case.
pub fn append_csv<W: Write>(
    output: W,
    aggregates: &[Aggregate],
    header: &[String],
) -> Result<(), WriteError> {
    if let Some(missing) = columns(aggregates)
        .into_iter()
        .find(|column| !header.iter().any(|h| h == column))
    {
        return Err(WriteError::UnknownColumn(missing.to_string()));
    }

    let columns: Vec<&str> = header.iter().map(String::as_str).collect();
    let mut writer = csv::Writer::from_writer(output);
    write_rows(&mut writer, &columns, aggregates)
}

fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    columns: &[&str],
    aggregates: &[Aggregate],
) -> Result<(), WriteError> {
    for aggregate in aggregates {
        let id = aggregate.id.to_string();
        let row = columns.iter().map(|&column| {
            if column == ID_COLUMN {
                id.as_str()
            } else {
                aggregate.get(column).unwrap_or_default()
            }
        });
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write aggregates as a pretty JSON array.
///
/// # Errors
///
/// Returns [`WriteError`] if serialization or the underlying writer fails.
pub fn write_json<W: Write>(mut output: W, aggregates: &[Aggregate]) -> Result<(), WriteError> {
    serde_json::to_writer_pretty(&mut output, aggregates)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

/// An opened output file.
#[derive(Debug)]
pub struct OutputFile {
    pub file: File,
    /// Header row of the content already in the file. `None` when the file
    /// was empty, new, or truncated.
    pub existing_header: Option<Vec<String>>,
}

/// Open an output file, truncating or appending.
///
/// When appending to a file that already holds content, its first row is
/// read back as the header so new rows can follow its column order.
///
/// # Errors
///
/// Returns [`WriteError::Io`] if the file cannot be opened and
/// [`WriteError::Csv`] if the existing header cannot be decoded.
pub fn open_output(path: &Path, append: bool) -> Result<OutputFile, WriteError> {
    if !append {
        return Ok(OutputFile {
            file: File::create(path)?,
            existing_header: None,
        });
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let existing_header = if file.metadata()?.len() > 0 {
        read_header(path)?
    } else {
        None
    };
    Ok(OutputFile {
        file,
        existing_header,
    })
}

fn read_header(path: &Path) -> Result<Option<Vec<String>>, WriteError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(None);
    }
    tracing::debug!(
        path = %path.display(),
        columns = record.len(),
        "appending under existing header"
    );
    Ok(Some(record.iter().map(str::to_string).collect()))
}
