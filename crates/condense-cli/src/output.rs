//! Output routing for aggregates, timing reports, and errors.
//!
//! Aggregates go to stdout or `--output`. Errors and timing reports go to
//! stderr so piped CSV/JSON stays clean.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use condense_core::Aggregate;
use condense_core::config::ConfigError;
use condense_core::error::ErrorCode;
use condense_core::io::reader::ReadError;
use condense_core::io::writer::{self, WriteError, append_csv, write_csv, write_json};
use condense_core::timing::StageTimings;
use serde::Serialize;

/// Encodings for condensed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tabular CSV with a `uuid` column first.
    Csv,
    /// Pretty JSON array of objects.
    Json,
}

/// Structured error for terminal and JSON rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    /// Stable `E####` code.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CliError {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = error_code(err);
        Self {
            error_code: code.code().to_string(),
            message: format!("{}: {err:#}", code.message()),
            suggestion: code.hint().map(str::to_string),
        }
    }
}

/// Find the first typed error in the chain and return its code.
pub fn error_code(err: &anyhow::Error) -> ErrorCode {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ReadError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<ConfigError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<WriteError>() {
            return e.code();
        }
    }
    ErrorCode::InternalUnexpected
}

/// Write an error to stderr in the requested format.
pub fn render_error(format: OutputFormat, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match format {
        OutputFormat::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "error[{}]: {}", error.error_code, error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Write aggregates to `path`, or stdout when no path is given.
///
/// Appended CSV follows the header already in the file instead of writing
/// its own.
pub fn write_aggregates(
    format: OutputFormat,
    path: Option<&Path>,
    append: bool,
    aggregates: &[Aggregate],
) -> Result<(), WriteError> {
    let Some(path) = path else {
        return encode(format, io::stdout().lock(), aggregates);
    };

    let opened = writer::open_output(path, append)?;
    let out = BufWriter::new(opened.file);
    match (format, opened.existing_header) {
        (OutputFormat::Csv, Some(header)) => append_csv(out, aggregates, &header),
        _ => encode(format, out, aggregates),
    }
}

fn encode<W: Write>(
    format: OutputFormat,
    out: W,
    aggregates: &[Aggregate],
) -> Result<(), WriteError> {
    match format {
        OutputFormat::Csv => write_csv(out, aggregates),
        OutputFormat::Json => write_json(out, aggregates),
    }
}

/// Write the stage timing report to stderr.
pub fn render_timings(format: OutputFormat, timings: &StageTimings) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &timings.to_json())?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write!(out, "{}", timings.display_table())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn typed_errors_keep_their_codes_through_context() {
        let err = anyhow::Error::new(ReadError::Open {
            path: PathBuf::from("x.csv"),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
        .context("reading input");
        assert_eq!(error_code(&err), ErrorCode::InputNotFound);

        let err = anyhow::Error::new(ConfigError::NotFound(PathBuf::from("c.toml")));
        assert_eq!(error_code(&err), ErrorCode::ConfigParseError);
    }

    #[test]
    fn untyped_errors_are_internal() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(error_code(&err), ErrorCode::InternalUnexpected);

        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.error_code, "E9001");
        assert!(cli.message.contains("boom"));
        assert!(cli.suggestion.is_some());
    }
}
