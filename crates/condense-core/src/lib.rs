#![forbid(unsafe_code)]
//! condense-core library.
//!
//! Collapses rows that share a pre-assigned cluster id into one aggregate
//! record per cluster. Two stages, run in order by [`pipeline::run_pipeline`]:
//!
//! 1. [`sort`] groups rows so each cluster is contiguous (stable merge sort).
//! 2. [`condense`] walks the grouped rows and merges each run.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at module seams, each mapping to an
//!   [`error::ErrorCode`]. Sort and condense are total and never fail.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod condense;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod record;
pub mod sort;
pub mod timing;

pub use condense::Condenser;
pub use config::{FieldRules, MissingKeyPolicy, ProjectConfig};
pub use record::{Aggregate, FieldValue, Record};

/// Render a count with thousands separators, e.g. `1234567` → `"1,234,567"`.
#[must_use]
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
