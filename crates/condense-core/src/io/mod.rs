//! Boundary collaborators: decode input rows, encode aggregates.
//!
//! Nothing here is needed by the sort or the condenser; both work on
//! in-memory slices and can be fed from any source.

pub mod reader;
pub mod writer;

pub use reader::{ReadError, read_path, read_records};
pub use writer::{WriteError, append_csv, write_csv, write_json};
