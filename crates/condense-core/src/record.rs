//! In-memory record shapes that flow through the pipeline.
//!
//! A [`Record`] is one input row: an optional, comparable cluster key plus an
//! ordered map of field name to [`FieldValue`]. An [`Aggregate`] is the single
//! row synthesized for a whole cluster, carrying a fresh surrogate id.
//!
//! Field order is preserved (`IndexMap`) so tabular output keeps the column
//! order of the input file.

use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap};
use uuid::Uuid;

/// A scalar field value. `None` is an absent / null cell.
pub type FieldValue = Option<String>;

/// Ordered field map shared by records and aggregates.
pub type Fields = IndexMap<String, FieldValue>;

/// One input row.
///
/// The cluster key is kept out of `fields`: it is parsed into its comparable
/// type by the reader before sorting, and never appears in an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<K = i64> {
    /// Pre-assigned cluster id. `None` when the row carries no usable key.
    pub cluster_key: Option<K>,
    /// All remaining fields, in input column order.
    pub fields: Fields,
}

impl<K> Record<K> {
    /// Create an empty record with the given key.
    #[must_use]
    pub fn new(cluster_key: Option<K>) -> Self {
        Self {
            cluster_key,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion, mostly for tests and fixtures.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    /// Insert an explicitly absent field.
    #[must_use]
    pub fn with_absent(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// Look up a field's value as a string slice, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    /// A field's value when it counts for merging. Absent values and empty
    /// strings both read as `None`.
    #[must_use]
    pub fn present(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }
}

/// The synthesized record representing one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Surrogate id, generated once per aggregate.
    pub id: Uuid,
    /// Carry-through and merged fields. Never contains identity-discard fields.
    pub fields: Fields,
}

impl Aggregate {
    /// Look up a field's value as a string slice, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }
}

/// Column name used for the surrogate id in serialized output.
pub const ID_COLUMN: &str = "uuid";

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_COLUMN, &self.id)?;
        for (name, value) in &self.fields {
            // A field literally named `uuid` would shadow the id column.
            if name != ID_COLUMN {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}
