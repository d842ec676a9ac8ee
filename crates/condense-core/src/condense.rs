//! Cluster condenser.
//!
//! Walks a sequence already grouped by cluster key and reduces each
//! contiguous same-key run to one [`Aggregate`].
//!
//! # Merge rule
//!
//! The first record of a run is the template. Its non-discarded fields are
//! copied verbatim. For each later record and each mergeable field:
//!
//! - empty incoming value: ignored;
//! - no baseline yet: the value replaces the aggregate's and becomes the
//!   baseline;
//! - value differs from the baseline: appended with the separator;
//! - value equals the baseline: ignored.
//!
//! The baseline is only ever the first non-empty value seen. A repeat of a
//! later distinct value is therefore appended again. See
//! `repeated_later_value_is_appended_again` below.
//!
//! The input is trusted to be grouped; nothing is sorted or verified here.

use tracing::instrument;
use uuid::Uuid;

use crate::config::{FieldRules, MissingKeyPolicy};
use crate::record::{Aggregate, Fields, Record};

/// Reduces grouped records to aggregates under a set of [`FieldRules`].
#[derive(Debug, Clone, Default)]
pub struct Condenser {
    rules: FieldRules,
}

impl Condenser {
    #[must_use]
    pub const fn new(rules: FieldRules) -> Self {
        Self { rules }
    }

    /// Condense grouped records, assigning each aggregate a random v4 UUID.
    #[must_use]
    pub fn condense<K: PartialEq>(&self, sorted: &[Record<K>]) -> Vec<Aggregate> {
        self.condense_with_ids(sorted, Uuid::new_v4)
    }

    /// Condense grouped records, drawing surrogate ids from `next_id`.
    ///
    /// One aggregate per cluster, in the order clusters first appear.
    /// An empty input yields an empty output.
    #[must_use]
    #[instrument(skip_all, fields(records = sorted.len()))]
    pub fn condense_with_ids<K, F>(&self, sorted: &[Record<K>], mut next_id: F) -> Vec<Aggregate>
    where
        K: PartialEq,
        F: FnMut() -> Uuid,
    {
        let merge_fields: Vec<&str> = self
            .rules
            .merge
            .iter()
            .map(String::as_str)
            .filter(|name| !self.rules.is_discarded(name))
            .collect();

        let mut aggregates = Vec::new();
        let mut start = 0;

        for end in 1..=sorted.len() {
            if end < sorted.len() && self.same_cluster(&sorted[start], &sorted[end]) {
                continue;
            }

            let template = &sorted[start];
            let rest = &sorted[start + 1..end];
            aggregates.push(self.finalize(template, rest, &merge_fields, next_id()));
            start = end;
        }

        tracing::debug!(clusters = aggregates.len(), "records condensed");
        aggregates
    }

    fn same_cluster<K: PartialEq>(&self, current: &Record<K>, next: &Record<K>) -> bool {
        match (&current.cluster_key, &next.cluster_key) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.rules.missing_key == MissingKeyPolicy::Group,
            _ => false,
        }
    }

    fn finalize<'a, K>(
        &self,
        template: &'a Record<K>,
        rest: &'a [Record<K>],
        merge_fields: &[&str],
        id: Uuid,
    ) -> Aggregate {
        let mut fields: Fields = template
            .fields
            .iter()
            .filter(|(name, _)| !self.rules.is_discarded(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let mut baselines: Vec<Option<&'a str>> = merge_fields
            .iter()
            .map(|name| template.present(name))
            .collect();

        for record in rest {
            for (name, baseline) in merge_fields.iter().zip(baselines.iter_mut()) {
                let Some(value) = record.present(name) else {
                    continue;
                };

                match *baseline {
                    None => {
                        fields.insert((*name).to_string(), Some(value.to_string()));
                        *baseline = Some(value);
                    }
                    Some(first) if first != value => {
                        append(&mut fields, name, value, &self.rules.separator);
                    }
                    Some(_) => {}
                }
            }
        }

        tracing::trace!(size = rest.len() + 1, %id, "cluster finalized");
        Aggregate { id, fields }
    }
}

/// Condense with the given rules and random surrogate ids.
#[must_use]
pub fn condense<K: PartialEq>(sorted: &[Record<K>], rules: &FieldRules) -> Vec<Aggregate> {
    Condenser::new(rules.clone()).condense(sorted)
}

fn append(fields: &mut Fields, name: &str, value: &str, separator: &str) {
    let slot = fields.entry(name.to_string()).or_insert(None);
    match slot {
        Some(existing) => {
            existing.push_str(separator);
            existing.push_str(value);
        }
        None => *slot = Some(value.to_string()),
    }
}
