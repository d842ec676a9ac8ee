//! Stable, comparator-driven merge sort.
//!
//! The condenser needs every record of a cluster to be contiguous, and it
//! treats the first record of each run as the cluster template. The sort
//! therefore has to be stable: records that compare equal keep their input
//! order, so "first record of a cluster" is the first one the reader saw.
//!
//! # Algorithm
//!
//! Classic top-down merge sort. Split at the midpoint, sort each half,
//! then merge by repeatedly taking the head that ranks first. On a tie
//! (neither head precedes the other) the left head is taken, which is what
//! preserves input order.
//!
//! O(n log n) comparisons, O(n) auxiliary space per merge level.

use tracing::instrument;

use crate::record::Record;

/// Sort `items` so that `precedes(a, b) == true` places `a` no later than `b`.
///
/// `precedes` is a strict "less than" predicate. Elements for which it
/// returns false in both directions keep their relative input order.
///
/// Consumes the input and returns a new vector holding every element
/// exactly once.
#[must_use]
pub fn merge_sort_by<T, F>(items: Vec<T>, mut precedes: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> bool,
{
    sort_run(items, &mut precedes)
}

/// Sort ascending by the natural ordering of the elements.
#[must_use]
pub fn merge_sort<T: PartialOrd>(items: Vec<T>) -> Vec<T> {
    merge_sort_by(items, |a, b| a < b)
}

/// Cluster-key ordering used by the pipeline.
///
/// Present keys sort ascending. A record with an absent key sorts after
/// every record with a present key, and two absent keys never precede each
/// other, so their input order is kept.
#[must_use]
pub fn by_cluster_key<K: PartialOrd>(a: &Record<K>, b: &Record<K>) -> bool {
    match (&a.cluster_key, &b.cluster_key) {
        (Some(a), Some(b)) => a < b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Group records by cluster key: [`merge_sort_by`] with [`by_cluster_key`].
#[must_use]
#[instrument(skip_all, fields(records = records.len()))]
pub fn sort_by_cluster_key<K: PartialOrd>(records: Vec<Record<K>>) -> Vec<Record<K>> {
    let sorted = merge_sort_by(records, by_cluster_key);
    tracing::debug!("records sorted by cluster key");
    sorted
}

fn sort_run<T, F>(mut items: Vec<T>, precedes: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> bool,
{
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = sort_run(items, precedes);
    let right = sort_run(right, precedes);
    merge(left, right, precedes)
}

fn merge<T, F>(left: Vec<T>, right: Vec<T>, precedes: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> bool,
{
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        // Right wins only when it strictly precedes; ties stay on the left.
        if precedes(r, l) {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }

    merged.extend(left);
    merged.extend(right);
    merged
}
