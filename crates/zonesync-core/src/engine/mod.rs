//! Reconciliation engine
//!
//! Computes the minimal set of provider writes that turns an observed record
//! collection into a declared one.
//!
//! ## Algorithm
//!
//! ```text
//!   old records ──sort by key──► key → count ─┐
//!                                              ├─► excess on old side = to_remove
//!   new records ──sort by key──► key → count ─┘   excess on new side = to_add
//! ```
//!
//! Both sides are compared as multisets of canonical keys. A record whose key
//! appears equally often on both sides is never touched, so an unchanged
//! record never costs a provider write. Duplicates are handled by counting:
//! old `[A, A, B]` against new `[A, B, B]` removes one `A` and adds one `B`.
//!
//! Output order is canonical-key order, independent of input order.

use std::collections::BTreeMap;

use crate::record::{Record, RecordType};

/// Writes needed to converge two record collections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Records to create, in canonical-key order
    pub to_add: Vec<Record>,
    /// Records to delete, in canonical-key order
    pub to_remove: Vec<Record>,
}

impl Diff {
    /// Whether both sides already match
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Total number of writes
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// A declared grouping of records sharing discriminators
///
/// Each shape flattens itself into individual records before diffing, so
/// the engine only ever compares [`Record`]s.
pub trait RecordGroup {
    /// Expand the group into records for `zone`/`subname`
    fn flatten(&self, zone: &str, subname: &str, record_type: RecordType) -> Vec<Record>;
}

/// Scalar values (A, AAAA, TXT, CNAME)
impl RecordGroup for String {
    fn flatten(&self, zone: &str, subname: &str, record_type: RecordType) -> Vec<Record> {
        vec![Record::new(zone, subname, record_type, self)]
    }
}

/// Flatten a slice of groups into records
pub fn flatten_groups<G: RecordGroup>(
    zone: &str,
    subname: &str,
    record_type: RecordType,
    groups: &[G],
) -> Vec<Record> {
    groups
        .iter()
        .flat_map(|g| g.flatten(zone, subname, record_type))
        .collect()
}

fn keyed(records: &[Record]) -> Vec<(String, &Record)> {
    let mut keyed: Vec<(String, &Record)> =
        records.iter().map(|r| (r.canonical_key(), r)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed
}

fn counts(keyed: &[(String, &Record)]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (key, _) in keyed {
        *counts.entry(key.clone()).or_insert(0) += 1;
    }
    counts
}

/// Records of `side` whose key occurs more often than in `other`, by the excess
fn excess(side: &[(String, &Record)], other: &BTreeMap<String, usize>) -> Vec<Record> {
    let mut remaining = counts(side);
    for (key, count) in remaining.iter_mut() {
        *count = count.saturating_sub(other.get(key).copied().unwrap_or(0));
    }

    let mut out = Vec::new();
    for (key, record) in side {
        if let Some(n) = remaining.get_mut(key) {
            if *n > 0 {
                *n -= 1;
                out.push((*record).clone());
            }
        }
    }
    out
}

/// Diff two flattened record collections
///
/// # Parameters
///
/// - `old`: Observed (or previously declared) records
/// - `new`: Declared records
///
/// # Returns
///
/// A [`Diff`] whose `to_remove` and `to_add` are sorted by canonical key
pub fn diff(old: &[Record], new: &[Record]) -> Diff {
    let old = keyed(old);
    let new = keyed(new);

    Diff {
        to_remove: excess(&old, &counts(&new)),
        to_add: excess(&new, &counts(&old)),
    }
}

/// Diff two collections of declared groups
pub fn diff_groups<G: RecordGroup>(
    zone: &str,
    subname: &str,
    record_type: RecordType,
    old: &[G],
    new: &[G],
) -> Diff {
    diff(
        &flatten_groups(zone, subname, record_type, old),
        &flatten_groups(zone, subname, record_type, new),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(value: &str) -> Record {
        Record::new("example.com", "www", RecordType::A, value)
    }

    fn contents(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.content.as_str()).collect()
    }

    #[test]
    fn test_identical_sets_produce_empty_diff() {
        let set = vec![a("1.1.1.1"), a("2.2.2.2"), a("2.2.2.2")];
        let d = diff(&set, &set);
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_swapping_sides_swaps_results() {
        let old = vec![a("1.1.1.1"), a("2.2.2.2"), a("3.3.3.3")];
        let new = vec![a("2.2.2.2"), a("4.4.4.4")];

        let forward = diff(&old, &new);
        let backward = diff(&new, &old);

        assert_eq!(forward.to_add, backward.to_remove);
        assert_eq!(forward.to_remove, backward.to_add);
        assert_eq!(forward.len(), backward.len());
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let old = vec![a("3.3.3.3"), a("1.1.1.1"), a("2.2.2.2"), a("1.1.1.1")];
        let new = vec![a("5.5.5.5"), a("1.1.1.1"), a("4.4.4.4")];
        let expected = diff(&old, &new);

        let mut old_rev = old.clone();
        old_rev.reverse();
        let mut new_rot = new.clone();
        new_rot.rotate_left(1);

        assert_eq!(diff(&old_rev, &new_rot), expected);
        assert_eq!(contents(&expected.to_remove), vec!["1.1.1.1", "2.2.2.2", "3.3.3.3"]);
        assert_eq!(contents(&expected.to_add), vec!["4.4.4.4", "5.5.5.5"]);
    }

    #[test]
    fn test_multiplicity_is_counted() {
        let old = vec![a("A"), a("A"), a("B")];
        let new = vec![a("A"), a("B"), a("B")];

        let d = diff(&old, &new);
        assert_eq!(contents(&d.to_remove), vec!["A"]);
        assert_eq!(contents(&d.to_add), vec!["B"]);
    }

    #[test]
    fn test_empty_sides() {
        let set = vec![a("2.2.2.2"), a("1.1.1.1")];

        let create = diff(&[], &set);
        assert!(create.to_remove.is_empty());
        assert_eq!(contents(&create.to_add), vec!["1.1.1.1", "2.2.2.2"]);

        let destroy = diff(&set, &[]);
        assert!(destroy.to_add.is_empty());
        assert_eq!(destroy.to_remove.len(), 2);

        assert!(diff(&[], &[]).is_empty());
    }

    #[test]
    fn test_reordered_values_are_unchanged() {
        let old: Vec<String> = vec!["1.1.1.1".into(), "2.2.2.2".into()];
        let new: Vec<String> = vec!["2.2.2.2".into(), "1.1.1.1".into()];
        assert!(diff_groups("example.com", "www", RecordType::A, &old, &new).is_empty());
    }

    #[test]
    fn test_discriminators_participate_in_identity() {
        let old = vec![Record::new("z", "@", RecordType::Mx, "mx").with_priority(10)];
        let new = vec![Record::new("z", "@", RecordType::Mx, "mx").with_priority(20)];

        let d = diff(&old, &new);
        assert_eq!(d.to_remove[0].priority, Some(10));
        assert_eq!(d.to_add[0].priority, Some(20));
    }
}
