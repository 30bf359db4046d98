//! Set-based provenance matching between call records.
//!
//! Two records are candidates for the same underlying event when the origin
//! sets carried in their provenance tag (`SNAME` by default) intersect. The
//! matching functions here are the only place where a missing provenance tag
//! is downgraded to "no match possible"; the record model itself always
//! reports a missing tag as an error.

use crate::{core::record::Record, utils::util::Result};
use std::collections::HashSet;

/// Splits a comma-separated tag value into a set of origin identifiers.
/// An empty string yields the empty set, not a set holding one empty id.
pub fn set_from_string(string: &str) -> HashSet<String> {
    if string.is_empty() {
        return HashSet::new();
    }
    string.split(',').map(str::to_string).collect()
}

/// The origin set of a record, read from `tag_name`. Propagates
/// `TagNotFound` when the record does not carry the tag.
pub fn origin_set(record: &Record, tag_name: &str) -> Result<HashSet<String>> {
    Ok(set_from_string(record.get_tag(tag_name)?))
}

/// True iff the origin sets of `a` and `b` intersect. A missing provenance
/// tag on either side means no match, never an error.
pub fn matches(a: &Record, b: &Record, tag_name: &str) -> bool {
    match (origin_set(a, tag_name), origin_set(b, tag_name)) {
        (Ok(a_set), Ok(b_set)) => !a_set.is_disjoint(&b_set),
        _ => false,
    }
}

/// Cross-file overlap test: on a positive match, appends `b_id` to the
/// record's `found_tag` (comma-joined, created if absent) so downstream
/// consumers can see which candidate matched. Callers short-circuit on the
/// first match, so at most one id is recorded per invocation.
pub fn matches_and_annotate(
    a: &mut Record,
    b_id: &str,
    b_set: &HashSet<String>,
    tag_name: &str,
    found_tag: &str,
) -> bool {
    let a_set = match origin_set(a, tag_name) {
        Ok(set) => set,
        Err(_) => return false,
    };
    if a_set.is_disjoint(b_set) {
        return false;
    }
    let value = match a.get_tag(found_tag) {
        Ok(existing) if !existing.is_empty() => format!("{existing},{b_id}"),
        _ => b_id.to_string(),
    };
    a.set_tag(found_tag, &value);
    true
}

/// Returns every candidate id whose origin set intersects `query_set`, in
/// candidate order. No intersection anywhere yields an empty list, never an
/// error. Unlike the cross-file filter this reports *all* matches; the merge
/// engine needs the full membership picture.
pub fn overlapping_ids<T: Clone>(
    query_set: &HashSet<String>,
    candidates: &[(T, HashSet<String>)],
) -> Vec<T> {
    candidates
        .iter()
        .filter(|(_, set)| !query_set.is_disjoint(set))
        .map(|(id, _)| id.clone())
        .collect()
}
