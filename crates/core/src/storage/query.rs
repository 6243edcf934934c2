//! Pure functions for reducing stored revisions to a current view.
//!
//! The backing table keeps superseded revisions around until they are pruned,
//! so every read path goes through these helpers to pick the greatest `rev`
//! per identity before sorting and slicing.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use regex::Regex;

use super::{ItemKey, StoredItem};

/// Anything that carries a document identity and a revision.
pub trait Revisioned {
    fn ide(&self) -> &str;
    fn typ(&self) -> &str;
    fn rev(&self) -> u64;
}

impl Revisioned for StoredItem {
    fn ide(&self) -> &str {
        &self.ide
    }

    fn typ(&self) -> &str {
        &self.typ
    }

    fn rev(&self) -> u64 {
        self.rev
    }
}

impl Revisioned for ItemKey {
    fn ide(&self) -> &str {
        &self.ide
    }

    fn typ(&self) -> &str {
        &self.typ
    }

    fn rev(&self) -> u64 {
        self.rev
    }
}

impl<T: Revisioned> Revisioned for &T {
    fn ide(&self) -> &str {
        (*self).ide()
    }

    fn typ(&self) -> &str {
        (*self).typ()
    }

    fn rev(&self) -> u64 {
        (*self).rev()
    }
}

/// Picks the item with the greatest revision.
pub fn current_item<T: Revisioned>(items: impl IntoIterator<Item = T>) -> Option<T> {
    items.into_iter().max_by_key(|item| item.rev())
}

/// Keeps one item per identity (the greatest revision), sorted ascending by
/// `ide`.
pub fn latest_by_identity<T: Revisioned>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut latest: BTreeMap<(String, String), T> = BTreeMap::new();

    for item in items {
        match latest.entry((item.ide().to_string(), item.typ().to_string())) {
            Entry::Vacant(slot) => {
                slot.insert(item);
            }
            Entry::Occupied(mut slot) => {
                if item.rev() > slot.get().rev() {
                    slot.insert(item);
                }
            }
        }
    }

    latest.into_values().collect()
}

/// Reverses an ascending list when descending order was requested.
pub fn apply_order<T>(mut items: Vec<T>, descending: bool) -> Vec<T> {
    if descending {
        items.reverse();
    }
    items
}

/// Keeps items whose identity matches at least one pattern.
pub fn filter_by_patterns<T: Revisioned>(items: Vec<T>, patterns: &[Regex]) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| patterns.iter().any(|p| p.is_match(item.ide())))
        .collect()
}

/// Drops the first `skip` items and keeps at most `limit` of the rest.
pub fn paginate<T>(items: Vec<T>, skip: Option<usize>, limit: Option<usize>) -> Vec<T> {
    items
        .into_iter()
        .skip(skip.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Keys of items older than `revision`.
pub fn stale_revisions<T: Revisioned>(items: &[T], revision: u64) -> Vec<ItemKey> {
    items
        .iter()
        .filter(|item| item.rev() < revision)
        .map(to_key)
        .collect()
}

/// Keys of items at exactly `revision`.
pub fn revisions_at<T: Revisioned>(items: &[T], revision: u64) -> Vec<ItemKey> {
    items
        .iter()
        .filter(|item| item.rev() == revision)
        .map(to_key)
        .collect()
}

/// Sorted, deduplicated identities.
pub fn unique_sorted_ids<T: Revisioned>(items: impl IntoIterator<Item = T>) -> Vec<String> {
    let mut ids: Vec<String> = items.into_iter().map(|i| i.ide().to_string()).collect();
    ids.sort();
    ids.dedup();
    ids
}

fn to_key<T: Revisioned>(item: &T) -> ItemKey {
    ItemKey {
        ide: item.ide().to_string(),
        typ: item.typ().to_string(),
        rev: item.rev(),
    }
}
