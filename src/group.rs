//! Alphabetical grouping of entry records
//!
//! A group collection maps the initial letter of each entry's sort key to
//! the entries starting with it. Letters without entries have no group.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Initial letter -> entries, sorted by their sort key
pub type GroupCollection<T> = BTreeMap<String, Vec<T>>;

/// Case applied to group letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterCase {
    Upper,
    Lower,
}

impl LetterCase {
    /// Group letter for a sort key, or None for an empty key
    pub fn initial(&self, key: &str) -> Option<String> {
        let first = key.chars().next()?;
        Some(match self {
            LetterCase::Upper => first.to_uppercase().collect(),
            LetterCase::Lower => first.to_lowercase().collect(),
        })
    }
}

/// Compare sort keys case-insensitively, falling back to the raw keys so
/// the order is total
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort entries by key and group them by initial letter
///
/// Entries with an empty sort key have no initial and are dropped; callers
/// reject those before grouping.
pub fn group_by_initial<T, F>(mut entries: Vec<T>, sort_key: F, case: LetterCase) -> GroupCollection<T>
where
    F: Fn(&T) -> &str,
{
    entries.sort_by(|a, b| compare_keys(sort_key(a), sort_key(b)));

    let mut groups: GroupCollection<T> = BTreeMap::new();
    for entry in entries {
        if let Some(letter) = case.initial(sort_key(&entry)) {
            groups.entry(letter).or_default().push(entry);
        }
    }

    groups
}
