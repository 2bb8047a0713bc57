use std::collections::BTreeMap;

use crate::sequence::event::KeySet;

/// Percussion categories and the note identifiers each one covers.
///
/// Iteration is in category name order, which keeps seeded substitution draws reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: BTreeMap<String, KeySet>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self {
            categories: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, category: impl Into<String>, keys: KeySet) {
        self.categories.insert(category.into(), keys);
    }

    pub fn get(&self, category: &str) -> Option<&KeySet> {
        self.categories.get(category)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeySet)> + '_ {
        self.categories.iter().map(|(name, keys)| (name.as_str(), keys))
    }

    /// The category named by the token before the first `_` of a file stem, if the table knows
    /// it: `sna_groove1` is `sna`.
    pub fn category_of(&self, stem: &str) -> Option<&str> {
        let token = stem.split('_').next()?;
        self.categories
            .get_key_value(token)
            .map(|(name, _)| name.as_str())
    }
}

/// General MIDI percussion groups.
impl Default for CategoryTable {
    fn default() -> Self {
        let mut table = CategoryTable::new();
        table.insert("kick", [35u8, 36].into_iter().collect());
        table.insert("sna", [37u8, 38, 39, 40].into_iter().collect());
        table.insert("toms", [41u8, 43, 45, 47, 48, 50].into_iter().collect());
        table.insert(
            "cym",
            [42u8, 44, 46, 49, 51, 52, 53, 55, 57, 59]
                .into_iter()
                .collect(),
        );
        table
    }
}
