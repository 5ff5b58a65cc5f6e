use std::sync::Arc;

use crate::{
    error::StorageError,
    storage::{KeyValueStore, RECENT_SEARCHES_KEY, get_json, set_json},
};

pub const MAX_RECENT_SEARCHES: usize = 5;

/// Most-recently-used city names, newest first.
#[derive(Debug, Clone)]
pub struct RecentSearches {
    store: Arc<dyn KeyValueStore>,
    items: Vec<String>,
}

impl RecentSearches {
    /// Empty list bound to `store`; call [`RecentSearches::load`] to read the persisted one.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, items: Vec::new() }
    }

    pub fn load(&mut self) -> Result<&[String], StorageError> {
        let mut items: Vec<String> =
            get_json(self.store.as_ref(), RECENT_SEARCHES_KEY)?.unwrap_or_default();
        items.truncate(MAX_RECENT_SEARCHES);
        self.items = items;
        Ok(&self.items)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    /// Move `city` to the front, dropping any older copy and anything past the cap.
    pub fn push(&mut self, city: &str) -> Result<(), StorageError> {
        self.items = promote(&self.items, city);
        set_json(self.store.as_ref(), RECENT_SEARCHES_KEY, &self.items)
    }
}

fn promote(items: &[String], city: &str) -> Vec<String> {
    std::iter::once(city.to_string())
        .chain(items.iter().filter(|c| c.as_str() != city).cloned())
        .take(MAX_RECENT_SEARCHES)
        .collect()
}
