/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Preferred display order, kept under [`ORDERED_LINKS_KEY`].

use super::types::{ORDERED_LINKS_KEY, StoreWrite};
use super::{KeyValueStore, StoreError, encode_json, load_json_or_default};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderStore {
    order: Vec<String>,
}

impl OrderStore {
    /// Load the persisted order. An absent or corrupt value is an empty order.
    pub fn load(backend: &dyn KeyValueStore) -> Self {
        Self {
            order: load_json_or_default(backend, ORDERED_LINKS_KEY),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Replace the order wholesale.
    pub fn set(&mut self, order: Vec<String>) {
        self.order = order;
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.order.len();
        self.order.retain(|existing| existing != id);
        self.order.len() != before
    }

    pub fn to_write(&self) -> Result<StoreWrite, StoreError> {
        encode_json(ORDERED_LINKS_KEY, &self.order)
    }

    /// Overwrite the persisted order with `order`.
    pub fn save(
        &mut self,
        backend: &mut dyn KeyValueStore,
        order: Vec<String>,
    ) -> Result<(), StoreError> {
        let write = encode_json(ORDERED_LINKS_KEY, &order)?;
        backend.commit(&[write])?;
        self.order = order;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn load_absent_or_corrupt_is_empty() {
        assert!(OrderStore::load(&MemoryStore::new()).ids().is_empty());
        let corrupt = MemoryStore::new().with_raw(ORDERED_LINKS_KEY, "[1, 2");
        assert!(OrderStore::load(&corrupt).ids().is_empty());
    }

    #[test]
    fn save_overwrites_verbatim() {
        let mut backend = MemoryStore::new();
        let mut store = OrderStore::default();
        store.save(&mut backend, ids(&["b", "a", "b"])).unwrap();
        store.save(&mut backend, ids(&["gone", "a"])).unwrap();

        assert_eq!(backend.raw(ORDERED_LINKS_KEY), Some(r#"["gone","a"]"#));
        assert_eq!(OrderStore::load(&backend).ids(), ids(&["gone", "a"]));
    }

    #[test]
    fn failed_save_keeps_previous_order() {
        let mut backend = MemoryStore::new();
        let mut store = OrderStore::default();
        store.save(&mut backend, ids(&["a"])).unwrap();
        backend.set_read_only(true);

        assert!(store.save(&mut backend, ids(&["b"])).is_err());
        assert_eq!(store.ids(), ids(&["a"]));
    }
}
