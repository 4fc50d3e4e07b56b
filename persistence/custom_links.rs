/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! User-added links, kept in insertion order under [`CUSTOM_LINKS_KEY`].

use std::collections::HashSet;

use log::warn;

use super::types::{CUSTOM_LINKS_KEY, StoreWrite, StoredLink};
use super::{KeyValueStore, StoreError, encode_json, load_json_or_default};
use crate::registries::LinkError;
use crate::registries::atomic::catalog::DefaultCatalog;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomLinkStore {
    links: Vec<StoredLink>,
}

impl CustomLinkStore {
    /// Load persisted links. Never fails; see [`load_json_or_default`].
    ///
    /// Records that shadow a built-in id or repeat an earlier label can only
    /// come from outside edits and are dropped here.
    pub fn load(backend: &dyn KeyValueStore, catalog: &DefaultCatalog) -> Self {
        let stored: Vec<StoredLink> = load_json_or_default(backend, CUSTOM_LINKS_KEY);
        let mut seen = HashSet::new();
        let links = stored
            .into_iter()
            .filter(|link| {
                let keep = !catalog.is_builtin(&link.label) && seen.insert(link.label.clone());
                if !keep {
                    warn!("Dropping stored custom link with conflicting label '{}'", link.label);
                }
                keep
            })
            .collect();
        Self { links }
    }

    pub fn links(&self) -> &[StoredLink] {
        &self.links
    }

    pub fn contains(&self, label: &str) -> bool {
        self.links.iter().any(|link| link.label == label)
    }

    /// Add a record at the end. Labels must not collide with any built-in or
    /// custom id.
    pub fn append(&mut self, catalog: &DefaultCatalog, link: StoredLink) -> Result<(), LinkError> {
        if catalog.is_builtin(&link.label) || self.contains(&link.label) {
            return Err(LinkError::DuplicateLabel(link.label));
        }
        self.links.push(link);
        Ok(())
    }

    /// Delete the record with `label`. Returns whether anything was removed.
    pub fn remove(&mut self, label: &str) -> bool {
        let before = self.links.len();
        self.links.retain(|link| link.label != label);
        self.links.len() != before
    }

    /// Encode the current records for a [`KeyValueStore::commit`].
    pub fn to_write(&self) -> Result<StoreWrite, StoreError> {
        encode_json(CUSTOM_LINKS_KEY, &self.links)
    }

    pub fn save(&self, backend: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        backend.commit(&[self.to_write()?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn link(label: &str, href: &str) -> StoredLink {
        StoredLink {
            href: href.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn load_absent_key_is_empty() {
        let store = CustomLinkStore::load(&MemoryStore::new(), &DefaultCatalog::core_seed());
        assert!(store.links().is_empty());
    }

    #[test]
    fn load_unparseable_value_is_empty() {
        let backend = MemoryStore::new().with_raw(CUSTOM_LINKS_KEY, "[{\"href\":");
        let store = CustomLinkStore::load(&backend, &DefaultCatalog::core_seed());
        assert!(store.links().is_empty());
    }

    #[test]
    fn load_drops_builtin_shadows_and_repeats() {
        let backend = MemoryStore::new().with_raw(
            CUSTOM_LINKS_KEY,
            r#"[
                {"href":"https://a.example","label":"A"},
                {"href":"https://yt.example","label":"YouTube"},
                {"href":"https://a2.example","label":"A"},
                {"href":"https://b.example","label":"B"}
            ]"#,
        );
        let store = CustomLinkStore::load(&backend, &DefaultCatalog::core_seed());
        assert_eq!(
            store.links(),
            [link("A", "https://a.example"), link("B", "https://b.example")]
        );
    }

    #[test]
    fn append_rejects_builtin_and_custom_collisions() {
        let catalog = DefaultCatalog::core_seed();
        let mut store = CustomLinkStore::default();
        store.append(&catalog, link("Docs", "https://docs.rs")).unwrap();

        assert_eq!(
            store.append(&catalog, link("YouTube", "https://x.com")),
            Err(LinkError::DuplicateLabel("YouTube".to_string()))
        );
        assert_eq!(
            store.append(&catalog, link("Docs", "https://other.example")),
            Err(LinkError::DuplicateLabel("Docs".to_string()))
        );
        assert_eq!(store.links().len(), 1);
    }

    #[test]
    fn remove_absent_label_is_noop() {
        let mut store = CustomLinkStore::default();
        store
            .append(&DefaultCatalog::core_seed(), link("Docs", "https://docs.rs"))
            .unwrap();
        assert!(!store.remove("docs"));
        assert!(store.remove("Docs"));
        assert!(store.links().is_empty());
    }

    #[test]
    fn save_then_load_preserves_insertion_order() {
        let catalog = DefaultCatalog::core_seed();
        let mut backend = MemoryStore::new();
        let mut store = CustomLinkStore::default();
        for label in ["Zeta", "Alpha", "Mid"] {
            store
                .append(&catalog, link(label, &format!("https://{label}.example")))
                .unwrap();
        }
        store.save(&mut backend).unwrap();

        let reloaded = CustomLinkStore::load(&backend, &catalog);
        let labels: Vec<&str> = reloaded.links().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["Zeta", "Alpha", "Mid"]);
    }
}
