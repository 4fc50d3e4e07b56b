/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Helpers for integration tests.

use crate::persistence::MemoryStore;
use crate::persistence::types::{CUSTOM_LINKS_KEY, ORDERED_LINKS_KEY, StoredLink};

pub use crate::services::engagement::test_utils::RecordingTransport;

/// Memory store pre-populated as if earlier sessions had saved `custom`
/// (label, href pairs) and `order`.
pub fn seeded_store(custom: &[(&str, &str)], order: &[&str]) -> MemoryStore {
    let links: Vec<StoredLink> = custom
        .iter()
        .map(|(label, href)| StoredLink {
            href: href.to_string(),
            label: label.to_string(),
        })
        .collect();
    let mut store = MemoryStore::new();
    if !links.is_empty() {
        store = store.with_raw(
            CUSTOM_LINKS_KEY,
            &serde_json::to_string(&links).unwrap_or_default(),
        );
    }
    if !order.is_empty() {
        store = store.with_raw(
            ORDERED_LINKS_KEY,
            &serde_json::to_string(order).unwrap_or_default(),
        );
    }
    store
}
