/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for launchpad persistence.

use serde::{Deserialize, Serialize};

/// Key holding the JSON array of custom links.
pub const CUSTOM_LINKS_KEY: &str = "customLinks";
/// Key holding the JSON array of ids in display order.
pub const ORDERED_LINKS_KEY: &str = "orderedLinks";

/// Persisted custom link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLink {
    pub href: String,
    pub label: String,
}

/// One pending value for [`super::KeyValueStore::commit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreWrite {
    pub key: &'static str,
    pub value: String,
}
