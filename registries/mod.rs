/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod atomic;
pub mod merge;

use crate::persistence::StoreError;

pub const CHANNEL_LINK_ADD_SUCCEEDED: &str = "registry.link.add_succeeded";
pub const CHANNEL_LINK_ADD_REJECTED: &str = "registry.link.add_rejected";
pub const CHANNEL_LINK_REMOVE_SUCCEEDED: &str = "registry.link.remove_succeeded";
pub const CHANNEL_LINK_REMOVE_IGNORED: &str = "registry.link.remove_ignored";
pub const CHANNEL_ORDER_REORDERED: &str = "registry.order.reordered";
pub const CHANNEL_PERSISTENCE_LOAD_FALLBACK_USED: &str = "persistence.load.fallback_used";
pub const CHANNEL_ENGAGEMENT_BASELINE_FETCH_SUCCEEDED: &str =
    "engagement.baseline.fetch_succeeded";
pub const CHANNEL_ENGAGEMENT_BASELINE_FETCH_FAILED: &str = "engagement.baseline.fetch_failed";
pub const CHANNEL_ENGAGEMENT_CLICK_RECORDED: &str = "engagement.click.recorded";
pub const CHANNEL_ENGAGEMENT_CLICK_DROPPED: &str = "engagement.click.dropped";

/// Rejections from registry mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Label or URL was empty after trimming.
    InvalidInput,
    /// Label collides with an existing built-in or custom id.
    DuplicateLabel(String),
    /// The backend refused the write; nothing changed.
    Storage(StoreError),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::InvalidInput => write!(f, "Label and URL must not be empty"),
            LinkError::DuplicateLabel(label) => write!(f, "A link named '{label}' already exists"),
            LinkError::Storage(e) => write!(f, "Storage error: {e}"),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for LinkError {
    fn from(e: StoreError) -> Self {
        LinkError::Storage(e)
    }
}
