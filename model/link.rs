/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Link entries as the presentation layer sees them.

use serde::{Deserialize, Serialize};

/// Where a link came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkOrigin {
    BuiltIn,
    Custom,
}

/// Closed set of identities a link can render as.
///
/// Built-in catalog entries map to their brand; every user-added link renders
/// as [`LinkIdentity::Custom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkIdentity {
    YouTube,
    Twitter,
    Instagram,
    Gmail,
    Twitch,
    ChatGpt,
    Custom,
}

impl LinkIdentity {
    pub const BUILT_IN: [LinkIdentity; 6] = [
        LinkIdentity::YouTube,
        LinkIdentity::Twitter,
        LinkIdentity::Instagram,
        LinkIdentity::Gmail,
        LinkIdentity::Twitch,
        LinkIdentity::ChatGpt,
    ];

    /// Label used as the link id. `None` for custom links, whose label is
    /// user-chosen.
    pub fn builtin_label(self) -> Option<&'static str> {
        match self {
            LinkIdentity::YouTube => Some("YouTube"),
            LinkIdentity::Twitter => Some("Twitter"),
            LinkIdentity::Instagram => Some("Instagram"),
            LinkIdentity::Gmail => Some("Gmail"),
            LinkIdentity::Twitch => Some("Twitch"),
            LinkIdentity::ChatGpt => Some("ChatGPT"),
            LinkIdentity::Custom => None,
        }
    }

    /// Brand accent colour as a `#RRGGBB` string.
    pub fn accent_hex(self) -> &'static str {
        match self {
            LinkIdentity::YouTube => "#FF0000",
            LinkIdentity::Twitter => "#1DA1F2",
            LinkIdentity::Instagram => "#EC4899",
            LinkIdentity::Gmail => "#EA4335",
            LinkIdentity::Twitch => "#9146FF",
            LinkIdentity::ChatGpt => "#10A37F",
            LinkIdentity::Custom => "#FFFFFF",
        }
    }

    /// Exact (case-sensitive) match against the built-in labels.
    pub fn from_builtin_label(label: &str) -> Option<Self> {
        Self::BUILT_IN
            .into_iter()
            .find(|identity| identity.builtin_label() == Some(label))
    }
}

/// One shortcut in the registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkEntry {
    /// The label. Unique and case-sensitive within a registry.
    pub id: String,
    pub target: String,
    pub origin: LinkOrigin,
    pub identity: LinkIdentity,
}

impl LinkEntry {
    pub(crate) fn builtin(identity: LinkIdentity, target: &str) -> Self {
        Self {
            id: identity.builtin_label().unwrap_or_default().to_string(),
            target: target.to_string(),
            origin: LinkOrigin::BuiltIn,
            identity,
        }
    }

    pub fn custom(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: label.into(),
            target: target.into(),
            origin: LinkOrigin::Custom,
            identity: LinkIdentity::Custom,
        }
    }

    /// Whether the delete affordance applies to this entry.
    pub fn is_removable(&self) -> bool {
        self.origin == LinkOrigin::Custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_labels_roundtrip_through_identity() {
        for identity in LinkIdentity::BUILT_IN {
            let label = identity.builtin_label().expect("built-in has label");
            assert_eq!(LinkIdentity::from_builtin_label(label), Some(identity));
        }
    }

    #[test]
    fn builtin_label_lookup_is_case_sensitive() {
        assert_eq!(LinkIdentity::from_builtin_label("youtube"), None);
        assert_eq!(LinkIdentity::from_builtin_label("Chatgpt"), None);
    }

    #[test]
    fn custom_entries_are_removable_and_neutral() {
        let entry = LinkEntry::custom("Docs", "https://docs.rs");
        assert!(entry.is_removable());
        assert_eq!(entry.identity.accent_hex(), "#FFFFFF");
        assert!(!LinkEntry::builtin(LinkIdentity::Gmail, "https://mail.google.com").is_removable());
    }
}
