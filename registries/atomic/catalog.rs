use crate::model::link::{LinkEntry, LinkIdentity};

const CATALOG_TARGETS: [(LinkIdentity, &str); 6] = [
    (LinkIdentity::YouTube, "https://www.youtube.com"),
    (LinkIdentity::Twitter, "https://twitter.com"),
    (LinkIdentity::Instagram, "https://www.instagram.com"),
    (LinkIdentity::Gmail, "https://mail.google.com"),
    (LinkIdentity::Twitch, "https://www.twitch.tv"),
    (LinkIdentity::ChatGpt, "https://chat.openai.com"),
];

/// Fixed built-in links in canonical order.
#[derive(Debug, Clone)]
pub struct DefaultCatalog {
    entries: Vec<LinkEntry>,
}

impl DefaultCatalog {
    pub fn core_seed() -> Self {
        Self {
            entries: CATALOG_TARGETS
                .iter()
                .map(|(identity, target)| LinkEntry::builtin(*identity, target))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    pub fn is_builtin(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&LinkEntry> {
        let identity = LinkIdentity::from_builtin_label(id)?;
        self.entries.iter().find(|entry| entry.identity == identity)
    }
}

impl Default for DefaultCatalog {
    fn default() -> Self {
        Self::core_seed()
    }
}
