/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Launchpad application state: the link registry and its engagement counts.
//!
//! [`LaunchpadApp`] is the single owner of both stores, the derived registry
//! and the click counter. Every mutation stages new store contents, commits
//! them to the backend in one write, and only then swaps them in and
//! recomputes the registry. A failed write leaves everything as it was, so a
//! caller never observes a half-applied mutation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::model::link::LinkEntry;
use crate::persistence::custom_links::CustomLinkStore;
use crate::persistence::order::OrderStore;
use crate::persistence::types::StoredLink;
use crate::persistence::KeyValueStore;
use crate::registries::atomic::catalog::DefaultCatalog;
use crate::registries::{
    CHANNEL_ENGAGEMENT_CLICK_RECORDED, CHANNEL_LINK_ADD_REJECTED, CHANNEL_LINK_ADD_SUCCEEDED,
    CHANNEL_LINK_REMOVE_IGNORED, CHANNEL_LINK_REMOVE_SUCCEEDED, CHANNEL_ORDER_REORDERED,
    LinkError, merge,
};
use crate::services::engagement::{
    BaselineFetch, ClickDispatcher, ClickTransport, EngagementCounter,
};
use crate::shell::runtime::diagnostics::emit_sent;

/// UI events the registry reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkIntent {
    AddLink { url: String, label: String },
    RemoveLink { label: String },
    Reorder { order: Vec<String> },
    /// Drag `from` onto the slot currently held by `to`.
    MoveLink { from: String, to: String },
    RecordClick { label: String },
    ResetState,
}

pub struct LaunchpadApp {
    catalog: DefaultCatalog,
    backend: Box<dyn KeyValueStore>,
    custom: CustomLinkStore,
    order: OrderStore,
    registry: Vec<LinkEntry>,
    engagement: EngagementCounter,
    /// `Some` until the session's baseline has been applied or abandoned.
    baseline: Option<BaselineFetch>,
    clicks: ClickDispatcher,
}

impl LaunchpadApp {
    /// Load the registry without analytics: empty baseline, clicks counted
    /// locally only.
    pub fn load(backend: Box<dyn KeyValueStore>) -> Self {
        Self::with_engagement(backend, None, ClickDispatcher::disabled())
    }

    /// Start a session on the current tokio runtime.
    ///
    /// The registry is usable immediately. The click baseline is fetched in
    /// the background and applied by [`Self::poll_baseline`] or
    /// [`Self::wait_for_baseline`] once it arrives; until then counts show
    /// local clicks only.
    pub fn start_session(
        backend: Box<dyn KeyValueStore>,
        transport: Option<Arc<dyn ClickTransport>>,
    ) -> Self {
        let Some(transport) = transport else {
            return Self::load(backend);
        };
        Self::with_engagement(
            backend,
            Some(BaselineFetch::spawn(Arc::clone(&transport))),
            ClickDispatcher::spawn(transport),
        )
    }

    fn with_engagement(
        backend: Box<dyn KeyValueStore>,
        baseline: Option<BaselineFetch>,
        clicks: ClickDispatcher,
    ) -> Self {
        let catalog = DefaultCatalog::core_seed();
        let custom = CustomLinkStore::load(backend.as_ref(), &catalog);
        let order = OrderStore::load(backend.as_ref());
        let registry = merge::compute(catalog.entries(), custom.links(), order.ids());
        log::debug!(
            "launchpad: loaded {} links ({} custom, {} ordered)",
            registry.len(),
            custom.links().len(),
            order.ids().len()
        );
        Self {
            catalog,
            backend,
            custom,
            order,
            registry,
            engagement: EngagementCounter::default(),
            baseline,
            clicks,
        }
    }

    /// The merged display list.
    pub fn registry(&self) -> &[LinkEntry] {
        &self.registry
    }

    pub fn catalog(&self) -> &DefaultCatalog {
        &self.catalog
    }

    pub fn custom_links(&self) -> &[StoredLink] {
        self.custom.links()
    }

    /// Order as persisted, which may name ids that no longer exist.
    pub fn persisted_order(&self) -> &[String] {
        self.order.ids()
    }

    pub fn engagement(&self) -> &EngagementCounter {
        &self.engagement
    }

    pub fn get(&self, id: &str) -> Option<&LinkEntry> {
        self.registry.iter().find(|entry| entry.id == id)
    }

    /// Add a custom link at the end of the current order.
    pub fn add(&mut self, url: &str, label: &str) -> Result<&[LinkEntry], LinkError> {
        let url = url.trim();
        let label = label.trim();
        if url.is_empty() || label.is_empty() {
            emit_sent(CHANNEL_LINK_ADD_REJECTED, label.len());
            return Err(LinkError::InvalidInput);
        }

        let mut custom = self.custom.clone();
        if let Err(e) = custom.append(
            &self.catalog,
            StoredLink {
                href: url.to_string(),
                label: label.to_string(),
            },
        ) {
            emit_sent(CHANNEL_LINK_ADD_REJECTED, label.len());
            log::debug!("launchpad: add rejected: {e}");
            return Err(e);
        }

        let mut order = self.order.clone();
        let mut ids = merge::order_of(&self.registry);
        ids.push(label.to_string());
        order.set(ids);

        self.commit(Some(custom), order)?;
        emit_sent(CHANNEL_LINK_ADD_SUCCEEDED, label.len().saturating_add(url.len()));
        log::info!("launchpad: added '{label}' -> {url}");
        Ok(&self.registry)
    }

    /// Remove a custom link. Unknown and built-in ids are ignored.
    pub fn remove(&mut self, label: &str) -> Result<&[LinkEntry], LinkError> {
        if self.catalog.is_builtin(label) || !self.custom.contains(label) {
            emit_sent(CHANNEL_LINK_REMOVE_IGNORED, label.len());
            log::debug!("launchpad: ignoring remove of '{label}'");
            return Ok(&self.registry);
        }

        let mut custom = self.custom.clone();
        custom.remove(label);
        let mut order = self.order.clone();
        order.remove(label);

        self.commit(Some(custom), order)?;
        emit_sent(CHANNEL_LINK_REMOVE_SUCCEEDED, label.len());
        log::info!("launchpad: removed '{label}'");
        Ok(&self.registry)
    }

    /// Persist `new_order` verbatim and recompute. Ids left out keep their
    /// base position after the mentioned ones; unknown ids are ignored by the
    /// merge.
    pub fn reorder(&mut self, new_order: Vec<String>) -> Result<&[LinkEntry], LinkError> {
        let len = new_order.len();
        self.order.save(self.backend.as_mut(), new_order)?;
        self.recompute();
        emit_sent(CHANNEL_ORDER_REORDERED, len);
        Ok(&self.registry)
    }

    /// Move `from` to the current position of `to`, shifting the entries in
    /// between. No-op if the ids are equal or either is unknown.
    pub fn move_link(&mut self, from: &str, to: &str) -> Result<&[LinkEntry], LinkError> {
        let position = |id: &str| self.registry.iter().position(|entry| entry.id == id);
        let (Some(old_index), Some(new_index)) = (position(from), position(to)) else {
            return Ok(&self.registry);
        };
        if old_index == new_index {
            return Ok(&self.registry);
        }
        let mut ids = merge::order_of(&self.registry);
        let moved = ids.remove(old_index);
        ids.insert(new_index, moved);
        self.reorder(ids)
    }

    /// Clear both stores. Click counts are untouched.
    pub fn reset(&mut self) -> Result<&[LinkEntry], LinkError> {
        self.backend.clear()?;
        self.custom = CustomLinkStore::default();
        self.order = OrderStore::default();
        self.recompute();
        log::info!("launchpad: persisted links cleared");
        Ok(&self.registry)
    }

    /// Apply the session baseline if it has arrived. Returns whether it was
    /// applied by this call.
    pub fn poll_baseline(&mut self) -> bool {
        let Some(baseline) = self.baseline.as_mut().and_then(BaselineFetch::try_take) else {
            return false;
        };
        self.install_baseline(baseline);
        true
    }

    /// Wait up to `grace` for the session baseline and apply it.
    pub async fn wait_for_baseline(&mut self, grace: Duration) -> bool {
        let Some(fetch) = self.baseline.as_mut() else {
            return false;
        };
        match fetch.take_within(grace).await {
            Some(baseline) => {
                self.install_baseline(baseline);
                true
            },
            None => false,
        }
    }

    pub fn baseline_pending(&self) -> bool {
        self.baseline.as_ref().is_some_and(BaselineFetch::is_pending)
    }

    fn install_baseline(&mut self, baseline: HashMap<String, u64>) {
        log::debug!("launchpad: click baseline applied for {} labels", baseline.len());
        self.engagement.apply_baseline(baseline);
        self.baseline = None;
    }

    /// Count a click locally and report it in the background. Returns the new
    /// displayed count, which does not depend on the report's outcome.
    pub fn record_click(&mut self, id: &str) -> u64 {
        self.poll_baseline();
        let count = self.engagement.record_local_click(id);
        emit_sent(CHANNEL_ENGAGEMENT_CLICK_RECORDED, id.len());
        self.clicks.notify(id);
        count
    }

    pub fn displayed_count(&self, id: &str) -> u64 {
        self.engagement.displayed_count(id)
    }

    pub fn apply_intents<I>(&mut self, intents: I) -> Vec<LinkError>
    where
        I: IntoIterator<Item = LinkIntent>,
    {
        intents
            .into_iter()
            .filter_map(|intent| self.apply_intent(intent).err())
            .collect()
    }

    pub fn apply_intent(&mut self, intent: LinkIntent) -> Result<(), LinkError> {
        match intent {
            LinkIntent::AddLink { url, label } => self.add(&url, &label).map(|_| ()),
            LinkIntent::RemoveLink { label } => self.remove(&label).map(|_| ()),
            LinkIntent::Reorder { order } => self.reorder(order).map(|_| ()),
            LinkIntent::MoveLink { from, to } => self.move_link(&from, &to).map(|_| ()),
            LinkIntent::RecordClick { label } => {
                self.record_click(&label);
                Ok(())
            },
            LinkIntent::ResetState => self.reset().map(|_| ()),
        }
    }

    /// Wait up to `grace` for the click reports sent so far. Reports still
    /// running afterwards keep going, and later clicks are reported as usual.
    /// Returns whether everything finished in time.
    pub async fn drain_clicks(&mut self, grace: Duration) -> bool {
        if tokio::time::timeout(grace, self.clicks.flush()).await.is_ok() {
            return true;
        }
        log::debug!(
            "launchpad: {} click reports still pending after {grace:?}",
            self.clicks.outstanding()
        );
        false
    }

    /// Stop reporting clicks and abandon the baseline fetch and any reports
    /// still in flight.
    pub async fn shutdown(&mut self) {
        self.baseline = None;
        log::debug!(
            "launchpad: session ending with {} local clicks",
            self.engagement.pending_total()
        );
        self.clicks.shutdown().await;
    }

    /// Hand back the storage backend, ending the session.
    pub fn into_backend(self) -> Box<dyn KeyValueStore> {
        self.backend
    }

    fn commit(&mut self, custom: Option<CustomLinkStore>, order: OrderStore) -> Result<(), LinkError> {
        let mut writes = Vec::with_capacity(2);
        if let Some(custom) = custom.as_ref() {
            writes.push(custom.to_write()?);
        }
        writes.push(order.to_write()?);
        self.backend.commit(&writes)?;

        if let Some(custom) = custom {
            self.custom = custom;
        }
        self.order = order;
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        self.registry = merge::compute(self.catalog.entries(), self.custom.links(), self.order.ids());
    }
}

impl std::fmt::Debug for LaunchpadApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchpadApp")
            .field("registry", &self.registry)
            .field("engagement", &self.engagement)
            .finish_non_exhaustive()
    }
}
