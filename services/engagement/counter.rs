/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Two-tier click counts.
//!
//! `displayed = baseline + pending`, where `baseline` is the server snapshot
//! taken once at session start and `pending` counts local clicks since then.
//! Pending clicks are never reconciled against the server within a session:
//! a click whose notification is lost stays visible locally until the next
//! session and is then gone for good. That under-count is accepted.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementCounter {
    baseline: HashMap<String, u64>,
    pending: HashMap<String, u64>,
}

impl EngagementCounter {
    /// Start a session from a fetched baseline with no pending clicks.
    pub fn new(baseline: HashMap<String, u64>) -> Self {
        Self {
            baseline,
            pending: HashMap::new(),
        }
    }

    /// Install a baseline that arrived after clicks were already recorded.
    /// Pending clicks are kept.
    pub fn apply_baseline(&mut self, baseline: HashMap<String, u64>) {
        self.baseline = baseline;
    }

    pub fn baseline_count(&self, id: &str) -> u64 {
        self.baseline.get(id).copied().unwrap_or(0)
    }

    pub fn pending_delta(&self, id: &str) -> u64 {
        self.pending.get(id).copied().unwrap_or(0)
    }

    pub fn displayed_count(&self, id: &str) -> u64 {
        self.baseline_count(id)
            .saturating_add(self.pending_delta(id))
    }

    /// Count one local click and return the new displayed count.
    pub fn record_local_click(&mut self, id: &str) -> u64 {
        let pending = self.pending.entry(id.to_string()).or_insert(0);
        *pending = pending.saturating_add(1);
        self.displayed_count(id)
    }

    /// Total clicks recorded locally this session.
    pub fn pending_total(&self) -> u64 {
        self.pending.values().fold(0, |acc, n| acc.saturating_add(*n))
    }
}
