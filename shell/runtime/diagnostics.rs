/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Named diagnostic channels.
//!
//! Registry and engagement code emits [`DiagnosticEvent`]s at decision points.
//! Events go to a process-global `crossbeam-channel` sender when one is
//! installed and are otherwise dropped. Tests install a thread-local sender
//! through [`DiagnosticsState::new`] so parallel tests do not observe each
//! other's events.

use std::collections::HashMap;
use std::sync::OnceLock;

use crossbeam_channel::{Receiver, Sender, unbounded};

static GLOBAL_DIAGNOSTICS_TX: OnceLock<Sender<DiagnosticEvent>> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_DIAGNOSTICS_TX: std::cell::RefCell<Option<Sender<DiagnosticEvent>>> =
        const { std::cell::RefCell::new(None) };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    MessageSent {
        channel_id: &'static str,
        byte_len: usize,
    },
    MessageReceived {
        channel_id: &'static str,
        latency_us: u64,
    },
}

impl DiagnosticEvent {
    pub fn channel_id(&self) -> &'static str {
        match self {
            DiagnosticEvent::MessageSent { channel_id, .. }
            | DiagnosticEvent::MessageReceived { channel_id, .. } => channel_id,
        }
    }
}

pub(crate) fn install_global_sender(sender: Sender<DiagnosticEvent>) {
    let _ = GLOBAL_DIAGNOSTICS_TX.set(sender.clone());

    #[cfg(test)]
    {
        TEST_DIAGNOSTICS_TX.with(|slot| {
            *slot.borrow_mut() = Some(sender);
        });
    }
}

pub(crate) fn emit_event(event: DiagnosticEvent) {
    // Unit tests only see their own thread's events.
    #[cfg(test)]
    {
        TEST_DIAGNOSTICS_TX.with(|slot| {
            if let Some(tx) = slot.borrow().as_ref() {
                let _ = tx.send(event);
            }
        });
    }

    #[cfg(not(test))]
    {
        if let Some(tx) = GLOBAL_DIAGNOSTICS_TX.get() {
            let _ = tx.send(event);
        }
    }
}

/// Shorthand for a sent-message event sized by its payload.
pub(crate) fn emit_sent(channel_id: &'static str, byte_len: usize) {
    emit_event(DiagnosticEvent::MessageSent {
        channel_id,
        byte_len,
    });
}

/// Shorthand for a received-message event.
pub(crate) fn emit_received(channel_id: &'static str, latency_us: u64) {
    emit_event(DiagnosticEvent::MessageReceived {
        channel_id,
        latency_us,
    });
}

/// Receiving end of the diagnostics channel with per-channel counters.
pub struct DiagnosticsState {
    rx: Receiver<DiagnosticEvent>,
    message_counts: HashMap<&'static str, u64>,
}

impl DiagnosticsState {
    /// Create the channel and install its sender.
    ///
    /// Only the first installation in a process becomes the global sender.
    /// In unit tests the sender is also bound to the calling thread.
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        install_global_sender(tx);
        Self {
            rx,
            message_counts: HashMap::new(),
        }
    }

    /// Pull everything queued so far into the counters.
    pub fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            *self.message_counts.entry(event.channel_id()).or_insert(0) += 1;
        }
    }

    pub fn channel_count(&mut self, channel_id: &str) -> u64 {
        self.drain();
        self.message_counts.get(channel_id).copied().unwrap_or(0)
    }

    /// Counters as a sorted `channel → count` list.
    pub fn snapshot(&mut self) -> Vec<(&'static str, u64)> {
        self.drain();
        let mut counts: Vec<_> = self
            .message_counts
            .iter()
            .map(|(channel, count)| (*channel, *count))
            .collect();
        counts.sort_unstable();
        counts
    }
}

impl Default for DiagnosticsState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_events_per_channel() {
        let mut diagnostics = DiagnosticsState::new();
        emit_sent("test.alpha", 3);
        emit_sent("test.alpha", 1);
        emit_received("test.beta", 1);

        assert_eq!(diagnostics.channel_count("test.alpha"), 2);
        assert_eq!(diagnostics.channel_count("test.beta"), 1);
        assert_eq!(diagnostics.channel_count("test.gamma"), 0);
        assert_eq!(
            diagnostics.snapshot(),
            vec![("test.alpha", 2), ("test.beta", 1)]
        );
    }
}
