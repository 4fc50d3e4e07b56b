/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Click engagement: server baseline, local optimistic increments and
//! best-effort reporting.

pub mod counter;
pub mod dispatcher;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::warn;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::registries::{
    CHANNEL_ENGAGEMENT_BASELINE_FETCH_FAILED, CHANNEL_ENGAGEMENT_BASELINE_FETCH_SUCCEEDED,
};
use crate::shell::runtime::diagnostics::emit_received;
pub use counter::EngagementCounter;
pub use dispatcher::ClickDispatcher;
pub use transport::{ClickTransport, HttpClickTransport, TransportError};

/// Fetch the server-side counts once for a new session.
///
/// Any failure yields an empty baseline, so counts show local clicks only.
pub async fn fetch_baseline(transport: &dyn ClickTransport) -> HashMap<String, u64> {
    let started = Instant::now();
    match transport.fetch_counts().await {
        Ok(counts) => {
            emit_received(
                CHANNEL_ENGAGEMENT_BASELINE_FETCH_SUCCEEDED,
                started.elapsed().as_micros() as u64,
            );
            log::debug!("engagement: baseline fetched for {} labels", counts.len());
            counts
        },
        Err(e) => {
            emit_received(
                CHANNEL_ENGAGEMENT_BASELINE_FETCH_FAILED,
                started.elapsed().as_micros() as u64,
            );
            warn!("Click counts unavailable ({e}); showing local clicks only");
            HashMap::new()
        },
    }
}

/// Baseline fetch running in the background.
///
/// Dropping it cancels the request.
pub struct BaselineFetch {
    baseline_rx: Option<oneshot::Receiver<HashMap<String, u64>>>,
    _cancel: DropGuard,
}

impl BaselineFetch {
    /// Start [`fetch_baseline`] on the current tokio runtime.
    pub fn spawn(transport: Arc<dyn ClickTransport>) -> Self {
        let (baseline_tx, baseline_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    log::debug!("engagement: baseline fetch abandoned");
                }
                baseline = fetch_baseline(transport.as_ref()) => {
                    let _ = baseline_tx.send(baseline);
                }
            }
        });
        Self {
            baseline_rx: Some(baseline_rx),
            _cancel: cancel.drop_guard(),
        }
    }

    /// The baseline if it has arrived. Yields it at most once.
    pub fn try_take(&mut self) -> Option<HashMap<String, u64>> {
        let baseline_rx = self.baseline_rx.as_mut()?;
        match baseline_rx.try_recv() {
            Ok(baseline) => {
                self.baseline_rx = None;
                Some(baseline)
            },
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.baseline_rx = None;
                None
            },
        }
    }

    /// Wait up to `grace` for the baseline.
    pub async fn take_within(&mut self, grace: Duration) -> Option<HashMap<String, u64>> {
        let baseline_rx = self.baseline_rx.as_mut()?;
        match tokio::time::timeout(grace, baseline_rx).await {
            Ok(Ok(baseline)) => {
                self.baseline_rx = None;
                Some(baseline)
            },
            Ok(Err(_)) => {
                self.baseline_rx = None;
                None
            },
            Err(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.baseline_rx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::runtime::diagnostics::DiagnosticsState;
    use test_utils::RecordingTransport;

    #[tokio::test]
    async fn baseline_comes_from_transport() {
        let mut diagnostics = DiagnosticsState::new();
        let transport = RecordingTransport::with_baseline(&[("YouTube", 5), ("Gmail", 2)]);
        let baseline = fetch_baseline(&transport).await;
        assert_eq!(baseline.get("YouTube"), Some(&5));
        assert_eq!(baseline.len(), 2);
        assert_eq!(
            diagnostics.channel_count(CHANNEL_ENGAGEMENT_BASELINE_FETCH_SUCCEEDED),
            1
        );
    }

    #[tokio::test]
    async fn failed_fetch_is_an_empty_baseline() {
        let mut diagnostics = DiagnosticsState::new();
        assert!(fetch_baseline(&RecordingTransport::failing()).await.is_empty());
        assert!(fetch_baseline(&RecordingTransport::default()).await.is_empty());
        assert_eq!(
            diagnostics.channel_count(CHANNEL_ENGAGEMENT_BASELINE_FETCH_FAILED),
            2
        );
    }

    #[tokio::test]
    async fn background_fetch_delivers_once() {
        let transport = Arc::new(RecordingTransport::with_baseline(&[("Gmail", 4)]));
        let mut fetch = BaselineFetch::spawn(transport);
        assert!(fetch.is_pending());
        let baseline = fetch
            .take_within(Duration::from_secs(2))
            .await
            .expect("baseline should arrive");
        assert_eq!(baseline.get("Gmail"), Some(&4));
        assert!(!fetch.is_pending());
        assert_eq!(fetch.try_take(), None);
    }

    #[tokio::test]
    async fn stalled_fetch_times_out_and_stays_pending() {
        let mut fetch = BaselineFetch::spawn(Arc::new(RecordingTransport::stalled_counts()));
        assert_eq!(fetch.try_take(), None);
        assert_eq!(fetch.take_within(Duration::from_millis(20)).await, None);
        assert!(fetch.is_pending());
    }
}
