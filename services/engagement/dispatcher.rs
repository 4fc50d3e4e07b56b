/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fire-and-forget delivery of click notifications.
//!
//! The owning context hands labels to [`ClickDispatcher::notify`] without
//! waiting. A supervised worker drains the queue and runs each delivery as its
//! own task, so one hung request never holds back the next.
//!
//! Delivery is at most once:
//! - a full queue drops the notification
//! - a failed request is logged and forgotten
//! - shutdown abandons whatever is still in flight
//!
//! None of these touch the local counts. [`ClickDispatcher::flush`] waits for
//! outstanding deliveries without closing the queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::transport::ClickTransport;
use crate::registries::CHANNEL_ENGAGEMENT_CLICK_DROPPED;
use crate::shell::runtime::diagnostics::emit_sent;

/// Capacity of the notification queue.
const CLICK_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClickNotice {
    pub(crate) label: String,
}

/// Notifications accepted by [`ClickDispatcher::notify`] and not yet
/// finished.
#[derive(Debug, Default)]
struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

impl Outstanding {
    fn begin(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

pub struct ClickDispatcher {
    /// `None` when analytics are disabled or after [`Self::shutdown`].
    notice_tx: Option<mpsc::Sender<ClickNotice>>,
    outstanding: Arc<Outstanding>,
    cancel: CancellationToken,
    workers: JoinSet<()>,
}

impl ClickDispatcher {
    /// Dispatcher that drops every notification.
    pub fn disabled() -> Self {
        Self {
            notice_tx: None,
            outstanding: Arc::default(),
            cancel: CancellationToken::new(),
            workers: JoinSet::new(),
        }
    }

    /// Spawn the delivery worker on the current tokio runtime.
    pub fn spawn(transport: Arc<dyn ClickTransport>) -> Self {
        let (notice_tx, notice_rx) = mpsc::channel(CLICK_CHANNEL_CAPACITY);
        let outstanding = Arc::new(Outstanding::default());
        let cancel = CancellationToken::new();
        let mut workers = JoinSet::new();
        let worker_cancel = cancel.clone();
        let worker_outstanding = Arc::clone(&outstanding);
        workers.spawn(async move {
            tokio::select! {
                _ = worker_cancel.cancelled() => {
                    log::debug!("click_dispatcher: worker cancelled");
                }
                _ = click_worker(transport, notice_rx, worker_outstanding) => {}
            }
        });
        log::debug!("click_dispatcher: worker spawned");
        Self {
            notice_tx: Some(notice_tx),
            outstanding,
            cancel,
            workers,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.notice_tx.is_some()
    }

    /// Queue a notification for `label`. Returns `false` if it was dropped.
    pub fn notify(&self, label: &str) -> bool {
        let Some(tx) = self.notice_tx.as_ref() else {
            return false;
        };
        self.outstanding.begin();
        match tx.try_send(ClickNotice {
            label: label.to_string(),
        }) {
            Ok(()) => true,
            Err(e) => {
                self.outstanding.finish();
                log::debug!("click_dispatcher: dropping click for '{label}': {e}");
                emit_sent(CHANNEL_ENGAGEMENT_CLICK_DROPPED, label.len());
                false
            },
        }
    }

    /// Wait until every notification accepted so far has been delivered or
    /// has failed. New notifications keep being accepted meanwhile. Without a
    /// request timeout this can wait forever; callers bound it themselves.
    pub async fn flush(&self) {
        if self.notice_tx.is_none() {
            return;
        }
        self.outstanding.wait_idle().await;
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.count.load(Ordering::SeqCst)
    }

    /// Cancel the worker and abandon in-flight deliveries.
    pub async fn shutdown(&mut self) {
        self.notice_tx.take();
        self.cancel.cancel();
        while self.workers.join_next().await.is_some() {}
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for ClickDispatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn click_worker(
    transport: Arc<dyn ClickTransport>,
    mut notice_rx: mpsc::Receiver<ClickNotice>,
    outstanding: Arc<Outstanding>,
) {
    let mut in_flight = JoinSet::new();
    loop {
        tokio::select! {
            notice = notice_rx.recv() => {
                let Some(notice) = notice else {
                    break;
                };
                let transport = Arc::clone(&transport);
                let outstanding = Arc::clone(&outstanding);
                in_flight.spawn(async move {
                    deliver(transport.as_ref(), notice).await;
                    outstanding.finish();
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
    while in_flight.join_next().await.is_some() {}
}

async fn deliver(transport: &dyn ClickTransport, notice: ClickNotice) {
    match transport.post_click(&notice.label).await {
        Ok(()) => log::trace!("click_dispatcher: delivered click for '{}'", notice.label),
        Err(e) => log::debug!(
            "click_dispatcher: click for '{}' not delivered: {e}",
            notice.label
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::engagement::test_utils::RecordingTransport;
    use crate::shell::runtime::diagnostics::DiagnosticsState;
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_every_queued_notification() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = ClickDispatcher::spawn(transport.clone());
        assert!(dispatcher.notify("YouTube"));
        assert!(dispatcher.notify("Gmail"));
        assert!(dispatcher.notify("YouTube"));

        tokio::time::timeout(Duration::from_secs(2), dispatcher.flush())
            .await
            .expect("flush should finish");

        let mut posted = transport.posted();
        posted.sort();
        assert_eq!(posted, ["Gmail", "YouTube", "YouTube"]);
        assert_eq!(dispatcher.outstanding(), 0);
        assert_eq!(dispatcher.worker_count(), 1);
    }

    #[tokio::test]
    async fn failed_deliveries_are_swallowed() {
        let transport = Arc::new(RecordingTransport::failing());
        let dispatcher = ClickDispatcher::spawn(transport.clone());
        assert!(dispatcher.notify("Twitch"));

        tokio::time::timeout(Duration::from_secs(2), dispatcher.flush())
            .await
            .expect("flush should finish");

        assert_eq!(transport.attempts(), 1);
        assert!(transport.posted().is_empty());
    }

    #[tokio::test]
    async fn hung_delivery_does_not_block_later_ones() {
        let transport = Arc::new(RecordingTransport::hanging_on("Stuck"));
        let mut dispatcher = ClickDispatcher::spawn(transport.clone());
        dispatcher.notify("Stuck");
        dispatcher.notify("Gmail");

        tokio::time::timeout(Duration::from_secs(2), async {
            while transport.posted().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("second click should be delivered");
        assert_eq!(transport.posted(), ["Gmail"]);

        tokio::time::timeout(Duration::from_secs(2), dispatcher.shutdown())
            .await
            .expect("shutdown abandons the hung request");
    }

    #[test]
    fn disabled_dispatcher_drops_silently() {
        let mut diagnostics = DiagnosticsState::new();
        let dispatcher = ClickDispatcher::disabled();
        assert!(!dispatcher.is_enabled());
        assert!(!dispatcher.notify("YouTube"));
        assert_eq!(diagnostics.channel_count(CHANNEL_ENGAGEMENT_CLICK_DROPPED), 0);
    }

    #[tokio::test]
    async fn flush_keeps_the_queue_open() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = ClickDispatcher::spawn(transport.clone());
        assert!(dispatcher.notify("YouTube"));
        tokio::time::timeout(Duration::from_secs(2), dispatcher.flush())
            .await
            .expect("first flush should finish");

        assert!(dispatcher.notify("Gmail"));
        tokio::time::timeout(Duration::from_secs(2), dispatcher.flush())
            .await
            .expect("second flush should finish");
        assert_eq!(transport.posted(), ["YouTube", "Gmail"]);
    }

    #[tokio::test]
    async fn flush_waits_on_hung_delivery() {
        let transport = Arc::new(RecordingTransport::hanging_on("Stuck"));
        let mut dispatcher = ClickDispatcher::spawn(transport.clone());
        dispatcher.notify("Stuck");
        assert!(
            tokio::time::timeout(Duration::from_millis(50), dispatcher.flush())
                .await
                .is_err()
        );
        assert_eq!(dispatcher.outstanding(), 1);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn notify_after_shutdown_is_dropped() {
        let transport = Arc::new(RecordingTransport::default());
        let mut dispatcher = ClickDispatcher::spawn(transport.clone());
        dispatcher.shutdown().await;
        assert!(!dispatcher.notify("YouTube"));
        dispatcher.flush().await;
        assert!(transport.posted().is_empty());
    }
}
