/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-process [`ClickTransport`] for tests.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use super::transport::{ClickTransport, TransportError};

#[derive(Debug, Default)]
pub struct RecordingTransport {
    baseline: Option<HashMap<String, u64>>,
    fail_requests: bool,
    stall_counts: bool,
    hang_label: Option<String>,
    posted: Mutex<Vec<String>>,
    attempts: Mutex<usize>,
}

impl RecordingTransport {
    /// Serves `baseline` from `fetch_counts` and accepts every click.
    pub fn with_baseline(pairs: &[(&str, u64)]) -> Self {
        Self {
            baseline: Some(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
            ..Self::default()
        }
    }

    /// Every request fails.
    pub fn failing() -> Self {
        Self {
            fail_requests: true,
            ..Self::default()
        }
    }

    /// `fetch_counts` never completes; clicks are accepted.
    pub fn stalled_counts() -> Self {
        Self {
            stall_counts: true,
            ..Self::default()
        }
    }

    /// Clicks on `label` never complete.
    pub fn hanging_on(label: &str) -> Self {
        Self {
            hang_label: Some(label.to_string()),
            ..Self::default()
        }
    }

    /// Labels whose click was accepted, in completion order.
    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

impl ClickTransport for RecordingTransport {
    fn fetch_counts(&self) -> BoxFuture<'_, Result<HashMap<String, u64>, TransportError>> {
        Box::pin(async move {
            if self.stall_counts {
                std::future::pending::<()>().await;
            }
            if self.fail_requests {
                return Err(TransportError::Network("connection refused".to_string()));
            }
            self.baseline.clone().ok_or(TransportError::HttpStatus(404))
        })
    }

    fn post_click<'a>(&'a self, label: &'a str) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            *self.attempts.lock() += 1;
            if self.hang_label.as_deref() == Some(label) {
                std::future::pending::<()>().await;
            }
            if self.fail_requests {
                return Err(TransportError::Network("connection refused".to_string()));
            }
            self.posted.lock().push(label.to_string());
            Ok(())
        })
    }
}
