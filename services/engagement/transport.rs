/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Client side of the click analytics service.
//!
//! - `GET  {base}/clicks` → `{ "<label>": <count>, ... }`
//! - `POST {base}/click`  ← `{ "label": "<label>" }`

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    InvalidUrl,
    Client(String),
    Network(String),
    HttpStatus(u16),
    Body(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::InvalidUrl => write!(f, "analytics URL cannot take a path"),
            TransportError::Client(e) => write!(f, "HTTP client error: {e}"),
            TransportError::Network(e) => write!(f, "network error: {e}"),
            TransportError::HttpStatus(status) => write!(f, "HTTP status {status}"),
            TransportError::Body(e) => write!(f, "malformed body: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// The two remote operations the engagement counter relies on.
pub trait ClickTransport: Send + Sync + 'static {
    /// Server-side counts per label.
    fn fetch_counts(&self) -> BoxFuture<'_, Result<HashMap<String, u64>, TransportError>>;

    /// Report one click on `label`.
    fn post_click<'a>(&'a self, label: &'a str) -> BoxFuture<'a, Result<(), TransportError>>;
}

#[derive(Serialize)]
struct ClickBody<'a> {
    label: &'a str,
}

/// [`ClickTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClickTransport {
    client: Client,
    clicks_url: Url,
    click_url: Url,
}

impl HttpClickTransport {
    /// `timeout` of `None` lets requests run indefinitely.
    pub fn new(base: &Url, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Self::with_client(client, base)
    }

    /// Use a preconfigured `client` against `base`.
    pub fn with_client(client: Client, base: &Url) -> Result<Self, TransportError> {
        Ok(Self {
            client,
            clicks_url: endpoint(base, "clicks")?,
            click_url: endpoint(base, "click")?,
        })
    }

    pub fn clicks_url(&self) -> &Url {
        &self.clicks_url
    }

    pub fn click_url(&self) -> &Url {
        &self.click_url
    }
}

/// Append `name` as a path segment of `base`, whether or not `base` ends in `/`.
fn endpoint(base: &Url, name: &str) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidUrl)?
        .pop_if_empty()
        .push(name);
    Ok(url)
}

impl ClickTransport for HttpClickTransport {
    fn fetch_counts(&self) -> BoxFuture<'_, Result<HashMap<String, u64>, TransportError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.clicks_url.clone())
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::HttpStatus(status.as_u16()));
            }
            response
                .json::<HashMap<String, u64>>()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))
        })
    }

    fn post_click<'a>(&'a self, label: &'a str) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.click_url.clone())
                .json(&ClickBody { label })
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::HttpStatus(status.as_u16()));
            }
            Ok(())
        })
    }
}
