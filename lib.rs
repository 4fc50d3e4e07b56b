/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Launchpad: a small grid of quick links.
//!
//! A fixed catalog of built-in sites is merged with user-added links in a
//! user-chosen order, and every link carries a click count made of a server
//! baseline plus the clicks recorded this session. [`app::LaunchpadApp`] is
//! the entry point for embedders; the `launchpad` binary drives it from the
//! command line.

pub mod app;
pub mod model;
pub mod persistence;
pub mod prefs;
pub mod registries;
pub mod services;
pub mod shell;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::shell::runtime::cli::main;

pub const VERSION: &str = concat!("launchpad/", env!("CARGO_PKG_VERSION"));

/// Install the process-wide log subscriber. An unusable `filter` falls back
/// to `info`.
#[cfg(feature = "tracing")]
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = match filter.map(EnvFilter::try_new) {
        Some(Ok(filter)) => filter,
        Some(Err(e)) => {
            eprintln!("launchpad: ignoring tracing filter: {e}");
            EnvFilter::new("info")
        },
        None => EnvFilter::new("info"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // A second call (tests, embedders) keeps the first subscriber.
    let _ = subscriber.try_init();
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_filter: Option<&str>) {}
