/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::app::LaunchpadApp;
use crate::model::link::LinkOrigin;
use crate::persistence::{LaunchpadStore, StoreError};
use crate::prefs::{CliArgs, LaunchpadCommand, LaunchpadPreferences, PrefsError, cli_args};
use crate::registries::LinkError;
use crate::services::engagement::{ClickTransport, HttpClickTransport};
use crate::shell::runtime::diagnostics::DiagnosticsState;

/// How long `click` waits for its report before exiting anyway.
const CLICK_DRAIN_GRACE: Duration = Duration::from_secs(5);
/// How long `list` and `click` wait for server counts before printing
/// local ones.
const BASELINE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum CliError {
    Prefs(PrefsError),
    Store(StoreError),
    Link(LinkError),
    UnknownLink(String),
    Runtime(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Prefs(e) => write!(f, "{e}"),
            CliError::Store(e) => write!(f, "Cannot open launchpad store: {e}"),
            CliError::Link(e) => write!(f, "{e}"),
            CliError::UnknownLink(label) => write!(f, "No link named '{label}'"),
            CliError::Runtime(e) => write!(f, "Async runtime error: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<PrefsError> for CliError {
    fn from(e: PrefsError) -> Self {
        CliError::Prefs(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<LinkError> for CliError {
    fn from(e: LinkError) -> Self {
        CliError::Link(e)
    }
}

pub fn main() {
    let args = cli_args().run();
    let exit_code = match run(args) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{e}");
            eprintln!("launchpad: {e}");
            1
        },
    };
    std::process::exit(exit_code);
}

pub fn run(args: CliArgs) -> Result<(), CliError> {
    let mut prefs = LaunchpadPreferences::resolve(&args)?;
    crate::init_tracing(prefs.tracing_filter.as_deref());
    for message in prefs.take_warnings() {
        warn!("{message}");
    }
    log::debug!("launchpad: data dir {}", prefs.data_dir.display());
    let mut diagnostics = DiagnosticsState::new();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let result = runtime.block_on(run_command(&prefs, args.command));
    log_diagnostics(&mut diagnostics);
    print!("{}", result?);
    Ok(())
}

/// Log every diagnostics channel that saw traffic. Returns how many did.
pub fn log_diagnostics(diagnostics: &mut DiagnosticsState) -> usize {
    let snapshot = diagnostics.snapshot();
    for (channel, count) in &snapshot {
        log::debug!("launchpad: diagnostics {channel} = {count}");
    }
    snapshot.len()
}

/// Run one command against the configured store and return what it prints.
pub async fn run_command(
    prefs: &LaunchpadPreferences,
    command: LaunchpadCommand,
) -> Result<String, CliError> {
    let transport = if prefs.analytics && command.uses_analytics() {
        let transport: Arc<dyn ClickTransport> = Arc::new(
            HttpClickTransport::new(&prefs.analytics_base()?, prefs.request_timeout()).map_err(
                |e| PrefsError::InvalidValue {
                    field: "analytics_url",
                    value: format!("{} ({e})", prefs.analytics_url),
                },
            )?,
        );
        Some(transport)
    } else {
        None
    };

    let store = LaunchpadStore::open(prefs.data_dir.clone())?;
    let mut app = LaunchpadApp::start_session(Box::new(store), transport);
    let result = execute(&mut app, command).await;
    app.shutdown().await;
    result
}

async fn execute(app: &mut LaunchpadApp, command: LaunchpadCommand) -> Result<String, CliError> {
    match command {
        LaunchpadCommand::List => {
            app.wait_for_baseline(BASELINE_GRACE).await;
        },
        LaunchpadCommand::Add { label, url } => {
            app.add(&url, &label)?;
        },
        LaunchpadCommand::Remove { label } => {
            if app.catalog().is_builtin(&label) {
                warn!("'{label}' is built in and cannot be removed");
            } else if app.get(&label).is_none() {
                warn!("No link named '{label}'; nothing removed");
            }
            app.remove(&label)?;
        },
        LaunchpadCommand::Reorder { ids } => {
            app.reorder(ids)?;
        },
        LaunchpadCommand::Move { from, to } => {
            for id in [&from, &to] {
                if app.get(id).is_none() {
                    return Err(CliError::UnknownLink(id.clone()));
                }
            }
            app.move_link(&from, &to)?;
        },
        LaunchpadCommand::Click { label } => {
            if app.get(&label).is_none() {
                return Err(CliError::UnknownLink(label));
            }
            app.record_click(&label);
            app.wait_for_baseline(BASELINE_GRACE).await;
            if !app.drain_clicks(CLICK_DRAIN_GRACE).await {
                warn!("Click on '{label}' may not have been reported");
            }
            return Ok(format!("{label}: {}\n", app.displayed_count(&label)));
        },
        LaunchpadCommand::Reset => {
            app.reset()?;
        },
    }
    Ok(format_registry(app))
}

/// One line per link in display order.
pub fn format_registry(app: &LaunchpadApp) -> String {
    let width = app
        .registry()
        .iter()
        .map(|entry| entry.id.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (index, entry) in app.registry().iter().enumerate() {
        let marker = match entry.origin {
            LinkOrigin::BuiltIn => ' ',
            LinkOrigin::Custom => '*',
        };
        let _ = writeln!(
            out,
            "{:>2}.{marker}{:<width$}  {:>5}  {}",
            index + 1,
            entry.id,
            app.displayed_count(&entry.id),
            entry.target,
        );
    }
    out
}
