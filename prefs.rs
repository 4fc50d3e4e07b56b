/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command line arguments and layered preferences.
//!
//! Later layers win: built-in defaults, then the TOML file, then
//! `LAUNCHPAD_*` environment variables, then flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bpaf::Bpaf;
use serde::Deserialize;
use url::Url;

use crate::persistence::LaunchpadStore;

pub const DEFAULT_ANALYTICS_URL: &str = "http://127.0.0.1:3000/api";
const CONFIG_FILE: &str = "launchpad.toml";

const ENV_DATA_DIR: &str = "LAUNCHPAD_DATA_DIR";
const ENV_ANALYTICS_URL: &str = "LAUNCHPAD_ANALYTICS_URL";
const ENV_ANALYTICS: &str = "LAUNCHPAD_ANALYTICS";
const ENV_REQUEST_TIMEOUT_MS: &str = "LAUNCHPAD_REQUEST_TIMEOUT_MS";
const ENV_TRACING_FILTER: &str = "LAUNCHPAD_TRACING_FILTER";

/// Launchpad link registry
#[derive(Debug, Clone, PartialEq, Eq, Bpaf)]
#[bpaf(options, version)]
pub struct CliArgs {
    /// Read preferences from this TOML file
    #[bpaf(long, argument("PATH"))]
    pub config: Option<PathBuf>,
    /// Directory holding launchpad.redb
    #[bpaf(long, argument("DIR"))]
    pub data_dir: Option<PathBuf>,
    /// Base URL of the click analytics service
    #[bpaf(long, argument("URL"))]
    pub analytics_url: Option<String>,
    /// Neither fetch nor report click counts
    #[bpaf(long)]
    pub no_analytics: bool,
    /// Abort analytics requests after this many milliseconds (0 waits forever)
    #[bpaf(long, argument("MS"))]
    pub request_timeout_ms: Option<u64>,
    /// Log filter, e.g. `launchpad=debug`
    #[bpaf(long, argument("FILTER"))]
    pub tracing_filter: Option<String>,
    #[bpaf(external(launchpad_command))]
    pub command: LaunchpadCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Bpaf)]
pub enum LaunchpadCommand {
    /// Print the links in display order with their click counts
    #[bpaf(command)]
    List,
    /// Add a custom link at the end
    #[bpaf(command)]
    Add {
        #[bpaf(positional("LABEL"))]
        label: String,
        #[bpaf(positional("URL"))]
        url: String,
    },
    /// Remove a custom link
    #[bpaf(command)]
    Remove {
        #[bpaf(positional("LABEL"))]
        label: String,
    },
    /// Replace the display order; links left out follow in their usual place
    #[bpaf(command)]
    Reorder {
        #[bpaf(positional("ID"), many)]
        ids: Vec<String>,
    },
    /// Move one link onto another's position
    #[bpaf(command("move"))]
    Move {
        #[bpaf(positional("FROM"))]
        from: String,
        #[bpaf(positional("TO"))]
        to: String,
    },
    /// Record a click and report it
    #[bpaf(command)]
    Click {
        #[bpaf(positional("LABEL"))]
        label: String,
    },
    /// Forget all custom links and ordering
    #[bpaf(command)]
    Reset,
}

impl LaunchpadCommand {
    /// Whether the command shows or changes click counts.
    pub fn uses_analytics(&self) -> bool {
        matches!(self, LaunchpadCommand::List | LaunchpadCommand::Click { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    InvalidValue { field: &'static str, value: String },
}

impl std::fmt::Display for PrefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefsError::Read { path, message } => {
                write!(f, "Cannot read {}: {message}", path.display())
            },
            PrefsError::Parse { path, message } => {
                write!(f, "Invalid preferences in {}: {message}", path.display())
            },
            PrefsError::InvalidValue { field, value } => {
                write!(f, "Invalid value for {field}: '{value}'")
            },
        }
    }
}

impl std::error::Error for PrefsError {}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PrefsFile {
    data_dir: Option<PathBuf>,
    analytics_url: Option<String>,
    analytics: Option<bool>,
    request_timeout_ms: Option<u64>,
    tracing_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchpadPreferences {
    pub data_dir: PathBuf,
    /// Always a parseable URL.
    pub analytics_url: String,
    pub analytics: bool,
    pub request_timeout_ms: Option<u64>,
    pub tracing_filter: Option<String>,
    /// Problems found before logging was up.
    warnings: Vec<String>,
}

impl Default for LaunchpadPreferences {
    fn default() -> Self {
        Self {
            data_dir: LaunchpadStore::default_data_dir()
                .unwrap_or_else(|| PathBuf::from(".launchpad")),
            analytics_url: DEFAULT_ANALYTICS_URL.to_string(),
            analytics: true,
            request_timeout_ms: None,
            tracing_filter: None,
            warnings: Vec::new(),
        }
    }
}

impl LaunchpadPreferences {
    pub fn default_config_path() -> Option<PathBuf> {
        LaunchpadStore::default_data_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Resolve every layer for this process.
    pub fn resolve(args: &CliArgs) -> Result<Self, PrefsError> {
        let mut prefs = Self::default();
        match args.config.as_deref() {
            Some(path) => prefs.apply_file(path, true)?,
            None => {
                if let Some(path) = Self::default_config_path() {
                    prefs.apply_file(&path, false)?;
                }
            },
        }
        prefs.apply_env(|key| std::env::var(key).ok());
        prefs.apply_args(args)?;
        Ok(prefs)
    }

    /// Overlay values from a TOML file. A missing file is an error only when
    /// `required`.
    pub fn apply_file(&mut self, path: &Path, required: bool) -> Result<(), PrefsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => return Ok(()),
            Err(e) => {
                return Err(PrefsError::Read {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            },
        };
        let file: PrefsFile = toml::from_str(&text).map_err(|e| PrefsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(url) = file.analytics_url {
            self.analytics_url = checked_url(url)?;
        }
        if let Some(analytics) = file.analytics {
            self.analytics = analytics;
        }
        if let Some(ms) = file.request_timeout_ms {
            self.request_timeout_ms = Some(ms);
        }
        if let Some(filter) = file.tracing_filter {
            self.tracing_filter = Some(filter);
        }
        Ok(())
    }

    /// Overlay `LAUNCHPAD_*` variables. Unusable values are skipped and kept
    /// as warnings.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_ANALYTICS_URL) {
            match checked_url(url.trim().to_string()) {
                Ok(url) => self.analytics_url = url,
                Err(_) => self.warn(format!("{ENV_ANALYTICS_URL} invalid ('{url}'); ignoring")),
            }
        }
        if let Some(value) = lookup(ENV_ANALYTICS) {
            match value.trim().to_ascii_lowercase().as_str() {
                "off" | "0" | "false" | "disabled" | "no" => self.analytics = false,
                "on" | "1" | "true" | "enabled" | "yes" => self.analytics = true,
                other => self.warn(format!("{ENV_ANALYTICS} invalid ('{other}'); ignoring")),
            }
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            match value.trim().parse::<u64>() {
                Ok(ms) => self.request_timeout_ms = Some(ms),
                Err(_) => {
                    self.warn(format!("{ENV_REQUEST_TIMEOUT_MS} invalid ('{value}'); ignoring"))
                },
            }
        }
        if let Some(filter) = lookup(ENV_TRACING_FILTER).filter(|v| !v.trim().is_empty()) {
            self.tracing_filter = Some(filter);
        }
    }

    pub fn apply_args(&mut self, args: &CliArgs) -> Result<(), PrefsError> {
        if let Some(dir) = args.data_dir.as_ref() {
            self.data_dir = dir.clone();
        }
        if let Some(url) = args.analytics_url.as_ref() {
            self.analytics_url = checked_url(url.clone())?;
        }
        if args.no_analytics {
            self.analytics = false;
        }
        if let Some(ms) = args.request_timeout_ms {
            self.request_timeout_ms = Some(ms);
        }
        if let Some(filter) = args.tracing_filter.as_ref() {
            self.tracing_filter = Some(filter.clone());
        }
        Ok(())
    }

    /// Per-request timeout; `None` (or 0 ms) means requests may run forever.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn analytics_base(&self) -> Result<Url, PrefsError> {
        Url::parse(&self.analytics_url).map_err(|_| PrefsError::InvalidValue {
            field: "analytics_url",
            value: self.analytics_url.clone(),
        })
    }

    /// Drain warnings collected while resolving.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

fn checked_url(value: String) -> Result<String, PrefsError> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(PrefsError::InvalidValue {
            field: "analytics_url",
            value,
        }),
    }
}
