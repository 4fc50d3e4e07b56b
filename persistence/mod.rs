/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Launchpad persistence.
//!
//! Both stores are JSON documents kept under fixed keys of a small key-value
//! backend:
//! - [`LaunchpadStore`] keeps them in a redb table on disk
//! - [`MemoryStore`] keeps them in a map, for tests and ephemeral sessions
//!
//! Reads fail open: a missing or unparseable value loads as an empty
//! collection. Writes report errors and are applied in one transaction per
//! [`KeyValueStore::commit`] call.

pub mod custom_links;
pub mod order;
pub mod types;

use std::collections::HashMap;
use std::path::PathBuf;

use log::warn;
use redb::{ReadableDatabase, ReadableTable, TableError};
use serde::de::DeserializeOwned;

use crate::registries::CHANNEL_PERSISTENCE_LOAD_FALLBACK_USED;
use crate::shell::runtime::diagnostics::emit_sent;
use types::StoreWrite;

const STATE_TABLE: redb::TableDefinition<&str, &str> =
    redb::TableDefinition::new("launchpad_state");
const DATABASE_FILE: &str = "launchpad.redb";

/// Storage mechanism behind the custom link and order stores.
pub trait KeyValueStore: Send {
    /// Raw value under `key`, `None` if never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Apply all writes or none of them.
    fn commit(&mut self, writes: &[StoreWrite]) -> Result<(), StoreError>;

    /// Drop every persisted value.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Decode the JSON value under `key`, falling back to `T::default()` when it is
/// absent, unreadable or malformed.
pub(crate) fn load_json_or_default<T>(backend: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match backend.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!("Failed to read '{key}' from launchpad store: {e}; using empty value");
            emit_sent(CHANNEL_PERSISTENCE_LOAD_FALLBACK_USED, key.len());
            return T::default();
        },
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Discarding unparseable '{key}' ({} bytes): {e}", raw.len());
            emit_sent(CHANNEL_PERSISTENCE_LOAD_FALLBACK_USED, raw.len());
            T::default()
        },
    }
}

pub(crate) fn encode_json<T: serde::Serialize + ?Sized>(
    key: &'static str,
    value: &T,
) -> Result<StoreWrite, StoreError> {
    let value = serde_json::to_string(value)
        .map_err(|e| StoreError::Encode(format!("{key}: {e}")))?;
    Ok(StoreWrite { key, value })
}

/// On-disk store backed by a single redb table.
pub struct LaunchpadStore {
    db: redb::Database,
}

impl LaunchpadStore {
    /// Open or create a store in the given directory.
    pub fn open(base_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| StoreError::Io(format!("Failed to create dir: {e}")))?;
        let db = redb::Database::create(base_dir.join(DATABASE_FILE))
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        Ok(Self { db })
    }

    /// Default storage directory for launchpad data.
    pub fn default_data_dir() -> Option<PathBuf> {
        let mut dir = dirs::config_dir()?;
        dir.push("launchpad");
        Some(dir)
    }
}

impl KeyValueStore for LaunchpadStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        let table = match read_txn.open_table(STATE_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(StoreError::Redb(format!("{e}"))),
        };
        let entry = table
            .get(key)
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        Ok(entry.map(|guard| guard.value().to_string()))
    }

    fn commit(&mut self, writes: &[StoreWrite]) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        {
            let mut table = write_txn
                .open_table(STATE_TABLE)
                .map_err(|e| StoreError::Redb(format!("{e}")))?;
            for write in writes {
                table
                    .insert(write.key, write.value.as_str())
                    .map_err(|e| StoreError::Redb(format!("{e}")))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        write_txn
            .delete_table(STATE_TABLE)
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        write_txn
            .commit()
            .map_err(|e| StoreError::Redb(format!("{e}")))?;
        Ok(())
    }
}

impl std::fmt::Debug for LaunchpadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchpadStore").finish_non_exhaustive()
    }
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose writes always fail; reads still work.
    pub fn read_only() -> Self {
        Self {
            values: HashMap::new(),
            read_only: true,
        }
    }

    /// Seed a raw value, bypassing JSON encoding.
    pub fn with_raw(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn commit(&mut self, writes: &[StoreWrite]) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        for write in writes {
            self.values.insert(write.key.to_string(), write.value.clone());
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.values.clear();
        Ok(())
    }
}

/// Errors from the launchpad store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Io(String),
    Redb(String),
    Encode(String),
    ReadOnly,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {e}"),
            StoreError::Redb(e) => write!(f, "Redb error: {e}"),
            StoreError::Encode(e) => write!(f, "Encode error: {e}"),
            StoreError::ReadOnly => write!(f, "Store is read-only"),
        }
    }
}

impl std::error::Error for StoreError {}
