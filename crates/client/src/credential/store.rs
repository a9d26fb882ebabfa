// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token store: the durable, concurrently readable home of the session pair.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::credential::persist::{self, PersistedEntries, PersistedEntry};
use crate::credential::{
    epoch_secs, Session, ACCESS_TOKEN_ENTRY, REFRESH_TOKEN_ENTRY, TOKEN_PATH_SCOPE, TOKEN_TTL_SECS,
};

/// File name for durable entries inside the state directory.
const ENTRIES_FILE: &str = "session.json";

/// Holds the current token pair as named, time-limited entries.
///
/// Readers always observe the last committed value and never wait on an
/// in-flight refresh. Constructed with a state directory the store survives
/// the process; without one it is memory-only.
pub struct TokenStore {
    entries: RwLock<HashMap<String, PersistedEntry>>,
    file: Option<PathBuf>,
}

impl TokenStore {
    pub fn new(state_dir: Option<PathBuf>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            file: state_dir.map(|dir| dir.join(ENTRIES_FILE)),
        }
    }

    /// Load durable entries, dropping any that have expired.
    ///
    /// Returns whether a usable access token was found.
    pub fn load_persisted(&self) -> anyhow::Result<bool> {
        let Some(ref file) = self.file else {
            return Ok(false);
        };
        if !file.exists() {
            return Ok(false);
        }
        let persisted = persist::load(file)?;
        let now = epoch_secs();
        let mut entries = self.write();
        entries.clear();
        for (name, entry) in persisted.entries {
            if entry.expires_at > now {
                entries.insert(name, entry);
            }
        }
        Ok(entries.contains_key(ACCESS_TOKEN_ENTRY))
    }

    /// Commit a new token pair.
    ///
    /// Both entries are rewritten with the same fresh expiry, whether the
    /// commit comes from sign-in or from a successful refresh.
    pub fn commit(&self, session: Session) {
        let expires_at = epoch_secs() + TOKEN_TTL_SECS;
        let mut entries = self.write();
        entries.insert(
            ACCESS_TOKEN_ENTRY.to_owned(),
            PersistedEntry {
                value: session.access_token,
                expires_at,
                path: TOKEN_PATH_SCOPE.to_owned(),
            },
        );
        entries.insert(
            REFRESH_TOKEN_ENTRY.to_owned(),
            PersistedEntry {
                value: session.refresh_token,
                expires_at,
                path: TOKEN_PATH_SCOPE.to_owned(),
            },
        );
        self.persist(&entries);
    }

    /// Current access token, if present and unexpired.
    pub fn access_token(&self) -> Option<String> {
        self.entry_value(ACCESS_TOKEN_ENTRY)
    }

    /// Current refresh token, if present and unexpired.
    pub fn refresh_token(&self) -> Option<String> {
        self.entry_value(REFRESH_TOKEN_ENTRY)
    }

    /// The full session pair, if both entries are present.
    pub fn session(&self) -> Option<Session> {
        let access_token = self.access_token()?;
        let refresh_token = self.refresh_token()?;
        Some(Session { access_token, refresh_token })
    }

    /// Destroy the session: drop both entries and the backing file.
    pub fn clear(&self) {
        let mut entries = self.write();
        entries.clear();
        if let Some(ref file) = self.file {
            if file.exists() {
                if let Err(e) = std::fs::remove_file(file) {
                    tracing::warn!(err = %e, "failed to remove session file");
                }
            }
        }
    }

    fn entry_value(&self, name: &str) -> Option<String> {
        let entries = self.read();
        let entry = entries.get(name)?;
        if entry.expires_at <= epoch_secs() {
            return None;
        }
        Some(entry.value.clone())
    }

    fn persist(&self, entries: &HashMap<String, PersistedEntry>) {
        let Some(ref file) = self.file else {
            return;
        };
        let snapshot = PersistedEntries { entries: entries.clone() };
        if let Err(e) = persist::save(file, &snapshot) {
            tracing::warn!(err = %e, "failed to persist session entries");
        }
    }

    // Lock helpers tolerate poisoning; the entries are plain data.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, PersistedEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, PersistedEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
