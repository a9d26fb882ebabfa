// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential state: the session token pair, its durable entries, and the
//! refresh coordination built on top of them.

pub mod coordinator;
pub mod persist;
pub mod refresh;
pub mod store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Durable entry name for the access token.
pub const ACCESS_TOKEN_ENTRY: &str = "access-token";

/// Durable entry name for the refresh token.
pub const REFRESH_TOKEN_ENTRY: &str = "refresh-token";

/// Lifetime applied to both entries whenever either is committed: 30 days.
pub(crate) const TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Path scope recorded on persisted entries.
pub(crate) const TOKEN_PATH_SCOPE: &str = "/";

/// The current token pair for a session.
///
/// Owned by the [`store::TokenStore`]; mutated only by sign-in or a
/// successful refresh, destroyed on sign-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

/// Resolve the default state directory for durable session entries.
///
/// Checks `AUTHGATE_STATE_DIR`, then `$XDG_STATE_HOME/authgate`,
/// then `$HOME/.local/state/authgate`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AUTHGATE_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("authgate");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/authgate");
    }
    PathBuf::from(".authgate")
}

pub(crate) fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
