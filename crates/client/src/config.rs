// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,

    /// Path of the token refresh endpoint.
    pub refresh_path: String,

    /// Path of the credential sign-in endpoint.
    pub sessions_path: String,

    /// Path of the profile endpoint used by session bootstrap.
    pub profile_path: String,

    /// Route of the entry/login surface.
    pub entry_route: String,

    /// Route authenticated users land on.
    pub signed_in_route: String,

    /// Request timeout in milliseconds. Applies to refresh calls too; a
    /// timed-out refresh is a failed refresh.
    pub request_timeout_ms: u64,

    /// Directory for durable token entries. `None` keeps the session in
    /// memory only.
    pub state_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: "/refresh".to_owned(),
            sessions_path: "/sessions".to_owned(),
            profile_path: "/me".to_owned(),
            entry_route: "/".to_owned(),
            signed_in_route: "/dashboard".to_owned(),
            request_timeout_ms: 30_000,
            state_dir: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub(crate) fn refresh_url(&self) -> String {
        format!("{}{}", self.base_url, self.refresh_path)
    }
}
