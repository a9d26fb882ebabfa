// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced to API callers.
///
/// `TokenExpired` is normally absorbed by the refresh coordinator and never
/// reaches a caller; the authentication variants are terminal for the
/// session, the rest only for the request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Non-2xx response unrelated to authentication, forwarded untouched.
    #[error("request failed ({status}): {body}")]
    Http { status: u16, body: String },

    /// The access token was rejected as expired.
    #[error("access token expired")]
    TokenExpired,

    /// 401 without the expiry code: bad credentials or a revoked session.
    /// A refresh would never succeed, so none is attempted.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The refresh call itself failed; the session is over.
    #[error("token refresh failed: {reason}")]
    RefreshFailed { reason: String },

    /// The session was terminated in a headless context; the caller decides
    /// how to respond (e.g. redirect at a higher layer).
    #[error("authentication required")]
    AuthRequired,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
