// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure classification for the refresh coordinator.

/// Machine-readable body code a 401 must carry to count as token expiry.
pub(crate) const TOKEN_EXPIRED_CODE: &str = "token.expired";

/// How a failed response is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not an authentication problem; forward to the caller untouched.
    PassThrough,
    /// Recoverable by refreshing the token.
    TokenExpired,
    /// Terminal: bad credentials or a revoked session.
    Unauthenticated,
}

/// Classify a non-2xx response.
///
/// Only a 401 whose JSON body carries `"code": "token.expired"` is treated
/// as expiry; any other 401 is terminal. Treating every 401 as refreshable
/// would retry unrecoverable failures forever.
pub fn classify(status: u16, body: &str) -> Disposition {
    if status != 401 {
        return Disposition::PassThrough;
    }
    let code = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(String::from));
    match code.as_deref() {
        Some(TOKEN_EXPIRED_CODE) => Disposition::TokenExpired,
        _ => Disposition::Unauthenticated,
    }
}
