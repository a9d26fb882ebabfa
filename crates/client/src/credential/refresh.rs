// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The token refresh call.

use serde::Deserialize;

/// Successful refresh response: a fresh token pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub refresh_token: String,
}

/// Exchange the stored refresh token for a fresh pair.
///
/// Any non-2xx response is a refresh failure. No retries are attempted; the
/// client's standard timeout applies, and a timed-out refresh fails the
/// cycle like any other error.
pub async fn do_refresh(
    client: &reqwest::Client,
    refresh_url: &str,
    refresh_token: &str,
) -> anyhow::Result<RefreshResponse> {
    let resp = client
        .post(refresh_url)
        .json(&serde_json::json!({ "refreshToken": refresh_token }))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("refresh failed ({status}): {text}");
    }

    let tokens: RefreshResponse = resp.json().await?;
    Ok(tokens)
}
