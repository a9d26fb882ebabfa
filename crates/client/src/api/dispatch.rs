// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatcher: attaches the current access token and issues the
//! underlying HTTP call.

use std::sync::Arc;

use crate::api::{ApiRequest, ApiResponse};
use crate::config::ClientConfig;
use crate::credential::store::TokenStore;
use crate::error::AuthError;

pub(crate) struct Dispatcher {
    http: reqwest::Client,
    base_url: String,
    store: Arc<TokenStore>,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig, store: Arc<TokenStore>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();
        Self { http, base_url: config.base_url.clone(), store }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request. The access token is read from the store at send time,
    /// not at construction time, so replays pick up a refreshed token.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        let mut builder = self.http.request(request.method.clone(), self.url(&request.path));
        if let Some(token) = self.store.access_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        if !(200..300).contains(&status) {
            return Err(AuthError::Http { status, body: text });
        }

        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };
        Ok(ApiResponse { status, body })
    }
}
