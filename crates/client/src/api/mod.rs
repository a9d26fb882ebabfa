// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public API client: request/response types and the refresh-aware send
//! path.

pub mod classify;
pub mod dispatch;

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::config::ClientConfig;
use crate::credential::coordinator::RefreshCoordinator;
use crate::credential::store::TokenStore;
use crate::error::AuthError;
use crate::session::{ContextMode, Navigator, SessionEvent, SessionHook};

/// A replayable request descriptor.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self { method: Method::POST, path: path.into(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: Method::DELETE, path: path.into(), body: None }
    }
}

/// A successful API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Decode the body into a concrete type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}

/// Client for a bearer-authenticated JSON API.
///
/// Every request flows through the refresh coordinator: an expired-token
/// failure suspends the request until one shared refresh call settles, then
/// replays it with the fresh token.
pub struct ApiClient {
    config: ClientConfig,
    store: Arc<TokenStore>,
    events: broadcast::Sender<SessionEvent>,
    coordinator: Arc<RefreshCoordinator>,
    navigate: Option<Navigator>,
}

impl ApiClient {
    /// Build a client over shared session state.
    ///
    /// Contexts that share `store` and `events` share one session: a refresh
    /// or sign-out in any of them is observed by all.
    pub fn new(
        config: ClientConfig,
        store: Arc<TokenStore>,
        events: broadcast::Sender<SessionEvent>,
        mode: ContextMode,
        navigate: Option<Navigator>,
    ) -> Arc<Self> {
        let hook = SessionHook::new(
            Arc::clone(&store),
            events.clone(),
            mode,
            config.entry_route.clone(),
            navigate.clone(),
        );
        let coordinator = RefreshCoordinator::new(&config, Arc::clone(&store), hook);
        Arc::new(Self { config, store, events, coordinator, navigate })
    }

    /// Convenience constructor for a headless client with private session
    /// state, loaded from `config.state_dir` when one is set.
    pub fn headless(config: ClientConfig) -> Arc<Self> {
        let store = Arc::new(TokenStore::new(config.state_dir.clone()));
        if let Err(e) = store.load_persisted() {
            tracing::warn!(err = %e, "failed to load persisted session");
        }
        let (events, _) = broadcast::channel(16);
        Self::new(config, store, events, ContextMode::Headless, None)
    }

    /// Issue a request through the refresh-aware send path.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        self.coordinator.send(request).await
    }

    /// GET a path and decode the response body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// POST a JSON body and decode the response body.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, AuthError> {
        self.send(ApiRequest::post(path, body)).await?.json()
    }

    /// Subscribe to session events (sign-out, refresh).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of requests currently queued behind an in-flight refresh.
    pub async fn pending_replays(&self) -> usize {
        self.coordinator.pending().await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub(crate) fn events(&self) -> &broadcast::Sender<SessionEvent> {
        &self.events
    }

    pub(crate) fn navigate(&self, route: &str) {
        if let Some(ref navigate) = self.navigate {
            navigate(route);
        }
    }
}
