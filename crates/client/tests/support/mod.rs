// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock API server and client wiring shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::{broadcast, Notify};

use authgate::credential::store::TokenStore;
use authgate::credential::Session;
use authgate::session::{ContextMode, Navigator, SessionEvent};
use authgate::{ApiClient, ClientConfig};

/// Refresh token the mock accepts until the first rotation.
pub const INITIAL_REFRESH_TOKEN: &str = "refresh-1";

/// Access token no client ever holds; forces the expiry path.
pub const STALE_ACCESS_TOKEN: &str = "stale-token";

pub const TEST_EMAIL: &str = "ada@example.com";
pub const TEST_PASSWORD: &str = "open-sesame";

/// Behavior of the mock `/refresh` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Succeed,
    Fail,
    DelayMs(u64),
}

pub struct MockApi {
    /// Access token the protected routes currently accept.
    pub valid_token: Mutex<String>,
    /// Refresh token `/refresh` currently accepts.
    pub valid_refresh: Mutex<String>,
    pub refresh_calls: AtomicU32,
    pub refresh_mode: Mutex<RefreshMode>,
    /// When set, `/refresh` waits here (after counting) before answering.
    pub refresh_gate: Mutex<Option<Arc<Notify>>>,
    /// Tags of authorized data hits, in arrival order.
    pub hits: Mutex<Vec<String>>,
    issued: AtomicU32,
}

impl MockApi {
    fn new() -> Self {
        Self {
            valid_token: Mutex::new("token-0".to_owned()),
            valid_refresh: Mutex::new(INITIAL_REFRESH_TOKEN.to_owned()),
            refresh_calls: AtomicU32::new(0),
            refresh_mode: Mutex::new(RefreshMode::Succeed),
            refresh_gate: Mutex::new(None),
            hits: Mutex::new(Vec::new()),
            issued: AtomicU32::new(0),
        }
    }

    /// Rotate to a fresh pair and make it the only accepted one.
    fn issue_pair(&self) -> (String, String) {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("token-{n}");
        let refresh = format!("refresh-{}", n + 1);
        *self.valid_token.lock().unwrap() = token.clone();
        *self.valid_refresh.lock().unwrap() = refresh.clone();
        (token, refresh)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|presented| presented == expected)
    }
}

fn expired_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "code": "token.expired", "message": "token expired" })),
    )
        .into_response()
}

async fn refresh(State(api): State<Arc<MockApi>>, Json(body): Json<serde_json::Value>) -> Response {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let gate = api.refresh_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    let mode = *api.refresh_mode.lock().unwrap();
    match mode {
        RefreshMode::Fail => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "refresh token rejected" })),
        )
            .into_response(),
        RefreshMode::DelayMs(ms) => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            grant_refresh(&api, &body)
        }
        RefreshMode::Succeed => grant_refresh(&api, &body),
    }
}

fn grant_refresh(api: &MockApi, body: &serde_json::Value) -> Response {
    let presented = body.get("refreshToken").and_then(|v| v.as_str()).unwrap_or_default();
    let expected = api.valid_refresh.lock().unwrap().clone();
    if presented != expected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "unknown refresh token" })),
        )
            .into_response();
    }
    let (token, refresh) = api.issue_pair();
    Json(serde_json::json!({ "token": token, "refreshToken": refresh })).into_response()
}

async fn sessions(State(api): State<Arc<MockApi>>, Json(body): Json<serde_json::Value>) -> Response {
    let password = body.get("password").and_then(|v| v.as_str()).unwrap_or_default();
    if password != TEST_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "code": "credentials.invalid" })),
        )
            .into_response();
    }
    let (token, refresh) = api.issue_pair();
    Json(serde_json::json!({
        "token": token,
        "refreshToken": refresh,
        "permissions": ["metrics.list"],
        "roles": ["administrator"],
    }))
    .into_response()
}

async fn me(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !api.authorized(&headers) {
        return expired_response();
    }
    Json(serde_json::json!({
        "email": TEST_EMAIL,
        "permissions": ["metrics.list"],
        "roles": ["administrator"],
    }))
    .into_response()
}

async fn data(
    State(api): State<Arc<MockApi>>,
    Path(tag): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !api.authorized(&headers) {
        return expired_response();
    }
    api.hits.lock().unwrap().push(tag.clone());
    Json(serde_json::json!({ "ok": true, "tag": tag })).into_response()
}

/// Authorized requests still fail here, with a non-auth error.
async fn glitch(
    State(api): State<Arc<MockApi>>,
    Path(tag): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !api.authorized(&headers) {
        return expired_response();
    }
    let _ = tag;
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "message": "downstream broke" })))
        .into_response()
}

/// Always a terminal 401 (no expiry code).
async fn private() -> Response {
    (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "code": "credentials.invalid" })))
        .into_response()
}

async fn boom() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "message": "internal" })))
        .into_response()
}

fn router(api: Arc<MockApi>) -> Router {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/sessions", post(sessions))
        .route("/me", get(me))
        .route("/data/{tag}", get(data))
        .route("/glitch/{tag}", get(glitch))
        .route("/private", get(private))
        .route("/boom", get(boom))
        .with_state(api)
}

/// Start the mock API on a random local port.
pub async fn start() -> (Arc<MockApi>, String) {
    let api = Arc::new(MockApi::new());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock api");
    let addr = listener.local_addr().expect("mock api local addr");
    let app = router(Arc::clone(&api));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (api, format!("http://{addr}"))
}

pub fn test_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new(base_url);
    config.request_timeout_ms = 2_000;
    config
}

/// Put a token pair in the store that the mock has never issued.
pub fn seed_stale(store: &TokenStore) {
    store.commit(Session {
        access_token: STALE_ACCESS_TOKEN.to_owned(),
        refresh_token: INITIAL_REFRESH_TOKEN.to_owned(),
    });
}

/// Navigator that records every route it is sent to.
pub fn recording_navigator() -> (Navigator, Arc<Mutex<Vec<String>>>) {
    let routes: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&routes);
    let navigator: Navigator = Arc::new(move |route: &str| {
        sink.lock().unwrap().push(route.to_owned());
    });
    (navigator, routes)
}

pub struct InteractiveParts {
    pub client: Arc<ApiClient>,
    pub store: Arc<TokenStore>,
    pub events: broadcast::Sender<SessionEvent>,
    pub routes: Arc<Mutex<Vec<String>>>,
}

/// An interactive client over fresh shared state, with a recording
/// navigator.
pub fn interactive_client(base_url: &str) -> InteractiveParts {
    let store = Arc::new(TokenStore::new(None));
    let (events, _) = broadcast::channel(16);
    let (navigator, routes) = recording_navigator();
    let client = ApiClient::new(
        test_config(base_url),
        Arc::clone(&store),
        events.clone(),
        ContextMode::Interactive,
        Some(navigator),
    );
    InteractiveParts { client, store, events, routes }
}

pub fn headless_client(base_url: &str) -> Arc<ApiClient> {
    ApiClient::headless(test_config(base_url))
}

/// Poll until the coordinator's queue reaches `n` pending requests.
pub async fn wait_for_pending(client: &ApiClient, n: usize) {
    for _ in 0..500 {
        if client.pending_replays().await == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pending replays never reached {n}");
}

/// Poll a condition until it holds or the deadline passes.
pub async fn wait_until(deadline_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(deadline_ms);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
