// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle: sign-in, sign-out, persisted-session bootstrap, and
//! the cross-context sign-out channel.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::access::{has_access, AccessRequirement};
use crate::api::{ApiClient, ApiRequest};
use crate::credential::store::TokenStore;
use crate::credential::Session;
use crate::error::AuthError;

/// Whether this execution context can navigate the user somewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    /// Can navigate: session termination clears the store and redirects.
    Interactive,
    /// Cannot navigate: termination surfaces [`AuthError::AuthRequired`]
    /// instead, leaving the response to the caller.
    Headless,
}

/// Navigation callback, invoked with a route (`"/"`, `"/dashboard"`, ...).
/// The embedding application decides what navigation means.
pub type Navigator = Arc<dyn Fn(&str) + Send + Sync>;

/// Messages on the session broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session ended; every listening context clears its state.
    SignedOut,
    /// A fresh token pair was committed.
    Refreshed,
}

/// The signed-in user as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
}

/// Credentials for primary sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    token: String,
    refresh_token: String,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    email: String,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
}

/// Fired when the session becomes invalid: a failed refresh, or a 401
/// without the expiry code.
pub struct SessionHook {
    store: Arc<TokenStore>,
    events: broadcast::Sender<SessionEvent>,
    mode: ContextMode,
    entry_route: String,
    navigate: Option<Navigator>,
}

impl SessionHook {
    pub(crate) fn new(
        store: Arc<TokenStore>,
        events: broadcast::Sender<SessionEvent>,
        mode: ContextMode,
        entry_route: String,
        navigate: Option<Navigator>,
    ) -> Self {
        Self { store, events, mode, entry_route, navigate }
    }

    /// Terminate the session.
    ///
    /// Interactive contexts clear the store, broadcast the sign-out so every
    /// other context sharing the session terminates too, and redirect to the
    /// entry surface. Headless contexts must not navigate and must not
    /// mutate shared state; they report [`AuthError::AuthRequired`].
    pub(crate) fn on_session_invalid(&self) -> Result<(), AuthError> {
        match self.mode {
            ContextMode::Interactive => {
                self.store.clear();
                let _ = self.events.send(SessionEvent::SignedOut);
                if let Some(ref navigate) = self.navigate {
                    navigate(&self.entry_route);
                }
                Ok(())
            }
            ContextMode::Headless => Err(AuthError::AuthRequired),
        }
    }

    pub(crate) fn notify_refreshed(&self) {
        let _ = self.events.send(SessionEvent::Refreshed);
    }
}

/// Per-context session handle: user state plus the sign-in/sign-out
/// operations, over a shared client.
pub struct AuthContext {
    client: Arc<ApiClient>,
    user: Arc<RwLock<Option<User>>>,
    cancel: CancellationToken,
}

impl AuthContext {
    /// Create a context and start its sign-out listener.
    pub fn new(client: Arc<ApiClient>) -> Self {
        let user = Arc::new(RwLock::new(None));
        let cancel = CancellationToken::new();
        spawn_signout_listener(&client, Arc::clone(&user), cancel.clone());
        Self { client, user, cancel }
    }

    pub fn user(&self) -> Option<User> {
        read_user(&self.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Whether the signed-in user satisfies an access requirement. Always
    /// false when unauthenticated.
    pub fn can(&self, required: &AccessRequirement) -> bool {
        match self.user() {
            Some(user) => has_access(&user, required),
            None => false,
        }
    }

    /// Exchange credentials for a session, record the user, and move to the
    /// signed-in surface.
    pub async fn sign_in(&self, credentials: SignInCredentials) -> Result<User, AuthError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let path = self.client.config().sessions_path.clone();
        let response = self.client.send(ApiRequest::post(path, body)).await?;
        let session: SignInResponse = response.json()?;

        self.client.store().commit(Session {
            access_token: session.token,
            refresh_token: session.refresh_token,
        });

        let user = User {
            email: credentials.email,
            permissions: session.permissions,
            roles: session.roles,
        };
        store_user(&self.user, Some(user.clone()));
        tracing::info!(email = %user.email, "signed in");

        self.client.navigate(&self.client.config().signed_in_route);
        Ok(user)
    }

    /// End the session here and in every other context sharing it.
    pub fn sign_out(&self) {
        store_user(&self.user, None);
        self.client.store().clear();
        let _ = self.client.events().send(SessionEvent::SignedOut);
        self.client.navigate(&self.client.config().entry_route);
    }

    /// Restore a persisted session: load the durable entries and, when an
    /// access token is present, fetch the profile through the refresh-aware
    /// client. Any failure signs the context out.
    ///
    /// Returns whether a session was established.
    pub async fn bootstrap(&self) -> Result<bool, AuthError> {
        if let Err(e) = self.client.store().load_persisted() {
            tracing::warn!(err = %e, "failed to load persisted session");
        }
        if self.client.store().access_token().is_none() {
            return Ok(false);
        }

        let path = self.client.config().profile_path.clone();
        let profile = self
            .client
            .send(ApiRequest::get(path))
            .await
            .and_then(|response| response.json::<ProfileResponse>());
        match profile {
            Ok(profile) => {
                store_user(
                    &self.user,
                    Some(User {
                        email: profile.email,
                        permissions: profile.permissions,
                        roles: profile.roles,
                    }),
                );
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(err = %e, "session bootstrap failed, signing out");
                self.sign_out();
                Err(e)
            }
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Listen for sign-outs broadcast by other contexts sharing the session.
fn spawn_signout_listener(
    client: &Arc<ApiClient>,
    user: Arc<RwLock<Option<User>>>,
    cancel: CancellationToken,
) {
    let mut events = client.subscribe();
    let client = Arc::clone(client);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(SessionEvent::SignedOut) => {
                        // The initiating context cleared its user before
                        // broadcasting; skip it so it does not navigate
                        // twice.
                        if read_user(&user).is_some() {
                            store_user(&user, None);
                            client.store().clear();
                            let route = client.config().entry_route.clone();
                            client.navigate(&route);
                        }
                    }
                    Ok(SessionEvent::Refreshed) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "session event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    });
}

// Lock helpers tolerate poisoning; the user record is plain data.
fn read_user(user: &RwLock<Option<User>>) -> Option<User> {
    user.read().unwrap_or_else(|e| e.into_inner()).clone()
}

fn store_user(user: &RwLock<Option<User>>, value: Option<User>) {
    *user.write().unwrap_or_else(|e| e.into_inner()) = value;
}
