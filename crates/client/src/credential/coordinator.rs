// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Refresh coordinator: single-flight token refresh with ordered replay.
//!
//! The coordinator is the sole owner of the refresh state machine and the
//! pending-request queue. A request that fails with the expiry code suspends
//! here until the shared refresh call settles; the cycle task then replays
//! the queue in enqueue order with the fresh token, or rejects every entry
//! if the refresh failed.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::{oneshot, Mutex};

use crate::api::classify::{classify, Disposition};
use crate::api::dispatch::Dispatcher;
use crate::api::{ApiRequest, ApiResponse};
use crate::config::ClientConfig;
use crate::credential::refresh::do_refresh;
use crate::credential::store::TokenStore;
use crate::credential::Session;
use crate::error::AuthError;
use crate::session::SessionHook;

/// Refresh progress for one session. Process-wide per session, never per
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    Idle,
    Refreshing,
}

/// A request suspended behind the in-flight refresh, with the channel that
/// carries its final outcome back to the original caller.
struct PendingRequest {
    request: ApiRequest,
    reply: oneshot::Sender<Result<ApiResponse, AuthError>>,
}

/// The refresh flag and the FIFO queue settle together or not at all; one
/// mutex guards both.
struct Cycle {
    state: RefreshState,
    queue: VecDeque<PendingRequest>,
}

pub struct RefreshCoordinator {
    dispatcher: Dispatcher,
    store: Arc<TokenStore>,
    refresh_url: String,
    hook: SessionHook,
    cycle: Mutex<Cycle>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        config: &ClientConfig,
        store: Arc<TokenStore>,
        hook: SessionHook,
    ) -> Arc<Self> {
        let dispatcher = Dispatcher::new(config, Arc::clone(&store));
        Arc::new(Self {
            dispatcher,
            store,
            refresh_url: config.refresh_url(),
            hook,
            cycle: Mutex::new(Cycle { state: RefreshState::Idle, queue: VecDeque::new() }),
        })
    }

    /// Issue a request, absorbing expired-token failures into the refresh
    /// cycle. Callers observe their original response, a replayed response,
    /// or a terminal error — never the expiry itself.
    pub async fn send(self: &Arc<Self>, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        match self.dispatcher.send(&request).await {
            Ok(resp) => Ok(resp),
            Err(AuthError::Http { status, body }) => match classify(status, &body) {
                Disposition::PassThrough => Err(AuthError::Http { status, body }),
                Disposition::TokenExpired => self.recover(request).await,
                Disposition::Unauthenticated => {
                    tracing::warn!(status, "request rejected as unauthenticated, ending session");
                    match self.hook.on_session_invalid() {
                        Ok(()) => Err(AuthError::Unauthenticated),
                        Err(e) => Err(e),
                    }
                }
            },
            Err(other) => Err(other),
        }
    }

    /// Queue depth behind the in-flight refresh.
    pub async fn pending(&self) -> usize {
        self.cycle.lock().await.queue.len()
    }

    /// Enqueue a request that failed on a stale token and wait for the
    /// cycle to settle it. The first expiry per cycle starts the refresh;
    /// later arrivals only queue (single-flight).
    async fn recover(self: &Arc<Self>, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let (reply, settled) = oneshot::channel();
        let starts_cycle = {
            let mut cycle = self.cycle.lock().await;
            cycle.queue.push_back(PendingRequest { request, reply });
            match cycle.state {
                RefreshState::Idle => {
                    cycle.state = RefreshState::Refreshing;
                    true
                }
                RefreshState::Refreshing => false,
            }
        };

        if starts_cycle {
            let coordinator = Arc::clone(self);
            tokio::spawn(async move { coordinator.run_cycle().await });
        }

        match settled.await {
            Ok(result) => result,
            Err(_) => Err(AuthError::RefreshFailed { reason: "refresh cycle dropped".to_owned() }),
        }
    }

    /// One refresh cycle: call the refresh endpoint, then settle the queue.
    async fn run_cycle(self: Arc<Self>) {
        let outcome = match self.store.refresh_token() {
            Some(refresh_token) => {
                do_refresh(self.dispatcher.http(), &self.refresh_url, &refresh_token).await
            }
            None => Err(anyhow::anyhow!("no refresh token in store")),
        };

        match outcome {
            Ok(tokens) => {
                // Commit before settling, so a request that expires right
                // after the state returns to idle refreshes with the rotated
                // refresh token rather than the consumed one.
                self.store.commit(Session {
                    access_token: tokens.token,
                    refresh_token: tokens.refresh_token,
                });
                self.hook.notify_refreshed();

                let drained = self.settle().await;
                tracing::debug!(replays = drained.len(), "token refreshed, replaying queue");
                for pending in drained {
                    // Sequential replay keeps enqueue order.
                    let result = self.replay(pending.request).await;
                    let _ = pending.reply.send(result);
                }
            }
            Err(e) => {
                let reason = e.to_string();
                let drained = self.settle().await;
                tracing::warn!(err = %reason, rejected = drained.len(), "token refresh failed");
                for pending in drained {
                    let _ = pending
                        .reply
                        .send(Err(AuthError::RefreshFailed { reason: reason.clone() }));
                }
                // Once per failed cycle, not once per queued request.
                if let Err(e) = self.hook.on_session_invalid() {
                    tracing::debug!(err = %e, "session termination left to the caller");
                }
            }
        }
    }

    /// Reissue a drained request through the full send path, so a further
    /// expiry starts a new cycle instead of re-entering this one. Boxed to
    /// cut the type recursion between replay and send.
    fn replay(
        self: &Arc<Self>,
        request: ApiRequest,
    ) -> BoxFuture<'static, Result<ApiResponse, AuthError>> {
        let coordinator = Arc::clone(self);
        Box::pin(async move { coordinator.send(request).await })
    }

    /// Atomically take the queue and return to idle. Both change under one
    /// lock, so a new cycle can never observe the old queue.
    async fn settle(&self) -> VecDeque<PendingRequest> {
        let mut cycle = self.cycle.lock().await;
        cycle.state = RefreshState::Idle;
        std::mem::take(&mut cycle.queue)
    }
}
