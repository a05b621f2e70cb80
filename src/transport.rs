//! Authenticated transport: bearer injection, refresh-and-retry, expiry.
//!
//! Every business RPC the UI issues goes through [`AuthTransport::call`],
//! which attaches the active bearer token, watches for authentication
//! failures, and performs exactly one silent refresh-and-retry before
//! declaring the session expired. Non-authentication failures pass through
//! untouched.
//!
//! ## Design
//! - The wire layer is the [`Backend`] trait; [`HttpBackend`] is the
//!   reqwest implementation. Auth RPCs (sign-in/out/refresh) call the
//!   backend directly via [`crate::manager::SessionManager`] and are never
//!   intercepted here.
//! - Retry state is an explicit per-request [`Attempt`] descriptor, so the
//!   single-retry bound holds per request by construction.
//! - There is no cross-request refresh coalescing: N concurrent requests
//!   hitting 401 at once each run their own refresh. Each resulting cache
//!   write is individually atomic and the last one wins, which is fine for
//!   single-user session state.

use crate::error::{ErrorEnvelope, RpcError};
use crate::manager::SessionManager;
use crate::navigation::{is_sign_in_route, NavigationSink, SIGN_IN_ROUTE};
use crate::session::{FlashNotice, SessionStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// One outbound RPC as seen by the wire layer.
pub struct RpcCall<'a> {
    /// Method path relative to the API base, e.g. `catalog/list_products`.
    pub method: &'a str,
    /// JSON request body.
    pub params: Value,
    /// Bearer token to attach, when one is known.
    pub bearer: Option<String>,
}

/// The raw RPC wire. Implementations classify failures into [`RpcError`]
/// but perform no auth handling of their own.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn call(&self, call: RpcCall<'_>) -> Result<Value, RpcError>;
}

/// reqwest implementation of the wire: JSON POST to `{base}/{method}`.
///
/// The client keeps a cookie jar so the HTTP-only refresh cookie set at
/// sign-in rides along on the refresh RPC.
pub struct HttpBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &crate::config::Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn call(&self, call: RpcCall<'_>) -> Result<Value, RpcError> {
        let mut request = self.http.post(self.method_url(call.method)).json(&call.params);
        if let Some(token) = &call.bearer {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&body)?);
        }

        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(RpcError::Backend {
                code: envelope.code,
                message: envelope.message,
            }),
            Err(_) => Err(RpcError::Status { status, body }),
        }
    }
}

/// Per-request retry state, carried alongside the call instead of being
/// smuggled through shared header state.
struct Attempt {
    retried: bool,
}

/// Composition point wrapping every outbound business RPC.
pub struct AuthTransport {
    backend: Arc<dyn Backend>,
    sessions: Arc<SessionStore>,
    manager: SessionManager,
    navigator: Arc<dyn NavigationSink>,
}

impl AuthTransport {
    pub fn new(
        backend: Arc<dyn Backend>,
        sessions: Arc<SessionStore>,
        navigator: Arc<dyn NavigationSink>,
    ) -> Self {
        let manager = SessionManager::new(sessions.clone(), backend.clone());
        Self {
            backend,
            sessions,
            manager,
            navigator,
        }
    }

    /// Issue a typed business RPC with auth injection and repair.
    ///
    /// On an unauthenticated failure this refreshes the session and
    /// re-issues the same call at most once; if that does not help, the
    /// session is evicted, a flash notice is queued, the user is sent to
    /// the sign-in entry point (unless already there), and the original
    /// error is returned.
    pub async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, RpcError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let params = serde_json::to_value(request)?;
        let request_id = Uuid::new_v4();
        let mut attempt = Attempt { retried: false };
        let mut bearer = self.sessions.active_access_token();

        loop {
            let result = self
                .backend
                .call(RpcCall {
                    method,
                    params: params.clone(),
                    bearer: bearer.clone(),
                })
                .await;

            match result {
                Ok(value) => return Ok(serde_json::from_value(value)?),
                Err(err) if err.is_unauthenticated() && !attempt.retried => {
                    tracing::debug!(
                        request_id = %request_id,
                        method,
                        "Unauthenticated, attempting token refresh"
                    );
                    match self.manager.refresh().await {
                        Some(session) => {
                            attempt.retried = true;
                            bearer = Some(session.access_token);
                        }
                        None => return Err(self.expire(request_id, method, err)),
                    }
                }
                Err(err) if err.is_unauthenticated() => {
                    // Already retried once; the session is beyond repair.
                    return Err(self.expire(request_id, method, err));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Evict the session, queue the expiry notice, and send the user to
    /// sign-in. Returns the original error for the caller to re-raise.
    fn expire(&self, request_id: Uuid, method: &str, err: RpcError) -> RpcError {
        tracing::info!(request_id = %request_id, method, "Session expired, evicting credentials");
        self.sessions.set_flash(FlashNotice::session_expired());
        self.sessions.clear();

        let route = self.navigator.current_route();
        if !is_sign_in_route(&route) {
            self.navigator.navigate(SIGN_IN_ROUTE);
        }
        err
    }
}
