//! Session lifecycle: sign-in, sign-out, silent refresh.
//!
//! Per store the lifecycle runs Anonymous → Signed-In → (Refreshing |
//! Signed-Out / Expired); Signed-Out and Expired stay terminal for that
//! store until a new sign-in. The manager is the only writer of the
//! credential cache besides the transport's expiry path.

use crate::error::RpcError;
use crate::rpc::{
    RefreshRequest, RefreshResponse, SignInRequest, SignInResponse, SignOutRequest,
    REFRESH_METHOD, SIGN_IN_METHOD, SIGN_OUT_METHOD,
};
use crate::session::{SessionStore, StoreSession};
use crate::transport::{Backend, RpcCall};
use std::sync::Arc;

/// Orchestrates the credential lifecycle against the backend auth RPCs.
///
/// Auth RPCs go straight through the raw [`Backend`] seam — never through
/// the authenticated transport — so a failing refresh can never trigger
/// another refresh.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<SessionStore>,
    backend: Arc<dyn Backend>,
}

impl SessionManager {
    pub fn new(sessions: Arc<SessionStore>, backend: Arc<dyn Backend>) -> Self {
        Self { sessions, backend }
    }

    /// Sign in to a store. On success the returned session is cached and
    /// made active. Backend errors propagate unchanged.
    pub async fn sign_in(&self, request: SignInRequest) -> Result<StoreSession, RpcError> {
        let params = serde_json::to_value(&request)?;
        let value = self
            .backend
            .call(RpcCall {
                method: SIGN_IN_METHOD,
                params,
                bearer: None,
            })
            .await?;
        let response: SignInResponse = serde_json::from_value(value)?;

        let session = StoreSession {
            store_id: response.store_id,
            tenant_id: response.tenant_id,
            access_token: response.access_token,
        };
        self.sessions.save(session.clone());
        self.sessions
            .set_active(&session.store_id, &session.tenant_id, &session.access_token);
        tracing::info!(store_id = %session.store_id, "Signed in");
        Ok(session)
    }

    /// Sign out of a store (the active one when `store_id` is `None`).
    ///
    /// The backend call is best-effort: local cleanup runs even when the
    /// RPC fails, so a dead network can never keep a session alive.
    pub async fn sign_out(&self, store_id: Option<&str>, tenant_id: Option<&str>) {
        let target = store_id
            .map(str::to_string)
            .or_else(|| self.sessions.active_store_id());

        let request = SignOutRequest {
            store_selector: target.clone(),
            tenant_selector: tenant_id
                .map(str::to_string)
                .or_else(|| self.sessions.active_tenant_id()),
        };
        let params = serde_json::to_value(&request).unwrap_or(serde_json::Value::Null);
        if let Err(err) = self
            .backend
            .call(RpcCall {
                method: SIGN_OUT_METHOD,
                params,
                bearer: self.sessions.active_access_token(),
            })
            .await
        {
            tracing::warn!(error = %err, "Sign-out RPC failed, clearing local session anyway");
        }

        if let Some(store_id) = &target {
            self.sessions.remove(store_id);
        }
        self.sessions.clear();
        tracing::info!(store_id = target.as_deref().unwrap_or(""), "Signed out");
    }

    /// Exchange the ambient refresh credential (HTTP-only cookie) for a new
    /// access token and re-activate it.
    ///
    /// `None` means "refresh did not help": no active store, network error,
    /// non-2xx, or a response missing `access_token`/`store_id`. State is
    /// only mutated on a well-formed success.
    pub async fn refresh(&self) -> Option<StoreSession> {
        let store_id = self.sessions.active_store_id()?;

        let request = RefreshRequest {
            store_selector: store_id.clone(),
            tenant_selector: self.sessions.active_tenant_id(),
        };
        let params = serde_json::to_value(&request).ok()?;
        let value = match self
            .backend
            .call(RpcCall {
                method: REFRESH_METHOD,
                params,
                bearer: None,
            })
            .await
        {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(store_id = %store_id, error = %err, "Refresh RPC failed");
                return None;
            }
        };

        let response: RefreshResponse = serde_json::from_value(value).ok()?;
        if response.access_token.is_empty() || response.store_id.is_empty() {
            tracing::debug!(store_id = %store_id, "Refresh response missing access_token or store_id");
            return None;
        }

        // Tenant is tab-scoped and not part of every refresh response;
        // keep the current one when the backend omits it.
        let tenant_id = if response.tenant_id.is_empty() {
            self.sessions.active_tenant_id().unwrap_or_default()
        } else {
            response.tenant_id
        };

        let session = StoreSession {
            store_id: response.store_id,
            tenant_id,
            access_token: response.access_token,
        };
        self.sessions.save(session.clone());
        self.sessions
            .set_active(&session.store_id, &session.tenant_id, &session.access_token);
        tracing::debug!(store_id = %session.store_id, "Access token refreshed");
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend: answers auth RPCs from canned responses and counts
    /// calls per method.
    #[derive(Default)]
    struct MockBackend {
        calls: Mutex<Vec<String>>,
        sign_in_response: Option<Value>,
        refresh_response: Option<Value>,
        fail_all: bool,
        call_count: AtomicUsize,
    }

    #[async_trait]
    impl Backend for MockBackend {
        async fn call(&self, call: RpcCall<'_>) -> Result<Value, RpcError> {
            self.calls.lock().push(call.method.to_string());
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(RpcError::Backend {
                    code: ErrorCode::Internal,
                    message: "backend down".into(),
                });
            }
            let canned = match call.method {
                SIGN_IN_METHOD => self.sign_in_response.clone(),
                REFRESH_METHOD => self.refresh_response.clone(),
                _ => Some(Value::Null),
            };
            canned.ok_or(RpcError::Backend {
                code: ErrorCode::Unauthenticated,
                message: "no canned response".into(),
            })
        }
    }

    fn manager_with(
        backend: MockBackend,
    ) -> (Arc<SessionStore>, Arc<MockBackend>, SessionManager) {
        let sessions = Arc::new(SessionStore::in_memory());
        let backend = Arc::new(backend);
        let manager = SessionManager::new(sessions.clone(), backend.clone());
        (sessions, backend, manager)
    }

    #[tokio::test]
    async fn sign_in_caches_and_activates() {
        let backend = MockBackend {
            sign_in_response: Some(json!({
                "access_token": "tok1",
                "store_id": "s1",
                "tenant_id": "t1",
            })),
            ..Default::default()
        };
        let (sessions, _backend, manager) = manager_with(backend);

        let session = manager
            .sign_in(SignInRequest {
                store_selector: "s1".into(),
                email: Some("staff@example.com".into()),
                password: "hunter2".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(session.access_token, "tok1");
        assert_eq!(sessions.active_store_id(), Some("s1".to_string()));
        assert_eq!(sessions.active_access_token(), Some("tok1".to_string()));
        assert_eq!(sessions.get("s1").unwrap().tenant_id, "t1");
    }

    #[tokio::test]
    async fn sign_in_failure_propagates_and_leaves_no_state() {
        let backend = MockBackend {
            fail_all: true,
            ..Default::default()
        };
        let (sessions, _backend, manager) = manager_with(backend);

        let err = manager
            .sign_in(SignInRequest {
                store_selector: "s1".into(),
                password: "wrong".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Backend { .. }));
        assert_eq!(sessions.active_store_id(), None);
        assert!(sessions.get("s1").is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_locally_even_when_rpc_fails() {
        let backend = MockBackend {
            fail_all: true,
            ..Default::default()
        };
        let (sessions, _backend, manager) = manager_with(backend);

        sessions.save(StoreSession {
            store_id: "s1".into(),
            tenant_id: "t1".into(),
            access_token: "tok1".into(),
        });
        sessions.set_active("s1", "t1", "tok1");

        manager.sign_out(None, None).await;

        assert_eq!(sessions.active_store_id(), None);
        assert!(sessions.get("s1").is_none());
    }

    #[tokio::test]
    async fn refresh_without_active_store_is_a_noop() {
        let backend = MockBackend::default();
        let (_sessions, backend, manager) = manager_with(backend);

        assert!(manager.refresh().await.is_none());
        // No RPC was issued.
        assert_eq!(backend.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_success_reactivates_new_token() {
        let backend = MockBackend {
            refresh_response: Some(json!({
                "access_token": "tok2",
                "store_id": "s1",
            })),
            ..Default::default()
        };
        let (sessions, _backend, manager) = manager_with(backend);

        sessions.save(StoreSession {
            store_id: "s1".into(),
            tenant_id: "t1".into(),
            access_token: "tok1".into(),
        });
        sessions.set_active("s1", "t1", "tok1");

        let refreshed = manager.refresh().await.unwrap();
        assert_eq!(refreshed.access_token, "tok2");
        // Tenant survives a refresh response that omits it.
        assert_eq!(refreshed.tenant_id, "t1");
        assert_eq!(sessions.active_access_token(), Some("tok2".to_string()));
        assert_eq!(sessions.get("s1").unwrap().access_token, "tok2");
    }

    #[tokio::test]
    async fn refresh_failure_leaves_state_untouched() {
        let backend = MockBackend {
            fail_all: true,
            ..Default::default()
        };
        let (sessions, _backend, manager) = manager_with(backend);

        sessions.save(StoreSession {
            store_id: "s1".into(),
            tenant_id: "t1".into(),
            access_token: "tok1".into(),
        });
        sessions.set_active("s1", "t1", "tok1");

        assert!(manager.refresh().await.is_none());
        assert_eq!(sessions.active_access_token(), Some("tok1".to_string()));
        assert_eq!(sessions.get("s1").unwrap().access_token, "tok1");
    }

    #[tokio::test]
    async fn refresh_rejects_response_missing_fields() {
        let backend = MockBackend {
            refresh_response: Some(json!({ "store_id": "s1" })),
            ..Default::default()
        };
        let (sessions, _backend, manager) = manager_with(backend);

        sessions.set_active("s1", "t1", "tok1");

        assert!(manager.refresh().await.is_none());
        assert_eq!(sessions.active_access_token(), Some("tok1".to_string()));
    }

}
