//! Session store: credential cache, active-session pointer, flash notices.
//!
//! One `SessionStore` exists per running application instance and is handed
//! by reference to the transport and to UI entry points — there is no
//! ambient global. It owns two storage scopes:
//!
//! - **durable**: the per-store credential cache and the active-store
//!   pointer, surviving restarts;
//! - **tab**: a fast-path mirror of the active store id / tenant id /
//!   access token, plus the pending flash notice, living only as long as
//!   the embedding surface.
//!
//! ## Design
//! - At most one session per store id; saving again replaces the entry
//!   (last write wins).
//! - Cache mutations take an internal lock so each call is one atomic
//!   read-modify-write of the whole persisted map.
//! - The tab mirror answers "is anyone signed in"; the cache answers
//!   "what is the freshest token" (a background refresh updates the cache
//!   while a given tab's mirror may lag).

use crate::claims::{decode_unverified, UnverifiedClaims};
use crate::storage::KeyValueStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Storage keys for the two scopes.
mod keys {
    /// Durable: store id → session map (JSON).
    pub const SESSIONS: &str = "sessions";
    /// Durable: currently-active store id.
    pub const ACTIVE_STORE_ID: &str = "active_store_id";
    /// Tab: active store id mirror.
    pub const TAB_STORE_ID: &str = "active_store_id";
    /// Tab: active tenant id.
    pub const TAB_TENANT_ID: &str = "active_tenant_id";
    /// Tab: active access token mirror.
    pub const TAB_ACCESS_TOKEN: &str = "active_access_token";
    /// Tab: pending flash notice (JSON, read-once).
    pub const FLASH_NOTICE: &str = "flash_notice";
}

/// One authenticated relationship with one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSession {
    /// Store the session authenticates against.
    pub store_id: String,
    /// Owning tenant. May be empty for some flows.
    #[serde(default)]
    pub tenant_id: String,
    /// Short-lived bearer credential, treated as opaque.
    pub access_token: String,
}

/// Severity of a flash notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    Info,
    Error,
}

/// One-shot message shown by the next rendered page after a forced
/// navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashNotice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl FlashNotice {
    /// The notice written on forced session expiry.
    pub fn session_expired() -> Self {
        Self {
            title: "Session expired".to_string(),
            description: "Please sign in again to continue.".to_string(),
            variant: NoticeVariant::Error,
        }
    }
}

/// Snapshot of the active session for UI chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub signed_in: bool,
    pub store_id: Option<String>,
    pub tenant_id: Option<String>,
}

/// Credential cache + active-session pointer + flash notice channel.
pub struct SessionStore {
    durable: Arc<dyn KeyValueStore>,
    tab: Arc<dyn KeyValueStore>,
    // Serializes cache read-modify-write so each save/remove is atomic.
    cache_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, tab: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable,
            tab,
            cache_lock: Mutex::new(()),
        }
    }

    /// Store with both scopes in memory. For tests and ephemeral hosts.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(crate::storage::MemoryStore::new()),
            Arc::new(crate::storage::MemoryStore::new()),
        )
    }

    // ── Credential cache ─────────────────────────────────────────────

    fn load_sessions(&self) -> HashMap<String, StoreSession> {
        self.durable
            .get(keys::SESSIONS)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(map) => Some(map),
                Err(err) => {
                    tracing::warn!(error = %err, "Credential cache unreadable, treating as empty");
                    None
                }
            })
            .unwrap_or_default()
    }

    fn store_sessions(&self, sessions: &HashMap<String, StoreSession>) {
        match serde_json::to_string(sessions) {
            Ok(raw) => self.durable.set(keys::SESSIONS, &raw),
            Err(err) => tracing::warn!(error = %err, "Failed to encode credential cache"),
        }
    }

    /// Upsert the session for its store id. Replaces any prior entry.
    pub fn save(&self, session: StoreSession) {
        let _guard = self.cache_lock.lock();
        let mut sessions = self.load_sessions();
        sessions.insert(session.store_id.clone(), session);
        self.store_sessions(&sessions);
    }

    pub fn get(&self, store_id: &str) -> Option<StoreSession> {
        self.load_sessions().remove(store_id)
    }

    /// Delete the entry for `store_id` if present; no-op otherwise.
    pub fn remove(&self, store_id: &str) {
        let _guard = self.cache_lock.lock();
        let mut sessions = self.load_sessions();
        if sessions.remove(store_id).is_some() {
            self.store_sessions(&sessions);
        }
    }

    // ── Active session pointer ───────────────────────────────────────

    /// Mark a store as the active one: writes the tab mirror and the
    /// durable pointer.
    pub fn set_active(&self, store_id: &str, tenant_id: &str, access_token: &str) {
        self.tab.set(keys::TAB_STORE_ID, store_id);
        self.tab.set(keys::TAB_TENANT_ID, tenant_id);
        self.tab.set(keys::TAB_ACCESS_TOKEN, access_token);
        self.durable.set(keys::ACTIVE_STORE_ID, store_id);
    }

    /// Active store id: tab value first, durable pointer as fallback
    /// (covers a fresh tab that inherited a durable pointer).
    pub fn active_store_id(&self) -> Option<String> {
        non_empty(self.tab.get(keys::TAB_STORE_ID))
            .or_else(|| non_empty(self.durable.get(keys::ACTIVE_STORE_ID)))
    }

    /// Active access token: prefer the credential-cache entry for the
    /// active store (freshest after a background refresh), fall back to
    /// the tab mirror.
    pub fn active_access_token(&self) -> Option<String> {
        if let Some(store_id) = self.active_store_id() {
            if let Some(session) = self.get(&store_id) {
                if !session.access_token.is_empty() {
                    return Some(session.access_token);
                }
            }
        }
        non_empty(self.tab.get(keys::TAB_ACCESS_TOKEN))
    }

    /// Active tenant id. Tab scope only — tenant does not change via
    /// background refresh.
    pub fn active_tenant_id(&self) -> Option<String> {
        non_empty(self.tab.get(keys::TAB_TENANT_ID))
    }

    /// Drop the tab mirror, the durable pointer, and the cache entry of
    /// whatever store was active.
    pub fn clear(&self) {
        let active = self.active_store_id();
        self.tab.remove(keys::TAB_STORE_ID);
        self.tab.remove(keys::TAB_TENANT_ID);
        self.tab.remove(keys::TAB_ACCESS_TOKEN);
        self.durable.remove(keys::ACTIVE_STORE_ID);
        if let Some(store_id) = active {
            self.remove(&store_id);
        }
    }

    // ── Flash notice channel ─────────────────────────────────────────

    /// Queue a one-shot notice. Overwrites any pending one — the last
    /// write before navigation wins.
    pub fn set_flash(&self, notice: FlashNotice) {
        match serde_json::to_string(&notice) {
            Ok(raw) => self.tab.set(keys::FLASH_NOTICE, &raw),
            Err(err) => tracing::warn!(error = %err, "Failed to encode flash notice"),
        }
    }

    /// Read and delete the pending notice. The second consecutive call
    /// returns `None`.
    pub fn consume_flash(&self) -> Option<FlashNotice> {
        let raw = self.tab.get(keys::FLASH_NOTICE)?;
        self.tab.remove(keys::FLASH_NOTICE);
        serde_json::from_str(&raw).ok()
    }

    // ── Derived views ────────────────────────────────────────────────

    /// Display-only claims from the active access token. `None` when no
    /// token is active or the token's payload is malformed.
    pub fn read_active_claims(&self) -> Option<UnverifiedClaims> {
        decode_unverified(&self.active_access_token()?)
    }

    /// Snapshot for UI chrome ("signed in as …", store switcher).
    pub fn status(&self) -> SessionStatus {
        let store_id = self.active_store_id();
        SessionStatus {
            signed_in: store_id.is_some() && self.active_access_token().is_some(),
            store_id,
            tenant_id: self.active_tenant_id(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
