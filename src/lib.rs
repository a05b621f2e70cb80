//! Multi-store staff session and authenticated RPC transport for the
//! ShopDesk back-office client.
//!
//! Provides:
//! - Per-store credential cache (durable, survives restarts) with an
//!   active-session pointer and a tab-scoped fast path
//! - Sign-in / sign-out / silent-refresh lifecycle against the backend
//!   auth RPCs
//! - A transport wrapper that injects the bearer token on every business
//!   RPC and performs exactly one refresh-and-retry on authentication
//!   failure before evicting the session
//! - Display-only claim extraction from bearer tokens (unverified — never
//!   for authorization decisions)
//! - One-shot flash notices that survive a forced navigation
//!
//! ## Design
//! - One [`SessionStore`] per running application instance, constructed
//!   explicitly and passed by handle to the transport and UI entry
//!   points — no ambient globals.
//! - Storage and navigation are trait seams ([`KeyValueStore`],
//!   [`NavigationSink`]) so the embedding host decides where state lives
//!   and how redirects happen.
//! - Business errors pass through to the caller unchanged; only the
//!   `unauthenticated` class is handled here, and only once per request.

pub mod claims;
pub mod config;
pub mod error;
pub mod manager;
pub mod navigation;
pub mod rpc;
pub mod session;
pub mod storage;
pub mod transport;

pub use claims::{decode_unverified, UnverifiedClaims};
pub use config::Config;
pub use error::{ErrorCode, RpcError};
pub use manager::SessionManager;
pub use navigation::{
    is_sign_in_route, NavigationSink, RecordingNavigator, SIGN_IN_ROUTE, STAFF_SIGN_IN_ROUTE,
};
pub use session::{FlashNotice, NoticeVariant, SessionStatus, SessionStore, StoreSession};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use transport::{AuthTransport, Backend, HttpBackend, RpcCall};
