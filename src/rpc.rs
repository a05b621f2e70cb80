//! Wire types for the backend auth RPCs.
//!
//! Business RPCs go through [`crate::transport::AuthTransport::call`] with
//! their own typed request/response structs owned by the feature modules;
//! only the auth surface is defined here.

use serde::{Deserialize, Serialize};

/// Sign-in RPC method path.
pub const SIGN_IN_METHOD: &str = "auth/sign_in";
/// Sign-out RPC method path.
pub const SIGN_OUT_METHOD: &str = "auth/sign_out";
/// Token refresh RPC method path. Authenticated by the HTTP-only refresh
/// cookie, not a bearer token.
pub const REFRESH_METHOD: &str = "auth/refresh_token";

/// Sign-in request. The backend requires at least one identifier field
/// (email / login id / phone) alongside the password; this layer does not
/// validate which one is present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignInRequest {
    /// Store to sign into.
    pub store_selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

/// Successful sign-in payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub store_id: String,
    #[serde(default)]
    pub tenant_id: String,
}

/// Sign-out request. Both selectors optional; the backend revokes whatever
/// matches the ambient credentials.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignOutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_selector: Option<String>,
}

/// Token refresh request.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub store_selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_selector: Option<String>,
}

/// Token refresh payload. Defaults keep parsing tolerant: a response with
/// an empty `access_token` or `store_id` is treated as a refresh failure
/// by the lifecycle manager, not a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub tenant_id: String,
}
