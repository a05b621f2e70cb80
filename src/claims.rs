//! Display-only claim extraction from bearer tokens.
//!
//! Decodes the payload segment of a JWT-shaped token **without verifying its
//! signature**. The result exists purely to render "signed in as …" UI —
//! authorization is the backend's job, and nothing here must ever gate
//! access. Malformed input degrades to `None`, never an error.

use base64::Engine;
use serde::Deserialize;

/// Actor info lifted from a bearer token payload without signature
/// verification.
///
/// The name is deliberate: these values are unverified and display-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedClaims {
    /// Subject id of the signed-in staff member.
    pub staff_id: String,
    /// Actor role as asserted by the token (e.g. "staff").
    pub role: String,
    /// Store the token was issued for.
    pub store_id: String,
}

#[derive(Deserialize)]
struct ClaimPayload {
    #[serde(default)]
    sub: String,
    #[serde(default)]
    actor_type: String,
    #[serde(default)]
    store_id: String,
}

/// Decode the middle segment of a three-segment bearer token.
///
/// Returns `None` when the token does not have exactly three dot-separated
/// segments, the payload is not base64url JSON, or any of the required
/// fields (`sub`, `actor_type`, `store_id`) is missing or empty.
pub fn decode_unverified(token: &str) -> Option<UnverifiedClaims> {
    let mut segments = token.split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    // Spec-compliant emitters use unpadded base64url; strip padding so
    // padded payloads decode too.
    let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let parsed: ClaimPayload = serde_json::from_slice(&raw).ok()?;

    if parsed.sub.is_empty() || parsed.actor_type.is_empty() || parsed.store_id.is_empty() {
        return None;
    }

    Some(UnverifiedClaims {
        staff_id: parsed.sub,
        role: parsed.actor_type,
        store_id: parsed.store_id,
    })
}
