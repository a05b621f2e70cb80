//! RPC error taxonomy shared by the session layer and the transport.
//!
//! Business errors (invalid credentials, not found, …) pass through to the
//! caller unchanged — rendering them is the UI's job. `unauthenticated` is
//! the one class the transport intercepts for refresh-and-retry.

use serde::Deserialize;
use thiserror::Error;

/// Structured error code carried in the backend's RPC error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthenticated,
    InvalidCredentials,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    FailedPrecondition,
    UnsupportedMediaType,
    Internal,
    /// Codes this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::NotFound => "not_found",
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::FailedPrecondition => "failed_precondition",
            ErrorCode::UnsupportedMediaType => "unsupported_media_type",
            ErrorCode::Internal => "internal",
            ErrorCode::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Wire shape of the backend's error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
}

/// Failure of a single RPC.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Structured backend error, surfaced to the caller unchanged.
    #[error("{code}: {message}")]
    Backend { code: ErrorCode, message: String },
    /// Non-2xx response without a parseable error envelope.
    #[error("unexpected response ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Connection-level failure (DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A request or response body did not match the expected shape.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl RpcError {
    /// Whether this failure is the authentication class the transport repairs
    /// (structured `unauthenticated` code, or a transport-level 401).
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            RpcError::Backend { code, .. } => *code == ErrorCode::Unauthenticated,
            RpcError::Status { status, .. } => *status == reqwest::StatusCode::UNAUTHORIZED,
            RpcError::Transport(err) => err.status() == Some(reqwest::StatusCode::UNAUTHORIZED),
            RpcError::Payload(_) => false,
        }
    }
}
