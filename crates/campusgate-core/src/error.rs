//! Error types for CampusGate Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad credentials, reported by the identity portal bouncing back to its login page
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// Portal markup or handshake shape no longer matches what we expect
    #[error("Unexpected upstream response format: {0}")]
    UpstreamFormat(String),

    /// Network error, timeout or non-2xx status from a portal
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Session capacity exceeded ({max_sessions} active sessions)")]
    CapacityExceeded { max_sessions: usize },

    /// Missing or unknown session token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The portal no longer honours the cookies stored for this session
    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Secure token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code for the boundary layer
    pub fn code(&self) -> &'static str {
        match self {
            Error::AuthFailure(_) => "AUTH_FAILED",
            Error::UpstreamFormat(_) => "UPSTREAM_FORMAT_ERROR",
            Error::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Error::CapacityExceeded { .. } => "MAX_SESSIONS_REACHED",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::SessionExpired(_) => "SESSION_EXPIRED",
            Error::InvalidRequest(_) => "INVALID_REQUEST",
            Error::TokenGeneration(_) => "TOKEN_GENERATION_FAILED",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may reasonably try the same operation again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable(_) | Error::CapacityExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
