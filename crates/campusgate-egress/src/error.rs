//! Egress error types

use campusgate_core::masking::mask_url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EgressError {
    /// The identity portal sent us back to its login page
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login form or page no longer has the shape we scrape
    #[error("Unexpected portal markup: {0}")]
    UnexpectedMarkup(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Portal returned status {status_code} for {url}")]
    UpstreamStatus { status_code: u16, url: String },

    /// The registration portal bounced the post-login handshake to the login page
    #[error("Registration portal login rejected")]
    SecondaryLoginRejected,

    /// Stored registration portal cookies are no longer accepted
    #[error("Registration portal session rejected")]
    SessionRejected,

    /// The student app refused the primary login's cookies or token
    #[error("Student app session rejected")]
    AppSessionRejected,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, EgressError>;

impl From<EgressError> for campusgate_core::Error {
    fn from(err: EgressError) -> Self {
        use campusgate_core::Error;

        match err {
            EgressError::InvalidCredentials => Error::AuthFailure("invalid credentials".to_string()),
            EgressError::SecondaryLoginRejected => {
                Error::AuthFailure("registration portal login rejected".to_string())
            }
            EgressError::UnexpectedMarkup(msg) => Error::UpstreamFormat(msg),
            EgressError::HttpError(e) if e.is_decode() => {
                Error::UpstreamFormat(mask_url(&e.to_string()))
            }
            EgressError::HttpError(e) => Error::UpstreamUnavailable(mask_url(&e.to_string())),
            EgressError::Timeout(secs) => {
                Error::UpstreamUnavailable(format!("timeout after {}s", secs))
            }
            EgressError::UpstreamStatus { status_code, url } => Error::UpstreamUnavailable(
                format!("status {} from {}", status_code, mask_url(&url)),
            ),
            EgressError::SessionRejected => {
                Error::SessionExpired("registration portal session expired".to_string())
            }
            EgressError::AppSessionRejected => {
                Error::SessionExpired("student app session expired, please log in again".to_string())
            }
            EgressError::ConfigError(msg) => Error::Config(msg),
        }
    }
}
