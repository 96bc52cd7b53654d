// Error handling module
// Defines errors surfaced by the service clients and the SDK facade

use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur while talking to MdsCloud services
#[derive(Error, Debug)]
pub enum SdkError {
    /// Service answered with an unexpected status
    #[error("{message}")]
    Service {
        message: String,
        status: u16,
        body: String,
    },

    /// Obtaining a token failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Transport failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SdkError {
    /// HTTP status attached to the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Service { status, .. } => Some(*status),
            SdkError::Auth(err) => err.status(),
            _ => None,
        }
    }

    /// Response body attached to the error, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            SdkError::Service { body, .. } => Some(body),
            SdkError::Auth(err) => err.body(),
            _ => None,
        }
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
