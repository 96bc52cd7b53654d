// Authentication errors

use thiserror::Error;

use crate::cache::CacheError;

/// Errors produced while obtaining or storing identity tokens
#[derive(Error, Debug)]
pub enum AuthError {
    /// Identity service answered with something other than 200
    #[error("An error occurred while authenticating.")]
    Authentication { status: u16, body: String },

    /// Token payload could not be decoded
    #[error("Failed to decode identity token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    /// Token decoded but lacks a claim needed to key the cache
    #[error("Identity token is missing the {0} claim")]
    MissingClaim(&'static str),

    /// Transport failure talking to the identity service
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Token cache failure
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl AuthError {
    /// HTTP status returned by the identity service, if it rejected the call
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Authentication { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body returned by the identity service, if it rejected the call
    pub fn body(&self) -> Option<&str> {
        match self {
            AuthError::Authentication { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_error_message_and_context() {
        let err = AuthError::Authentication {
            status: 500,
            body: "test error".to_string(),
        };
        assert_eq!(err.to_string(), "An error occurred while authenticating.");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body(), Some("test error"));
    }

    #[test]
    fn test_missing_claim_message() {
        let err = AuthError::MissingClaim("accountId");
        assert_eq!(err.to_string(), "Identity token is missing the accountId claim");
        assert_eq!(err.status(), None);
        assert_eq!(err.body(), None);
    }
}
