// Authentication types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity endpoint and fallback credentials for an [`AuthManager`](super::AuthManager)
#[derive(Clone, Default)]
pub struct AuthSettings {
    /// Base URL of the identity service
    pub identity_url: String,

    /// Account used when a call does not override it
    pub account: String,

    /// User used when a call does not override it
    pub user_id: String,

    /// Password used when a call does not override it
    pub password: String,

    /// Accept self-signed certificates on the authenticate call
    pub allow_self_sign_cert: bool,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("identity_url", &self.identity_url)
            .field("account", &self.account)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("allow_self_sign_cert", &self.allow_self_sign_cert)
            .finish()
    }
}

/// Per-call credential overrides
///
/// Any field left as `None` (or set to an empty string) falls back to the
/// manager's current default.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialOverrides {
    pub account_id: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
}

impl CredentialOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for CredentialOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialOverrides")
            .field("account_id", &self.account_id)
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Claims carried in an identity token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    pub account_id: Option<String>,
    pub user_id: Option<String>,

    /// Expiry as UNIX seconds
    pub exp: Option<i64>,
}

/// Identity service authenticate request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest<'a> {
    pub account_id: &'a str,
    pub user_id: &'a str,
    pub password: &'a str,
}

/// Identity service authenticate response
#[derive(Deserialize)]
pub struct AuthenticateResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_passwords() {
        let settings = AuthSettings {
            identity_url: "http://127.0.0.1:8080".to_string(),
            account: "testAccount".to_string(),
            user_id: "testUser".to_string(),
            password: "testPassword".to_string(),
            allow_self_sign_cert: false,
        };
        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("testUser"));
        assert!(!rendered.contains("testPassword"));

        let overrides = CredentialOverrides::new().password("hunter2");
        assert!(!format!("{:?}", overrides).contains("hunter2"));
    }

    #[test]
    fn test_authenticate_request_wire_format() {
        let request = AuthenticateRequest {
            account_id: "1001",
            user_id: "testUser",
            password: "testPassword",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "accountId": "1001",
                "userId": "testUser",
                "password": "testPassword"
            })
        );
    }

    #[test]
    fn test_claims_tolerate_extra_and_missing_fields() {
        let claims: IdentityClaims = serde_json::from_value(serde_json::json!({
            "accountId": "1001",
            "friendlyName": "Test",
            "iat": 1_600_000_000
        }))
        .unwrap();

        assert_eq!(claims.account_id.as_deref(), Some("1001"));
        assert_eq!(claims.user_id, None);
        assert_eq!(claims.exp, None);
    }
}
