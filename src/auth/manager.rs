use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::authenticate;
use super::error::AuthError;
use super::token;
use super::types::{AuthSettings, CredentialOverrides};
use crate::cache::Cache;

/// Account/user pair used when a call does not override them
#[derive(Debug, Clone)]
struct DefaultIdentity {
    account: String,
    user_id: String,
}

/// Build the cache key for an identity endpoint/account/user triple.
/// `|` and `\` inside components are escaped so distinct triples never share a key.
pub fn cache_key(identity_url: &str, account: &str, user_id: &str) -> String {
    fn escape(part: &str) -> String {
        part.replace('\\', "\\\\").replace('|', "\\|")
    }

    format!(
        "{}|{}|{}",
        escape(identity_url),
        escape(account),
        escape(user_id)
    )
}

/// Pick the override unless it is missing or empty
fn resolve<'a>(candidate: Option<&'a str>, fallback: &'a str) -> &'a str {
    candidate.filter(|value| !value.is_empty()).unwrap_or(fallback)
}

/// Authentication manager
/// Hands out bearer tokens for the identity service, reusing cached tokens
/// until they come within [`token::EXPIRY_BUFFER_SECS`] of expiring.
///
/// Concurrent callers that miss the cache each authenticate on their own;
/// the last token written wins.
pub struct AuthManager {
    /// Base URL of the identity service
    identity_url: String,

    /// Current default account/user, reseeded whenever a token is stored
    identity: Arc<RwLock<DefaultIdentity>>,

    /// Default password (never written to the cache)
    password: String,

    /// Token store keyed by [`cache_key`]
    cache: Arc<dyn Cache>,

    /// HTTP client for authenticate requests
    client: Client,

    allow_self_sign_cert: bool,
}

impl AuthManager {
    /// Create a new AuthManager
    pub fn new(settings: AuthSettings, cache: Arc<dyn Cache>) -> Result<Self, AuthError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(settings.allow_self_sign_cert)
            .build()?;

        if settings.allow_self_sign_cert {
            tracing::warn!(
                identity_url = %settings.identity_url,
                "Self-signed certificates accepted for identity authentication"
            );
        }

        Ok(Self {
            identity_url: settings.identity_url,
            identity: Arc::new(RwLock::new(DefaultIdentity {
                account: settings.account,
                user_id: settings.user_id,
            })),
            password: settings.password,
            cache,
            client,
            allow_self_sign_cert: settings.allow_self_sign_cert,
        })
    }

    /// Get a valid token for the default credentials
    pub async fn token(&self) -> Result<String, AuthError> {
        self.get_authentication_token(&CredentialOverrides::default())
            .await
    }

    /// Get a valid token, authenticating only when no usable one is cached
    ///
    /// Expired or undecodable cached tokens are removed before a fresh one is
    /// requested.
    pub async fn get_authentication_token(
        &self,
        overrides: &CredentialOverrides,
    ) -> Result<String, AuthError> {
        let defaults = self.identity.read().await.clone();
        let account = resolve(overrides.account_id.as_deref(), &defaults.account);
        let user_id = resolve(overrides.user_id.as_deref(), &defaults.user_id);
        let password = resolve(overrides.password.as_deref(), &self.password);

        let key = cache_key(&self.identity_url, account, user_id);

        if let Some(existing) = self.cache.get(&key)? {
            tracing::debug!(account = account, user = user_id, "Existing token found");

            match existing.as_str().filter(|t| token::is_usable(t)) {
                Some(valid) => {
                    tracing::debug!("Existing token deemed valid");
                    return Ok(valid.to_string());
                }
                None => {
                    tracing::debug!("Existing token invalid, removing from cache");
                    self.cache.remove(&key)?;
                }
            }
        }

        let fresh = authenticate::request_token(
            &self.client,
            &self.identity_url,
            account,
            user_id,
            password,
        )
        .await?;

        self.set_authentication_token(&fresh).await?;
        Ok(fresh)
    }

    /// Store an externally obtained token
    ///
    /// The token's own `accountId`/`userId` claims become the new defaults and
    /// key the cache entry. No network call is made.
    pub async fn set_authentication_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = token::decode_claims(token)?;
        let account = claims.account_id.ok_or(AuthError::MissingClaim("accountId"))?;
        let user_id = claims.user_id.ok_or(AuthError::MissingClaim("userId"))?;

        let key = cache_key(&self.identity_url, &account, &user_id);
        self.cache.set(&key, Value::String(token.to_string()))?;

        tracing::debug!(
            account = %account,
            user = %user_id,
            "Stored token ({}...)",
            &token[..12.min(token.len())]
        );

        let mut identity = self.identity.write().await;
        identity.account = account;
        identity.user_id = user_id;

        Ok(())
    }

    /// Get the identity service URL
    pub fn identity_url(&self) -> &str {
        &self.identity_url
    }

    /// Get the current default account
    pub async fn current_account(&self) -> String {
        self.identity.read().await.account.clone()
    }

    /// Get the current default user
    pub async fn current_user(&self) -> String {
        self.identity.read().await.user_id.clone()
    }

    /// Whether self-signed certificates are accepted
    pub fn allow_self_sign_cert(&self) -> bool {
        self.allow_self_sign_cert
    }
}
