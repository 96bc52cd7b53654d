// Identity service client

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AuthManager, CredentialOverrides};
use crate::config::EnvironmentUrls;
use crate::error::{Result, SdkError};
use crate::http_client::ServiceHttpClient;
use crate::utils::url_join;

/// New account registration details
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub friendly_name: String,
    pub account_name: String,
}

/// Registration outcome
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResult {
    pub status: String,

    /// Account identifier; the service may send a number or a string
    pub account_id: serde_json::Value,
}

/// User fields to change; `None` fields are left as they are
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

/// Public key the identity service signs tokens with
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicSignatureResponse {
    pub signature: String,
}

/// Token issued for an impersonated user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImpersonationResult {
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImpersonateRequest<'a> {
    account_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

/// Client for the identity service
pub struct IdentityServiceClient {
    service_url: String,
    auth_manager: Option<Arc<AuthManager>>,
    http: ServiceHttpClient,
}

impl IdentityServiceClient {
    /// Create a client for `service_url`
    ///
    /// Calls that need a token fail with [`SdkError::Config`] when no
    /// `auth_manager` is supplied.
    pub fn new(
        service_url: impl Into<String>,
        auth_manager: Option<Arc<AuthManager>>,
        allow_self_sign_cert: bool,
    ) -> Result<Self> {
        Ok(Self {
            service_url: service_url.into(),
            auth_manager,
            http: ServiceHttpClient::new(allow_self_sign_cert)?,
        })
    }

    /// Get the service URL
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn url(&self, path: &[&str]) -> String {
        let mut parts = vec![self.service_url.as_str(), "v1"];
        parts.extend_from_slice(path);
        url_join(&parts)
    }

    fn auth_manager(&self) -> Result<&AuthManager> {
        self.auth_manager
            .as_deref()
            .ok_or_else(|| SdkError::Config("identity client has no authentication manager".to_string()))
    }

    /// Create a new account and its first user
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResult> {
        let builder = self.http.client().post(self.url(&["register"])).json(request);

        let response = self.http.send(builder).await?;
        let response = ServiceHttpClient::expect_status(
            response,
            &[StatusCode::OK],
            "An error occurred while registering a new account.",
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Get a token for the given credentials through the shared [`AuthManager`]
    pub async fn authenticate(&self, credentials: &CredentialOverrides) -> Result<String> {
        Ok(self
            .auth_manager()?
            .get_authentication_token(credentials)
            .await?)
    }

    /// Update details of the authenticated user
    pub async fn update_user(&self, request: &UpdateUserRequest) -> Result<()> {
        let builder = self.http.client().post(self.url(&["updateUser"])).json(request);
        let builder = self
            .http
            .authorize(builder, self.auth_manager()?, &CredentialOverrides::default())
            .await?;

        let response = self.http.send(builder).await?;
        ServiceHttpClient::expect_status(
            response,
            &[StatusCode::OK],
            "An error occurred while updating the user.",
        )
        .await?;

        Ok(())
    }

    /// Get the public signature tokens are signed with
    pub async fn public_signature(&self) -> Result<PublicSignatureResponse> {
        let builder = self.http.client().get(self.url(&["publicSignature"]));

        let response = self.http.send(builder).await?;
        let response = ServiceHttpClient::expect_status(
            response,
            &[StatusCode::OK],
            "An error occurred while acquiring the public signature.",
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Get a token for a user on another account; `user_id` of `None` means the root user
    pub async fn impersonate_user(
        &self,
        account_id: &str,
        user_id: Option<&str>,
    ) -> Result<ImpersonationResult> {
        let builder = self
            .http
            .client()
            .post(self.url(&["impersonate"]))
            .json(&ImpersonateRequest {
                account_id,
                user_id,
            });
        let builder = self
            .http
            .authorize(builder, self.auth_manager()?, &CredentialOverrides::default())
            .await?;

        let response = self.http.send(builder).await?;
        let response = ServiceHttpClient::expect_status(
            response,
            &[StatusCode::OK],
            "An error occurred while obtaining impersonation token.",
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Get the service URLs published by the identity service
    ///
    /// Discovery is best effort: any failure is logged and yields empty URLs.
    pub async fn configuration_urls(&self) -> EnvironmentUrls {
        match self.fetch_configuration_urls().await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(
                    identity_url = %self.service_url,
                    "Encountered error while fetching configuration URLs: {}",
                    e
                );
                EnvironmentUrls::default()
            }
        }
    }

    async fn fetch_configuration_urls(&self) -> Result<EnvironmentUrls> {
        let builder = self.http.client().get(self.url(&["configuration"]));

        let response = self.http.send(builder).await?;
        let response = ServiceHttpClient::expect_status(
            response,
            &[StatusCode::OK],
            "An error occurred while acquiring the configuration.",
        )
        .await?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSettings;
    use crate::cache::InMemoryCache;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn sign(account: &str, user: &str) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &json!({"accountId": account, "userId": user, "exp": Utc::now().timestamp() + 300}),
            &EncodingKey::from_secret(b"testKey"),
        )
        .unwrap()
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            user_id: "testUserId".to_string(),
            email: "test@email.foo".to_string(),
            password: "testPassword".to_string(),
            friendly_name: "testName".to_string(),
            account_name: "testAccount".to_string(),
        }
    }

    async fn seeded_manager(identity_url: &str, token: &str) -> Arc<AuthManager> {
        let manager = AuthManager::new(
            AuthSettings {
                identity_url: identity_url.to_string(),
                ..Default::default()
            },
            Arc::new(InMemoryCache::new()),
        )
        .unwrap();
        manager.set_authentication_token(token).await.unwrap();
        Arc::new(manager)
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/register")
            .match_body(Matcher::Json(json!({
                "userId": "testUserId",
                "email": "test@email.foo",
                "password": "testPassword",
                "friendlyName": "testName",
                "accountName": "testAccount"
            })))
            .with_status(200)
            .with_body(r#"{"status":"Success","accountId":123}"#)
            .expect(1)
            .create_async()
            .await;
        let client = IdentityServiceClient::new(server.url(), None, false).unwrap();

        let result = client.register(&register_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.status, "Success");
        assert_eq!(result.account_id, json!(123));
    }

    #[tokio::test]
    async fn test_register_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/register")
            .with_status(500)
            .create_async()
            .await;
        let client = IdentityServiceClient::new(server.url(), None, false).unwrap();

        let err = client.register(&register_request()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "An error occurred while registering a new account."
        );
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_authenticate_goes_through_manager() {
        let token = sign("1001", "admin");
        let manager = seeded_manager("http://127.0.0.1:9", &token).await;
        let client =
            IdentityServiceClient::new("http://127.0.0.1:9", Some(manager), false).unwrap();

        let result = client
            .authenticate(&CredentialOverrides::new().account_id("1001").user_id("admin"))
            .await
            .unwrap();

        assert_eq!(result, token);
    }

    #[tokio::test]
    async fn test_authenticate_without_manager() {
        let client = IdentityServiceClient::new("http://127.0.0.1:9", None, false).unwrap();

        let err = client
            .authenticate(&CredentialOverrides::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SdkError::Config(_)));
    }

    #[tokio::test]
    async fn test_update_user_sends_token() {
        let mut server = Server::new_async().await;
        let token = sign("1001", "admin");
        let mock = server
            .mock("POST", "/v1/updateUser")
            .match_header("token", token.as_str())
            .match_body(Matcher::Json(json!({"friendlyName": "New Name"})))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let manager = seeded_manager(&server.url(), &token).await;
        let client = IdentityServiceClient::new(server.url(), Some(manager), false).unwrap();

        client
            .update_user(&UpdateUserRequest {
                friendly_name: Some("New Name".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_user_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/updateUser")
            .with_status(400)
            .with_body("nope")
            .create_async()
            .await;
        let manager = seeded_manager(&server.url(), &sign("1001", "admin")).await;
        let client = IdentityServiceClient::new(server.url(), Some(manager), false).unwrap();

        let err = client
            .update_user(&UpdateUserRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "An error occurred while updating the user.");
        assert_eq!(err.body(), Some("nope"));
    }

    #[tokio::test]
    async fn test_public_signature() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/publicSignature")
            .with_status(200)
            .with_body(r#"{"signature":"public-key"}"#)
            .expect(1)
            .create_async()
            .await;
        let client = IdentityServiceClient::new(server.url(), None, false).unwrap();

        let result = client.public_signature().await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.signature, "public-key");
    }

    #[tokio::test]
    async fn test_impersonate_root_user() {
        let mut server = Server::new_async().await;
        let token = sign("1", "root");
        let mock = server
            .mock("POST", "/v1/impersonate")
            .match_header("token", token.as_str())
            .match_body(Matcher::Json(json!({"accountId": "1002"})))
            .with_status(200)
            .with_body(r#"{"token":"impersonated"}"#)
            .expect(1)
            .create_async()
            .await;
        let manager = seeded_manager(&server.url(), &token).await;
        let client = IdentityServiceClient::new(server.url(), Some(manager), false).unwrap();

        let result = client.impersonate_user("1002", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.token, "impersonated");
    }

    #[tokio::test]
    async fn test_impersonate_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/impersonate")
            .with_status(403)
            .create_async()
            .await;
        let manager = seeded_manager(&server.url(), &sign("1", "root")).await;
        let client = IdentityServiceClient::new(server.url(), Some(manager), false).unwrap();

        let err = client
            .impersonate_user("1002", Some("someone"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "An error occurred while obtaining impersonation token."
        );
    }

    #[tokio::test]
    async fn test_configuration_urls() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/configuration")
            .with_status(200)
            .with_body(r#"{"qsUrl":"http://qs","smUrl":"http://sm","unknownField":1}"#)
            .create_async()
            .await;
        let client = IdentityServiceClient::new(server.url(), None, false).unwrap();

        let urls = client.configuration_urls().await;

        assert_eq!(urls.qs_url.as_deref(), Some("http://qs"));
        assert_eq!(urls.sm_url.as_deref(), Some("http://sm"));
        assert_eq!(urls.identity_url, None);
    }

    #[tokio::test]
    async fn test_configuration_urls_failure_is_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/configuration")
            .with_status(500)
            .create_async()
            .await;
        let client = IdentityServiceClient::new(server.url(), None, false).unwrap();

        assert_eq!(client.configuration_urls().await, EnvironmentUrls::default());

        let unreachable = IdentityServiceClient::new("http://127.0.0.1:9", None, false).unwrap();
        assert_eq!(unreachable.configuration_urls().await, EnvironmentUrls::default());
    }
}
