use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::auth::{AuthManager, CredentialOverrides};
use crate::error::SdkError;

/// Header carrying the bearer token on service requests
pub const TOKEN_HEADER: &str = "Token";

/// HTTP client shared by the service clients
///
/// One request per call: no retries, no backoff. Non-matching statuses are
/// turned into [`SdkError::Service`] by [`ServiceHttpClient::expect_status`].
#[derive(Clone)]
pub struct ServiceHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,
}

impl ServiceHttpClient {
    /// Create a new HTTP client
    pub fn new(allow_self_sign_cert: bool) -> Result<Self, SdkError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(allow_self_sign_cert)
            .build()?;

        Ok(Self { client })
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Attach a bearer token from `auth_manager` to `builder`
    pub async fn authorize(
        &self,
        builder: RequestBuilder,
        auth_manager: &AuthManager,
        overrides: &CredentialOverrides,
    ) -> Result<RequestBuilder, SdkError> {
        let token = auth_manager.get_authentication_token(overrides).await?;
        Ok(builder.header(TOKEN_HEADER, token))
    }

    /// Send a request, logging the outcome
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, SdkError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        tracing::debug!(method = %method, url = %url, "Sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                tracing::debug!(status = %response.status(), url = %url, "Received HTTP response");
                Ok(response)
            }
            Err(e) => {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_request() {
                    "request_error"
                } else if e.is_body() {
                    "body_error"
                } else if e.is_decode() {
                    "decode_error"
                } else {
                    "unknown"
                };

                tracing::warn!(
                    error_kind = error_kind,
                    error = %e,
                    method = %method,
                    url = %url,
                    "HTTP request error"
                );
                Err(e.into())
            }
        }
    }

    /// Pass `response` through if its status is in `accepted`, otherwise
    /// build a [`SdkError::Service`] carrying `message`, the status and the body
    pub async fn expect_status(
        response: Response,
        accepted: &[StatusCode],
        message: &str,
    ) -> Result<Response, SdkError> {
        let status = response.status();
        if accepted.contains(&status) {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();

        tracing::error!(
            status = status.as_u16(),
            url = %url,
            response_body = %body,
            "{}",
            message
        );

        Err(SdkError::Service {
            message: message.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
