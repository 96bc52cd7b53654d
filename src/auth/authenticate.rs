// Identity service authenticate call

use reqwest::{header, Client, StatusCode};

use super::error::AuthError;
use super::types::{AuthenticateRequest, AuthenticateResponse};
use crate::utils::url_join;

/// Get the authenticate URL for an identity service
pub fn authenticate_url(identity_url: &str) -> String {
    url_join(&[identity_url, "v1", "authenticate"])
}

/// Exchange account/user/password for a fresh bearer token
///
/// One POST, no retries. Anything but 200 becomes
/// [`AuthError::Authentication`]; transport failures surface as-is.
pub async fn request_token(
    client: &Client,
    identity_url: &str,
    account_id: &str,
    user_id: &str,
    password: &str,
) -> Result<String, AuthError> {
    let url = authenticate_url(identity_url);
    tracing::debug!(url = %url, account = account_id, user = user_id, "Requesting identity token");

    let request = AuthenticateRequest {
        account_id,
        user_id,
        password,
    };

    let response = client
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %body,
            url = %url,
            "Identity service rejected authentication"
        );
        return Err(AuthError::Authentication {
            status: status.as_u16(),
            body,
        });
    }

    let data: AuthenticateResponse = response.json().await?;

    tracing::info!(account = account_id, user = user_id, "Authenticated against identity service");
    Ok(data.token)
}
