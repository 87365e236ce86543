//! Application authentication.
//!
//! Obtains bearer tokens through the OAuth client-credentials grant.

use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::MarketplaceError;

/// Bearer token issued by the marketplace.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Token sent in the `Authorization` header.
    pub access_token: SecretString,
    /// Unix timestamp when the token expires.
    pub expires_at: i64,
}

/// Response from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

/// Error response from the token endpoint.
#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

const fn default_expires_in() -> i64 {
    21_600
}

/// Request a new token with the application's client credentials.
///
/// # Errors
///
/// Returns `MarketplaceError::AuthenticationFailed` if the credentials are
/// rejected, or `MarketplaceError::Http` on network failures.
#[instrument(skip(client, client_secret), fields(client_id = %client_id))]
pub async fn request_token(
    client: &reqwest::Client,
    base_url: &Url,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken, MarketplaceError> {
    let now = chrono::Utc::now().timestamp();
    let endpoint = base_url
        .join("oauth/token")
        .map_err(|e| MarketplaceError::AuthenticationFailed(e.to_string()))?;

    let response = client
        .post(endpoint)
        .header("Accept", "application/json")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?;

    let status = response.status();

    if status.is_success() {
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MarketplaceError::Parse(format!("Failed to parse token response: {e}")))?;

        Ok(AccessToken {
            access_token: SecretString::from(token.access_token),
            expires_at: now.saturating_add(token.expires_in),
        })
    } else {
        let error_response: TokenErrorResponse =
            response.json().await.unwrap_or(TokenErrorResponse {
                error: None,
                message: None,
            });

        let message = error_response
            .message
            .or(error_response.error)
            .unwrap_or_else(|| format!("HTTP {status}"));

        Err(MarketplaceError::AuthenticationFailed(message))
    }
}

impl AccessToken {
    /// Check if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        // Consider expired if less than 60 seconds remaining
        now >= self.expires_at - 60
    }
}
