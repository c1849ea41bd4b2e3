//! Refresh-token exchange against the authorization backend
//!
//! Trades a refresh token for a new access token. Any non-success status or
//! transport error is a hard `RefreshFailed`; there is no partial outcome.
//! Refresh tokens are not guaranteed to rotate, so a response without one
//! keeps the token that was sent.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::auth::credential::{Credential, DEFAULT_EXPIRES_IN_SECS};
use crate::error::{Result, TunescopeError};

/// Success response from the token endpoint
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    /// The new access token
    pub access_token: String,
    /// Seconds until the new access token expires
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// A rotated refresh token, if the issuer rotated it
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Map a token-endpoint response into a credential
///
/// `previous` is the refresh token the exchange was made with; it is kept
/// when the response carries no replacement.
pub fn credential_from_response(
    response: RefreshResponse,
    previous: &SecretString,
    now: DateTime<Utc>,
) -> Credential {
    let refresh_token = response
        .refresh_token
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| previous.expose_secret().to_string());

    Credential::issued_at(
        response.access_token,
        Some(refresh_token),
        response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        now,
    )
}

/// Client for the `/refresh-token` endpoint
pub struct RefreshClient {
    client: Client,
    endpoint: String,
}

impl RefreshClient {
    /// Create a refresh client for the given backend base URL
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/refresh-token", backend_url.trim_end_matches('/')),
        })
    }

    /// Exchange a refresh token for a new credential
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<Credential> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("refresh_token", refresh_token.expose_secret())])
            .send()
            .await
            .map_err(|e| TunescopeError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TunescopeError::RefreshFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| TunescopeError::RefreshFailed(format!("invalid response: {}", e)))?;

        if parsed.access_token.is_empty() {
            return Err(TunescopeError::RefreshFailed(
                "token endpoint returned an empty access token".to_string(),
            ));
        }

        Ok(credential_from_response(parsed, refresh_token, Utc::now()))
    }
}
