//! HTTP client for the analysis backend
//!
//! Pure request/response collaborator: it never touches session storage.
//! The controller decides when a fetch happens and what to do with the
//! result.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::api::report::Report;
use crate::error::{Result, TunescopeError};

/// Client for `GET /user/analysis`
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
}

impl AnalysisClient {
    /// Create an analysis client for the given backend base URL
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/user/analysis", backend_url.trim_end_matches('/')),
        })
    }

    /// Retrieve the analysis report for the given access token
    ///
    /// Any non-success status or transport error is a `FetchFailed` with a
    /// human-readable reason; a previously cached report is the caller's to
    /// keep.
    pub async fn fetch(&self, access_token: &SecretString, days_back: u32) -> Result<Report> {
        let days_back = days_back.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("access_token", access_token.expose_secret()),
                ("days_back", days_back.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TunescopeError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TunescopeError::FetchFailed(format!(
                "analysis endpoint returned {}",
                status
            )));
        }

        response
            .json::<Report>()
            .await
            .map_err(|e| TunescopeError::FetchFailed(format!("invalid response: {}", e)))
    }
}
