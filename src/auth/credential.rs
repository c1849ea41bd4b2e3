//! Credential model with expiration metadata
//!
//! A credential is born either from the login redirect or from a
//! refresh-token exchange. The issuer's `expires_in` lifetime is converted
//! to an absolute instant exactly once, at receipt.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TunescopeError};

/// Default access-token lifetime when the issuer omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// An access/refresh token pair with an absolute expiry instant
///
/// An empty access token is never represented; absence of a credential is
/// `Option::None` everywhere.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Bearer token for the analysis backend
    pub access_token: SecretString,
    /// Token for the renewal exchange, if the issuer granted one
    pub refresh_token: Option<SecretString>,
    /// When the access token expires (absolute timestamp)
    pub expires_at: DateTime<Utc>,
}

/// Serializable format for on-disk persistence
///
/// Uses plain strings since SecretString doesn't implement Serialize.
/// Converted to/from Credential for secure handling.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCredential {
    /// The access token
    pub access_token: String,
    /// The refresh token, if any
    pub refresh_token: Option<String>,
    /// ISO 8601 timestamp for access token expiration
    pub expires_at: String,
    /// Version for future migrations
    pub version: u8,
}

impl Credential {
    /// Build a credential from freshly issued tokens
    ///
    /// `expires_in` is the declared lifetime in seconds; `now` is the
    /// receipt instant. This is the only place a duration becomes an
    /// absolute expiry.
    pub fn issued_at(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: SecretString::from(access_token),
            refresh_token: refresh_token.map(SecretString::from),
            expires_at: now + Duration::seconds(expires_in as i64),
        }
    }

    /// Whether the access token is still usable at `now`
    ///
    /// Plain expiry comparison; no proactive-refresh window. Startup
    /// reconciliation must treat a token valid for even a few more seconds
    /// as valid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Convert to storable format for persistence
    pub fn to_stored(&self) -> StoredCredential {
        StoredCredential {
            access_token: self.access_token.expose_secret().to_string(),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            expires_at: self.expires_at.to_rfc3339(),
            version: 1,
        }
    }

    /// Create from stored format after retrieval
    ///
    /// An empty stored access token yields `None`: it is absence, not a
    /// credential.
    pub fn from_stored(stored: StoredCredential) -> Result<Option<Self>> {
        if stored.access_token.is_empty() {
            return Ok(None);
        }

        let expires_at = DateTime::parse_from_rfc3339(&stored.expires_at)
            .map_err(|e| {
                TunescopeError::Storage(format!("Invalid token expiration date: {}", e))
            })?
            .with_timezone(&Utc);

        Ok(Some(Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            expires_at,
        }))
    }

    /// Get a masked version of the access token for display
    /// (shows first 4 and last 4 chars)
    pub fn masked_access_token(&self) -> String {
        let exposed = self.access_token.expose_secret();
        if exposed.len() <= 8 {
            "*".repeat(exposed.len())
        } else {
            format!("{}...{}", &exposed[..4], &exposed[exposed.len() - 4..])
        }
    }
}
