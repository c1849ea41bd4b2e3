//! Custom error types for tunescope
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

/// Main error type for the tunescope application
#[derive(Error, Debug)]
pub enum TunescopeError {
    /// No usable credential exists
    #[error("You are not logged in.\n\n  → Run 'tsc auth login' to connect your account.")]
    NotAuthenticated,

    /// The authorization flow did not produce a credential
    #[error("Authorization failed: {0}\n\n  → Try running 'tsc auth login' again.")]
    AuthorizationFailed(String),

    /// The refresh-token exchange failed; the session is gone
    #[error("Your session has expired and could not be renewed: {0}\n\n  → Run 'tsc auth login' to connect again.")]
    RefreshFailed(String),

    /// Retrieving the analysis report failed; the session survives
    #[error("Could not fetch your listening analysis: {0}\n\n  → Check that the backend is reachable, then retry.")]
    FetchFailed(String),

    /// Local session storage error
    #[error("Cannot access session storage: {0}\n\n  → Check permissions on your data directory.")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Network request error
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Terminal/TUI error
    #[error("Terminal error: {0}\n\n  → Try resizing your terminal or restarting it.")]
    Terminal(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),

    /// Operation cancelled by user
    #[error("Operation cancelled.")]
    Cancelled,
}

impl From<toml::de::Error> for TunescopeError {
    fn from(err: toml::de::Error) -> Self {
        TunescopeError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for TunescopeError {
    fn from(err: toml::ser::Error) -> Self {
        TunescopeError::Toml(err.to_string())
    }
}

/// Result type alias using TunescopeError
pub type Result<T> = std::result::Result<T, TunescopeError>;
