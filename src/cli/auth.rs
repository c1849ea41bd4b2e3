//! Authentication CLI command handlers

use std::process::Command as ProcessCommand;
use std::time::Duration;

use chrono::Utc;

use crate::api::AnalysisClient;
use crate::auth::{callback, redirect, RefreshClient};
use crate::cli::commands::AuthCommand;
use crate::config::Config;
use crate::error::{Result, TunescopeError};
use crate::session::driver::run_to_completion;
use crate::session::{CredentialStore, FileStore, SessionController, SessionState};

/// How long the login flow waits for the browser redirect
const LOGIN_DEADLINE: Duration = Duration::from_secs(300);

/// Handle authentication commands
pub async fn handle_auth(command: AuthCommand) -> Result<()> {
    let config = Config::load()?;
    match command {
        AuthCommand::Login => handle_login(&config).await,
        AuthCommand::Logout => handle_logout(&config),
        AuthCommand::Status => handle_status(&config),
    }
}

/// Handle the login command
///
/// Drives the backend's authorization flow: the browser lands on
/// `{backend}/login`, the service redirects back to localhost with the
/// issued tokens, and the captured credential becomes the session. The
/// analysis is fetched immediately afterwards so the dashboard opens warm.
async fn handle_login(config: &Config) -> Result<()> {
    let store = FileStore::new(Config::data_dir()?);

    if let Some(credential) = store.load()?.credential {
        if credential.is_valid_at(Utc::now()) {
            println!("✓ Already connected.");
            println!();
            println!("  To re-authenticate, first run: tsc auth logout");
            return Ok(());
        }
    }

    let login_url = format!("{}/login", config.backend_url.trim_end_matches('/'));

    println!("Starting authorization...\n");
    println!("Open this URL in your browser:");
    println!("  {}", login_url);
    println!();

    if open_browser(&login_url) {
        println!("✓ Browser opened automatically.");
    }

    println!("Waiting for the service to redirect back...");

    let query = callback::capture_redirect(config.callback_port, LOGIN_DEADLINE).await?;
    let fresh = redirect::parse(&query).ok_or_else(|| {
        TunescopeError::AuthorizationFailed(
            "the redirect did not carry an access token".to_string(),
        )
    })?;

    let mut controller = SessionController::new(store, config.days_back);
    let command = controller.startup(Some(fresh), Utc::now())?;

    println!("\n✓ Connected! Fetching your listening analysis...");

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let refresher = RefreshClient::new(&config.backend_url, timeout)?;
    let fetcher = AnalysisClient::new(&config.backend_url, timeout)?;
    run_to_completion(&mut controller, &refresher, &fetcher, command).await?;

    match controller.state() {
        SessionState::Authenticated => {
            println!("✓ Analysis ready. Run 'tsc' to open the dashboard.");
            Ok(())
        }
        SessionState::Error(reason) => {
            // The session itself is fine; only the first fetch failed.
            println!("Connected, but the analysis could not be fetched yet: {}", reason);
            println!("  Run 'tsc stats' to try again.");
            Ok(())
        }
        _ => Err(TunescopeError::AuthorizationFailed(
            "login did not produce a usable session".to_string(),
        )),
    }
}

/// Try to open a URL in the default browser
fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        ProcessCommand::new("open").arg(url).spawn().is_ok()
    }

    #[cfg(target_os = "linux")]
    {
        ProcessCommand::new("xdg-open").arg(url).spawn().is_ok()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        false
    }
}

/// Handle the logout command
fn handle_logout(config: &Config) -> Result<()> {
    let store = FileStore::new(Config::data_dir()?);
    let mut controller = SessionController::new(store, config.days_back);

    // Logout is unconditional and idempotent.
    controller.logout()?;
    println!("Logged out. Stored session and cached analysis removed.");
    Ok(())
}

/// Handle the status command
fn handle_status(_config: &Config) -> Result<()> {
    let store = FileStore::new(Config::data_dir()?);
    let session = store.load()?;

    match session.credential {
        None => {
            println!("Not connected.");
            println!();
            println!("  Run 'tsc auth login' to connect your account.");
        }
        Some(credential) => {
            let now = Utc::now();
            println!("Connected.");
            println!("  Access token: {}", credential.masked_access_token());

            if credential.is_valid_at(now) {
                let remaining = credential.expires_at.signed_duration_since(now);
                println!("  Expires in: {} minutes", remaining.num_minutes());
            } else if credential.refresh_token.is_some() {
                println!("  Access token expired; it will be renewed on next use.");
            } else {
                println!("  Access token expired and cannot be renewed.");
                println!("  Run 'tsc auth login' to connect again.");
            }

            println!(
                "  Cached analysis: {}",
                if session.report.is_some() { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}
