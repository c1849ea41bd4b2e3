//! Loopback capture of the login redirect
//!
//! The backend finishes `/login` by redirecting the browser to
//! `http://localhost:<port>/` with the issued tokens in the query string.
//! This module binds that port, serves exactly one request, and hands the
//! raw query back to the caller. The captured URL is stripped of credential
//! parameters before it is ever logged.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use url::Url;

use crate::auth::redirect;
use crate::error::{Result, TunescopeError};

/// Page shown in the browser once the redirect has been captured
const LANDING_PAGE: &str = "<html><body style=\"font-family: sans-serif; text-align: center; padding-top: 4em;\">\
<h2>tunescope is connected</h2><p>You can close this tab and return to your terminal.</p>\
</body></html>";

/// Wait for the authorization redirect on the loopback port
///
/// Serves a single request and returns its query string. `deadline` bounds
/// the whole wait; a user abandoning the browser flow should not hang the
/// CLI forever.
pub async fn capture_redirect(port: u16, deadline: Duration) -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await.map_err(|e| {
        TunescopeError::AuthorizationFailed(format!(
            "cannot listen on localhost:{} for the login redirect: {}",
            port, e
        ))
    })?;

    timeout(deadline, accept_one(listener))
        .await
        .map_err(|_| {
            TunescopeError::AuthorizationFailed(
                "timed out waiting for the browser redirect".to_string(),
            )
        })?
}

async fn accept_one(listener: TcpListener) -> Result<String> {
    loop {
        let (mut stream, _) = listener.accept().await?;

        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);

        // Browsers probe for /favicon.ico; only the path carrying the
        // query string counts.
        let Some(target) = request_target(&request) else {
            respond(&mut stream, "400 Bad Request", "").await;
            continue;
        };

        if target.starts_with("/favicon") {
            respond(&mut stream, "404 Not Found", "").await;
            continue;
        }

        let query = target.split_once('?').map(|(_, q)| q.to_string());
        respond(&mut stream, "200 OK", LANDING_PAGE).await;

        if let Ok(mut url) = Url::parse(&format!("http://localhost{}", target)) {
            redirect::strip_credential_params(&mut url);
            tracing::debug!(url = %url, "captured login redirect");
        }

        return Ok(query.unwrap_or_default());
    }
}

/// Extract the request target from the first line of an HTTP request
fn request_target(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    if method != "GET" {
        return None;
    }
    parts.next()
}

async fn respond(stream: &mut tokio::net::TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
