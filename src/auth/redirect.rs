//! Redirect credential parsing
//!
//! The authorization server finishes its flow by redirecting the user agent
//! back to us with `access_token`, and optionally `refresh_token` and
//! `expires_in`, in the query string. This module extracts that one-shot
//! credential and strips the sensitive parameters from any URL that is
//! shown or logged afterwards, so a stale redirect is never re-ingested.

use url::form_urlencoded;
use url::Url;

use crate::auth::credential::DEFAULT_EXPIRES_IN_SECS;

/// Query parameters carrying the one-shot credential
const CREDENTIAL_PARAMS: [&str; 3] = ["access_token", "refresh_token", "expires_in"];

/// A freshly issued credential as it appears on the redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectCredential {
    /// The issued access token
    pub access_token: String,
    /// The issued refresh token, if any
    pub refresh_token: Option<String>,
    /// Declared lifetime in seconds
    pub expires_in: u64,
}

/// Parse a redirect query string into a credential
///
/// Returns `None` unless a non-empty `access_token` is present. A missing
/// or non-numeric `expires_in` falls back to the 3600 s default. Idempotent
/// per query string.
pub fn parse(query: &str) -> Option<RedirectCredential> {
    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_in = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "access_token" if !value.is_empty() => access_token = Some(value.into_owned()),
            "refresh_token" if !value.is_empty() => refresh_token = Some(value.into_owned()),
            "expires_in" => expires_in = value.parse::<u64>().ok(),
            _ => {}
        }
    }

    Some(RedirectCredential {
        access_token: access_token?,
        refresh_token,
        expires_in: expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
    })
}

/// Remove the one-shot credential parameters from a URL, in place
///
/// Unrelated query parameters survive. The stripped URL is what gets
/// displayed or logged; tokens never leave the process through it.
pub fn strip_credential_params(url: &mut Url) {
    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !CREDENTIAL_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if remaining.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(remaining).finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_redirect() {
        let parsed = parse("access_token=BQD123&refresh_token=AQC456&expires_in=7200").unwrap();
        assert_eq!(parsed.access_token, "BQD123");
        assert_eq!(parsed.refresh_token.as_deref(), Some("AQC456"));
        assert_eq!(parsed.expires_in, 7200);
    }

    #[test]
    fn test_parse_defaults_expires_in() {
        let parsed = parse("access_token=BQD123").unwrap();
        assert_eq!(parsed.refresh_token, None);
        assert_eq!(parsed.expires_in, 3600);
    }

    #[test]
    fn test_parse_non_numeric_expires_in_falls_back() {
        let parsed = parse("access_token=BQD123&expires_in=soon").unwrap();
        assert_eq!(parsed.expires_in, 3600);
    }

    #[test]
    fn test_parse_without_access_token_is_none() {
        assert_eq!(parse("refresh_token=AQC456&expires_in=3600"), None);
        assert_eq!(parse("access_token=&refresh_token=AQC456"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let query = "access_token=BQD123&expires_in=60";
        assert_eq!(parse(query), parse(query));
    }

    #[test]
    fn test_strip_removes_only_credential_params() {
        let mut url =
            Url::parse("http://localhost:8888/?access_token=BQD&refresh_token=AQC&expires_in=60&theme=dark")
                .unwrap();
        strip_credential_params(&mut url);
        assert_eq!(url.as_str(), "http://localhost:8888/?theme=dark");
    }

    #[test]
    fn test_strip_clears_query_when_nothing_remains() {
        let mut url = Url::parse("http://localhost:8888/?access_token=BQD").unwrap();
        strip_credential_params(&mut url);
        assert_eq!(url.query(), None);
    }
}
