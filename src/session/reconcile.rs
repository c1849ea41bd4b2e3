//! Startup reconciliation
//!
//! Pure decision over the two credential candidates: the one-shot redirect
//! and the persisted record. Exactly one credential wins; the outcome tells
//! the controller what to do about storage and whether a refresh is needed.
//! No storage, no network, no clock reads.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::auth::credential::Credential;
use crate::auth::redirect::RedirectCredential;

/// Outcome of reconciling persisted vs redirect credentials at `now`
#[derive(Debug)]
pub enum Reconciliation {
    /// A fresh redirect credential is authoritative; persist it as-is
    RedirectWins(Credential),
    /// The persisted credential is still valid; use it
    ValidStored(Credential),
    /// The persisted credential expired but can be renewed
    NeedsRefresh {
        /// The refresh token to exchange
        refresh_token: SecretString,
    },
    /// No usable credential
    NoSession {
        /// Whether an unusable expired record must be purged from storage
        must_clear: bool,
    },
}

/// Decide the session's starting point
///
/// A redirect always wins, regardless of the persisted credential's
/// validity: it represents a new login or consent. No account-identity
/// check is performed between the two; a redirect from a different account
/// than the stored one replaces it wholesale.
pub fn reconcile(
    persisted: Option<Credential>,
    redirect: Option<RedirectCredential>,
    now: DateTime<Utc>,
) -> Reconciliation {
    if let Some(fresh) = redirect {
        let credential = Credential::issued_at(
            fresh.access_token,
            fresh.refresh_token,
            fresh.expires_in,
            now,
        );
        return Reconciliation::RedirectWins(credential);
    }

    match persisted {
        Some(credential) if credential.is_valid_at(now) => Reconciliation::ValidStored(credential),
        Some(credential) => match credential.refresh_token {
            Some(refresh_token) => Reconciliation::NeedsRefresh { refresh_token },
            // Expired with no way to renew: the record is dead weight.
            None => Reconciliation::NoSession { must_clear: true },
        },
        None => Reconciliation::NoSession { must_clear: false },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use secrecy::ExposeSecret;

    use super::*;

    fn stored(expires_in_secs: i64, refresh: Option<&str>, now: DateTime<Utc>) -> Credential {
        Credential {
            access_token: SecretString::from("stored-access"),
            refresh_token: refresh.map(SecretString::from),
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    #[test]
    fn test_valid_stored_credential_wins_without_redirect() {
        let now = Utc::now();
        match reconcile(Some(stored(600, Some("R"), now)), None, now) {
            Reconciliation::ValidStored(cred) => {
                assert_eq!(cred.access_token.expose_secret(), "stored-access")
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_expired_with_refresh_token_needs_refresh() {
        let now = Utc::now();
        match reconcile(Some(stored(-10, Some("R"), now)), None, now) {
            Reconciliation::NeedsRefresh { refresh_token } => {
                assert_eq!(refresh_token.expose_secret(), "R")
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_expired_without_refresh_token_must_clear() {
        let now = Utc::now();
        match reconcile(Some(stored(-10, None, now)), None, now) {
            Reconciliation::NoSession { must_clear } => assert!(must_clear),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_nothing_persisted_is_no_session() {
        let now = Utc::now();
        match reconcile(None, None, now) {
            Reconciliation::NoSession { must_clear } => assert!(!must_clear),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_redirect_overrides_valid_stored_credential() {
        let now = Utc::now();
        let redirect = RedirectCredential {
            access_token: "fresh".into(),
            refresh_token: Some("fresh-refresh".into()),
            expires_in: 7200,
        };

        match reconcile(Some(stored(600, Some("R"), now)), Some(redirect), now) {
            Reconciliation::RedirectWins(cred) => {
                assert_eq!(cred.access_token.expose_secret(), "fresh");
                assert_eq!(cred.expires_at, now + Duration::seconds(7200));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_redirect_wins_even_with_no_stored_credential() {
        let now = Utc::now();
        let redirect = RedirectCredential {
            access_token: "fresh".into(),
            refresh_token: None,
            expires_in: 3600,
        };

        assert!(matches!(
            reconcile(None, Some(redirect), now),
            Reconciliation::RedirectWins(_)
        ));
    }
}
