//! Session lifecycle state machine
//!
//! Owns the rule that exactly one authoritative credential wins, and is the
//! single writer of the credential store. The controller itself never does
//! I/O beyond the store: network work is handed to the driver as
//! [`Command`]s, and results come back through the `complete_*` methods.
//!
//! Every command carries the session generation it was issued under.
//! Logout bumps the generation, so a refresh or fetch that completes after
//! logout fails the generation check and is dropped instead of resurrecting
//! a cleared session.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::api::report::Report;
use crate::auth::credential::Credential;
use crate::auth::redirect::RedirectCredential;
use crate::error::Result;
use crate::session::reconcile::{reconcile, Reconciliation};
use crate::session::store::CredentialStore;

/// Current authentication state, derived from the credential and the
/// outcome of the last lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No usable credential; show the login affordance
    Unauthenticated,
    /// A valid credential is held
    Authenticated,
    /// An expired credential is being renewed
    Refreshing,
    /// The last fetch failed; the credential survives for a retry
    Error(String),
}

/// Network work the driver must run on the controller's behalf
#[derive(Debug)]
pub enum Command {
    /// Exchange the refresh token at the token endpoint
    Refresh {
        generation: u64,
        refresh_token: SecretString,
    },
    /// Retrieve the analysis report
    Fetch {
        generation: u64,
        access_token: SecretString,
        days_back: u32,
    },
}

/// The session lifecycle manager
pub struct SessionController<S: CredentialStore> {
    store: S,
    days_back: u32,
    state: SessionState,
    credential: Option<Credential>,
    report: Option<Report>,
    generation: u64,
    fetch_in_flight: bool,
}

impl<S: CredentialStore> SessionController<S> {
    /// Create a controller over the given store
    pub fn new(store: S, days_back: u32) -> Self {
        Self {
            store,
            days_back,
            state: SessionState::Unauthenticated,
            credential: None,
            report: None,
            generation: 0,
            fetch_in_flight: false,
        }
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The report currently held, cached or freshly fetched
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// The credential currently held
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Whether a fetch is outstanding
    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    /// Startup reconciliation; runs once at application start
    ///
    /// Loads the persisted session, reconciles it against the redirect
    /// credential (if the startup came from a login flow), and returns the
    /// follow-up work: a refresh when the stored credential expired
    /// renewably, or a fetch when authenticated with no cached report.
    pub fn startup(
        &mut self,
        redirect: Option<RedirectCredential>,
        now: DateTime<Utc>,
    ) -> Result<Option<Command>> {
        let stored = self.store.load()?;
        let previous_token = stored
            .credential
            .as_ref()
            .map(|c| c.access_token.expose_secret().to_string());

        match reconcile(stored.credential, redirect, now) {
            Reconciliation::RedirectWins(credential) => {
                self.store.save_credential(&credential)?;
                // A cached report is only kept when the redirect delivered
                // the very same token again; a new login starts clean.
                let same_token = previous_token.as_deref()
                    == Some(credential.access_token.expose_secret());
                self.report = if same_token { stored.report } else { None };
                self.credential = Some(credential);
                self.state = SessionState::Authenticated;
                Ok(self.maybe_fetch())
            }
            Reconciliation::ValidStored(credential) => {
                self.credential = Some(credential);
                // Optimistic initial display value.
                self.report = stored.report;
                self.state = SessionState::Authenticated;
                Ok(self.maybe_fetch())
            }
            Reconciliation::NeedsRefresh { refresh_token } => {
                self.state = SessionState::Refreshing;
                Ok(Some(Command::Refresh {
                    generation: self.generation,
                    refresh_token,
                }))
            }
            Reconciliation::NoSession { must_clear } => {
                if must_clear {
                    self.store.clear()?;
                }
                self.state = SessionState::Unauthenticated;
                Ok(None)
            }
        }
    }

    /// Apply the outcome of a refresh exchange
    ///
    /// A failed refresh is terminal for the session: storage is cleared and
    /// the user must log in again. A stale generation means logout happened
    /// while the exchange was in flight; the result is dropped.
    pub fn complete_refresh(
        &mut self,
        generation: u64,
        outcome: Result<Credential>,
    ) -> Result<Option<Command>> {
        if generation != self.generation {
            tracing::debug!("dropping refresh result from a closed session");
            return Ok(None);
        }

        match outcome {
            Ok(credential) => {
                self.store.save_credential(&credential)?;
                self.credential = Some(credential);
                self.state = SessionState::Authenticated;
                Ok(self.maybe_fetch())
            }
            Err(e) => {
                tracing::warn!("token refresh failed: {}", e);
                self.store.clear()?;
                self.credential = None;
                self.report = None;
                self.state = SessionState::Unauthenticated;
                Ok(None)
            }
        }
    }

    /// Apply the outcome of an analysis fetch
    ///
    /// Failure keeps the credential (it may be transient) and any
    /// previously cached report; the state becomes `Error` so the
    /// presentation layer can offer a retry.
    pub fn complete_fetch(&mut self, generation: u64, outcome: Result<Report>) -> Result<()> {
        if generation != self.generation {
            tracing::debug!("dropping fetch result from a closed session");
            return Ok(());
        }

        self.fetch_in_flight = false;

        match outcome {
            Ok(report) => {
                self.store.save_report(&report)?;
                self.report = Some(report);
                self.state = SessionState::Authenticated;
            }
            Err(e) => {
                self.state = SessionState::Error(e.to_string());
            }
        }

        Ok(())
    }

    /// Retry after a failed fetch, reusing the existing credential
    pub fn retry(&mut self) -> Option<Command> {
        if !matches!(self.state, SessionState::Error(_)) {
            return None;
        }
        self.state = SessionState::Authenticated;
        self.force_fetch()
    }

    /// Re-fetch the report on explicit user request, bypassing the cache
    ///
    /// The old report stays on display until the new one arrives.
    pub fn refresh_report(&mut self) -> Option<Command> {
        if self.state != SessionState::Authenticated {
            return None;
        }
        self.force_fetch()
    }

    /// Destroy the session unconditionally
    ///
    /// Bumps the generation so in-flight refresh or fetch results are
    /// ignored on arrival. Idempotent.
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.credential = None;
        self.report = None;
        self.fetch_in_flight = false;
        self.generation += 1;
        self.state = SessionState::Unauthenticated;
        Ok(())
    }

    /// Issue a fetch when authenticated with nothing to show
    ///
    /// Fires at most once per transition into `Authenticated`: a cached
    /// report or an outstanding fetch suppresses it.
    fn maybe_fetch(&mut self) -> Option<Command> {
        if self.report.is_some() {
            return None;
        }
        self.force_fetch()
    }

    /// Issue a fetch unless one is already outstanding
    fn force_fetch(&mut self) -> Option<Command> {
        if self.fetch_in_flight {
            return None;
        }
        let credential = self.credential.as_ref()?;
        self.fetch_in_flight = true;
        Some(Command::Fetch {
            generation: self.generation,
            access_token: credential.access_token.clone(),
            days_back: self.days_back,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use mockall::predicate::always;
    use serde_json::json;

    use super::*;
    use crate::error::TunescopeError;
    use crate::session::store::{MemoryStore, MockCredentialStore, StoredSession};

    const DAYS_BACK: u32 = 30;

    fn credential(access: &str, expires_in_secs: i64, refresh: Option<&str>) -> Credential {
        let now = Utc::now();
        Credential {
            access_token: SecretString::from(access),
            refresh_token: refresh.map(SecretString::from),
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    fn store_with(cred: Option<Credential>, report: Option<Report>) -> MemoryStore {
        let store = MemoryStore::new();
        if let Some(c) = &cred {
            store.save_credential(c).unwrap();
        }
        if let Some(r) = &report {
            store.save_report(r).unwrap();
        }
        store
    }

    fn expect_fetch(command: Option<Command>) -> (u64, SecretString, u32) {
        match command {
            Some(Command::Fetch {
                generation,
                access_token,
                days_back,
            }) => (generation, access_token, days_back),
            other => panic!("expected a fetch command, got {:?}", other),
        }
    }

    fn expect_refresh(command: Option<Command>) -> (u64, SecretString) {
        match command {
            Some(Command::Refresh {
                generation,
                refresh_token,
            }) => (generation, refresh_token),
            other => panic!("expected a refresh command, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_stored_credential_authenticates_without_refresh() {
        let store = store_with(Some(credential("A", 600, Some("R"))), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let command = controller.startup(None, Utc::now()).unwrap();
        assert_eq!(*controller.state(), SessionState::Authenticated);

        let (_, access_token, days_back) = expect_fetch(command);
        assert_eq!(access_token.expose_secret(), "A");
        assert_eq!(days_back, 30);
    }

    #[test]
    fn test_cached_report_suppresses_startup_fetch() {
        let report = json!({"insights": ["cached"]});
        let store = store_with(Some(credential("A", 600, None)), Some(report.clone()));
        let mut controller = SessionController::new(store, DAYS_BACK);

        let command = controller.startup(None, Utc::now()).unwrap();
        assert!(command.is_none());
        assert_eq!(*controller.state(), SessionState::Authenticated);
        assert_eq!(controller.report(), Some(&report));
    }

    #[test]
    fn test_expired_credential_refreshes_before_any_fetch() {
        let store = store_with(Some(credential("A", -10, Some("R"))), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let command = controller.startup(None, Utc::now()).unwrap();
        assert_eq!(*controller.state(), SessionState::Refreshing);

        let (generation, refresh_token) = expect_refresh(command);
        assert_eq!(refresh_token.expose_secret(), "R");

        // Renewal keeps the unrotated refresh token and only then fetches.
        let renewed = credential("B", 3600, Some("R"));
        let command = controller.complete_refresh(generation, Ok(renewed)).unwrap();
        assert_eq!(*controller.state(), SessionState::Authenticated);

        let (_, access_token, _) = expect_fetch(command);
        assert_eq!(access_token.expose_secret(), "B");
    }

    #[test]
    fn test_refresh_success_persists_renewed_credential() {
        let store = store_with(Some(credential("A", -10, Some("R"))), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let (generation, _) = expect_refresh(controller.startup(None, Utc::now()).unwrap());
        controller
            .complete_refresh(generation, Ok(credential("B", 3600, Some("R"))))
            .unwrap();

        let stored = controller.store.credential().unwrap();
        assert_eq!(stored.access_token.expose_secret(), "B");
        assert_eq!(stored.refresh_token.unwrap().expose_secret(), "R");
        assert!(stored.expires_at > Utc::now());
    }

    #[test]
    fn test_refresh_failure_is_terminal() {
        let store = store_with(Some(credential("A", -10, Some("R"))), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let (generation, _) = expect_refresh(controller.startup(None, Utc::now()).unwrap());
        let command = controller
            .complete_refresh(
                generation,
                Err(TunescopeError::RefreshFailed("token endpoint returned 401".into())),
            )
            .unwrap();

        assert!(command.is_none());
        assert_eq!(*controller.state(), SessionState::Unauthenticated);
        assert!(controller.store.is_empty());
        assert!(controller.credential().is_none());
    }

    #[test]
    fn test_expired_without_refresh_token_clears_storage() {
        let store = store_with(Some(credential("A", -10, None)), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let command = controller.startup(None, Utc::now()).unwrap();
        assert!(command.is_none());
        assert_eq!(*controller.state(), SessionState::Unauthenticated);
        assert!(controller.store.is_empty());
    }

    #[test]
    fn test_redirect_overrides_differing_stored_credential() {
        let report = json!({"insights": ["stale"]});
        let store = store_with(Some(credential("OLD", 600, Some("R"))), Some(report));
        let mut controller = SessionController::new(store, DAYS_BACK);

        let redirect = RedirectCredential {
            access_token: "NEW".into(),
            refresh_token: None,
            expires_in: 3600,
        };
        let command = controller.startup(Some(redirect), Utc::now()).unwrap();

        assert_eq!(*controller.state(), SessionState::Authenticated);
        let stored = controller.store.credential().unwrap();
        assert_eq!(stored.access_token.expose_secret(), "NEW");
        // The stale report is dropped and a fresh fetch goes out.
        let (_, access_token, _) = expect_fetch(command);
        assert_eq!(access_token.expose_secret(), "NEW");
    }

    #[test]
    fn test_redirect_with_same_token_keeps_cached_report() {
        let report = json!({"insights": ["still good"]});
        let store = store_with(Some(credential("A", 600, None)), Some(report.clone()));
        let mut controller = SessionController::new(store, DAYS_BACK);

        let redirect = RedirectCredential {
            access_token: "A".into(),
            refresh_token: None,
            expires_in: 3600,
        };
        let command = controller.startup(Some(redirect), Utc::now()).unwrap();

        assert!(command.is_none());
        assert_eq!(controller.report(), Some(&report));
    }

    #[test]
    fn test_fetch_success_caches_report() {
        let store = store_with(Some(credential("A", 600, None)), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let (generation, _, _) = expect_fetch(controller.startup(None, Utc::now()).unwrap());
        let report = json!({"uniqueness_score": {"rating": "Very Unique"}});
        controller.complete_fetch(generation, Ok(report.clone())).unwrap();

        assert_eq!(*controller.state(), SessionState::Authenticated);
        assert_eq!(controller.report(), Some(&report));
        assert_eq!(controller.store.report(), Some(report));
        assert!(!controller.fetch_in_flight());
    }

    #[test]
    fn test_fetch_failure_keeps_credential_for_retry() {
        let store = store_with(Some(credential("A", 600, None)), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let (generation, _, _) = expect_fetch(controller.startup(None, Utc::now()).unwrap());
        controller
            .complete_fetch(
                generation,
                Err(TunescopeError::FetchFailed("analysis endpoint returned 500".into())),
            )
            .unwrap();

        assert!(matches!(controller.state(), SessionState::Error(_)));
        assert!(controller.credential().is_some());
        assert!(controller.store.credential().is_some());

        // Retry goes back out with the same credential.
        let (_, access_token, _) = expect_fetch(controller.retry());
        assert_eq!(access_token.expose_secret(), "A");
        assert_eq!(*controller.state(), SessionState::Authenticated);
    }

    #[test]
    fn test_no_duplicate_fetch_while_one_is_outstanding() {
        let store = store_with(Some(credential("A", 600, None)), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let command = controller.startup(None, Utc::now()).unwrap();
        assert!(command.is_some());
        assert!(controller.fetch_in_flight());

        // Re-entrant observation while the fetch is outstanding.
        assert!(controller.refresh_report().is_none());
        assert!(controller.retry().is_none());
    }

    #[test]
    fn test_refresh_report_bypasses_cache() {
        let report = json!({"old": true});
        let store = store_with(Some(credential("A", 600, None)), Some(report.clone()));
        let mut controller = SessionController::new(store, DAYS_BACK);

        assert!(controller.startup(None, Utc::now()).unwrap().is_none());
        let (generation, _, _) = expect_fetch(controller.refresh_report());

        // Old data stays on display until the new report lands.
        assert_eq!(controller.report(), Some(&report));
        let fresh = json!({"old": false});
        controller.complete_fetch(generation, Ok(fresh.clone())).unwrap();
        assert_eq!(controller.report(), Some(&fresh));
    }

    #[test]
    fn test_logout_is_idempotent() {
        let store = store_with(None, None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        controller.startup(None, Utc::now()).unwrap();
        assert_eq!(*controller.state(), SessionState::Unauthenticated);

        controller.logout().unwrap();
        controller.logout().unwrap();
        assert_eq!(*controller.state(), SessionState::Unauthenticated);
        assert!(controller.store.is_empty());
    }

    #[test]
    fn test_late_refresh_after_logout_is_dropped() {
        let store = store_with(Some(credential("A", -10, Some("R"))), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let (generation, _) = expect_refresh(controller.startup(None, Utc::now()).unwrap());
        controller.logout().unwrap();

        let command = controller
            .complete_refresh(generation, Ok(credential("B", 3600, Some("R"))))
            .unwrap();

        assert!(command.is_none());
        assert_eq!(*controller.state(), SessionState::Unauthenticated);
        assert!(controller.store.is_empty());
    }

    #[test]
    fn test_late_fetch_after_logout_is_dropped() {
        let store = store_with(Some(credential("A", 600, None)), None);
        let mut controller = SessionController::new(store, DAYS_BACK);

        let (generation, _, _) = expect_fetch(controller.startup(None, Utc::now()).unwrap());
        controller.logout().unwrap();

        controller
            .complete_fetch(generation, Ok(json!({"resurrected": true})))
            .unwrap();

        assert_eq!(*controller.state(), SessionState::Unauthenticated);
        assert!(controller.report().is_none());
        assert!(controller.store.is_empty());
    }

    #[test]
    fn test_valid_startup_never_touches_clear_or_save() {
        let mut mock = MockCredentialStore::new();
        mock.expect_load().times(1).returning(|| {
            Ok(StoredSession {
                credential: Some(Credential {
                    access_token: SecretString::from("A"),
                    refresh_token: None,
                    expires_at: Utc::now() + Duration::seconds(600),
                }),
                report: None,
            })
        });
        mock.expect_save_credential().times(0);
        mock.expect_clear().times(0);

        let mut controller = SessionController::new(mock, DAYS_BACK);
        controller.startup(None, Utc::now()).unwrap();
        assert_eq!(*controller.state(), SessionState::Authenticated);
    }

    #[test]
    fn test_refresh_failure_clears_store_exactly_once() {
        let mut mock = MockCredentialStore::new();
        mock.expect_load().times(1).returning(|| {
            Ok(StoredSession {
                credential: Some(Credential {
                    access_token: SecretString::from("A"),
                    refresh_token: Some(SecretString::from("R")),
                    expires_at: Utc::now() - Duration::seconds(10),
                }),
                report: None,
            })
        });
        mock.expect_save_credential().times(0);
        mock.expect_clear().times(1).returning(|| Ok(()));

        let mut controller = SessionController::new(mock, DAYS_BACK);
        let (generation, _) = expect_refresh(controller.startup(None, Utc::now()).unwrap());
        controller
            .complete_refresh(generation, Err(TunescopeError::RefreshFailed("401".into())))
            .unwrap();
    }

    #[test]
    fn test_redirect_win_persists_exactly_once() {
        let mut mock = MockCredentialStore::new();
        mock.expect_load()
            .times(1)
            .returning(|| Ok(StoredSession::default()));
        mock.expect_save_credential()
            .with(always())
            .times(1)
            .returning(|_| Ok(()));

        let mut controller = SessionController::new(mock, DAYS_BACK);
        let redirect = RedirectCredential {
            access_token: "NEW".into(),
            refresh_token: Some("NR".into()),
            expires_in: 3600,
        };
        let command = controller.startup(Some(redirect), Utc::now()).unwrap();
        expect_fetch(command);
    }
}
