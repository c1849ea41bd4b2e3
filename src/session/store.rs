//! Session persistence port and adapters
//!
//! The controller is the only writer. The port keeps it testable against an
//! in-memory adapter; the file adapter persists two JSON documents under
//! the platform data directory, so credential and report can fail
//! independently but are always cleared together.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::api::report::Report;
use crate::auth::credential::{Credential, StoredCredential};
use crate::error::{Result, TunescopeError};

const SESSION_FILE: &str = "session.json";
const REPORT_FILE: &str = "report.json";

/// Everything the store holds for the current session
#[derive(Debug, Default)]
pub struct StoredSession {
    /// The persisted credential, if one exists and parses
    pub credential: Option<Credential>,
    /// The last successfully fetched report, if cached and parseable
    pub report: Option<Report>,
}

/// Persistent key/value surface for the session
///
/// `load` must tolerate a corrupt cached report (discard the report, keep
/// the credential); a corrupt credential destroys both. `clear` leaves no
/// partial state behind and is idempotent.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore {
    /// Load whatever survives on disk
    fn load(&self) -> Result<StoredSession>;
    /// Persist a credential, replacing any previous one
    fn save_credential(&self, credential: &Credential) -> Result<()>;
    /// Persist a fetched report
    fn save_report(&self, report: &Report) -> Result<()>;
    /// Remove credential and report together
    fn clear(&self) -> Result<()>;
}

/// File-backed adapter under the application data directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created on first write)
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    fn write_json(&self, path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn remove_if_exists(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TunescopeError::Storage(e.to_string())),
        }
    }

    fn read_if_exists(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TunescopeError::Storage(e.to_string())),
        }
    }

    fn load_credential(&self) -> Result<Option<Credential>> {
        let Some(contents) = Self::read_if_exists(&self.session_path())? else {
            return Ok(None);
        };

        let parsed = serde_json::from_str::<StoredCredential>(&contents)
            .map_err(TunescopeError::from)
            .and_then(Credential::from_stored);

        match parsed {
            Ok(credential) => Ok(credential),
            Err(e) => {
                // Corrupt credential data destroys the whole session.
                tracing::warn!("stored session is unreadable, clearing it: {}", e);
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn load_report(&self) -> Result<Option<Report>> {
        let Some(contents) = Self::read_if_exists(&self.report_path())? else {
            return Ok(None);
        };

        match serde_json::from_str::<Report>(&contents) {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                // Only the report is discarded; the credential survives.
                tracing::warn!("cached report is unreadable, discarding it: {}", e);
                Self::remove_if_exists(&self.report_path())?;
                Ok(None)
            }
        }
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<StoredSession> {
        let credential = self.load_credential()?;
        let report = if credential.is_some() {
            self.load_report()?
        } else {
            // No orphaned report without a session.
            Self::remove_if_exists(&self.report_path())?;
            None
        };

        Ok(StoredSession { credential, report })
    }

    fn save_credential(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string(&credential.to_stored())?;
        self.write_json(&self.session_path(), &json)
    }

    fn save_report(&self, report: &Report) -> Result<()> {
        let json = serde_json::to_string(report)?;
        self.write_json(&self.report_path(), &json)
    }

    fn clear(&self) -> Result<()> {
        Self::remove_if_exists(&self.session_path())?;
        Self::remove_if_exists(&self.report_path())?;
        Ok(())
    }
}

/// In-memory adapter for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    credential: Option<Credential>,
    report: Option<Report>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether neither credential nor report is held
    pub fn is_empty(&self) -> bool {
        let state = self.inner.lock().unwrap();
        state.credential.is_none() && state.report.is_none()
    }

    /// Snapshot of the stored credential
    pub fn credential(&self) -> Option<Credential> {
        self.inner.lock().unwrap().credential.clone()
    }

    /// Snapshot of the stored report
    pub fn report(&self) -> Option<Report> {
        self.inner.lock().unwrap().report.clone()
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<StoredSession> {
        let state = self.inner.lock().unwrap();
        Ok(StoredSession {
            credential: state.credential.clone(),
            report: state.report.clone(),
        })
    }

    fn save_credential(&self, credential: &Credential) -> Result<()> {
        self.inner.lock().unwrap().credential = Some(credential.clone());
        Ok(())
    }

    fn save_report(&self, report: &Report) -> Result<()> {
        self.inner.lock().unwrap().report = Some(report.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.credential = None;
        state.report = None;
        Ok(())
    }
}
