//! Session lifecycle: storage port, pure reconciliation, and the
//! controller state machine

pub mod controller;
pub mod driver;
pub mod reconcile;
pub mod store;

pub use controller::{Command, SessionController, SessionState};
pub use store::{CredentialStore, FileStore, MemoryStore};
