//! Authorization: credential model, redirect parsing, login capture,
//! and the refresh-token exchange

pub mod callback;
pub mod credential;
pub mod redirect;
pub mod refresh;

pub use credential::{Credential, StoredCredential};
pub use redirect::RedirectCredential;
pub use refresh::RefreshClient;
