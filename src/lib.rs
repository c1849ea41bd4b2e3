//! tunescope - your listening analysis in the terminal
//!
//! This library provides both CLI and TUI interfaces for a listening-analysis
//! backend: authorizing against the music service, maintaining the session
//! credential across restarts, and retrieving the analysis report.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod tui;

pub use error::{Result, TunescopeError};
