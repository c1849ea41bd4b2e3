//! Terminal User Interface module
//!
//! Ratatui-based dashboard over the session controller.

pub mod app;
pub mod event;
pub mod ui;

pub use app::App;
