//! CLI interface modules

pub mod auth;
pub mod commands;
pub mod stats;
