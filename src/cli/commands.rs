//! CLI command definitions using clap
//!
//! Defines the command structure for the `tsc` CLI tool.

use clap::{Parser, Subcommand};

/// tunescope - your listening analysis in the terminal
///
/// Run without arguments to launch the TUI dashboard, or use subcommands
/// for CLI mode.
#[derive(Parser, Debug)]
#[command(name = "tsc", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect or disconnect your music account
    Auth(AuthArgs),

    /// Print the listening analysis to stdout
    Stats(StatsArgs),
}

/// Authentication commands
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Authorize against the music service and store the session
    Login,
    /// Logout and remove the stored session
    Logout,
    /// Show current authentication status
    Status,
}

/// Stats command arguments
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Days of listening history to analyze
    #[arg(long)]
    pub days_back: Option<u32>,

    /// Fetch a fresh report even if one is cached
    #[arg(long)]
    pub refresh: bool,
}
