//! tunescope - listening analysis TUI
//!
//! Run without arguments to launch the dashboard, or use subcommands for
//! CLI mode.
//!
//! Available as the `tunescope` command.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tunescope::cli::commands::{Cli, Commands};
use tunescope::cli::{auth, stats};
use tunescope::config::Config;
use tunescope::error::Result;
use tunescope::tui::App;

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // No subcommand - launch TUI mode
        None => run_tui().await,

        Some(Commands::Auth(args)) => auth::handle_auth(args.command).await,
        Some(Commands::Stats(args)) => stats::handle_stats(args).await,
    }
}

/// Run the TUI application
async fn run_tui() -> Result<()> {
    let config = Config::load()?;
    let mut app = App::new(&config)?;
    app.run().await
}
