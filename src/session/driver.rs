//! Sequential command driver
//!
//! Runs the controller's commands to completion, one at a time, feeding
//! each result back in. This is the CLI's execution model; the TUI runs
//! commands on spawned tasks instead and delivers results as messages.
//! Either way the ordering guarantee holds: a refresh triggered by startup
//! finishes before any fetch goes out.

use crate::api::AnalysisClient;
use crate::auth::RefreshClient;
use crate::error::Result;
use crate::session::controller::{Command, SessionController};
use crate::session::store::CredentialStore;

/// Execute `command` and every follow-up it produces
pub async fn run_to_completion<S: CredentialStore>(
    controller: &mut SessionController<S>,
    refresher: &RefreshClient,
    fetcher: &AnalysisClient,
    mut command: Option<Command>,
) -> Result<()> {
    while let Some(next) = command.take() {
        match next {
            Command::Refresh {
                generation,
                refresh_token,
            } => {
                let outcome = refresher.refresh(&refresh_token).await;
                command = controller.complete_refresh(generation, outcome)?;
            }
            Command::Fetch {
                generation,
                access_token,
                days_back,
            } => {
                let outcome = fetcher.fetch(&access_token, days_back).await;
                controller.complete_fetch(generation, outcome)?;
            }
        }
    }

    Ok(())
}
