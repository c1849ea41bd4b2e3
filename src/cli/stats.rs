//! Stats CLI command handler
//!
//! Prints the listening analysis to stdout for scripting. Reconciles the
//! session first, exactly like the TUI: an expired credential is renewed
//! before any fetch goes out.

use std::time::Duration;

use chrono::Utc;

use crate::api::report::AnalysisReport;
use crate::api::AnalysisClient;
use crate::auth::RefreshClient;
use crate::cli::commands::StatsArgs;
use crate::config::Config;
use crate::error::{Result, TunescopeError};
use crate::session::driver::run_to_completion;
use crate::session::{FileStore, SessionController, SessionState};

/// Handle the stats command
pub async fn handle_stats(args: StatsArgs) -> Result<()> {
    let config = Config::load()?;
    let days_back = args.days_back.unwrap_or(config.days_back);

    let store = FileStore::new(Config::data_dir()?);
    let mut controller = SessionController::new(store, days_back);

    let mut command = controller.startup(None, Utc::now())?;
    if *controller.state() == SessionState::Unauthenticated {
        return Err(TunescopeError::NotAuthenticated);
    }
    if args.refresh && command.is_none() {
        command = controller.refresh_report();
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let refresher = RefreshClient::new(&config.backend_url, timeout)?;
    let fetcher = AnalysisClient::new(&config.backend_url, timeout)?;
    run_to_completion(&mut controller, &refresher, &fetcher, command).await?;

    match controller.state() {
        SessionState::Authenticated => {
            let report = controller
                .report()
                .ok_or_else(|| TunescopeError::FetchFailed("no report available".to_string()))?;
            print_report(&AnalysisReport::from_report(report));
            Ok(())
        }
        SessionState::Error(reason) => Err(TunescopeError::FetchFailed(reason.clone())),
        SessionState::Unauthenticated => Err(TunescopeError::NotAuthenticated),
        SessionState::Refreshing => Err(TunescopeError::RefreshFailed(
            "renewal did not complete".to_string(),
        )),
    }
}

fn print_report(report: &AnalysisReport) {
    let profile = &report.user_profile;
    let history = &report.listening_history;
    let genres = &report.genre_diversity;
    let uniqueness = &report.uniqueness_score;
    let obscurity = &report.obscurity_score;

    println!("Listening analysis for {}", profile.name);
    println!("================================");
    println!();
    println!(
        "Uniqueness: {:.0}% — {}",
        uniqueness.uniqueness_score * 100.0,
        uniqueness.rating
    );
    println!("Obscurity:  {:.0}%", obscurity.obscurity_score * 100.0);
    println!();
    println!("Tracks played:  {}", history.total_tracks_played);
    println!("Unique artists: {}", history.unique_artists);
    println!("Genres:         {}", genres.unique_genres);

    if !report.top_artists.short_term.is_empty() {
        println!();
        println!("Top artists (last weeks):");
        for (i, artist) in report.top_artists.short_term.iter().take(8).enumerate() {
            let genre = artist.genres.first().map(String::as_str).unwrap_or("-");
            println!("  #{:<2} {}  [{}]", i + 1, artist.name, genre);
        }
    }

    if !report.top_tracks.short_term.is_empty() {
        println!();
        println!("Top tracks (last weeks):");
        for (i, track) in report.top_tracks.short_term.iter().take(8).enumerate() {
            println!(
                "  #{:<2} {} — {}  ({})",
                i + 1,
                track.name,
                track.primary_artist(),
                track.duration_display()
            );
        }
    }

    if !report.insights.is_empty() {
        println!();
        println!("Insights:");
        for insight in &report.insights {
            println!("  • {}", insight);
        }
    }
}
