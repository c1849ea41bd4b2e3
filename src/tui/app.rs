//! Main TUI application state and logic
//!
//! The app owns the session controller and is its command driver: commands
//! go out on spawned tasks, results come back as [`AsyncMessage`]s through
//! an mpsc channel and are fed into the controller between draws.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::api::report::{AnalysisReport, Report};
use crate::api::AnalysisClient;
use crate::auth::{Credential, RefreshClient};
use crate::config::Config;
use crate::error::{Result, TunescopeError};
use crate::session::{Command, FileStore, SessionController, SessionState};
use crate::tui::event::{is_quit_key, AppEvent, EventHandler};
use crate::tui::ui;

/// Message type for async operation results
#[derive(Debug)]
pub enum AsyncMessage {
    /// Refresh exchange finished
    RefreshDone {
        generation: u64,
        outcome: Result<Credential>,
    },
    /// Analysis fetch finished
    FetchDone {
        generation: u64,
        outcome: Result<Report>,
    },
}

/// The TUI application
pub struct App {
    controller: SessionController<FileStore>,
    refresher: Arc<RefreshClient>,
    fetcher: Arc<AnalysisClient>,
    async_tx: mpsc::Sender<AsyncMessage>,
    async_rx: mpsc::Receiver<AsyncMessage>,
    running: bool,
    tick_counter: u64,
    status_message: Option<String>,
}

impl App {
    /// Create the app from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let (async_tx, async_rx) = mpsc::channel(16);

        Ok(Self {
            controller: SessionController::new(
                FileStore::new(Config::data_dir()?),
                config.days_back,
            ),
            refresher: Arc::new(RefreshClient::new(&config.backend_url, timeout)?),
            fetcher: Arc::new(AnalysisClient::new(&config.backend_url, timeout)?),
            async_tx,
            async_rx,
            running: true,
            tick_counter: 0,
            status_message: None,
        })
    }

    /// Current session state
    pub fn state(&self) -> &SessionState {
        self.controller.state()
    }

    /// Typed view of the current report, if any
    pub fn report_view(&self) -> Option<AnalysisReport> {
        self.controller.report().map(AnalysisReport::from_report)
    }

    /// Whether a fetch is outstanding
    pub fn loading(&self) -> bool {
        self.controller.fetch_in_flight()
            || *self.controller.state() == SessionState::Refreshing
    }

    /// Transient footer message
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Tick counter for spinner animation
    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    /// Setup terminal for TUI
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode().map_err(|e| TunescopeError::Terminal(e.to_string()))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| TunescopeError::Terminal(e.to_string()))?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).map_err(|e| TunescopeError::Terminal(e.to_string()))?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode().map_err(|e| TunescopeError::Terminal(e.to_string()))?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| TunescopeError::Terminal(e.to_string()))?;
        terminal
            .show_cursor()
            .map_err(|e| TunescopeError::Terminal(e.to_string()))?;
        Ok(())
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = Self::setup_terminal()?;
        let mut events = EventHandler::new(Duration::from_millis(250));

        // Startup reconciliation runs once, before the first draw.
        let command = self.controller.startup(None, Utc::now())?;
        self.dispatch(command);

        while self.running {
            terminal
                .draw(|frame| ui::render(frame, self))
                .map_err(|e| TunescopeError::Terminal(e.to_string()))?;

            // Apply async results (non-blocking)
            while let Ok(msg) = self.async_rx.try_recv() {
                self.handle_async_message(msg);
            }

            if let Some(event) = events.next().await {
                match event {
                    AppEvent::Key(key) => self.handle_key_event(key),
                    AppEvent::Resize(_, _) => {
                        // Terminal resize is handled automatically by ratatui
                    }
                    AppEvent::Tick => {
                        self.tick_counter = self.tick_counter.wrapping_add(1);
                    }
                }
            }
        }

        Self::restore_terminal(&mut terminal)?;
        Ok(())
    }

    /// Spawn the network task for a controller command
    fn dispatch(&mut self, command: Option<Command>) {
        let Some(command) = command else { return };
        let tx = self.async_tx.clone();

        match command {
            Command::Refresh {
                generation,
                refresh_token,
            } => {
                let refresher = Arc::clone(&self.refresher);
                tokio::spawn(async move {
                    let outcome = refresher.refresh(&refresh_token).await;
                    let _ = tx.send(AsyncMessage::RefreshDone { generation, outcome }).await;
                });
            }
            Command::Fetch {
                generation,
                access_token,
                days_back,
            } => {
                let fetcher = Arc::clone(&self.fetcher);
                tokio::spawn(async move {
                    let outcome = fetcher.fetch(&access_token, days_back).await;
                    let _ = tx.send(AsyncMessage::FetchDone { generation, outcome }).await;
                });
            }
        }
    }

    /// Feed an async result back into the controller
    fn handle_async_message(&mut self, msg: AsyncMessage) {
        let result = match msg {
            AsyncMessage::RefreshDone { generation, outcome } => self
                .controller
                .complete_refresh(generation, outcome)
                .map(|follow_up| self.dispatch(follow_up)),
            AsyncMessage::FetchDone { generation, outcome } => {
                self.controller.complete_fetch(generation, outcome)
            }
        };

        if let Err(e) = result {
            self.status_message = Some(e.to_string());
        }
    }

    /// Handle a key press
    fn handle_key_event(&mut self, key: KeyEvent) {
        if is_quit_key(&key) {
            self.running = false;
            return;
        }

        match key.code {
            // Retry after a failed fetch, or re-fetch fresh data.
            KeyCode::Char('r') => {
                let command = match self.controller.state() {
                    SessionState::Error(_) => self.controller.retry(),
                    SessionState::Authenticated => {
                        self.status_message = Some("Refreshing your analysis...".to_string());
                        self.controller.refresh_report()
                    }
                    _ => None,
                };
                self.dispatch(command);
            }
            // Logout, regardless of what is in flight.
            KeyCode::Char('x') => match self.controller.logout() {
                Ok(()) => {
                    self.status_message = Some("Logged out.".to_string());
                }
                Err(e) => {
                    self.status_message = Some(e.to_string());
                }
            },
            _ => {}
        }
    }
}
