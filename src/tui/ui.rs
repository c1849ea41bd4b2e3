//! Main UI renderer
//!
//! One screen per session state: login prompt, loading spinner, error with
//! retry hint, and the dashboard.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};

use crate::api::report::AnalysisReport;
use crate::session::SessionState;
use crate::tui::app::App;

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Render the whole frame for the current state
pub fn render(frame: &mut Frame, app: &App) {
    match app.state() {
        SessionState::Unauthenticated => render_login(frame),
        SessionState::Refreshing => render_loading(frame, app, "Renewing your session..."),
        SessionState::Error(reason) => render_error(frame, reason),
        SessionState::Authenticated => match app.report_view() {
            Some(report) => render_dashboard(frame, app, &report),
            None => render_loading(frame, app, "Analyzing your music taste..."),
        },
    }
}

fn render_login(frame: &mut Frame) {
    let area = centered(frame.area(), 60, 9);
    let text = Text::from(vec![
        Line::from(Span::styled(
            "tunescope",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Discover your unique music taste."),
        Line::from(""),
        Line::from("You are not connected yet."),
        Line::from(Span::styled(
            "Run 'tsc auth login' in another terminal, then restart.",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled("q: quit", Style::default().fg(Color::DarkGray))),
    ]);

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_loading(frame: &mut Frame, app: &App, message: &str) {
    let spinner = SPINNER_FRAMES[(app.tick_counter() % 4) as usize];
    let area = centered(frame.area(), 50, 5);

    let text = Text::from(vec![
        Line::from(format!("{} {}", spinner, message)),
        Line::from(""),
        Line::from(Span::styled(
            "This might take a moment",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, reason: &str) {
    let area = centered(frame.area(), 70, 8);
    let text = Text::from(vec![
        Line::from(Span::styled(
            "Something went wrong",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(reason.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "r: try again   x: logout   q: quit",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_dashboard(frame: &mut Frame, app: &App, report: &AnalysisReport) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(3), // uniqueness gauge
            Constraint::Length(3), // stat tiles
            Constraint::Min(8),    // top artists / tracks
            Constraint::Length(6), // insights
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app, report);
    render_uniqueness(frame, chunks[1], report);
    render_stat_tiles(frame, chunks[2], report);
    render_top_lists(frame, chunks[3], report);
    render_insights(frame, chunks[4], report);
    render_footer(frame, chunks[5], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, report: &AnalysisReport) {
    let name = if report.user_profile.name.is_empty() {
        "there"
    } else {
        &report.user_profile.name
    };
    let mut line = vec![Span::styled(
        format!("Hi {}!", name),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if app.loading() {
        line.push(Span::styled(
            "  (refreshing...)",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(Line::from(line))
        .block(Block::default().borders(Borders::ALL).title(" tunescope "));
    frame.render_widget(paragraph, area);
}

fn render_uniqueness(frame: &mut Frame, area: Rect, report: &AnalysisReport) {
    let score = report.uniqueness_score.uniqueness_score.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Your Music DNA "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(score)
        .label(format!(
            "{:.0}% unique — {}",
            score * 100.0,
            report.uniqueness_score.rating
        ));
    frame.render_widget(gauge, area);
}

fn render_stat_tiles(frame: &mut Frame, area: Rect, report: &AnalysisReport) {
    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    let history = &report.listening_history;
    let stats = [
        ("Tracks", history.total_tracks_played.to_string()),
        ("Artists", history.unique_artists.to_string()),
        ("Genres", report.genre_diversity.unique_genres.to_string()),
        (
            "Obscurity",
            format!("{:.0}%", report.obscurity_score.obscurity_score * 100.0),
        ),
    ];

    for (tile, (label, value)) in tiles.iter().zip(stats) {
        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled(label, Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, *tile);
    }
}

fn render_top_lists(frame: &mut Frame, area: Rect, report: &AnalysisReport) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let artists: Vec<ListItem> = report
        .top_artists
        .short_term
        .iter()
        .take(8)
        .enumerate()
        .map(|(i, artist)| {
            let genre = artist.genres.first().map(String::as_str).unwrap_or("-");
            ListItem::new(Line::from(vec![
                Span::styled(format!("#{:<2} ", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(artist.name.clone()),
                Span::styled(format!("  {}", genre), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let tracks: Vec<ListItem> = report
        .top_tracks
        .short_term
        .iter()
        .take(8)
        .enumerate()
        .map(|(i, track)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("#{:<2} ", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(format!("{} — {}", track.name, track.primary_artist())),
                Span::styled(
                    format!("  {}", track.duration_display()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    frame.render_widget(
        List::new(artists).block(Block::default().borders(Borders::ALL).title(" Top Artists ")),
        halves[0],
    );
    frame.render_widget(
        List::new(tracks).block(Block::default().borders(Borders::ALL).title(" Top Tracks ")),
        halves[1],
    );
}

fn render_insights(frame: &mut Frame, area: Rect, report: &AnalysisReport) {
    let lines: Vec<Line> = report
        .insights
        .iter()
        .take(4)
        .map(|insight| {
            Line::from(vec![
                Span::styled("• ", Style::default().fg(Color::Yellow)),
                Span::raw(insight.clone()),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Insights "));
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let text = match app.status_message() {
        Some(message) => message.to_string(),
        None => "r: refresh data   x: logout   q: quit".to_string(),
    };
    let paragraph = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)));
    frame.render_widget(paragraph, area);
}

/// Center a fixed-size box inside `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
