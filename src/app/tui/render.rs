use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};

use crate::proxy::ProxySelection;

use super::super::episode::{
    display_title, format_episode_number, format_time_range, or_dash, truncate,
};
use super::super::resolver::ResolvedEpisode;
use super::{Toast, TuiApp};

const ACCENT: Color = Color::Rgb(110, 170, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);
const TEXT: Color = Color::Rgb(230, 235, 242);

pub(super) fn draw_tui(frame: &mut Frame, app: &TuiApp) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(header(app), chunks[0]);

    match app.state.current() {
        Some(episode) => draw_episode(frame, app, episode, chunks[1]),
        None if app.state.is_loading() => {
            let text = format!(
                "\n\nLoading...\n\nFetching a random episode through {}.",
                app.proxy.label()
            );
            let loading = Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow))
                .block(panel_block("Player"));
            frame.render_widget(loading, chunks[1]);
        }
        None => {
            let placeholder = Paragraph::new(
                "\n\n🎬\n\nPress g to \"Generate Random Anime\" and start watching",
            )
            .alignment(Alignment::Center)
            .style(Style::default().fg(MUTED))
            .block(placeholder_block());
            frame.render_widget(placeholder, chunks[1]);
        }
    }

    let controls = Paragraph::new(controls_line(app.state.is_loading(), app.proxy))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[2]);

    let status_widget = Paragraph::new(app.status.clone())
        .style(status_style(&app.status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);

    if let Some(toast) = app.toast.as_ref() {
        draw_toast(frame, toast);
    }
}

fn header(app: &TuiApp) -> Paragraph<'static> {
    let mut spans = vec![
        Span::styled(
            "ANIROLL",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{} titles", app.catalog.len()),
            Style::default().fg(MUTED),
        ),
        Span::raw("   "),
        Span::styled(
            format!("proxy {}", app.proxy.label()),
            Style::default().fg(MUTED),
        ),
    ];
    if app.state.is_loading() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled("LOADING", Style::default().fg(Color::Yellow)));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(panel_block("Dashboard"))
}

fn draw_episode(frame: &mut Frame, app: &TuiApp, episode: &ResolvedEpisode, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let episode_text = episode
        .episode_number
        .map(format_episode_number)
        .unwrap_or_else(|| "-".to_string());
    let details = format!(
        "Title\n{}\n\nEpisode\n{}\n\nAniList ID\n{}\n\nProxy\n{}\n\nIntro / Outro\n{} / {}\n\nSubtitles\n{}\n\nResolved\n{}",
        truncate(&display_title(episode, &app.catalog), 40),
        episode_text,
        episode.anime_id,
        episode.proxy.label(),
        format_time_range(episode.intro),
        format_time_range(episode.outro),
        episode.subtitles.len(),
        episode.resolved_at.format("%Y-%m-%d %H:%M:%S"),
    );
    let title = if app.state.is_loading() {
        "Now Playing (loading next...)"
    } else {
        "Now Playing"
    };
    let details = Paragraph::new(details)
        .style(Style::default().fg(TEXT))
        .block(panel_block(title));
    frame.render_widget(details, columns[0]);

    let sources = vec![
        Line::styled("Source", Style::default().fg(ACCENT)),
        Line::raw(episode.source_url.clone()),
        Line::raw(""),
        Line::styled("Poster", Style::default().fg(ACCENT)),
        Line::raw(episode.poster_url.clone().unwrap_or_else(|| "-".to_string())),
        Line::raw(""),
        Line::styled("Thumbnails", Style::default().fg(ACCENT)),
        Line::raw(or_dash(&episode.thumbnail_track_url).to_string()),
        Line::raw(""),
        Line::styled("Press p to play", Style::default().fg(MUTED)),
    ];
    let sources = Paragraph::new(sources)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: false })
        .block(panel_block("Sources"));
    frame.render_widget(sources, columns[1]);
}

fn draw_toast(frame: &mut Frame, toast: &Toast) {
    let area = toast_rect(frame.area(), &toast.message);
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(toast.message.clone())
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: true })
        .block(toast_block());
    frame.render_widget(popup, area);
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn placeholder_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(72, 82, 96)))
        .title("Player")
}

fn toast_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(255, 145, 120))
                .add_modifier(Modifier::BOLD),
        )
        .title("Error")
        .padding(Padding::horizontal(1))
}

fn pill_active() -> Style {
    Style::default()
        .bg(ACCENT)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_inactive() -> Style {
    Style::default().bg(Color::Rgb(72, 82, 96)).fg(TEXT)
}

pub(super) fn trigger_label(loading: bool) -> &'static str {
    if loading {
        " Loading... "
    } else {
        " ▶ Generate Random Anime "
    }
}

fn controls_line(loading: bool, proxy: ProxySelection) -> Line<'static> {
    let trigger_style = if loading {
        pill_inactive().add_modifier(Modifier::DIM)
    } else {
        pill_active()
    };
    let mut spans = vec![
        Span::styled(trigger_label(loading), trigger_style),
        Span::raw("   "),
        Span::styled("Proxy: ", Style::default().fg(MUTED)),
    ];
    for option in ProxySelection::ALL {
        let (label, style) = if option == proxy {
            (format!(" {} ✓ ", option.label()), pill_active())
        } else {
            (format!(" {} ", option.label()), pill_inactive())
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        "  g generate  ←/→ proxy  p play  q quit",
        Style::default().fg(MUTED),
    ));
    Line::from(spans)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(TEXT)
    }
}

/// Top-right corner, sized to the message.
fn toast_rect(area: Rect, text: &str) -> Rect {
    let available_width = area.width.saturating_sub(2).max(1);
    let width = (text.chars().count() as u16)
        .saturating_add(6)
        .clamp(24.min(available_width), 56.min(available_width));
    let inner_width = width.saturating_sub(4).max(1);
    let lines = (text.chars().count() as u16).div_ceil(inner_width).max(1);
    let height = lines
        .saturating_add(2)
        .min(area.height.saturating_sub(2).max(1));
    let x = area.x + area.width.saturating_sub(width + 1);
    let y = area.y + 1;
    Rect::new(x, y, width, height)
}
