mod actions;
mod render;
mod session;

use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::proxy::ProxySelection;

use super::playback::{play_episode, playback_message};
use super::resolver::{
    AttemptTicket, NotificationSink, ResolvedEpisode, Resolver, ResolverState,
};

pub(super) use self::actions::{status_error, status_info};
use self::render::draw_tui;
use self::session::TerminalSession;

pub(super) const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub(super) struct Toast {
    pub(super) message: String,
    pub(super) shown_at: Instant,
}

#[derive(Debug)]
pub(super) struct ResolutionResult {
    pub(super) ticket: AttemptTicket,
    pub(super) outcome: Result<ResolvedEpisode, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KeyOutcome {
    Continue,
    Play,
    Quit,
}

pub(super) struct TuiApp {
    pub(super) resolver: Resolver,
    pub(super) catalog: Catalog,
    pub(super) state: ResolverState,
    pub(super) proxy: ProxySelection,
    pub(super) status: String,
    pub(super) toast: Option<Toast>,
    rng: StdRng,
}

impl TuiApp {
    pub(super) fn new(
        resolver: Resolver,
        catalog: Catalog,
        proxy: ProxySelection,
        rng: StdRng,
    ) -> Self {
        Self {
            resolver,
            catalog,
            state: ResolverState::default(),
            proxy,
            status: status_info("Ready."),
            toast: None,
            rng,
        }
    }

    pub(super) fn from_config(config: &Config) -> Self {
        Self::new(
            Resolver::from_config(config),
            config.catalog.clone(),
            config.initial_proxy,
            StdRng::from_os_rng(),
        )
    }
}

impl NotificationSink for TuiApp {
    fn notify_error(&mut self, message: &str) {
        self.status = status_error(message);
        self.toast = Some(Toast {
            message: message.to_string(),
            shown_at: Instant::now(),
        });
    }
}

pub(crate) fn run_tui(config: &Config) -> Result<()> {
    let mut app = TuiApp::from_config(config);
    let (result_tx, result_rx) = mpsc::channel::<ResolutionResult>();

    let mut session = TerminalSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    loop {
        app.drain_resolution_results(&result_rx);
        app.expire_toast(Instant::now());
        terminal.draw(|frame| draw_tui(frame, &app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key, &result_tx) {
            KeyOutcome::Continue => {}
            KeyOutcome::Quit => break,
            KeyOutcome::Play => {
                let Some(episode) = app.state.current().cloned() else {
                    continue;
                };
                let result = session.suspended(|| play_episode(&config.player, &episode))?;
                terminal.clear()?;
                match result {
                    Ok(outcome) => app.status = status_info(&playback_message(&outcome)),
                    Err(err) => app.notify_error(&format!("{err:#}")),
                }
            }
        }
    }

    drop(terminal);
    session.leave()?;
    Ok(())
}
