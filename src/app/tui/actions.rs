use std::sync::mpsc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::proxy::ProxySelection;

use super::super::episode::display_title;
use super::super::resolver::{Busy, NotificationSink};
use super::{KeyOutcome, ResolutionResult, TOAST_TTL, TuiApp};

pub(in crate::app) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(in crate::app) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

impl TuiApp {
    /// Starts an attempt on a worker thread. Returns false when one is
    /// already in flight.
    pub(in crate::app) fn start_resolution(&mut self, tx: &mpsc::Sender<ResolutionResult>) -> bool {
        let anime_id = self.catalog.pick(&mut self.rng).id;
        let (loading, ticket) = match self.state.begin(anime_id, self.proxy) {
            Ok(started) => started,
            Err(Busy(in_flight)) => {
                tracing::debug!(attempt = in_flight.attempt, "ignoring trigger while loading");
                return false;
            }
        };
        self.state = loading;
        self.status = status_info("Loading...");

        let resolver = self.resolver.clone();
        let tx = tx.clone();
        std::thread::spawn(move || {
            let outcome = resolver
                .attempt_logged(ticket)
                .map_err(|err| format!("{err:#}"));
            let _ = tx.send(ResolutionResult { ticket, outcome });
        });
        true
    }

    pub(in crate::app) fn drain_resolution_results(
        &mut self,
        rx: &mpsc::Receiver<ResolutionResult>,
    ) {
        while let Ok(result) = rx.try_recv() {
            self.apply_resolution(result);
        }
    }

    pub(in crate::app) fn apply_resolution(&mut self, result: ResolutionResult) {
        let current_attempt = self.state.in_flight() == Some(result.ticket);
        let (next, message) = self.state.complete(result.ticket, result.outcome);
        self.state = next;
        if !current_attempt {
            return;
        }

        match message {
            Some(message) => self.notify_error(&message),
            None => {
                if let Some(episode) = self.state.current() {
                    let title = display_title(episode, &self.catalog);
                    self.status = status_info(&format!("Ready to play: {title}"));
                }
            }
        }
    }

    pub(in crate::app) fn switch_proxy(&mut self, next: ProxySelection) {
        if next == self.proxy {
            return;
        }
        tracing::debug!(from = self.proxy.label(), to = next.label(), "proxy switched");
        self.proxy = next;
        self.status = status_info(&format!(
            "Proxy set to {}. Applies to the next episode.",
            next.label()
        ));
    }

    pub(in crate::app) fn expire_toast(&mut self, now: Instant) {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| now.duration_since(toast.shown_at) >= TOAST_TTL)
        {
            self.toast = None;
        }
    }

    pub(in crate::app) fn handle_key(
        &mut self,
        key: KeyEvent,
        tx: &mpsc::Sender<ResolutionResult>,
    ) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match key.code {
            KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Esc => {
                if self.toast.take().is_none() {
                    return KeyOutcome::Quit;
                }
            }
            KeyCode::Char('g') | KeyCode::Enter => {
                self.start_resolution(tx);
            }
            KeyCode::Left => self.switch_proxy(self.proxy.move_left()),
            KeyCode::Right => self.switch_proxy(self.proxy.move_right()),
            KeyCode::Tab => self.switch_proxy(self.proxy.cycle()),
            KeyCode::Char('p') => {
                if self.state.current().is_some() {
                    return KeyOutcome::Play;
                }
                self.status = status_info("Nothing to play yet. Press g to roll an episode.");
            }
            _ => {}
        }
        KeyOutcome::Continue
    }
}
