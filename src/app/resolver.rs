use anyhow::Result;
use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::http::HttpTimeouts;
use crate::proxy::{ProxySelection, ProxyTargets, proxied_url};

use super::api::{StreamingData, TimeRange, fetch_streaming_data};

pub(crate) const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong!";
const ABSENT_PLACEHOLDER: &str = "undefined";

/// What to do with the poster when the episode carries no thumbnail image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PosterPolicy {
    #[default]
    Omit,
    /// Proxy the literal `undefined`, for proxies that answer it with a stock image.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SubtitleTrack {
    pub(crate) label: Option<String>,
    pub(crate) file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ResolvedEpisode {
    pub(crate) anime_id: u32,
    pub(crate) proxy: ProxySelection,
    pub(crate) title: Option<String>,
    pub(crate) episode_number: Option<f64>,
    pub(crate) source_url: String,
    pub(crate) poster_url: Option<String>,
    pub(crate) thumbnail_track_url: String,
    pub(crate) subtitles: Vec<SubtitleTrack>,
    pub(crate) intro: Option<TimeRange>,
    pub(crate) outro: Option<TimeRange>,
    pub(crate) resolved_at: DateTime<Local>,
}

pub(crate) fn derive_episode(
    anime_id: u32,
    proxy: ProxySelection,
    proxy_base: &str,
    data: &StreamingData,
    poster_policy: PosterPolicy,
) -> Result<ResolvedEpisode> {
    let source_url = proxied_url(proxy_base, data.media_file()?);
    let poster_url = match (data.thumbnail_image(), poster_policy) {
        (Some(image), _) => Some(proxied_url(proxy_base, image)),
        (None, PosterPolicy::Placeholder) => Some(proxied_url(proxy_base, ABSENT_PLACEHOLDER)),
        (None, PosterPolicy::Omit) => None,
    };
    let thumbnail_track_url = data
        .thumbnail_track()
        .map(|track| track.file.clone())
        .unwrap_or_default();
    let subtitles = data
        .subtitle_tracks()
        .map(|track| SubtitleTrack {
            label: track.label.clone(),
            file: track.file.clone(),
        })
        .collect();

    Ok(ResolvedEpisode {
        anime_id,
        proxy,
        title: data.display_title(),
        episode_number: data.episode_number(),
        source_url,
        poster_url,
        thumbnail_track_url,
        subtitles,
        intro: data.intro(),
        outro: data.outro(),
        resolved_at: Local::now(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AttemptTicket {
    pub(crate) attempt: u64,
    pub(crate) anime_id: u32,
    pub(crate) proxy: ProxySelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Loading(AttemptTicket),
}

/// Returned by [`ResolverState::begin`] while another attempt is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Busy(pub(crate) AttemptTicket);

/// Snapshot of the resolver. Transitions never mutate a snapshot, they
/// hand back the next one.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ResolverState {
    phase: Phase,
    current: Option<ResolvedEpisode>,
    attempts: u64,
}

impl ResolverState {
    pub(crate) fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading(_))
    }

    pub(crate) fn in_flight(&self) -> Option<AttemptTicket> {
        match self.phase {
            Phase::Loading(ticket) => Some(ticket),
            Phase::Idle => None,
        }
    }

    pub(crate) fn current(&self) -> Option<&ResolvedEpisode> {
        self.current.as_ref()
    }

    pub(crate) fn begin(
        &self,
        anime_id: u32,
        proxy: ProxySelection,
    ) -> Result<(ResolverState, AttemptTicket), Busy> {
        if let Phase::Loading(ticket) = self.phase {
            return Err(Busy(ticket));
        }
        let ticket = AttemptTicket {
            attempt: self.attempts + 1,
            anime_id,
            proxy,
        };
        let next = ResolverState {
            phase: Phase::Loading(ticket),
            current: self.current.clone(),
            attempts: ticket.attempt,
        };
        Ok((next, ticket))
    }

    /// Ends the attempt identified by `ticket`. A failure keeps the previous
    /// result and yields the message for the notification sink. Completions
    /// for any other attempt are ignored.
    pub(crate) fn complete(
        &self,
        ticket: AttemptTicket,
        outcome: Result<ResolvedEpisode, String>,
    ) -> (ResolverState, Option<String>) {
        if self.in_flight() != Some(ticket) {
            tracing::debug!(attempt = ticket.attempt, "dropping stale resolution outcome");
            return (self.clone(), None);
        }

        match outcome {
            Ok(episode) => (
                ResolverState {
                    phase: Phase::Idle,
                    current: Some(episode),
                    attempts: self.attempts,
                },
                None,
            ),
            Err(raw) => (
                ResolverState {
                    phase: Phase::Idle,
                    current: self.current.clone(),
                    attempts: self.attempts,
                },
                Some(notification_message(&raw)),
            ),
        }
    }
}

pub(crate) fn notification_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) trait NotificationSink {
    fn notify_error(&mut self, message: &str);
}

#[derive(Debug, Clone)]
pub(crate) struct Resolver {
    api_url: String,
    proxies: ProxyTargets,
    timeouts: HttpTimeouts,
    poster_policy: PosterPolicy,
}

impl Resolver {
    pub(crate) fn new(
        api_url: impl Into<String>,
        proxies: ProxyTargets,
        timeouts: HttpTimeouts,
        poster_policy: PosterPolicy,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            proxies,
            timeouts,
            poster_policy,
        }
    }

    pub(crate) fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_url.clone(),
            config.proxies.clone(),
            config.timeouts,
            config.poster_policy,
        )
    }

    /// Fetches and derives one episode. Blocks for the duration of the request.
    pub(crate) fn attempt(&self, anime_id: u32, proxy: ProxySelection) -> Result<ResolvedEpisode> {
        let proxy_base = self.proxies.base_url(proxy)?;
        let data = fetch_streaming_data(&self.api_url, anime_id, self.timeouts)?;
        derive_episode(anime_id, proxy, proxy_base, &data, self.poster_policy)
    }

    /// Runs a whole attempt against `state` and returns the state it ends in.
    /// `observe` sees every transition; an overlapping call is ignored.
    pub(crate) fn resolve<R, S, F>(
        &self,
        state: ResolverState,
        catalog: &Catalog,
        proxy: ProxySelection,
        rng: &mut R,
        sink: &mut S,
        mut observe: F,
    ) -> ResolverState
    where
        R: Rng + ?Sized,
        S: NotificationSink + ?Sized,
        F: FnMut(&ResolverState),
    {
        let anime_id = catalog.pick(rng).id;
        let (loading, ticket) = match state.begin(anime_id, proxy) {
            Ok(started) => started,
            Err(Busy(in_flight)) => {
                tracing::debug!(attempt = in_flight.attempt, "resolution already in flight");
                return state;
            }
        };
        observe(&loading);

        let outcome = self
            .attempt_logged(ticket)
            .map_err(|err| format!("{err:#}"));
        let (next, message) = loading.complete(ticket, outcome);
        if let Some(message) = message {
            sink.notify_error(&message);
        }
        observe(&next);
        next
    }

    pub(crate) fn attempt_logged(&self, ticket: AttemptTicket) -> Result<ResolvedEpisode> {
        tracing::info!(
            attempt = ticket.attempt,
            anime_id = ticket.anime_id,
            proxy = ticket.proxy.label(),
            "resolving random episode"
        );
        let outcome = self.attempt(ticket.anime_id, ticket.proxy);
        match &outcome {
            Ok(episode) => tracing::info!(
                attempt = ticket.attempt,
                anime_id = ticket.anime_id,
                source_url = %episode.source_url,
                "episode resolved"
            ),
            Err(err) => tracing::warn!(
                attempt = ticket.attempt,
                anime_id = ticket.anime_id,
                error = %format!("{err:#}"),
                "episode resolution failed"
            ),
        }
        outcome
    }
}
