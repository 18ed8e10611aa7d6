pub(crate) mod api;
mod episode;
mod playback;
pub(crate) mod resolver;
mod tui;


use anyhow::{Result, bail};
use rand::Rng;

use crate::catalog::Catalog;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::proxy::ProxySelection;

use self::episode::{
    display_title, format_episode_number, format_time_range, or_dash, truncate,
};
use self::playback::{play_episode, playback_message};
use self::resolver::{
    FALLBACK_ERROR_MESSAGE, NotificationSink, ResolvedEpisode, Resolver, ResolverState,
};

pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.options)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Some(Command::Resolve { json, play }) => run_resolve(&config, json, play)?,
        Some(Command::Catalog) => run_catalog(&config.catalog),
        Some(Command::Tui) | None => tui::run_tui(&config)?,
    }

    Ok(())
}

/// Keeps the last notification so the one-shot command can fail with it.
#[derive(Debug, Default)]
struct LastNotice(Option<String>);

impl NotificationSink for LastNotice {
    fn notify_error(&mut self, message: &str) {
        self.0 = Some(message.to_string());
    }
}

fn run_resolve(config: &Config, json: bool, play: bool) -> Result<()> {
    let resolver = Resolver::from_config(config);
    let episode = resolve_once(
        &resolver,
        &config.catalog,
        config.initial_proxy,
        &mut rand::rng(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&episode)?);
    } else {
        print_episode(&episode, &config.catalog);
    }

    if play {
        let outcome = play_episode(&config.player, &episode)?;
        println!("\n{}", playback_message(&outcome));
    }
    Ok(())
}

/// Runs a single attempt and turns its notification into the command error.
fn resolve_once<R: Rng + ?Sized>(
    resolver: &Resolver,
    catalog: &Catalog,
    proxy: ProxySelection,
    rng: &mut R,
) -> Result<ResolvedEpisode> {
    let mut notice = LastNotice::default();
    let state = resolver.resolve(
        ResolverState::default(),
        catalog,
        proxy,
        rng,
        &mut notice,
        |_| {},
    );

    if let Some(message) = notice.0 {
        bail!("{message}");
    }
    match state.current() {
        Some(episode) => Ok(episode.clone()),
        None => bail!("{FALLBACK_ERROR_MESSAGE}"),
    }
}

fn print_episode(episode: &ResolvedEpisode, catalog: &Catalog) {
    let episode_text = episode
        .episode_number
        .map(format_episode_number)
        .unwrap_or_else(|| "-".to_string());
    println!("Title:      {}", display_title(episode, catalog));
    println!("Episode:    {episode_text}");
    println!("AniList ID: {}", episode.anime_id);
    println!("Proxy:      {}", episode.proxy.label());
    println!("Source:     {}", episode.source_url);
    println!(
        "Poster:     {}",
        episode.poster_url.as_deref().unwrap_or("-")
    );
    println!("Thumbnails: {}", or_dash(&episode.thumbnail_track_url));
    println!("Subtitles:  {}", episode.subtitles.len());
    println!("Intro:      {}", format_time_range(episode.intro));
    println!("Outro:      {}", format_time_range(episode.outro));
}

fn run_catalog(catalog: &Catalog) {
    println!("{:<10} {:<40}", "ANILIST ID", "TITLE");
    for entry in catalog.entries() {
        println!(
            "{:<10} {:<40}",
            entry.id,
            truncate(entry.title.unwrap_or("-"), 40)
        );
    }
}
