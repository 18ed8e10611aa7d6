mod process;

use std::path::Path;
use std::process::{Command as ProcessCommand, Stdio};

use anyhow::{Context, Result};

use super::episode::media_title;
use super::resolver::ResolvedEpisode;

use self::process::run_player_in_foreground;

#[derive(Debug, Clone)]
pub(crate) struct PlaybackOutcome {
    pub(crate) success: bool,
    pub(crate) failure_detail: Option<String>,
}

fn is_mpv(player: &Path) -> bool {
    player
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case("mpv"))
}

/// Player arguments for an episode. mpv also gets the media title and the
/// subtitle tracks; other players only get the source URL.
pub(crate) fn player_args(player: &Path, episode: &ResolvedEpisode) -> Vec<String> {
    let mut args = Vec::new();
    if is_mpv(player) {
        args.push(format!("--force-media-title={}", media_title(episode)));
        for subtitle in &episode.subtitles {
            args.push(format!("--sub-file={}", subtitle.file));
        }
    }
    args.push(episode.source_url.clone());
    args
}

pub(crate) fn play_episode(player: &Path, episode: &ResolvedEpisode) -> Result<PlaybackOutcome> {
    let mut cmd = ProcessCommand::new(player);
    cmd.args(player_args(player, episode))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    tracing::info!(
        player = %player.display(),
        anime_id = episode.anime_id,
        "launching player"
    );
    let status = run_player_in_foreground(cmd)
        .with_context(|| format!("failed to launch {}", player.display()))?;

    if status.success() {
        Ok(PlaybackOutcome {
            success: true,
            failure_detail: None,
        })
    } else {
        tracing::warn!(%status, "player exited unsuccessfully");
        Ok(PlaybackOutcome {
            success: false,
            failure_detail: Some(format!("player exited with status: {status}")),
        })
    }
}

pub(crate) fn playback_message(outcome: &PlaybackOutcome) -> String {
    match (outcome.success, outcome.failure_detail.as_deref()) {
        (true, _) => "Playback finished.".to_string(),
        (false, Some(detail)) => format!("Playback failed/interrupted: {detail}."),
        (false, None) => "Playback failed/interrupted.".to_string(),
    }
}
