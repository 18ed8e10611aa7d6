use crate::catalog::Catalog;

use super::api::TimeRange;
use super::resolver::ResolvedEpisode;

pub(crate) const DEFAULT_MEDIA_TITLE: &str = "Proxy Player";

/// Title from the metadata response, else the catalog's title, else the id.
pub(crate) fn display_title(episode: &ResolvedEpisode, catalog: &Catalog) -> String {
    if let Some(title) = episode.title.as_deref() {
        return title.to_string();
    }
    catalog
        .entries()
        .iter()
        .find(|entry| entry.id == episode.anime_id)
        .and_then(|entry| entry.title)
        .map(str::to_string)
        .unwrap_or_else(|| format!("AniList #{}", episode.anime_id))
}

pub(crate) fn media_title(episode: &ResolvedEpisode) -> String {
    match (episode.title.as_deref(), episode.episode_number) {
        (Some(title), Some(number)) => {
            format!("{title} - Episode {}", format_episode_number(number))
        }
        (Some(title), None) => title.to_string(),
        (None, _) => DEFAULT_MEDIA_TITLE.to_string(),
    }
}

pub(crate) fn format_episode_number(number: f64) -> String {
    if number.fract().abs() < 0.000_001 {
        format!("{}", number.trunc() as i64)
    } else {
        format!("{number}")
    }
}

pub(crate) fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub(crate) fn format_time_range(range: Option<TimeRange>) -> String {
    match range {
        Some(range) => format!(
            "{}-{}",
            format_timestamp(range.start),
            format_timestamp(range.end)
        ),
        None => "-".to_string(),
    }
}

pub(crate) fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}
