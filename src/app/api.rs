use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::http::{HttpTimeouts, get_text};

pub(crate) const DEFAULT_API_URL: &str = "https://api.bettermelon.ru";
pub(crate) const EPISODE_SELECTOR: &str = "1";
pub(crate) const PROVIDER_SELECTOR: &str = "hianime";

const THUMBNAILS_KIND: &str = "thumbnails";

#[derive(Debug, Deserialize)]
struct Envelope {
    data: StreamingData,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamingData {
    pub(crate) episode: EpisodePayload,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EpisodePayload {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) details: Option<EpisodeDetails>,
    pub(crate) sources: SourceSet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EpisodeDetails {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) attributes: Option<EpisodeAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EpisodeAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) canonical_title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) number: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) thumbnail: Option<Thumbnail>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) titles: Option<Titles>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Thumbnail {
    pub(crate) original: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Titles {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) en: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) en_jp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SourceSet {
    pub(crate) sources: MediaSource,
    #[serde(default, deserialize_with = "lenient_list")]
    pub(crate) tracks: Vec<Track>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) intro: Option<TimeRange>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) outro: Option<TimeRange>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MediaSource {
    pub(crate) file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Track {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) label: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) kind: Option<String>,
    pub(crate) file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, serde::Serialize)]
pub(crate) struct TimeRange {
    pub(crate) start: f64,
    pub(crate) end: f64,
}

/// Only the media file is required; any other field with an unexpected
/// shape reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let serde_json::Value::Array(items) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

impl StreamingData {
    fn attributes(&self) -> Option<&EpisodeAttributes> {
        self.episode.details.as_ref()?.attributes.as_ref()
    }

    pub(crate) fn media_file(&self) -> Result<&str> {
        let file = self.episode.sources.sources.file.as_str();
        if file.trim().is_empty() {
            return Err(anyhow!("metadata response is missing the media file URL"));
        }
        Ok(file)
    }

    pub(crate) fn thumbnail_image(&self) -> Option<&str> {
        self.attributes()?
            .thumbnail
            .as_ref()
            .map(|thumb| thumb.original.as_str())
            .filter(|image| !image.trim().is_empty())
    }

    pub(crate) fn thumbnail_track(&self) -> Option<&Track> {
        self.episode
            .sources
            .tracks
            .iter()
            .find(|track| track.kind.as_deref() == Some(THUMBNAILS_KIND))
    }

    pub(crate) fn subtitle_tracks(&self) -> impl Iterator<Item = &Track> {
        self.episode.sources.tracks.iter().filter(|track| {
            matches!(track.kind.as_deref(), Some("captions") | Some("subtitles"))
                && !track.file.trim().is_empty()
        })
    }

    pub(crate) fn display_title(&self) -> Option<String> {
        let attributes = self.attributes()?;
        let titles = attributes.titles.as_ref();
        [
            attributes.canonical_title.as_deref(),
            titles.and_then(|t| t.en.as_deref()),
            titles.and_then(|t| t.en_jp.as_deref()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(str::to_string)
    }

    pub(crate) fn episode_number(&self) -> Option<f64> {
        self.attributes()?.number
    }

    pub(crate) fn intro(&self) -> Option<TimeRange> {
        non_empty_range(self.episode.sources.intro)
    }

    pub(crate) fn outro(&self) -> Option<TimeRange> {
        non_empty_range(self.episode.sources.outro)
    }
}

// The API reports `{start: 0, end: 0}` for episodes without a marked segment.
fn non_empty_range(range: Option<TimeRange>) -> Option<TimeRange> {
    range.filter(|range| range.end > range.start)
}

pub(crate) fn episode_endpoint(api_base: &str, anime_id: u32) -> String {
    format!("{api_base}/anime/{anime_id}/{EPISODE_SELECTOR}/{PROVIDER_SELECTOR}")
}

pub(crate) fn parse_streaming_data(raw: &str) -> Result<StreamingData> {
    let envelope: Envelope =
        serde_json::from_str(raw).context("failed to parse metadata response")?;
    Ok(envelope.data)
}

pub(crate) fn fetch_streaming_data(
    api_base: &str,
    anime_id: u32,
    timeouts: HttpTimeouts,
) -> Result<StreamingData> {
    let url = episode_endpoint(api_base, anime_id);
    tracing::debug!(%url, "requesting episode metadata");
    let body = get_text(&url, timeouts).map_err(|err| anyhow!(err))?;
    parse_streaming_data(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RESPONSE: &str = r#"{
        "data": {
            "provider": "hianime",
            "episode": {
                "details": {
                    "id": "1",
                    "type": "episodes",
                    "attributes": {
                        "canonicalTitle": "Turning Point",
                        "number": 1,
                        "thumbnail": { "original": "https://img.example/ep1.jpg" },
                        "titles": { "en_jp": "Tenkan" },
                        "length": 24,
                        "createdAt": "2013-01-01",
                        "updatedAt": "2013-01-01"
                    }
                },
                "sources": {
                    "type": "SUB",
                    "sources": { "type": "hls", "file": "https://cdn.example/ep1.m3u8" },
                    "tracks": [
                        { "label": "English", "kind": "captions", "file": "https://cdn.example/en.vtt", "default": true },
                        { "kind": "thumbnails", "file": "https://cdn.example/thumbs.vtt" },
                        { "kind": "thumbnails", "file": "https://cdn.example/other-thumbs.vtt" }
                    ],
                    "intro": { "start": 0, "end": 0 },
                    "outro": { "start": 1300, "end": 1390 },
                    "serverId": 4
                },
                "subtitles": []
            }
        }
    }"#;

    #[test]
    fn endpoint_uses_fixed_episode_and_provider_selectors() {
        assert_eq!(
            episode_endpoint(DEFAULT_API_URL, 9253),
            "https://api.bettermelon.ru/anime/9253/1/hianime"
        );
    }

    #[test]
    fn extracts_all_fields_from_full_response() {
        let data = parse_streaming_data(FULL_RESPONSE).expect("response should parse");
        assert_eq!(data.media_file().unwrap(), "https://cdn.example/ep1.m3u8");
        assert_eq!(data.thumbnail_image(), Some("https://img.example/ep1.jpg"));
        assert_eq!(
            data.thumbnail_track().map(|track| track.file.as_str()),
            Some("https://cdn.example/thumbs.vtt")
        );
        assert_eq!(data.display_title().as_deref(), Some("Turning Point"));
        assert_eq!(data.episode_number(), Some(1.0));
        assert_eq!(data.intro(), None);
        assert_eq!(
            data.outro(),
            Some(TimeRange {
                start: 1300.0,
                end: 1390.0
            })
        );
        let subtitles: Vec<_> = data.subtitle_tracks().collect();
        assert_eq!(subtitles.len(), 1);
        assert_eq!(subtitles[0].label.as_deref(), Some("English"));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let raw = r#"{"data":{"episode":{"details":{"attributes":{}},"sources":{"sources":{"file":"https://cdn.example/ep1.m3u8"},"tracks":[]}}}}"#;
        let data = parse_streaming_data(raw).expect("response should parse");
        assert_eq!(data.thumbnail_image(), None);
        assert!(data.thumbnail_track().is_none());
        assert_eq!(data.display_title(), None);
    }

    #[test]
    fn title_falls_back_to_romaji_when_canonical_is_blank() {
        let raw = r#"{"data":{"episode":{"details":{"attributes":{"canonicalTitle":"  ","titles":{"en_jp":"Tenkan"}}},"sources":{"sources":{"file":"x"}}}}}"#;
        let data = parse_streaming_data(raw).expect("response should parse");
        assert_eq!(data.display_title().as_deref(), Some("Tenkan"));
    }

    #[test]
    fn missing_media_source_is_a_parse_failure() {
        let raw = r#"{"data":{"episode":{"sources":{"tracks":[]}}}}"#;
        let err = parse_streaming_data(raw).expect_err("missing sources should fail");
        assert!(format!("{err:#}").contains("failed to parse metadata response"));
    }

    #[test]
    fn empty_media_file_is_rejected() {
        let raw = r#"{"data":{"episode":{"sources":{"sources":{"file":"  "}}}}}"#;
        let data = parse_streaming_data(raw).expect("shape is valid");
        let err = data.media_file().expect_err("blank file should fail");
        assert!(err.to_string().contains("missing the media file URL"));
    }

    fn with_media_file(episode: serde_json::Value) -> String {
        let mut body = serde_json::json!({
            "data": { "episode": { "sources": { "sources": { "file": "https://cdn.example/ep1.m3u8" } } } }
        });
        let target = &mut body["data"]["episode"];
        for (key, value) in episode.as_object().expect("object").clone() {
            if key == "sources" {
                for (inner, value) in value.as_object().expect("object").clone() {
                    target["sources"][inner] = value;
                }
            } else {
                target[key] = value;
            }
        }
        body.to_string()
    }

    #[test]
    fn malformed_optional_fields_read_as_absent() {
        use serde_json::json;

        let cases = [
            json!({ "sources": { "intro": {} } }),
            json!({ "sources": { "intro": { "start": null, "end": null } } }),
            json!({ "sources": { "outro": "none" } }),
            json!({ "details": { "attributes": { "number": "1" } } }),
            json!({ "details": { "attributes": { "thumbnail": { "original": null } } } }),
            json!({ "details": { "attributes": { "canonicalTitle": 7, "titles": [] } } }),
            json!({ "details": "missing" }),
            json!({ "sources": { "tracks": [{ "kind": "thumbnails" }, 3] } }),
            json!({ "sources": { "tracks": {} } }),
        ];

        for case in cases {
            let raw = with_media_file(case.clone());
            let data = parse_streaming_data(&raw)
                .unwrap_or_else(|err| panic!("{case} should parse: {err:#}"));
            assert_eq!(data.media_file().unwrap(), "https://cdn.example/ep1.m3u8");
            assert_eq!(data.intro(), None, "{case}");
            assert_eq!(data.outro(), None, "{case}");
            assert_eq!(data.episode_number(), None, "{case}");
            assert_eq!(data.thumbnail_image(), None, "{case}");
            assert_eq!(data.display_title(), None, "{case}");
            assert!(data.thumbnail_track().is_none(), "{case}");
        }
    }

    #[test]
    fn bad_track_entries_do_not_hide_valid_ones() {
        let raw = with_media_file(serde_json::json!({
            "sources": { "tracks": [
                { "kind": "thumbnails" },
                { "kind": "thumbnails", "file": "https://cdn.example/thumbs.vtt" }
            ] }
        }));
        let data = parse_streaming_data(&raw).expect("response should parse");
        assert_eq!(
            data.thumbnail_track().map(|track| track.file.as_str()),
            Some("https://cdn.example/thumbs.vtt")
        );
    }

    #[test]
    fn media_file_is_returned_verbatim() {
        let raw = with_media_file(serde_json::json!({
            "sources": { "sources": { "file": " https://cdn.example/ep1.m3u8 " } }
        }));
        let data = parse_streaming_data(&raw).expect("response should parse");
        assert_eq!(data.media_file().unwrap(), " https://cdn.example/ep1.m3u8 ");
    }

    #[test]
    fn wrongly_typed_media_file_is_a_parse_failure() {
        let raw = r#"{"data":{"episode":{"sources":{"sources":{"file":null}}}}}"#;
        assert!(parse_streaming_data(raw).is_err());
    }

    #[test]
    fn non_json_body_is_a_parse_failure() {
        assert!(parse_streaming_data("<html>Bad Gateway</html>").is_err());
    }
}
