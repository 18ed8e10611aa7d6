use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::app::api::DEFAULT_API_URL;
use crate::app::resolver::PosterPolicy;
use crate::catalog::Catalog;
use crate::cli::GlobalOptions;
use crate::http::HttpTimeouts;
use crate::proxy::{ProxySelection, ProxyTargets, normalize_base_url};

const API_URL_VAR: &str = "ANIROLL_API_URL";
const PROXY_URL_VAR: &str = "ANIROLL_PROXY_URL";
const PLAYER_VAR: &str = "ANIROLL_PLAYER";
const TIMEOUT_VAR: &str = "ANIROLL_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub proxies: ProxyTargets,
    pub initial_proxy: ProxySelection,
    pub player: PathBuf,
    pub timeouts: HttpTimeouts,
    pub poster_policy: PosterPolicy,
    pub catalog: Catalog,
}

/// Raw environment values, captured once so config assembly stays pure.
#[derive(Debug, Clone, Default)]
pub struct EnvValues {
    pub api_url: Option<String>,
    pub proxy_url: Option<String>,
    pub player: Option<OsString>,
    pub timeout_secs: Option<String>,
}

impl EnvValues {
    pub fn from_process() -> Self {
        Self {
            api_url: env::var(API_URL_VAR).ok(),
            proxy_url: env::var(PROXY_URL_VAR).ok(),
            player: env::var_os(PLAYER_VAR),
            timeout_secs: env::var(TIMEOUT_VAR).ok(),
        }
    }
}

impl Config {
    pub fn load(options: &GlobalOptions) -> Result<Self> {
        Self::from_sources(options, EnvValues::from_process())
    }

    /// Flags win over environment values, which win over defaults.
    pub fn from_sources(options: &GlobalOptions, env_values: EnvValues) -> Result<Self> {
        let api_url = options
            .api_url
            .as_deref()
            .or(env_values.api_url.as_deref())
            .and_then(normalize_base_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let local = options
            .local_proxy_url
            .as_deref()
            .or(env_values.proxy_url.as_deref())
            .and_then(normalize_base_url);
        let proxies = ProxyTargets {
            local,
            ..ProxyTargets::default()
        };

        let player = match &options.player {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => resolve_player_from_env(env_values.player),
        };

        let read_timeout_secs = options
            .timeout
            .or_else(|| parse_timeout_secs(env_values.timeout_secs.as_deref()));
        let timeouts = timeouts_from_read_secs(read_timeout_secs);

        let catalog = if options.ids.is_empty() {
            Catalog::builtin()
        } else {
            Catalog::from_ids(&options.ids)?
        };

        let poster_policy = if options.poster_placeholder {
            PosterPolicy::Placeholder
        } else {
            PosterPolicy::Omit
        };

        Ok(Self {
            api_url,
            proxies,
            initial_proxy: options.proxy.unwrap_or_default(),
            player,
            timeouts,
            poster_policy,
            catalog,
        })
    }
}

pub(crate) fn resolve_player_from_env(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from("mpv"),
    }
}

fn parse_timeout_secs(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Some(secs),
        _ => {
            tracing::warn!(value = raw, "ignoring invalid {TIMEOUT_VAR}");
            None
        }
    }
}

fn timeouts_from_read_secs(read_secs: Option<u64>) -> HttpTimeouts {
    let defaults = HttpTimeouts::default();
    match read_secs {
        Some(secs) if secs > 0 => {
            let read = Duration::from_secs(secs);
            HttpTimeouts {
                connect: defaults.connect.min(read),
                read,
            }
        }
        _ => defaults,
    }
}
