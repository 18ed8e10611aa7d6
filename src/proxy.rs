use anyhow::{Result, anyhow};
use clap::ValueEnum;
use serde::Serialize;

pub const BETTERMELON_PROXY_URL: &str = "https://proxy.bettermelon.ru";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxySelection {
    #[default]
    Bettermelon,
    Local,
}

impl ProxySelection {
    pub const ALL: [ProxySelection; 2] = [Self::Bettermelon, Self::Local];

    pub fn label(self) -> &'static str {
        match self {
            Self::Bettermelon => "Bettermelon",
            Self::Local => "Local",
        }
    }

    pub fn move_left(self) -> Self {
        match self {
            Self::Bettermelon => Self::Bettermelon,
            Self::Local => Self::Bettermelon,
        }
    }

    pub fn move_right(self) -> Self {
        match self {
            Self::Bettermelon => Self::Local,
            Self::Local => Self::Local,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Self::Bettermelon => Self::Local,
            Self::Local => Self::Bettermelon,
        }
    }
}

/// Base URLs the proxy selections are bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTargets {
    pub bettermelon: String,
    pub local: Option<String>,
}

impl Default for ProxyTargets {
    fn default() -> Self {
        Self {
            bettermelon: BETTERMELON_PROXY_URL.to_string(),
            local: None,
        }
    }
}

impl ProxyTargets {
    pub fn base_url(&self, selection: ProxySelection) -> Result<&str> {
        match selection {
            ProxySelection::Bettermelon => Ok(self.bettermelon.as_str()),
            ProxySelection::Local => self
                .local
                .as_deref()
                .ok_or_else(|| anyhow!("local proxy URL is not configured (set ANIROLL_PROXY_URL)")),
        }
    }
}

/// The target is appended as-is, the proxy expects it unencoded.
pub fn proxied_url(base_url: &str, target: &str) -> String {
    format!("{base_url}/proxy?url={target}")
}

pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxied_url_keeps_target_unencoded() {
        assert_eq!(
            proxied_url(BETTERMELON_PROXY_URL, "https://cdn.example/a b.m3u8?x=1&y=2"),
            "https://proxy.bettermelon.ru/proxy?url=https://cdn.example/a b.m3u8?x=1&y=2"
        );
    }

    #[test]
    fn local_selection_without_url_fails() {
        let targets = ProxyTargets::default();
        let err = targets
            .base_url(ProxySelection::Local)
            .expect_err("missing local proxy should fail");
        assert!(err.to_string().contains("local proxy URL is not configured"));
    }

    #[test]
    fn selections_map_to_their_base_urls() {
        let targets = ProxyTargets {
            bettermelon: BETTERMELON_PROXY_URL.to_string(),
            local: Some("http://127.0.0.1:8080".to_string()),
        };
        assert_eq!(
            targets.base_url(ProxySelection::Bettermelon).unwrap(),
            BETTERMELON_PROXY_URL
        );
        assert_eq!(
            targets.base_url(ProxySelection::Local).unwrap(),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn normalize_base_url_trims_and_drops_empty() {
        assert_eq!(
            normalize_base_url("  http://localhost:3001/ "),
            Some("http://localhost:3001".to_string())
        );
        assert_eq!(normalize_base_url("   "), None);
        assert_eq!(normalize_base_url("/"), None);
    }

    #[test]
    fn selection_navigation_stays_in_bounds() {
        assert_eq!(ProxySelection::Bettermelon.move_left(), ProxySelection::Bettermelon);
        assert_eq!(ProxySelection::Bettermelon.move_right(), ProxySelection::Local);
        assert_eq!(ProxySelection::Local.move_right(), ProxySelection::Local);
        assert_eq!(ProxySelection::Local.cycle(), ProxySelection::Bettermelon);
    }
}
