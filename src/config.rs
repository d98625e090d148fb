use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::Config;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::error::RunError;

const DEFAULT_CONFIG_FILE: &str = "uac.toml";
const ENV_PREFIX: &str = "UAC";

/// Run policy: target host, paging, pacing and request headers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub listing_path: String,
    pub report_path: String,
    /// Listing pages to scan, the unindexed first page included.
    pub pages: u32,
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub progress_every: usize,
    pub out_dir: PathBuf,
    pub headers: RequestHeaders,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://utahavalanchecenter.org".into(),
            listing_path: "/avalanches/list".into(),
            report_path: "/avalanches".into(),
            pages: 38,
            delay_ms: 2000,
            timeout_secs: 30,
            progress_every: 10,
            out_dir: PathBuf::from("."),
            headers: RequestHeaders::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestHeaders {
    pub accept_language: String,
    pub user_agent: String,
    pub accept: String,
    pub referer: String,
    pub connection: String,
}

impl Default for RequestHeaders {
    fn default() -> Self {
        Self {
            accept_language: "en-US,en;q=0.5".into(),
            user_agent: "Avalanche Data extractor (ross.palomaki@gmail.com)".into(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into(),
            referer: "http://utahavalanchecenter.org".into(),
            connection: "keep-alive".into(),
        }
    }
}

impl Settings {
    /// Defaults, then `uac.toml` (or `path`), then `UAC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn validate(&self) -> Result<(), RunError> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| RunError::Config(format!("base_url {:?}: {}", self.base_url, e)))?;
        if self.pages == 0 {
            return Err(RunError::Config("pages must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(RunError::Config("timeout_secs must be at least 1".into()));
        }
        self.header_map()?;
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn header_map(&self) -> Result<HeaderMap, RunError> {
        let h = &self.headers;
        let pairs = [
            (header::ACCEPT_LANGUAGE, &h.accept_language),
            (header::USER_AGENT, &h.user_agent),
            (header::ACCEPT, &h.accept),
            (header::REFERER, &h.referer),
            (header::CONNECTION, &h.connection),
        ];

        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            let value = HeaderValue::from_str(value)
                .map_err(|_| RunError::Config(format!("header {} has an invalid value", name)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_uac_site() {
        let s = Settings::default();
        assert_eq!(s.pages, 38);
        assert_eq!(s.delay(), Duration::from_secs(2));
        assert!(s.validate().is_ok());
        assert_eq!(s.header_map().unwrap().len(), 5);
    }

    #[test]
    fn zero_pages_is_fatal() {
        let s = Settings {
            pages: 0,
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(RunError::Config(_))));
    }

    #[test]
    fn bad_base_url_is_fatal() {
        let s = Settings {
            base_url: "not a url".into(),
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(RunError::Config(_))));
    }

    #[test]
    fn header_with_newline_is_fatal() {
        let mut s = Settings::default();
        s.headers.user_agent = "bad\nagent".into();
        assert!(matches!(s.validate(), Err(RunError::Config(_))));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uac.toml");
        std::fs::write(
            &path,
            "pages = 3\ndelay_ms = 0\n\n[headers]\nuser_agent = \"test agent\"\n",
        )
        .unwrap();

        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.pages, 3);
        assert_eq!(s.delay_ms, 0);
        assert_eq!(s.headers.user_agent, "test agent");
        assert_eq!(s.headers.connection, "keep-alive");
        assert_eq!(s.base_url, "https://utahavalanchecenter.org");
    }
}
