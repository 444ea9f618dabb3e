//! Configuration.
//!
//! Loaded from an optional TOML file at
//! `<config_dir>/sekolah-berita/config.toml`; every field has a default, so
//! a missing file is the same as an empty one.  The two upstream base URLs
//! may additionally be overridden from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::store::school::PER_PAGE_OPTIONS;

pub const DEFAULT_SCHOOL_ENDPOINT: &str = "https://api-sekolah-indonesia.vercel.app/sekolah";
pub const DEFAULT_NEWS_ENDPOINT: &str = "https://api-berita-indonesia.vercel.app";

/// Overrides [`Config::school_endpoint`].
pub const SCHOOL_URL_ENV: &str = "SEKOLAH_BERITA_SCHOOL_URL";
/// Overrides [`Config::news_endpoint`].
pub const NEWS_URL_ENV: &str = "SEKOLAH_BERITA_NEWS_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the school directory listing.
    pub school_endpoint: String,
    /// Base URL of the news aggregator.
    pub news_endpoint: String,
    /// Initial page size; must be one of the selector's options.
    pub per_page: u32,
    pub request_timeout_secs: u64,
    /// Drop school responses that were superseded by a newer request.
    pub discard_stale_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            school_endpoint: DEFAULT_SCHOOL_ENDPOINT.to_string(),
            news_endpoint: DEFAULT_NEWS_ENDPOINT.to_string(),
            per_page: PER_PAGE_OPTIONS[0],
            request_timeout_secs: 15,
            discard_stale_responses: false,
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("sekolah-berita").join("config.toml")
    }

    /// Load the default config file, apply environment overrides, validate.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::read(&Self::config_path())?.with_endpoint_overrides(
            std::env::var(SCHOOL_URL_ENV).ok(),
            std::env::var(NEWS_URL_ENV).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a specific file.  A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Replace the base URLs with any non-empty override.
    pub fn with_endpoint_overrides(mut self, school: Option<String>, news: Option<String>) -> Self {
        if let Some(url) = school.filter(|u| !u.trim().is_empty()) {
            self.school_endpoint = url;
        }
        if let Some(url) = news.filter(|u| !u.trim().is_empty()) {
            self.news_endpoint = url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.school_url()?;
        self.news_url()?;

        if !PER_PAGE_OPTIONS.contains(&self.per_page) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "per_page must be one of {:?}, got {}",
                    PER_PAGE_OPTIONS, self.per_page
                ),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn school_url(&self) -> Result<Url, ConfigError> {
        parse_endpoint("school_endpoint", &self.school_endpoint)
    }

    pub fn news_url(&self) -> Result<Url, ConfigError> {
        parse_endpoint("news_endpoint", &self.news_endpoint)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_endpoint(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::ValidationError {
        message: format!("{field} '{raw}' is not a valid URL: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::ValidationError {
            message: format!("{field} '{raw}' must be an http(s) URL"),
        });
    }
    Ok(url)
}
