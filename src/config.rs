//! Configuration types for kb-export
//!
//! Configuration is assembled once before a run starts and never changes
//! while the engine is running. [`Config::from_env`] covers the environment
//! variables the exporter has always used (`ACCESS_TOKEN`, `DOMAIN`,
//! `ASSET_REGEXP`, ...); the binary layers command-line flags on top.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Largest page size the listing endpoint accepts
pub const MAX_PER_PAGE: u32 = 100;

/// Remote API connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Team domain, e.g. "example.qiita.com"
    pub domain: String,

    /// Personal access token sent as a bearer token
    pub access_token: String,

    /// Override for the API base URL (default: "https://{domain}/api/v2")
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_ms")]
    pub timeout: Duration,
}

impl ApiConfig {
    /// Base URL every API path is appended to
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}/api/v2", self.domain),
        }
    }

    /// Scheme and host that asset URLs live under
    pub fn origin(&self) -> String {
        if !self.domain.trim().is_empty() {
            return format!("https://{}", self.domain.trim());
        }
        url::Url::parse(&self.base_url())
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_default()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            access_token: String::new(),
            base_url: None,
            timeout: default_request_timeout(),
        }
    }
}

/// Where and how articles are exported
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root of the exported tree (default: "output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// First page to request (default: 1)
    #[serde(default = "default_start_page")]
    pub start_page: u32,

    /// Articles per page (default: 100, the API maximum)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Free-text search filter passed through to the listing endpoint
    #[serde(default)]
    pub query: Option<String>,

    /// Pause between listing pages (default: 0)
    #[serde(default, with = "duration_ms")]
    pub page_delay: Duration,

    /// Pause between comment-reaction requests (default: 1 ms)
    #[serde(default = "default_comment_delay", with = "duration_ms")]
    pub comment_delay: Duration,

    /// Pause after each asset download (default: 100 ms)
    ///
    /// Asset hosting answers 403 quickly under burst load, so this is kept
    /// much longer than the comment delay.
    #[serde(default = "default_asset_delay", with = "duration_ms")]
    pub asset_delay: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            start_page: default_start_page(),
            per_page: default_per_page(),
            query: None,
            page_delay: Duration::ZERO,
            comment_delay: default_comment_delay(),
            asset_delay: default_asset_delay(),
        }
    }
}

/// Built-in asset URL patterns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetPreset {
    /// Any path under the team host ending in a known binary extension
    #[default]
    BinaryExtensions,
    /// Files under the dedicated `/files/` attachment path
    AttachmentFiles,
}

/// Asset URL extraction settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Custom regular expression; takes precedence over `preset`
    #[serde(default)]
    pub pattern: Option<String>,

    /// Pattern used when no custom expression is set
    #[serde(default)]
    pub preset: AssetPreset,
}

/// Retry configuration for listing page fetches
///
/// The defaults reproduce a fixed five-second wait between five attempts:
/// page failures are expected to be transient rate limiting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 5 seconds)
    #[serde(default = "default_initial_delay", with = "duration_ms")]
    pub initial_delay: Duration,

    /// Upper bound for the delay between attempts (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each failure (default: 1.0, fixed delay)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Main configuration for an export run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    pub api: ApiConfig,

    /// Output layout and pacing
    #[serde(default)]
    pub export: ExportConfig,

    /// Asset URL extraction
    #[serde(default)]
    pub assets: AssetConfig,

    /// Page fetch retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Build a configuration from environment variables
    ///
    /// Required: `ACCESS_TOKEN`, `DOMAIN`.
    /// Optional: `ASSET_REGEXP`, `API_BASE_URL`, `OUTPUT_DIR`, `START_PAGE`,
    /// `PER_PAGE`, `QUERY`.
    ///
    /// Loading a `.env` file is left to the caller.
    pub fn from_env() -> Result<Self> {
        let mut config = Config {
            api: ApiConfig {
                domain: env_var("DOMAIN").unwrap_or_default(),
                access_token: env_var("ACCESS_TOKEN").unwrap_or_default(),
                base_url: env_var("API_BASE_URL"),
                ..ApiConfig::default()
            },
            ..Config::default()
        };

        config.assets.pattern = env_var("ASSET_REGEXP");
        config.export.query = env_var("QUERY");
        if let Some(dir) = env_var("OUTPUT_DIR") {
            config.export.output_dir = PathBuf::from(dir);
        }
        if let Some(page) = env_var("START_PAGE") {
            config.export.start_page = parse_number("START_PAGE", &page)?;
        }
        if let Some(per_page) = env_var("PER_PAGE") {
            config.export.per_page = parse_number("PER_PAGE", &per_page)?;
        }

        Ok(config)
    }

    /// Check the configuration before a run starts
    pub fn validate(&self) -> Result<()> {
        if self.api.access_token.trim().is_empty() {
            return Err(Error::config("ACCESS_TOKEN", "access token is required"));
        }
        if self.api.domain.trim().is_empty() && self.api.base_url.is_none() {
            return Err(Error::config("DOMAIN", "domain is required"));
        }
        if self.export.start_page == 0 {
            return Err(Error::config("start_page", "pages are numbered from 1"));
        }
        if self.export.per_page == 0 || self.export.per_page > MAX_PER_PAGE {
            return Err(Error::config(
                "per_page",
                format!("per_page must be between 1 and {MAX_PER_PAGE}"),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("max_attempts", "at least one attempt is required"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "backoff_multiplier",
                "backoff multiplier must be at least 1.0",
            ));
        }
        if let Some(pattern) = &self.assets.pattern {
            regex::Regex::new(pattern)
                .map_err(|e| Error::config("ASSET_REGEXP", format!("invalid pattern: {e}")))?;
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(key, format!("expected a positive integer, got '{value}'")))
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_start_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    MAX_PER_PAGE
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_comment_delay() -> Duration {
    Duration::from_millis(1)
}

fn default_asset_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

// Durations are stored as integer milliseconds; the pacing delays are too
// fine-grained for whole seconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
