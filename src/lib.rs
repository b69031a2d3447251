//! Dex-Harvest: a concurrent species-page scraper
//!
//! This crate discovers the species pages listed on a single index page,
//! fetches them with a bounded worker pool, extracts a fixed record schema
//! from each page, and aggregates the results into a deterministic
//! collection plus an explicit failure list.

pub mod config;
pub mod harvest;
pub mod model;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Dex-Harvest operations
///
/// Only run-level failures surface here. Per-page failures are captured in
/// the harvest's failure list and never abort a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{kind} fetch failure for {url}: {reason}")]
    Fetch {
        url: String,
        kind: FetchErrorKind,
        reason: String,
    },

    #[error("Index page {url} yielded no catalog links")]
    EmptyResult { url: String },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether a fetch failure is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorKind {
    /// Connection errors, timeouts, 5xx and 429
    Transient,
    /// 4xx, malformed URLs, redirect limits
    Permanent,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "Transient"),
            Self::Permanent => write!(f, "Permanent"),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector for {name}: {message}")]
    InvalidSelector { name: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Dex-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{aggregate, run_harvest, Harvest, Harvester};
pub use model::{
    DataQualityWarning, FetchOutcome, Metrics, PageRecord, ParseFailure, ScrapeOutcome,
    ScrapeResult,
};
pub use url::canonicalize_url;
