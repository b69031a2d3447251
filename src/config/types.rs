use crate::harvest::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Dex-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Resolves the index page URL from the site section
    pub fn index_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.site.base_url)?.join(&self.site.index_path)
    }
}

/// Pipeline behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Number of pool workers fetching pages in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How many times a transient failure is retried before giving up
    #[serde(rename = "retry-limit", default = "default_retry_limit")]
    pub retry_limit: u32,

    /// First retry delay; doubles on every further attempt (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single retry delay (milliseconds)
    #[serde(rename = "backoff-max-ms", default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Pause each worker takes before every request (milliseconds)
    #[serde(rename = "request-delay-ms", default)]
    pub request_delay_ms: u64,

    /// Deadline for the whole page pool (milliseconds)
    #[serde(rename = "overall-deadline-ms", default)]
    pub overall_deadline_ms: Option<u64>,

    /// Maximum redirects followed per request
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u32,
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn overall_deadline(&self) -> Option<Duration> {
        self.overall_deadline_ms.map(Duration::from_millis)
    }

    /// `None` when no inter-request delay is configured
    pub fn request_delay(&self) -> Option<Duration> {
        (self.request_delay_ms > 0).then(|| Duration::from_millis(self.request_delay_ms))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            limit: self.retry_limit,
            base_backoff: Duration::from_millis(self.backoff_base_ms),
            max_backoff: Duration::from_millis(self.backoff_max_ms),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_limit: default_retry_limit(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            request_delay_ms: 0,
            overall_deadline_ms: None,
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_concurrency() -> u32 {
    8
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_retry_limit() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_max_redirects() -> u32 {
    10
}

/// User agent identification configuration
///
/// The target site's access policy requires an identifying user agent.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the scraper
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the scraper
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header as `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Target site location
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host of the reference site
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path (relative to `base-url`) of the catalog index page
    #[serde(rename = "index-path")]
    pub index_path: String,
}

/// CSS selectors describing the site's markup
///
/// Every field has a default matching the current species page layout, so a
/// config file only needs to override what drifted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectorConfig {
    /// One element per catalog row on the index page
    #[serde(rename = "index-row")]
    pub index_row: String,

    /// Anchor inside an index row; the first match is taken
    #[serde(rename = "index-link")]
    pub index_link: String,

    /// Element(s) holding the catalog number in the page summary
    #[serde(rename = "catalog-id")]
    pub catalog_id: String,

    /// Main content region
    #[serde(rename = "content-region")]
    pub content_region: String,

    /// Heading inside the content region holding the entity name
    pub heading: String,

    /// Entries of the category tag list, in display order
    #[serde(rename = "category-tag")]
    pub category_tag: String,

    /// Table holding the metric cells
    #[serde(rename = "metrics-table")]
    pub metrics_table: String,

    /// Numeric cells inside the metrics table, in display order
    #[serde(rename = "metrics-cell")]
    pub metrics_cell: String,

    /// Annotation carrying the generation number
    pub generation: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            index_row: "table.catalog-index tr".to_string(),
            index_link: "a[href]".to_string(),
            catalog_id: ".infobox .catalog-number".to_string(),
            content_region: "#content".to_string(),
            heading: "h1".to_string(),
            category_tag: ".infobox .category-list .category-tag".to_string(),
            metrics_table: "table.stat-table".to_string(),
            metrics_cell: "td.stat-value".to_string(),
            generation: ".infobox .generation-note".to_string(),
        }
    }
}
