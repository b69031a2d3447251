use crate::config::types::{Config, ScraperConfig, SelectorConfig, SiteConfig, UserAgentConfig};
use crate::harvest::compile_selector;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_site_config(&config.site)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates pool, timeout and retry settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 128 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 128, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.retry_limit > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_limit must be <= 10, got {}",
            config.retry_limit
        )));
    }

    if config.backoff_max_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_max_ms ({}ms) must be >= backoff_base_ms ({}ms)",
            config.backoff_max_ms, config.backoff_base_ms
        )));
    }

    if config.overall_deadline_ms == Some(0) {
        return Err(ConfigError::Validation(
            "overall_deadline_ms must be > 0 when set".to_string(),
        ));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates the site location and the resolved index URL
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e))
    })?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if config.index_path.is_empty() {
        return Err(ConfigError::Validation(
            "index_path cannot be empty".to_string(),
        ));
    }

    base.join(&config.index_path).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid index_path '{}': {}", config.index_path, e))
    })?;

    Ok(())
}

/// Checks that every selector compiles
fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, css) in [
        ("index-row", &selectors.index_row),
        ("index-link", &selectors.index_link),
        ("catalog-id", &selectors.catalog_id),
        ("content-region", &selectors.content_region),
        ("heading", &selectors.heading),
        ("category-tag", &selectors.category_tag),
        ("metrics-table", &selectors.metrics_table),
        ("metrics-cell", &selectors.metrics_cell),
        ("generation", &selectors.generation),
    ] {
        compile_selector(name, css)?;
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Must contain exactly one @ with text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
