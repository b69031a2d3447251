//! Harvest coordinator - main run orchestration logic
//!
//! This module wires the pipeline stages together for one run:
//! - Building the HTTP fetcher and page parser from configuration
//! - Collecting the catalog links from the index page
//! - Scheduling fetch → parse across the worker pool
//! - Aggregating results into the final harvest

use crate::config::Config;
use crate::harvest::{
    aggregate, FetchOptions, Harvest, HttpFetcher, LinkCollector, PageFetcher, PageParser,
    Scheduler, SchedulerConfig, SpeciesPageParser,
};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// A completed run: the harvest plus run metadata
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub index_url: Url,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Distinct catalog URLs found on the index page
    pub urls_discovered: usize,

    #[serde(flatten)]
    pub harvest: Harvest,
}

impl HarvestReport {
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Main harvest coordinator structure
pub struct Harvester {
    index_url: Url,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn PageParser>,
    collector: LinkCollector,
    scheduler: Scheduler,
}

impl Harvester {
    /// Creates a harvester that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Bad index URL, selectors, or HTTP client setup
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::new(&FetchOptions::from_config(&config))?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates a harvester around an existing fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, HarvestError> {
        let index_url = config.index_url()?;
        let parser = Arc::new(SpeciesPageParser::new(&config.selectors)?);
        let collector = LinkCollector::new(Arc::clone(&fetcher), &config.selectors)?
            .with_retry(config.scraper.retry_policy());
        let scheduler = Scheduler::new(SchedulerConfig::from_config(&config.scraper));

        Ok(Self {
            index_url,
            fetcher,
            parser,
            collector,
            scheduler,
        })
    }

    /// Replaces the page parser, e.g. after a site markup change
    pub fn with_parser(mut self, parser: Arc<dyn PageParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    /// Runs collect → schedule → aggregate
    ///
    /// Index failures (unreachable or empty index) abort the run before any
    /// page is fetched. Page failures never do; they end up in the
    /// harvest's failure list.
    pub async fn run(&self) -> Result<HarvestReport, HarvestError> {
        let started_at = Utc::now();
        tracing::info!("Starting harvest from {}", self.index_url);

        let urls = self.collector.collect(&self.index_url).await?;
        let urls_discovered = urls.len();

        let results = self
            .scheduler
            .run(urls, Arc::clone(&self.fetcher), Arc::clone(&self.parser))
            .await;
        let harvest = aggregate(results);

        let finished_at = Utc::now();
        tracing::info!(
            "Harvest completed: {} records, {} failures in {:.2}s",
            harvest.records.len(),
            harvest.failures.len(),
            (finished_at - started_at).num_milliseconds() as f64 / 1000.0
        );

        Ok(HarvestReport {
            index_url: self.index_url.clone(),
            started_at,
            finished_at,
            urls_discovered,
            harvest,
        })
    }
}

/// Runs a complete harvest with the HTTP fetcher
///
/// # Example
///
/// ```no_run
/// use dex_harvest::config::load_config;
/// use dex_harvest::harvest::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_harvest(config).await?;
/// println!("{} records", report.harvest.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<HarvestReport, HarvestError> {
    Harvester::new(config)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScraperConfig, SelectorConfig, SiteConfig, UserAgentConfig};
    use crate::model::{FetchOutcome, Metrics, PageRecord, ParseFailure};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const INDEX: &str = include_str!("../../tests/fixtures/index.html");
    const CHARIZARD: &str = include_str!("../../tests/fixtures/charizard.html");

    fn create_test_config() -> Config {
        Config {
            scraper: ScraperConfig {
                retry_limit: 0,
                ..ScraperConfig::default()
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestHarvester".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            site: SiteConfig {
                base_url: "https://bulbapedia.bulbagarden.net".to_string(),
                index_path: "/wiki/List".to_string(),
            },
            selectors: SelectorConfig::default(),
        }
    }

    /// Serves canned bodies by path; unknown paths are 404s
    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &Url) -> FetchOutcome {
            match self.0.get(url.path()) {
                Some(body) => FetchOutcome::Success(body.clone()),
                None => FetchOutcome::PermanentFailure("HTTP 404 Not Found".to_string()),
            }
        }
    }

    fn map_fetcher() -> Arc<dyn PageFetcher> {
        let mut pages = HashMap::new();
        pages.insert("/wiki/List".to_string(), INDEX.to_string());
        pages.insert(
            "/wiki/Charizard_(Pok%C3%A9mon)".to_string(),
            CHARIZARD.to_string(),
        );
        Arc::new(MapFetcher(pages))
    }

    #[tokio::test]
    async fn test_run_partial_harvest() {
        let harvester = Harvester::with_fetcher(create_test_config(), map_fetcher()).unwrap();
        let report = harvester.run().await.unwrap();

        assert_eq!(report.urls_discovered, 2);
        assert_eq!(report.harvest.records.len(), 1);
        assert_eq!(report.harvest.records[0].catalog_id, 6);
        assert_eq!(report.harvest.failures.len(), 1);
        assert_eq!(
            report.harvest.failures[0].url.path(),
            "/wiki/Clobbopus_(Pok%C3%A9mon)"
        );
        assert!(report.finished_at >= report.started_at);
    }

    struct FixedParser;

    impl PageParser for FixedParser {
        fn parse(&self, _raw: &str) -> Result<PageRecord, ParseFailure> {
            Ok(PageRecord {
                catalog_id: 151,
                name: "Mew".to_string(),
                primary_category: "Psychic".to_string(),
                secondary_category: None,
                metrics: Metrics::new([100, 100, 100, 100, 100, 100, 600]),
                generation_tag: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_with_parser_replaces_extractors() {
        let harvester = Harvester::with_fetcher(create_test_config(), map_fetcher())
            .unwrap()
            .with_parser(Arc::new(FixedParser));
        let report = harvester.run().await.unwrap();

        assert_eq!(report.harvest.records.len(), 1);
        assert_eq!(report.harvest.records[0].name, "Mew");
    }

    #[tokio::test]
    async fn test_missing_index_aborts_run() {
        let mut config = create_test_config();
        config.site.index_path = "/wiki/Nowhere".to_string();
        let harvester = Harvester::with_fetcher(config, map_fetcher()).unwrap();

        assert!(matches!(
            harvester.run().await,
            Err(HarvestError::Fetch { .. })
        ));
    }

    #[test]
    fn test_invalid_selectors_rejected() {
        let mut config = create_test_config();
        config.selectors.heading = "h1[".to_string();
        assert!(matches!(
            Harvester::with_fetcher(config, map_fetcher()),
            Err(HarvestError::Config(_))
        ));
    }
}
