//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full collect → fetch → parse → aggregate cycle end-to-end.

use dex_harvest::config::{Config, ScraperConfig, SelectorConfig, SiteConfig, UserAgentConfig};
use dex_harvest::harvest::{
    run_harvest, FailureKind, FetchOptions, Harvester, HttpFetcher, PageFetcher,
};
use dex_harvest::model::{FetchOutcome, DEADLINE_EXCEEDED};
use dex_harvest::output::write_json;
use dex_harvest::{FetchErrorKind, HarvestError};
use std::time::Duration;
use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_HTML: &str = include_str!("../fixtures/index.html");
const CHARIZARD_HTML: &str = include_str!("../fixtures/charizard.html");
const CLOBBOPUS_HTML: &str = include_str!("../fixtures/clobbopus.html");

const INDEX_PATH: &str = "/wiki/List";
const CHARIZARD_PATH: &str = "/wiki/Charizard_(Pok%C3%A9mon)";
const CLOBBOPUS_PATH: &str = "/wiki/Clobbopus_(Pok%C3%A9mon)";
const USER_AGENT: &str = "TestHarvester/1.0 (+https://example.com/about; admin@example.com)";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        scraper: ScraperConfig {
            concurrency: 4,
            request_timeout_ms: 5_000,
            retry_limit: 2,
            backoff_base_ms: 10, // Very short for testing
            backoff_max_ms: 50,
            request_delay_ms: 0,
            overall_deadline_ms: None,
            max_redirects: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        },
        site: SiteConfig {
            base_url: base_url.to_string(),
            index_path: INDEX_PATH.to_string(),
        },
        selectors: SelectorConfig::default(),
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn index_with_links(links: &[&str]) -> String {
    let rows: String = links
        .iter()
        .map(|link| format!(r#"<tr><td><a href="{}">entry</a></td></tr>"#, link))
        .collect();
    format!(
        r#"<html><body><table class="catalog-index"><tr><th>Name</th></tr>{}</table></body></html>"#,
        rows
    )
}

#[tokio::test]
async fn test_full_harvest() {
    let mock_server = MockServer::start().await;

    // Every request must carry the identifying user agent
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(header("user-agent", USER_AGENT))
        .respond_with(html(INDEX_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(CHARIZARD_PATH))
        .and(header("user-agent", USER_AGENT))
        .respond_with(html(CHARIZARD_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(CLOBBOPUS_PATH))
        .and(header("user-agent", USER_AGENT))
        .respond_with(html(CLOBBOPUS_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_harvest(create_test_config(&mock_server.uri()))
        .await
        .expect("Harvest should succeed");

    // The duplicate Charizard row and the tracking query collapse away
    assert_eq!(report.urls_discovered, 2);
    assert!(report.harvest.is_complete(), "{:?}", report.harvest.failures);

    let ids: Vec<u32> = report.harvest.records.iter().map(|r| r.catalog_id).collect();
    assert_eq!(ids, vec![6, 852]);

    let charizard = report.harvest.record(6).unwrap();
    assert_eq!(charizard.name, "Charizard");
    assert_eq!(charizard.primary_category, "Fire");
    assert_eq!(charizard.secondary_category.as_deref(), Some("Flying"));
    assert_eq!(charizard.metrics.total(), 534);
    assert_eq!(charizard.generation_tag, 1);

    let clobbopus = report.harvest.record(852).unwrap();
    assert_eq!(clobbopus.name, "Clobbopus");
    assert_eq!(clobbopus.secondary_category, None);
    assert_eq!(clobbopus.generation_tag, 8);
    assert!(report.harvest.data_quality_warnings().is_empty());
}

#[tokio::test]
async fn test_harvest_json_export() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, INDEX_PATH, INDEX_HTML).await;
    mount_page(&mock_server, CHARIZARD_PATH, CHARIZARD_HTML).await;
    mount_page(&mock_server, CLOBBOPUS_PATH, CLOBBOPUS_HTML).await;

    let report = run_harvest(create_test_config(&mock_server.uri()))
        .await
        .unwrap();

    let file = NamedTempFile::new().unwrap();
    write_json(&report, file.path()).unwrap();

    let content = std::fs::read_to_string(file.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 2);
    assert_eq!(json["failures"].as_array().unwrap().len(), 0);
    assert_eq!(json["urls_discovered"], 2);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, INDEX_PATH, INDEX_HTML).await;
    mount_page(&mock_server, CHARIZARD_PATH, CHARIZARD_HTML).await;

    // First attempt fails with 503, the retry succeeds
    Mock::given(method("GET"))
        .and(path(CLOBBOPUS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(CLOBBOPUS_PATH))
        .respond_with(html(CLOBBOPUS_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_harvest(create_test_config(&mock_server.uri()))
        .await
        .unwrap();

    assert!(report.harvest.is_complete());
    assert_eq!(report.harvest.records.len(), 2);
}

#[tokio::test]
async fn test_transient_failure_exhausts_retries() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, INDEX_PATH, INDEX_HTML).await;
    mount_page(&mock_server, CHARIZARD_PATH, CHARIZARD_HTML).await;

    // retry_limit = 2 means three attempts in total
    Mock::given(method("GET"))
        .and(path(CLOBBOPUS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let report = run_harvest(create_test_config(&mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.harvest.records.len(), 1);
    assert_eq!(report.harvest.failures.len(), 1);

    let failure = &report.harvest.failures[0];
    assert_eq!(failure.url.path(), CLOBBOPUS_PATH);
    assert_eq!(failure.kind, FailureKind::TransientFetch);
    assert!(failure.reason.contains("503"));
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, INDEX_PATH, INDEX_HTML).await;
    mount_page(&mock_server, CHARIZARD_PATH, CHARIZARD_HTML).await;

    Mock::given(method("GET"))
        .and(path(CLOBBOPUS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_harvest(create_test_config(&mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.harvest.records.len(), 1);
    assert_eq!(report.harvest.failures.len(), 1);
    assert_eq!(report.harvest.failures[0].kind, FailureKind::PermanentFetch);
    assert!(report.harvest.failures[0].reason.contains("404"));
}

#[tokio::test]
async fn test_missing_metrics_is_parse_failure() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, INDEX_PATH, INDEX_HTML).await;
    mount_page(&mock_server, CHARIZARD_PATH, CHARIZARD_HTML).await;
    mount_page(
        &mock_server,
        CLOBBOPUS_PATH,
        &CLOBBOPUS_HTML.replace("stat-table", "other-table"),
    )
    .await;

    let report = run_harvest(create_test_config(&mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.harvest.records.len(), 1);
    assert_eq!(report.harvest.records[0].catalog_id, 6);
    assert_eq!(report.harvest.failures.len(), 1);
    assert_eq!(
        report.harvest.failures[0].kind,
        FailureKind::Parse { field: "metrics" }
    );
}

#[tokio::test]
async fn test_duplicate_catalog_id_keeps_smallest_url() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        INDEX_PATH,
        &index_with_links(&["/wiki/Charizard_B", "/wiki/Charizard_A"]),
    )
    .await;
    mount_page(&mock_server, "/wiki/Charizard_A", CHARIZARD_HTML).await;
    mount_page(&mock_server, "/wiki/Charizard_B", CHARIZARD_HTML).await;

    let report = run_harvest(create_test_config(&mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(report.urls_discovered, 2);
    assert_eq!(report.harvest.records.len(), 1);
    assert_eq!(report.harvest.records[0].catalog_id, 6);

    assert_eq!(report.harvest.failures.len(), 1);
    let failure = &report.harvest.failures[0];
    assert_eq!(failure.url.path(), "/wiki/Charizard_B");
    assert_eq!(failure.kind, FailureKind::DuplicateCatalogId);
}

#[tokio::test]
async fn test_empty_index_aborts_run() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, INDEX_PATH, &index_with_links(&[])).await;

    let result = run_harvest(create_test_config(&mock_server.uri())).await;
    assert!(matches!(result, Err(HarvestError::EmptyResult { .. })));
}

#[tokio::test]
async fn test_unreachable_index_aborts_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = run_harvest(create_test_config(&mock_server.uri())).await;
    match result {
        Err(HarvestError::Fetch { kind, reason, .. }) => {
            assert_eq!(kind, FetchErrorKind::Transient);
            assert!(reason.contains("500"));
        }
        other => panic!("expected index fetch failure, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_missing_index_is_permanent() {
    let mock_server = MockServer::start().await;

    let result = run_harvest(create_test_config(&mock_server.uri())).await;
    assert!(matches!(
        result,
        Err(HarvestError::Fetch {
            kind: FetchErrorKind::Permanent,
            ..
        })
    ));
}

#[tokio::test]
async fn test_overall_deadline_reports_unfinished_pages() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, INDEX_PATH, INDEX_HTML).await;
    mount_page(&mock_server, CHARIZARD_PATH, CHARIZARD_HTML).await;

    Mock::given(method("GET"))
        .and(path(CLOBBOPUS_PATH))
        .respond_with(html(CLOBBOPUS_HTML).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.scraper.overall_deadline_ms = Some(1_000);

    let harvester = Harvester::new(config).unwrap();
    let report = harvester.run().await.unwrap();

    assert_eq!(report.urls_discovered, 2);
    assert_eq!(report.harvest.records.len(), 1);
    assert_eq!(report.harvest.records[0].catalog_id, 6);

    assert_eq!(report.harvest.failures.len(), 1);
    let failure = &report.harvest.failures[0];
    assert_eq!(failure.url.path(), CLOBBOPUS_PATH);
    assert_eq!(failure.kind, FailureKind::TransientFetch);
    assert_eq!(failure.reason, DEADLINE_EXCEEDED);
}

fn fetch_options(request_timeout: Duration, max_redirects: usize) -> FetchOptions {
    FetchOptions {
        request_timeout,
        user_agent: USER_AGENT.to_string(),
        max_redirects,
    }
}

#[tokio::test]
async fn test_slow_response_is_transient_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Slowpoke"))
        .respond_with(html("<html></html>").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&fetch_options(Duration::from_millis(300), 5)).unwrap();
    let url = url::Url::parse(&format!("{}/wiki/Slowpoke", mock_server.uri())).unwrap();

    let outcome = fetcher.fetch(&url).await;
    assert_eq!(
        outcome,
        FetchOutcome::TransientFailure("request timeout".to_string())
    );
}

#[tokio::test]
async fn test_redirect_loop_is_permanent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&fetch_options(Duration::from_secs(5), 2)).unwrap();
    let url = url::Url::parse(&format!("{}/loop", mock_server.uri())).unwrap();

    match fetcher.fetch(&url).await {
        FetchOutcome::PermanentFailure(reason) => assert!(reason.starts_with("redirect error")),
        other => panic!("expected permanent redirect failure, got {:?}", other),
    }
}
