//! Batch pipeline tests: checkpointing, retry, concurrency and interruption

use crate::support::{content_page, movie_url, orchestrator, series_url, Behavior, ScriptedSite};
use movie_harvester::config::parse_config;
use movie_harvester::crawler::build_orchestrator;
use movie_harvester::storage::{JsonFileStore, RecordStore, ScrapedRecord};
use movie_harvester::url::ContentType;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn saved(path: &Path) -> Vec<ScrapedRecord> {
    JsonFileStore::new(path).load().unwrap()
}

fn saved_urls(path: &Path) -> Vec<String> {
    saved(path).into_iter().map(|r| r.url).collect()
}

#[tokio::test]
async fn test_three_urls_two_batches() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let urls = vec![movie_url("a"), movie_url("b"), series_url("c")];

    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&urls);

    let state = orchestrator(&site, &output, 2, 2)
        .run(urls.clone())
        .await
        .unwrap();

    assert_eq!(state.total_urls, 3);
    assert_eq!(state.already_done, 0);
    assert_eq!(state.batches_total, 2);
    assert_eq!(state.batches_completed, 2);
    assert_eq!(state.newly_scraped, 3);
    assert_eq!(state.permanently_failed, 0);
    assert!(!state.interrupted);

    let records = saved(&output);
    assert_eq!(saved_urls(&output), urls);
    assert_eq!(records[2].content_type, ContentType::Series);
    assert_eq!(records[0].title.as_deref(), Some("a"));
    assert_eq!(records[0].genre.as_deref(), Some("Drama, War"));
    assert_eq!(site.active(), 0);
}

#[tokio::test]
async fn test_rerun_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let urls = vec![movie_url("a"), movie_url("b"), movie_url("c")];

    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&urls);
    orchestrator(&site, &output, 2, 2).run(urls.clone()).await.unwrap();
    let before = std::fs::read_to_string(&output).unwrap();
    let loads = site.total_loads();

    let state = orchestrator(&site, &output, 2, 2).run(urls).await.unwrap();

    assert!(state.is_noop());
    assert_eq!(state.already_done, 3);
    assert_eq!(state.newly_scraped, 0);
    assert_eq!(site.total_loads(), loads);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), before);
}

#[tokio::test]
async fn test_duplicate_input_urls_scraped_once() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&[movie_url("a")]);

    let state = orchestrator(&site, &output, 10, 2)
        .run(vec![movie_url("a"), movie_url("a")])
        .await
        .unwrap();

    assert_eq!(state.total_urls, 1);
    assert_eq!(site.loads_of(&movie_url("a")), 1);
    assert_eq!(saved(&output).len(), 1);
}

#[tokio::test]
async fn test_failed_url_recovered_by_retry() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let urls = vec![movie_url("a"), movie_url("b"), movie_url("c")];

    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&urls);
    site.set(&movie_url("b"), Behavior::FlakyThenServe(1, content_page("b")));

    let state = orchestrator(&site, &output, 3, 3).run(urls.clone()).await.unwrap();

    assert_eq!(state.retried, 1);
    assert_eq!(state.recovered, 1);
    assert_eq!(state.permanently_failed, 0);
    assert_eq!(site.loads_of(&movie_url("b")), 2);
    // Retry-pass successes are committed after the batch's first-pass successes
    assert_eq!(
        saved_urls(&output),
        vec![movie_url("a"), movie_url("c"), movie_url("b")]
    );
}

#[tokio::test]
async fn test_retry_recovery_across_two_batches() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let urls = vec![movie_url("a"), movie_url("b"), movie_url("c")];

    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&urls);
    site.set(&movie_url("a"), Behavior::FlakyThenServe(1, content_page("a")));

    let state = orchestrator(&site, &output, 2, 2).run(urls.clone()).await.unwrap();

    assert_eq!(state.batches_total, 2);
    assert_eq!(state.batches_completed, 2);
    assert_eq!(state.newly_scraped, 3);
    assert_eq!(state.retried, 1);
    assert_eq!(state.recovered, 1);
    assert_eq!(state.permanently_failed, 0);
    assert_eq!(site.loads_of(&movie_url("a")), 2);
    assert_eq!(site.loads_of(&movie_url("c")), 1);

    let mut persisted = saved_urls(&output);
    persisted.sort();
    assert_eq!(persisted, urls);

    let loads = site.total_loads();
    let rerun = orchestrator(&site, &output, 2, 2).run(urls).await.unwrap();
    assert!(rerun.is_noop());
    assert_eq!(rerun.already_done, 3);
    assert_eq!(site.total_loads(), loads);
}

#[tokio::test]
async fn test_persistent_failure_skipped_and_retried_next_run() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let urls = vec![movie_url("a"), movie_url("b"), movie_url("c")];

    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&urls);
    site.set(&movie_url("b"), Behavior::AlwaysFail);

    let state = orchestrator(&site, &output, 3, 2).run(urls.clone()).await.unwrap();

    // Exactly one initial attempt plus one retry
    assert_eq!(site.loads_of(&movie_url("b")), 2);
    assert_eq!(state.permanently_failed, 1);
    assert_eq!(state.newly_scraped, 2);
    assert_eq!(saved_urls(&output), vec![movie_url("a"), movie_url("c")]);

    // The next run only revisits the skipped URL
    site.set(&movie_url("b"), Behavior::Serve(content_page("b")));
    let state = orchestrator(&site, &output, 3, 2).run(urls).await.unwrap();

    assert_eq!(state.already_done, 2);
    assert_eq!(state.newly_scraped, 1);
    assert_eq!(site.loads_of(&movie_url("a")), 1);
    assert_eq!(saved(&output).len(), 3);
}

#[tokio::test]
async fn test_missing_markers_fail_but_sparse_pages_succeed() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let blank = movie_url("blank");
    let sparse = movie_url("sparse");

    let site = Arc::new(ScriptedSite::new());
    site.set(&blank, Behavior::Serve("<html><body>Loading</body></html>".to_string()));
    site.set(
        &sparse,
        Behavior::Serve(r#"<h2 class="heading-name">Sparse</h2>"#.to_string()),
    );

    let state = orchestrator(&site, &output, 10, 2)
        .run(vec![blank.clone(), sparse.clone()])
        .await
        .unwrap();

    assert_eq!(state.permanently_failed, 1);
    let records = saved(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, sparse);
    assert_eq!(records[0].rating, None);
    assert_eq!(records[0].genre, None);
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let urls: Vec<String> = (0..24).map(|i| movie_url(&format!("m{}", i))).collect();

    let site = Arc::new(ScriptedSite::with_delay(Duration::from_millis(15)));
    site.serve_all(&urls);

    let state = orchestrator(&site, &output, 12, 3).run(urls).await.unwrap();

    assert_eq!(state.newly_scraped, 24);
    assert!(site.max_active() <= 3, "max active was {}", site.max_active());
    assert_eq!(site.active(), 0);
    assert_eq!(site.opened(), 24);
}

#[tokio::test]
async fn test_checkpoint_only_grows() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");

    // A record from an earlier run whose URL is no longer discovered
    let legacy = ScrapedRecord::new(movie_url("legacy"), ContentType::Movie);
    JsonFileStore::new(&output).save(&[legacy]).unwrap();

    let urls = vec![movie_url("a"), movie_url("b")];
    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&urls);

    let state = orchestrator(&site, &output, 1, 1).run(urls).await.unwrap();

    assert_eq!(state.persisted_total, 3);
    assert_eq!(
        saved_urls(&output),
        vec![movie_url("legacy"), movie_url("a"), movie_url("b")]
    );
}

#[tokio::test]
async fn test_interrupt_keeps_completed_batches_only() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");
    let urls = vec![movie_url("a"), movie_url("b"), movie_url("c")];

    let site = Arc::new(ScriptedSite::new());
    site.serve_all(&urls);
    site.set(&movie_url("b"), Behavior::Stall);

    let shutdown = tokio::time::sleep(Duration::from_millis(300));
    let state = orchestrator(&site, &output, 1, 2)
        .run_until(urls.clone(), shutdown)
        .await
        .unwrap();

    assert!(state.interrupted);
    assert_eq!(state.batches_completed, 1);
    assert_eq!(saved_urls(&output), vec![movie_url("a")]);
    assert_eq!(site.loads_of(&movie_url("c")), 0);

    // Aborted tasks are dropped the next time the runtime polls them
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(site.active(), 0);

    // Resuming picks up exactly where the last durable batch left off
    site.set(&movie_url("b"), Behavior::Serve(content_page("b")));
    let state = orchestrator(&site, &output, 1, 2).run(urls.clone()).await.unwrap();

    assert_eq!(state.already_done, 1);
    assert_eq!(state.newly_scraped, 2);
    assert_eq!(saved_urls(&output), urls);
}

#[tokio::test]
async fn test_http_pipeline_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("scraped.json");

    Mock::given(method("GET"))
        .and(path("/movie/heat-1995"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content_page("Heat")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let toml = format!(
        r#"
[site]
base-url = "{base}"

[scraper]
batch-size = 10
concurrency = 2
pacing-min-ms = 0
pacing-max-ms = 0
page-timeout-secs = 5
marker-wait-secs = 5

[output]
scraped-path = "{output}"
url-cache-path = "{cache}"
"#,
        base = server.uri(),
        output = output.display(),
        cache = dir.path().join("urls.json").display(),
    );
    let config = parse_config(&toml).unwrap();

    let urls = vec![
        format!("{}/movie/heat-1995", server.uri()),
        format!("{}/tv/gone", server.uri()),
    ];
    let state = build_orchestrator(&config).unwrap().run(urls).await.unwrap();

    assert_eq!(state.newly_scraped, 1);
    assert_eq!(state.permanently_failed, 1);

    let records = saved(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Heat"));
    assert_eq!(
        records[0].image_url.as_deref(),
        Some(format!("{}/poster/Heat.jpg", server.uri()).as_str())
    );
}
