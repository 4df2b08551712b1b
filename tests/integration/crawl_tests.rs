//! Integration tests for the crawl pipeline
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch → parse → frontier loop end-to-end, stopping it through the same
//! shutdown path a termination signal takes.

use loopcrawl::config::Config;
use loopcrawl::crawler::{initial_frontier, run_crawl, CrawlContext};
use loopcrawl::storage::{CheckpointStore, StorageError};
use loopcrawl::{CrawlError, FrontierState};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing everything below `dir`
fn create_test_config(seed: String, dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = seed;
    config.crawler.request_channel_capacity = 1;
    config.crawler.request_timeout_secs = 5;
    config.crawler.fetch_workers = 1;
    config.crawler.parse_workers = 1;
    config.output.content_dir = dir.join("content").display().to_string();
    config.output.checkpoint_path = dir.join("state.json").display().to_string();
    config.output.history_path = dir.join("history.log").display().to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn history_urls(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).expect("history line");
            record["url"].as_str().expect("url field").to_string()
        })
        .collect()
}

/// Shutdown trigger that fires once the history log holds `records` lines
async fn after_history_records(path: PathBuf, records: usize) {
    let deadline = Instant::now() + Duration::from_secs(15);
    loop {
        let written = std::fs::read_to_string(&path)
            .map(|log| log.matches('\n').count())
            .unwrap_or(0);
        if written >= records || Instant::now() > deadline {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"Home <a href="/page1">One</a> <a href="page2#intro">Two</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/page1",
        html(r#"Page one <a href="/">Home</a> <a href="/page2">Two</a>"#),
    )
    .await;
    mount_page(&server, "/page2", html("Page two")).await;

    let config = create_test_config(format!("{}/", base), dir.path());
    let context = CrawlContext::open(&config.output).unwrap();
    let history = dir.path().join("history.log");

    let state = run_crawl(
        config,
        context,
        false,
        after_history_records(history.clone(), 3),
    )
    .await
    .expect("Crawl failed");

    // Breadth-first: the seed, then its links in document order
    assert_eq!(
        history_urls(&history),
        vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page2", base),
        ]
    );

    assert!(state.is_empty());
    assert_eq!(state.seen_len(), 3);
    assert!(state.has_seen(&format!("{}/page2", base)));

    // Raw content mirrored under host/path
    let host_dir = dir.path().join("content").join("127.0.0.1");
    assert!(host_dir.join("__default").is_file());
    assert!(host_dir.join("page1").is_file());
    let page2 = std::fs::read_to_string(host_dir.join("page2")).unwrap();
    assert!(page2.contains("Page two"));

    // The returned state is what was checkpointed
    let saved = CheckpointStore::new(dir.path().join("state.json"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(saved, state);
}

#[tokio::test]
async fn test_resume_after_shutdown_repeats_nothing_and_loses_only_in_flight() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links))
        .expect(1)
        .mount(&server)
        .await;
    for i in 1..=5 {
        mount_page(
            &server,
            &format!("/p{}", i),
            html(r#"<a href="/">Home</a>"#).set_delay(Duration::from_millis(300)),
        )
        .await;
    }

    let history = dir.path().join("history.log");
    let config = create_test_config(format!("{}/", base), dir.path());

    // First run: stop as soon as the seed page has been merged
    let context = CrawlContext::open(&config.output).unwrap();
    let first = run_crawl(
        config.clone(),
        context,
        false,
        after_history_records(history.clone(), 1),
    )
    .await
    .expect("First run failed");

    // The single fetch worker may be holding one slow page; every other link,
    // including requests still buffered in the request channel, is resumed
    let all_pages: Vec<String> = (1..=5).map(|i| format!("{}/p{}", base, i)).collect();
    let waiting: Vec<String> = first.waiting().map(str::to_string).collect();
    assert_eq!(first.seen_len(), 6);
    assert!(waiting.len() >= all_pages.len() - 1, "waiting: {:?}", waiting);
    assert!(all_pages.ends_with(&waiting));
    let first_run_records = history_urls(&history).len();

    // Second run resumes from the checkpoint
    let context = CrawlContext::open(&config.output).unwrap();
    let second = run_crawl(
        config,
        context,
        false,
        after_history_records(history.clone(), first_run_records + waiting.len()),
    )
    .await
    .expect("Second run failed");

    let records = history_urls(&history);
    assert_eq!(records[first_run_records..], waiting[..]);
    assert!(second.is_empty());
    assert_eq!(second.seen_len(), 6);
}

#[tokio::test]
async fn test_failed_fetch_is_dropped_but_stays_seen() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    // Nothing listens on the discard port, so that fetch fails in transport
    let dead = "http://127.0.0.1:9/dead".to_string();
    mount_page(
        &server,
        "/",
        html(&format!(r#"<a href="{}">Dead</a> <a href="/alive">Alive</a>"#, dead)),
    )
    .await;
    mount_page(&server, "/alive", html("Still here")).await;

    let history = dir.path().join("history.log");
    let config = create_test_config(format!("{}/", base), dir.path());
    let context = CrawlContext::open(&config.output).unwrap();

    let state = run_crawl(config, context, false, after_history_records(history.clone(), 2))
        .await
        .expect("Crawl failed");

    let records = history_urls(&history);
    assert_eq!(records, vec![format!("{}/", base), format!("{}/alive", base)]);
    assert!(state.has_seen(&dead));
    assert!(state.waiting().all(|url| url != dead));
}

#[tokio::test]
async fn test_malformed_document_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/binary">Blob</a> <a href="/ok">Ok</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/binary",
        ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0x00, 0xc3]),
    )
    .await;
    mount_page(&server, "/ok", html("fine")).await;

    let history = dir.path().join("history.log");
    let config = create_test_config(format!("{}/", base), dir.path());
    let context = CrawlContext::open(&config.output).unwrap();

    run_crawl(config, context, false, after_history_records(history.clone(), 2))
        .await
        .expect("Crawl should survive a malformed document");

    assert_eq!(
        history_urls(&history),
        vec![format!("{}/", base), format!("{}/ok", base)]
    );
    // Content is stored before parsing, so the bad page is still on disk
    assert!(dir
        .path()
        .join("content")
        .join("127.0.0.1")
        .join("binary")
        .is_file());
}

#[tokio::test]
async fn test_storage_failure_is_fatal_without_checkpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_page(&server, "/", html("hello")).await;

    let mut config = create_test_config(format!("{}/", server.uri()), dir.path());
    // A regular file where the content directory should be
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    config.output.content_dir = blocker.display().to_string();

    let context = CrawlContext::open(&config.output).unwrap();
    let result = run_crawl(config, context, false, std::future::pending::<()>()).await;

    assert!(matches!(result, Err(CrawlError::Storage(StorageError::Io { .. }))));
    assert!(!dir.path().join("state.json").exists());
}

#[tokio::test]
async fn test_corrupt_checkpoint_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:9/".to_string(), dir.path());
    std::fs::write(&config.output.checkpoint_path, b"not json").unwrap();

    let context = CrawlContext::open(&config.output).unwrap();
    let result = run_crawl(config, context, false, std::future::pending::<()>()).await;

    assert!(matches!(
        result,
        Err(CrawlError::Storage(StorageError::CorruptCheckpoint { .. }))
    ));
}

#[test]
fn test_initial_frontier_prefers_checkpoint_unless_fresh() {
    let dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(dir.path().join("state.json"));

    let seeded = initial_frontier("https://seed.example/", &store, false).unwrap();
    assert_eq!(seeded, FrontierState::seeded("https://seed.example/"));

    let mut saved = FrontierState::seeded("https://a.example/");
    saved.pop_next();
    saved.merge(["https://a.example/b", "https://a.example/c"]);
    store.save(&saved).unwrap();

    let resumed = initial_frontier("https://seed.example/", &store, false).unwrap();
    assert_eq!(resumed, saved);
    assert_eq!(resumed.peek_next(), Some("https://a.example/b"));

    let fresh = initial_frontier("https://seed.example/", &store, true).unwrap();
    assert_eq!(fresh.peek_next(), Some("https://seed.example/"));
    assert_eq!(fresh.seen_len(), 1);
}

/// Serves a response that promises more body than it sends, then hangs up
async fn truncated_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 100\r\n\r\n<html>cut",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/truncated", addr)
}

#[tokio::test]
async fn test_body_read_failure_is_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let truncated = truncated_body_server().await;

    mount_page(
        &server,
        "/",
        html(&format!(r#"<a href="{}">Cut</a> <a href="/alive">Alive</a>"#, truncated)),
    )
    .await;
    mount_page(&server, "/alive", html("Still here")).await;

    let history = dir.path().join("history.log");
    let config = create_test_config(format!("{}/", base), dir.path());
    let context = CrawlContext::open(&config.output).unwrap();

    let state = run_crawl(config, context, false, after_history_records(history.clone(), 2))
        .await
        .expect("Crawl should survive a truncated body");

    assert_eq!(
        history_urls(&history),
        vec![format!("{}/", base), format!("{}/alive", base)]
    );
    assert!(state.has_seen(&truncated));
    assert!(state.waiting().all(|url| url != truncated));
    // Nothing is stored for a page whose body never arrived
    assert!(!dir
        .path()
        .join("content")
        .join("127.0.0.1")
        .join("truncated")
        .exists());
}

#[tokio::test]
async fn test_request_timeout_drops_slow_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        html(r#"<a href="/slow">Slow</a> <a href="/fast">Fast</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/slow",
        html("too late").set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_page(&server, "/fast", html("on time")).await;

    let history = dir.path().join("history.log");
    let mut config = create_test_config(format!("{}/", base), dir.path());
    config.crawler.request_timeout_secs = 1;
    let context = CrawlContext::open(&config.output).unwrap();

    let state = run_crawl(config, context, false, after_history_records(history.clone(), 2))
        .await
        .expect("Crawl should survive a timed-out request");

    assert_eq!(
        history_urls(&history),
        vec![format!("{}/", base), format!("{}/fast", base)]
    );
    assert!(state.has_seen(&format!("{}/slow", base)));
    assert!(!dir
        .path()
        .join("content")
        .join("127.0.0.1")
        .join("slow")
        .exists());
}

#[tokio::test]
async fn test_error_status_page_is_stored_and_parsed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", html(r#"<a href="/missing">Missing</a>"#)).await;
    mount_page(
        &server,
        "/missing",
        ResponseTemplate::new(404)
            .set_body_string(r#"<html><body>Not found <a href="/found">Home</a></body></html>"#)
            .insert_header("content-type", "text/html"),
    )
    .await;
    mount_page(&server, "/found", html("Found it")).await;

    let history = dir.path().join("history.log");
    let config = create_test_config(format!("{}/", base), dir.path());
    let context = CrawlContext::open(&config.output).unwrap();

    let state = run_crawl(config, context, false, after_history_records(history.clone(), 3))
        .await
        .expect("Crawl failed");

    // The 404 page's link was followed
    assert_eq!(
        history_urls(&history),
        vec![
            format!("{}/", base),
            format!("{}/missing", base),
            format!("{}/found", base),
        ]
    );
    assert!(state.is_empty());

    let stored = std::fs::read_to_string(
        dir.path()
            .join("content")
            .join("127.0.0.1")
            .join("missing"),
    )
    .unwrap();
    assert!(stored.contains("Not found"));
}
