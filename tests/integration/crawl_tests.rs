//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sumi_frontier::config::{Config, CrawlerConfig, OutputConfig, ScopeEntry, UserAgentConfig};
use sumi_frontier::crawler::{build_crawler, run_crawl};
use sumi_frontier::output::{export_csv, record_run};
use sumi_frontier::storage::{RunStatus, SqliteStorage, Storage};
use sumi_frontier::{ProcessError, SumiError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at `root`
fn create_test_config(root: &str, max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            root: root.to_string(),
            max_depth,
            max_concurrency: 4,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            csv_path: "./test_results.csv".to_string(),
            database_path: None,
        },
        scope: vec![],
    }
}

/// Mounts an HTML page at `route`
async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html"),
        )
        .mount(server)
        .await;
}

/// Serves a small site:
///
/// ```text
/// /       -> /about, /blog, /missing, external link
/// /about  -> /, /blog
/// /blog   -> /blog/post
/// /blog/post (leaf)
/// /missing (404)
/// ```
async fn start_site() -> MockServer {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/about">About</a>
            <a href="/blog/">Blog</a>
            <a href="/missing">Missing</a>
            <a href="https://external.example.org/page">Elsewhere</a>
            <a href="mailto:someone@example.com">Mail</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/about",
        r#"<html><body><a href="/">Home</a><a href="blog">Blog</a></body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/blog",
        r#"<html><body><a href="/blog/post#comments">Post</a></body></html>"#,
    )
    .await;
    mount_html(&server, "/blog/post", "<html><body>Leaf</body></html>").await;

    server
}

#[tokio::test]
async fn test_full_crawl_link_graph() {
    let server = start_site().await;
    let root = server.uri();
    let config = create_test_config(&root, 5);

    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.row_count, 5);

    let home = report.get(&root).unwrap();
    assert!(home.is_success());
    assert_eq!(home.item.depth, 0);
    assert_eq!(
        home.discovered,
        vec![
            format!("{}/about", root),
            format!("{}/blog", root),
            format!("{}/missing", root),
        ]
    );
    let outcome = home.outcome.as_ref().unwrap();
    assert_eq!(outcome.status_code, 200);
    assert_eq!(outcome.title.as_deref(), Some("Home"));

    let post = report.get(&format!("{}/blog/post", root)).unwrap();
    assert_eq!(post.item.depth, 2);
    assert_eq!(
        post.item.discovered_from.as_deref(),
        Some(format!("{}/blog", root).as_str())
    );
}

#[tokio::test]
async fn test_not_found_is_recorded() {
    let server = start_site().await;
    let root = server.uri();
    let config = create_test_config(&root, 5);

    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();

    let missing = report.get(&format!("{}/missing", root)).unwrap();
    assert_eq!(
        missing.error(),
        Some(&ProcessError::Protocol { status_code: 404 })
    );
    assert_eq!(missing.status_label(), "404");
    assert!(missing.discovered.is_empty());
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_out_of_scope_links_dropped() {
    let server = start_site().await;
    let root = server.uri();
    let config = create_test_config(&root, 5);

    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();

    assert!(report
        .results
        .iter()
        .all(|r| r.identifier().starts_with(&root)));
    assert!(report
        .results
        .iter()
        .flat_map(|r| r.discovered.iter())
        .all(|id| !id.contains("external.example.org")));
}

#[tokio::test]
async fn test_depth_bound_limits_crawl() {
    let server = start_site().await;
    let root = server.uri();
    let config = create_test_config(&root, 1);

    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();

    // Root plus its three in-scope links; /blog/post sits at depth 2
    assert_eq!(report.row_count, 4);
    assert!(report.get(&format!("{}/blog/post", root)).is_none());
    assert!(report.results.iter().all(|r| r.item.depth <= 1));
}

#[tokio::test]
async fn test_non_html_content_has_no_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"href": "/hidden"}"#.as_bytes().to_vec(), "application/json"),
        )
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 5);
    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();

    assert_eq!(report.row_count, 1);
    assert!(report.results[0].is_success());
    assert!(report.results[0].discovered.is_empty());
}

#[test]
fn test_root_outside_scope_rejected() {
    let mut config = create_test_config("http://127.0.0.1:9", 1);
    config.scope = vec![ScopeEntry {
        domain: "example.com".to_string(),
    }];

    assert!(matches!(
        build_crawler(&config),
        Err(SumiError::RootOutOfScope(_))
    ));
}

#[tokio::test]
async fn test_unreachable_root_recorded_as_transport_error() {
    // Nothing listens on the discard port
    let config = create_test_config("http://127.0.0.1:9", 1);

    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();

    assert_eq!(report.row_count, 1);
    let result = &report.results[0];
    assert_eq!(result.status_label(), "transport_error");
}

#[tokio::test]
async fn test_csv_export() {
    let server = start_site().await;
    let root = server.uri();
    let config = create_test_config(&root, 5);

    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    export_csv(&first, &report.results).unwrap();
    export_csv(&second, &report.results).unwrap();

    let content = std::fs::read_to_string(&first).unwrap();
    assert_eq!(content, std::fs::read_to_string(&second).unwrap());

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "Identifier,StatusCode,ElapsedTimeMs,GateWaitTimeMs,CrawlTimestamp,DiscoveredCount,SequenceId,Depth,DiscoveredFrom"
    );
    assert!(lines[1].starts_with(&format!("{},200,", root)));
    assert!(lines
        .iter()
        .any(|l| l.starts_with(&format!("{}/missing,404,", root))));
}

#[tokio::test]
async fn test_results_persisted_to_storage() {
    let server = start_site().await;
    let root = server.uri();
    let config = create_test_config(&root, 5);

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let run_id = storage.create_run("test-hash").unwrap();

    let report = run_crawl(&config, &CancellationToken::new()).await.unwrap();
    let stored = record_run(&mut storage, run_id, &report).unwrap();

    assert_eq!(stored, 5);
    assert_eq!(storage.count_results(run_id).unwrap(), 5);
    assert_eq!(storage.count_failed(run_id).unwrap(), 1);
    assert_eq!(
        storage.count_links(run_id).unwrap() as usize,
        report.results.iter().map(|r| r.discovered.len()).sum::<usize>()
    );
    assert_eq!(
        storage.get_run(run_id).unwrap().status,
        RunStatus::Completed
    );
}
