//! Integration tests for the crawler
//!
//! These tests use wiremock to serve company listing pages and run full
//! crawls through the HTTP engine into a temporary SQLite database.

use feedback_crawler::config::{parse_config, Config};
use feedback_crawler::output::{load_company_statistics, CrawlResponse};
use feedback_crawler::storage::{FeedbackStore, RunStatus, SqliteStorage};
use feedback_crawler::{CrawlService, FeedbackKind, HarvestError};
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(root_url: &str, db_path: &Path) -> Config {
    parse_config(&format!(
        r#"
[site]
root-url = "{}"

[browser]
engine = "http"
navigation-timeout-ms = 5000

[storage]
database-path = "{}"
"#,
        root_url,
        db_path.display()
    ))
    .expect("test config should be valid")
}

fn open_store(db_path: &Path) -> SqliteStorage {
    SqliteStorage::new(db_path, std::time::Duration::from_secs(5)).expect("open test database")
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

fn pagination(pages: u32) -> String {
    let links: String = (1..=pages)
        .map(|p| format!(r#"<li class="page-item"><a class="page-link" href="?page={0}">{0}</a></li>"#, p))
        .collect();
    format!(
        r#"<ul class="pagination"><li><a class="page-link">«</a></li>{}<li><a class="page-link">»</a></li></ul>"#,
        links
    )
}

fn comment(id: &str, text: &str) -> String {
    format!(
        r#"<div id="comment-replies-{}"><div class="cmt-content">{}</div></div>"#,
        id, text
    )
}

fn review(id: &str, text: &str) -> String {
    format!(
        r#"<div id="review-{}"><div class="readmore-content">{}</div></div>"#,
        id, text
    )
}

/// Mounts the listing root of `slug`
///
/// The root mock has lower precedence than page mocks, which also match the
/// bare path.
async fn mount_root(server: &MockServer, slug: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/companies/{}", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Mounts one listing page of `slug`
async fn mount_page(server: &MockServer, slug: &str, page: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/companies/{}", slug)))
        .and(query_param("page", page.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_without_pagination() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("feedback.db");

    mount_root(&server, "acme", html_page("ACME", "<p>no controls</p>")).await;
    mount_page(
        &server,
        "acme",
        1,
        ResponseTemplate::new(200).set_body_string(html_page(
            "ACME",
            &format!(
                "{}{}{}",
                comment("11", "Friendly colleagues"),
                comment("12", "Long hours"),
                review("5", "  Good salary  ")
            ),
        )),
    )
    .await;

    let service = CrawlService::new(create_test_config(&server.uri(), &db_path), "hash");
    let summary = service.crawl("acme").await.expect("crawl should succeed");

    assert_eq!(summary.total, 3);
    let comments = summary
        .items
        .iter()
        .filter(|i| i.kind == FeedbackKind::Comment)
        .count();
    assert_eq!(comments, 2);

    let stored = open_store(&db_path).get_feedback("review-5").unwrap().unwrap();
    assert_eq!(stored.text, "Good salary");
    assert_eq!(stored.source_id, "5");
    assert_eq!(stored.company_id, "acme");
}

#[tokio::test]
async fn test_not_found_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("feedback.db");

    mount_root(&server, "acme", html_page("ACME", &pagination(3))).await;
    mount_page(
        &server,
        "acme",
        1,
        ResponseTemplate::new(200).set_body_string(html_page("ACME", &comment("1", "page one"))),
    )
    .await;
    mount_page(
        &server,
        "acme",
        2,
        ResponseTemplate::new(200)
            .set_body_string(html_page("404 Not Found", &comment("2", "page two"))),
    )
    .await;
    mount_page(
        &server,
        "acme",
        3,
        ResponseTemplate::new(200).set_body_string(html_page("ACME", &review("3", "page three"))),
    )
    .await;

    let service = CrawlService::new(create_test_config(&server.uri(), &db_path), "hash");
    let summary = service.crawl("acme").await.unwrap();

    let ids: Vec<_> = summary.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["review-3", "comment-replies-1"]);
    assert_eq!(open_store(&db_path).count_feedback("acme").unwrap(), 2);
}

#[tokio::test]
async fn test_error_status_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("feedback.db");

    mount_root(&server, "acme", html_page("ACME", &pagination(2))).await;
    mount_page(
        &server,
        "acme",
        1,
        ResponseTemplate::new(503).set_body_string(html_page("ACME", &comment("1", "hidden"))),
    )
    .await;
    mount_page(
        &server,
        "acme",
        2,
        ResponseTemplate::new(200).set_body_string(html_page("ACME", &comment("2", "visible"))),
    )
    .await;

    let service = CrawlService::new(create_test_config(&server.uri(), &db_path), "hash");
    let summary = service.crawl("acme").await.unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.items[0].text, "visible");
}

#[tokio::test]
async fn test_recrawl_adds_no_rows() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("feedback.db");

    mount_root(&server, "acme", html_page("ACME", &pagination(2))).await;
    mount_page(
        &server,
        "acme",
        1,
        ResponseTemplate::new(200).set_body_string(html_page(
            "ACME",
            &format!("{}{}", comment("1", "a"), review("1", "b")),
        )),
    )
    .await;
    mount_page(
        &server,
        "acme",
        2,
        ResponseTemplate::new(200).set_body_string(html_page("ACME", &review("2", "c"))),
    )
    .await;

    let service = CrawlService::new(create_test_config(&server.uri(), &db_path), "hash");
    let first = service.crawl("acme").await.unwrap();
    let rows_after_first = open_store(&db_path).count_feedback("acme").unwrap();
    let second = service.crawl("acme").await.unwrap();

    let first_ids: BTreeSet<_> = first.items.iter().map(|i| i.id.clone()).collect();
    let second_ids: BTreeSet<_> = second.items.iter().map(|i| i.id.clone()).collect();
    assert_eq!(first.total, second.total);
    assert_eq!(first_ids, second_ids);

    let store = open_store(&db_path);
    assert_eq!(store.count_feedback("acme").unwrap(), rows_after_first);

    let runs = store.recent_runs("acme", 10).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.status == RunStatus::Completed));
}

#[tokio::test]
async fn test_unrecognized_containers_are_ignored() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("feedback.db");

    mount_root(&server, "acme", html_page("ACME", "")).await;
    mount_page(
        &server,
        "acme",
        1,
        ResponseTemplate::new(200).set_body_string(html_page(
            "ACME",
            &format!(
                r#"{}<div id="rating-9"><div class="cmt-content">not feedback</div></div>"#,
                review("9", "counted")
            ),
        )),
    )
    .await;

    let service = CrawlService::new(create_test_config(&server.uri(), &db_path), "hash");
    let summary = service.crawl("acme").await.unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.items[0].id, "review-9");
}

#[tokio::test]
async fn test_companies_are_partitioned() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("feedback.db");

    for (slug, id) in [("acme", "1"), ("globex", "2")] {
        mount_root(&server, slug, html_page(slug, "")).await;
        mount_page(
            &server,
            slug,
            1,
            ResponseTemplate::new(200).set_body_string(html_page(slug, &comment(id, slug))),
        )
        .await;
    }

    let service = CrawlService::new(create_test_config(&server.uri(), &db_path), "hash");
    service.crawl("acme").await.unwrap();
    service.crawl("globex").await.unwrap();

    let store = open_store(&db_path);
    let stats = load_company_statistics(&store, "globex").unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.comments, 1);
    assert_eq!(store.list_feedback("acme").unwrap()[0].text, "acme");
}

#[tokio::test]
async fn test_unreachable_site_fails_without_writes() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("feedback.db");

    // Nothing listens on port 9 locally
    let service = CrawlService::new(create_test_config("http://127.0.0.1:9", &db_path), "hash");
    let result = service.crawl("acme").await;

    assert!(matches!(result, Err(HarvestError::Session(_))));
    let response = serde_json::to_value(CrawlResponse::failure(result.unwrap_err())).unwrap();
    assert_eq!(response["success"], false);
    assert_eq!(response["message"], "Crawling failed");

    let store = open_store(&db_path);
    assert_eq!(store.count_feedback("acme").unwrap(), 0);
    let runs = store.recent_runs("acme", 1).unwrap();
    assert_eq!(runs[0].status, RunStatus::Failed);
}
