//! End-to-end export runs against a mock knowledge-base server

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use kb_export::{EnrichmentStage, Error, Exporter, read_article_metadata};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Two pages of two and one articles, one with a comment and an attachment,
/// one whose attachment answers 403
async fn mount_team(server: &MockServer) {
    let a1_body = format!(
        "# Design\n\n![diagram]({}/files/0a1b-2c3d.png)\n",
        server.uri()
    );
    let a3_body = format!("[spec]({}/files/ffee-01.pdf)", server.uri());

    mount_page(
        server,
        1,
        2,
        3,
        vec![
            article("a1", "Design: v2/plan", &a1_body, "Dev Team"),
            article("a2", "Notes", "plain text", "Ops"),
        ],
    )
    .await;
    mount_page(server, 2, 2, 3, vec![article("a3", "Spec", &a3_body, "Ops")]).await;

    mount_enrichment(server, "a1", vec![("c1", vec!["smile", "+1"])], vec!["tada"]).await;
    mount_enrichment(server, "a2", vec![], vec![]).await;
    mount_enrichment(server, "a3", vec![], vec!["eyes"]).await;

    mount_asset(server, "0a1b-2c3d.png", 200, b"\x89PNG fake").await;
    mount_asset(server, "ffee-01.pdf", 403, b"forbidden").await;
}

#[tokio::test]
async fn test_full_export_writes_expected_tree() {
    let server = MockServer::start().await;
    mount_team(&server).await;
    let out = TempDir::new().unwrap();

    let config = test_config(&server, out.path(), 2);
    let summary = Exporter::from_config(&config).unwrap().run().await.unwrap();

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.articles, 3);
    assert_eq!(summary.assets, 2);
    assert_eq!(summary.total, 3);
    // 2 pages + (3 + 2 + 2) enrichment calls + 2 assets
    assert_eq!(summary.requests, 11);

    let files = exported_files(out.path());
    let expected: Vec<PathBuf> = vec![
        "Dev Team/a1/0a1b-2c3d.png".into(),
        "Dev Team/a1/Design_ v2_plan.md".into(),
        "Dev Team/a1/Design_ v2_plan_metadata.json".into(),
        "Ops/a2/Notes.md".into(),
        "Ops/a2/Notes_metadata.json".into(),
        "Ops/a3/Spec.md".into(),
        "Ops/a3/Spec_metadata.json".into(),
        "Ops/a3/ffee-01.pdf".into(),
    ];
    assert_eq!(files, expected);
}

#[tokio::test]
async fn test_metadata_carries_enrichment() {
    let server = MockServer::start().await;
    mount_team(&server).await;
    let out = TempDir::new().unwrap();

    Exporter::from_config(&test_config(&server, out.path(), 2))
        .unwrap()
        .run()
        .await
        .unwrap();

    let dir = out.path().join("Dev Team").join("a1");
    let article = read_article_metadata(&dir.join("Design_ v2_plan_metadata.json"))
        .await
        .unwrap();
    assert_eq!(article.id, "a1");
    assert_eq!(article.comments.len(), 1);
    let names: Vec<_> = article.comments[0]
        .reactions
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["smile", "+1"]);
    assert_eq!(article.reactions[0].name, "tada");

    let markdown = std::fs::read_to_string(dir.join("Design_ v2_plan.md")).unwrap();
    assert_eq!(markdown, article.body);

    let forbidden = std::fs::read(out.path().join("Ops/a3/ffee-01.pdf")).unwrap();
    assert_eq!(forbidden, b"forbidden");
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let server = MockServer::start().await;
    mount_team(&server).await;
    let out = TempDir::new().unwrap();
    let config = test_config(&server, out.path(), 2);

    Exporter::from_config(&config).unwrap().run().await.unwrap();
    let first = snapshot(out.path());
    Exporter::from_config(&config).unwrap().run().await.unwrap();
    let second = snapshot(out.path());

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/items"))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Total-Count", "0")
                .set_body_json(serde_json::json!([])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let out = TempDir::new().unwrap();

    let summary = Exporter::from_config(&test_config(&server, out.path(), 100))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.articles, 0);
    assert_eq!(summary.requests, 1);
    assert!(exported_files(out.path()).is_empty());
}

#[tokio::test]
async fn test_query_filter_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/items"))
        .and(query_param("query", "tag:rust"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Total-Count", "1")
                .set_body_json(serde_json::json!([article("q1", "Rust", "body", "Dev")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_enrichment(&server, "q1", vec![], vec![]).await;
    let out = TempDir::new().unwrap();

    let mut config = test_config(&server, out.path(), 100);
    config.export.query = Some("tag:rust".to_string());
    let summary = Exporter::from_config(&config).unwrap().run().await.unwrap();

    assert_eq!(summary.articles, 1);
    assert!(out.path().join("Dev/q1/Rust.md").exists());
}

#[tokio::test]
async fn test_transient_page_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/items"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(&server, 1, 100, 1, vec![article("r1", "Retried", "body", "Dev")]).await;
    mount_enrichment(&server, "r1", vec![], vec![]).await;
    let out = TempDir::new().unwrap();

    let summary = Exporter::from_config(&test_config(&server, out.path(), 100))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.articles, 1);
    assert!(out.path().join("Dev/r1/Retried_metadata.json").exists());
}

#[tokio::test]
async fn test_exhausted_page_retries_abort_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/items"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    let out = TempDir::new().unwrap();

    let err = Exporter::from_config(&test_config(&server, out.path(), 100))
        .unwrap()
        .run()
        .await
        .unwrap_err();

    match err {
        Error::Page { page, per_page, source } => {
            assert_eq!(page, 1);
            assert_eq!(per_page, 100);
            assert!(matches!(*source, Error::RetryExhausted { attempts: 2, .. }));
        }
        other => panic!("expected page error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_enrichment_failure_aborts_without_writing() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 100, 1, vec![article("e1", "Broken", "body", "Dev")]).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/items/e1/comments"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let out = TempDir::new().unwrap();

    let err = Exporter::from_config(&test_config(&server, out.path(), 100))
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Enrichment {
            stage: EnrichmentStage::Comments,
            ..
        }
    ));
    assert!(exported_files(out.path()).is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let mut config = test_config(&server, out.path(), 100);
    config.api.access_token.clear();

    let result = Exporter::from_config(&config);

    assert!(matches!(result, Err(Error::Config { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}
