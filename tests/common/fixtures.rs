//! API response fixtures and a mock knowledge-base server

use kb_export::config::{ApiConfig, AssetPreset, Config, ExportConfig, RetryConfig};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "integration-token";
const TIMESTAMP: &str = "2023-11-20T09:30:00+09:00";

/// Listing record for one article
pub fn article(id: &str, title: &str, body: &str, group: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "body": body,
        "rendered_body": "",
        "coediting": false,
        "comments_count": 1,
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "group": {
            "name": group,
            "url_name": group.to_lowercase(),
            "description": "",
            "private": false
        },
        "likes_count": 3,
        "private": false,
        "reactions_count": 1,
        "stocks_count": 0,
        "tags": [{"name": "export", "versions": []}],
        "url": format!("https://team.example.com/items/{id}"),
        "user": {"id": "writer", "name": "Writer", "profile_image_url": ""},
        "page_views_count": null,
        "team_membership": null,
        "organization_url_name": null,
        "slide": false
    })
}

pub fn comment(id: &str, body: &str) -> Value {
    json!({
        "id": id,
        "body": body,
        "rendered_body": "",
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "user": {"id": "reader", "name": "Reader", "profile_image_url": ""}
    })
}

pub fn reaction(name: &str) -> Value {
    json!({
        "created_at": TIMESTAMP,
        "image_url": null,
        "name": name,
        "user": {"id": "reader", "name": "Reader", "profile_image_url": ""}
    })
}

/// Mount one listing page
pub async fn mount_page(
    server: &MockServer,
    page: u32,
    per_page: u32,
    total: u64,
    articles: Vec<Value>,
) {
    Mock::given(method("GET"))
        .and(path("/api/v2/items"))
        .and(query_param("page", page.to_string()))
        .and(query_param("per_page", per_page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Total-Count", total.to_string().as_str())
                .set_body_json(Value::Array(articles)),
        )
        .mount(server)
        .await;
}

/// Mount comments, comment reactions and article reactions for one article
pub async fn mount_enrichment(
    server: &MockServer,
    article_id: &str,
    comments: Vec<(&str, Vec<&str>)>,
    article_reactions: Vec<&str>,
) {
    let comment_bodies: Vec<Value> = comments
        .iter()
        .map(|(id, _)| comment(id, "comment body"))
        .collect();
    mount_json(
        server,
        &format!("/api/v2/items/{article_id}/comments"),
        Value::Array(comment_bodies),
    )
    .await;

    for (comment_id, names) in &comments {
        mount_json(
            server,
            &format!("/api/v2/comments/{comment_id}/reactions"),
            Value::Array(names.iter().map(|n| reaction(n)).collect()),
        )
        .await;
    }

    mount_json(
        server,
        &format!("/api/v2/items/{article_id}/reactions"),
        Value::Array(article_reactions.iter().map(|n| reaction(n)).collect()),
    )
    .await;
}

pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a binary asset under `/files/{name}`
pub async fn mount_asset(server: &MockServer, name: &str, status: u16, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{name}")))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

/// Configuration pointed at the mock server with all pauses removed
pub fn test_config(server: &MockServer, output_dir: &Path, per_page: u32) -> Config {
    Config {
        api: ApiConfig {
            domain: String::new(),
            access_token: TOKEN.to_string(),
            base_url: Some(format!("{}/api/v2", server.uri())),
            ..ApiConfig::default()
        },
        export: ExportConfig {
            output_dir: output_dir.to_path_buf(),
            per_page,
            comment_delay: Duration::ZERO,
            asset_delay: Duration::ZERO,
            ..ExportConfig::default()
        },
        assets: kb_export::config::AssetConfig {
            pattern: None,
            preset: AssetPreset::AttachmentFiles,
        },
        retry: RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::ZERO,
            ..RetryConfig::default()
        },
    }
}
