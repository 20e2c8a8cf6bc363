//! Shared fixtures for unit tests.

use crate::types::Article;
use serde_json::{Value, json};

const TIMESTAMP: &str = "2024-04-01T10:00:00+09:00";

/// Listing record as the API returns it (no comments/reactions)
pub(crate) fn article_json(id: &str, title: &str, body: &str, group: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "body": body,
        "rendered_body": "",
        "coediting": false,
        "comments_count": 0,
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "group": {
            "name": group,
            "url_name": group.to_lowercase(),
            "description": "",
            "created_at": TIMESTAMP,
            "updated_at": TIMESTAMP,
            "private": false
        },
        "likes_count": 0,
        "private": false,
        "reactions_count": 0,
        "stocks_count": 0,
        "tags": [{"name": "rust", "versions": []}],
        "url": format!("https://team.example.com/items/{id}"),
        "user": {"id": "author", "name": "Author", "profile_image_url": ""},
        "page_views_count": null,
        "team_membership": null,
        "organization_url_name": null,
        "slide": false
    })
}

pub(crate) fn comment_json(id: &str, body: &str) -> Value {
    json!({
        "id": id,
        "body": body,
        "rendered_body": "",
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "user": {"id": "commenter", "name": "Commenter", "profile_image_url": ""}
    })
}

pub(crate) fn reaction_json(name: &str) -> Value {
    json!({
        "created_at": TIMESTAMP,
        "image_url": format!("https://cdn.example.com/emoji/{name}.png"),
        "name": name,
        "user": {"id": "reactor", "name": "Reactor", "profile_image_url": ""}
    })
}

/// Typed article built from [`article_json`]
pub(crate) fn sample_article(id: &str, title: &str, body: &str, group: &str) -> Article {
    serde_json::from_value(article_json(id, title, body, group)).expect("valid fixture")
}
