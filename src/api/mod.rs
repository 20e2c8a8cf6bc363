//! Knowledge-base API gateway
//!
//! [`KnowledgeBaseApi`] is the seam between the export engine and the remote
//! API. [`ApiClient`] is the HTTP implementation; tests substitute their own.

mod client;

pub use client::ApiClient;

use crate::error::Result;
use crate::types::{Comment, Page, PageQuery, Reaction};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only access to the knowledge-base endpoints the exporter needs
///
/// Every method is a single GET. Failures are reported as
/// [`Error::Transport`](crate::Error::Transport),
/// [`Error::HttpStatus`](crate::Error::HttpStatus) or
/// [`Error::Decode`](crate::Error::Decode).
#[async_trait]
pub trait KnowledgeBaseApi: Send + Sync {
    /// `GET /items?{query}`: one listing page plus the total article count
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page>;

    /// `GET /items/{id}/comments`
    async fn fetch_comments(&self, article_id: &str) -> Result<Vec<Comment>>;

    /// `GET /comments/{id}/reactions`
    async fn fetch_comment_reactions(&self, comment_id: &str) -> Result<Vec<Reaction>>;

    /// `GET /items/{id}/reactions`
    async fn fetch_article_reactions(&self, article_id: &str) -> Result<Vec<Reaction>>;

    /// Number of requests issued so far in this run
    fn request_count(&self) -> u64;
}

/// Run-scoped count of outgoing requests
///
/// The API allows roughly 1000 requests per hour, so the count is reported
/// in progress logs and fatal errors. It never drives control flow.
/// Clones share the same count.
#[derive(Clone, Debug, Default)]
pub struct RequestCounter(Arc<AtomicU64>);

impl RequestCounter {
    /// Record one request and return the new total
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current total
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
