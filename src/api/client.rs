//! HTTP implementation of [`KnowledgeBaseApi`]

use super::{KnowledgeBaseApi, RequestCounter};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{Comment, Page, PageQuery, Reaction};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Response header carrying the total number of listed articles
const TOTAL_COUNT_HEADER: &str = "Total-Count";

/// Authenticated client for the `/api/v2` endpoints
///
/// Cloning is cheap; clones share the HTTP connection pool and the request
/// counter.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
    requests: RequestCounter,
}

impl ApiClient {
    /// Create a client for the configured team
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created or the base URL is invalid
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config.base_url();
        Url::parse(&base_url)
            .map_err(|e| Error::config("base_url", format!("invalid API URL '{base_url}': {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("kb-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config("api", format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            auth_header: format!("Bearer {}", config.access_token),
            requests: RequestCounter::default(),
        })
    }

    /// Send an authenticated GET and return the response if its status is a success
    ///
    /// Asset downloads use [`ApiClient::get_raw`] instead, since they accept
    /// non-success responses.
    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        let response = self.get_raw(url.clone()).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Send an authenticated GET without checking the status
    pub async fn get_raw(&self, url: Url) -> Result<reqwest::Response> {
        let count = self.requests.increment();
        debug!(url = %url, requests = count, "GET");

        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .send()
            .await?;
        Ok(response)
    }

    /// Build `{base}/{segments...}`, each segment percent-encoded on its own
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::config("base_url", format!("invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::config("base_url", "API URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.get(url.clone()).await?;
        let body = response.text().await?;
        decode_json(&url, &body)
    }
}

#[async_trait]
impl KnowledgeBaseApi for ApiClient {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page> {
        // The filter must reach the server unescaped, so the query string is
        // spliced into the URL text instead of going through a form encoder.
        let raw = format!("{}/items?{}", self.base_url, query.to_query_string());
        let url = Url::parse(&raw)
            .map_err(|e| Error::config("query", format!("invalid listing URL '{raw}': {e}")))?;

        let response = self.get(url.clone()).await?;
        let total = parse_total_count(&url, response.headers())?;
        let body = response.text().await?;
        let articles = decode_json(&url, &body)?;

        Ok(Page { articles, total })
    }

    async fn fetch_comments(&self, article_id: &str) -> Result<Vec<Comment>> {
        let url = self.endpoint(&["items", article_id, "comments"])?;
        self.get_json(url).await
    }

    async fn fetch_comment_reactions(&self, comment_id: &str) -> Result<Vec<Reaction>> {
        let url = self.endpoint(&["comments", comment_id, "reactions"])?;
        self.get_json(url).await
    }

    async fn fetch_article_reactions(&self, article_id: &str) -> Result<Vec<Reaction>> {
        let url = self.endpoint(&["items", article_id, "reactions"])?;
        self.get_json(url).await
    }

    fn request_count(&self) -> u64 {
        self.requests.get()
    }
}

fn parse_total_count(url: &Url, headers: &reqwest::header::HeaderMap) -> Result<u64> {
    let value = headers
        .get(TOTAL_COUNT_HEADER)
        .ok_or_else(|| Error::Decode {
            url: url.to_string(),
            message: format!("missing {TOTAL_COUNT_HEADER} header"),
        })?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| Error::Decode {
            url: url.to_string(),
            message: format!("non-numeric {TOTAL_COUNT_HEADER} header: {value:?}"),
        })
}

fn decode_json<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
