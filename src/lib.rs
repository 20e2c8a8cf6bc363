//! # kb-export
//!
//! Exports every article of a team knowledge base, with its comments, emoji
//! reactions and embedded assets, into a local directory tree:
//!
//! ```text
//! output/<group>/<article id>/<title>_metadata.json
//! output/<group>/<article id>/<title>.md
//! output/<group>/<article id>/<asset files>
//! ```
//!
//! The export runs strictly sequentially. The remote API allows roughly a
//! thousand requests per hour, so pages, enrichment calls and asset
//! downloads are issued one at a time with small pauses in between.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kb_export::{Config, Exporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.domain = "example.qiita.com".to_string();
//!     config.api.access_token = "token".to_string();
//!
//!     let summary = Exporter::from_config(&config)?.run().await?;
//!     println!("exported {} articles", summary.articles);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Knowledge-base API gateway
pub mod api;
/// Asset URL extraction and download
pub mod assets;
/// Configuration types
pub mod config;
/// Comment and reaction enrichment
pub mod enrichment;
/// Error types
pub mod error;
/// Pagination driver
pub mod exporter;
/// Retry logic for page fetches
pub mod retry;
/// Filesystem layout and writer
pub mod storage;
/// Core records
pub mod types;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod test_helpers;

// Re-export commonly used types
pub use api::{ApiClient, KnowledgeBaseApi, RequestCounter};
pub use assets::{AssetDownloader, AssetPattern, extract_asset_urls};
pub use config::{Config, RetryConfig};
pub use error::{EnrichmentStage, Error, Result};
pub use exporter::{Exporter, Progress};
pub use retry::RetryPolicy;
pub use storage::{ExportTarget, read_article_metadata, sanitize_title, write_article};
pub use types::{Article, Comment, ExportSummary, Group, Page, PageQuery, Reaction};
