//! Error types for kb-export
//!
//! The taxonomy mirrors the stages of an export run:
//! - gateway failures (transport, HTTP status, decoding)
//! - filesystem failures while writing articles and assets
//! - context wrappers that record which page, article or asset was being
//!   processed when a lower-level error surfaced

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kb-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for kb-export
///
/// Every error is fatal for the run once it reaches [`Exporter::run`](crate::Exporter::run);
/// only page fetches are retried, and only through [`crate::retry`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "per_page")
        key: Option<String>,
    },

    /// Connection, DNS, timeout or body read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code returned by the server
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response body or pagination header could not be decoded
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL
        url: String,
        /// What was wrong with the response
        message: String,
    },

    /// Creating, writing or flushing a local file or directory failed
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        /// Path being created or written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Metadata could not be serialized or parsed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Every attempt of a retried operation failed
    #[error("{attempts} attempts failed: {}", join_errors(.errors))]
    RetryExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error of each attempt, in attempt order
        errors: Vec<Error>,
    },

    /// A listing page could not be fetched
    #[error("failed to request page={page}, per_page={per_page}: {source}")]
    Page {
        /// Page number that failed
        page: u32,
        /// Page size in effect for the run
        per_page: u32,
        /// Underlying error (usually [`Error::RetryExhausted`])
        source: Box<Error>,
    },

    /// Fetching comments or reactions for an article failed
    #[error("failed to fetch {stage} for article {article_id}: {source}")]
    Enrichment {
        /// Article being enriched
        article_id: String,
        /// Which enrichment call failed
        stage: EnrichmentStage,
        /// Underlying error
        source: Box<Error>,
    },

    /// Writing an article's metadata or body failed
    #[error("failed to write article {article_id}: {source}")]
    Write {
        /// Article being written
        article_id: String,
        /// Underlying error
        source: Box<Error>,
    },

    /// The first hard failure of an asset scan
    ///
    /// `index` is the zero-based position of the failing match, which is also
    /// the number of assets completed before it.
    #[error("failed to download asset #{index} ({url}): {source}")]
    AssetDownload {
        /// Position of the failing match in the body
        index: usize,
        /// Asset URL
        url: String,
        /// Underlying error
        source: Box<Error>,
    },
}

/// Enrichment call that produced an [`Error::Enrichment`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrichmentStage {
    /// `GET /items/{id}/comments`
    Comments,
    /// `GET /comments/{id}/reactions`
    CommentReactions,
    /// `GET /items/{id}/reactions`
    ArticleReactions,
}

impl std::fmt::Display for EnrichmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EnrichmentStage::Comments => "comments",
            EnrichmentStage::CommentReactions => "comment reactions",
            EnrichmentStage::ArticleReactions => "article reactions",
        };
        f.write_str(label)
    }
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Innermost error, skipping page/article/asset context wrappers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Page { source, .. }
            | Error::Enrichment { source, .. }
            | Error::Write { source, .. }
            | Error::AssetDownload { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("[attempt {}] {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("; ")
}
