//! Filesystem layout of an export
//!
//! ```text
//! <root>/<sanitized group name>/<article id>/
//!     <sanitized title>_metadata.json
//!     <sanitized title>.md
//!     <asset files...>
//! ```
//!
//! Directories are keyed by article id rather than title: titles are free
//! text and may contain path separators or collide with each other.

use crate::error::{Error, Result};
use crate::types::Article;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Characters replaced by [`sanitize_title`]
const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Directory used for articles that are not posted in any group
pub const UNGROUPED_DIR: &str = "_ungrouped";

/// Suffix of the metadata file name
pub const METADATA_SUFFIX: &str = "_metadata.json";

/// Replace characters that are not allowed in file names on common platforms with `_`
///
/// Idempotent: sanitizing an already sanitized title returns it unchanged.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Where one article is exported
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportTarget {
    dir: PathBuf,
    file_stem: String,
}

impl ExportTarget {
    /// Compute the target for `article` under `root`
    pub fn new(root: &Path, article: &Article) -> Self {
        let group = article
            .group_name()
            .map(sanitize_title)
            .unwrap_or_else(|| UNGROUPED_DIR.to_string());

        Self {
            dir: root.join(group).join(&article.id),
            file_stem: sanitize_title(&article.title),
        }
    }

    /// `root/group/id`
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the pretty-printed metadata file
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(format!("{}{METADATA_SUFFIX}", self.file_stem))
    }

    /// Path of the Markdown body
    pub fn markdown_path(&self) -> PathBuf {
        self.dir.join(format!("{}.md", self.file_stem))
    }

    /// Create the article directory; succeeds if it already exists
    pub async fn ensure_dir(&self) -> Result<()> {
        create_dir_all(&self.dir).await
    }
}

/// Create `path` and its parents (mode 0o777 before umask on Unix)
pub async fn create_dir_all(path: &Path) -> Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o777);

    builder
        .create(path)
        .await
        .map_err(|e| Error::filesystem(path, e))
}

/// Write an enriched article's metadata and body
///
/// Creates the article directory if needed and overwrites existing files,
/// so writing the same article twice produces identical files.
///
/// # Returns
///
/// The target the files were written to; assets go into the same directory.
///
/// # Errors
/// Returns [`Error::Decode`] without touching the filesystem if the article
/// id is empty or is not a single plain path segment.
pub async fn write_article(article: &Article, root: &Path) -> Result<ExportTarget> {
    check_article_id(article)?;
    let target = ExportTarget::new(root, article);
    target.ensure_dir().await?;

    let metadata = serde_json::to_string_pretty(article)?;
    let metadata_path = target.metadata_path();
    tokio::fs::write(&metadata_path, metadata)
        .await
        .map_err(|e| Error::filesystem(&metadata_path, e))?;
    debug!(path = %metadata_path.display(), "metadata saved");

    let markdown_path = target.markdown_path();
    tokio::fs::write(&markdown_path, &article.body)
        .await
        .map_err(|e| Error::filesystem(&markdown_path, e))?;
    debug!(path = %markdown_path.display(), "content saved");

    Ok(target)
}

/// The id names the article directory, so it must be exactly one normal path component
fn check_article_id(article: &Article) -> Result<()> {
    let id = article.id.as_str();
    let mut components = Path::new(id).components();
    let single_segment = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(segment)), None) if segment == OsStr::new(id)
    );

    if single_segment && !id.contains('\\') {
        return Ok(());
    }
    Err(Error::Decode {
        url: article.url.clone(),
        message: format!("article id {id:?} is not a usable directory name"),
    })
}

/// Load an exported metadata file back into an [`Article`]
///
/// # Errors
/// Returns error if the file cannot be read, is not valid metadata, or has
/// an empty id.
pub async fn read_article_metadata(path: &Path) -> Result<Article> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?;

    let article: Article = serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
        url: path.display().to_string(),
        message: e.to_string(),
    })?;

    if article.id.is_empty() {
        return Err(Error::Decode {
            url: path.display().to_string(),
            message: "metadata has no id".to_string(),
        });
    }

    Ok(article)
}
