//! Asset URL extraction and download
//!
//! Article bodies embed images and attachments by URL. Extraction is a pure
//! scan producing matches in order of appearance; downloading walks that
//! list one asset at a time with a pause after each request, because the
//! asset host answers 403 under burst load.

use crate::api::ApiClient;
use crate::config::{AssetConfig, AssetPreset};
use crate::error::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use reqwest::{StatusCode, Url};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Characters that end a URL inside Markdown link/image syntax or HTML attributes
const URL_TERMINATORS: &str = r#"\s()\[\]"'<>"#;

/// Extensions recognized by [`AssetPattern::binary_extensions`]
const BINARY_EXTENSIONS: &str = "png|jpe?g|gif|svg|webp|bmp|pdf|zip";

/// File name used when a URL has no usable final path segment
const FALLBACK_FILE_NAME: &str = "asset";

/// Compiled asset URL pattern for one deployment
#[derive(Clone, Debug)]
pub struct AssetPattern(Regex);

impl AssetPattern {
    /// Compile a custom pattern
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| Error::config("ASSET_REGEXP", format!("invalid pattern: {e}")))
    }

    /// Any path under `origin` ending in a recognized binary extension
    ///
    /// `origin` is scheme and host, e.g. `https://team.example.com`.
    pub fn binary_extensions(origin: &str) -> Result<Self> {
        Self::new(&format!(
            r"(?i){}/[^{URL_TERMINATORS}]+?\.(?:{BINARY_EXTENSIONS})\b",
            regex::escape(origin.trim_end_matches('/'))
        ))
    }

    /// Uploads under `origin/files/`: an id segment of letters, digits and
    /// hyphens (UUID-like) followed by any extension
    pub fn attachment_files(origin: &str) -> Result<Self> {
        Self::new(&format!(
            r"{}/files/[0-9A-Za-z][0-9A-Za-z-]*\.[^{URL_TERMINATORS}/]+",
            regex::escape(origin.trim_end_matches('/'))
        ))
    }

    /// Pattern selected by configuration; a custom expression wins over the preset
    pub fn from_config(config: &AssetConfig, origin: &str) -> Result<Self> {
        if let Some(pattern) = &config.pattern {
            return Self::new(pattern);
        }
        match config.preset {
            AssetPreset::BinaryExtensions => Self::binary_extensions(origin),
            AssetPreset::AttachmentFiles => Self::attachment_files(origin),
        }
    }
}

/// Every non-overlapping asset URL in `body`, in order of appearance
///
/// Duplicates are kept: a body that embeds the same image twice yields it twice.
pub fn extract_asset_urls<'a>(pattern: &AssetPattern, body: &'a str) -> Vec<&'a str> {
    pattern.0.find_iter(body).map(|m| m.as_str()).collect()
}

/// Local file name for an asset: the URL's final path segment, percent-decoded
///
/// Query and fragment are ignored. A segment that is empty, `.`/`..`, or
/// decodes to something containing a path separator yields `"asset"`.
pub fn asset_file_name(url: &str) -> String {
    let without_suffix = url.split(['?', '#']).next().unwrap_or_default();
    let path = match without_suffix.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
        None => without_suffix,
    };
    let segment = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default();
    let name = urlencoding::decode(segment)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string());

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        FALLBACK_FILE_NAME.to_string()
    } else {
        name
    }
}

/// Downloads the assets referenced by an article body
#[derive(Clone, Debug)]
pub struct AssetDownloader {
    client: ApiClient,
    pattern: AssetPattern,
    delay: Duration,
}

impl AssetDownloader {
    /// Create a downloader that authenticates with `client`'s token
    ///
    /// `delay` is slept after every asset request.
    pub fn new(client: ApiClient, pattern: AssetPattern, delay: Duration) -> Self {
        Self {
            client,
            pattern,
            delay,
        }
    }

    /// Download every asset referenced in `body` into `target_dir`
    ///
    /// Assets are fetched in order of appearance. A 403 from the asset host
    /// is logged and whatever body it returned is kept. The first hard
    /// failure stops the scan and is returned as [`Error::AssetDownload`]
    /// whose `index` is the number of assets completed before it; later
    /// matches are not attempted.
    ///
    /// Returns the number of assets downloaded.
    pub async fn download_assets(&self, body: &str, target_dir: &Path) -> Result<usize> {
        let urls = extract_asset_urls(&self.pattern, body);

        for (index, url) in urls.iter().enumerate() {
            self.download_one(url, target_dir)
                .await
                .map_err(|e| Error::AssetDownload {
                    index,
                    url: (*url).to_string(),
                    source: Box::new(e),
                })?;
        }

        info!(dir = %target_dir.display(), count = urls.len(), "total assets");
        Ok(urls.len())
    }

    async fn download_one(&self, url: &str, target_dir: &Path) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| Error::Decode {
            url: url.to_string(),
            message: format!("asset URL does not parse: {e}"),
        })?;

        let response = self.client.get_raw(parsed).await?;
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            warn!(dir = %target_dir.display(), url, "403 from asset host, keeping response body");
        } else if !status.is_success() {
            warn!(url, status = status.as_u16(), "unexpected status from asset host");
        }

        let path = target_dir.join(asset_file_name(url));
        let written = stream_to_file(response, &path).await;
        if written.is_err() {
            // A partial file would be indistinguishable from a finished one
            let _ = tokio::fs::remove_file(&path).await;
        }
        let bytes = written?;
        debug!(url, path = %path.display(), bytes, "asset saved");

        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Create or truncate `path` and copy the response body into it chunk by chunk
async fn stream_to_file(mut response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?;

    let mut bytes = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::filesystem(path, e))?;
        bytes += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| Error::filesystem(path, e))?;
    file.sync_all()
        .await
        .map_err(|e| Error::filesystem(path, e))?;
    Ok(bytes)
}
