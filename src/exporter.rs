//! Pagination driver
//!
//! Walks the article listing page by page, strictly in order. Each page is
//! fetched with retry, every article on it is enriched, written and has its
//! assets downloaded, and only then is the next page requested. The run ends
//! once `page * per_page` reaches the server-reported total.

use crate::api::{ApiClient, KnowledgeBaseApi};
use crate::assets::{AssetDownloader, AssetPattern};
use crate::config::{Config, ExportConfig};
use crate::enrichment::enrich_article;
use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::storage::{create_dir_all, write_article};
use crate::types::{Article, ExportSummary, PageQuery};
use std::fmt;
use tracing::info;

/// Progress after a page has been processed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Page just processed
    pub page: u32,
    /// Articles covered so far, capped at `total`
    pub completed: u64,
    /// Server-reported total
    pub total: u64,
    /// `completed / total * 100`
    pub percent: f64,
    /// Pages still to request
    pub remaining_pages: u64,
}

impl Progress {
    /// Progress after `page` pages of `per_page` articles out of `total`
    pub fn compute(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = u64::from(per_page.max(1));
        let covered = u64::from(page) * per_page;
        let completed = covered.min(total);
        let percent = if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        let remaining_pages = total.saturating_sub(covered).div_ceil(per_page);

        Self {
            page,
            completed,
            total,
            percent,
            remaining_pages,
        }
    }

    /// Whether the listing has been fully covered
    pub fn is_done(&self) -> bool {
        self.remaining_pages == 0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: {:.1}% (page={}, remaining={})",
            self.percent, self.page, self.remaining_pages
        )
    }
}

/// Exports every article of the listing to the output directory
pub struct Exporter<A> {
    api: A,
    assets: AssetDownloader,
    settings: ExportConfig,
    retry: RetryPolicy,
}

impl Exporter<ApiClient> {
    /// Build an exporter talking to the configured team
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let client = ApiClient::new(&config.api)?;
        let pattern = AssetPattern::from_config(&config.assets, &config.api.origin())?;
        let assets = AssetDownloader::new(client.clone(), pattern, config.export.asset_delay);

        Ok(Self::new(
            client,
            assets,
            config.export.clone(),
            RetryPolicy::from(&config.retry),
        ))
    }
}

impl<A: KnowledgeBaseApi> Exporter<A> {
    /// Assemble an exporter from its collaborators
    pub fn new(
        api: A,
        assets: AssetDownloader,
        settings: ExportConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            assets,
            settings,
            retry,
        }
    }

    /// API the exporter reads from
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run the export to completion
    ///
    /// Stops at the first unrecovered error; files written before it stay on
    /// disk and are overwritten by the next run.
    pub async fn run(&self) -> Result<ExportSummary> {
        let per_page = self.settings.per_page.max(1);
        let mut page = self.settings.start_page.max(1);
        let mut summary = ExportSummary::default();

        create_dir_all(&self.settings.output_dir).await?;
        info!(
            output_dir = %self.settings.output_dir.display(),
            start_page = page,
            per_page,
            "Starting export"
        );

        loop {
            let query = PageQuery::new(page, per_page).with_query(self.settings.query.clone());
            let label = format!("page={page}");
            let listing = fetch_with_retry(&self.retry, &label, || self.api.fetch_page(&query))
                .await
                .map_err(|e| Error::Page {
                    page,
                    per_page,
                    source: Box::new(e),
                })?;

            summary.pages += 1;
            summary.total = listing.total;
            if listing.total == 0 {
                info!("Listing is empty, nothing to export");
                break;
            }

            for article in listing.articles {
                summary.assets += self.export_article(article).await? as u64;
                summary.articles += 1;
            }

            let progress = Progress::compute(page, per_page, listing.total);
            println!("{progress}");
            info!(
                page,
                percent = progress.percent,
                remaining_pages = progress.remaining_pages,
                requests = self.api.request_count(),
                "Page exported"
            );

            if progress.is_done() {
                break;
            }

            page += 1;
            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        }

        summary.requests = self.api.request_count();
        info!(
            pages = summary.pages,
            articles = summary.articles,
            assets = summary.assets,
            requests = summary.requests,
            "Export finished"
        );
        Ok(summary)
    }

    /// Enrich, write and download assets for one article
    ///
    /// Returns the number of assets downloaded.
    async fn export_article(&self, article: Article) -> Result<usize> {
        println!("{} {}", article.title, "=".repeat(20));

        let article = enrich_article(&self.api, article, self.settings.comment_delay).await?;

        let target = write_article(&article, &self.settings.output_dir)
            .await
            .map_err(|e| Error::Write {
                article_id: article.id.clone(),
                source: Box::new(e),
            })?;

        self.assets
            .download_assets(&article.body, target.dir())
            .await
    }
}
