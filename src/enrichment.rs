//! Article enrichment
//!
//! The listing endpoint returns articles without their comments and
//! reactions. Each needs its own request: one for the comments, one per
//! comment for that comment's reactions, and one for the article's
//! reactions.

use crate::api::KnowledgeBaseApi;
use crate::error::{EnrichmentStage, Error, Result};
use crate::types::Article;
use std::time::Duration;
use tracing::debug;

/// Fill in `comments` (with their reactions) and `reactions` of `article`
///
/// Calls are made one at a time in a fixed order: comments, then each
/// comment's reactions in the order the comments were returned (pausing
/// `comment_delay` between them), then the article's reactions. The first
/// failure is returned as [`Error::Enrichment`]; the article is consumed so a
/// half-enriched value can never be written.
pub async fn enrich_article<A>(
    api: &A,
    mut article: Article,
    comment_delay: Duration,
) -> Result<Article>
where
    A: KnowledgeBaseApi + ?Sized,
{
    let article_id = article.id.clone();
    let wrap = |stage: EnrichmentStage| {
        let article_id = article_id.clone();
        move |e: Error| Error::Enrichment {
            article_id,
            stage,
            source: Box::new(e),
        }
    };

    let mut comments = api
        .fetch_comments(&article.id)
        .await
        .map_err(wrap(EnrichmentStage::Comments))?;

    for (i, comment) in comments.iter_mut().enumerate() {
        if i > 0 {
            tokio::time::sleep(comment_delay).await;
        }
        comment.reactions = api
            .fetch_comment_reactions(&comment.id)
            .await
            .map_err(wrap(EnrichmentStage::CommentReactions))?;
    }

    let reactions = api
        .fetch_article_reactions(&article.id)
        .await
        .map_err(wrap(EnrichmentStage::ArticleReactions))?;

    debug!(
        article_id = %article.id,
        comments = comments.len(),
        reactions = reactions.len(),
        "article enriched"
    );

    article.comments = comments;
    article.reactions = reactions;
    Ok(article)
}
