//! Core records exchanged with the knowledge-base API
//!
//! Field order in these structs is the field order of the exported metadata
//! JSON, so reordering fields changes every exported file.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Timestamp as returned by the API, keeping the server's UTC offset
pub type Timestamp = DateTime<FixedOffset>;

/// A knowledge-base article
///
/// `comments` and `reactions` are not part of the listing response; they are
/// filled in by [`crate::enrichment::enrich_article`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Opaque identifier, the only safe filesystem key
    pub id: String,
    /// Human-readable title (may contain path-hostile characters)
    pub title: String,
    /// Raw Markdown body with embedded asset URLs
    pub body: String,
    /// Server-rendered HTML body
    #[serde(default)]
    pub rendered_body: String,
    /// Whether the article is co-edited
    #[serde(default)]
    pub coediting: bool,
    /// Number of comments reported by the listing
    #[serde(default)]
    pub comments_count: u64,
    /// Creation time
    pub created_at: Timestamp,
    /// Last update time
    pub updated_at: Timestamp,
    /// Group the article is posted in
    #[serde(default)]
    pub group: Option<Group>,
    /// Number of likes
    #[serde(default)]
    pub likes_count: u64,
    /// Whether the article is limited-sharing
    #[serde(default)]
    pub private: bool,
    /// Number of emoji reactions reported by the listing
    #[serde(default)]
    pub reactions_count: u64,
    /// Number of stocks
    #[serde(default)]
    pub stocks_count: u64,
    /// Tags attached to the article
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Canonical article URL
    #[serde(default)]
    pub url: String,
    /// Author
    #[serde(default)]
    pub user: Option<User>,
    /// Page views (only visible to the author)
    #[serde(default)]
    pub page_views_count: Option<u64>,
    /// Author's team membership
    #[serde(default)]
    pub team_membership: Option<TeamMembership>,
    /// Organization the article belongs to
    #[serde(default)]
    pub organization_url_name: Option<String>,
    /// Whether the article is a slide deck
    #[serde(default)]
    pub slide: bool,
    /// Comments, fetched separately
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Emoji reactions on the article, fetched separately
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Article {
    /// Name of the article's group, if it has one
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_ref().map(|g| g.name.as_str())
    }
}

/// A comment on an article
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub id: String,
    /// Raw Markdown body
    pub body: String,
    /// Server-rendered HTML body
    #[serde(default)]
    pub rendered_body: String,
    /// Creation time
    pub created_at: Timestamp,
    /// Last update time
    pub updated_at: Timestamp,
    /// Comment author
    #[serde(default)]
    pub user: User,
    /// Emoji reactions on the comment, fetched separately
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

/// An emoji reaction; not individually addressable
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// When the reaction was added
    pub created_at: Timestamp,
    /// Custom emoji image, if any
    #[serde(default)]
    pub image_url: Option<String>,
    /// Emoji name, e.g. "+1"
    pub name: String,
    /// Who reacted
    #[serde(default)]
    pub user: User,
}

/// Group an article is posted in
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Display name, used as the output directory
    pub name: String,
    /// URL-safe name
    #[serde(default)]
    pub url_name: String,
    /// Group description
    #[serde(default)]
    pub description: String,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Last update time
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Whether the group is private
    #[serde(default)]
    pub private: bool,
}

/// A team member
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Login name
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Stable numeric identifier
    #[serde(default)]
    pub permanent_id: Option<u64>,
    /// Avatar URL
    #[serde(default)]
    pub profile_image_url: String,
    /// Self introduction
    #[serde(default)]
    pub description: Option<String>,
    /// Organization
    #[serde(default)]
    pub organization: Option<String>,
}

/// A tag on an article
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name
    pub name: String,
    /// Version constraints attached to the tag
    #[serde(default)]
    pub versions: Vec<String>,
}

/// Team membership of the article author
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamMembership {
    /// Member description
    #[serde(default)]
    pub description: String,
    /// Member email
    #[serde(default)]
    pub email: String,
    /// Member identifier
    pub id: String,
    /// Last time the member accessed the team
    #[serde(default)]
    pub last_accessed_at: Option<Timestamp>,
    /// Member name
    #[serde(default)]
    pub name: String,
}

/// One batch of the article listing
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// Articles in listing order
    pub articles: Vec<Article>,
    /// Total number of articles across all pages, from the `Total-Count` header
    pub total: u64,
}

/// Parameters of a listing request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Free-text search filter
    pub query: Option<String>,
}

impl PageQuery {
    /// Create a query without a search filter
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            query: None,
        }
    }

    /// Attach a free-text search filter
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    /// Render the query string
    ///
    /// The filter is inserted as-is; form encoding would mangle search
    /// syntax such as `title:"..."` and non-ASCII terms.
    pub fn to_query_string(&self) -> String {
        let mut params = format!("page={}&per_page={}", self.page, self.per_page);
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            params.push_str("&query=");
            params.push_str(query);
        }
        params
    }
}

/// Counters reported at the end of a run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Listing pages processed
    pub pages: u32,
    /// Articles written
    pub articles: u64,
    /// Assets downloaded
    pub assets: u64,
    /// Server-reported total article count
    pub total: u64,
    /// API and asset requests issued
    pub requests: u64,
}
