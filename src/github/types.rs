//! Typed snapshots of GitHub search results.
//!
//! Everything here is decoded strictly: a field the queries ask for that is
//! missing or has the wrong shape fails the whole run instead of being
//! silently defaulted.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Kind of account behind an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ActorKind {
    User,
    Bot,
    #[serde(other)]
    Other,
}

/// Author of an item or linked account of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Actor {
    pub login: String,
    #[serde(rename = "type")]
    pub kind: ActorKind,
}

/// Repository an item or commit belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    #[serde(rename = "nameWithOwner")]
    pub full_name: String,
    pub url: String,
}

/// A comment or a review; only its last update time matters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub updated_at: DateTime<Utc>,
}

/// A connection of comments or reviews, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comments {
    #[serde(default)]
    pub items: Vec<Comment>,
    #[serde(default)]
    pub total_count: u64,
}

impl Comments {
    /// Update time of the most recent entry, if any.
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.items.first().map(|comment| comment.updated_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Open,
    Closed,
    Merged,
}

/// Fields shared by issues, pull requests and discussions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub author: Actor,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub repo: Repository,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub state: Option<ItemState>,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(default)]
    pub reviews: Comments,
}

/// A search hit from the unified search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    Issue(Activity),
    PullRequest(PullRequest),
    Discussion(Activity),
}

impl Item {
    pub fn activity(&self) -> &Activity {
        match self {
            Item::Issue(activity) | Item::Discussion(activity) => activity,
            Item::PullRequest(pr) => &pr.activity,
        }
    }

    /// Reviews are only tracked for pull requests.
    pub fn reviews(&self) -> Option<&Comments> {
        match self {
            Item::PullRequest(pr) => Some(&pr.reviews),
            _ => None,
        }
    }

    /// Short label used in rendered digests.
    pub fn label(&self) -> &'static str {
        match self {
            Item::Issue(_) => "Issue",
            Item::PullRequest(_) => "PR",
            Item::Discussion(_) => "Discussion",
        }
    }

    /// Comments plus reviews.
    pub fn conversation_count(&self) -> u64 {
        self.activity().comments.total_count + self.reviews().map_or(0, |r| r.total_count)
    }
}

/// Cursor state of one search page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub page_info: PageInfo,
    pub items: Vec<Item>,
}

/// A commit from the commit search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub html_url: String,
    pub node_id: String,
    pub repo: Repository,
    /// Git author name, not necessarily a GitHub login.
    pub author_name: String,
    /// GitHub account linked to the author email, when GitHub knows it.
    pub author: Option<Actor>,
    pub committer_date: DateTime<Utc>,
    pub message_title: String,
}

impl Commit {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..8).unwrap_or(&self.sha)
    }
}

// ---------------------------------------------------------------------------
// Wire shapes (REST commit search, GraphQL envelopes)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchData {
    pub search: SearchPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitNodesData {
    pub nodes: Vec<CommitNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommitNode {
    pub associated_pull_requests: TotalCount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TotalCount {
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitSearchResults {
    pub items: Vec<RawCommit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCommit {
    sha: String,
    html_url: String,
    node_id: String,
    repository: RawRepository,
    author: Option<Actor>,
    commit: RawCommitInfo,
}

/// REST repositories also carry an API `url`; the page link is `html_url`.
#[derive(Debug, Deserialize)]
struct RawRepository {
    full_name: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawCommitInfo {
    author: RawGitAuthor,
    committer: RawGitCommitter,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawGitAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawGitCommitter {
    date: DateTime<Utc>,
}

impl From<RawCommit> for Commit {
    fn from(raw: RawCommit) -> Self {
        let message_title = raw
            .commit
            .message
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        Self {
            sha: raw.sha,
            html_url: raw.html_url,
            node_id: raw.node_id,
            repo: Repository {
                full_name: raw.repository.full_name,
                url: raw.repository.html_url,
            },
            author_name: raw.commit.author.name,
            author: raw.author,
            committer_date: raw.commit.committer.date,
            message_title,
        }
    }
}
