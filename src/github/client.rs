use anyhow::{bail, ensure, Context, Result};
use async_trait::async_trait;
use http::header::ACCEPT;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde::Serialize;
use tracing::debug;

use super::queries::{self, SearchKind};
use super::types::{
    Commit, CommitNodesData, CommitSearchResults, GraphqlResponse, SearchData, SearchPage,
};
use crate::config::GitHubConfig;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";

/// Search operations the digest needs from GitHub.
///
/// Every call either returns a fully decoded value or fails; nothing is
/// retried and partial results are never returned.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Fetch one page of a GraphQL search, starting after `cursor`.
    async fn search_page(
        &self,
        kind: SearchKind,
        search: &str,
        cursor: Option<String>,
    ) -> Result<SearchPage>;

    /// Run a commit search. Returns a single page, newest first.
    async fn search_commits(&self, search: &str) -> Result<Vec<Commit>>;

    /// Number of pull requests associated with each commit, in input order.
    async fn associated_pr_counts(&self, node_ids: &[String]) -> Result<Vec<u64>>;
}

/// GitHub client backed by octocrab.
pub struct GitHubClient {
    client: Octocrab,
    commit_page_size: u8,
}

#[derive(Serialize)]
struct CommitSearchParams<'a> {
    q: &'a str,
    sort: &'static str,
    order: &'static str,
    per_page: u8,
}

impl GitHubClient {
    /// Build a client for the configured API root using a bearer token.
    ///
    /// octocrab supplies the `X-GitHub-Api-Version` header itself. Retries
    /// are off: a failed request fails the run.
    pub fn new(config: &GitHubConfig, token: String) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(config.api_url.as_str())
            .with_context(|| format!("Invalid GitHub API URL: {}", config.api_url))?
            .personal_token(token)
            .add_header(ACCEPT, ACCEPT_GITHUB_JSON.to_string())
            .add_retry_config(RetryConfig::None)
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self {
            client,
            commit_page_size: config.commit_page_size,
        })
    }

    async fn graphql<T>(&self, query: String, what: &'static str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let payload = serde_json::json!({ "query": query });
        let response: GraphqlResponse<T> = self
            .client
            .graphql(&payload)
            .await
            .with_context(|| format!("GraphQL {what} request failed"))?;
        graphql_data(response).with_context(|| format!("GraphQL {what} returned no usable data"))
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn search_page(
        &self,
        kind: SearchKind,
        search: &str,
        cursor: Option<String>,
    ) -> Result<SearchPage> {
        debug!(?kind, search, cursor = cursor.as_deref(), "Fetching search page");
        let query = queries::render_search(kind, search, cursor.as_deref());
        let data: SearchData = self.graphql(query, "search").await?;
        Ok(data.search)
    }

    async fn search_commits(&self, search: &str) -> Result<Vec<Commit>> {
        debug!(search, "Searching commits");
        let params = CommitSearchParams {
            q: search,
            sort: "committer-date",
            order: "desc",
            per_page: self.commit_page_size,
        };

        let results: CommitSearchResults = self
            .client
            .get("/search/commits", Some(&params))
            .await
            .context("Commit search request failed")?;

        Ok(results.items.into_iter().map(Commit::from).collect())
    }

    async fn associated_pr_counts(&self, node_ids: &[String]) -> Result<Vec<u64>> {
        debug!(count = node_ids.len(), "Looking up associated pull requests");
        let query = queries::render_commit_lookup(node_ids);
        let data: CommitNodesData = self.graphql(query, "commit lookup").await?;

        ensure!(
            data.nodes.len() == node_ids.len(),
            "Commit lookup returned {} nodes for {} commits",
            data.nodes.len(),
            node_ids.len()
        );

        Ok(data
            .nodes
            .into_iter()
            .map(|node| node.associated_pull_requests.total_count)
            .collect())
    }
}

/// Unwrap a GraphQL envelope, turning reported errors into a failure.
pub(crate) fn graphql_data<T>(response: GraphqlResponse<T>) -> Result<T> {
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let msg = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        bail!("GraphQL returned errors: {msg}");
    }
    response.data.context("GraphQL response missing data")
}
