//! Fetching candidate items and commits.
//!
//! Items come from two independently paginated GraphQL searches. Commits come
//! from a single page of the commit search, minus every commit GitHub already
//! links to a pull request (the pull request itself is reported instead).

use anyhow::{ensure, Result};
use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info, warn};

use crate::github::{Commit, GitHubApi, Item, SearchKind, SearchPage};

/// Lazily walk every page of one search, following end cursors.
///
/// The stream ends after a page without a next page; the first error ends it
/// as well.
pub fn search_pages<'a>(
    api: &'a dyn GitHubApi,
    kind: SearchKind,
    search: &'a str,
) -> impl Stream<Item = Result<SearchPage>> + 'a {
    // `None` once exhausted, otherwise the cursor to resume from.
    stream::try_unfold(Some(None), move |state: Option<Option<String>>| async move {
        let Some(cursor) = state else {
            return Ok::<_, anyhow::Error>(None);
        };

        let page = api.search_page(kind, search, cursor).await?;
        let next = match (page.page_info.has_next_page, &page.page_info.end_cursor) {
            (true, Some(cursor)) => Some(Some(cursor.clone())),
            (true, None) => {
                warn!(?kind, "Search reported another page without a cursor");
                None
            }
            (false, _) => None,
        };

        debug!(?kind, items = page.items.len(), more = next.is_some(), "Fetched page");
        Ok(Some((page, next)))
    })
}

/// Every item matching `search`, across all search kinds.
pub async fn fetch_recent_items(api: &dyn GitHubApi, search: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();

    for kind in SearchKind::ALL {
        let before = items.len();
        items = search_pages(api, kind, search)
            .try_fold(items, |mut acc, page| async move {
                acc.extend(page.items);
                Ok(acc)
            })
            .await?;
        info!(?kind, count = items.len() - before, "Fetched search results");
    }

    Ok(items)
}

/// Commits matching `search` that no pull request covers.
pub async fn fetch_unlinked_commits(api: &dyn GitHubApi, search: &str) -> Result<Vec<Commit>> {
    let commits = api.search_commits(search).await?;
    if commits.is_empty() {
        info!("Commit search returned nothing");
        return Ok(commits);
    }

    let node_ids: Vec<String> = commits.iter().map(|c| c.node_id.clone()).collect();
    let counts = api.associated_pr_counts(&node_ids).await?;
    ensure!(
        counts.len() == commits.len(),
        "Pull request lookup returned {} counts for {} commits",
        counts.len(),
        commits.len()
    );

    let total = commits.len();
    let unlinked: Vec<Commit> = commits
        .into_iter()
        .zip(counts)
        .filter_map(|(commit, count)| (count == 0).then_some(commit))
        .collect();

    info!(total, unlinked = unlinked.len(), "Fetched commits");
    Ok(unlinked)
}
