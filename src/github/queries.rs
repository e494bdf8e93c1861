use serde_json::Value;

pub(crate) const ISSUES_QUERY: &str = include_str!("queries/issues.graphql");
pub(crate) const DISCUSSIONS_QUERY: &str = include_str!("queries/discussions.graphql");
pub(crate) const COMMIT_PULL_REQUESTS_QUERY: &str = include_str!("queries/commits.graphql");

const PARAMS_PLACEHOLDER: &str = "{params}";
const IDS_PLACEHOLDER: &str = "{ids}";

/// The two paginated search shapes fetched through GraphQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Issues and pull requests share one `ISSUE` search.
    IssuesAndPullRequests,
    Discussions,
}

impl SearchKind {
    pub const ALL: [SearchKind; 2] = [SearchKind::IssuesAndPullRequests, SearchKind::Discussions];

    pub(crate) fn template(self) -> &'static str {
        match self {
            SearchKind::IssuesAndPullRequests => ISSUES_QUERY,
            SearchKind::Discussions => DISCUSSIONS_QUERY,
        }
    }
}

/// Fill a search template with `query:` and, when paging, `after:`.
///
/// Values go in as JSON string literals, which are valid GraphQL strings.
pub(crate) fn render_search(kind: SearchKind, search: &str, cursor: Option<&str>) -> String {
    let mut params = format!("query: {}", Value::from(search));
    if let Some(cursor) = cursor {
        params.push_str(&format!(", after: {}", Value::from(cursor)));
    }
    kind.template().replace(PARAMS_PLACEHOLDER, &params)
}

pub(crate) fn render_commit_lookup(node_ids: &[String]) -> String {
    let ids = Value::from(node_ids.to_vec()).to_string();
    COMMIT_PULL_REQUESTS_QUERY.replace(IDS_PLACEHOLDER, &ids)
}
