//! GitHub search transport: typed responses, query templates and the client.

mod client;
mod queries;
pub mod types;

pub use client::{GitHubApi, GitHubClient};
pub use queries::SearchKind;
pub use types::{Actor, ActorKind, Comment, Comments, Commit, Item, PageInfo, Repository, SearchPage};

#[cfg(test)]
pub use client::MockGitHubApi;
