//! GitHub Digest - Daily Keyword Activity Report
//!
//! Searches GitHub for issues, pull requests, discussions and commits that
//! mention a keyword, keeps the ones with activity since the previous day's
//! cutoff, and reports them grouped by repository as plain text and an HTML
//! email.
//!
//! ## Modules
//!
//! - [`config`]: Configuration file, `.env` loading and required secrets
//! - [`github`]: GitHub GraphQL and REST search client
//! - [`sources`]: Paginated item fetching and unlinked commit lookup
//! - [`filter`]: Recency cutoff and ignore lists
//! - [`digest`]: Grouping by repository
//! - [`render`]: Plain-text and HTML output
//! - [`notify`]: SMTP delivery
//! - [`pipeline`]: One end-to-end run

pub mod config;
pub mod digest;
pub mod filter;
pub mod github;
pub mod notify;
pub mod pipeline;
pub mod render;
pub mod sources;

pub use config::{Config, Secrets};
pub use digest::{Digest, Entry};
pub use github::{GitHubApi, GitHubClient};
pub use notify::{Notifier, SmtpNotifier};
pub use pipeline::{build_digest, run, RunOutcome};

/// Install the process-wide rustls crypto provider.
///
/// Must run before any TLS client is built. Later calls are no-ops.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
