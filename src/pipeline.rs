//! One digest run: fetch, filter, group, render, deliver.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Write;
use tracing::info;

use crate::config::Config;
use crate::digest::{Digest, Entry};
use crate::filter::{cutoff_for, Filter, IgnoreList};
use crate::github::GitHubApi;
use crate::notify::{EmailMessage, Notifier};
use crate::render::{render_html, render_plain};
use crate::sources::{fetch_recent_items, fetch_unlinked_commits};

/// Search strings for the item and commit searches.
pub fn search_terms(keyword: &str, cutoff: DateTime<Utc>) -> (String, String) {
    let since = cutoff.date_naive();
    (
        format!("{keyword} updated:>={since}"),
        format!("{keyword} committer-date:>={since}"),
    )
}

/// Fetch and filter everything for the window ending on `run_date`.
pub async fn build_digest(
    api: &dyn GitHubApi,
    config: &Config,
    run_date: NaiveDate,
) -> Result<Digest> {
    let cutoff = cutoff_for(run_date, config.schedule.cutoff_hour_utc)?;
    let filter = Filter::new(cutoff, IgnoreList::from_config(&config.ignore)?);
    let (item_search, commit_search) = search_terms(&config.keyword, cutoff);

    info!(%cutoff, "Collecting activity");

    let items = fetch_recent_items(api, &item_search).await?;
    let commits = fetch_unlinked_commits(api, &commit_search).await?;

    let items = filter.select(items);
    let commits = filter.select(commits);
    info!(
        items = items.len(),
        commits = commits.len(),
        "Selected interesting activity"
    );

    let digest = Digest::group_by_repo(
        items
            .into_iter()
            .map(Entry::from)
            .chain(commits.into_iter().map(Entry::from)),
    );
    Ok(digest)
}

/// What a run ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub entries: usize,
    pub emailed: bool,
}

/// Build the digest, print it to `out`, and email it when a notifier is given.
///
/// An empty digest prints nothing and sends nothing.
pub async fn run<W: Write>(
    api: &dyn GitHubApi,
    notifier: Option<&dyn Notifier>,
    config: &Config,
    run_date: NaiveDate,
    out: &mut W,
) -> Result<RunOutcome> {
    let digest = build_digest(api, config, run_date).await?;

    if digest.is_empty() {
        info!("No new activity, skipping digest");
        return Ok(RunOutcome {
            entries: 0,
            emailed: false,
        });
    }

    let plain = render_plain(&digest);
    let html = render_html(&digest);
    writeln!(out, "{plain}").context("Failed to write digest")?;

    let emailed = match notifier {
        Some(notifier) => {
            let message = EmailMessage::new(&config.keyword, run_date, plain, html);
            notifier.send(&message).await?;
            true
        }
        None => false,
    };

    Ok(RunOutcome {
        entries: digest.entry_count(),
        emailed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::*;
    use crate::github::{Actor, ActorKind, Item, MockGitHubApi, PageInfo, SearchKind, SearchPage};
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &EmailMessage) -> Result<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn single_page(items: Vec<Item>) -> SearchPage {
        SearchPage {
            page_info: PageInfo {
                has_next_page: false,
                end_cursor: None,
            },
            items,
        }
    }

    fn api_with(issues: Vec<Item>, discussions: Vec<Item>, commits_x_y: bool) -> MockGitHubApi {
        let mut api = MockGitHubApi::new();
        api.expect_search_page()
            .with(
                eq(SearchKind::IssuesAndPullRequests),
                eq("msgspec updated:>=2024-05-01"),
                eq(None),
            )
            .times(1)
            .returning(move |_, _, _| Ok(single_page(issues.clone())));
        api.expect_search_page()
            .with(
                eq(SearchKind::Discussions),
                eq("msgspec updated:>=2024-05-01"),
                eq(None),
            )
            .times(1)
            .returning(move |_, _, _| Ok(single_page(discussions.clone())));

        let recent = at(2024, 5, 1, 18, 0, 0);
        api.expect_search_commits()
            .with(eq("msgspec committer-date:>=2024-05-01"))
            .times(1)
            .returning(move |_| {
                if commits_x_y {
                    Ok(vec![
                        commit("c/d", "xxxxxxxxxx", "Covered by PR", recent),
                        commit("c/d", "yyyyyyyyyy", "Direct push", recent),
                    ])
                } else {
                    Ok(vec![])
                }
            });
        api.expect_associated_pr_counts()
            .returning(|ids| Ok(ids.iter().map(|id| u64::from(id == "C_xxxxxxxxxx")).collect()));
        api
    }

    #[test]
    fn search_terms_use_cutoff_date() {
        let (items, commits) = search_terms("msgspec", at(2024, 5, 1, 14, 0, 0));
        assert_eq!(items, "msgspec updated:>=2024-05-01");
        assert_eq!(commits, "msgspec committer-date:>=2024-05-01");
    }

    #[tokio::test]
    async fn build_digest_merges_filters_and_groups() {
        let recent = at(2024, 5, 1, 18, 0, 0);
        let stale = at(2024, 4, 1, 0, 0, 0);

        let mut bot = activity("a/b", 9, "Bump deps", recent);
        bot.author = Actor {
            login: "renovate".to_string(),
            kind: ActorKind::Bot,
        };

        let issues = vec![
            issue("a/b", 1, "Fix bug", recent),
            issue("a/b", 2, "Old", stale),
            Item::Issue(bot),
            issue("jcrist/msgspec", 3, "Own repo", recent),
        ];
        let discussions = vec![Item::Discussion(activity("a/a", 5, "Question", recent))];

        let api = api_with(issues, discussions, true);
        let digest = build_digest(&api, &Config::default(), run_date())
            .await
            .unwrap();

        let repos: Vec<&str> = digest.groups().map(|(repo, _)| repo).collect();
        assert_eq!(repos, vec!["a/a", "a/b", "c/d"]);
        assert_eq!(digest.entry_count(), 3);

        let (_, commits) = digest.groups().nth(2).unwrap();
        assert!(matches!(&commits[0], Entry::Commit(c) if c.message_title == "Direct push"));
    }

    #[tokio::test]
    async fn run_prints_and_emails() {
        let recent = at(2024, 5, 1, 18, 0, 0);
        let api = api_with(vec![issue("a/b", 1, "Fix bug", recent)], vec![], false);
        let notifier = RecordingNotifier::default();
        let mut out = Vec::new();

        let outcome = run(
            &api,
            Some(&notifier as &dyn Notifier),
            &Config::default(),
            run_date(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            RunOutcome {
                entries: 1,
                emailed: true
            }
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "**a/b**\n- Issue #1: Fix bug <https://github.com/a/b/issues/1>\n"
        );

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "GitHub Search Digest: msgspec (2024-05-02)");
        assert!(sent[0].html.contains("Fix bug"));
    }

    #[tokio::test]
    async fn run_without_notifier_only_prints() {
        let recent = at(2024, 5, 1, 18, 0, 0);
        let api = api_with(vec![issue("a/b", 1, "Fix bug", recent)], vec![], false);
        let mut out = Vec::new();

        let outcome = run(&api, None, &Config::default(), run_date(), &mut out)
            .await
            .unwrap();

        assert!(!outcome.emailed);
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn empty_run_sends_nothing() {
        let stale = at(2024, 4, 1, 0, 0, 0);
        let api = api_with(vec![issue("a/b", 1, "Old", stale)], vec![], false);
        let notifier = RecordingNotifier::default();
        let mut out = Vec::new();

        let outcome = run(
            &api,
            Some(&notifier as &dyn Notifier),
            &Config::default(),
            run_date(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            RunOutcome {
                entries: 0,
                emailed: false
            }
        );
        assert!(out.is_empty());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
