//! Recency and ignore-list filtering shared by items and commits.
//!
//! An entry is kept when its author and repository are not ignored and at
//! least one of its timestamps falls on or after the cutoff. Items count
//! edits, closing, and the latest comment or review as activity; commits
//! only have their committer date.

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use crate::config::IgnoreConfig;
use crate::github::{ActorKind, Commit, Item};

/// Start of the digest window: `hour:00` UTC on the day before `run_date`.
pub fn cutoff_for(run_date: NaiveDate, hour: u32) -> Result<DateTime<Utc>> {
    let previous_day = run_date
        .checked_sub_days(Days::new(1))
        .with_context(|| format!("No day before {run_date}"))?;
    let start = previous_day
        .and_hms_opt(hour, 0, 0)
        .with_context(|| format!("Invalid cutoff hour: {hour}"))?;
    Ok(start.and_utc())
}

/// Something that can appear in a digest.
pub trait Reportable {
    fn repo_name(&self) -> &str;

    /// Names to check against the author ignore list.
    fn author_names(&self) -> Vec<&str>;

    fn is_bot(&self) -> bool;

    /// Every timestamp that counts as activity.
    fn activity_times(&self) -> Vec<DateTime<Utc>>;
}

impl Reportable for Item {
    fn repo_name(&self) -> &str {
        &self.activity().repo.full_name
    }

    fn author_names(&self) -> Vec<&str> {
        vec![self.activity().author.login.as_str()]
    }

    fn is_bot(&self) -> bool {
        self.activity().author.kind == ActorKind::Bot
    }

    fn activity_times(&self) -> Vec<DateTime<Utc>> {
        let activity = self.activity();
        [
            Some(activity.created_at),
            activity.last_edited_at,
            activity.closed_at,
            activity.comments.latest(),
            self.reviews().and_then(|reviews| reviews.latest()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Reportable for Commit {
    fn repo_name(&self) -> &str {
        &self.repo.full_name
    }

    fn author_names(&self) -> Vec<&str> {
        let mut names = vec![self.author_name.as_str()];
        if let Some(author) = &self.author {
            names.push(author.login.as_str());
        }
        names
    }

    fn is_bot(&self) -> bool {
        self.author
            .as_ref()
            .is_some_and(|author| author.kind == ActorKind::Bot)
    }

    fn activity_times(&self) -> Vec<DateTime<Utc>> {
        vec![self.committer_date]
    }
}

/// Compiled ignore lists.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    authors: HashSet<String>,
    repos: Vec<RepoPattern>,
}

#[derive(Debug, Clone)]
enum RepoPattern {
    Exact(String),
    Glob(Regex),
}

impl RepoPattern {
    fn parse(pattern: &str) -> Result<Self> {
        if !pattern.contains('*') {
            return Ok(RepoPattern::Exact(pattern.to_string()));
        }
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let re = Regex::new(&format!("^{body}$"))
            .with_context(|| format!("Invalid repository pattern: {pattern}"))?;
        Ok(RepoPattern::Glob(re))
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            RepoPattern::Exact(exact) => exact == name,
            RepoPattern::Glob(re) => re.is_match(name),
        }
    }
}

impl IgnoreList {
    pub fn from_config(config: &IgnoreConfig) -> Result<Self> {
        let repos = config
            .repos
            .iter()
            .map(|pattern| RepoPattern::parse(pattern))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            authors: config.authors.iter().cloned().collect(),
            repos,
        })
    }

    pub fn ignores_author(&self, name: &str) -> bool {
        self.authors.contains(name)
    }

    pub fn ignores_repo(&self, full_name: &str) -> bool {
        self.repos.iter().any(|pattern| pattern.matches(full_name))
    }
}

/// Selects the interesting entries for one digest window.
#[derive(Debug, Clone)]
pub struct Filter {
    cutoff: DateTime<Utc>,
    ignore: IgnoreList,
}

impl Filter {
    pub fn new(cutoff: DateTime<Utc>, ignore: IgnoreList) -> Self {
        Self { cutoff, ignore }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn is_interesting<T: Reportable>(&self, entry: &T) -> bool {
        if entry.is_bot() {
            return false;
        }
        if entry
            .author_names()
            .into_iter()
            .any(|name| self.ignore.ignores_author(name))
        {
            return false;
        }
        if self.ignore.ignores_repo(entry.repo_name()) {
            return false;
        }
        entry
            .activity_times()
            .into_iter()
            .any(|time| time >= self.cutoff)
    }

    /// Keep interesting entries, preserving their order.
    pub fn select<T: Reportable>(&self, entries: Vec<T>) -> Vec<T> {
        let total = entries.len();
        let kept: Vec<T> = entries
            .into_iter()
            .filter(|entry| self.is_interesting(entry))
            .collect();
        debug!(total, kept = kept.len(), "Filtered entries");
        kept
    }
}
