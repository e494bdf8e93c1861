use std::collections::BTreeMap;

use crate::github::{Commit, Item};

/// One line of a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Item(Item),
    Commit(Commit),
}

impl Entry {
    pub fn repo_name(&self) -> &str {
        match self {
            Entry::Item(item) => &item.activity().repo.full_name,
            Entry::Commit(commit) => &commit.repo.full_name,
        }
    }
}

impl From<Item> for Entry {
    fn from(item: Item) -> Self {
        Entry::Item(item)
    }
}

impl From<Commit> for Entry {
    fn from(commit: Commit) -> Self {
        Entry::Commit(commit)
    }
}

/// Entries grouped by repository.
///
/// Repositories iterate in lexicographic order; entries within a
/// repository keep the order they were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digest {
    groups: BTreeMap<String, Vec<Entry>>,
}

impl Digest {
    pub fn group_by_repo<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut digest = Self::default();
        digest.extend(entries);
        digest
    }

    pub fn push(&mut self, entry: Entry) {
        self.groups
            .entry(entry.repo_name().to_string())
            .or_default()
            .push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn repo_count(&self) -> usize {
        self.groups.len()
    }

    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.groups
            .iter()
            .map(|(repo, entries)| (repo.as_str(), entries.as_slice()))
    }
}

impl Extend<Entry> for Digest {
    fn extend<T: IntoIterator<Item = Entry>>(&mut self, iter: T) {
        for entry in iter {
            self.push(entry);
        }
    }
}
