//! History walking
//!
//! [`History`] walks the commit graph backwards from a starting commit,
//! yielding commits lazily in reverse chronological order. Ties on the
//! author timestamp break in first-discovered-first-out order, which keeps
//! the walk deterministic when a test fixture creates several commits
//! within the same second.
//!
//! An optional path filter restricts the walk to commits that changed the
//! entry at that path relative to every parent. A root commit changed
//! every path its tree contains.

use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
struct PendingCommit {
    timestamp: i64,
    /// Discovery sequence number, reversed so that among equal timestamps
    /// the earliest-discovered commit surfaces first.
    seq: Reverse<u64>,
    oid: ObjectId,
}

impl Ord for PendingCommit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.timestamp, self.seq).cmp(&(other.timestamp, other.seq))
    }
}

impl PartialOrd for PendingCommit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub struct History<'db> {
    database: &'db Database,
    pending: BinaryHeap<PendingCommit>,
    visited: HashSet<ObjectId>,
    next_seq: u64,
    path: Option<PathBuf>,
    /// Set after an error so iteration stops instead of repeating it.
    failed: bool,
}

impl<'db> History<'db> {
    pub fn new(database: &'db Database, start: Option<ObjectId>) -> Self {
        let mut history = History {
            database,
            pending: BinaryHeap::new(),
            visited: HashSet::new(),
            next_seq: 0,
            path: None,
            failed: false,
        };

        if let Some(oid) = start {
            history.schedule(oid);
        }

        history
    }

    /// Restrict the walk to commits that changed the entry at `path`.
    pub fn filtered_by(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn schedule(&mut self, oid: ObjectId) {
        if !self.visited.insert(oid) {
            return;
        }

        let timestamp = match self.database.load_commit(&oid) {
            Ok(commit) => commit.timestamp().timestamp(),
            // surfaced again (as an error) when the commit is popped
            Err(_) => i64::MAX,
        };

        self.pending.push(PendingCommit {
            timestamp,
            seq: Reverse(self.next_seq),
            oid,
        });
        self.next_seq += 1;
    }

    /// Whether `commit` changed the entry at `path` relative to every parent.
    fn touches(&self, commit: &Commit, path: &Path) -> Result<bool> {
        let own = self.database.entry_at_path(commit.tree_oid(), path)?;

        if commit.is_root() {
            return Ok(own.is_some());
        }

        for parent_oid in commit.parents() {
            let parent = self.database.load_commit(parent_oid)?;
            let theirs = self.database.entry_at_path(parent.tree_oid(), path)?;
            if theirs == own {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl Iterator for History<'_> {
    type Item = Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some(PendingCommit { oid, .. }) = self.pending.pop() {
            let commit = match self.database.load_commit(&oid) {
                Ok(commit) => commit,
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            };

            for parent in commit.parents() {
                self.schedule(*parent);
            }

            if let Some(path) = self.path.clone() {
                match self.touches(&commit, &path) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(error) => {
                        self.failed = true;
                        return Some(Err(error));
                    }
                }
            }

            return Some(Ok((oid, commit)));
        }

        None
    }
}
