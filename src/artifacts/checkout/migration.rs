//! Working-tree migration
//!
//! A migration moves the working tree and index from one commit's snapshot
//! to another's. It is planned from the diff of the two flattened trees,
//! checked against local state, and only then applied, so a dirty file is
//! detected before anything on disk changes.
//!
//! A path is safe to touch when the working-tree file still matches what
//! the old snapshot and the index recorded for it, or when it already holds
//! exactly the incoming content. Everything else the migration would
//! overwrite or delete is reported in a single `DirtyWorkingTree` error.

use crate::areas::repository::Repository;
use crate::artifacts::diff::{TreeChange, diff_flat_trees};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct Migration<'repo> {
    repository: &'repo Repository,
    changes: BTreeMap<PathBuf, TreeChange>,
    target_tree: BTreeMap<PathBuf, crate::artifacts::objects::tree::TreeEntry>,
}

impl<'repo> Migration<'repo> {
    /// Plan the migration from the currently checked-out commit to `target`.
    pub fn plan(repository: &'repo Repository, target: &ObjectId) -> Result<Self> {
        let current = repository.head_commit()?;
        let old_tree = repository.database().flatten_commit_tree(current.as_ref())?;
        let new_tree = repository.database().flatten_commit_tree(Some(target))?;

        Ok(Migration {
            repository,
            changes: diff_flat_trees(&old_tree, &new_tree),
            target_tree: new_tree,
        })
    }

    /// Apply the planned changes to the working tree and reset the index to
    /// mirror the target snapshot.
    pub fn apply(self) -> Result<()> {
        self.check_clean()?;

        let workspace = self.repository.workspace();
        let database = self.repository.database();

        // deletions first so a file can be replaced by a directory
        for (path, change) in &self.changes {
            if matches!(change, TreeChange::Deleted(_)) {
                workspace.remove_file(path)?;
            }
        }

        for (path, change) in &self.changes {
            if let Some(entry) = change.target() {
                let blob = database.load_blob(&entry.oid)?;
                workspace.write_file(path, blob.data(), entry.mode)?;
            }
        }

        let mut index = self.repository.index();
        index.replace_with(&self.target_tree);
        index.write_updates()?;

        Ok(())
    }

    /// Fail with `DirtyWorkingTree` when any path the migration touches has
    /// local modifications that are not part of the target snapshot.
    fn check_clean(&self) -> Result<()> {
        let mut dirty = Vec::new();

        for (path, change) in &self.changes {
            if !self.is_clean_at(path, change)? {
                dirty.push(path.clone());
            }
        }

        if dirty.is_empty() {
            Ok(())
        } else {
            Err(Error::DirtyWorkingTree { paths: dirty })
        }
    }

    fn is_clean_at(&self, path: &Path, change: &TreeChange) -> Result<bool> {
        let index = self.repository.index();

        if index.has_conflict_at(path) {
            return Ok(false);
        }

        let workspace = self.repository.workspace();
        let workspace_oid = if workspace.exists(path) {
            Some(workspace.parse_blob(path)?.id()?)
        } else {
            None
        };

        // a file that already holds the incoming content is never dirty
        let incoming = change.target().map(|entry| entry.oid);
        if workspace_oid == incoming {
            return Ok(true);
        }

        let old_oid = match change {
            TreeChange::Deleted(old) | TreeChange::Modified { old, .. } => Some(old.oid),
            TreeChange::Added(_) => None,
        };
        let staged_oid = index.entry(path).map(|entry| entry.oid);

        Ok(staged_oid == old_oid && workspace_oid == old_oid)
    }
}
