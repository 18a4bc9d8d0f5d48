use crate::areas::repository::Repository;
use crate::artifacts::diff::diff_flat_trees;
use crate::artifacts::merge::ancestors::AncestorFinder;
use crate::artifacts::merge::engine::{MergeStatus, MergeStrategy, merge_trees};
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::revision::Revision;
use crate::errors::{Error, Result};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

/// Outcome of a merge as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub status: MergeStatus,
    /// Paths left in conflict, empty when `status` is `Merged`.
    pub conflicts: Vec<PathBuf>,
    /// The merge commit, the fast-forward target, or the already-merged
    /// `HEAD`. `None` when the merge stopped on conflicts.
    pub commit: Option<ObjectId>,
}

impl Repository {
    /// Merge another revision into `HEAD`.
    ///
    /// Histories where one tip contains the other short-circuit: merging an
    /// ancestor reports `Merged` without moving anything, and merging a
    /// descendant fast-forwards. Otherwise the trees are merged three ways
    /// against the lowest common ancestor; a clean merge commits with
    /// parents `[ours, theirs]`, a conflicting one records stage-1/2/3
    /// entries and leaves `HEAD` untouched.
    pub fn merge(&self, target: &str, strategy: MergeStrategy) -> Result<MergeResult> {
        self.ensure_initialized()?;
        self.load_index()?;

        if self.index().has_conflicts() {
            return Err(Error::UnresolvedConflict {
                paths: self.index().conflict_paths(),
            });
        }

        let ours = self
            .head_commit()?
            .ok_or_else(|| Error::NotFound("commit at HEAD".to_string()))?;
        let theirs = Revision::resolve(self, target)?;

        let finder = AncestorFinder::new(|oid: &ObjectId| {
            Ok(self.database().load_commit(oid)?.parents().to_vec())
        });
        let base = finder.find(&ours, &theirs)?.ok_or_else(|| {
            Error::NotFound(format!("common ancestor of HEAD and {target}"))
        })?;

        if base == theirs {
            writeln!(self.writer(), "Already up to date.")?;
            return Ok(MergeResult {
                status: MergeStatus::Merged,
                conflicts: Vec::new(),
                commit: Some(ours),
            });
        }

        if base == ours {
            return self.fast_forward(target, &ours, &theirs);
        }

        let base_tree = self.database().flatten_commit_tree(Some(&base))?;
        let our_tree = self.database().flatten_commit_tree(Some(&ours))?;
        let their_tree = self.database().flatten_commit_tree(Some(&theirs))?;

        let outcome = merge_trees(&base_tree, &our_tree, &their_tree, strategy);

        // bring the working tree from our snapshot to the merged one
        for (path, change) in diff_flat_trees(&our_tree, &outcome.resolved) {
            match change.target() {
                None => self.workspace().remove_file(&path)?,
                Some(entry) => {
                    let blob = self.database().load_blob(&entry.oid)?;
                    self.workspace().write_file(&path, blob.data(), entry.mode)?;
                }
            }
        }

        let mut index = self.index();
        index.replace_with(&outcome.resolved);
        for conflict in &outcome.conflicts {
            index.record_conflict(&conflict.path, conflict.base, conflict.ours, conflict.theirs);
        }
        index.write_updates()?;
        drop(index);

        if outcome.status() == MergeStatus::Conflicting {
            let paths: Vec<PathBuf> = outcome
                .conflicts
                .iter()
                .map(|conflict| conflict.path.clone())
                .collect();

            for path in &paths {
                writeln!(
                    self.writer(),
                    "{}",
                    format!("CONFLICT (content): merge conflict in {}", path.display()).red()
                )?;
            }
            writeln!(
                self.writer(),
                "Automatic merge failed; fix conflicts and then commit the result."
            )?;

            return Ok(MergeResult {
                status: MergeStatus::Conflicting,
                conflicts: paths,
                commit: None,
            });
        }

        let tree_oid = self.index().write_tree(self.database())?;
        let commit = Commit::new(
            vec![ours, theirs],
            tree_oid,
            Author::load_from_env(),
            format!("Merge '{target}'"),
        );
        let oid = self.database().store(&commit)?;
        self.refs().advance_head(&oid, Some(&ours))?;

        writeln!(
            self.writer(),
            "Merge made by the three-way strategy ({})",
            oid.short().yellow()
        )?;

        Ok(MergeResult {
            status: MergeStatus::Merged,
            conflicts: Vec::new(),
            commit: Some(oid),
        })
    }

    fn fast_forward(
        &self,
        target: &str,
        ours: &ObjectId,
        theirs: &ObjectId,
    ) -> Result<MergeResult> {
        crate::artifacts::checkout::migration::Migration::plan(self, theirs)?.apply()?;
        self.refs().advance_head(theirs, Some(ours))?;

        writeln!(
            self.writer(),
            "Fast-forward to {} ({target})",
            theirs.short().yellow()
        )?;

        Ok(MergeResult {
            status: MergeStatus::Merged,
            conflicts: Vec::new(),
            commit: Some(*theirs),
        })
    }
}
