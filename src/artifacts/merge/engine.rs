//! Three-way merge over flattened trees
//!
//! The engine is pure: it takes the flattened base, ours, and theirs trees
//! and produces the merged snapshot plus the list of conflicts. Applying
//! the result to the working tree, index, and refs is the command layer's
//! job.
//!
//! Per-path rules, with `base` the entry in the common ancestor:
//! - neither side changed it: keep it
//! - exactly one side changed it (including adding or deleting): take that side
//! - both sides changed it to the same entry: take it
//! - both sides changed it differently: conflict
//!
//! Under [`MergeStrategy::TakeOurs`] a conflicting path resolves to our
//! side instead of being reported.

use crate::artifacts::objects::tree::TreeEntry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Merge cleanly where possible, report the rest as conflicts.
    #[default]
    Resolve,
    /// Resolve every conflict in favor of our side.
    TakeOurs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    Merged,
    Conflicting,
}

/// A path both sides changed in incompatible ways, with the entry each
/// side records (absent on a side that deleted the path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub path: PathBuf,
    pub base: Option<TreeEntry>,
    pub ours: Option<TreeEntry>,
    pub theirs: Option<TreeEntry>,
}

#[derive(Debug)]
pub struct MergeOutcome {
    /// The merged snapshot: every cleanly resolved path.
    pub resolved: BTreeMap<PathBuf, TreeEntry>,
    pub conflicts: Vec<Conflict>,
}

impl MergeOutcome {
    pub fn status(&self) -> MergeStatus {
        if self.conflicts.is_empty() {
            MergeStatus::Merged
        } else {
            MergeStatus::Conflicting
        }
    }
}

pub fn merge_trees(
    base: &BTreeMap<PathBuf, TreeEntry>,
    ours: &BTreeMap<PathBuf, TreeEntry>,
    theirs: &BTreeMap<PathBuf, TreeEntry>,
    strategy: MergeStrategy,
) -> MergeOutcome {
    let paths: BTreeSet<&PathBuf> = base.keys().chain(ours.keys()).chain(theirs.keys()).collect();

    let mut resolved = BTreeMap::new();
    let mut conflicts = Vec::new();

    for path in paths {
        let b = base.get(path);
        let o = ours.get(path);
        let t = theirs.get(path);

        let winner = if o == b {
            t
        } else if t == b || o == t {
            o
        } else {
            match strategy {
                MergeStrategy::TakeOurs => o,
                MergeStrategy::Resolve => {
                    conflicts.push(Conflict {
                        path: path.clone(),
                        base: b.copied(),
                        ours: o.copied(),
                        theirs: t.copied(),
                    });
                    // our side stays in the snapshot while the conflict is
                    // unresolved
                    o
                }
            }
        };

        if let Some(entry) = winner {
            resolved.insert(path.clone(), *entry);
        }
    }

    MergeOutcome { resolved, conflicts }
}
