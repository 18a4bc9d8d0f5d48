//! Flat tree comparison
//!
//! Checkout and merge both work from the difference between two flattened
//! trees: for each path, what happened between the old snapshot and the new
//! one.

use crate::artifacts::objects::tree::TreeEntry;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeChange {
    Added(TreeEntry),
    Deleted(TreeEntry),
    Modified { old: TreeEntry, new: TreeEntry },
}

impl TreeChange {
    /// The entry the change leaves in place, if any.
    pub fn target(&self) -> Option<TreeEntry> {
        match self {
            TreeChange::Added(entry) => Some(*entry),
            TreeChange::Modified { new, .. } => Some(*new),
            TreeChange::Deleted(_) => None,
        }
    }
}

/// Per-path changes turning `old` into `new`, ordered by path.
pub fn diff_flat_trees(
    old: &BTreeMap<PathBuf, TreeEntry>,
    new: &BTreeMap<PathBuf, TreeEntry>,
) -> BTreeMap<PathBuf, TreeChange> {
    let mut changes = BTreeMap::new();

    for (path, old_entry) in old {
        match new.get(path) {
            None => {
                changes.insert(path.clone(), TreeChange::Deleted(*old_entry));
            }
            Some(new_entry) if new_entry != old_entry => {
                changes.insert(
                    path.clone(),
                    TreeChange::Modified {
                        old: *old_entry,
                        new: *new_entry,
                    },
                );
            }
            Some(_) => {}
        }
    }

    for (path, new_entry) in new {
        if !old.contains_key(path) {
            changes.insert(path.clone(), TreeChange::Added(*new_entry));
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::entry_mode::EntryMode;
    use crate::artifacts::objects::object_id::ObjectId;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn entry(byte: u8) -> TreeEntry {
        TreeEntry::new(EntryMode::Normal, ObjectId::from_bytes([byte; 20]))
    }

    fn flat(entries: &[(&str, TreeEntry)]) -> BTreeMap<PathBuf, TreeEntry> {
        entries
            .iter()
            .map(|(path, entry)| (PathBuf::from(path), *entry))
            .collect()
    }

    #[test]
    fn reports_additions_deletions_and_modifications() {
        let old = flat(&[("kept.txt", entry(1)), ("gone.txt", entry(2)), ("edited.txt", entry(3))]);
        let new = flat(&[("kept.txt", entry(1)), ("edited.txt", entry(4)), ("fresh.txt", entry(5))]);

        let changes = diff_flat_trees(&old, &new);

        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[Path::new("gone.txt")],
            TreeChange::Deleted(entry(2))
        );
        assert_eq!(
            changes[Path::new("edited.txt")],
            TreeChange::Modified {
                old: entry(3),
                new: entry(4)
            }
        );
        assert_eq!(changes[Path::new("fresh.txt")], TreeChange::Added(entry(5)));
    }

    #[test]
    fn mode_change_alone_is_a_modification() {
        let executable = TreeEntry::new(EntryMode::Executable, ObjectId::from_bytes([1; 20]));
        let old = flat(&[("script.sh", entry(1))]);
        let new = flat(&[("script.sh", executable)]);

        let changes = diff_flat_trees(&old, &new);
        assert!(matches!(
            changes[Path::new("script.sh")],
            TreeChange::Modified { .. }
        ));
    }

    #[test]
    fn identical_trees_diff_to_nothing() {
        let tree = flat(&[("a.txt", entry(1)), ("b.txt", entry(2))]);
        assert!(diff_flat_trees(&tree, &tree).is_empty());
    }
}
