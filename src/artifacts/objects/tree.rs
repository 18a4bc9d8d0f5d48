//! Tree object: one directory snapshot
//!
//! A tree is an ordered sequence of `(name, mode, id)` entries referencing
//! blobs (files) and other trees (subdirectories). Entries are kept in a
//! `BTreeMap` keyed by name, so serialization is always byte-wise sorted:
//! two trees with the same logical content hash identically regardless of
//! the order entries were inserted.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`, each entry `<octal mode> <name>\0<20-byte id>`.

use crate::areas::database::Database;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Decode, Encode, Object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectKind;
use crate::errors::{Error, Result};
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// One tree entry: a file (blob) or a subdirectory (tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub oid: ObjectId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: TreeEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &TreeEntry)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build nested tree objects from flat stage-0 index entries and store
    /// every level, returning the root tree id.
    ///
    /// Entries are grouped by leading path component; subtrees are stored
    /// before their parent so the parent can reference their ids.
    pub fn write_from_entries<'e>(
        database: &Database,
        entries: impl Iterator<Item = &'e IndexEntry>,
    ) -> Result<ObjectId> {
        let flat = entries
            .map(|entry| {
                let components = entry
                    .path
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<_>>();
                (components, entry)
            })
            .collect::<Vec<_>>();

        let level = flat
            .iter()
            .map(|(components, entry)| (components.as_slice(), *entry))
            .collect::<Vec<_>>();

        Self::write_level(database, level)
    }

    fn write_level(database: &Database, level: Vec<(&[String], &IndexEntry)>) -> Result<ObjectId> {
        let mut tree = Tree::new();
        let mut subdirs: BTreeMap<&String, Vec<(&[String], &IndexEntry)>> = BTreeMap::new();

        for (components, entry) in level {
            match components {
                [name] => tree.insert(name.clone(), TreeEntry::new(entry.mode, entry.oid)),
                [dir, rest @ ..] => subdirs.entry(dir).or_default().push((rest, entry)),
                [] => {
                    return Err(Error::Corrupt(format!(
                        "index entry with empty path: {}",
                        entry.path.display()
                    )));
                }
            }
        }

        for (dir, sub_level) in subdirs {
            let sub_oid = Self::write_level(database, sub_level)?;
            tree.insert(dir.clone(), TreeEntry::new(EntryMode::Directory, sub_oid));
        }

        database.store(&tree)
    }
}

impl Encode for Tree {
    fn encode(&self) -> Result<Bytes> {
        let mut content_bytes = Vec::new();

        for (name, entry) in &self.entries {
            let header = format!("{} {}", entry.mode, name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            entry.oid.write_raw_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.kind().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Decode for Tree {
    fn decode(mut reader: impl BufRead) -> Result<Self> {
        let mut entries = BTreeMap::new();

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.last() != Some(&b' ') {
                return Err(Error::Corrupt("unexpected EOF in tree entry mode".to_string()));
            }
            mode_bytes.pop();

            let mode_str = std::str::from_utf8(&mode_bytes)
                .map_err(|_| Error::Corrupt("tree entry mode is not valid UTF-8".to_string()))?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || name_bytes.last() != Some(&b'\0') {
                return Err(Error::Corrupt("unexpected EOF in tree entry name".to_string()));
            }
            name_bytes.pop();
            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| Error::Corrupt("tree entry name is not valid UTF-8".to_string()))?
                .to_owned();

            let oid = ObjectId::read_raw_from(&mut reader)
                .map_err(|_| Error::Corrupt("unexpected EOF in tree entry id".to_string()))?;

            entries.insert(name, TreeEntry::new(mode, oid));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn blob_id(byte: u8) -> ObjectId {
        ObjectId::from_bytes([byte; 20])
    }

    #[test]
    fn insertion_order_does_not_affect_id() {
        let mut first = Tree::new();
        first.insert("alpha.txt", TreeEntry::new(EntryMode::Normal, blob_id(1)));
        first.insert("beta.txt", TreeEntry::new(EntryMode::Normal, blob_id(2)));
        first.insert("gamma", TreeEntry::new(EntryMode::Directory, blob_id(3)));

        let mut second = Tree::new();
        second.insert("gamma", TreeEntry::new(EntryMode::Directory, blob_id(3)));
        second.insert("beta.txt", TreeEntry::new(EntryMode::Normal, blob_id(2)));
        second.insert("alpha.txt", TreeEntry::new(EntryMode::Normal, blob_id(1)));

        assert_eq!(first.id().unwrap(), second.id().unwrap());
    }

    #[test]
    fn different_entry_content_changes_id() {
        let mut first = Tree::new();
        first.insert("file.txt", TreeEntry::new(EntryMode::Normal, blob_id(1)));

        let mut second = Tree::new();
        second.insert("file.txt", TreeEntry::new(EntryMode::Normal, blob_id(2)));

        assert_ne!(first.id().unwrap(), second.id().unwrap());
    }

    #[test]
    fn mode_is_part_of_the_digest() {
        let mut first = Tree::new();
        first.insert("run.sh", TreeEntry::new(EntryMode::Normal, blob_id(1)));

        let mut second = Tree::new();
        second.insert("run.sh", TreeEntry::new(EntryMode::Executable, blob_id(1)));

        assert_ne!(first.id().unwrap(), second.id().unwrap());
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut tree = Tree::new();
        tree.insert("readme.md", TreeEntry::new(EntryMode::Normal, blob_id(7)));
        tree.insert("bin", TreeEntry::new(EntryMode::Directory, blob_id(8)));
        tree.insert("run.sh", TreeEntry::new(EntryMode::Executable, blob_id(9)));

        let encoded = tree.encode().unwrap();
        let mut reader = Cursor::new(encoded);
        let kind = ObjectKind::parse_header(&mut reader).unwrap();
        assert_eq!(kind, ObjectKind::Tree);

        let decoded = Tree::decode(reader).unwrap();
        assert_eq!(decoded, tree);
    }
}
