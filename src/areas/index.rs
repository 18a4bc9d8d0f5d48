//! Staging area (index)
//!
//! The index is an ordered mapping from working-tree path to staged blob
//! reference: the snapshot that will become the next commit's tree. During
//! an unresolved merge it additionally holds stage-1/2/3 entries (base,
//! ours, theirs) for each conflicting path; those block tree building until
//! the caller resolves them with a fresh `add`.
//!
//! The on-disk format is described in [`crate::artifacts::index`].

use crate::areas::database::Database;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_FIXED_SIZE, IndexEntry, Stage};
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use crate::errors::{Error, Result};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::collections::BTreeMap;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Index {
    /// Path to the index file (typically `.silt/index`).
    path: Box<Path>,
    /// Staged entries keyed by (path, stage).
    entries: BTreeMap<(PathBuf, Stage), IndexEntry>,
    /// Set when in-memory state differs from the file.
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stage-0 entry for a path, if any.
    pub fn entry(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(&(path.to_path_buf(), Stage::Normal))
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn staged_entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries
            .values()
            .filter(|entry| entry.stage == Stage::Normal)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upsert a stage-0 entry, replacing any prior entry for the path —
    /// including conflict stages, which makes `add` the conflict-resolution
    /// primitive.
    pub fn add(&mut self, entry: IndexEntry) {
        self.remove_all_stages(&entry.path);
        self.entries
            .insert((entry.path.clone(), Stage::Normal), entry);
        self.changed = true;
    }

    /// Remove every entry for a path. Fails with `NotFound` when the path
    /// is not tracked at any stage.
    pub fn remove(&mut self, path: &Path) -> Result<()> {
        if self.remove_all_stages(path) == 0 {
            return Err(Error::NotFound(format!(
                "path {} in the index",
                path.display()
            )));
        }
        self.changed = true;

        Ok(())
    }

    fn remove_all_stages(&mut self, path: &Path) -> usize {
        let mut removed = 0;
        for stage in [Stage::Normal, Stage::Base, Stage::Ours, Stage::Theirs] {
            if self.entries.remove(&(path.to_path_buf(), stage)).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Record a merge conflict for a path: the stage-0 entry is dropped and
    /// the present sides land at stages 1/2/3.
    pub fn record_conflict(
        &mut self,
        path: &Path,
        base: Option<TreeEntry>,
        ours: Option<TreeEntry>,
        theirs: Option<TreeEntry>,
    ) {
        self.remove_all_stages(path);

        for (stage, side) in [
            (Stage::Base, base),
            (Stage::Ours, ours),
            (Stage::Theirs, theirs),
        ] {
            if let Some(entry) = side {
                self.entries.insert(
                    (path.to_path_buf(), stage),
                    IndexEntry::new(path.to_path_buf(), entry.oid, entry.mode, stage),
                );
            }
        }

        self.changed = true;
    }

    pub fn has_conflicts(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.stage != Stage::Normal)
    }

    pub fn has_conflict_at(&self, path: &Path) -> bool {
        [Stage::Base, Stage::Ours, Stage::Theirs]
            .iter()
            .any(|stage| self.entries.contains_key(&(path.to_path_buf(), *stage)))
    }

    pub fn conflict_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .entries
            .values()
            .filter(|entry| entry.stage != Stage::Normal)
            .map(|entry| entry.path.clone())
            .collect();
        paths.dedup();
        paths
    }

    /// Replace the whole index with stage-0 entries mirroring a flattened
    /// tree, as checkout and merge do after updating the working tree.
    pub fn replace_with(&mut self, flat_tree: &BTreeMap<PathBuf, TreeEntry>) {
        self.entries.clear();
        for (path, entry) in flat_tree {
            self.entries.insert(
                (path.clone(), Stage::Normal),
                IndexEntry::staged(path.clone(), entry.oid, entry.mode),
            );
        }
        self.changed = true;
    }

    /// Group the flat stage-0 entries into nested tree objects, storing each
    /// level, and return the root tree id.
    ///
    /// Fails with `UnresolvedConflict` while any conflict stage is present.
    pub fn write_tree(&self, database: &Database) -> Result<ObjectId> {
        if self.has_conflicts() {
            return Err(Error::UnresolvedConflict {
                paths: self.conflict_paths(),
            });
        }

        Tree::write_from_entries(database, self.staged_entries())
    }

    /// Load the index from disk, verifying the checksum. A missing or empty
    /// file yields an empty index.
    pub fn rehydrate(&mut self) -> Result<()> {
        self.entries.clear();
        self.changed = false;

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new().read(true).open(&self.path)?;
        if index_file.metadata()?.len() == 0 {
            return Ok(());
        }

        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        let mut reader = Checksum::new(&mut **lock.deref_mut());
        let entries_count = self.parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        reader.verify()
    }

    fn parse_header(&self, reader: &mut Checksum<&mut std::fs::File>) -> Result<u32> {
        let header = reader.read(HEADER_SIZE)?;

        if &header[..4] != SIGNATURE {
            return Err(Error::Corrupt("invalid index file signature".to_string()));
        }

        let version = BigEndian::read_u32(&header[4..8]);
        if version != VERSION {
            return Err(Error::Corrupt(format!(
                "unsupported index file version: {version}"
            )));
        }

        Ok(BigEndian::read_u32(&header[8..12]))
    }

    fn parse_entries(
        &mut self,
        entries_count: u32,
        reader: &mut Checksum<&mut std::fs::File>,
    ) -> Result<()> {
        for _ in 0..entries_count {
            let prefix_bytes = reader.read(ENTRY_FIXED_SIZE)?;
            let (entry, path_len) = IndexEntry::decode_prefix(prefix_bytes.as_ref())?;

            let path_bytes = reader.read(path_len)?;
            let entry = entry.with_path_bytes(&path_bytes)?;

            self.entries
                .insert((entry.path.clone(), entry.stage), entry);
        }

        Ok(())
    }

    /// Persist the current entries under an exclusive lock. A no-op when
    /// nothing changed since the last load or write.
    pub fn write_updates(&mut self) -> Result<()> {
        if !self.changed && self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = Checksum::new(lock.deref_mut());

        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend_from_slice(SIGNATURE);
        header.write_u32::<BigEndian>(VERSION)?;
        header.write_u32::<BigEndian>(self.entries.len() as u32)?;
        writer.write(&header)?;

        for entry in self.entries.values() {
            writer.write(&entry.encode()?)?;
        }

        writer.write_checksum()?;
        self.changed = false;

        Ok(())
    }
}
