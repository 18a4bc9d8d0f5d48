//! Content-addressed object store
//!
//! Loose objects are zlib-compressed under `objects/xx/yyyy...`, keyed by the
//! SHA-1 of their canonical serialization. The store is append-only: storing
//! identical bytes twice is a no-op, and existing objects are never rewritten
//! or deleted. That makes it safe for concurrent readers without locking;
//! writers serialize through the ref store's compare-and-set instead.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Decode, Encode, Object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectKind;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use crate::errors::{Error, Result};
use bytes::Bytes;
use fake::rand;
use std::collections::BTreeMap;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store an object, returning its id.
    ///
    /// Idempotent: if an object with the same id already exists on disk the
    /// call does nothing. Writes go through a temp file and an atomic rename.
    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        let oid = object.id()?;
        let object_path = self.path.join(oid.to_path());

        if !object_path.exists() {
            self.write_object(object_path, object.encode()?)?;
        }

        Ok(oid)
    }

    pub fn has(&self, oid: &ObjectId) -> bool {
        self.path.join(oid.to_path()).exists()
    }

    pub fn kind_of(&self, oid: &ObjectId) -> Result<ObjectKind> {
        let (kind, _) = self.open_object(oid)?;
        Ok(kind)
    }

    pub fn load_blob(&self, oid: &ObjectId) -> Result<Blob> {
        let (kind, reader) = self.open_object(oid)?;
        match kind {
            ObjectKind::Blob => Blob::decode(reader),
            other => Err(Error::Corrupt(format!("object {oid} is a {other}, expected a blob"))),
        }
    }

    pub fn load_tree(&self, oid: &ObjectId) -> Result<Tree> {
        let (kind, reader) = self.open_object(oid)?;
        match kind {
            ObjectKind::Tree => Tree::decode(reader),
            other => Err(Error::Corrupt(format!("object {oid} is a {other}, expected a tree"))),
        }
    }

    pub fn load_commit(&self, oid: &ObjectId) -> Result<Commit> {
        let (kind, reader) = self.open_object(oid)?;
        match kind {
            ObjectKind::Commit => Commit::decode(reader),
            other => Err(Error::Corrupt(format!("object {oid} is a {other}, expected a commit"))),
        }
    }

    /// Flatten a tree into a `path -> entry` map of its leaf (blob) entries.
    ///
    /// `None` flattens to the empty map, which keeps callers uniform when a
    /// side of a comparison has no tree yet (pre-initial-commit).
    pub fn flatten_tree(&self, tree_oid: Option<&ObjectId>) -> Result<BTreeMap<PathBuf, TreeEntry>> {
        let mut flat = BTreeMap::new();
        if let Some(oid) = tree_oid {
            self.flatten_into(oid, PathBuf::new(), &mut flat)?;
        }
        Ok(flat)
    }

    /// Flatten the tree of a commit (see [`Self::flatten_tree`]).
    pub fn flatten_commit_tree(
        &self,
        commit_oid: Option<&ObjectId>,
    ) -> Result<BTreeMap<PathBuf, TreeEntry>> {
        let tree_oid = match commit_oid {
            Some(oid) => Some(*self.load_commit(oid)?.tree_oid()),
            None => None,
        };
        self.flatten_tree(tree_oid.as_ref())
    }

    fn flatten_into(
        &self,
        tree_oid: &ObjectId,
        prefix: PathBuf,
        flat: &mut BTreeMap<PathBuf, TreeEntry>,
    ) -> Result<()> {
        let tree = self.load_tree(tree_oid)?;

        for (name, entry) in tree.entries() {
            let path = prefix.join(name);
            if entry.mode.is_tree() {
                self.flatten_into(&entry.oid, path, flat)?;
            } else {
                flat.insert(path, *entry);
            }
        }

        Ok(())
    }

    /// Look up the entry at `path` inside a tree, walking one component at
    /// a time. Returns `None` when any component is absent.
    pub fn entry_at_path(&self, tree_oid: &ObjectId, path: &Path) -> Result<Option<TreeEntry>> {
        let mut current = TreeEntry::new(
            crate::artifacts::objects::entry_mode::EntryMode::Directory,
            *tree_oid,
        );

        for component in path.components() {
            if !current.mode.is_tree() {
                return Ok(None);
            }

            let tree = self.load_tree(&current.oid)?;
            let name = component.as_os_str().to_string_lossy();
            match tree.get(&name) {
                Some(entry) => current = *entry,
                None => return Ok(None),
            }
        }

        Ok(Some(current))
    }

    /// File bytes at `path` as materialized in a commit's tree.
    pub fn read_path(&self, commit_oid: &ObjectId, path: &Path) -> Result<Bytes> {
        let commit = self.load_commit(commit_oid)?;
        let entry = self
            .entry_at_path(commit.tree_oid(), path)?
            .ok_or_else(|| Error::PathNotFound {
                commit: commit_oid.to_hex(),
                path: path.to_path_buf(),
            })?;

        if entry.mode.is_tree() {
            return Err(Error::PathNotFound {
                commit: commit_oid.to_hex(),
                path: path.to_path_buf(),
            });
        }

        Ok(self.load_blob(&entry.oid)?.into_data())
    }

    /// Find all objects whose id starts with the given hex prefix, used to
    /// resolve abbreviated revisions.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let mut matches = Vec::new();

        if prefix.len() < 2 {
            return Ok(matches);
        }

        let dir_name = &prefix[..2];
        let file_prefix = &prefix[2..];
        let dir_path = self.path.join(dir_name);

        if dir_path.is_dir() {
            for entry in std::fs::read_dir(&dir_path)? {
                let entry = entry?;
                let file_name = entry.file_name();
                let file_name = file_name.to_string_lossy();

                if file_name.starts_with(file_prefix)
                    && let Ok(oid) = ObjectId::from_hex(&format!("{dir_name}{file_name}"))
                {
                    matches.push(oid);
                }
            }
        }

        Ok(matches)
    }

    fn open_object(&self, oid: &ObjectId) -> Result<(ObjectKind, impl BufRead + use<>)> {
        let object_path = self.path.join(oid.to_path());

        let compressed = std::fs::read(&object_path).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(format!("object {oid}")),
            _ => Error::Io(error),
        })?;

        let content = Self::decompress(compressed.into())?;
        let mut reader = Cursor::new(content);
        let kind = ObjectKind::parse_header(&mut reader)?;

        Ok((kind, reader))
    }

    fn write_object(&self, object_path: PathBuf, content: Bytes) -> Result<()> {
        let object_dir = object_path.parent().ok_or_else(|| {
            Error::Corrupt(format!("invalid object path {}", object_path.display()))
        })?;
        std::fs::create_dir_all(object_dir)?;

        let temp_object_path = object_dir.join(Self::generate_temp_name());
        let compressed = Self::compress(content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)?;
        file.write_all(&compressed)?;

        // rename makes the write atomic with respect to concurrent readers
        std::fs::rename(&temp_object_path, &object_path)?;

        Ok(())
    }

    fn compress(data: Bytes) -> Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&data)?;

        Ok(encoder.finish()?.into())
    }

    fn decompress(data: Bytes) -> Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|_| Error::Corrupt("unable to decompress object content".to_string()))?;

        Ok(decompressed.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}
