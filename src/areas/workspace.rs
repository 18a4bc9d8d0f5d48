//! Working tree access
//!
//! All paths handed to the workspace are relative to the repository root;
//! the workspace joins, reads, writes, and deletes, and keeps the metadata
//! directory out of file listings. Nothing here consults the index or the
//! object store.

use crate::areas::repository::META_DIR;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::errors::Result;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn root(&self) -> &Path {
        &self.path
    }

    pub fn absolutize(&self, path: &Path) -> PathBuf {
        self.path.join(path)
    }

    /// All regular files under `start` (a repository-relative path, or the
    /// whole tree for `""`), relative to the repository root, sorted.
    pub fn list_files(&self, start: &Path) -> Result<Vec<PathBuf>> {
        let start = self.absolutize(start);
        let mut files = Vec::new();

        let walker = WalkDir::new(&start)
            .min_depth(usize::from(start == *self.path))
            .into_iter()
            .filter_entry(|entry| entry.file_name() != META_DIR);

        for entry in walker {
            let entry = entry.map_err(|error| {
                crate::errors::Error::Corrupt(format!("unable to walk working tree: {error}"))
            })?;
            if entry.file_type().is_file() {
                files.push(
                    entry
                        .path()
                        .strip_prefix(&self.path)
                        .expect("walked paths live under the workspace root")
                        .to_path_buf(),
                );
            }
        }

        files.sort();

        Ok(files)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.absolutize(path).exists()
    }

    pub fn read_file(&self, path: &Path) -> Result<Bytes> {
        Ok(std::fs::read(self.absolutize(path))?.into())
    }

    /// Read a working-tree file into a blob, for hashing it against staged
    /// or committed content.
    pub fn parse_blob(&self, path: &Path) -> Result<Blob> {
        Ok(Blob::new(self.read_file(path)?))
    }

    pub fn detect_mode(&self, path: &Path) -> EntryMode {
        EntryMode::detect(&self.absolutize(path))
    }

    /// Write file contents, creating parent directories and applying the
    /// entry mode's permissions.
    pub fn write_file(&self, path: &Path, data: &[u8], mode: EntryMode) -> Result<()> {
        let absolute = self.absolutize(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&absolute, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(match mode {
                EntryMode::Executable => 0o755,
                _ => 0o644,
            });
            std::fs::set_permissions(&absolute, permissions)?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }

    /// Write a whole tree's contents under `dest` (a repository-relative
    /// directory), creating directories as needed. Existing files are
    /// overwritten.
    pub fn materialize(
        &self,
        database: &crate::areas::database::Database,
        tree_oid: &crate::artifacts::objects::object_id::ObjectId,
        dest: &Path,
    ) -> Result<()> {
        for (path, entry) in database.flatten_tree(Some(tree_oid))? {
            let blob = database.load_blob(&entry.oid)?;
            self.write_file(&dest.join(path), blob.data(), entry.mode)?;
        }

        Ok(())
    }

    /// Remove a file and any directories the removal leaves empty.
    pub fn remove_file(&self, path: &Path) -> Result<()> {
        let absolute = self.absolutize(path);

        match std::fs::remove_file(&absolute) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(error.into()),
        }

        let mut parent = absolute.parent();
        while let Some(dir) = parent {
            if dir == &*self.path || std::fs::remove_dir(dir).is_err() {
                break;
            }
            parent = dir.parent();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    fn temp_workspace(dir: &TempDir) -> Workspace {
        Workspace::new(dir.path().to_path_buf().into_boxed_path())
    }

    #[test]
    fn listing_skips_the_metadata_directory() {
        let dir = TempDir::new().unwrap();
        dir.child("a.txt").write_str("a").unwrap();
        dir.child("nested/b.txt").write_str("b").unwrap();
        dir.child(".silt/HEAD").write_str("ref: refs/heads/master").unwrap();

        let workspace = temp_workspace(&dir);
        let files = workspace.list_files(Path::new("")).unwrap();

        assert_eq!(
            files,
            vec![PathBuf::from("a.txt"), PathBuf::from("nested/b.txt")]
        );
    }

    #[test]
    fn listing_a_subdirectory_keeps_paths_repository_relative() {
        let dir = TempDir::new().unwrap();
        dir.child("nested/deep/c.txt").write_str("c").unwrap();
        dir.child("top.txt").write_str("t").unwrap();

        let workspace = temp_workspace(&dir);
        let files = workspace.list_files(Path::new("nested")).unwrap();

        assert_eq!(files, vec![PathBuf::from("nested/deep/c.txt")]);
    }

    #[test]
    fn removal_prunes_empty_parents() {
        let dir = TempDir::new().unwrap();
        dir.child("deep/nested/file.txt").write_str("x").unwrap();

        let workspace = temp_workspace(&dir);
        workspace.remove_file(Path::new("deep/nested/file.txt")).unwrap();

        assert!(!dir.path().join("deep").exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn removal_keeps_populated_parents() {
        let dir = TempDir::new().unwrap();
        dir.child("deep/file.txt").write_str("x").unwrap();
        dir.child("deep/other.txt").write_str("y").unwrap();

        let workspace = temp_workspace(&dir);
        workspace.remove_file(Path::new("deep/file.txt")).unwrap();

        assert!(dir.path().join("deep/other.txt").exists());
    }

    #[test]
    fn materialize_writes_a_whole_tree() {
        use crate::areas::database::Database;
        use crate::artifacts::index::index_entry::IndexEntry;
        use crate::artifacts::objects::tree::Tree;

        let objects = TempDir::new().unwrap();
        let database = Database::new(objects.path().to_path_buf().into_boxed_path());

        let a = database.store(&Blob::new("alpha".as_bytes().to_vec())).unwrap();
        let b = database.store(&Blob::new("beta".as_bytes().to_vec())).unwrap();
        let entries = vec![
            IndexEntry::staged(PathBuf::from("a.txt"), a, EntryMode::Normal),
            IndexEntry::staged(PathBuf::from("sub/b.txt"), b, EntryMode::Normal),
        ];
        let tree_oid = Tree::write_from_entries(&database, entries.iter()).unwrap();

        let dir = TempDir::new().unwrap();
        let workspace = temp_workspace(&dir);
        workspace
            .materialize(&database, &tree_oid, Path::new("out"))
            .unwrap();

        assert_eq!(
            workspace.read_file(Path::new("out/a.txt")).unwrap(),
            Bytes::from_static(b"alpha")
        );
        assert_eq!(
            workspace.read_file(Path::new("out/sub/b.txt")).unwrap(),
            Bytes::from_static(b"beta")
        );
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let workspace = temp_workspace(&dir);

        workspace
            .write_file(Path::new("a/b/c.txt"), b"content", EntryMode::Normal)
            .unwrap();

        assert_eq!(
            workspace.read_file(Path::new("a/b/c.txt")).unwrap(),
            Bytes::from_static(b"content")
        );
    }
}
