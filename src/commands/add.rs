use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage files for the next commit.
    ///
    /// Paths are relative to the repository root; a directory stages every
    /// file under it. Staging a path clears any conflict stages it carried,
    /// which is how a merge conflict is marked resolved.
    pub fn add(&self, paths: &[PathBuf]) -> Result<()> {
        self.ensure_initialized()?;
        self.load_index()?;

        let mut files = Vec::new();
        for path in paths {
            files.extend(self.expand_path(path)?);
        }

        let mut index = self.index();
        for file in files {
            let blob = self.workspace().parse_blob(&file)?;
            let oid = self.database().store(&blob)?;
            let mode = self.workspace().detect_mode(&file);
            index.add(IndexEntry::staged(file, oid, mode));
        }
        index.write_updates()?;

        Ok(())
    }

    fn expand_path(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let path = self.relativize(path);
        let absolute = self.workspace().absolutize(&path);

        if absolute.is_dir() {
            self.workspace().list_files(&path)
        } else if absolute.is_file() {
            Ok(vec![path])
        } else {
            Err(Error::NotFound(format!("path {}", path.display())))
        }
    }

    /// Make a user-supplied path repository-relative, stripping the root
    /// prefix off absolute paths inside the workspace.
    pub(crate) fn relativize(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.path())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
