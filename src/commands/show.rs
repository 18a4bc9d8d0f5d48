use crate::areas::repository::Repository;
use crate::artifacts::revision::Revision;
use crate::errors::Result;
use bytes::Bytes;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// File contents at `path` as recorded by a revision's tree.
    ///
    /// Fails with `PathNotFound` when the revision exists but records no
    /// file at that path.
    pub fn show(&self, revision: &str, path: &Path) -> Result<Bytes> {
        self.ensure_initialized()?;

        let oid = Revision::resolve(self, revision)?;
        let content = self.database().read_path(&oid, &self.relativize(path))?;

        self.writer().write_all(&content)?;

        Ok(content)
    }
}
