use crate::areas::repository::Repository;
use crate::errors::Result;
use std::path::PathBuf;

impl Repository {
    /// Unstage files and remove them from the working tree. Fails with
    /// `NotFound` before touching anything when any path is not tracked.
    pub fn rm(&self, paths: &[PathBuf]) -> Result<()> {
        self.ensure_initialized()?;
        self.load_index()?;

        let paths: Vec<PathBuf> = paths.iter().map(|path| self.relativize(path)).collect();

        let mut index = self.index();
        for path in &paths {
            index.remove(path)?;
        }
        index.write_updates()?;
        drop(index);

        for path in &paths {
            self.workspace().remove_file(path)?;
        }

        Ok(())
    }
}
