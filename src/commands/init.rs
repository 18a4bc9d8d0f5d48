use crate::areas::refs::HEADS_PREFIX;
use crate::areas::repository::Repository;
use crate::errors::{Error, Result};
use std::io::Write;

/// Name of the branch a fresh repository starts on.
pub const DEFAULT_BRANCH: &str = "master";

impl Repository {
    /// Create the repository skeleton: the object store, the ref store, an
    /// empty index, and a symbolic `HEAD` on the (unborn) default branch.
    pub fn init(&self) -> Result<()> {
        if self.is_initialized() {
            return Err(Error::AlreadyExists(format!(
                "repository in {}",
                self.path().display()
            )));
        }

        std::fs::create_dir_all(self.database().objects_path())?;
        std::fs::create_dir_all(self.refs().heads_path())?;
        self.refs().set_head_to_branch(DEFAULT_BRANCH)?;
        self.index().write_updates()?;

        writeln!(
            self.writer(),
            "Initialized empty silt repository in {}",
            self.meta_path().display()
        )?;

        Ok(())
    }
}
