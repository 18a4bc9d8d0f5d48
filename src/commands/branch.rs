use crate::areas::repository::Repository;
use crate::errors::{Error, Result};
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Create a branch at the current `HEAD` commit.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        self.ensure_initialized()?;

        let head = self
            .head_commit()?
            .ok_or_else(|| Error::NotFound("commit at HEAD".to_string()))?;

        self.refs().create_branch(name, &head)
    }

    /// List branches, marking the current one.
    pub fn branches(&self) -> Result<Vec<String>> {
        self.ensure_initialized()?;

        let branches = self.refs().list_branches()?;
        let current = self.refs().head_branch()?;

        for branch in &branches {
            if current.as_deref() == Some(branch) {
                writeln!(self.writer(), "* {}", branch.green())?;
            } else {
                writeln!(self.writer(), "  {branch}")?;
            }
        }

        Ok(branches)
    }

    /// Delete a branch. The current branch cannot be deleted.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        self.ensure_initialized()?;

        if self.refs().head_branch()?.as_deref() == Some(name) {
            return Err(Error::Corrupt(format!(
                "cannot delete the checked-out branch {name}"
            )));
        }

        let oid = self.refs().delete_branch(name)?;
        writeln!(
            self.writer(),
            "Deleted branch {name} (was {})",
            oid.short().yellow()
        )?;

        Ok(())
    }
}
