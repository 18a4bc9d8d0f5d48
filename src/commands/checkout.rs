use crate::areas::repository::Repository;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::revision::Revision;
use crate::errors::Result;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Switch the working tree, index, and `HEAD` to a branch or commit.
    ///
    /// A branch name leaves `HEAD` symbolic on that branch; any other
    /// revision detaches it. Local modifications the switch would clobber
    /// abort the whole operation with `DirtyWorkingTree` before anything
    /// changes.
    pub fn checkout(&self, target: &str) -> Result<()> {
        self.ensure_initialized()?;
        self.load_index()?;

        let oid = Revision::resolve(self, target)?;

        Migration::plan(self, &oid)?.apply()?;

        if self.refs().branch_exists(target) {
            self.refs().set_head_to_branch(target)?;
            writeln!(self.writer(), "Switched to branch '{target}'")?;
        } else {
            self.refs().set_head_detached(&oid)?;
            let commit = self.database().load_commit(&oid)?;
            writeln!(
                self.writer(),
                "HEAD is now at {} {}",
                oid.short().yellow(),
                commit.short_message()
            )?;
        }

        Ok(())
    }
}
