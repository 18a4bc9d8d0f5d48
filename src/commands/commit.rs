use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use colored::Colorize;
use std::io::Write;

/// Options for creating a commit.
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    pub message: String,
    /// `Name <email>` override; falls back to the environment identity.
    pub author: Option<String>,
}

impl Repository {
    /// Record the staged snapshot as a new commit and advance the current
    /// branch (or a detached `HEAD`) to it.
    ///
    /// Fails with `UnresolvedConflict` while the index holds conflict
    /// stages, and with `StaleRef` when the branch moved since the parent
    /// was read.
    pub fn commit(&self, options: &CommitOptions) -> Result<ObjectId> {
        self.ensure_initialized()?;
        self.load_index()?;

        let parent = self.head_commit()?;
        let tree_oid = self.index().write_tree(self.database())?;

        let author = match &options.author {
            Some(ident) => Author::parse_ident(ident)?,
            None => Author::load_from_env(),
        };

        let commit = Commit::new(
            parent.iter().copied().collect(),
            tree_oid,
            author,
            options.message.clone(),
        );
        let is_root = commit.is_root();
        let oid = self.database().store(&commit)?;

        self.refs().advance_head(&oid, parent.as_ref())?;

        let location = match self.refs().head_branch()? {
            Some(branch) => branch,
            None => "detached HEAD".to_string(),
        };
        writeln!(
            self.writer(),
            "[{location}{} {}] {}",
            if is_root { " (root-commit)" } else { "" },
            oid.short().yellow(),
            commit.short_message()
        )?;

        Ok(oid)
    }
}
