use crate::areas::repository::Repository;
use crate::artifacts::log::history::History;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// One commit as reported by `log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub oid: ObjectId,
    pub message: String,
    pub author: String,
    pub timestamp: String,
}

impl Repository {
    /// History of `HEAD`, newest first, optionally restricted to commits
    /// that changed the file at `path`.
    pub fn log(&self, path: Option<&Path>) -> Result<Vec<CommitSummary>> {
        self.ensure_initialized()?;

        let mut history = History::new(self.database(), self.head_commit()?);
        if let Some(path) = path {
            history = history.filtered_by(self.relativize(path));
        }

        let mut summaries = Vec::new();
        for item in history {
            let (oid, commit) = item?;

            writeln!(self.writer(), "{} {}", "commit".yellow(), oid.to_hex().yellow())?;
            writeln!(self.writer(), "Author: {}", commit.author().display_name())?;
            writeln!(self.writer(), "Date:   {}", commit.author().readable_timestamp())?;
            writeln!(self.writer())?;
            for line in commit.message().lines() {
                writeln!(self.writer(), "    {line}")?;
            }
            writeln!(self.writer())?;

            summaries.push(CommitSummary {
                oid,
                message: commit.short_message(),
                author: commit.author().display_name(),
                timestamp: commit.author().readable_timestamp(),
            });
        }

        Ok(summaries)
    }
}
