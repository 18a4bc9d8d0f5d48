//! Error kinds reported by repository operations
//!
//! Every expected failure is a distinct, matchable variant. Only `StaleRef`
//! is meant to be retried by the caller (re-read the ref and try again);
//! all other kinds are terminal for the current operation.
//!
//! A merge that ends with conflicts is a normal `MergeResult`, not an error.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A requested object, ref, path, or repository does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Creating something that is already present (ref, repository).
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Compare-and-set on a ref observed a different value than expected.
    /// The caller should re-read the ref and retry.
    #[error("ref {name} changed concurrently (expected {expected}, found {actual})")]
    StaleRef {
        name: String,
        expected: String,
        actual: String,
    },

    /// Commit attempted while the index still holds conflict stages.
    #[error("unresolved merge conflicts in: {}", format_paths(paths))]
    UnresolvedConflict { paths: Vec<PathBuf> },

    /// Checkout would silently discard uncommitted modifications.
    #[error("uncommitted changes would be overwritten: {}", format_paths(paths))]
    DirtyWorkingTree { paths: Vec<PathBuf> },

    /// History or show query on a path absent from the commit's tree.
    #[error("path {} does not exist in commit {commit}", path.display())]
    PathNotFound { commit: String, path: PathBuf },

    /// A revision prefix resolves to more than one object.
    #[error("revision '{spec}' is ambiguous ({candidates} matching objects)")]
    AmbiguousRevision { spec: String, candidates: usize },

    /// On-disk data that cannot be parsed back (truncated object, bad
    /// checksum, malformed ref file).
    #[error("corrupt repository data: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
