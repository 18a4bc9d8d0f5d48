//! Repository aggregate
//!
//! Ties the four storage areas together: the working tree, the object
//! database, the index, and the ref store. Commands operate on a
//! `Repository` and write their human-readable output to its injected
//! writer, which keeps them testable against an in-memory sink.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::cell::{RefCell, RefMut};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the repository metadata directory.
pub const META_DIR: &str = ".silt";

pub struct Repository {
    path: PathBuf,
    workspace: Workspace,
    database: Database,
    index: RefCell<Index>,
    refs: Refs,
    writer: RefCell<Box<dyn Write>>,
}

impl Repository {
    pub fn new(path: impl AsRef<Path>, writer: Box<dyn Write>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let path = path.canonicalize()?;

        let meta = path.join(META_DIR);

        Ok(Repository {
            workspace: Workspace::new(path.clone().into_boxed_path()),
            database: Database::new(meta.join("objects").into_boxed_path()),
            index: RefCell::new(Index::new(meta.join("index").into_boxed_path())),
            refs: Refs::new(meta.into_boxed_path()),
            path,
            writer: RefCell::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta_path(&self) -> PathBuf {
        self.path.join(META_DIR)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn index(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn writer(&self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    pub fn is_initialized(&self) -> bool {
        self.meta_path().is_dir()
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::NotFound(format!(
                "repository in {}",
                self.path.display()
            )));
        }

        Ok(())
    }

    /// The commit `HEAD` resolves to, if any commit exists yet.
    pub fn head_commit(&self) -> Result<Option<ObjectId>> {
        self.refs.resolve_head()
    }

    /// Load the index from disk into memory.
    pub fn load_index(&self) -> Result<()> {
        self.index.borrow_mut().rehydrate()
    }
}
