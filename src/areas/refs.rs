//! Ref store
//!
//! Refs are named pointers into the commit graph, stored as small text files
//! under `.silt/`. A branch lives at `refs/heads/<name>` and holds a commit
//! id in hex. `HEAD` is either symbolic (`ref: refs/heads/<name>`) or, when
//! detached, a bare commit id.
//!
//! Every ref move goes through [`Refs::update`], a compare-and-set: the
//! caller states the value it believes the ref has, and the update fails
//! with `StaleRef` when the file says otherwise. The check and the rewrite
//! happen under an exclusive file lock.

use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use regex::Regex;
use std::io::{Read, Seek, Write};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

pub const HEAD: &str = "HEAD";
pub const HEADS_PREFIX: &str = "refs/heads";

static SYMBOLIC_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ref: (.+)$").expect("symbolic ref pattern is valid"));

/// Contents of a ref file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    /// Points at another ref by name, as `HEAD` does for a checked-out branch.
    Symbolic(String),
    /// Points directly at a commit.
    Direct(ObjectId),
}

impl RefValue {
    fn parse(raw: &str) -> Result<Option<Self>> {
        let raw = raw.trim();

        if raw.is_empty() {
            return Ok(None);
        }

        if let Some(captures) = SYMBOLIC_REF.captures(raw) {
            return Ok(Some(RefValue::Symbolic(captures[1].to_string())));
        }

        Ok(Some(RefValue::Direct(ObjectId::from_hex(raw)?)))
    }

    fn serialize(&self) -> String {
        match self {
            RefValue::Symbolic(target) => format!("ref: {target}\n"),
            RefValue::Direct(oid) => format!("{oid}\n"),
        }
    }
}

#[derive(Debug)]
pub struct Refs {
    /// The repository metadata directory (`.silt`).
    path: Box<Path>,
}

impl Refs {
    pub fn new(path: Box<Path>) -> Self {
        Refs { path }
    }

    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD)
    }

    pub fn heads_path(&self) -> PathBuf {
        self.path.join(HEADS_PREFIX)
    }

    pub fn branch_path(&self, name: &str) -> PathBuf {
        self.heads_path().join(name)
    }

    pub fn branch_ref(name: &str) -> String {
        format!("{HEADS_PREFIX}/{name}")
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Create a branch pointing at `oid`. Fails with `AlreadyExists` when a
    /// branch with that name is present.
    pub fn create_branch(&self, name: &str, oid: &ObjectId) -> Result<()> {
        let path = self.branch_path(name);
        if path.exists() {
            return Err(Error::AlreadyExists(format!("branch {name}")));
        }

        self.write_ref(&path, &RefValue::Direct(*oid))
    }

    /// Delete a branch, returning the commit it pointed at.
    pub fn delete_branch(&self, name: &str) -> Result<ObjectId> {
        let path = self.branch_path(name);
        let oid = self
            .resolve(&Self::branch_ref(name))?
            .ok_or_else(|| Error::NotFound(format!("branch {name}")))?;

        std::fs::remove_file(&path)?;

        Ok(oid)
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        self.branch_path(name).is_file()
    }

    /// All branch names, sorted.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let heads = self.heads_path();
        let mut branches = Vec::new();

        for entry in WalkDir::new(&heads).min_depth(1) {
            let entry = entry.map_err(|error| Error::Corrupt(error.to_string()))?;
            if entry.file_type().is_file() {
                let name = entry
                    .path()
                    .strip_prefix(&heads)
                    .map_err(|error| Error::Corrupt(error.to_string()))?;
                branches.push(name.to_string_lossy().to_string());
            }
        }

        branches.sort();

        Ok(branches)
    }

    /// Compare-and-set a ref to a new commit id.
    ///
    /// `expected` is the commit the caller believes the ref points at
    /// (`None` for a ref it believes is unborn). On mismatch the ref is left
    /// untouched and `StaleRef` is returned.
    pub fn update(
        &self,
        name: &str,
        new_oid: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> Result<()> {
        let path = self.ref_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let mut lock = file_guard::lock(&mut file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut raw = String::new();
        lock.read_to_string(&mut raw)?;

        let actual = match RefValue::parse(&raw)? {
            Some(RefValue::Direct(oid)) => Some(oid),
            Some(RefValue::Symbolic(target)) => {
                return Err(Error::Corrupt(format!(
                    "ref {name} is symbolic (to {target}), expected a commit id"
                )));
            }
            None => None,
        };

        if actual.as_ref() != expected {
            let describe = |oid: Option<&ObjectId>| {
                oid.map_or_else(|| "unborn".to_string(), ObjectId::to_hex)
            };
            return Err(Error::StaleRef {
                name: name.to_string(),
                expected: describe(expected),
                actual: describe(actual.as_ref()),
            });
        }

        let file = lock.deref_mut();
        file.set_len(0)?;
        file.rewind()?;
        file.write_all(RefValue::Direct(*new_oid).serialize().as_bytes())?;

        Ok(())
    }

    /// Resolve a ref name to a commit id, following at most one symbolic
    /// hop. An absent or empty ref resolves to `None`.
    pub fn resolve(&self, name: &str) -> Result<Option<ObjectId>> {
        match self.read_ref(name)? {
            Some(RefValue::Direct(oid)) => Ok(Some(oid)),
            Some(RefValue::Symbolic(target)) => match self.read_ref(&target)? {
                Some(RefValue::Direct(oid)) => Ok(Some(oid)),
                Some(RefValue::Symbolic(next)) => Err(Error::Corrupt(format!(
                    "ref {target} points at another symbolic ref {next}"
                ))),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    pub fn resolve_head(&self) -> Result<Option<ObjectId>> {
        self.resolve(HEAD)
    }

    /// The branch `HEAD` is on, or `None` when detached or uninitialized.
    pub fn head_branch(&self) -> Result<Option<String>> {
        match self.read_ref(HEAD)? {
            Some(RefValue::Symbolic(target)) => Ok(target
                .strip_prefix(&format!("{HEADS_PREFIX}/"))
                .map(str::to_string)),
            _ => Ok(None),
        }
    }

    pub fn is_head_detached(&self) -> Result<bool> {
        Ok(matches!(self.read_ref(HEAD)?, Some(RefValue::Direct(_))))
    }

    /// Point `HEAD` at a branch symbolically.
    pub fn set_head_to_branch(&self, name: &str) -> Result<()> {
        self.write_ref(
            &self.head_path(),
            &RefValue::Symbolic(Self::branch_ref(name)),
        )
    }

    /// Detach `HEAD` onto a bare commit.
    pub fn set_head_detached(&self, oid: &ObjectId) -> Result<()> {
        self.write_ref(&self.head_path(), &RefValue::Direct(*oid))
    }

    /// Advance whatever `HEAD` designates, with a compare-and-set against
    /// `expected`: the current branch when on one, `HEAD` itself when
    /// detached.
    pub fn advance_head(&self, new_oid: &ObjectId, expected: Option<&ObjectId>) -> Result<()> {
        match self.read_ref(HEAD)? {
            Some(RefValue::Symbolic(target)) => self.update(&target, new_oid, expected),
            _ => self.update(HEAD, new_oid, expected),
        }
    }

    fn read_ref(&self, name: &str) -> Result<Option<RefValue>> {
        let path = self.ref_path(name);

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(Error::Io(error)),
        };

        RefValue::parse(&raw)
    }

    fn write_ref(&self, path: &Path, value: &RefValue) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, value.serialize())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_bytes([byte; 20])
    }

    fn temp_refs(dir: &TempDir) -> Refs {
        Refs::new(dir.path().to_path_buf().into_boxed_path())
    }

    #[test]
    fn unborn_ref_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        assert_eq!(refs.resolve("refs/heads/master").unwrap(), None);
    }

    #[test]
    fn update_from_unborn_then_advance() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.update("refs/heads/master", &oid(1), None).unwrap();
        assert_eq!(refs.resolve("refs/heads/master").unwrap(), Some(oid(1)));

        refs.update("refs/heads/master", &oid(2), Some(&oid(1)))
            .unwrap();
        assert_eq!(refs.resolve("refs/heads/master").unwrap(), Some(oid(2)));
    }

    #[test]
    fn stale_expectation_is_rejected_and_ref_untouched() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.update("refs/heads/master", &oid(1), None).unwrap();

        let result = refs.update("refs/heads/master", &oid(3), Some(&oid(2)));
        assert!(matches!(result, Err(Error::StaleRef { .. })));
        assert_eq!(refs.resolve("refs/heads/master").unwrap(), Some(oid(1)));
    }

    #[test]
    fn unborn_expectation_fails_on_born_ref() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.update("refs/heads/master", &oid(1), None).unwrap();

        let result = refs.update("refs/heads/master", &oid(2), None);
        assert!(matches!(result, Err(Error::StaleRef { .. })));
    }

    #[test]
    fn head_follows_branch_symbolically() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.set_head_to_branch("master").unwrap();
        assert_eq!(refs.resolve_head().unwrap(), None);
        assert_eq!(refs.head_branch().unwrap(), Some("master".to_string()));

        refs.advance_head(&oid(1), None).unwrap();
        assert_eq!(refs.resolve_head().unwrap(), Some(oid(1)));
        assert_eq!(refs.resolve("refs/heads/master").unwrap(), Some(oid(1)));
    }

    #[test]
    fn detached_head_advances_in_place() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.set_head_detached(&oid(1)).unwrap();
        assert!(refs.is_head_detached().unwrap());
        assert_eq!(refs.head_branch().unwrap(), None);

        refs.advance_head(&oid(2), Some(&oid(1))).unwrap();
        assert_eq!(refs.resolve_head().unwrap(), Some(oid(2)));
    }

    #[test]
    fn create_branch_twice_fails() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.create_branch("feature", &oid(1)).unwrap();
        let result = refs.create_branch("feature", &oid(2));
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn delete_branch_returns_its_tip() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.create_branch("feature", &oid(7)).unwrap();
        assert_eq!(refs.delete_branch("feature").unwrap(), oid(7));
        assert!(!refs.branch_exists("feature"));

        let result = refs.delete_branch("feature");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn branches_are_listed_sorted() {
        let dir = TempDir::new().unwrap();
        let refs = temp_refs(&dir);

        refs.create_branch("zeta", &oid(1)).unwrap();
        refs.create_branch("alpha", &oid(2)).unwrap();

        assert_eq!(
            refs.list_branches().unwrap(),
            vec!["alpha".to_string(), "zeta".to_string()]
        );
    }
}
