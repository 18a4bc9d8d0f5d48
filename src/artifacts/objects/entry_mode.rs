use crate::errors::{Error, Result};
use is_executable::IsExecutable;
use std::path::Path;

/// Mode of a tree or index entry.
///
/// Only three modes exist in this scope: regular files, executable files,
/// and directories. Symlinks and submodule-style entries are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum EntryMode {
    #[default]
    Normal,
    Executable,
    Directory,
}

impl EntryMode {
    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::Normal => 0o100644,
            EntryMode::Executable => 0o100755,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn from_u32(mode: u32) -> Result<Self> {
        match mode {
            0o100644 => Ok(EntryMode::Normal),
            0o100755 => Ok(EntryMode::Executable),
            0o40000 => Ok(EntryMode::Directory),
            other => Err(Error::Corrupt(format!("invalid entry mode: {other:o}"))),
        }
    }

    pub fn from_octal_str(mode: &str) -> Result<Self> {
        let mode = u32::from_str_radix(mode, 8)
            .map_err(|_| Error::Corrupt(format!("invalid entry mode: {mode}")))?;
        Self::from_u32(mode)
    }

    /// Detect the mode of a file on disk.
    pub fn detect(path: &Path) -> Self {
        if path.is_dir() {
            EntryMode::Directory
        } else if path.is_executable() {
            EntryMode::Executable
        } else {
            EntryMode::Normal
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:o}", self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octal_round_trip() {
        for mode in [EntryMode::Normal, EntryMode::Executable, EntryMode::Directory] {
            assert_eq!(EntryMode::from_octal_str(&mode.to_string()).unwrap(), mode);
        }
    }

    #[test]
    fn rejects_unknown_modes() {
        assert!(EntryMode::from_u32(0o120000).is_err());
        assert!(EntryMode::from_octal_str("notoctal").is_err());
    }
}
