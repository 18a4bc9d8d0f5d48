//! Index entry representation
//!
//! Each entry records one staged path: its blob id, mode, and merge stage.
//! Stage 0 is a normally staged file; stages 1/2/3 hold the base, ours, and
//! theirs versions of a path while a merge conflict is unresolved. Stage-0
//! and conflict-stage entries for the same path never coexist.

use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::{DIGEST_LENGTH, ObjectId};
use crate::errors::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::Read;
use std::path::PathBuf;

/// Maximum path length supported in index entries.
const MAX_PATH_SIZE: usize = 4095;

/// Size of the fixed-width prefix of a serialized entry:
/// mode (4) + stage (1) + oid (20) + path length (2).
pub const ENTRY_FIXED_SIZE: usize = 4 + 1 + DIGEST_LENGTH + 2;

/// Merge stage of an index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    #[default]
    Normal,
    Base,
    Ours,
    Theirs,
}

impl Stage {
    pub fn as_u8(&self) -> u8 {
        match self {
            Stage::Normal => 0,
            Stage::Base => 1,
            Stage::Ours => 2,
            Stage::Theirs => 3,
        }
    }

    pub fn from_u8(stage: u8) -> Result<Self> {
        match stage {
            0 => Ok(Stage::Normal),
            1 => Ok(Stage::Base),
            2 => Ok(Stage::Ours),
            3 => Ok(Stage::Theirs),
            other => Err(Error::Corrupt(format!("invalid index stage: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Path relative to the repository root.
    pub path: PathBuf,
    /// Blob id of the staged content.
    pub oid: ObjectId,
    pub mode: EntryMode,
    pub stage: Stage,
}

impl IndexEntry {
    pub fn staged(path: PathBuf, oid: ObjectId, mode: EntryMode) -> Self {
        Self::new(path, oid, mode, Stage::Normal)
    }

    pub fn encode(&self) -> Result<Bytes> {
        let path = self.path.to_string_lossy();
        let path_bytes = path.as_bytes();
        if path_bytes.len() > MAX_PATH_SIZE {
            return Err(Error::Corrupt(format!("path too long for index: {path}")));
        }

        let mut bytes = Vec::with_capacity(ENTRY_FIXED_SIZE + path_bytes.len());
        bytes.write_u32::<BigEndian>(self.mode.as_u32())?;
        bytes.write_u8(self.stage.as_u8())?;
        bytes.extend_from_slice(self.oid.as_bytes());
        bytes.write_u16::<BigEndian>(path_bytes.len() as u16)?;
        bytes.extend_from_slice(path_bytes);

        Ok(Bytes::from(bytes))
    }

    /// Decode the fixed-width prefix, returning the entry with an empty path
    /// plus the number of path bytes that follow.
    pub fn decode_prefix(mut reader: impl Read) -> Result<(Self, usize)> {
        let mode = EntryMode::from_u32(reader.read_u32::<BigEndian>()?)?;
        let stage = Stage::from_u8(reader.read_u8()?)?;
        let oid = ObjectId::read_raw_from(&mut reader)?;
        let path_len = reader.read_u16::<BigEndian>()? as usize;

        Ok((Self::new(PathBuf::new(), oid, mode, stage), path_len))
    }

    pub fn with_path_bytes(mut self, path_bytes: &[u8]) -> Result<Self> {
        let path = std::str::from_utf8(path_bytes)
            .map_err(|_| Error::Corrupt("index entry path is not valid UTF-8".to_string()))?;
        self.path = PathBuf::from(path);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn encode_decode_round_trip() {
        let entry = IndexEntry::new(
            PathBuf::from("src/deeply/nested/file.rs"),
            ObjectId::from_bytes([42; 20]),
            EntryMode::Executable,
            Stage::Theirs,
        );

        let encoded = entry.encode().unwrap();
        let mut reader = Cursor::new(encoded.clone());
        let (prefix, path_len) = IndexEntry::decode_prefix(&mut reader).unwrap();

        assert_eq!(ENTRY_FIXED_SIZE + path_len, encoded.len());
        let decoded = prefix
            .with_path_bytes(&encoded[ENTRY_FIXED_SIZE..])
            .unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn stage_round_trip() {
        for stage in [Stage::Normal, Stage::Base, Stage::Ours, Stage::Theirs] {
            assert_eq!(Stage::from_u8(stage.as_u8()).unwrap(), stage);
        }
        assert!(Stage::from_u8(4).is_err());
    }
}
