//! Object identifier (SHA-1 digest)
//!
//! Object ids are 20-byte SHA-1 digests computed over an object's canonical
//! serialization (type tag, length, body). Equality is byte-equality, so two
//! ids are equal exactly when the serialized objects are identical.
//!
//! ## Storage
//!
//! Loose objects live at `objects/<first-2-hex-chars>/<remaining-38>`.

use crate::errors::{Error, Result};
use std::io;
use std::path::PathBuf;

/// Length of a digest in raw bytes.
pub const DIGEST_LENGTH: usize = 20;

/// Length of a digest rendered as lowercase hex.
pub const HEX_LENGTH: usize = DIGEST_LENGTH * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId([u8; DIGEST_LENGTH]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a 40-character lowercase/uppercase hex string.
    pub fn from_hex(hex40: &str) -> Result<Self> {
        if hex40.len() != HEX_LENGTH {
            return Err(Error::Corrupt(format!(
                "object id must be {} hex characters, got {}",
                HEX_LENGTH,
                hex40.len()
            )));
        }

        let raw = hex::decode(hex40)
            .map_err(|_| Error::Corrupt(format!("object id is not valid hex: {hex40}")))?;

        let mut bytes = [0u8; DIGEST_LENGTH];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form used in human-readable output.
    pub fn short(&self) -> String {
        self.to_hex().split_at(7).0.to_string()
    }

    /// Fan-out path under the objects directory: `ab/cdef...`.
    pub fn to_path(&self) -> PathBuf {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Write the raw 20 digest bytes, used inside tree serializations.
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }

    /// Read 20 raw digest bytes back.
    pub fn read_raw_from<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; DIGEST_LENGTH];
        reader.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;

    #[test]
    fn hex_round_trip() {
        let hex = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
        let oid = ObjectId::from_hex(hex).unwrap();
        assert_eq!(oid.to_hex(), hex);
        assert_eq!(oid.short(), "da39a3e");
    }

    #[test]
    fn fan_out_path_splits_after_two_chars() {
        let oid = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        assert_eq!(oid.to_path(), PathBuf::from("da").join("39a3ee5e6b4b0d3255bfef95601890afd80709"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(ObjectId::from_hex("abc123").is_err());
        assert!(ObjectId::from_hex("").is_err());
    }

    #[test]
    fn rejects_non_hex_characters() {
        assert!(ObjectId::from_hex("zz39a3ee5e6b4b0d3255bfef95601890afd80709").is_err());
    }

    proptest! {
        #[test]
        fn parses_any_valid_hex_digest(hex in "[0-9a-f]{40}") {
            let oid = ObjectId::from_hex(&hex).unwrap();
            assert_eq!(oid.to_hex(), hex);
        }

        #[test]
        fn raw_round_trip(bytes in proptest::array::uniform20(proptest::num::u8::ANY)) {
            let oid = ObjectId::from_bytes(bytes);
            let mut buffer = Vec::new();
            oid.write_raw_to(&mut buffer).unwrap();
            let parsed = ObjectId::read_raw_from(&mut buffer.as_slice()).unwrap();
            assert_eq!(parsed, oid);
        }
    }
}
