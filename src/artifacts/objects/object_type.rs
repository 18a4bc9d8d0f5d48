use crate::errors::{Error, Result};
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    /// Consume the `<kind> <size>\0` header from a serialized object,
    /// leaving the reader positioned at the body.
    pub fn parse_header(reader: &mut impl BufRead) -> Result<ObjectKind> {
        let mut kind = Vec::new();
        reader.read_until(b' ', &mut kind)?;

        let kind = String::from_utf8(kind)
            .map_err(|_| Error::Corrupt("object header is not valid UTF-8".to_string()))?;
        let kind = kind.trim();

        // skip the size part up to the NUL terminator
        let mut size = Vec::new();
        reader.read_until(b'\0', &mut size)?;

        ObjectKind::try_from(kind)
    }
}

impl TryFrom<&str> for ObjectKind {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(Error::Corrupt(format!("invalid object kind: {other}"))),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
