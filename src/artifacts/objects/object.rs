use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectKind;
use crate::errors::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;
use std::path::PathBuf;

/// Serialization into the canonical `<kind> <size>\0<body>` form.
pub trait Encode {
    fn encode(&self) -> Result<Bytes>;
}

/// Deserialization of an object body (the header has already been consumed).
pub trait Decode {
    fn decode(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// A storable object: blob, tree, or commit.
///
/// The object's id is the SHA-1 digest of its canonical serialization, so
/// identical content always hashes to the same id and ids never collide for
/// different kinds (the kind tag is part of the hashed bytes).
pub trait Object: Encode {
    fn kind(&self) -> ObjectKind;

    fn id(&self) -> Result<ObjectId> {
        let content = self.encode()?;
        let mut hasher = Sha1::new();
        hasher.update(&content);

        let digest = hasher.finalize();
        Ok(ObjectId::from_bytes(digest.into()))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.id()?.to_path())
    }
}
