//! Blob object: one file version's raw bytes
//!
//! Blobs carry no name or mode; those live in the tree entries that
//! reference them. Identical content always produces the same blob id.

use crate::artifacts::objects::object::{Decode, Encode, Object};
use crate::artifacts::objects::object_type::ObjectKind;
use crate::errors::Result;
use bytes::Bytes;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Blob { data: data.into() }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}

impl Encode for Blob {
    fn encode(&self) -> Result<Bytes> {
        let mut blob_bytes = Vec::new();
        let header = format!("{} {}\0", self.kind().as_str(), self.data.len());
        blob_bytes.write_all(header.as_bytes())?;
        blob_bytes.write_all(&self.data)?;

        Ok(Bytes::from(blob_bytes))
    }
}

impl Decode for Blob {
    fn decode(reader: impl BufRead) -> Result<Self> {
        // the header has already been consumed
        let data = reader
            .bytes()
            .collect::<std::result::Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(data))
    }
}

impl Object for Blob {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Blob
    }
}
