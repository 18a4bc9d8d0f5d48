//! Checksummed reader/writer for the index file
//!
//! Wraps the underlying file handle and feeds every byte through SHA-1, so
//! the 20-byte trailer can be produced on write and verified on read.

use crate::errors::{Error, Result};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

use crate::artifacts::index::CHECKSUM_SIZE;

pub struct Checksum<Inner> {
    inner: Inner,
    hasher: Sha1,
}

impl<Inner> Checksum<Inner> {
    pub fn new(inner: Inner) -> Self {
        Checksum {
            inner,
            hasher: Sha1::new(),
        }
    }
}

impl<R: Read> Checksum<R> {
    pub fn read(&mut self, size: usize) -> Result<Bytes> {
        let mut buffer = vec![0u8; size];
        self.inner
            .read_exact(&mut buffer)
            .map_err(|_| Error::Corrupt("index file is truncated".to_string()))?;
        self.hasher.update(&buffer);

        Ok(Bytes::from(buffer))
    }

    /// Read the trailing checksum and compare against the digest of
    /// everything read so far.
    pub fn verify(self) -> Result<()> {
        let Checksum { mut inner, hasher } = self;

        let mut stored = [0u8; CHECKSUM_SIZE];
        inner
            .read_exact(&mut stored)
            .map_err(|_| Error::Corrupt("index file is missing its checksum".to_string()))?;

        let computed: [u8; CHECKSUM_SIZE] = hasher.finalize().into();
        if stored != computed {
            return Err(Error::Corrupt("index file checksum mismatch".to_string()));
        }

        Ok(())
    }
}

impl<W: Write> Checksum<W> {
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        self.hasher.update(data);

        Ok(())
    }

    pub fn write_checksum(self) -> Result<()> {
        let Checksum { mut inner, hasher } = self;
        inner.write_all(&hasher.finalize())?;

        Ok(())
    }
}
