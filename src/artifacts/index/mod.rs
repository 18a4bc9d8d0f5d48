//! Index file format
//!
//! The staging area is persisted as a single binary file:
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "SILT" (4 bytes)
//!   - Version: 1 (4 bytes, big-endian)
//!   - Entry count (4 bytes, big-endian)
//!
//! Entries (variable length, sorted by path then stage):
//!   - mode (4) | stage (1) | oid (20) | path length (2) | path bytes
//!
//! Checksum (20 bytes):
//!   - SHA-1 of all preceding bytes
//! ```

pub mod checksum;
pub mod index_entry;

/// Size of the SHA-1 trailer in bytes.
pub const CHECKSUM_SIZE: usize = 20;

/// Size of the index header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files.
pub const SIGNATURE: &[u8; 4] = b"SILT";

/// Index file format version.
pub const VERSION: u32 = 1;
