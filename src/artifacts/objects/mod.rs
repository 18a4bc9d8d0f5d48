//! Storable object types
//!
//! Everything the engine persists is one of three content-addressed object
//! kinds, serialized as `<kind> <size>\0<body>` and keyed by the SHA-1 of
//! those bytes:
//!
//! - **Blob**: raw file content
//! - **Tree**: directory listing (names, modes, object ids)
//! - **Commit**: snapshot with parents, author, and message

pub mod blob;
pub mod commit;
pub mod entry_mode;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;
