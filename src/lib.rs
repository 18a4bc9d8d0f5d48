//! silt: a minimal content-addressed version-control storage and history
//! engine.
//!
//! Everything hangs off [`areas::repository::Repository`]: an aggregate of
//! the working tree, the object database, the staging index, and the ref
//! store. The porcelain commands in [`commands`] are `impl Repository`
//! methods that return structured results and write human-readable output
//! to an injected writer.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;

pub use errors::{Error, Result};
