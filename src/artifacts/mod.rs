//! Domain artifacts built on top of the storage areas: object model, index
//! format, tree diffing, revision resolution, history walking, working-tree
//! migration, and the merge machinery.

pub mod checkout;
pub mod diff;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
pub mod revision;
