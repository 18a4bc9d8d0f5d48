//! Storage areas of a repository: the working tree, the content-addressed
//! object database, the staging index, and the ref store, aggregated by
//! [`repository::Repository`].

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
