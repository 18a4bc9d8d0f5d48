//! Porcelain commands, each implemented as an `impl Repository` block in
//! its own file. Commands return structured results for library callers
//! and write their human-readable output to the repository's writer.

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge;
pub mod rm;
pub mod show;
