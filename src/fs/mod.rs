//! File System Module
//!
//! Provides the virtual file system used by the sandbox: a pure, synchronous,
//! value-semantic in-memory tree (`Vfs`). No trait object / async dispatch —
//! the sandbox owns a concrete `Vfs` and clones it for pipeline/subshell forks.

pub mod types;
pub mod vfs;

pub use types::*;
pub use vfs::Vfs;
