//! Shared services used by the binaries.

mod runner;

pub use runner::SyncRunner;
