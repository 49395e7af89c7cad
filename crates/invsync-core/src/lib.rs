//! invsync-core - Core library for Invsync
//!
//! This crate contains the inventory models, the libSQL database layer, and
//! the engine that replicates a tenant's records between the cloud store and
//! its local backup.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::TenantId;
pub use sync::{SyncDirection, SyncResult, SyncService};
