//! Cloud/local replication engine.
//!
//! A pass reads every record of one entity type from the source store and
//! merges it into the destination, one entity type at a time in
//! foreign-key order (units, categories, products, variants, sales). How
//! an existing destination record is treated depends on the type's
//! [`MergePolicy`]; timestamped types use [`resolve`].
//!
//! A failure inside one entity type is recorded on the [`SyncResult`] and
//! rolled back without stopping the types that follow it.

mod memory;
mod policy;
mod resolver;
mod result;
mod service;
mod stats;
mod store;

#[cfg(test)]
mod tests;

pub use memory::{MemoryEntity, MemoryStore, StoreCall, StoreOp};
pub use policy::{EntityKind, MergePolicy, SyncEntity};
pub use resolver::{describe, has_conflict, resolve, Resolution};
pub use result::{SyncDirection, SyncResult};
pub use service::SyncService;
pub use stats::{EntityCounts, SyncStats};
pub use store::{EntityStore, SaleStore, Side, Store};
