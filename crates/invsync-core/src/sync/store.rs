//! Store adapter contract consumed by the sync engine.
//!
//! Every adapter is bound to one tenant when it is constructed; none of these
//! methods take a tenant argument and none may touch another tenant's rows.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::policy::SyncEntity;
use crate::error::Result;
use crate::models::{Category, Product, ProductVariant, Sale, SaleItem, Unit};

/// Which of the two replicated stores an adapter talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Cloud,
    Local,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cloud => "cloud",
            Self::Local => "local",
        })
    }
}

/// Read-all and point-write access to one entity type (async)
#[allow(async_fn_in_trait)]
pub trait EntityStore<E: SyncEntity> {
    /// Every record of this type for the tenant
    async fn find_all(&self) -> Result<Vec<E>>;

    /// Insert a record keeping its id; returns the id
    async fn insert(&self, entity: &E) -> Result<i64>;

    /// Overwrite an existing record, `updated_at` included
    async fn update(&self, entity: &E) -> Result<()>;

    /// Remove a record by id
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

/// Sales plus the line items they own
#[allow(async_fn_in_trait)]
pub trait SaleStore: EntityStore<Sale> {
    /// Items belonging to a sale
    async fn find_items(&self, sale_id: i64) -> Result<Vec<SaleItem>>;

    /// Insert an item; the store assigns the item id and returns it
    async fn insert_item(&self, item: &SaleItem) -> Result<i64>;
}

/// A complete per-side adapter as driven by [`SyncService`](super::SyncService)
#[allow(async_fn_in_trait)]
pub trait Store:
    EntityStore<Unit>
    + EntityStore<Category>
    + EntityStore<Product>
    + EntityStore<ProductVariant>
    + SaleStore
{
    /// Which side this adapter represents
    fn side(&self) -> Side;

    /// Make sure the store is reachable before a pass starts
    async fn check_connection(&self) -> Result<()>;

    /// Open the transaction that scopes one entity-type phase
    async fn begin_phase(&self) -> Result<()>;

    /// Commit the current phase
    async fn commit_phase(&self) -> Result<()>;

    /// Discard every write made since `begin_phase`
    async fn rollback_phase(&self) -> Result<()>;
}
