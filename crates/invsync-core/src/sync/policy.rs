//! Entity kinds, their processing order, and how each one is merged.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Category, Product, ProductVariant, Sale, Unit};

/// Every entity type the sync engine knows about, in processing order.
///
/// The order follows the foreign-key chain: units and categories before
/// products, products before variants and sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Unit,
    Category,
    Product,
    ProductVariant,
    Sale,
    Customer,
}

impl EntityKind {
    /// All kinds in the order a pass processes them
    pub const ALL: [Self; 6] = [
        Self::Unit,
        Self::Category,
        Self::Product,
        Self::ProductVariant,
        Self::Sale,
        Self::Customer,
    ];

    /// Position of this kind within a pass (0-based)
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Plural label used in logs, stats, and error messages
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Unit => "units",
            Self::Category => "categories",
            Self::Product => "products",
            Self::ProductVariant => "variants",
            Self::Sale => "sales",
            Self::Customer => "customers",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// How a source record is merged into an existing destination record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// No timestamp: the source side of the pass always overwrites
    Overwrite,
    /// Timestamped: the strictly later `updated_at` wins
    LastWriteWins,
    /// Immutable once replicated: insert when missing, never update
    AppendOnly,
}

/// A record the sync engine can replicate
pub trait SyncEntity: Clone {
    /// Which entity type this is
    const KIND: EntityKind;
    /// How existing destination copies are treated
    const POLICY: MergePolicy;

    /// Primary id, shared by both stores
    fn id(&self) -> i64;

    /// Last modification stamp (Unix ms). Only read for `LastWriteWins`.
    fn updated_at(&self) -> Option<i64> {
        None
    }
}

impl SyncEntity for Unit {
    const KIND: EntityKind = EntityKind::Unit;
    const POLICY: MergePolicy = MergePolicy::Overwrite;

    fn id(&self) -> i64 {
        self.id
    }
}

impl SyncEntity for Category {
    const KIND: EntityKind = EntityKind::Category;
    const POLICY: MergePolicy = MergePolicy::Overwrite;

    fn id(&self) -> i64 {
        self.id
    }
}

impl SyncEntity for Product {
    const KIND: EntityKind = EntityKind::Product;
    const POLICY: MergePolicy = MergePolicy::LastWriteWins;

    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }
}

impl SyncEntity for ProductVariant {
    const KIND: EntityKind = EntityKind::ProductVariant;
    const POLICY: MergePolicy = MergePolicy::LastWriteWins;

    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }
}

impl SyncEntity for Sale {
    const KIND: EntityKind = EntityKind::Sale;
    const POLICY: MergePolicy = MergePolicy::AppendOnly;

    fn id(&self) -> i64 {
        self.id
    }
}
