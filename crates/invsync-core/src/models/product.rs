//! Product and product variant models

use serde::{Deserialize, Serialize};

/// A sellable product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier, shared between cloud and local stores
    pub id: i64,
    /// Short label / SKU printed on tags
    pub label: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub unit_id: i64,
    /// Sale price in minor units
    pub price_cents: i64,
    /// Cost price in minor units
    pub cost_cents: i64,
    pub stock_on_hand: i64,
    pub active: bool,
    /// Last update timestamp (Unix ms), `None` when never stamped
    pub updated_at: Option<i64>,
}

/// A color/size variant of a product with its own price and stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub stock: i64,
    pub label: Option<String>,
    pub active: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: Option<i64>,
    /// Last update timestamp (Unix ms)
    pub updated_at: Option<i64>,
}
