//! Sale and sale line models

use serde::{Deserialize, Serialize};

/// A completed sale. Sales are append-only once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Unique identifier, preserved verbatim when replicated
    pub id: i64,
    pub customer_name: Option<String>,
    /// When the sale happened (Unix ms)
    pub sold_at: i64,
    pub payment_method: String,
    pub total_cents: i64,
}

/// One line of a sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    /// Row id, assigned by whichever store the item is inserted into
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Product name as it was at the time of sale
    pub product_name: Option<String>,
}

impl SaleItem {
    /// Line subtotal in minor units
    #[must_use]
    pub const fn subtotal_cents(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price_cents)
    }
}
