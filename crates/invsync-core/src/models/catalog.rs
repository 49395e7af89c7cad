//! Catalog reference data: units of measure and categories

use serde::{Deserialize, Serialize};

/// A unit of measure (e.g. "Kilogram" / "kg")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
}

/// A product category. Categories form a tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Parent category, `None` for a root
    pub parent_id: Option<i64>,
}
