//! Data models for Invsync

mod catalog;
mod product;
mod sale;
mod tenant;

pub use catalog::{Category, Unit};
pub use product::{Product, ProductVariant};
pub use sale::{Sale, SaleItem};
pub use tenant::TenantId;
