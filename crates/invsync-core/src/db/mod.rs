//! Database layer for Invsync

mod connection;
mod migrations;
mod store;

pub use connection::{CloudConfig, Database};
pub use store::LibSqlStore;
