//! Database migrations for the local backup schema

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: inventory and sales schema
async fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        "CREATE TABLE IF NOT EXISTS units (
            id INTEGER PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            abbreviation TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_units_tenant ON units(tenant_id)",
        // Parent may arrive later in the same phase
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES categories(id) DEFERRABLE INITIALLY DEFERRED
        )",
        "CREATE INDEX IF NOT EXISTS idx_categories_tenant ON categories(tenant_id)",
        "CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            label TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            category_id INTEGER NOT NULL REFERENCES categories(id),
            unit_id INTEGER NOT NULL REFERENCES units(id),
            price_cents INTEGER NOT NULL,
            cost_cents INTEGER NOT NULL,
            stock_on_hand INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            updated_at INTEGER
        )",
        "CREATE INDEX IF NOT EXISTS idx_products_tenant ON products(tenant_id)",
        "CREATE INDEX IF NOT EXISTS idx_products_updated ON products(updated_at DESC)",
        "CREATE TABLE IF NOT EXISTS product_variants (
            id INTEGER PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            color TEXT,
            size TEXT,
            price_cents INTEGER NOT NULL,
            cost_cents INTEGER NOT NULL,
            stock INTEGER NOT NULL DEFAULT 0,
            label TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER,
            updated_at INTEGER
        )",
        "CREATE INDEX IF NOT EXISTS idx_product_variants_tenant ON product_variants(tenant_id)",
        "CREATE INDEX IF NOT EXISTS idx_product_variants_product ON product_variants(product_id)",
        "CREATE TABLE IF NOT EXISTS sales (
            id INTEGER PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            customer_name TEXT,
            sold_at INTEGER NOT NULL,
            payment_method TEXT NOT NULL,
            total_cents INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_sales_tenant ON sales(tenant_id)",
        "CREATE INDEX IF NOT EXISTS idx_sales_sold_at ON sales(sold_at DESC)",
        "CREATE TABLE IF NOT EXISTS sale_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id TEXT NOT NULL,
            sale_id INTEGER NOT NULL REFERENCES sales(id) ON DELETE CASCADE,
            product_id INTEGER NOT NULL REFERENCES products(id),
            variant_id INTEGER REFERENCES product_variants(id),
            quantity INTEGER NOT NULL,
            unit_price_cents INTEGER NOT NULL,
            product_name TEXT
        )",
        "CREATE INDEX IF NOT EXISTS idx_sale_items_sale ON sale_items(sale_id)",
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
