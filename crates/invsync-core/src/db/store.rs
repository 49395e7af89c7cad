//! Tenant-scoped [`Store`] over a libSQL connection
//!
//! The same adapter serves the local backup file and the remote cloud
//! database; both share the table layout created by the migrations.

use libsql::{params, Row};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Category, Product, ProductVariant, Sale, SaleItem, TenantId, Unit};
use crate::sync::{EntityKind, EntityStore, SaleStore, Side, Store};

/// libSQL implementation of [`Store`] bound to one tenant
pub struct LibSqlStore<'a> {
    db: &'a Database,
    tenant: TenantId,
    side: Side,
}

impl<'a> LibSqlStore<'a> {
    /// Create a store for `tenant` on the given database
    pub const fn new(db: &'a Database, tenant: TenantId, side: Side) -> Self {
        Self { db, tenant, side }
    }

    /// Store for the remote cloud database
    pub const fn cloud(db: &'a Database, tenant: TenantId) -> Self {
        Self::new(db, tenant, Side::Cloud)
    }

    /// Store for the tenant's local backup
    pub const fn local(db: &'a Database, tenant: TenantId) -> Self {
        Self::new(db, tenant, Side::Local)
    }

    /// Tenant every query is scoped to
    pub const fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    fn tenant_id(&self) -> &str {
        self.tenant.as_str()
    }

    async fn fetch_all<T>(&self, sql: &str, parse: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
        let mut rows = self
            .db
            .connection()
            .query(sql, [self.tenant_id()])
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(parse(&row)?);
        }
        Ok(records)
    }

    async fn execute(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<u64> {
        Ok(self.db.connection().execute(sql, params).await?)
    }
}

/// Turn a zero-row update or delete into `NotFound`
fn expect_row(affected: u64, kind: EntityKind, id: i64) -> Result<()> {
    if affected == 0 {
        Err(Error::NotFound(format!("{kind} #{id}")))
    } else {
        Ok(())
    }
}

fn parse_unit(row: &Row) -> Result<Unit> {
    Ok(Unit {
        id: row.get(0)?,
        name: row.get(1)?,
        abbreviation: row.get(2)?,
    })
}

fn parse_category(row: &Row) -> Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
    })
}

fn parse_product(row: &Row) -> Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        label: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        category_id: row.get(4)?,
        unit_id: row.get(5)?,
        price_cents: row.get(6)?,
        cost_cents: row.get(7)?,
        stock_on_hand: row.get(8)?,
        active: row.get::<i64>(9)? != 0,
        updated_at: row.get(10)?,
    })
}

fn parse_variant(row: &Row) -> Result<ProductVariant> {
    Ok(ProductVariant {
        id: row.get(0)?,
        product_id: row.get(1)?,
        color: row.get(2)?,
        size: row.get(3)?,
        price_cents: row.get(4)?,
        cost_cents: row.get(5)?,
        stock: row.get(6)?,
        label: row.get(7)?,
        active: row.get::<i64>(8)? != 0,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn parse_sale(row: &Row) -> Result<Sale> {
    Ok(Sale {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        sold_at: row.get(2)?,
        payment_method: row.get(3)?,
        total_cents: row.get(4)?,
    })
}

fn parse_sale_item(row: &Row) -> Result<SaleItem> {
    Ok(SaleItem {
        id: row.get(0)?,
        sale_id: row.get(1)?,
        product_id: row.get(2)?,
        variant_id: row.get(3)?,
        quantity: row.get(4)?,
        unit_price_cents: row.get(5)?,
        product_name: row.get(6)?,
    })
}

impl EntityStore<Unit> for LibSqlStore<'_> {
    async fn find_all(&self) -> Result<Vec<Unit>> {
        self.fetch_all(
            "SELECT id, name, abbreviation FROM units WHERE tenant_id = ? ORDER BY id",
            parse_unit,
        )
        .await
    }

    async fn insert(&self, unit: &Unit) -> Result<i64> {
        self.execute(
            "INSERT INTO units (id, tenant_id, name, abbreviation) VALUES (?, ?, ?, ?)",
            params![
                unit.id,
                self.tenant_id(),
                unit.name.as_str(),
                unit.abbreviation.as_str()
            ],
        )
        .await?;
        Ok(unit.id)
    }

    async fn update(&self, unit: &Unit) -> Result<()> {
        let affected = self
            .execute(
                "UPDATE units SET name = ?, abbreviation = ? WHERE id = ? AND tenant_id = ?",
                params![
                    unit.name.as_str(),
                    unit.abbreviation.as_str(),
                    unit.id,
                    self.tenant_id()
                ],
            )
            .await?;
        expect_row(affected, EntityKind::Unit, unit.id)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let affected = self
            .execute(
                "DELETE FROM units WHERE id = ? AND tenant_id = ?",
                params![id, self.tenant_id()],
            )
            .await?;
        expect_row(affected, EntityKind::Unit, id)
    }
}

impl EntityStore<Category> for LibSqlStore<'_> {
    async fn find_all(&self) -> Result<Vec<Category>> {
        self.fetch_all(
            "SELECT id, name, parent_id FROM categories WHERE tenant_id = ? ORDER BY id",
            parse_category,
        )
        .await
    }

    async fn insert(&self, category: &Category) -> Result<i64> {
        self.execute(
            "INSERT INTO categories (id, tenant_id, name, parent_id) VALUES (?, ?, ?, ?)",
            params![
                category.id,
                self.tenant_id(),
                category.name.as_str(),
                category.parent_id
            ],
        )
        .await?;
        Ok(category.id)
    }

    async fn update(&self, category: &Category) -> Result<()> {
        let affected = self
            .execute(
                "UPDATE categories SET name = ?, parent_id = ? WHERE id = ? AND tenant_id = ?",
                params![
                    category.name.as_str(),
                    category.parent_id,
                    category.id,
                    self.tenant_id()
                ],
            )
            .await?;
        expect_row(affected, EntityKind::Category, category.id)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let affected = self
            .execute(
                "DELETE FROM categories WHERE id = ? AND tenant_id = ?",
                params![id, self.tenant_id()],
            )
            .await?;
        expect_row(affected, EntityKind::Category, id)
    }
}

impl EntityStore<Product> for LibSqlStore<'_> {
    async fn find_all(&self) -> Result<Vec<Product>> {
        self.fetch_all(
            "SELECT id, label, name, description, category_id, unit_id, price_cents,
                    cost_cents, stock_on_hand, active, updated_at
             FROM products WHERE tenant_id = ? ORDER BY id",
            parse_product,
        )
        .await
    }

    async fn insert(&self, product: &Product) -> Result<i64> {
        self.execute(
            "INSERT INTO products (id, tenant_id, label, name, description, category_id,
                                   unit_id, price_cents, cost_cents, stock_on_hand, active,
                                   updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                product.id,
                self.tenant_id(),
                product.label.as_str(),
                product.name.as_str(),
                product.description.as_deref(),
                product.category_id,
                product.unit_id,
                product.price_cents,
                product.cost_cents,
                product.stock_on_hand,
                i64::from(product.active),
                product.updated_at
            ],
        )
        .await?;
        Ok(product.id)
    }

    async fn update(&self, product: &Product) -> Result<()> {
        let affected = self
            .execute(
                "UPDATE products SET label = ?, name = ?, description = ?, category_id = ?,
                        unit_id = ?, price_cents = ?, cost_cents = ?, stock_on_hand = ?,
                        active = ?, updated_at = ?
                 WHERE id = ? AND tenant_id = ?",
                params![
                    product.label.as_str(),
                    product.name.as_str(),
                    product.description.as_deref(),
                    product.category_id,
                    product.unit_id,
                    product.price_cents,
                    product.cost_cents,
                    product.stock_on_hand,
                    i64::from(product.active),
                    product.updated_at,
                    product.id,
                    self.tenant_id()
                ],
            )
            .await?;
        expect_row(affected, EntityKind::Product, product.id)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let affected = self
            .execute(
                "DELETE FROM products WHERE id = ? AND tenant_id = ?",
                params![id, self.tenant_id()],
            )
            .await?;
        expect_row(affected, EntityKind::Product, id)
    }
}

impl EntityStore<ProductVariant> for LibSqlStore<'_> {
    async fn find_all(&self) -> Result<Vec<ProductVariant>> {
        self.fetch_all(
            "SELECT id, product_id, color, size, price_cents, cost_cents, stock, label,
                    active, created_at, updated_at
             FROM product_variants WHERE tenant_id = ? ORDER BY id",
            parse_variant,
        )
        .await
    }

    async fn insert(&self, variant: &ProductVariant) -> Result<i64> {
        self.execute(
            "INSERT INTO product_variants (id, tenant_id, product_id, color, size, price_cents,
                                           cost_cents, stock, label, active, created_at,
                                           updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                variant.id,
                self.tenant_id(),
                variant.product_id,
                variant.color.as_deref(),
                variant.size.as_deref(),
                variant.price_cents,
                variant.cost_cents,
                variant.stock,
                variant.label.as_deref(),
                i64::from(variant.active),
                variant.created_at,
                variant.updated_at
            ],
        )
        .await?;
        Ok(variant.id)
    }

    async fn update(&self, variant: &ProductVariant) -> Result<()> {
        let affected = self
            .execute(
                "UPDATE product_variants SET product_id = ?, color = ?, size = ?,
                        price_cents = ?, cost_cents = ?, stock = ?, label = ?, active = ?,
                        created_at = ?, updated_at = ?
                 WHERE id = ? AND tenant_id = ?",
                params![
                    variant.product_id,
                    variant.color.as_deref(),
                    variant.size.as_deref(),
                    variant.price_cents,
                    variant.cost_cents,
                    variant.stock,
                    variant.label.as_deref(),
                    i64::from(variant.active),
                    variant.created_at,
                    variant.updated_at,
                    variant.id,
                    self.tenant_id()
                ],
            )
            .await?;
        expect_row(affected, EntityKind::ProductVariant, variant.id)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let affected = self
            .execute(
                "DELETE FROM product_variants WHERE id = ? AND tenant_id = ?",
                params![id, self.tenant_id()],
            )
            .await?;
        expect_row(affected, EntityKind::ProductVariant, id)
    }
}

impl EntityStore<Sale> for LibSqlStore<'_> {
    async fn find_all(&self) -> Result<Vec<Sale>> {
        self.fetch_all(
            "SELECT id, customer_name, sold_at, payment_method, total_cents
             FROM sales WHERE tenant_id = ? ORDER BY id",
            parse_sale,
        )
        .await
    }

    async fn insert(&self, sale: &Sale) -> Result<i64> {
        self.execute(
            "INSERT INTO sales (id, tenant_id, customer_name, sold_at, payment_method, total_cents)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                sale.id,
                self.tenant_id(),
                sale.customer_name.as_deref(),
                sale.sold_at,
                sale.payment_method.as_str(),
                sale.total_cents
            ],
        )
        .await?;
        Ok(sale.id)
    }

    async fn update(&self, sale: &Sale) -> Result<()> {
        let affected = self
            .execute(
                "UPDATE sales SET customer_name = ?, sold_at = ?, payment_method = ?,
                        total_cents = ?
                 WHERE id = ? AND tenant_id = ?",
                params![
                    sale.customer_name.as_deref(),
                    sale.sold_at,
                    sale.payment_method.as_str(),
                    sale.total_cents,
                    sale.id,
                    self.tenant_id()
                ],
            )
            .await?;
        expect_row(affected, EntityKind::Sale, sale.id)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        // Remote databases may run without foreign key enforcement
        self.execute(
            "DELETE FROM sale_items WHERE sale_id = ? AND tenant_id = ?",
            params![id, self.tenant_id()],
        )
        .await?;
        let affected = self
            .execute(
                "DELETE FROM sales WHERE id = ? AND tenant_id = ?",
                params![id, self.tenant_id()],
            )
            .await?;
        expect_row(affected, EntityKind::Sale, id)
    }
}

impl SaleStore for LibSqlStore<'_> {
    async fn find_items(&self, sale_id: i64) -> Result<Vec<SaleItem>> {
        let mut rows = self
            .db
            .connection()
            .query(
                "SELECT id, sale_id, product_id, variant_id, quantity, unit_price_cents,
                        product_name
                 FROM sale_items WHERE sale_id = ? AND tenant_id = ? ORDER BY id",
                params![sale_id, self.tenant_id()],
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(parse_sale_item(&row)?);
        }
        Ok(items)
    }

    async fn insert_item(&self, item: &SaleItem) -> Result<i64> {
        let mut rows = self
            .db
            .connection()
            .query(
                "INSERT INTO sale_items (tenant_id, sale_id, product_id, variant_id, quantity,
                                         unit_price_cents, product_name)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 RETURNING id",
                params![
                    self.tenant_id(),
                    item.sale_id,
                    item.product_id,
                    item.variant_id,
                    item.quantity,
                    item.unit_price_cents,
                    item.product_name.as_deref()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Err(Error::Database(format!(
                "no id returned for item of sale #{}",
                item.sale_id
            ))),
        }
    }
}

impl Store for LibSqlStore<'_> {
    fn side(&self) -> Side {
        self.side
    }

    async fn check_connection(&self) -> Result<()> {
        let mut rows = self
            .db
            .connection()
            .query("SELECT 1", ())
            .await
            .map_err(|e| Error::Database(format!("{} store unreachable: {e}", self.side)))?;
        rows.next().await?;
        Ok(())
    }

    async fn begin_phase(&self) -> Result<()> {
        self.execute("BEGIN TRANSACTION", ()).await?;
        Ok(())
    }

    async fn commit_phase(&self) -> Result<()> {
        self.execute("COMMIT", ()).await?;
        Ok(())
    }

    async fn rollback_phase(&self) -> Result<()> {
        self.execute("ROLLBACK", ()).await?;
        Ok(())
    }
}
