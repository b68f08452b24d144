//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Tenant-scoped reads (by id, by code, listing)
//! - Explicit registration and catalog edits
//! - Transaction-scoped identity lookups used by the catalog resolver
//!
//! Stock quantity is deliberately NOT writable here: the only mutations of
//! `products.quantity` live in the stock ledger, as atomic relative updates.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use atelier_core::{Product, ProductUpdate};

/// Columns selected for every `Product` read, in one place so the list and
/// point queries cannot drift apart.
const PRODUCT_COLUMNS: &str = "id, tenant_id, code, name, unit, quantity, \
     unit_cost_cents, sale_price_cents, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get(tenant, "uuid-here").await?;
/// let all = repo.list(tenant).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, within the caller's tenant.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found (or belongs to another tenant)
    pub async fn get(&self, tenant: &str, id: &str) -> DbResult<Option<Product>> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND tenant_id = ?2"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(tenant)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its external code (SKU), within the caller's tenant.
    pub async fn get_by_code(&self, tenant: &str, code: &str) -> DbResult<Option<Product>> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 AND code = ?2"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(tenant)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists the tenant's products, sorted by name.
    pub async fn list(&self, tenant: &str) -> DbResult<Vec<Product>> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&query)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        debug!(tenant = %tenant, count = products.len(), "Listed products");
        Ok(products)
    }

    /// Inserts a new product (explicit registration).
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - code or name already taken in
    ///   this tenant
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(tenant = %product.tenant_id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, code, name, unit,
                quantity, unit_cost_cents, sale_price_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.unit)
        .bind(product.quantity)
        .bind(product.unit_cost_cents)
        .bind(product.sale_price_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a catalog edit (code, name, unit, prices).
    ///
    /// Quantity is not part of the update: stock moves only through the
    /// ledger.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist in this tenant
    pub async fn update(&self, tenant: &str, update: &ProductUpdate) -> DbResult<()> {
        debug!(tenant = %tenant, id = %update.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?3,
                name = ?4,
                unit = ?5,
                unit_cost_cents = ?6,
                sale_price_cents = ?7,
                updated_at = ?8
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(&update.id)
        .bind(tenant)
        .bind(&update.code)
        .bind(&update.name)
        .bind(&update.unit)
        .bind(update.unit_cost_cents)
        .bind(update.sale_price_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &update.id));
        }

        Ok(())
    }

    /// Counts the tenant's products (for diagnostics).
    pub async fn count(&self, tenant: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?1")
            .bind(tenant)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped primitives (used by services)
    // =========================================================================

    /// Finds a product id by `(tenant, code)` inside a transaction.
    pub(crate) async fn find_id_by_code_tx(
        conn: &mut SqliteConnection,
        tenant: &str,
        code: &str,
    ) -> DbResult<Option<String>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM products WHERE tenant_id = ?1 AND code = ?2")
                .bind(tenant)
                .bind(code)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(id)
    }

    /// Finds a product id by `(tenant, name)` inside a transaction.
    ///
    /// Name is the resolution fallback, so products that also carry a code
    /// match too; the oldest row wins for stability.
    pub(crate) async fn find_id_by_name_tx(
        conn: &mut SqliteConnection,
        tenant: &str,
        name: &str,
    ) -> DbResult<Option<String>> {
        let id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM products WHERE tenant_id = ?1 AND name = ?2 \
             ORDER BY created_at LIMIT 1",
        )
        .bind(tenant)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(id)
    }

    /// Looks up a product name by id inside a transaction (tenant-scoped).
    pub(crate) async fn find_name_tx(
        conn: &mut SqliteConnection,
        tenant: &str,
        id: &str,
    ) -> DbResult<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM products WHERE id = ?1 AND tenant_id = ?2")
                .bind(id)
                .bind(tenant)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(name)
    }

    /// Conditionally inserts a product inside a transaction.
    ///
    /// `ON CONFLICT DO NOTHING` makes racing creates converge: the insert
    /// either lands (returns `true`) or yields to a concurrent row (returns
    /// `false`, caller re-reads). This is the atomic replacement for the
    /// read-then-insert upsert.
    pub(crate) async fn insert_ignore_tx(
        conn: &mut SqliteConnection,
        product: &Product,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, code, name, unit,
                quantity, unit_cost_cents, sale_price_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.unit)
        .bind(product.quantity)
        .bind(product.unit_cost_cents)
        .bind(product.sale_price_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Overwrites a product's pricing inside a transaction.
    ///
    /// Used by the intake processor: a resale line re-prices the product it
    /// replenished.
    pub(crate) async fn set_pricing_tx(
        conn: &mut SqliteConnection,
        tenant: &str,
        id: &str,
        unit_cost_cents: i64,
        sale_price_cents: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                unit_cost_cents = ?3,
                sale_price_cents = ?4,
                updated_at = ?5
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(unit_cost_cents)
        .bind(sale_price_cents)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
