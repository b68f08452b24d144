//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. DRAFT (caller-side only)                                           │
//! │     └── The caller accumulates SaleLineInput values; nothing persisted │
//! │                                                                         │
//! │  2. COMMIT (SaleProcessor, single transaction)                         │
//! │     └── insert_header_tx() + insert_line_tx() × N + stock debits       │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── mark_cancelled() → cancelled = 1 (stock is NOT restored)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are immutable after commit; `cancelled` is the only header field
//! that changes afterwards.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use atelier_core::{SaleHeader, SaleLine};

const SALE_COLUMNS: &str =
    "id, tenant_id, customer_ref, total_cents, payment_method, origin, cancelled, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID, within the caller's tenant.
    pub async fn get(&self, tenant: &str, id: &str) -> DbResult<Option<SaleHeader>> {
        let query = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND tenant_id = ?2");
        let sale = sqlx::query_as::<_, SaleHeader>(&query)
            .bind(id)
            .bind(tenant)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all lines for a sale, tenant-scoped through the header join.
    pub async fn get_lines(&self, tenant: &str, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT si.id, si.sale_id, si.kind, si.item_id, si.quantity, si.unit_price_cents \
             FROM sale_items si \
             INNER JOIN sales s ON s.id = si.sale_id \
             WHERE si.sale_id = ?1 AND s.tenant_id = ?2 \
             ORDER BY si.id",
        )
            .bind(sale_id)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Gets a sale header together with its lines.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - unknown id, or the sale belongs to
    ///   another tenant
    pub async fn get_with_lines(
        &self,
        tenant: &str,
        id: &str,
    ) -> DbResult<(SaleHeader, Vec<SaleLine>)> {
        let header = self
            .get(tenant, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;
        let lines = self.get_lines(tenant, id).await?;

        Ok((header, lines))
    }

    /// Lists the tenant's sales, newest first. Cancelled sales are included
    /// (flagged), mirroring how the history screen shows them.
    pub async fn list(&self, tenant: &str) -> DbResult<Vec<SaleHeader>> {
        let query = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 ORDER BY created_at DESC"
        );
        let sales = sqlx::query_as::<_, SaleHeader>(&query)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Marks a sale as cancelled.
    ///
    /// This does NOT restore debited stock; cancellation is a bookkeeping
    /// flag, not a reversal.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - unknown id or another tenant's sale
    pub async fn mark_cancelled(&self, tenant: &str, id: &str) -> DbResult<()> {
        debug!(tenant = %tenant, sale_id = %id, "Cancelling sale");

        let result = sqlx::query("UPDATE sales SET cancelled = 1 WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    // =========================================================================
    // Transaction-scoped primitives (used by SaleProcessor)
    // =========================================================================

    /// Inserts a sale header inside a transaction.
    pub(crate) async fn insert_header_tx(
        conn: &mut SqliteConnection,
        sale: &SaleHeader,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, customer_ref, total_cents,
                payment_method, origin, cancelled, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.customer_ref)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(&sale.origin)
        .bind(sale.cancelled)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale line inside a transaction.
    pub(crate) async fn insert_line_tx(
        conn: &mut SqliteConnection,
        line: &SaleLine,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_items (id, sale_id, kind, item_id, quantity, unit_price_cents)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(line.kind)
        .bind(&line.item_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale line ID.
pub fn generate_sale_line_id() -> String {
    Uuid::new_v4().to_string()
}
