//! # Stock Ledger
//!
//! Race-free relative updates to product stock.
//!
//! ## Delta Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read-modify-write (loses updates under concurrency)         │
//! │     let q = SELECT quantity ...;                                       │
//! │     UPDATE products SET quantity = {q - 3} WHERE id = ?                │
//! │                                                                         │
//! │  ✅ CORRECT: relative update evaluated by SQLite                       │
//! │     UPDATE products SET quantity = MAX(0, quantity - 3)                │
//! │                                                                         │
//! │  Why?                                                                   │
//! │  Terminal A: sells 3 → quantity - 3                                    │
//! │  Terminal B: sells 2 → quantity - 2                                    │
//! │  Any interleaving ends at quantity - 5: no lost updates                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Clamp At Zero
//!
//! `debit` clamps the result at zero instead of rejecting or going
//! negative: selling 8 from a stock of 5 leaves 0. This mirrors the
//! long-standing behavior of the bookkeeping this system replaces; whether
//! oversell should instead be an error is an open business-policy question
//! tracked in DESIGN.md.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, ServiceResult};

/// The stock ledger: the only writer of `products.quantity`.
///
/// Each call is a single atomic UPDATE; the pool hands out the connection
/// and takes it back deterministically. Sale/intake commits reuse the same
/// primitives inside their own transactions via the `*_tx` functions.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Adds `qty` units to a product's stock. No upper bound.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - unknown product or another tenant's product
    pub async fn credit(&self, tenant: &str, product_id: &str, qty: i64) -> ServiceResult<()> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        credit_tx(&mut conn, tenant, product_id, qty).await?;
        Ok(())
    }

    /// Removes up to `qty` units from a product's stock, clamping at zero.
    ///
    /// ## Returns
    /// * `Err(NotFound)` - unknown product or another tenant's product
    pub async fn debit(&self, tenant: &str, product_id: &str, qty: i64) -> ServiceResult<()> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        debit_tx(&mut conn, tenant, product_id, qty).await?;
        Ok(())
    }
}

// =============================================================================
// Transaction-scoped primitives
// =============================================================================

/// Credits stock inside a transaction (or on a bare connection).
pub(crate) async fn credit_tx(
    conn: &mut SqliteConnection,
    tenant: &str,
    product_id: &str,
    qty: i64,
) -> DbResult<()> {
    debug!(tenant = %tenant, product_id = %product_id, qty = %qty, "Crediting stock");

    let now = chrono::Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity + ?3,
            updated_at = ?4
        WHERE id = ?1 AND tenant_id = ?2
        "#,
    )
    .bind(product_id)
    .bind(tenant)
    .bind(qty)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    Ok(())
}

/// Debits stock inside a transaction (or on a bare connection).
///
/// The `MAX(0, ...)` clamp is evaluated by SQLite together with the
/// subtraction, so the floor and the delta are one atomic step.
pub(crate) async fn debit_tx(
    conn: &mut SqliteConnection,
    tenant: &str,
    product_id: &str,
    qty: i64,
) -> DbResult<()> {
    debug!(tenant = %tenant, product_id = %product_id, qty = %qty, "Debiting stock");

    let now = chrono::Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = MAX(0, quantity - ?3),
            updated_at = ?4
        WHERE id = ?1 AND tenant_id = ?2
        "#,
    )
    .bind(product_id)
    .bind(tenant)
    .bind(qty)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use atelier_core::NewProduct;

    const TENANT: &str = "tenant-a";

    async fn db_with_product(quantity: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .catalog()
            .register(
                TENANT,
                NewProduct {
                    code: Some("X1".to_string()),
                    name: "Shampoo".to_string(),
                    unit: None,
                    quantity,
                    unit_cost_cents: 1000,
                    sale_price_cents: 1500,
                },
            )
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_credit_and_debit() {
        let (db, id) = db_with_product(10).await;

        db.ledger().credit(TENANT, &id, 5).await.unwrap();
        db.ledger().debit(TENANT, &id, 3).await.unwrap();

        let product = db.products().get(TENANT, &id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 12);
    }

    #[tokio::test]
    async fn test_debit_clamps_at_zero() {
        let (db, id) = db_with_product(5).await;

        // Debiting more than is on hand floors at zero, it does not error.
        db.ledger().debit(TENANT, &id, 8).await.unwrap();

        let product = db.products().get(TENANT, &id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (db, _) = db_with_product(5).await;

        let err = db.ledger().debit(TENANT, "no-such-id", 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cross_tenant_debit_is_not_found() {
        let (db, id) = db_with_product(5).await;

        let err = db.ledger().debit("tenant-b", &id, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        // And tenant A's stock is untouched.
        let product = db.products().get(TENANT, &id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 5);
    }

    /// N concurrent single-unit debits from a stock of N must land exactly
    /// at zero: the relative UPDATE loses no deltas under any interleaving.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_lose_no_updates() {
        const N: i64 = 50;

        let (db, id) = db_with_product(N).await;

        let mut handles = Vec::new();
        for _ in 0..N {
            let ledger = db.ledger();
            let product_id = id.clone();
            handles.push(tokio::spawn(async move {
                ledger.debit(TENANT, &product_id, 1).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let product = db.products().get(TENANT, &id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 0);
    }
}
