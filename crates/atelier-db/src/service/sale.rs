//! # Sale Transaction Processor
//!
//! Validates and atomically commits sales.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_sale                                        │
//! │                                                                         │
//! │  1. VALIDATE (pure, atelier-core)                                      │
//! │     customer present, lines non-empty, quantities positive             │
//! │     └── failure → Validation error, NOTHING written                    │
//! │                                                                         │
//! │  2. BEGIN transaction                                                  │
//! │     ├── resolve every line's item within the tenant (else NotFound)    │
//! │     ├── INSERT sale header (total = Σ qty × unit_price)                │
//! │     ├── INSERT every line                                              │
//! │     └── DEBIT stock for every product line (clamped at zero)           │
//! │                                                                         │
//! │  3. COMMIT - or roll back the whole unit on any failure                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The caller accumulates the draft lines ("cart") on its side and hands
//! them in as a plain argument; there is no hidden mutable state between
//! validation and commit.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::service_catalog::ServiceCatalogRepository;
use crate::service::ledger;
use atelier_core::validation::{sale_total_cents, validate_sale};
use atelier_core::{
    LineKind, PaymentMethod, ReceiptLine, SaleHeader, SaleLine, SaleLineInput, SaleReceipt,
};

/// Processor for sale commits and post-commit cancellation.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
}

impl SaleProcessor {
    /// Creates a new SaleProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        SaleProcessor { pool }
    }

    /// Validates and commits a sale as one atomic unit of work.
    ///
    /// ## Arguments
    /// * `tenant` - caller's tenant, from the authenticated context
    /// * `customer_ref` - customer identity as the caller knows it
    /// * `lines` - the accumulated cart
    /// * `payment_method` - how the customer paid
    /// * `origin` - optional provenance tag (e.g. "appointment:42")
    ///
    /// ## Returns
    /// * `Ok(SaleReceipt)` - committed; stock debited for product lines
    /// * `Err(Validation)` - bad input, nothing written
    /// * `Err(NotFound)` - a line references an item outside the tenant,
    ///   nothing written
    pub async fn create_sale(
        &self,
        tenant: &str,
        customer_ref: &str,
        lines: &[SaleLineInput],
        payment_method: PaymentMethod,
        origin: Option<&str>,
    ) -> ServiceResult<SaleReceipt> {
        // Fail fast with zero persistence.
        validate_sale(customer_ref, lines)?;

        let total_cents = sale_total_cents(lines);
        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(tenant = %tenant, sale_id = %sale_id, lines = lines.len(), "Committing sale");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Resolve every referenced item inside the transaction. A miss (or a
        // hit in another tenant) aborts the whole commit; the transaction
        // rolls back on drop.
        let mut receipt_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let name = match line.kind {
                LineKind::Product => {
                    ProductRepository::find_name_tx(&mut tx, tenant, &line.item_id).await?
                }
                LineKind::Service => {
                    ServiceCatalogRepository::find_name_tx(&mut tx, tenant, &line.item_id).await?
                }
            }
            .ok_or_else(|| ServiceError::not_found("Item", &line.item_id))?;

            receipt_lines.push(ReceiptLine {
                kind: line.kind,
                item_id: line.item_id.clone(),
                name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.quantity * line.unit_price_cents,
            });
        }

        let header = SaleHeader {
            id: sale_id.clone(),
            tenant_id: tenant.to_string(),
            customer_ref: customer_ref.trim().to_string(),
            total_cents,
            payment_method,
            origin: origin.map(str::to_string),
            cancelled: false,
            created_at: now,
        };
        SaleRepository::insert_header_tx(&mut tx, &header).await?;

        for line in lines {
            let sale_line = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                kind: line.kind,
                item_id: line.item_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            };
            SaleRepository::insert_line_tx(&mut tx, &sale_line).await?;

            // Only product lines move stock; services have none.
            if line.kind == LineKind::Product {
                ledger::debit_tx(&mut tx, tenant, &line.item_id, line.quantity).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::Consistency(e.to_string()))?;

        info!(
            tenant = %tenant,
            sale_id = %sale_id,
            total_cents = %total_cents,
            lines = receipt_lines.len(),
            "Sale committed"
        );

        Ok(SaleReceipt {
            sale_id,
            customer_ref: header.customer_ref,
            total_cents,
            payment_method,
            created_at: now,
            lines: receipt_lines,
        })
    }

    /// Marks a committed sale as cancelled.
    ///
    /// Cancellation is a bookkeeping flag on the header; the stock debited
    /// at commit time is NOT credited back (see DESIGN.md for the open
    /// policy question).
    pub async fn cancel_sale(&self, tenant: &str, sale_id: &str) -> ServiceResult<()> {
        SaleRepository::new(self.pool.clone())
            .mark_cancelled(tenant, sale_id)
            .await?;

        info!(tenant = %tenant, sale_id = %sale_id, "Sale cancelled");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use atelier_core::{
        LineKind, NewProduct, NewServiceItem, PaymentMethod, SaleLineInput, ValidationError,
    };

    const TENANT: &str = "tenant-a";

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn register_product(db: &Database, code: &str, quantity: i64) -> String {
        db.catalog()
            .register(
                TENANT,
                NewProduct {
                    code: Some(code.to_string()),
                    name: format!("Produto {code}"),
                    unit: None,
                    quantity,
                    unit_cost_cents: 1000,
                    sale_price_cents: 1500,
                },
            )
            .await
            .unwrap()
            .id
    }

    fn product_line(item_id: &str, quantity: i64, unit_price_cents: i64) -> SaleLineInput {
        SaleLineInput {
            kind: LineKind::Product,
            item_id: item_id.to_string(),
            quantity,
            unit_price_cents,
        }
    }

    #[tokio::test]
    async fn test_commit_debits_stock_and_stores_total() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 10).await;

        let receipt = db
            .sale_processor()
            .create_sale(
                TENANT,
                "maria",
                &[
                    product_line(&product_id, 3, 1500),
                    product_line(&product_id, 1, 1000),
                ],
                PaymentMethod::Cash,
                Some("appointment:42"),
            )
            .await
            .unwrap();

        // Header total equals Σ(qty × unit_price).
        assert_eq!(receipt.total_cents, 3 * 1500 + 1000);

        let (header, lines) = db
            .sales()
            .get_with_lines(TENANT, &receipt.sale_id)
            .await
            .unwrap();
        assert_eq!(header.total_cents, receipt.total_cents);
        assert_eq!(header.origin.as_deref(), Some("appointment:42"));
        assert!(!header.cancelled);
        assert_eq!(lines.len(), 2);

        let product = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 6);
    }

    #[tokio::test]
    async fn test_service_lines_do_not_touch_stock() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 10).await;
        let service = db
            .catalog()
            .register_service(
                TENANT,
                NewServiceItem {
                    name: "Corte".to_string(),
                    price_cents: 5000,
                    duration_minutes: Some(40),
                },
            )
            .await
            .unwrap();

        db.sale_processor()
            .create_sale(
                TENANT,
                "maria",
                &[SaleLineInput {
                    kind: LineKind::Service,
                    item_id: service.id,
                    quantity: 1,
                    unit_price_cents: 5000,
                }],
                PaymentMethod::Pix,
                None,
            )
            .await
            .unwrap();

        let product = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
    }

    #[tokio::test]
    async fn test_validation_failures_write_nothing() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 10).await;

        // Empty customer.
        let err = db
            .sale_processor()
            .create_sale(TENANT, "", &[product_line(&product_id, 1, 100)], PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        // Empty cart.
        let err = db
            .sale_processor()
            .create_sale(TENANT, "maria", &[], PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Required { .. })
        ));

        assert!(db.sales().list(TENANT).await.unwrap().is_empty());
        let product = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
    }

    /// If the Nth line fails resolution the whole commit must vanish: no
    /// header, no lines, no debits from earlier lines.
    #[tokio::test]
    async fn test_failing_line_rolls_back_entire_commit() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 10).await;

        let err = db
            .sale_processor()
            .create_sale(
                TENANT,
                "maria",
                &[
                    product_line(&product_id, 3, 1500),
                    product_line("no-such-item", 1, 1000),
                ],
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        assert!(db.sales().list(TENANT).await.unwrap().is_empty());
        let product = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
    }

    #[tokio::test]
    async fn test_cross_tenant_item_is_not_found_and_nothing_persists() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 10).await;

        let err = db
            .sale_processor()
            .create_sale(
                "tenant-b",
                "maria",
                &[product_line(&product_id, 1, 1500)],
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        assert!(db.sales().list("tenant-b").await.unwrap().is_empty());
        let product = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
    }

    #[tokio::test]
    async fn test_cancel_flags_sale_without_restoring_stock() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 10).await;

        let receipt = db
            .sale_processor()
            .create_sale(
                TENANT,
                "maria",
                &[product_line(&product_id, 3, 1500)],
                PaymentMethod::Card,
                None,
            )
            .await
            .unwrap();

        let before = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(before.quantity, 7);

        db.sale_processor()
            .cancel_sale(TENANT, &receipt.sale_id)
            .await
            .unwrap();

        let header = db.sales().get(TENANT, &receipt.sale_id).await.unwrap().unwrap();
        assert!(header.cancelled);

        // Documented behavior: cancellation does not credit the stock back.
        let after = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 7);
    }

    #[tokio::test]
    async fn test_cancel_unknown_or_foreign_sale_is_not_found() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 10).await;

        let receipt = db
            .sale_processor()
            .create_sale(
                TENANT,
                "maria",
                &[product_line(&product_id, 1, 1500)],
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        let err = db
            .sale_processor()
            .cancel_sale("tenant-b", &receipt.sale_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err = db
            .sale_processor()
            .cancel_sale(TENANT, "no-such-sale")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_oversell_clamps_debit_at_zero() {
        let db = test_db().await;
        let product_id = register_product(&db, "X1", 5).await;

        // Selling 8 from a stock of 5 commits and floors the stock at zero.
        db.sale_processor()
            .create_sale(
                TENANT,
                "maria",
                &[product_line(&product_id, 8, 1500)],
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap();

        let product = db.products().get(TENANT, &product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 0);
    }
}
