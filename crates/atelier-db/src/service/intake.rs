//! # Intake Note Processor
//!
//! Validates and atomically commits supplier intake/expense notes.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_intake                                      │
//! │                                                                         │
//! │  1. VALIDATE (pure, atelier-core)                                      │
//! │     supplier + note number present, lines non-empty and well-formed,   │
//! │     resale lines carry a resale price                                  │
//! │     └── failure → Validation error, NOTHING written                    │
//! │                                                                         │
//! │  2. BEGIN transaction                                                  │
//! │     ├── INSERT note header (total = Σ qty × unit_cost)                 │
//! │     ├── INSERT every line                                              │
//! │     └── for every RESALE goods line:                                   │
//! │         ├── resolve_or_create product by (code, name)                  │
//! │         ├── CREDIT stock by the line quantity                          │
//! │         └── re-price the product (unit cost + sale price)              │
//! │                                                                         │
//! │  3. COMMIT - or roll back the whole unit on any failure                │
//! │                                                                         │
//! │  Consumable / raw-material lines and service lines are recorded for    │
//! │  cost accounting but never touch the ledger.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::repository::intake::IntakeRepository;
use crate::repository::product::ProductRepository;
use crate::service::{catalog, ledger};
use atelier_core::validation::{intake_total_cents, validate_intake};
use atelier_core::{
    Classification, IntakeHeader, IntakeLine, IntakeLines, IntakeNoteInput, IntakeServiceLine,
    IntakeSummary,
};

/// Processor for intake note commits.
#[derive(Debug, Clone)]
pub struct IntakeProcessor {
    pool: SqlitePool,
}

impl IntakeProcessor {
    /// Creates a new IntakeProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        IntakeProcessor { pool }
    }

    /// Validates and commits an intake note as one atomic unit of work.
    ///
    /// ## Returns
    /// * `Ok(IntakeSummary)` - committed; stock credited for resale lines
    /// * `Err(Validation)` - bad input (including a resale line without a
    ///   resale price), nothing written
    pub async fn create_intake(
        &self,
        tenant: &str,
        header: IntakeNoteInput,
        lines: IntakeLines,
    ) -> ServiceResult<IntakeSummary> {
        // Fail fast with zero persistence.
        validate_intake(&header, &lines)?;

        let total_cents = intake_total_cents(&lines);
        let intake_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(
            tenant = %tenant,
            intake_id = %intake_id,
            note_number = %header.note_number,
            lines = lines.len(),
            "Committing intake note"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let stored_header = IntakeHeader {
            id: intake_id.clone(),
            tenant_id: tenant.to_string(),
            note_type: header.note_type,
            note_number: header.note_number.trim().to_string(),
            supplier_name: header.supplier_name.trim().to_string(),
            supplier_tax_id: header.supplier_tax_id,
            supplier_address: header.supplier_address,
            supplier_phone: header.supplier_phone,
            access_key: header.access_key,
            description: header.description,
            issued_on: header.issued_on,
            total_cents,
            created_at: now,
        };
        IntakeRepository::insert_header_tx(&mut tx, &stored_header).await?;

        let mut stocked_lines = 0usize;

        match &lines {
            IntakeLines::Goods(goods) => {
                for line in goods {
                    let stored_line = IntakeLine {
                        id: Uuid::new_v4().to_string(),
                        intake_id: intake_id.clone(),
                        product_code: line.product_code.clone(),
                        product_name: line.product_name.clone(),
                        classification: line.classification,
                        quantity: line.quantity,
                        unit_cost_cents: line.unit_cost_cents,
                        resale_price_cents: line.resale_price_cents,
                    };
                    IntakeRepository::insert_goods_line_tx(&mut tx, &stored_line).await?;

                    // Only resale lines represent sellable inventory.
                    if line.classification != Classification::Resale {
                        continue;
                    }

                    // Validation guarantees the price is present on resale
                    // lines; a missing one here is a consistency fault.
                    let resale_price_cents = line.resale_price_cents.ok_or_else(|| {
                        ServiceError::Consistency(
                            "resale line lost its price between validation and commit".to_string(),
                        )
                    })?;

                    let product_id = catalog::resolve_or_create_tx(
                        &mut tx,
                        tenant,
                        line.product_code.as_deref(),
                        &line.product_name,
                        line.unit_cost_cents,
                        Some(resale_price_cents),
                    )
                    .await?;

                    ledger::credit_tx(&mut tx, tenant, &product_id, line.quantity).await?;

                    // The latest note wins the price book: cost and selling
                    // price follow the line.
                    ProductRepository::set_pricing_tx(
                        &mut tx,
                        tenant,
                        &product_id,
                        line.unit_cost_cents,
                        resale_price_cents,
                    )
                    .await?;

                    stocked_lines += 1;
                }
            }
            IntakeLines::Services(services) => {
                for line in services {
                    let stored_line = IntakeServiceLine {
                        id: Uuid::new_v4().to_string(),
                        intake_id: intake_id.clone(),
                        description: line.description.trim().to_string(),
                        quantity: line.quantity,
                        unit_cost_cents: line.unit_cost_cents,
                    };
                    IntakeRepository::insert_service_line_tx(&mut tx, &stored_line).await?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::Consistency(e.to_string()))?;

        info!(
            tenant = %tenant,
            intake_id = %intake_id,
            note_number = %stored_header.note_number,
            total_cents = %total_cents,
            stocked_lines = stocked_lines,
            "Intake note committed"
        );

        Ok(IntakeSummary {
            intake_id,
            note_number: stored_header.note_number,
            total_cents,
            stocked_lines,
            created_at: now,
        })
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
        Classification, GoodsLineInput, IntakeLines, IntakeNoteInput, IntakeNoteType,
        ServiceLineInput, ValidationError,
    };

    const TENANT: &str = "tenant-a";

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn goods_note(number: &str) -> IntakeNoteInput {
        IntakeNoteInput {
            note_type: IntakeNoteType::Goods,
            note_number: number.to_string(),
            supplier_name: "Distribuidora Bela".to_string(),
            supplier_tax_id: Some("12.345.678/0001-99".to_string()),
            supplier_address: Some("Rua das Flores, 100".to_string()),
            supplier_phone: None,
            access_key: None,
            description: None,
            issued_on: None,
        }
    }

    fn services_note(number: &str) -> IntakeNoteInput {
        IntakeNoteInput {
            note_type: IntakeNoteType::Services,
            note_number: number.to_string(),
            supplier_name: "Manutenções Silva".to_string(),
            supplier_tax_id: None,
            supplier_address: None,
            supplier_phone: None,
            access_key: None,
            description: Some("Manutenção das cadeiras".to_string()),
            issued_on: None,
        }
    }

    fn resale_line(code: &str, qty: i64, cost: i64, price: i64) -> GoodsLineInput {
        GoodsLineInput {
            product_code: Some(code.to_string()),
            product_name: format!("Produto {code}"),
            classification: Classification::Resale,
            quantity: qty,
            unit_cost_cents: cost,
            resale_price_cents: Some(price),
        }
    }

    #[tokio::test]
    async fn test_resale_intake_creates_product_and_credits_stock() {
        let db = test_db().await;

        let summary = db
            .intake_processor()
            .create_intake(
                TENANT,
                goods_note("NF-1001"),
                IntakeLines::Goods(vec![resale_line("X1", 5, 1000, 2000)]),
            )
            .await
            .unwrap();

        assert_eq!(summary.total_cents, 5000);
        assert_eq!(summary.stocked_lines, 1);

        let product = db.products().get_by_code(TENANT, "X1").await.unwrap().unwrap();
        assert_eq!(product.quantity, 5);
        assert_eq!(product.unit_cost_cents, 1000);
        assert_eq!(product.sale_price_cents, 2000);

        let header = db.intakes().get_required(TENANT, &summary.intake_id).await.unwrap();
        assert_eq!(header.total_cents, 5000);
        let lines = db
            .intakes()
            .get_goods_lines(TENANT, &summary.intake_id)
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_resale_intake_matches_existing_product_and_reprices() {
        let db = test_db().await;

        // First note creates the product; the second one matches by code,
        // credits on top and takes over the price book.
        db.intake_processor()
            .create_intake(
                TENANT,
                goods_note("NF-1001"),
                IntakeLines::Goods(vec![resale_line("X1", 5, 1000, 2000)]),
            )
            .await
            .unwrap();
        db.intake_processor()
            .create_intake(
                TENANT,
                goods_note("NF-1002"),
                IntakeLines::Goods(vec![resale_line("X1", 3, 1200, 2200)]),
            )
            .await
            .unwrap();

        assert_eq!(db.products().count(TENANT).await.unwrap(), 1);

        let product = db.products().get_by_code(TENANT, "X1").await.unwrap().unwrap();
        assert_eq!(product.quantity, 8);
        assert_eq!(product.unit_cost_cents, 1200);
        assert_eq!(product.sale_price_cents, 2200);
    }

    #[tokio::test]
    async fn test_consumable_lines_never_touch_stock() {
        let db = test_db().await;

        let summary = db
            .intake_processor()
            .create_intake(
                TENANT,
                goods_note("NF-1003"),
                IntakeLines::Goods(vec![
                    GoodsLineInput {
                        classification: Classification::Consumable,
                        resale_price_cents: None,
                        ..resale_line("LUVAS", 10, 500, 0)
                    },
                    GoodsLineInput {
                        classification: Classification::RawMaterial,
                        resale_price_cents: None,
                        ..resale_line("TINTA", 4, 2500, 0)
                    },
                ]),
            )
            .await
            .unwrap();

        assert_eq!(summary.stocked_lines, 0);
        assert_eq!(summary.total_cents, 10 * 500 + 4 * 2500);

        // No catalog entries were created for non-resale goods.
        assert_eq!(db.products().count(TENANT).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_resale_price_is_rejected_with_no_writes() {
        let db = test_db().await;

        let mut line = resale_line("X1", 5, 1000, 0);
        line.resale_price_cents = None;

        let err = db
            .intake_processor()
            .create_intake(TENANT, goods_note("NF-1004"), IntakeLines::Goods(vec![line]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Required { ref field }) if field == "resale_price"
        ));

        assert!(db.intakes().list(TENANT, None).await.unwrap().is_empty());
        assert_eq!(db.products().count(TENANT).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_services_note_records_lines_only() {
        let db = test_db().await;

        let summary = db
            .intake_processor()
            .create_intake(
                TENANT,
                services_note("NFS-88"),
                IntakeLines::Services(vec![ServiceLineInput {
                    description: "Conserto do secador".to_string(),
                    quantity: 1,
                    unit_cost_cents: 15000,
                }]),
            )
            .await
            .unwrap();

        assert_eq!(summary.total_cents, 15000);
        assert_eq!(summary.stocked_lines, 0);

        let lines = db
            .intakes()
            .get_service_lines(TENANT, &summary.intake_id)
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "Conserto do secador");

        assert_eq!(db.products().count(TENANT).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_note_type_is_rejected() {
        let db = test_db().await;

        let err = db
            .intake_processor()
            .create_intake(
                TENANT,
                services_note("NFS-89"),
                IntakeLines::Goods(vec![resale_line("X1", 1, 100, 200)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(db.intakes().list(TENANT, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_intake_listing_filters_by_note_type() {
        let db = test_db().await;

        db.intake_processor()
            .create_intake(
                TENANT,
                goods_note("NF-1"),
                IntakeLines::Goods(vec![resale_line("X1", 1, 100, 200)]),
            )
            .await
            .unwrap();
        db.intake_processor()
            .create_intake(
                TENANT,
                services_note("NFS-1"),
                IntakeLines::Services(vec![ServiceLineInput {
                    description: "Limpeza".to_string(),
                    quantity: 1,
                    unit_cost_cents: 8000,
                }]),
            )
            .await
            .unwrap();

        let all = db.intakes().list(TENANT, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let goods_only = db
            .intakes()
            .list(TENANT, Some(IntakeNoteType::Goods))
            .await
            .unwrap();
        assert_eq!(goods_only.len(), 1);
        assert_eq!(goods_only[0].note_number, "NF-1");

        // Another tenant sees nothing.
        assert!(db.intakes().list("tenant-b", None).await.unwrap().is_empty());
    }
}
