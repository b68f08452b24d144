//! # Catalog Service
//!
//! Product identity resolution and catalog upkeep.
//!
//! ## Match-Or-Create Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              resolve_or_create(tenant, code?, name, ...)                │
//! │                                                                         │
//! │  code present? ──► look up (tenant, code) ──► hit ──► return id        │
//! │       │                                        miss                     │
//! │       ▼                                         │                       │
//! │  name present? ──► look up (tenant, name) ──► hit ──► return id        │
//! │                                                miss                     │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │  INSERT ... ON CONFLICT DO NOTHING (quantity = 0, supplied defaults)   │
//! │       │                                                                 │
//! │       ├── inserted ──► return new id                                   │
//! │       └── lost the race ──► re-read by code/name ──► return winner id  │
//! │                                                                         │
//! │  Never a read-then-insert: racing creates with the same code           │
//! │  converge on a single row.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identity is code-first, name-second, always scoped per tenant. Repeated
//! calls with the same `(tenant, code)` never create duplicate rows.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::repository::product::ProductRepository;
use crate::repository::service_catalog::ServiceCatalogRepository;
use atelier_core::validation::{validate_name, validate_price_cents, validate_product_code};
use atelier_core::{NewProduct, NewServiceItem, Product, ProductUpdate, ServiceItem};

/// Catalog service: the match-or-create resolver plus explicit
/// registration and edits.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    /// Creates a new CatalogService.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogService { pool }
    }

    /// Resolves a `(code, name)` pair to a canonical product id, creating
    /// the product (with `quantity = 0` and the supplied price defaults)
    /// when no match exists.
    pub async fn resolve_or_create(
        &self,
        tenant: &str,
        code: Option<&str>,
        name: &str,
        default_unit_cost_cents: i64,
        default_sale_price_cents: Option<i64>,
    ) -> ServiceResult<String> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        resolve_or_create_tx(
            &mut conn,
            tenant,
            code,
            name,
            default_unit_cost_cents,
            default_sale_price_cents,
        )
        .await
    }

    /// Registers a product explicitly (catalog screen, initial stock load).
    ///
    /// ## Returns
    /// * `Err(Conflict)` - code or name already taken in this tenant
    pub async fn register(&self, tenant: &str, input: NewProduct) -> ServiceResult<Product> {
        if let Some(code) = input.code.as_deref() {
            validate_product_code(code)?;
        }
        validate_name("name", &input.name)?;
        validate_price_cents("unit_cost", input.unit_cost_cents)?;
        validate_price_cents("sale_price", input.sale_price_cents)?;
        if input.quantity < 0 {
            return Err(atelier_core::ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant.to_string(),
            code: input.code.map(|c| c.trim().to_string()),
            name: input.name.trim().to_string(),
            unit: input.unit,
            quantity: input.quantity,
            unit_cost_cents: input.unit_cost_cents,
            sale_price_cents: input.sale_price_cents,
            created_at: now,
            updated_at: now,
        };

        ProductRepository::new(self.pool.clone())
            .insert(&product)
            .await?;

        info!(tenant = %tenant, id = %product.id, name = %product.name, "Product registered");
        Ok(product)
    }

    /// Applies a catalog edit (code, name, unit, prices). Stock quantity is
    /// not editable here.
    pub async fn update(&self, tenant: &str, update: ProductUpdate) -> ServiceResult<()> {
        if let Some(code) = update.code.as_deref() {
            validate_product_code(code)?;
        }
        validate_name("name", &update.name)?;
        validate_price_cents("unit_cost", update.unit_cost_cents)?;
        validate_price_cents("sale_price", update.sale_price_cents)?;

        ProductRepository::new(self.pool.clone())
            .update(tenant, &update)
            .await?;

        Ok(())
    }

    /// Registers a service in the tenant's service catalog.
    pub async fn register_service(
        &self,
        tenant: &str,
        input: NewServiceItem,
    ) -> ServiceResult<ServiceItem> {
        validate_name("name", &input.name)?;
        validate_price_cents("price", input.price_cents)?;

        let service = ServiceItem {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant.to_string(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            duration_minutes: input.duration_minutes,
            created_at: Utc::now(),
        };

        ServiceCatalogRepository::new(self.pool.clone())
            .insert(&service)
            .await?;

        info!(tenant = %tenant, id = %service.id, name = %service.name, "Service registered");
        Ok(service)
    }
}

// =============================================================================
// Transaction-scoped resolution
// =============================================================================

/// Resolves or creates a product inside a caller-held transaction.
///
/// Used directly by the intake processor so resolution, the stock credit
/// and the line insert all commit (or roll back) together.
pub(crate) async fn resolve_or_create_tx(
    conn: &mut SqliteConnection,
    tenant: &str,
    code: Option<&str>,
    name: &str,
    default_unit_cost_cents: i64,
    default_sale_price_cents: Option<i64>,
) -> ServiceResult<String> {
    let code = code.map(str::trim).filter(|c| !c.is_empty());
    let name = name.trim();

    // Code-first lookup.
    if let Some(code) = code {
        if let Some(id) = ProductRepository::find_id_by_code_tx(conn, tenant, code).await? {
            debug!(tenant = %tenant, code = %code, id = %id, "Resolved product by code");
            return Ok(id);
        }
    }

    // Name fallback.
    if !name.is_empty() {
        if let Some(id) = ProductRepository::find_id_by_name_tx(conn, tenant, name).await? {
            debug!(tenant = %tenant, name = %name, id = %id, "Resolved product by name");
            return Ok(id);
        }
    }

    // No match: create. A code-only line gets the code as its display name.
    let display_name = if name.is_empty() {
        code.unwrap_or_default().to_string()
    } else {
        name.to_string()
    };

    if display_name.is_empty() {
        return Err(atelier_core::ValidationError::Required {
            field: "product_ref".to_string(),
        }
        .into());
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant.to_string(),
        code: code.map(str::to_string),
        name: display_name.clone(),
        unit: None,
        quantity: 0,
        unit_cost_cents: default_unit_cost_cents,
        sale_price_cents: default_sale_price_cents.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };

    if ProductRepository::insert_ignore_tx(conn, &product).await? {
        info!(tenant = %tenant, id = %product.id, name = %display_name, "Product created by resolver");
        return Ok(product.id);
    }

    // Lost a creation race: the winner's row satisfies the same identity, so
    // re-read it.
    if let Some(code) = code {
        if let Some(id) = ProductRepository::find_id_by_code_tx(conn, tenant, code).await? {
            return Ok(id);
        }
    }
    if let Some(id) = ProductRepository::find_id_by_name_tx(conn, tenant, &display_name).await? {
        return Ok(id);
    }

    Err(ServiceError::conflict(format!(
        "product identity '{}' could not be resolved after conflict",
        code.unwrap_or(&display_name)
    )))
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

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent_by_code() {
        let db = test_db().await;

        let first = db
            .catalog()
            .resolve_or_create(TENANT, Some("X1"), "Shampoo", 1000, Some(2000))
            .await
            .unwrap();
        let second = db
            .catalog()
            .resolve_or_create(TENANT, Some("X1"), "Shampoo", 1000, Some(2000))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(db.products().count(TENANT).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_name() {
        let db = test_db().await;

        let created = db
            .catalog()
            .resolve_or_create(TENANT, None, "Condicionador", 800, None)
            .await
            .unwrap();
        let resolved = db
            .catalog()
            .resolve_or_create(TENANT, None, "Condicionador", 999, Some(1))
            .await
            .unwrap();

        assert_eq!(created, resolved);
        assert_eq!(db.products().count(TENANT).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resolver_creates_with_zero_stock_and_defaults() {
        let db = test_db().await;

        let id = db
            .catalog()
            .resolve_or_create(TENANT, Some("NEW-1"), "Máscara Capilar", 1200, Some(2500))
            .await
            .unwrap();

        let product = db.products().get(TENANT, &id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 0);
        assert_eq!(product.unit_cost_cents, 1200);
        assert_eq!(product.sale_price_cents, 2500);
        assert_eq!(product.code.as_deref(), Some("NEW-1"));
    }

    #[tokio::test]
    async fn test_resolution_is_tenant_scoped() {
        let db = test_db().await;

        let a = db
            .catalog()
            .resolve_or_create("tenant-a", Some("X1"), "Shampoo", 1000, None)
            .await
            .unwrap();
        let b = db
            .catalog()
            .resolve_or_create("tenant-b", Some("X1"), "Shampoo", 1000, None)
            .await
            .unwrap();

        // Same code, different tenants: two distinct products.
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_register_duplicate_code_is_conflict() {
        let db = test_db().await;

        let input = NewProduct {
            code: Some("X1".to_string()),
            name: "Shampoo".to_string(),
            unit: None,
            quantity: 0,
            unit_cost_cents: 1000,
            sale_price_cents: 1500,
        };

        db.catalog().register(TENANT, input.clone()).await.unwrap();

        let err = db
            .catalog()
            .register(
                TENANT,
                NewProduct {
                    name: "Outro Shampoo".to_string(),
                    ..input
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_edits_metadata_not_stock() {
        let db = test_db().await;

        let product = db
            .catalog()
            .register(
                TENANT,
                NewProduct {
                    code: Some("X1".to_string()),
                    name: "Shampoo".to_string(),
                    unit: None,
                    quantity: 7,
                    unit_cost_cents: 1000,
                    sale_price_cents: 1500,
                },
            )
            .await
            .unwrap();

        db.catalog()
            .update(
                TENANT,
                atelier_core::ProductUpdate {
                    id: product.id.clone(),
                    code: Some("X1".to_string()),
                    name: "Shampoo Premium".to_string(),
                    unit: Some("un".to_string()),
                    unit_cost_cents: 1100,
                    sale_price_cents: 1800,
                },
            )
            .await
            .unwrap();

        let updated = db.products().get(TENANT, &product.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Shampoo Premium");
        assert_eq!(updated.sale_price_cents, 1800);
        // Quantity untouched by catalog edits.
        assert_eq!(updated.quantity, 7);
    }
}
