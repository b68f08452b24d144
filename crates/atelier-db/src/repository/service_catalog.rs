//! # Service Catalog Repository
//!
//! Database operations for the tenant's service catalog.
//!
//! Services are sellable through sale lines with `kind = service`. They have
//! no stock, so the ledger never touches this table.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use atelier_core::ServiceItem;

const SERVICE_COLUMNS: &str = "id, tenant_id, name, price_cents, duration_minutes, created_at";

/// Repository for service catalog operations.
#[derive(Debug, Clone)]
pub struct ServiceCatalogRepository {
    pool: SqlitePool,
}

impl ServiceCatalogRepository {
    /// Creates a new ServiceCatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceCatalogRepository { pool }
    }

    /// Gets a service by its ID, within the caller's tenant.
    pub async fn get(&self, tenant: &str, id: &str) -> DbResult<Option<ServiceItem>> {
        let query =
            format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1 AND tenant_id = ?2");
        let service = sqlx::query_as::<_, ServiceItem>(&query)
            .bind(id)
            .bind(tenant)
            .fetch_optional(&self.pool)
            .await?;

        Ok(service)
    }

    /// Lists the tenant's services, sorted by name.
    pub async fn list(&self, tenant: &str) -> DbResult<Vec<ServiceItem>> {
        let query =
            format!("SELECT {SERVICE_COLUMNS} FROM services WHERE tenant_id = ?1 ORDER BY name");
        let services = sqlx::query_as::<_, ServiceItem>(&query)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        Ok(services)
    }

    /// Inserts a new service.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken in this tenant
    pub async fn insert(&self, service: &ServiceItem) -> DbResult<()> {
        debug!(tenant = %service.tenant_id, name = %service.name, "Inserting service");

        sqlx::query(
            r#"
            INSERT INTO services (id, tenant_id, name, price_cents, duration_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&service.id)
        .bind(&service.tenant_id)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Looks up a service name by id inside a transaction (tenant-scoped).
    pub(crate) async fn find_name_tx(
        conn: &mut SqliteConnection,
        tenant: &str,
        id: &str,
    ) -> DbResult<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM services WHERE id = ?1 AND tenant_id = ?2")
                .bind(id)
                .bind(tenant)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(name)
    }
}
