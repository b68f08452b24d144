//! # Intake Note Repository
//!
//! Database operations for supplier intake/expense notes.
//!
//! A note is a header plus one of two typed line sets:
//! - goods lines (`intake_items`) - may replenish stock when classified
//!   resale
//! - service lines (`intake_service_items`) - cost accounting only
//!
//! Headers and lines are immutable after commit.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use atelier_core::{IntakeHeader, IntakeLine, IntakeNoteType, IntakeServiceLine};

const INTAKE_COLUMNS: &str = "id, tenant_id, note_type, note_number, supplier_name, \
     supplier_tax_id, supplier_address, supplier_phone, access_key, description, \
     issued_on, total_cents, created_at";

/// Repository for intake note database operations.
#[derive(Debug, Clone)]
pub struct IntakeRepository {
    pool: SqlitePool,
}

impl IntakeRepository {
    /// Creates a new IntakeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IntakeRepository { pool }
    }

    /// Gets a note header by ID, within the caller's tenant.
    pub async fn get(&self, tenant: &str, id: &str) -> DbResult<Option<IntakeHeader>> {
        let query = format!("SELECT {INTAKE_COLUMNS} FROM intakes WHERE id = ?1 AND tenant_id = ?2");
        let header = sqlx::query_as::<_, IntakeHeader>(&query)
            .bind(id)
            .bind(tenant)
            .fetch_optional(&self.pool)
            .await?;

        Ok(header)
    }

    /// Gets the goods lines of a note, tenant-scoped through the header join.
    pub async fn get_goods_lines(&self, tenant: &str, intake_id: &str) -> DbResult<Vec<IntakeLine>> {
        let lines = sqlx::query_as::<_, IntakeLine>(
            "SELECT ii.id, ii.intake_id, ii.product_code, ii.product_name, \
                    ii.classification, ii.quantity, ii.unit_cost_cents, ii.resale_price_cents \
             FROM intake_items ii \
             INNER JOIN intakes i ON i.id = ii.intake_id \
             WHERE ii.intake_id = ?1 AND i.tenant_id = ?2 \
             ORDER BY ii.id",
        )
        .bind(intake_id)
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets the service lines of a note, tenant-scoped through the header join.
    pub async fn get_service_lines(
        &self,
        tenant: &str,
        intake_id: &str,
    ) -> DbResult<Vec<IntakeServiceLine>> {
        let lines = sqlx::query_as::<_, IntakeServiceLine>(
            "SELECT si.id, si.intake_id, si.description, si.quantity, si.unit_cost_cents \
             FROM intake_service_items si \
             INNER JOIN intakes i ON i.id = si.intake_id \
             WHERE si.intake_id = ?1 AND i.tenant_id = ?2 \
             ORDER BY si.id",
        )
        .bind(intake_id)
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets a note header; NotFound when the id is unknown or belongs to
    /// another tenant.
    pub async fn get_required(&self, tenant: &str, id: &str) -> DbResult<IntakeHeader> {
        self.get(tenant, id)
            .await?
            .ok_or_else(|| DbError::not_found("Intake note", id))
    }

    /// Lists the tenant's notes, newest first, optionally filtered by type.
    pub async fn list(
        &self,
        tenant: &str,
        note_type: Option<IntakeNoteType>,
    ) -> DbResult<Vec<IntakeHeader>> {
        let headers = match note_type {
            Some(kind) => {
                let query = format!(
                    "SELECT {INTAKE_COLUMNS} FROM intakes \
                     WHERE tenant_id = ?1 AND note_type = ?2 ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, IntakeHeader>(&query)
                    .bind(tenant)
                    .bind(kind)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {INTAKE_COLUMNS} FROM intakes \
                     WHERE tenant_id = ?1 ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, IntakeHeader>(&query)
                    .bind(tenant)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(headers)
    }

    // =========================================================================
    // Transaction-scoped primitives (used by IntakeProcessor)
    // =========================================================================

    /// Inserts a note header inside a transaction.
    pub(crate) async fn insert_header_tx(
        conn: &mut SqliteConnection,
        header: &IntakeHeader,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO intakes (
                id, tenant_id, note_type, note_number, supplier_name,
                supplier_tax_id, supplier_address, supplier_phone,
                access_key, description, issued_on, total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&header.id)
        .bind(&header.tenant_id)
        .bind(header.note_type)
        .bind(&header.note_number)
        .bind(&header.supplier_name)
        .bind(&header.supplier_tax_id)
        .bind(&header.supplier_address)
        .bind(&header.supplier_phone)
        .bind(&header.access_key)
        .bind(&header.description)
        .bind(header.issued_on)
        .bind(header.total_cents)
        .bind(header.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a goods line inside a transaction.
    pub(crate) async fn insert_goods_line_tx(
        conn: &mut SqliteConnection,
        line: &IntakeLine,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO intake_items (
                id, intake_id, product_code, product_name,
                classification, quantity, unit_cost_cents, resale_price_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&line.id)
        .bind(&line.intake_id)
        .bind(&line.product_code)
        .bind(&line.product_name)
        .bind(line.classification)
        .bind(line.quantity)
        .bind(line.unit_cost_cents)
        .bind(line.resale_price_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a service line inside a transaction.
    pub(crate) async fn insert_service_line_tx(
        conn: &mut SqliteConnection,
        line: &IntakeServiceLine,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO intake_service_items (
                id, intake_id, description, quantity, unit_cost_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&line.id)
        .bind(&line.intake_id)
        .bind(&line.description)
        .bind(line.quantity)
        .bind(line.unit_cost_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Generates a new intake note ID.
pub fn generate_intake_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new intake line ID.
pub fn generate_intake_line_id() -> String {
    Uuid::new_v4().to_string()
}
