//! # Domain Types
//!
//! Core domain types used throughout Atelier Stock.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SaleHeader    │   │  IntakeHeader   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (SKU)     │   │  customer_ref   │   │  note_number    │       │
//! │  │  quantity       │   │  total_cents    │   │  supplier_name  │       │
//! │  │  *_cents        │   │  cancelled      │   │  total_cents    │       │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │                                 │                     │                 │
//! │                        ┌────────┴────────┐   ┌────────┴────────┐       │
//! │                        │    SaleLine     │   │   IntakeLine    │       │
//! │                        │  kind, item_id  │   │  classification │       │
//! │                        │  qty, price     │   │  qty, cost      │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A product has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business identity: `code` (external SKU) when present, otherwise `name`,
//!   both scoped per tenant

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog entry representing a sellable or trackable item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    /// External SKU from supplier notes. Unique per tenant when present.
    pub code: Option<String>,

    /// Display name. Unique per tenant when `code` is absent.
    pub name: String,

    /// Optional unit of measure ("un", "ml", "g").
    pub unit: Option<String>,

    /// Current stock level. Never negative; mutated only by the stock ledger.
    pub quantity: i64,

    /// Acquisition cost per unit, in cents.
    pub unit_cost_cents: i64,

    /// Selling price per unit, in cents.
    pub sale_price_cents: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the acquisition cost as a Money type.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Returns the selling price as a Money type.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }
}

/// Input for explicit product registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: Option<String>,
    pub name: String,
    pub unit: Option<String>,
    /// Initial stock level (>= 0).
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub sale_price_cents: i64,
}

/// Catalog edit for an existing product.
///
/// `quantity` is deliberately absent: stock moves only through the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub unit: Option<String>,
    pub unit_cost_cents: i64,
    pub sale_price_cents: i64,
}

// =============================================================================
// Service Catalog
// =============================================================================

/// A service offered by the tenant (haircut, session, maintenance).
///
/// Services are sellable through sale lines with `kind = service` but have
/// no stock: the ledger never sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ServiceItem {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub price_cents: i64,
    /// Session length, for the scheduling collaborator.
    pub duration_minutes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Input for service registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceItem {
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: Option<i64>,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Instant bank transfer (Pix).
    Pix,
    /// Card payment on external terminal.
    Card,
    /// Anything else (store credit, barter, ...).
    Other,
}

// =============================================================================
// Sale
// =============================================================================

/// Kind of item a sale line points at.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// References the product catalog; debits stock on commit.
    Product,
    /// References the service catalog; never touches stock.
    Service,
}

/// A committed sale transaction.
///
/// Created atomically with its lines; `cancelled` is the only field mutated
/// after commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleHeader {
    pub id: String,
    pub tenant_id: String,
    /// Customer identity as the caller knows it (id, name or document).
    pub customer_ref: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Free-form provenance tag, e.g. "appointment:42".
    pub origin: Option<String>,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl SaleHeader {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a committed sale. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub kind: LineKind,
    /// Product or service id, within the same tenant as the header.
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl SaleLine {
    /// Returns the line total (quantity × unit price) as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// Client-side line item for a sale about to be committed.
///
/// The caller accumulates these (the "cart") and hands the whole list to
/// `create_sale`; there is no hidden mutable state between validation and
/// commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineInput {
    pub kind: LineKind,
    pub item_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// What the caller gets back from a committed sale.
/// The receipt-rendering collaborator consumes this directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale_id: String,
    pub customer_ref: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
}

/// One rendered line of a receipt, with the item name frozen at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub kind: LineKind,
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

// =============================================================================
// Intake Notes
// =============================================================================

/// Kind of supplier note.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeNoteType {
    /// Delivery of goods; resale lines replenish stock.
    Goods,
    /// Services rendered by a provider; recorded for cost accounting only.
    Services,
}

/// How a goods line enters the books.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Becomes sellable inventory: resolves a product and credits stock.
    Resale,
    /// Internal use and consumption; never touches the ledger.
    Consumable,
    /// Input material for services; never touches the ledger.
    RawMaterial,
}

/// A supplier intake/expense note header. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IntakeHeader {
    pub id: String,
    pub tenant_id: String,
    pub note_type: IntakeNoteType,
    /// Fiscal note number as printed on the document.
    pub note_number: String,
    pub supplier_name: String,
    /// CNPJ/CPF of the supplier.
    pub supplier_tax_id: Option<String>,
    pub supplier_address: Option<String>,
    pub supplier_phone: Option<String>,
    /// Electronic fiscal note access key, stored verbatim.
    pub access_key: Option<String>,
    /// General description (services notes).
    pub description: Option<String>,
    /// Purchase/issue date from the document.
    pub issued_on: Option<NaiveDate>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl IntakeHeader {
    /// Returns the note total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A goods line on an intake note. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IntakeLine {
    pub id: String,
    pub intake_id: String,
    /// Supplier's product code, used first for identity resolution.
    pub product_code: Option<String>,
    /// Product name as printed on the note; resolution fallback.
    pub product_name: String,
    pub classification: Classification,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    /// Selling price for resale lines; absent otherwise.
    pub resale_price_cents: Option<i64>,
}

/// A service line on an intake note (services note only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IntakeServiceLine {
    pub id: String,
    pub intake_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// Header fields for a note about to be committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeNoteInput {
    pub note_type: IntakeNoteType,
    pub note_number: String,
    pub supplier_name: String,
    pub supplier_tax_id: Option<String>,
    pub supplier_address: Option<String>,
    pub supplier_phone: Option<String>,
    pub access_key: Option<String>,
    pub description: Option<String>,
    pub issued_on: Option<NaiveDate>,
}

/// Client-side goods line for a note about to be committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsLineInput {
    pub product_code: Option<String>,
    pub product_name: String,
    pub classification: Classification,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub resale_price_cents: Option<i64>,
}

/// Client-side service line for a note about to be committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLineInput {
    pub description: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// The typed line set of a note; must match the header's `note_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeLines {
    Goods(Vec<GoodsLineInput>),
    Services(Vec<ServiceLineInput>),
}

impl IntakeLines {
    /// Number of lines regardless of kind.
    pub fn len(&self) -> usize {
        match self {
            IntakeLines::Goods(lines) => lines.len(),
            IntakeLines::Services(lines) => lines.len(),
        }
    }

    /// True when the note carries no lines.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the caller gets back from a committed intake note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeSummary {
    pub intake_id: String,
    pub note_number: String,
    pub total_cents: i64,
    /// How many lines replenished stock (resale lines on goods notes).
    pub stocked_lines: usize,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
