//! # atelier-core: Pure Business Logic for Atelier Stock
//!
//! This crate is the **heart** of Atelier Stock. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Atelier Stock Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              UI / API layer (external collaborator)             │   │
//! │  │    POS screen ──► Cart ──► Receipt, Intake note entry, Reports │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atelier-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────────────────────┐ │   │
//! │  │   │   types   │  │   money   │  │        validation          │ │   │
//! │  │   │  Product  │  │   Money   │  │  sale/intake rules, totals │ │   │
//! │  │   │   Sale    │  │  (cents)  │  │                            │ │   │
//! │  │   │  Intake   │  └───────────┘  └────────────────────────────┘ │   │
//! │  │   └───────────┘                                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  atelier-db (Storage Layer)                     │   │
//! │  │      SQLite queries, migrations, ledger, sale/intake commits   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, SaleHeader, IntakeHeader, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Validation error types
//! - [`validation`] - Business rule validation and total computation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use atelier_core::money::Money;
//! use atelier_core::types::{LineKind, SaleLineInput};
//! use atelier_core::validation::{sale_total_cents, validate_sale};
//!
//! let lines = vec![SaleLineInput {
//!     kind: LineKind::Product,
//!     item_id: "some-uuid".to_string(),
//!     quantity: 3,
//!     unit_price_cents: 2500,
//! }];
//!
//! validate_sale("maria", &lines).unwrap();
//! assert_eq!(sale_total_cents(&lines), Money::from_cents(7500).cents());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use atelier_core::Money` instead of
// `use atelier_core::money::Money`

pub use error::ValidationError;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale
///
/// Prevents runaway carts and ensures reasonable transaction sizes.
/// Can be made configurable per-tenant in future versions.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
