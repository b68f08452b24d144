//! # Validation Module
//!
//! Input validation for Atelier Stock.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI/API collaborator)                                 │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure, before any write)                         │
//! │  ├── Business rule validation                                          │
//! │  └── Fails fast: a rejected input has zero side effects                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (per-tenant identity)                          │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atelier_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("SHMP-300").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::{
    Classification, GoodsLineInput, IntakeLines, IntakeNoteInput, IntakeNoteType, SaleLineInput,
    ServiceLineInput,
};
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code (external SKU).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Should contain only alphanumeric characters, hyphens, underscores
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product, service or supplier name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a customer reference on a sale.
///
/// The caller's authenticated context knows who the customer is; the core
/// only requires that the reference is present.
pub fn validate_customer_ref(customer_ref: &str) -> ValidationResult<()> {
    validate_name("customer_ref", customer_ref)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (courtesy items, promotional stock)
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Sale Validation
// =============================================================================

/// Validates the full input of a sale commit. Pure; runs before any write.
///
/// ## Rules
/// - `customer_ref` present
/// - lines non-empty, at most MAX_SALE_LINES
/// - every line: quantity positive and bounded, unit price non-negative,
///   item id present
pub fn validate_sale(customer_ref: &str, lines: &[SaleLineInput]) -> ValidationResult<()> {
    validate_customer_ref(customer_ref)?;

    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for line in lines {
        if line.item_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "item_id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
        validate_price_cents("unit_price", line.unit_price_cents)?;
    }

    Ok(())
}

/// Computes a sale total: Σ(quantity × unit_price), in cents.
///
/// Computed once at commit time and stored on the header; never re-derived.
pub fn sale_total_cents(lines: &[SaleLineInput]) -> i64 {
    lines
        .iter()
        .map(|line| line.quantity * line.unit_price_cents)
        .sum()
}

// =============================================================================
// Intake Validation
// =============================================================================

/// Validates the full input of an intake note commit. Pure; runs before any
/// write.
///
/// ## Rules
/// - note number and supplier name present
/// - the line set matches the header's note type
/// - lines non-empty; every line quantity positive, cost non-negative
/// - goods lines carry a code or a name
/// - resale lines carry a resale price (a silently-missing price would
///   destroy pricing data, so it is rejected here)
pub fn validate_intake(header: &IntakeNoteInput, lines: &IntakeLines) -> ValidationResult<()> {
    validate_name("note_number", &header.note_number)?;
    validate_name("supplier_name", &header.supplier_name)?;

    match (header.note_type, lines) {
        (IntakeNoteType::Goods, IntakeLines::Goods(goods)) => validate_goods_lines(goods),
        (IntakeNoteType::Services, IntakeLines::Services(services)) => {
            validate_service_lines(services)
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "lines".to_string(),
            reason: "line kind does not match note type".to_string(),
        }),
    }
}

fn validate_goods_lines(lines: &[GoodsLineInput]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    for line in lines {
        let has_code = line
            .product_code
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false);

        if let Some(code) = line.product_code.as_deref() {
            if !code.trim().is_empty() {
                validate_product_code(code)?;
            }
        }

        if !has_code {
            // Without a code the name is the only identity we have.
            validate_name("product_name", &line.product_name)?;
        }

        validate_quantity(line.quantity)?;
        validate_price_cents("unit_cost", line.unit_cost_cents)?;

        if line.classification == Classification::Resale {
            match line.resale_price_cents {
                Some(price) => validate_price_cents("resale_price", price)?,
                None => {
                    return Err(ValidationError::Required {
                        field: "resale_price".to_string(),
                    })
                }
            }
        }
    }

    Ok(())
}

fn validate_service_lines(lines: &[ServiceLineInput]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    for line in lines {
        validate_name("description", &line.description)?;
        validate_quantity(line.quantity)?;
        validate_price_cents("unit_cost", line.unit_cost_cents)?;
    }

    Ok(())
}

/// Computes an intake note total: Σ(quantity × unit_cost), in cents.
pub fn intake_total_cents(lines: &IntakeLines) -> i64 {
    match lines {
        IntakeLines::Goods(goods) => goods
            .iter()
            .map(|line| line.quantity * line.unit_cost_cents)
            .sum(),
        IntakeLines::Services(services) => services
            .iter()
            .map(|line| line.quantity * line.unit_cost_cents)
            .sum(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
