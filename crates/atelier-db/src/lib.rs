//! # atelier-db: Database Layer for Atelier Stock
//!
//! This crate provides storage and the transactional operation surface for
//! the Atelier Stock core. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Atelier Stock Data Flow                            │
//! │                                                                         │
//! │  API layer (external collaborator): create_sale request                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    atelier-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │    Services    │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │   │ SaleProcessor  │   │  (embedded)  │   │   │
//! │  │   │               │   │ IntakeProcessor│   │              │   │   │
//! │  │   │ SqlitePool    │◄──│ StockLedger    │   │ 001_init.sql │   │   │
//! │  │   │ Transactions  │   │ CatalogService │   │              │   │   │
//! │  │   └───────────────┘   └───────┬────────┘   └──────────────┘   │   │
//! │  │                               │                                 │   │
//! │  │                       ┌───────▼────────┐                       │   │
//! │  │                       │  Repositories  │                       │   │
//! │  │                       │ product, sale, │                       │   │
//! │  │                       │ intake, service│                       │   │
//! │  │                       └────────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys ON)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and operation error types
//! - [`repository`] - Repository implementations (tenant-scoped access)
//! - [`service`] - Ledger, resolver, sale and intake processors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atelier_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let db = Database::new(DbConfig::new("path/to/atelier.db")).await?;
//!
//! // Commit a sale atomically (header + lines + stock debits)
//! let receipt = db
//!     .sale_processor()
//!     .create_sale(tenant, "maria", &lines, PaymentMethod::Pix, None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, ServiceError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::intake::IntakeRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::service_catalog::ServiceCatalogRepository;

// Service re-exports for convenience
pub use service::catalog::CatalogService;
pub use service::intake::IntakeProcessor;
pub use service::ledger::StockLedger;
pub use service::sale::SaleProcessor;
