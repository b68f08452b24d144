//! # Repository Module
//!
//! Database repository implementations for Atelier Stock.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller (API layer / service)                                          │
//! │       │                                                                 │
//! │       │  db.products().get(tenant, id)                                 │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get(&self, tenant, id)                                            │
//! │  ├── list(&self, tenant)                                               │
//! │  ├── insert(&self, product)                                            │
//! │  └── update(&self, tenant, update)                                     │
//! │       │                                                                 │
//! │       │  SQL Query (always tenant-scoped)                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenant Scoping
//!
//! Every public repository method takes the caller's `tenant` and includes it
//! in the query predicate. A row belonging to another tenant is
//! indistinguishable from a missing row: both answer `NotFound`. The
//! `*_tx` associated functions participate in the service layer's
//! transactions and follow the same rule.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product catalog reads and registration
//! - [`service_catalog::ServiceCatalogRepository`] - Service catalog
//! - [`sale::SaleRepository`] - Sale read accessors and commit primitives
//! - [`intake::IntakeRepository`] - Intake note read accessors and commit primitives

pub mod intake;
pub mod product;
pub mod sale;
pub mod service_catalog;
