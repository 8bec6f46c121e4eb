//! # helio-db: Persistence Layer for Helio
//!
//! This crate provides database access for the Helio solar quoting
//! system. It uses SQLite for local storage with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Helio Data Flow                                  │
//! │                                                                         │
//! │  API layer (sizing request, quote edit, acceptance, order webhook)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     helio-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐     │   │
//! │  │   │   Database    │   │  Repositories │   │  Migrations  │     │   │
//! │  │   │   (pool.rs)   │   │  + StockLedger│   │  (embedded)  │     │   │
//! │  │   │               │   │  + Services   │   │              │     │   │
//! │  │   │ SqlitePool    │◄──│ ProductRepo   │   │ 001_init.sql │     │   │
//! │  │   │ WAL mode      │   │ QuoteRepo ... │   │ ...          │     │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘     │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls pure engines                     │
//! │                                ▼                                        │
//! │                            helio-core                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`stock_ledger`] - Append-only stock ledger + acceptance machine
//! - [`service`] - Orchestration between lookups and engines
//!
//! ## Usage
//!
//! ```rust,ignore
//! use helio_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/helio.db")).await?;
//!
//! let sizing = db.sizing_service().calculate_for_project(&input).await?;
//! let (quote, items) = db.quote_service().generate_for_project(&project_id).await?;
//! db.stock_ledger().accept_project(&project_id, Some("ops")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod stock_ledger;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{QuoteService, SizingService};
pub use stock_ledger::StockLedger;

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::project::ProjectRepository;
pub use repository::quote::QuoteRepository;
pub use repository::settings::SettingsRepository;
pub use repository::sizing::SizingResultRepository;
