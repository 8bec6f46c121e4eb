//! # helio-core: Pure Business Logic for Helio
//!
//! This crate is the **heart** of Helio, a solar PV quoting system.
//! It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Helio Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 API / Reports / E-commerce                      │   │
//! │  │        (out of scope for this workspace)                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 helio-db (Database Layer)                       │   │
//! │  │    SQLite repositories, stock ledger, orchestration services   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ helio-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  sizing  │ │ inverter │ │ battery  │ │ pricing  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  recalc  │ │  types   │ │  money   │ │  config  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Quote, StockMovement, etc.)
//! - [`money`] - Money and Percent types with integer arithmetic
//! - [`config`] - Strongly-typed engine configuration with defaults
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`sizing`] - Daily demand → physical system design
//! - [`inverter`] - Inverter bank selection (single vs. parallel)
//! - [`battery`] - Dual-constraint battery capacity sizing
//! - [`pricing`] - Sizing result + catalog → quote line items
//! - [`recalc`] - Full-replay recomputation of quote totals
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod battery;
pub mod config;
pub mod error;
pub mod inverter;
pub mod money;
pub mod pricing;
pub mod recalc;
pub mod sizing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use helio_core::Money` instead of
// `use helio_core::money::Money`

pub use config::{BatteryConfig, ConfigProvider, InverterSelectionConfig, PricingConfig, SizingConfig};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percent};
pub use types::*;
