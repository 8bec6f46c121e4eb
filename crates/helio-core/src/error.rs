//! # Error Types
//!
//! Domain-specific error types for helio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  helio-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule and engine failures               │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  helio-db errors (separate crate)                                       │
//! │  └── DbError          - Database failures, insufficient stock           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → API layer                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (category, field, ID)
//! 3. Errors are enum variants, never String
//! 4. Degradable paths (imperfect catalog matches) do NOT error; only
//!    mandatory categories and unrecoverable percentages do

use thiserror::Error;

use crate::types::ItemCategory;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or engine failures.
/// Sizing and pricing degrade gracefully on imperfect catalog matches;
/// these variants cover the cases that genuinely cannot proceed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A mandatory pricing category has no active catalog entries.
    ///
    /// ## When This Occurs
    /// Panels and inverters are mandatory: a quote without them is not
    /// a solar system. Every other category falls back to configured
    /// percentages or fixed values instead of erroring.
    #[error("No active {category:?} products in catalog; cannot price quote")]
    MissingCategory { category: ItemCategory },

    /// A percentage-derived line item cannot recover its percentage.
    ///
    /// ## When This Occurs
    /// - BOS or installation item has no `percentage_of_equipment_bps`
    /// - Its description carries no legacy `NN%` marker
    /// - It is not linked to a fixed-price product
    ///
    /// Recalculation must fail loudly here: silently keeping the old
    /// price would leave the quote's totals stale.
    #[error("Cannot recover percentage for '{description}'; totals would go stale")]
    Configuration { description: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements.
/// Used for early validation before engine logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
