//! # Validation Module
//!
//! Input validation for the sizing and quoting engines.
//!
//! ## Validation Strategy
//! The API layer validates before any engine runs; the engines also
//! guard their own preconditions defensively. Database constraints
//! (NOT NULL, CHECK, foreign keys) form the last layer.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Sizing Input
// =============================================================================

/// Validates a sizing input before the engine runs.
///
/// ## Rules
/// - `total_daily_kwh` must be positive and finite
/// - `backup_hours`, if given, must be non-negative
/// - `essential_load_percent`, if given, must be in (0, 1]
pub fn validate_sizing_input(input: &crate::types::SizingInput) -> ValidationResult<()> {
    if !input.total_daily_kwh.is_finite() || input.total_daily_kwh <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "total_daily_kwh".to_string(),
        });
    }

    if let Some(hours) = input.backup_hours {
        if !hours.is_finite() || hours < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "backup_hours".to_string(),
                min: 0.0,
                max: 168.0,
            });
        }
    }

    if let Some(pct) = input.essential_load_percent {
        if !pct.is_finite() || pct <= 0.0 || pct > 1.0 {
            return Err(ValidationError::OutOfRange {
                field: "essential_load_percent".to_string(),
                min: 0.0,
                max: 1.0,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Quote Edits
// =============================================================================

/// Validates a line-item quantity.
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a unit price in cents (zero allowed for free lines).
pub fn validate_unit_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }
    Ok(())
}

/// Validates a percentage rate in basis points (0% to 100%).
pub fn validate_percent_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "percent".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SizingInput, SystemType};

    fn input(kwh: f64) -> SizingInput {
        SizingInput {
            project_id: "p1".to_string(),
            total_daily_kwh: kwh,
            location: None,
            panel_brand: None,
            backup_hours: None,
            essential_load_percent: None,
            system_type: SystemType::GridTied,
        }
    }

    #[test]
    fn test_validate_sizing_input() {
        assert!(validate_sizing_input(&input(24.0)).is_ok());
        assert!(validate_sizing_input(&input(0.0)).is_err());
        assert!(validate_sizing_input(&input(-3.0)).is_err());
        assert!(validate_sizing_input(&input(f64::NAN)).is_err());

        let mut bad = input(24.0);
        bad.backup_hours = Some(-1.0);
        assert!(validate_sizing_input(&bad).is_err());

        let mut bad = input(24.0);
        bad.essential_load_percent = Some(1.5);
        assert!(validate_sizing_input(&bad).is_err());

        let mut ok = input(24.0);
        ok.backup_hours = Some(8.0);
        ok.essential_load_percent = Some(0.5);
        assert!(validate_sizing_input(&ok).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1.0).is_ok());
        assert!(validate_quantity(0.5).is_ok());
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-2.0).is_err());
    }

    #[test]
    fn test_validate_percent_bps() {
        assert!(validate_percent_bps(0).is_ok());
        assert!(validate_percent_bps(10_000).is_ok());
        assert!(validate_percent_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
