//! # Sizing Engine
//!
//! Turns a customer's daily energy demand into a physical system
//! design: panel count, inverter bank, battery capacity.
//!
//! ## The Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_daily_kwh                                                        │
//! │       │ ÷ system_efficiency      (cover system losses)                  │
//! │       ▼                                                                 │
//! │  effective_daily_kwh                                                    │
//! │       │ ÷ peak_sun_hours         (location lookup, else default)        │
//! │       │ × design_factor          (safety margin)                        │
//! │       ▼                                                                 │
//! │  system_size_kw ──► number_of_panels = ceil(kW×1000 / wattage)          │
//! │       │                  │                                              │
//! │       │                  ▼                                              │
//! │       │            panel_array_kw = panels × wattage / 1000             │
//! │       │                  │        (ALL downstream ratios use this)      │
//! │       │                  ▼                                              │
//! │       │            roof_area_m2, dc_ac_ratio                           │
//! │       ▼                                                                 │
//! │  min_inverter_kw = system_size_kw / max_dc_ac_ratio ──► inverter bank   │
//! │                                                                         │
//! │  hybrid / off-grid / backup requested ──► battery sizer                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is pure: the caller resolves the location lookup and
//! catalog inverter sizes into a [`SizingContext`] first.

use chrono::Utc;
use uuid::Uuid;

use crate::battery;
use crate::config::{resolve_panel_brand, SizingConfig};
use crate::error::{CoreResult, ValidationError};
use crate::inverter;
use crate::types::{SizingInput, SizingResult, SystemType};

// =============================================================================
// Sizing Context
// =============================================================================

/// Externally-resolved inputs: what the location lookup and product
/// catalog said. Everything else comes from [`SizingConfig`].
#[derive(Debug, Clone, Default)]
pub struct SizingContext {
    /// Peak sun hours for the input's location, if the lookup matched.
    pub peak_sun_hours: Option<f64>,
    /// Available inverter sizes in kW: catalog capacities merged with
    /// the configured standard sizes, sorted ascending, distinct.
    pub inverter_sizes_kw: Vec<f64>,
}

// =============================================================================
// Calculation
// =============================================================================

/// Default backup windows when the input doesn't specify one.
/// Off-grid carries the full day; hybrid covers a typical outage.
const DEFAULT_OFF_GRID_BACKUP_HOURS: f64 = 24.0;
const DEFAULT_HYBRID_BACKUP_HOURS: f64 = 8.0;

/// Computes the full system design for a sizing input.
///
/// The caller validates the input first
/// ([`crate::validation::validate_sizing_input`]); the engine re-checks
/// the load defensively. Unknown brands and locations fall back to
/// defaults - they never error.
pub fn calculate(
    input: &SizingInput,
    config: &SizingConfig,
    context: &SizingContext,
) -> CoreResult<SizingResult> {
    if !(input.total_daily_kwh > 0.0) {
        return Err(ValidationError::MustBePositive {
            field: "total_daily_kwh".to_string(),
        }
        .into());
    }

    let peak_sun_hours = context
        .peak_sun_hours
        .filter(|h| *h > 0.0)
        .unwrap_or(config.default_peak_sun_hours);

    let (panel_brand, panel_wattage) = resolve_panel_brand(input.panel_brand.as_deref(), config);

    // Steps 1-3: inflate for losses, convert energy → power, add margin
    let effective_daily_kwh = input.total_daily_kwh / config.system_efficiency;
    let base_kw = effective_daily_kwh / peak_sun_hours;
    let system_size_kw = base_kw * config.design_factor;

    // Step 4-5: whole panels, then the capacity actually installed
    let number_of_panels = (system_size_kw * 1000.0 / panel_wattage as f64).ceil() as i64;
    let panel_array_kw = number_of_panels as f64 * panel_wattage as f64 / 1000.0;

    // Step 6: roof footprint
    let roof_area_m2 = number_of_panels as f64 * config.panel_area_m2 * config.spacing_factor;

    // Step 7: inverter bank
    let min_inverter_kw = system_size_kw / config.max_dc_ac_ratio;
    let bank = inverter::configure(min_inverter_kw, &context.inverter_sizes_kw, &config.inverter);

    // Step 8: ratio against the installed array, not the pre-ceiling
    // target, so rounding error doesn't compound downstream
    let dc_ac_ratio = panel_array_kw / bank.total_kw;

    // Step 9: battery, where backup is required
    let essential_load_percent = input.essential_load_percent.unwrap_or(0.5);
    let backup_hours = effective_backup_hours(input);
    let battery_capacity_kwh = if backup_hours > 0.0 {
        battery::size(
            input.total_daily_kwh,
            essential_load_percent,
            backup_hours,
            &config.battery,
        )
    } else {
        None
    };

    let now = Utc::now();
    Ok(SizingResult {
        id: Uuid::new_v4().to_string(),
        project_id: input.project_id.clone(),
        total_daily_kwh: input.total_daily_kwh,
        location: input.location.clone(),
        panel_brand,
        panel_wattage,
        backup_hours,
        essential_load_percent,
        effective_daily_kwh,
        system_size_kw,
        number_of_panels,
        panel_array_kw,
        roof_area_m2,
        min_inverter_kw,
        inverter_total_kw: bank.total_kw,
        inverter_count: bank.count,
        inverter_unit_kw: bank.unit_kw,
        battery_capacity_kwh,
        dc_ac_ratio,
        peak_sun_hours,
        system_efficiency: config.system_efficiency,
        design_factor: config.design_factor,
        created_at: now,
        updated_at: now,
    })
}

/// Backup hours actually used for battery sizing.
///
/// Hybrid and off-grid systems always get a battery; a missing or zero
/// input takes the system-type default. Grid-tied systems only get one
/// when the customer asked for backup hours.
fn effective_backup_hours(input: &SizingInput) -> f64 {
    let requested = input.backup_hours.unwrap_or(0.0);
    match input.system_type {
        SystemType::OffGrid => {
            if requested > 0.0 {
                requested
            } else {
                DEFAULT_OFF_GRID_BACKUP_HOURS
            }
        }
        SystemType::Hybrid => {
            if requested > 0.0 {
                requested
            } else {
                DEFAULT_HYBRID_BACKUP_HOURS
            }
        }
        SystemType::GridTied => requested,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kwh: f64, system_type: SystemType) -> SizingInput {
        SizingInput {
            project_id: "p1".to_string(),
            total_daily_kwh: kwh,
            location: Some("Accra".to_string()),
            panel_brand: Some("Jinko".to_string()),
            backup_hours: None,
            essential_load_percent: None,
            system_type,
        }
    }

    fn context() -> SizingContext {
        SizingContext {
            peak_sun_hours: Some(5.5),
            inverter_sizes_kw: vec![10.0, 15.0, 20.0, 25.0, 30.0],
        }
    }

    #[test]
    fn test_grid_tied_reference_numbers() {
        let result = calculate(
            &input(30.0, SystemType::GridTied),
            &SizingConfig::default(),
            &context(),
        )
        .unwrap();

        // 30 / 0.72 = 41.667 kWh effective
        assert!((result.effective_daily_kwh - 41.6667).abs() < 1e-3);
        // 41.667 / 5.5 × 1.2 = 9.0909 kW
        assert!((result.system_size_kw - 9.0909).abs() < 1e-3);
        // ceil(9090.9 / 580) = 16 panels → 9.28 kW installed
        assert_eq!(result.number_of_panels, 16);
        assert!((result.panel_array_kw - 9.28).abs() < 1e-9);
        // roof: 16 × 2.6 × 1.15
        assert!((result.roof_area_m2 - 47.84).abs() < 1e-9);
        // min inverter: 9.0909 / 1.3 ≈ 6.993 → single 10 kW
        assert!((result.min_inverter_kw - 6.993).abs() < 1e-3);
        assert_eq!(result.inverter_count, 1);
        assert_eq!(result.inverter_total_kw, 10.0);
        // ratio against installed array
        assert!((result.dc_ac_ratio - 0.928).abs() < 1e-9);
        // Grid-tied without backup hours: no battery
        assert_eq!(result.battery_capacity_kwh, None);
    }

    #[test]
    fn test_panels_always_cover_system_size() {
        let config = SizingConfig::default();
        for kwh in [1.0, 8.5, 24.0, 30.0, 75.0, 120.0, 400.0] {
            let result = calculate(&input(kwh, SystemType::GridTied), &config, &context()).unwrap();
            assert!(
                result.number_of_panels * result.panel_wattage
                    >= (result.system_size_kw * 1000.0) as i64,
                "panels fall short for {kwh} kWh/day"
            );
            assert!(result.inverter_total_kw >= result.min_inverter_kw);
            assert!(
                (result.dc_ac_ratio - result.panel_array_kw / result.inverter_total_kw).abs()
                    < 1e-12
            );
        }
    }

    #[test]
    fn test_hybrid_gets_battery_with_default_hours() {
        let result = calculate(
            &input(24.0, SystemType::Hybrid),
            &SizingConfig::default(),
            &context(),
        )
        .unwrap();
        assert_eq!(result.backup_hours, 8.0);
        // Same numbers as the battery sizer reference case
        assert_eq!(result.battery_capacity_kwh, Some(10.0));
    }

    #[test]
    fn test_off_grid_defaults_to_full_day() {
        let result = calculate(
            &input(24.0, SystemType::OffGrid),
            &SizingConfig::default(),
            &context(),
        )
        .unwrap();
        assert_eq!(result.backup_hours, 24.0);
        assert!(result.battery_capacity_kwh.unwrap() > 10.0);
    }

    #[test]
    fn test_grid_tied_with_backup_hours() {
        let mut req = input(24.0, SystemType::GridTied);
        req.backup_hours = Some(8.0);
        req.essential_load_percent = Some(0.5);

        let result = calculate(&req, &SizingConfig::default(), &context()).unwrap();
        assert_eq!(result.battery_capacity_kwh, Some(10.0));
    }

    #[test]
    fn test_unknown_location_uses_default_sun_hours() {
        let mut ctx = context();
        ctx.peak_sun_hours = None;

        let result = calculate(
            &input(30.0, SystemType::GridTied),
            &SizingConfig::default(),
            &ctx,
        )
        .unwrap();
        assert_eq!(result.peak_sun_hours, 5.2);
    }

    #[test]
    fn test_unknown_brand_falls_back() {
        let mut req = input(30.0, SystemType::GridTied);
        req.panel_brand = Some("Mystery".to_string());

        let result = calculate(&req, &SizingConfig::default(), &context()).unwrap();
        assert_eq!(result.panel_brand, "Jinko");
        assert_eq!(result.panel_wattage, 580);
    }

    #[test]
    fn test_zero_load_rejected() {
        let result = calculate(
            &input(0.0, SystemType::GridTied),
            &SizingConfig::default(),
            &context(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_large_system_selects_parallel_bank() {
        // 120 kWh/day: effective 166.67, ÷5.5 ×1.2 = 36.36 kW;
        // min inverter 27.97 → single 30 (below 30 kW threshold).
        let result = calculate(
            &input(120.0, SystemType::GridTied),
            &SizingConfig::default(),
            &context(),
        )
        .unwrap();
        assert_eq!(result.inverter_count, 1);
        assert_eq!(result.inverter_total_kw, 30.0);

        // 160 kWh/day: min inverter ≈ 37.3 → parallel bank required
        let result = calculate(
            &input(160.0, SystemType::GridTied),
            &SizingConfig::default(),
            &context(),
        )
        .unwrap();
        assert!(result.inverter_count > 1);
        assert!(result.inverter_total_kw >= result.min_inverter_kw);
    }
}
