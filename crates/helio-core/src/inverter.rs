//! # Inverter Configurator
//!
//! Chooses between a single inverter and a parallel bank.
//!
//! ## Selection Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Inverter Bank Selection                              │
//! │                                                                         │
//! │  required_kw ≤ prefer_parallel_above_kw?                                │
//! │       │                                                                 │
//! │       ├── yes ──► smallest single size ≥ required?  ──► use it          │
//! │       │                    │ none fits                                  │
//! │       │                    ▼                                            │
//! │       └── no ───► search (size × count), count ≤ max_parallel,          │
//! │                   size × count ≥ required                               │
//! │                     • minimize excess capacity                          │
//! │                     • tie-break: fewest units                           │
//! │                            │ nothing satisfies the bound                │
//! │                            ▼                                            │
//! │                   synthesize single unit: next 0.5 kW increment,        │
//! │                   floored at min_unit_kw  (NEVER fails)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Large systems prefer parallel banks for 48V battery compatibility,
//! redundancy, and lower per-unit current.

use serde::{Deserialize, Serialize};

use crate::config::InverterSelectionConfig;

/// A selected inverter configuration: `count` units of `unit_kw` each.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InverterBank {
    pub count: i64,
    pub unit_kw: f64,
    pub total_kw: f64,
}

impl InverterBank {
    fn single(unit_kw: f64) -> Self {
        InverterBank {
            count: 1,
            unit_kw,
            total_kw: unit_kw,
        }
    }
}

/// Selects an inverter bank for `required_kw`.
///
/// `available_sizes` must be sorted ascending and distinct (the caller
/// merges catalog sizes with the configured standard sizes). This
/// function always returns a valid configuration.
pub fn configure(
    required_kw: f64,
    available_sizes: &[f64],
    config: &InverterSelectionConfig,
) -> InverterBank {
    if available_sizes.is_empty() {
        return synthesized_single(required_kw, config);
    }

    let prefer_parallel = config.use_parallel && required_kw > config.prefer_parallel_above_kw;

    if !prefer_parallel {
        // Small systems: the smallest single unit that fits wins on
        // cost and unit count.
        if let Some(size) = available_sizes.iter().find(|s| **s >= required_kw) {
            return InverterBank::single(*size);
        }
    }

    if !config.use_parallel {
        return synthesized_single(required_kw, config);
    }

    // Parallel search. For each size the minimal sufficient count is
    // ceil(required / size); any larger count only adds excess, so one
    // candidate per size covers the whole (size, count) space.
    let mut best: Option<InverterBank> = None;
    let mut best_excess = f64::INFINITY;

    for &size in available_sizes {
        if size <= 0.0 {
            continue;
        }
        let count = (required_kw / size).ceil().max(1.0) as i64;
        if count > config.max_parallel {
            continue;
        }

        let total = size * count as f64;
        let excess = total - required_kw;

        let better = excess < best_excess
            || (excess == best_excess && best.map_or(true, |b| count < b.count));
        if better {
            best_excess = excess;
            best = Some(InverterBank {
                count,
                unit_kw: size,
                total_kw: total,
            });
        }
    }

    best.unwrap_or_else(|| synthesized_single(required_kw, config))
}

/// Fallback when no catalog combination satisfies the parallel bound:
/// one unit at the next 0.5 kW increment, floored at the minimum size.
fn synthesized_single(required_kw: f64, config: &InverterSelectionConfig) -> InverterBank {
    let size = ((required_kw * 2.0).ceil() / 2.0).max(config.min_unit_kw);
    InverterBank::single(size)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InverterSelectionConfig {
        InverterSelectionConfig::default()
    }

    const SIZES: &[f64] = &[10.0, 15.0, 20.0, 25.0, 30.0];

    #[test]
    fn test_small_system_picks_smallest_sufficient_single() {
        let bank = configure(12.0, SIZES, &config());
        assert_eq!(bank.count, 1);
        assert_eq!(bank.unit_kw, 15.0);
        assert_eq!(bank.total_kw, 15.0);
    }

    #[test]
    fn test_exact_single_match() {
        let bank = configure(20.0, SIZES, &config());
        assert_eq!((bank.count, bank.unit_kw), (1, 20.0));
    }

    #[test]
    fn test_large_system_prefers_minimal_waste_parallel() {
        // 31 kW: 4×10 and 2×20 both waste 9 kW; fewest units wins.
        let bank = configure(31.0, SIZES, &config());
        assert_eq!(bank.count, 2);
        assert_eq!(bank.unit_kw, 20.0);
        assert_eq!(bank.total_kw, 40.0);
    }

    #[test]
    fn test_parallel_exact_cover_wins() {
        // 45 kW is above the threshold; 3×15 covers it exactly.
        let bank = configure(45.0, SIZES, &config());
        assert_eq!(bank.count, 3);
        assert_eq!(bank.unit_kw, 15.0);
        assert_eq!(bank.total_kw, 45.0);
    }

    #[test]
    fn test_below_threshold_but_no_single_fits() {
        // Catalog tops out at 8 kW with requirement 14: falls through to
        // the parallel search even below the threshold.
        let bank = configure(14.0, &[4.0, 8.0], &config());
        assert_eq!(bank.count, 2);
        assert_eq!(bank.unit_kw, 8.0);
        assert_eq!(bank.total_kw, 16.0);
    }

    #[test]
    fn test_synthesized_when_bound_unsatisfiable() {
        // 4 × 30 = 120 < 130: nothing satisfies the bound.
        let bank = configure(130.0, SIZES, &config());
        assert_eq!(bank.count, 1);
        assert_eq!(bank.unit_kw, 130.0);
    }

    #[test]
    fn test_synthesized_rounds_to_half_kw_and_floors() {
        let bank = configure(7.2, &[], &config());
        assert_eq!((bank.count, bank.unit_kw), (1, 7.5));

        let tiny = configure(1.3, &[], &config());
        assert_eq!(tiny.unit_kw, 6.5); // floored at min_unit_kw
    }

    #[test]
    fn test_parallel_disabled_forces_single_path() {
        let mut cfg = config();
        cfg.use_parallel = false;

        // A single 30 covers 28 even with parallel off
        let bank = configure(28.0, SIZES, &cfg);
        assert_eq!((bank.count, bank.unit_kw), (1, 30.0));

        // Nothing single fits 45: synthesized instead of parallel
        let bank = configure(45.0, SIZES, &cfg);
        assert_eq!(bank.count, 1);
        assert_eq!(bank.unit_kw, 45.0);
    }

    #[test]
    fn test_total_always_covers_requirement() {
        for required in [0.5, 3.0, 9.9, 17.3, 31.0, 59.4, 88.8, 119.9, 250.0] {
            let bank = configure(required, SIZES, &config());
            assert!(
                bank.total_kw + 1e-9 >= required,
                "bank {bank:?} does not cover {required}"
            );
            assert!(bank.count >= 1);
            assert!((bank.total_kw - bank.unit_kw * bank.count as f64).abs() < 1e-9);
        }
    }
}
