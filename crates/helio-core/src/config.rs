//! # Engine Configuration
//!
//! Strongly-typed configuration for the sizing and pricing engines.
//!
//! ## Why Typed Config?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE STRING-SETTINGS PROBLEM                                            │
//! │                                                                         │
//! │  A global string settings table parsed to float at every use site       │
//! │  means a typo'd key silently becomes a guessed fallback, in one code    │
//! │  path but not another.                                                  │
//! │                                                                         │
//! │  OUR SOLUTION: assemble one typed object per run.                       │
//! │                                                                         │
//! │  ConfigProvider (settings table) ──► SizingConfig::from_provider        │
//! │                                        │                                │
//! │                                        ▼                                │
//! │        named fields, compile-time-checked defaults, parsed ONCE         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing or unparsable settings fall back to the engine-side default
//! for that field - assembly itself never fails.

use serde::{Deserialize, Serialize};

// =============================================================================
// Config Provider Seam
// =============================================================================

/// Source of named string settings (the `settings` table in helio-db,
/// a fixture map in tests).
pub trait ConfigProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// An empty provider: every field takes its engine-side default.
pub struct Defaults;

impl ConfigProvider for Defaults {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

impl ConfigProvider for std::collections::HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        std::collections::HashMap::get(self, key).cloned()
    }
}

fn get_f64(provider: &impl ConfigProvider, key: &str, default: f64) -> f64 {
    provider
        .get(key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn get_i64(provider: &impl ConfigProvider, key: &str, default: i64) -> i64 {
    provider
        .get(key)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

fn get_bool(provider: &impl ConfigProvider, key: &str, default: bool) -> bool {
    // Settings store numeric flags ("1"/"0") as well as true/false
    provider
        .get(key)
        .map(|v| matches!(v.trim(), "1" | "1.0" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

/// Parses a comma-separated size list ("10,15,20,25,30"), sorted
/// ascending with duplicates removed. Falls back on any parse failure.
fn get_size_list(provider: &impl ConfigProvider, key: &str, default: &[f64]) -> Vec<f64> {
    let parsed = provider.get(key).and_then(|v| {
        let sizes: Option<Vec<f64>> = v
            .split(',')
            .map(|s| s.trim().parse::<f64>().ok())
            .collect();
        sizes
    });

    let mut sizes = parsed.unwrap_or_else(|| default.to_vec());
    sizes.retain(|s| *s > 0.0);
    sizes.sort_by(|a, b| a.total_cmp(b));
    sizes.dedup();
    if sizes.is_empty() {
        sizes = default.to_vec();
    }
    sizes
}

// =============================================================================
// Panel Brand Table
// =============================================================================

/// Brand → panel wattage. Unknown brands get the default.
const PANEL_BRANDS: &[(&str, i64)] = &[("Jinko", 580), ("Longi", 570), ("JA", 560)];

/// Resolves `(brand, wattage)` for a requested brand, falling back to
/// the configured default brand/wattage when unknown or unspecified.
pub fn resolve_panel_brand(requested: Option<&str>, config: &SizingConfig) -> (String, i64) {
    if let Some(brand) = requested {
        let brand = brand.trim();
        for (known, wattage) in PANEL_BRANDS {
            if known.eq_ignore_ascii_case(brand) {
                return ((*known).to_string(), *wattage);
            }
        }
    }
    (
        config.default_panel_brand.clone(),
        config.default_panel_wattage,
    )
}

// =============================================================================
// Sizing Config
// =============================================================================

/// All factors the sizing engine reads, with Ghana-optimized defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Overall system efficiency (inverter, wiring, temperature,
    /// soiling losses). Demand is divided by this.
    pub system_efficiency: f64,
    /// Safety margin multiplier on the computed array size.
    pub design_factor: f64,
    /// Cap on installed DC capacity / inverter AC capacity.
    pub max_dc_ac_ratio: f64,
    /// Physical footprint of one panel in m².
    pub panel_area_m2: f64,
    /// Mounting/walkway spacing multiplier on roof area.
    pub spacing_factor: f64,
    /// Used when the location lookup has no match.
    pub default_peak_sun_hours: f64,
    pub default_panel_brand: String,
    pub default_panel_wattage: i64,
    pub battery: BatteryConfig,
    pub inverter: InverterSelectionConfig,
}

impl Default for SizingConfig {
    fn default() -> Self {
        SizingConfig {
            system_efficiency: 0.72,
            design_factor: 1.20,
            max_dc_ac_ratio: 1.3,
            panel_area_m2: 2.6,
            spacing_factor: 1.15,
            default_peak_sun_hours: 5.2,
            default_panel_brand: "Jinko".to_string(),
            default_panel_wattage: 580,
            battery: BatteryConfig::default(),
            inverter: InverterSelectionConfig::default(),
        }
    }
}

impl SizingConfig {
    /// Assembles the config from a settings provider, one parse per
    /// field, defaults on anything missing or unparsable.
    pub fn from_provider(provider: &impl ConfigProvider) -> Self {
        let d = SizingConfig::default();
        SizingConfig {
            system_efficiency: get_f64(provider, "system_efficiency", d.system_efficiency),
            design_factor: get_f64(provider, "design_factor", d.design_factor),
            max_dc_ac_ratio: get_f64(provider, "max_dc_ac_ratio", d.max_dc_ac_ratio),
            panel_area_m2: get_f64(provider, "panel_area_m2", d.panel_area_m2),
            spacing_factor: get_f64(provider, "spacing_factor", d.spacing_factor),
            default_peak_sun_hours: get_f64(
                provider,
                "default_peak_sun_hours",
                d.default_peak_sun_hours,
            ),
            default_panel_brand: provider
                .get("default_panel_brand")
                .unwrap_or(d.default_panel_brand),
            default_panel_wattage: get_i64(
                provider,
                "default_panel_wattage",
                d.default_panel_wattage,
            ),
            battery: BatteryConfig::from_provider(provider),
            inverter: InverterSelectionConfig::from_provider(provider),
        }
    }
}

// =============================================================================
// Battery Config
// =============================================================================

/// Battery chemistry and selection parameters (LiFePO4 defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Usable fraction of capacity (depth of discharge).
    pub dod: f64,
    /// Max continuous discharge as a multiple of capacity per hour.
    pub c_rate: f64,
    /// Battery DC → inverter → AC load efficiency.
    pub discharge_efficiency: f64,
    /// Smallest system we will quote, in kWh.
    pub min_size_kwh: f64,
    /// Capacity rounds up to a multiple of this.
    pub step_kwh: f64,
    /// Preferred large unit when no single catalog battery suffices.
    /// Deployment-specific cost preference, hence configurable.
    pub preferred_unit_kwh: f64,
    /// Cap on unit count before substituting a larger unit.
    pub max_units: i64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        BatteryConfig {
            dod: 0.85,
            c_rate: 0.5,
            discharge_efficiency: 0.90,
            min_size_kwh: 5.0,
            step_kwh: 5.0,
            preferred_unit_kwh: 16.0,
            max_units: 20,
        }
    }
}

impl BatteryConfig {
    pub fn from_provider(provider: &impl ConfigProvider) -> Self {
        let d = BatteryConfig::default();
        BatteryConfig {
            dod: get_f64(provider, "battery_dod", d.dod),
            c_rate: get_f64(provider, "battery_c_rate", d.c_rate),
            discharge_efficiency: get_f64(
                provider,
                "battery_discharge_efficiency",
                d.discharge_efficiency,
            ),
            min_size_kwh: get_f64(provider, "min_battery_size_kwh", d.min_size_kwh),
            step_kwh: get_f64(provider, "battery_step_kwh", d.step_kwh),
            preferred_unit_kwh: get_f64(
                provider,
                "preferred_battery_unit_kwh",
                d.preferred_unit_kwh,
            ),
            max_units: get_i64(provider, "max_battery_units", d.max_units),
        }
    }
}

// =============================================================================
// Inverter Selection Config
// =============================================================================

/// Inverter bank selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverterSelectionConfig {
    /// Catalog-independent standard sizes merged into the search space.
    pub standard_sizes_kw: Vec<f64>,
    /// Max units in one parallel bank.
    pub max_parallel: i64,
    /// Whether parallel banks may be used at all.
    pub use_parallel: bool,
    /// Above this requirement, prefer parallel banks (48V battery
    /// compatibility, redundancy) even when a single unit would fit.
    pub prefer_parallel_above_kw: f64,
    /// Floor for the synthesized fallback unit.
    pub min_unit_kw: f64,
}

impl Default for InverterSelectionConfig {
    fn default() -> Self {
        InverterSelectionConfig {
            standard_sizes_kw: vec![10.0, 15.0, 20.0, 25.0, 30.0],
            max_parallel: 4,
            use_parallel: true,
            prefer_parallel_above_kw: 30.0,
            min_unit_kw: 6.5,
        }
    }
}

impl InverterSelectionConfig {
    pub fn from_provider(provider: &impl ConfigProvider) -> Self {
        let d = InverterSelectionConfig::default();
        InverterSelectionConfig {
            standard_sizes_kw: get_size_list(
                provider,
                "standard_inverter_sizes",
                &d.standard_sizes_kw,
            ),
            max_parallel: get_i64(provider, "max_parallel_inverters", d.max_parallel),
            use_parallel: get_bool(provider, "use_parallel_inverters", d.use_parallel),
            prefer_parallel_above_kw: get_f64(
                provider,
                "prefer_parallel_above_kw",
                d.prefer_parallel_above_kw,
            ),
            min_unit_kw: get_f64(provider, "min_inverter_unit_kw", d.min_unit_kw),
        }
    }
}

// =============================================================================
// Pricing Config
// =============================================================================

/// Fallback values used when a service category has no catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// BOS as a percentage of the equipment base, in bps.
    pub bos_bps: u32,
    /// Installation as a percentage of equipment incl. BOS, in bps.
    pub installation_bps: u32,
    /// Flat transport charge in cents.
    pub transport_fixed_cents: i64,
    /// Default tax rate for new quotes, in bps.
    pub default_tax_bps: u32,
    /// Default quote validity window.
    pub validity_days: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            bos_bps: 1000,           // 10%
            installation_bps: 1000,  // 10%
            transport_fixed_cents: 100_000, // GHS 1,000.00
            default_tax_bps: 0,
            validity_days: 30,
        }
    }
}

impl PricingConfig {
    pub fn from_provider(provider: &impl ConfigProvider) -> Self {
        let d = PricingConfig::default();
        PricingConfig {
            // Settings store percentages as plain numbers ("10" = 10%)
            bos_bps: (get_f64(provider, "bos_percentage", d.bos_bps as f64 / 100.0) * 100.0)
                .round() as u32,
            installation_bps: (get_f64(
                provider,
                "installation_cost_percent",
                d.installation_bps as f64 / 100.0,
            ) * 100.0)
                .round() as u32,
            transport_fixed_cents: (get_f64(
                provider,
                "transport_cost_fixed",
                d.transport_fixed_cents as f64 / 100.0,
            ) * 100.0)
                .round() as i64,
            default_tax_bps: (get_f64(provider, "default_tax_percent", 0.0) * 100.0).round()
                as u32,
            validity_days: get_i64(provider, "quote_validity_days", d.validity_days),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
