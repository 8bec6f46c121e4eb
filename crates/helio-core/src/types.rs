//! # Domain Types
//!
//! Core domain types used throughout Helio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Project      │──►│     Quote       │──►│   QuoteItem     │        │
//! │  │  status machine │   │  cached totals  │   │  category, qty  │        │
//! │  └────────┬────────┘   └─────────────────┘   └────────┬────────┘        │
//! │           │                                           │                 │
//! │           ▼                                           ▼                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │  SizingResult   │   │  StockMovement  │◄──│    Product      │        │
//! │  │  one per proj   │   │  append-only    │   │  catalog entry  │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where humans need one (quote_number, sku, reference_code)
//!
//! ## Categorical Fields
//! Every string-backed category from upstream data passes through one
//! canonical normalization (`ItemCategory::normalize`,
//! `ProductType`/`PriceType` serde) at the ingress boundary. No call
//! site re-implements the matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Percent};

// =============================================================================
// System Type
// =============================================================================

/// What kind of PV system the customer is buying.
///
/// Determines whether a battery is mandatory (hybrid/off-grid) or
/// optional (grid-tied with backup hours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    /// Grid-connected, no storage unless backup hours requested.
    GridTied,
    /// Grid-connected with battery backup.
    Hybrid,
    /// No grid; battery carries the full load.
    OffGrid,
}

// =============================================================================
// Project Status
// =============================================================================

/// Project lifecycle state machine.
///
/// ```text
/// New ──► Quoted ──► Accepted ──► Installed
///                        │
///                        └──────► Rejected
/// ```
///
/// Transitions into Accepted deduct stock; Accepted → Rejected restores
/// it via compensating ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    New,
    Quoted,
    Accepted,
    Rejected,
    Installed,
}

impl ProjectStatus {
    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (*self, next),
            (New, Quoted)
                | (New, Accepted)
                | (Quoted, Accepted)
                | (Accepted, Rejected)
                | (Accepted, Installed)
        )
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::New
    }
}

// =============================================================================
// Quote Status
// =============================================================================

/// The status of a quote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// Quote is being edited.
    Draft,
    /// Quote was sent to the customer.
    Sent,
    /// Customer accepted; stock has been reserved.
    Accepted,
    /// Customer rejected.
    Rejected,
    /// Validity window elapsed.
    Expired,
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Draft
    }
}

// =============================================================================
// Product Type & Price Type
// =============================================================================

/// Catalog product categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Panel,
    Inverter,
    Battery,
    Mounting,
    Bos,
    Installation,
    Transport,
    Other,
}

/// How a catalog product's `base_price_cents` is interpreted.
///
/// ## Percentage Pricing
/// For `Percentage` products `base_price_cents` holds **basis points**
/// (1000 = 10%), so the column stays an integer for every price type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Flat price per line.
    Fixed,
    /// Price per panel.
    PerPanel,
    /// Price per watt of panel capacity.
    PerWatt,
    /// Price per kW (inverters, mounting).
    PerKw,
    /// Price per kWh (batteries).
    PerKwh,
    /// Percentage of the equipment base (BOS, installation).
    Percentage,
}

// =============================================================================
// Item Category
// =============================================================================

/// Closed category set for quote line items.
///
/// ## Why Not Reuse ProductType?
/// Custom line items have no product, and the equipment/services split
/// that drives the subtotals must survive product deletion. The
/// category is snapshotted onto the item at creation and is the only
/// field the recalculator consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Panel,
    Inverter,
    Battery,
    Mounting,
    Bos,
    Transport,
    Installation,
    Other,
}

impl ItemCategory {
    /// Canonical normalization from free text.
    ///
    /// The ONE place where upstream strings become categories. Applied
    /// at ingress (imports, API payloads); everything downstream
    /// matches on the enum.
    pub fn normalize(raw: &str) -> ItemCategory {
        match raw.trim().to_ascii_lowercase().as_str() {
            "panel" | "panels" | "pv panel" => ItemCategory::Panel,
            "inverter" | "inverters" => ItemCategory::Inverter,
            "battery" | "batteries" => ItemCategory::Battery,
            "mounting" | "mounting structure" => ItemCategory::Mounting,
            "bos" | "balance of system" => ItemCategory::Bos,
            "transport" | "transport & logistics" | "logistics" => ItemCategory::Transport,
            "installation" => ItemCategory::Installation,
            _ => ItemCategory::Other,
        }
    }

    /// Equipment items roll into `equipment_subtotal`; the rest are
    /// services. BOS counts as equipment even though it is priced as a
    /// percentage of the others.
    pub fn is_equipment(&self) -> bool {
        matches!(
            self,
            ItemCategory::Panel
                | ItemCategory::Inverter
                | ItemCategory::Battery
                | ItemCategory::Mounting
                | ItemCategory::Bos
        )
    }

    /// Equipment base items: the categories whose line totals form the
    /// base that BOS percentage pricing is applied to (BOS excluded).
    pub fn is_equipment_base(&self) -> bool {
        matches!(
            self,
            ItemCategory::Panel
                | ItemCategory::Inverter
                | ItemCategory::Battery
                | ItemCategory::Mounting
        )
    }
}

impl From<ProductType> for ItemCategory {
    fn from(pt: ProductType) -> Self {
        match pt {
            ProductType::Panel => ItemCategory::Panel,
            ProductType::Inverter => ItemCategory::Inverter,
            ProductType::Battery => ItemCategory::Battery,
            ProductType::Mounting => ItemCategory::Mounting,
            ProductType::Bos => ItemCategory::Bos,
            ProductType::Installation => ItemCategory::Installation,
            ProductType::Transport => ItemCategory::Transport,
            ProductType::Other => ItemCategory::Other,
        }
    }
}

// =============================================================================
// Stock Movement Type
// =============================================================================

/// Why a ledger row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockMovementType {
    /// Project acceptance reserved this stock.
    DeductionOnAccept,
    /// Compensating entry reversing a DeductionOnAccept.
    RestoreOnReject,
    /// E-commerce order payment confirmed.
    DeductionEcomOrder,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry: panel, inverter, battery, or a service line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub product_type: ProductType,

    /// Manufacturer, where it matters for matching (panels).
    pub brand: Option<String>,
    pub model: Option<String>,

    /// Display name for e-commerce listings.
    pub name: Option<String>,

    /// Stock Keeping Unit - business identifier.
    pub sku: Option<String>,

    /// Panel wattage in W (panels only).
    pub wattage: Option<i64>,

    /// Inverter capacity in kW (inverters only).
    pub capacity_kw: Option<f64>,

    /// Battery capacity in kWh (batteries only).
    pub capacity_kwh: Option<f64>,

    pub price_type: PriceType,

    /// Price in cents; basis points for `PriceType::Percentage`.
    pub base_price_cents: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// Whether to track inventory for this product.
    pub manage_stock: bool,

    /// Materialized stock cache. Must always equal the opening balance
    /// plus the sum of this product's stock movements.
    pub stock_quantity: i64,

    /// Derived storefront flag: `stock_quantity > 0`.
    pub in_stock: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the base price as Money (meaningless for Percentage).
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }

    /// For Percentage-priced products: the rate in basis points.
    #[inline]
    pub fn percentage(&self) -> Percent {
        Percent::from_bps(self.base_price_cents.max(0) as u32)
    }

    /// Best human-readable label for error messages and line items.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.model.clone())
            .or_else(|| self.brand.clone())
            .unwrap_or_else(|| "Product".to_string())
    }
}

// =============================================================================
// Project
// =============================================================================

/// A customer project moving through the acceptance state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Human-facing reference (e.g. "PRJ-20260815-0042").
    pub reference_code: String,
    pub system_type: SystemType,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sizing Input & Result
// =============================================================================

/// What the customer tells us: daily demand plus preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingInput {
    pub project_id: String,
    /// Total daily energy demand in kWh. Must be positive.
    pub total_daily_kwh: f64,
    /// Free-text location for peak-sun-hours lookup.
    pub location: Option<String>,
    /// Preferred panel brand; unknown brands fall back to the default.
    pub panel_brand: Option<String>,
    /// Hours of battery backup wanted (grid-tied systems).
    pub backup_hours: Option<f64>,
    /// Fraction of load considered essential during an outage (0..=1).
    pub essential_load_percent: Option<f64>,
    pub system_type: SystemType,
}

/// The physical design computed from a [`SizingInput`].
///
/// One active snapshot per project. Recomputation overwrites the row
/// wholesale - the factors used are stored alongside the outputs so a
/// stored result is always self-consistent, never patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SizingResult {
    pub id: String,
    pub project_id: String,

    // Inputs echoed
    pub total_daily_kwh: f64,
    pub location: Option<String>,
    pub panel_brand: String,
    pub panel_wattage: i64,
    pub backup_hours: f64,
    pub essential_load_percent: f64,

    // Outputs
    /// Demand inflated to cover system losses.
    pub effective_daily_kwh: f64,
    /// Required array capacity before panel rounding.
    pub system_size_kw: f64,
    pub number_of_panels: i64,
    /// Actual installed DC capacity: panels × wattage. All downstream
    /// ratio math uses this, never the pre-ceiling `system_size_kw`.
    pub panel_array_kw: f64,
    pub roof_area_m2: f64,
    /// Minimum inverter capacity implied by the DC/AC ratio cap.
    pub min_inverter_kw: f64,
    /// Selected inverter bank.
    pub inverter_total_kw: f64,
    pub inverter_count: i64,
    pub inverter_unit_kw: f64,
    pub battery_capacity_kwh: Option<f64>,
    pub dc_ac_ratio: f64,

    // Factors used
    pub peak_sun_hours: f64,
    pub system_efficiency: f64,
    pub design_factor: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Quote
// =============================================================================

/// A priced offer for a project. Aggregate root over its items.
///
/// ## Cached Totals Invariant
/// `grand_total == equipment_subtotal + services_subtotal + tax_amount
/// − discount_amount` holds after every mutating operation; the
/// recalculator re-derives all five from the items, never patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Quote {
    pub id: String,
    pub project_id: String,
    /// Human-facing number (e.g. "Q-20260815-0042").
    pub quote_number: String,
    pub status: QuoteStatus,

    pub equipment_subtotal_cents: i64,
    pub services_subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_amount_cents: i64,
    pub discount_rate_bps: u32,
    pub discount_amount_cents: i64,
    pub grand_total_cents: i64,

    pub validity_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    #[inline]
    pub fn equipment_subtotal(&self) -> Money {
        Money::from_cents(self.equipment_subtotal_cents)
    }

    #[inline]
    pub fn services_subtotal(&self) -> Money {
        Money::from_cents(self.services_subtotal_cents)
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> Percent {
        Percent::from_bps(self.tax_rate_bps)
    }

    #[inline]
    pub fn discount_rate(&self) -> Percent {
        Percent::from_bps(self.discount_rate_bps)
    }

    /// Checks the cached-totals invariant.
    pub fn totals_consistent(&self) -> bool {
        self.grand_total_cents
            == self.equipment_subtotal_cents + self.services_subtotal_cents
                + self.tax_amount_cents
                - self.discount_amount_cents
    }
}

// =============================================================================
// Quote Item
// =============================================================================

/// A line item in a quote.
///
/// Product details are snapshotted (category, description, price) so
/// the quote survives catalog edits. `total_price` is always
/// `round(quantity × unit_price)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct QuoteItem {
    pub id: String,
    pub quote_id: String,
    /// None for custom or config-derived items.
    pub product_id: Option<String>,
    pub category: ItemCategory,
    /// Display-only text. Never parsed for pricing on new rows.
    pub description: String,
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    /// For BOS/installation: the percentage (bps) this item's price is
    /// derived from. The recalculator's recovery path. Display text may
    /// repeat it; this field is authoritative.
    pub percentage_of_equipment_bps: Option<u32>,
    /// True if manually added, not generated from the catalog.
    pub is_custom: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

impl QuoteItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    /// The one formula for a line total: `round(quantity × unit_price)`.
    pub fn compute_total_cents(quantity: f64, unit_price_cents: i64) -> i64 {
        Money::from_cents(unit_price_cents).scale(quantity).cents()
    }

    /// Re-derives `total_price_cents` from the current fields.
    pub fn refresh_total(&mut self) {
        self.total_price_cents = Self::compute_total_cents(self.quantity, self.unit_price_cents);
    }

    /// Whole units to reserve in the stock ledger: `max(1, ceil(qty))`.
    pub fn stock_units(&self) -> i64 {
        (self.quantity.ceil() as i64).max(1)
    }
}

// =============================================================================
// Stock Movement & Shortage
// =============================================================================

/// One append-only ledger row. Never mutated, never deleted; reversals
/// are compensating rows with the opposite sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// Signed delta: negative for deductions, positive for restores.
    pub quantity: i64,
    pub movement_type: StockMovementType,
    pub project_id: Option<String>,
    pub quote_id: Option<String>,
    pub quote_item_id: Option<String>,
    pub order_id: Option<String>,
    /// Actor who triggered the movement (None for system events).
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of an itemized shortage report.
///
/// Acceptance checks report EVERY stock-tracked item, not just the
/// first failure, so the operator sees the whole picture at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product_id: String,
    pub product_name: String,
    pub required: i64,
    pub available: i64,
}

impl StockShortage {
    /// True when this row is actually short (required > available).
    #[inline]
    pub fn is_short(&self) -> bool {
        self.required > self.available
    }
}

impl std::fmt::Display for StockShortage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Insufficient stock for '{}': required {}, available {}",
            self.product_name, self.required, self.available
        )
    }
}

// =============================================================================
// E-commerce Order (payment-confirmed trigger)
// =============================================================================

/// Minimal order record; the storefront itself lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

/// A line in an e-commerce order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: Option<String>,
    pub quantity: f64,
}

impl OrderItem {
    /// Whole units to deduct: `max(1, ceil(qty))`.
    pub fn stock_units(&self) -> i64 {
        (self.quantity.ceil() as i64).max(1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_transitions() {
        use ProjectStatus::*;
        assert!(New.can_transition_to(Quoted));
        assert!(Quoted.can_transition_to(Accepted));
        assert!(Accepted.can_transition_to(Rejected));
        assert!(Accepted.can_transition_to(Installed));

        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Installed.can_transition_to(New));
        assert!(!Quoted.can_transition_to(Installed));
    }

    #[test]
    fn test_item_category_normalize() {
        assert_eq!(ItemCategory::normalize("Balance of System"), ItemCategory::Bos);
        assert_eq!(ItemCategory::normalize("  PANELS "), ItemCategory::Panel);
        assert_eq!(ItemCategory::normalize("Transport & Logistics"), ItemCategory::Transport);
        assert_eq!(ItemCategory::normalize("something else"), ItemCategory::Other);
    }

    #[test]
    fn test_equipment_classification() {
        assert!(ItemCategory::Panel.is_equipment());
        assert!(ItemCategory::Bos.is_equipment());
        assert!(!ItemCategory::Bos.is_equipment_base());
        assert!(!ItemCategory::Transport.is_equipment());
        assert!(!ItemCategory::Installation.is_equipment());
    }

    #[test]
    fn test_quote_item_total_formula() {
        assert_eq!(QuoteItem::compute_total_cents(18.0, 109_900), 1_978_200);
        // Fractional quantities round once
        assert_eq!(QuoteItem::compute_total_cents(2.5, 101), 253);
    }

    #[test]
    fn test_stock_units_ceil() {
        let mut item = sample_item();
        item.quantity = 2.2;
        assert_eq!(item.stock_units(), 3);
        item.quantity = 0.4;
        assert_eq!(item.stock_units(), 1);
        item.quantity = 5.0;
        assert_eq!(item.stock_units(), 5);
    }

    #[test]
    fn test_totals_consistent() {
        let mut quote = sample_quote();
        quote.equipment_subtotal_cents = 100_000;
        quote.services_subtotal_cents = 20_000;
        quote.tax_amount_cents = 12_000;
        quote.discount_amount_cents = 6_000;
        quote.grand_total_cents = 126_000;
        assert!(quote.totals_consistent());

        quote.grand_total_cents += 1;
        assert!(!quote.totals_consistent());
    }

    fn sample_item() -> QuoteItem {
        QuoteItem {
            id: "i1".into(),
            quote_id: "q1".into(),
            product_id: None,
            category: ItemCategory::Other,
            description: "test".into(),
            quantity: 1.0,
            unit_price_cents: 100,
            total_price_cents: 100,
            percentage_of_equipment_bps: None,
            is_custom: true,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    fn sample_quote() -> Quote {
        Quote {
            id: "q1".into(),
            project_id: "p1".into(),
            quote_number: "Q-1".into(),
            status: QuoteStatus::Draft,
            equipment_subtotal_cents: 0,
            services_subtotal_cents: 0,
            tax_rate_bps: 0,
            tax_amount_cents: 0,
            discount_rate_bps: 0,
            discount_amount_cents: 0,
            grand_total_cents: 0,
            validity_days: 30,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
