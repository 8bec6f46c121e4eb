//! # Quote Recalculator
//!
//! Full idempotent replay of a quote's derived values.
//!
//! ## The Recomputation DAG
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  item totals (qty × unit price)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  equipment base (Panel + Inverter + Battery + Mounting)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BOS reprice (% of base) ──► installation reprice (% of base + BOS)     │
//! │       │                              │                                  │
//! │       └──────────┬───────────────────┘                                  │
//! │                  ▼                                                      │
//! │  equipment / services subtotals ──► tax, discount ──► grand total       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating quote operation funnels through [`recalculate`]: the
//! cached totals are re-derived from the items, never patched
//! incrementally. Running it twice with no edits in between changes
//! nothing.
//!
//! ## Percentage Recovery
//! Percentage-priced BOS/installation items carry their rate in
//! `percentage_of_equipment_bps`. Rows imported from older data may
//! only have the rate embedded in display text ("... - 10% of
//! equipment"); those are parsed once and the field backfilled. An item
//! with neither source and no product link cannot be repriced, which is
//! a [`CoreError::Configuration`] rather than silently stale totals.

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percent};
use crate::pricing::derive_totals;
use crate::types::{ItemCategory, Quote, QuoteItem};

// =============================================================================
// Recalculation
// =============================================================================

/// Re-derives every cached value on the quote from its current items.
pub fn recalculate(quote: &mut Quote, items: &mut [QuoteItem]) -> CoreResult<()> {
    for item in items.iter_mut() {
        item.refresh_total();
    }

    // Equipment base: everything BOS percentages are applied to
    let equipment_base = items
        .iter()
        .filter(|i| i.category.is_equipment_base())
        .fold(Money::zero(), |acc, i| acc + i.total_price());

    reprice_percentage_items(items, ItemCategory::Bos, equipment_base)?;

    let bos_total = items
        .iter()
        .filter(|i| i.category == ItemCategory::Bos)
        .fold(Money::zero(), |acc, i| acc + i.total_price());

    reprice_percentage_items(items, ItemCategory::Installation, equipment_base + bos_total)?;

    let (equipment, services) = derive_totals(items);
    quote.equipment_subtotal_cents = equipment.cents();
    quote.services_subtotal_cents = services.cents();

    let subtotal = equipment + services;
    quote.tax_amount_cents = quote.tax_rate().of(subtotal).cents();
    quote.discount_amount_cents = quote.discount_rate().of(subtotal).cents();
    quote.grand_total_cents =
        subtotal.cents() + quote.tax_amount_cents - quote.discount_amount_cents;

    Ok(())
}

/// Reprices every percentage-derived item of `category` against `base`.
///
/// Product-linked items without a recorded percentage were priced by
/// some other rule (fixed, per-kW) and are left as they stand.
fn reprice_percentage_items(
    items: &mut [QuoteItem],
    category: ItemCategory,
    base: Money,
) -> CoreResult<()> {
    for item in items.iter_mut().filter(|i| i.category == category) {
        let bps = match recover_bps(item) {
            Some(bps) => bps,
            None if item.product_id.is_some() => continue,
            None => {
                return Err(CoreError::Configuration {
                    description: format!(
                        "cannot recover percentage for '{}' (category {:?})",
                        item.description, category
                    ),
                });
            }
        };

        // Backfill so the next pass skips the description parse
        item.percentage_of_equipment_bps = Some(bps);
        item.unit_price_cents = Percent::from_bps(bps).of(base).cents();
        item.refresh_total();
    }
    Ok(())
}

/// The percentage for an item: the authoritative field, else a legacy
/// description parse.
fn recover_bps(item: &QuoteItem) -> Option<u32> {
    item.percentage_of_equipment_bps
        .or_else(|| parse_percent_bps(&item.description))
}

/// Parses the first "NN%" / "NN.N%" occurrence out of display text.
/// Legacy-row support only; new rows always carry the field.
fn parse_percent_bps(text: &str) -> Option<u32> {
    let percent_pos = text.find('%')?;
    let head = &text[..percent_pos];

    let number_start = head
        .rfind(|c: char| !c.is_ascii_digit() && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0);
    let number = &head[number_start..];
    if number.is_empty() {
        return None;
    }

    let pct: f64 = number.parse().ok()?;
    if !(0.0..=100.0).contains(&pct) {
        return None;
    }
    Some((pct * 100.0).round() as u32)
}

// =============================================================================
// Unit Tests
// =============================================================================
