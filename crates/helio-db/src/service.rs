//! # Service Layer
//!
//! Orchestration between the database and the pure engines.
//!
//! ## Resolve, Compute, Persist
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SizingService::calculate_for_project                                   │
//! │                                                                         │
//! │  settings snapshot ─┐                                                   │
//! │  PSH lookup ────────┼──► helio-core sizing::calculate ──► save snapshot │
//! │  catalog sizes ─────┘                                                   │
//! │                                                                         │
//! │  QuoteService::generate_for_project                                     │
//! │                                                                         │
//! │  sizing snapshot ───┐                                                   │
//! │  catalog snapshot ──┼──► pricing::generate ──► recalculate ──► insert   │
//! │  pricing config ────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engines never touch the database; the services never do math.
//! Every mutating quote operation ends in one `recalculate` call before
//! anything is persisted.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::quote::generate_quote_number;
use helio_core::{
    pricing, recalc, sizing, validation, ItemCategory, PricingConfig, Quote, QuoteItem,
    QuoteStatus, ProjectStatus, SizingConfig, SizingInput, SizingResult,
};

// =============================================================================
// Sizing Service
// =============================================================================

/// Resolves settings and catalog context, then runs the sizing engine.
#[derive(Debug, Clone)]
pub struct SizingService {
    db: Database,
}

impl SizingService {
    /// Creates a new SizingService.
    pub fn new(db: Database) -> Self {
        SizingService { db }
    }

    /// Computes and persists the sizing snapshot for a project.
    ///
    /// Replaces any previous snapshot wholesale.
    pub async fn calculate_for_project(&self, input: &SizingInput) -> DbResult<SizingResult> {
        validation::validate_sizing_input(input).map_err(helio_core::CoreError::from)?;

        // Project must exist before we attach a snapshot to it
        self.db
            .projects()
            .get_by_id(&input.project_id)
            .await?
            .ok_or_else(|| DbError::not_found("Project", &input.project_id))?;

        let settings = self.db.settings().snapshot().await?;
        let config = SizingConfig::from_provider(&settings);

        let peak_sun_hours = match input.location.as_deref() {
            Some(location) => self.db.settings().peak_sun_hours(location).await?,
            None => None,
        };

        // Search space: catalog capacities merged with configured
        // standard sizes, ascending, distinct
        let mut sizes = self.db.products().inverter_sizes().await?;
        sizes.extend(config.inverter.standard_sizes_kw.iter().copied());
        sizes.sort_by(|a, b| a.total_cmp(b));
        sizes.dedup();

        let context = sizing::SizingContext {
            peak_sun_hours,
            inverter_sizes_kw: sizes,
        };

        let result = sizing::calculate(input, &config, &context)?;
        self.db.sizing_results().save(&result).await?;

        info!(
            project_id = %input.project_id,
            system_size_kw = result.system_size_kw,
            panels = result.number_of_panels,
            "Sizing snapshot saved"
        );
        Ok(result)
    }
}

// =============================================================================
// Quote Service
// =============================================================================

/// Generates, edits and recalculates quotes.
#[derive(Debug, Clone)]
pub struct QuoteService {
    db: Database,
}

impl QuoteService {
    /// Creates a new QuoteService.
    pub fn new(db: Database) -> Self {
        QuoteService { db }
    }

    /// Generates a draft quote from a project's sizing snapshot.
    pub async fn generate_for_project(
        &self,
        project_id: &str,
    ) -> DbResult<(Quote, Vec<QuoteItem>)> {
        let sizing = self
            .db
            .sizing_results()
            .get_for_project(project_id)
            .await?
            .ok_or_else(|| DbError::not_found("SizingResult for project", project_id))?;

        let settings = self.db.settings().snapshot().await?;
        let pricing_config = PricingConfig::from_provider(&settings);
        let sizing_config = SizingConfig::from_provider(&settings);

        let catalog = self.db.products().list_active().await?;

        let now = Utc::now();
        let mut quote = Quote {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            quote_number: generate_quote_number(),
            status: QuoteStatus::Draft,
            equipment_subtotal_cents: 0,
            services_subtotal_cents: 0,
            tax_rate_bps: pricing_config.default_tax_bps,
            tax_amount_cents: 0,
            discount_rate_bps: 0,
            discount_amount_cents: 0,
            grand_total_cents: 0,
            validity_days: pricing_config.validity_days,
            created_at: now,
            updated_at: now,
        };

        let mut items = pricing::generate(
            &sizing,
            &catalog,
            &quote.id,
            &pricing_config,
            &sizing_config.battery,
        )?;
        recalc::recalculate(&mut quote, &mut items)?;

        self.db.quotes().insert_with_items(&quote, &items).await?;

        // First quote moves the project forward in its lifecycle
        let project = self
            .db
            .projects()
            .get_by_id(project_id)
            .await?
            .ok_or_else(|| DbError::not_found("Project", project_id))?;
        if project.status == ProjectStatus::New {
            self.db
                .projects()
                .transition(project_id, ProjectStatus::Quoted, None)
                .await?;
        }

        info!(
            project_id = %project_id,
            quote_number = %quote.quote_number,
            grand_total_cents = quote.grand_total_cents,
            "Quote generated"
        );
        Ok((quote, items))
    }

    /// Recalculates and persists a quote's totals from its items.
    pub async fn recalculate(&self, quote_id: &str) -> DbResult<Quote> {
        let mut quote = self.load_quote(quote_id).await?;
        let mut items = self.db.quotes().items(quote_id).await?;

        recalc::recalculate(&mut quote, &mut items)?;
        self.db.quotes().save_recalculated(&quote, &items).await?;

        debug!(quote_id = %quote_id, grand_total_cents = quote.grand_total_cents, "Quote recalculated");
        Ok(quote)
    }

    /// Edits an item's quantity and unit price, then recalculates.
    pub async fn update_item(
        &self,
        item_id: &str,
        quantity: f64,
        unit_price_cents: i64,
    ) -> DbResult<Quote> {
        validation::validate_quantity(quantity).map_err(helio_core::CoreError::from)?;
        validation::validate_unit_price_cents(unit_price_cents)
            .map_err(helio_core::CoreError::from)?;

        let mut item = self
            .db
            .quotes()
            .get_item(item_id)
            .await?
            .ok_or_else(|| DbError::not_found("QuoteItem", item_id))?;

        item.quantity = quantity;
        item.unit_price_cents = unit_price_cents;
        item.refresh_total();
        self.db.quotes().update_item(&item).await?;

        self.recalculate(&item.quote_id).await
    }

    /// Changes a percentage-derived item's rate, then recalculates.
    pub async fn update_item_percentage(&self, item_id: &str, bps: u32) -> DbResult<Quote> {
        validation::validate_percent_bps(bps).map_err(helio_core::CoreError::from)?;

        let mut item = self
            .db
            .quotes()
            .get_item(item_id)
            .await?
            .ok_or_else(|| DbError::not_found("QuoteItem", item_id))?;

        item.percentage_of_equipment_bps = Some(bps);
        self.db.quotes().update_item(&item).await?;

        self.recalculate(&item.quote_id).await
    }

    /// Deletes an item, then recalculates.
    pub async fn delete_item(&self, item_id: &str) -> DbResult<Quote> {
        let item = self
            .db
            .quotes()
            .get_item(item_id)
            .await?
            .ok_or_else(|| DbError::not_found("QuoteItem", item_id))?;

        self.db.quotes().delete_item(item_id).await?;
        self.recalculate(&item.quote_id).await
    }

    /// Appends a manually-priced line, then recalculates.
    pub async fn add_custom_item(
        &self,
        quote_id: &str,
        category: ItemCategory,
        description: &str,
        quantity: f64,
        unit_price_cents: i64,
    ) -> DbResult<Quote> {
        validation::validate_quantity(quantity).map_err(helio_core::CoreError::from)?;
        validation::validate_unit_price_cents(unit_price_cents)
            .map_err(helio_core::CoreError::from)?;

        let existing = self.db.quotes().items(quote_id).await?;
        let sort_order = existing.iter().map(|i| i.sort_order + 1).max().unwrap_or(0);

        let mut item = QuoteItem {
            id: Uuid::new_v4().to_string(),
            quote_id: quote_id.to_string(),
            product_id: None,
            category,
            description: description.to_string(),
            quantity,
            unit_price_cents,
            total_price_cents: 0,
            percentage_of_equipment_bps: None,
            is_custom: true,
            sort_order,
            created_at: Utc::now(),
        };
        item.refresh_total();

        self.db.quotes().insert_item(&item).await?;
        self.recalculate(quote_id).await
    }

    /// Sets the quote's tax and discount rates, then recalculates.
    pub async fn set_rates(
        &self,
        quote_id: &str,
        tax_rate_bps: u32,
        discount_rate_bps: u32,
    ) -> DbResult<Quote> {
        validation::validate_percent_bps(tax_rate_bps).map_err(helio_core::CoreError::from)?;
        validation::validate_percent_bps(discount_rate_bps)
            .map_err(helio_core::CoreError::from)?;

        let mut quote = self.load_quote(quote_id).await?;
        quote.tax_rate_bps = tax_rate_bps;
        quote.discount_rate_bps = discount_rate_bps;

        let mut items = self.db.quotes().items(quote_id).await?;
        recalc::recalculate(&mut quote, &mut items)?;
        self.db.quotes().save_recalculated(&quote, &items).await?;

        Ok(quote)
    }

    /// Marks a draft quote as sent to the customer.
    pub async fn mark_sent(&self, quote_id: &str) -> DbResult<()> {
        let quote = self.load_quote(quote_id).await?;
        if quote.status != QuoteStatus::Draft {
            return Err(DbError::conflict(format!(
                "quote {} cannot be sent from {:?}",
                quote_id, quote.status
            )));
        }
        self.db.quotes().set_status(quote_id, QuoteStatus::Sent).await
    }

    async fn load_quote(&self, quote_id: &str) -> DbResult<Quote> {
        self.db
            .quotes()
            .get_by_id(quote_id)
            .await?
            .ok_or_else(|| DbError::not_found("Quote", quote_id))
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use helio_core::{PriceType, Product, ProductType, SystemType};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn catalog_product(
        product_type: ProductType,
        brand: Option<&str>,
        wattage: Option<i64>,
        capacity_kw: Option<f64>,
        capacity_kwh: Option<f64>,
        price_type: PriceType,
        base_price_cents: i64,
    ) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            product_type,
            brand: brand.map(str::to_string),
            model: None,
            name: None,
            sku: Some(format!("SKU-{}", Uuid::new_v4().simple())),
            wattage,
            capacity_kw,
            capacity_kwh,
            price_type,
            base_price_cents,
            is_active: true,
            manage_stock: matches!(
                product_type,
                ProductType::Panel | ProductType::Inverter | ProductType::Battery
            ),
            stock_quantity: 100,
            in_stock: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Panels, inverters and a battery; BOS, transport and installation
    /// come from config fallbacks.
    async fn seed_catalog(db: &Database) {
        let products = vec![
            catalog_product(
                ProductType::Panel,
                Some("Jinko"),
                Some(580),
                None,
                None,
                PriceType::PerPanel,
                109_900,
            ),
            catalog_product(
                ProductType::Inverter,
                Some("Deye"),
                None,
                Some(10.0),
                None,
                PriceType::Fixed,
                1_500_000,
            ),
            catalog_product(
                ProductType::Inverter,
                Some("Deye"),
                None,
                Some(15.0),
                None,
                PriceType::Fixed,
                2_100_000,
            ),
            catalog_product(
                ProductType::Battery,
                Some("Dyness"),
                None,
                None,
                Some(16.0),
                PriceType::Fixed,
                2_900_000,
            ),
            catalog_product(
                ProductType::Mounting,
                None,
                None,
                None,
                None,
                PriceType::PerKw,
                20_000,
            ),
        ];
        for product in &products {
            db.products().insert(product).await.unwrap();
        }
    }

    fn sizing_input(project_id: &str) -> SizingInput {
        SizingInput {
            project_id: project_id.to_string(),
            total_daily_kwh: 30.0,
            location: None,
            panel_brand: Some("Jinko".to_string()),
            backup_hours: None,
            essential_load_percent: None,
            system_type: SystemType::Hybrid,
        }
    }

    #[tokio::test]
    async fn test_sizing_to_quote_flow() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let project = db
            .projects()
            .create("Flow Test", SystemType::Hybrid)
            .await
            .unwrap();

        let sizing = db
            .sizing_service()
            .calculate_for_project(&sizing_input(&project.id))
            .await
            .unwrap();
        assert!(sizing.number_of_panels > 0);
        assert!(sizing.battery_capacity_kwh.is_some());

        let (quote, items) = db
            .quote_service()
            .generate_for_project(&project.id)
            .await
            .unwrap();

        // Mandatory categories priced from the catalog, services from
        // config fallbacks
        let categories: Vec<ItemCategory> = items.iter().map(|i| i.category).collect();
        assert!(categories.contains(&ItemCategory::Panel));
        assert!(categories.contains(&ItemCategory::Inverter));
        assert!(categories.contains(&ItemCategory::Battery));
        assert!(categories.contains(&ItemCategory::Bos));
        assert!(categories.contains(&ItemCategory::Transport));
        assert!(categories.contains(&ItemCategory::Installation));

        assert!(quote.totals_consistent());
        assert!(quote.grand_total_cents > 0);

        // Persisted state matches what was returned
        let stored = db.quotes().get_by_id(&quote.id).await.unwrap().unwrap();
        assert_eq!(stored.grand_total_cents, quote.grand_total_cents);
        let stored_items = db.quotes().items(&quote.id).await.unwrap();
        assert_eq!(stored_items.len(), items.len());

        // First quote advances the project
        let project = db.projects().get_by_id(&project.id).await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Quoted);
    }

    #[tokio::test]
    async fn test_generate_without_sizing_is_not_found() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let project = db
            .projects()
            .create("No Sizing", SystemType::GridTied)
            .await
            .unwrap();

        let err = db
            .quote_service()
            .generate_for_project(&project.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_item_edit_cascades_through_recalculation() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let project = db
            .projects()
            .create("Edit Test", SystemType::Hybrid)
            .await
            .unwrap();
        db.sizing_service()
            .calculate_for_project(&sizing_input(&project.id))
            .await
            .unwrap();
        let (quote, items) = db
            .quote_service()
            .generate_for_project(&project.id)
            .await
            .unwrap();

        let panel_item = items
            .iter()
            .find(|i| i.category == ItemCategory::Panel)
            .unwrap();
        let before = quote.grand_total_cents;

        // Discounting the panels must shrink BOS, installation and the
        // grand total
        let updated = db
            .quote_service()
            .update_item(&panel_item.id, panel_item.quantity, 99_900)
            .await
            .unwrap();

        assert!(updated.grand_total_cents < before);
        assert!(updated.totals_consistent());

        let stored_items = db.quotes().items(&quote.id).await.unwrap();
        let bos = stored_items
            .iter()
            .find(|i| i.category == ItemCategory::Bos)
            .unwrap();
        let base: i64 = stored_items
            .iter()
            .filter(|i| i.category.is_equipment_base())
            .map(|i| i.total_price_cents)
            .sum();
        assert_eq!(
            bos.total_price_cents,
            ((base as i128 * 1000 + 5000) / 10_000) as i64
        );
    }

    #[tokio::test]
    async fn test_custom_item_and_rates() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let project = db
            .projects()
            .create("Rates Test", SystemType::Hybrid)
            .await
            .unwrap();
        db.sizing_service()
            .calculate_for_project(&sizing_input(&project.id))
            .await
            .unwrap();
        let (quote, items) = db
            .quote_service()
            .generate_for_project(&project.id)
            .await
            .unwrap();

        let with_custom = db
            .quote_service()
            .add_custom_item(&quote.id, ItemCategory::Other, "Site survey", 1.0, 50_000)
            .await
            .unwrap();
        assert!(with_custom.totals_consistent());

        let stored_items = db.quotes().items(&quote.id).await.unwrap();
        assert_eq!(stored_items.len(), items.len() + 1);
        let custom = stored_items.last().unwrap();
        assert!(custom.is_custom);
        assert_eq!(custom.sort_order, items.last().unwrap().sort_order + 1);

        // 15% VAT, 5% discount
        let with_rates = db
            .quote_service()
            .set_rates(&quote.id, 1500, 500)
            .await
            .unwrap();
        assert!(with_rates.tax_amount_cents > 0);
        assert!(with_rates.discount_amount_cents > 0);
        assert!(with_rates.totals_consistent());
    }

    #[tokio::test]
    async fn test_mark_sent_only_from_draft() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let project = db
            .projects()
            .create("Send Test", SystemType::Hybrid)
            .await
            .unwrap();
        db.sizing_service()
            .calculate_for_project(&sizing_input(&project.id))
            .await
            .unwrap();
        let (quote, _) = db
            .quote_service()
            .generate_for_project(&project.id)
            .await
            .unwrap();

        db.quote_service().mark_sent(&quote.id).await.unwrap();
        let stored = db.quotes().get_by_id(&quote.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QuoteStatus::Sent);

        let err = db.quote_service().mark_sent(&quote.id).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }
}
