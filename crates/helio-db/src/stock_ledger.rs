//! # Stock Ledger
//!
//! The append-only stock movement ledger and the project acceptance
//! state machine built on top of it.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_movements: INSERT only. Never UPDATE, never DELETE.              │
//! │                                                                         │
//! │  accept  ──► one DeductionOnAccept row per quote item   (negative)      │
//! │  reject  ──► one RestoreOnReject row per original       (positive)      │
//! │  order   ──► one DeductionEcomOrder row per order item  (negative)      │
//! │                                                                         │
//! │  products.stock_quantity is a materialized cache:                       │
//! │     opening balance + Σ movements  ==  stock_quantity   (always)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Every method runs as one SQLite transaction. SQLite's single writer
//! serializes check-then-deduct sequences; the conditional decrement
//! (`WHERE stock_quantity >= required`) is the row-level guard that
//! turns a lost race into a clean rollback instead of oversold stock.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::project::{apply_transition, fetch_for_update};
use helio_core::{
    ProjectStatus, Quote, QuoteStatus, StockMovement, StockMovementType, StockShortage,
};

/// The stock ledger: availability checks, acceptance, rejection, and
/// e-commerce deductions.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

/// One stock-tracked quote line with its product's current stock.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RequirementRow {
    quote_item_id: String,
    product_id: String,
    product_name: String,
    quantity: f64,
    stock_quantity: i64,
}

impl RequirementRow {
    /// Whole units this line reserves: `max(1, ceil(qty))`.
    fn required_units(&self) -> i64 {
        (self.quantity.ceil() as i64).max(1)
    }
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Reports stock coverage for a project's authoritative quote.
    ///
    /// Returns `(fully_available, report)` where the report holds one
    /// row per stock-tracked product, short or not, so the caller sees
    /// the whole picture rather than the first failure.
    pub async fn check_availability(
        &self,
        project_id: &str,
    ) -> DbResult<(bool, Vec<StockShortage>)> {
        let mut tx = self.pool.begin().await?;

        let quote = authoritative_quote(&mut tx, project_id).await?;
        let rows = load_requirements(&mut tx, &quote.id).await?;
        let report = shortage_report(&rows);

        // Read-only; nothing to commit
        let available = report.iter().all(|s| !s.is_short());
        Ok((available, report))
    }

    // =========================================================================
    // Accept
    // =========================================================================

    /// Transitions a project into Accepted, reserving stock.
    ///
    /// Check-all-before-deduct-any: on any shortfall the transaction
    /// rolls back untouched and the error carries the complete report.
    pub async fn accept_project(&self, project_id: &str, actor: Option<&str>) -> DbResult<Quote> {
        let mut tx = self.pool.begin().await?;

        let mut project = fetch_for_update(&mut tx, project_id).await?;
        if !project.status.can_transition_to(ProjectStatus::Accepted) {
            return Err(DbError::conflict(format!(
                "project {} cannot be accepted from {:?}",
                project_id, project.status
            )));
        }

        let mut quote = authoritative_quote(&mut tx, project_id).await?;
        let rows = load_requirements(&mut tx, &quote.id).await?;

        let report = shortage_report(&rows);
        if report.iter().any(|s| s.is_short()) {
            warn!(
                project_id = %project_id,
                short = report.iter().filter(|s| s.is_short()).count(),
                "Acceptance blocked by stock shortage"
            );
            // Dropping the transaction rolls everything back
            return Err(DbError::InsufficientStock(report));
        }

        let now = Utc::now();
        for row in &rows {
            let required = row.required_units();

            // Conditional decrement: a concurrent writer that drained
            // this row between our check and here affects zero rows.
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    stock_quantity = stock_quantity - ?2,
                    in_stock = CASE WHEN stock_quantity - ?2 > 0 THEN 1 ELSE 0 END,
                    updated_at = ?3
                WHERE id = ?1 AND stock_quantity >= ?2
                "#,
            )
            .bind(&row.product_id)
            .bind(required)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::conflict(format!(
                    "stock for product {} changed during acceptance",
                    row.product_id
                )));
            }

            append_movement(
                &mut tx,
                &row.product_id,
                -required,
                StockMovementType::DeductionOnAccept,
                MovementContext {
                    project_id: Some(project_id),
                    quote_id: Some(&quote.id),
                    quote_item_id: Some(&row.quote_item_id),
                    order_id: None,
                    created_by: actor,
                },
            )
            .await?;
        }

        sqlx::query("UPDATE quotes SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&quote.id)
            .bind(QuoteStatus::Accepted)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        apply_transition(&mut tx, &mut project, ProjectStatus::Accepted, actor).await?;
        quote.status = QuoteStatus::Accepted;

        tx.commit().await?;
        info!(
            project_id = %project_id,
            quote_id = %quote.id,
            items = rows.len(),
            "Project accepted, stock reserved"
        );
        Ok(quote)
    }

    // =========================================================================
    // Reject
    // =========================================================================

    /// Transitions an Accepted project into Rejected, restoring every
    /// deduction via compensating ledger rows. The original movement
    /// rows are never touched.
    pub async fn reject_project(&self, project_id: &str, actor: Option<&str>) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let mut project = fetch_for_update(&mut tx, project_id).await?;
        if !project.status.can_transition_to(ProjectStatus::Rejected) {
            return Err(DbError::conflict(format!(
                "project {} cannot be rejected from {:?}",
                project_id, project.status
            )));
        }

        let deductions = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE project_id = ?1 AND movement_type = 'deduction_on_accept'
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        for movement in &deductions {
            let restore = -movement.quantity; // deductions are negative

            sqlx::query(
                r#"
                UPDATE products SET
                    stock_quantity = stock_quantity + ?2,
                    in_stock = 1,
                    updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&movement.product_id)
            .bind(restore)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            append_movement(
                &mut tx,
                &movement.product_id,
                restore,
                StockMovementType::RestoreOnReject,
                MovementContext {
                    project_id: Some(project_id),
                    quote_id: movement.quote_id.as_deref(),
                    quote_item_id: movement.quote_item_id.as_deref(),
                    order_id: None,
                    created_by: actor,
                },
            )
            .await?;
        }

        apply_transition(&mut tx, &mut project, ProjectStatus::Rejected, actor).await?;

        tx.commit().await?;
        info!(
            project_id = %project_id,
            restored = deductions.len(),
            "Project rejected, stock restored"
        );
        Ok(())
    }

    // =========================================================================
    // E-commerce Orders
    // =========================================================================

    /// Deducts stock for a payment-confirmed order.
    ///
    /// ## At-Least-Once Delivery
    /// Payment webhooks redeliver; the existing-movement check makes
    /// replays no-ops. There is no availability gate: the sale already
    /// happened, so the cache may go negative (and still equals the
    /// movement sum).
    pub async fn deduct_for_paid_order(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let already: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM stock_movements
            WHERE order_id = ?1 AND movement_type = 'deduction_ecom_order'
            "#,
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if already > 0 {
            debug!(order_id = %order_id, "Order already deducted, skipping");
            return Ok(());
        }

        #[derive(sqlx::FromRow)]
        struct OrderLine {
            product_id: String,
            quantity: f64,
        }

        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT oi.product_id, oi.quantity
            FROM order_items oi
            INNER JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ?1 AND p.manage_stock = 1
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        for line in &lines {
            let units = (line.quantity.ceil() as i64).max(1);

            sqlx::query(
                r#"
                UPDATE products SET
                    stock_quantity = stock_quantity - ?2,
                    in_stock = CASE WHEN stock_quantity - ?2 > 0 THEN 1 ELSE 0 END,
                    updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&line.product_id)
            .bind(units)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            append_movement(
                &mut tx,
                &line.product_id,
                -units,
                StockMovementType::DeductionEcomOrder,
                MovementContext {
                    project_id: None,
                    quote_id: None,
                    quote_item_id: None,
                    order_id: Some(order_id),
                    created_by: None,
                },
            )
            .await?;
        }

        tx.commit().await?;
        info!(order_id = %order_id, items = lines.len(), "Order stock deducted");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All movements for a project, oldest first.
    pub async fn movements_for_project(&self, project_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE project_id = ?1 ORDER BY created_at, id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// All movements for a product, oldest first.
    pub async fn movements_for_product(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE product_id = ?1 ORDER BY created_at, id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Resolves the quote that governs stock for a project: Accepted wins,
/// else the latest Sent.
async fn authoritative_quote(
    tx: &mut Transaction<'_, Sqlite>,
    project_id: &str,
) -> DbResult<Quote> {
    sqlx::query_as::<_, Quote>(
        r#"
        SELECT * FROM quotes
        WHERE project_id = ?1 AND status IN ('accepted', 'sent')
        ORDER BY CASE status WHEN 'accepted' THEN 0 ELSE 1 END, created_at DESC
        LIMIT 1
        "#,
    )
    .bind(project_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| DbError::not_found("Quote for project", project_id))
}

/// Loads the stock-tracked lines of a quote with current stock levels.
async fn load_requirements(
    tx: &mut Transaction<'_, Sqlite>,
    quote_id: &str,
) -> DbResult<Vec<RequirementRow>> {
    let rows = sqlx::query_as::<_, RequirementRow>(
        r#"
        SELECT
            qi.id AS quote_item_id,
            p.id AS product_id,
            COALESCE(p.name, p.model, p.brand, 'Product') AS product_name,
            qi.quantity,
            p.stock_quantity
        FROM quote_items qi
        INNER JOIN products p ON p.id = qi.product_id
        WHERE qi.quote_id = ?1 AND p.manage_stock = 1
        ORDER BY qi.sort_order
        "#,
    )
    .bind(quote_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

/// One report row per product, requirements summed across lines.
fn shortage_report(rows: &[RequirementRow]) -> Vec<StockShortage> {
    let mut report: Vec<StockShortage> = Vec::new();
    for row in rows {
        match report.iter_mut().find(|s| s.product_id == row.product_id) {
            Some(existing) => existing.required += row.required_units(),
            None => report.push(StockShortage {
                product_id: row.product_id.clone(),
                product_name: row.product_name.clone(),
                required: row.required_units(),
                available: row.stock_quantity,
            }),
        }
    }
    report
}

struct MovementContext<'a> {
    project_id: Option<&'a str>,
    quote_id: Option<&'a str>,
    quote_item_id: Option<&'a str>,
    order_id: Option<&'a str>,
    created_by: Option<&'a str>,
}

/// Appends one ledger row inside the caller's transaction.
async fn append_movement(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    quantity: i64,
    movement_type: StockMovementType,
    context: MovementContext<'_>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, quantity, movement_type,
            project_id, quote_id, quote_item_id, order_id,
            created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(quantity)
    .bind(movement_type)
    .bind(context.project_id)
    .bind(context.quote_id)
    .bind(context.quote_item_id)
    .bind(context.order_id)
    .bind(context.created_by)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::order::generate_order_number;
    use helio_core::{
        ItemCategory, Order, OrderItem, PriceType, Product, ProductType, QuoteItem, SystemType,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn stocked_product(name: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            product_type: ProductType::Panel,
            brand: None,
            model: None,
            name: Some(name.to_string()),
            sku: Some(format!("SKU-{}", Uuid::new_v4().simple())),
            wattage: None,
            capacity_kw: None,
            capacity_kwh: None,
            price_type: PriceType::Fixed,
            base_price_cents: 100_000,
            is_active: true,
            manage_stock: true,
            stock_quantity: stock,
            in_stock: stock > 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(quote_id: &str, product_id: &str, quantity: f64, sort_order: i64) -> QuoteItem {
        QuoteItem {
            id: Uuid::new_v4().to_string(),
            quote_id: quote_id.to_string(),
            product_id: Some(product_id.to_string()),
            category: ItemCategory::Panel,
            description: "line".to_string(),
            quantity,
            unit_price_cents: 100_000,
            total_price_cents: QuoteItem::compute_total_cents(quantity, 100_000),
            percentage_of_equipment_bps: None,
            is_custom: false,
            sort_order,
            created_at: Utc::now(),
        }
    }

    /// Creates a project with one Sent quote over the given
    /// (product_id, quantity) lines. Returns (project_id, quote_id).
    async fn project_with_sent_quote(
        db: &Database,
        lines: &[(&str, f64)],
    ) -> (String, String) {
        let project = db
            .projects()
            .create("Test Project", SystemType::Hybrid)
            .await
            .unwrap();

        let now = Utc::now();
        let quote = Quote {
            id: Uuid::new_v4().to_string(),
            project_id: project.id.clone(),
            quote_number: format!("Q-{}", Uuid::new_v4().simple()),
            status: QuoteStatus::Sent,
            equipment_subtotal_cents: 0,
            services_subtotal_cents: 0,
            tax_rate_bps: 0,
            tax_amount_cents: 0,
            discount_rate_bps: 0,
            discount_amount_cents: 0,
            grand_total_cents: 0,
            validity_days: 30,
            created_at: now,
            updated_at: now,
        };

        let items: Vec<QuoteItem> = lines
            .iter()
            .enumerate()
            .map(|(i, (pid, qty))| line(&quote.id, pid, *qty, i as i64))
            .collect();

        db.quotes().insert_with_items(&quote, &items).await.unwrap();
        (project.id, quote.id)
    }

    async fn stock_of(db: &Database, product_id: &str) -> i64 {
        db.products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    #[tokio::test]
    async fn test_accept_reserves_stock_and_writes_ledger() {
        let db = test_db().await;
        let panel = stocked_product("Panel", 10);
        db.products().insert(&panel).await.unwrap();

        let (project_id, quote_id) =
            project_with_sent_quote(&db, &[(&panel.id, 4.0)]).await;

        let quote = db
            .stock_ledger()
            .accept_project(&project_id, Some("ops"))
            .await
            .unwrap();

        assert_eq!(quote.id, quote_id);
        assert_eq!(quote.status, QuoteStatus::Accepted);
        assert_eq!(stock_of(&db, &panel.id).await, 6);

        let project = db.projects().get_by_id(&project_id).await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Accepted);

        let movements = db.stock_ledger().movements_for_project(&project_id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, -4);
        assert_eq!(movements[0].movement_type, StockMovementType::DeductionOnAccept);
        assert_eq!(movements[0].created_by.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn test_shortage_blocks_acceptance_and_reports_every_row() {
        let db = test_db().await;
        let panel = stocked_product("Panel", 20);
        let inverter = stocked_product("Inverter", 1);
        db.products().insert(&panel).await.unwrap();
        db.products().insert(&inverter).await.unwrap();

        let (project_id, _) =
            project_with_sent_quote(&db, &[(&panel.id, 16.0), (&inverter.id, 2.0)]).await;

        let err = db
            .stock_ledger()
            .accept_project(&project_id, None)
            .await
            .unwrap_err();

        match err {
            DbError::InsufficientStock(report) => {
                // Every stock-tracked row reported, not just the short one
                assert_eq!(report.len(), 2);
                let short: Vec<_> = report.iter().filter(|s| s.is_short()).collect();
                assert_eq!(short.len(), 1);
                assert_eq!(short[0].product_id, inverter.id);
                assert_eq!(short[0].required, 2);
                assert_eq!(short[0].available, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Nothing was mutated
        assert_eq!(stock_of(&db, &panel.id).await, 20);
        assert_eq!(stock_of(&db, &inverter.id).await, 1);
        let project = db.projects().get_by_id(&project_id).await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::New);
        assert!(db
            .stock_ledger()
            .movements_for_project(&project_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_reject_restores_stock_with_compensating_rows() {
        let db = test_db().await;
        let panel = stocked_product("Panel", 10);
        let battery = stocked_product("Battery", 5);
        db.products().insert(&panel).await.unwrap();
        db.products().insert(&battery).await.unwrap();

        let (project_id, _) =
            project_with_sent_quote(&db, &[(&panel.id, 8.0), (&battery.id, 2.0)]).await;

        db.stock_ledger().accept_project(&project_id, None).await.unwrap();
        assert_eq!(stock_of(&db, &panel.id).await, 2);

        db.stock_ledger().reject_project(&project_id, None).await.unwrap();

        // Stock is back to the pre-accept level
        assert_eq!(stock_of(&db, &panel.id).await, 10);
        assert_eq!(stock_of(&db, &battery.id).await, 5);

        let project = db.projects().get_by_id(&project_id).await.unwrap().unwrap();
        assert_eq!(project.status, ProjectStatus::Rejected);

        // Originals untouched; each deduction got a compensating row
        let movements = db.stock_ledger().movements_for_project(&project_id).await.unwrap();
        assert_eq!(movements.len(), 4);
        let deductions = movements
            .iter()
            .filter(|m| m.movement_type == StockMovementType::DeductionOnAccept)
            .count();
        let restores = movements
            .iter()
            .filter(|m| m.movement_type == StockMovementType::RestoreOnReject)
            .count();
        assert_eq!(deductions, 2);
        assert_eq!(restores, 2);
        assert_eq!(movements.iter().map(|m| m.quantity).sum::<i64>(), 0);
    }

    #[tokio::test]
    async fn test_fractional_quantities_reserve_whole_units() {
        let db = test_db().await;
        let cable = stocked_product("Cable Roll", 10);
        db.products().insert(&cable).await.unwrap();

        let (project_id, _) = project_with_sent_quote(&db, &[(&cable.id, 2.5)]).await;
        db.stock_ledger().accept_project(&project_id, None).await.unwrap();

        assert_eq!(stock_of(&db, &cable.id).await, 7);
    }

    #[tokio::test]
    async fn test_check_availability_reports_without_mutating() {
        let db = test_db().await;
        let panel = stocked_product("Panel", 3);
        db.products().insert(&panel).await.unwrap();

        let (project_id, _) = project_with_sent_quote(&db, &[(&panel.id, 5.0)]).await;

        let (available, report) =
            db.stock_ledger().check_availability(&project_id).await.unwrap();
        assert!(!available);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].required, 5);
        assert_eq!(report[0].available, 3);
        assert_eq!(stock_of(&db, &panel.id).await, 3);
    }

    #[tokio::test]
    async fn test_accept_from_rejected_is_conflict() {
        let db = test_db().await;
        let panel = stocked_product("Panel", 10);
        db.products().insert(&panel).await.unwrap();

        let (project_id, _) = project_with_sent_quote(&db, &[(&panel.id, 1.0)]).await;
        db.stock_ledger().accept_project(&project_id, None).await.unwrap();
        db.stock_ledger().reject_project(&project_id, None).await.unwrap();

        let err = db
            .stock_ledger()
            .accept_project(&project_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_order_deduction_is_idempotent_and_may_go_negative() {
        let db = test_db().await;
        let battery = stocked_product("Battery", 1);
        db.products().insert(&battery).await.unwrap();

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number: generate_order_number(),
            payment_status: "paid".to_string(),
            created_at: now,
        };
        let items = vec![OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            product_id: Some(battery.id.clone()),
            quantity: 3.0,
        }];
        db.orders().insert_with_items(&order, &items).await.unwrap();

        db.stock_ledger().deduct_for_paid_order(&order.id).await.unwrap();
        // Webhook replay is a no-op
        db.stock_ledger().deduct_for_paid_order(&order.id).await.unwrap();

        // The sale already happened; the cache goes negative and still
        // matches the movement sum
        assert_eq!(stock_of(&db, &battery.id).await, -2);
        let movements = db
            .stock_ledger()
            .movements_for_product(&battery.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, -3);
        assert_eq!(movements[0].movement_type, StockMovementType::DeductionEcomOrder);

        let product = db.products().get_by_id(&battery.id).await.unwrap().unwrap();
        assert!(!product.in_stock);
    }
}
