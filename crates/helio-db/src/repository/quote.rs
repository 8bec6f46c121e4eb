//! # Quote Repository
//!
//! Database operations for quotes and their line items.
//!
//! ## Write Discipline
//! A quote and its items form one aggregate: inserts and total updates
//! happen in a single transaction so a reader never sees a quote whose
//! cached totals disagree with its items. Recalculation itself lives in
//! helio-core; this repository only persists its output.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use helio_core::{Quote, QuoteItem, QuoteStatus};

/// Repository for quote database operations.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    pool: SqlitePool,
}

impl QuoteRepository {
    /// Creates a new QuoteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuoteRepository { pool }
    }

    /// Gets a quote by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quote)
    }

    /// Lists a project's quotes, newest first.
    pub async fn list_for_project(&self, project_id: &str) -> DbResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(
            "SELECT * FROM quotes WHERE project_id = ?1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotes)
    }

    /// The quote that governs stock for a project: an Accepted quote if
    /// one exists, else the latest Sent quote.
    pub async fn authoritative_for_project(&self, project_id: &str) -> DbResult<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            SELECT * FROM quotes
            WHERE project_id = ?1 AND status IN ('accepted', 'sent')
            ORDER BY CASE status WHEN 'accepted' THEN 0 ELSE 1 END, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quote)
    }

    /// Gets a quote's items in display order.
    pub async fn items(&self, quote_id: &str) -> DbResult<Vec<QuoteItem>> {
        let items = sqlx::query_as::<_, QuoteItem>(
            "SELECT * FROM quote_items WHERE quote_id = ?1 ORDER BY sort_order",
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets one quote item.
    pub async fn get_item(&self, item_id: &str) -> DbResult<Option<QuoteItem>> {
        let item = sqlx::query_as::<_, QuoteItem>("SELECT * FROM quote_items WHERE id = ?1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Inserts a quote and all its items atomically.
    pub async fn insert_with_items(&self, quote: &Quote, items: &[QuoteItem]) -> DbResult<()> {
        debug!(id = %quote.id, quote_number = %quote.quote_number, items = items.len(), "Inserting quote");

        let mut tx = self.pool.begin().await?;

        insert_quote(&mut tx, quote).await?;
        for item in items {
            insert_item(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Persists recalculated totals and item prices atomically.
    ///
    /// Items not present in `items` are untouched; deletion is a
    /// separate operation.
    pub async fn save_recalculated(&self, quote: &Quote, items: &[QuoteItem]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        update_totals(&mut tx, quote).await?;
        for item in items {
            update_item_prices(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Inserts a single (custom) item.
    pub async fn insert_item(&self, item: &QuoteItem) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_item(&mut tx, item).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Updates an item's quantity and unit price.
    pub async fn update_item(&self, item: &QuoteItem) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE quote_items SET
                description = ?2,
                quantity = ?3,
                unit_price_cents = ?4,
                total_price_cents = ?5,
                percentage_of_equipment_bps = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_price_cents)
        .bind(item.percentage_of_equipment_bps)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("QuoteItem", &item.id));
        }

        Ok(())
    }

    /// Deletes an item.
    pub async fn delete_item(&self, item_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM quote_items WHERE id = ?1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("QuoteItem", item_id));
        }

        Ok(())
    }

    /// Updates a quote's status.
    pub async fn set_status(&self, id: &str, status: QuoteStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE quotes SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quote", id));
        }

        Ok(())
    }
}

// =============================================================================
// Transaction Helpers (shared with the stock ledger)
// =============================================================================

pub(crate) async fn insert_quote(tx: &mut Transaction<'_, Sqlite>, quote: &Quote) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO quotes (
            id, project_id, quote_number, status,
            equipment_subtotal_cents, services_subtotal_cents,
            tax_rate_bps, tax_amount_cents,
            discount_rate_bps, discount_amount_cents,
            grand_total_cents, validity_days,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6,
            ?7, ?8,
            ?9, ?10,
            ?11, ?12,
            ?13, ?14
        )
        "#,
    )
    .bind(&quote.id)
    .bind(&quote.project_id)
    .bind(&quote.quote_number)
    .bind(quote.status)
    .bind(quote.equipment_subtotal_cents)
    .bind(quote.services_subtotal_cents)
    .bind(quote.tax_rate_bps)
    .bind(quote.tax_amount_cents)
    .bind(quote.discount_rate_bps)
    .bind(quote.discount_amount_cents)
    .bind(quote.grand_total_cents)
    .bind(quote.validity_days)
    .bind(quote.created_at)
    .bind(quote.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_item(tx: &mut Transaction<'_, Sqlite>, item: &QuoteItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO quote_items (
            id, quote_id, product_id, category, description,
            quantity, unit_price_cents, total_price_cents,
            percentage_of_equipment_bps, is_custom, sort_order, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8,
            ?9, ?10, ?11, ?12
        )
        "#,
    )
    .bind(&item.id)
    .bind(&item.quote_id)
    .bind(&item.product_id)
    .bind(item.category)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.total_price_cents)
    .bind(item.percentage_of_equipment_bps)
    .bind(item.is_custom)
    .bind(item.sort_order)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn update_totals(tx: &mut Transaction<'_, Sqlite>, quote: &Quote) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE quotes SET
            equipment_subtotal_cents = ?2,
            services_subtotal_cents = ?3,
            tax_rate_bps = ?4,
            tax_amount_cents = ?5,
            discount_rate_bps = ?6,
            discount_amount_cents = ?7,
            grand_total_cents = ?8,
            updated_at = ?9
        WHERE id = ?1
        "#,
    )
    .bind(&quote.id)
    .bind(quote.equipment_subtotal_cents)
    .bind(quote.services_subtotal_cents)
    .bind(quote.tax_rate_bps)
    .bind(quote.tax_amount_cents)
    .bind(quote.discount_rate_bps)
    .bind(quote.discount_amount_cents)
    .bind(quote.grand_total_cents)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Quote", &quote.id));
    }

    Ok(())
}

async fn update_item_prices(tx: &mut Transaction<'_, Sqlite>, item: &QuoteItem) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE quote_items SET
            quantity = ?2,
            unit_price_cents = ?3,
            total_price_cents = ?4,
            percentage_of_equipment_bps = ?5
        WHERE id = ?1
        "#,
    )
    .bind(&item.id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.total_price_cents)
    .bind(item.percentage_of_equipment_bps)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Generates a human-facing quote number ("Q-YYYYMMDD-XXXX").
pub fn generate_quote_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = &Uuid::new_v4().simple().to_string()[..4];
    format!("Q-{date}-{}", suffix.to_uppercase())
}
