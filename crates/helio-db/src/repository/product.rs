//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Catalog Queries the Engines Depend On
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sizing engine  ◄── inverter_sizes()      distinct kW, ascending        │
//! │  pricing engine ◄── list_active()         full active snapshot          │
//! │  stock ledger   ◄── conditional decrement, movement-sum recompute       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pricing engine works on an in-memory snapshot of active
//! products; matching priority lives in helio-core, not in SQL.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use helio_core::{Product, ProductType};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists every active product, the pricing engine's catalog
    /// snapshot. Ordered by type then capacity so matching scans are
    /// deterministic.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1
            ORDER BY product_type, capacity_kw, capacity_kwh, wattage
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products of one type.
    pub async fn list_by_type(&self, product_type: ProductType) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1 AND product_type = ?1
            ORDER BY capacity_kw, capacity_kwh, wattage
            "#,
        )
        .bind(product_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Distinct active inverter capacities in kW, ascending. Merged
    /// with the configured standard sizes to form the sizing engine's
    /// search space.
    pub async fn inverter_sizes(&self) -> DbResult<Vec<f64>> {
        let sizes: Vec<f64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT capacity_kw FROM products
            WHERE is_active = 1
              AND product_type = 'inverter'
              AND capacity_kw IS NOT NULL
            ORDER BY capacity_kw
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sizes)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, product_type, brand, model, name, sku,
                wattage, capacity_kw, capacity_kwh,
                price_type, base_price_cents,
                is_active, manage_stock, stock_quantity, in_stock,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17
            )
            "#,
        )
        .bind(&product.id)
        .bind(product.product_type)
        .bind(&product.brand)
        .bind(&product.model)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.wattage)
        .bind(product.capacity_kw)
        .bind(product.capacity_kwh)
        .bind(product.price_type)
        .bind(product.base_price_cents)
        .bind(product.is_active)
        .bind(product.manage_stock)
        .bind(product.stock_quantity)
        .bind(product.in_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                product_type = ?2,
                brand = ?3,
                model = ?4,
                name = ?5,
                sku = ?6,
                wattage = ?7,
                capacity_kw = ?8,
                capacity_kwh = ?9,
                price_type = ?10,
                base_price_cents = ?11,
                is_active = ?12,
                manage_stock = ?13,
                stock_quantity = ?14,
                in_stock = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(product.product_type)
        .bind(&product.brand)
        .bind(&product.model)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.wattage)
        .bind(product.capacity_kw)
        .bind(product.capacity_kwh)
        .bind(product.price_type)
        .bind(product.base_price_cents)
        .bind(product.is_active)
        .bind(product.manage_stock)
        .bind(product.stock_quantity)
        .bind(product.in_stock)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical quote items still reference the row, so it is never
    /// deleted outright.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
