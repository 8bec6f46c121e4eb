//! # Settings Repository
//!
//! The string key/value store behind the typed engine configs, plus
//! the peak-sun-hours location lookup.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  settings table ──► snapshot() ──► HashMap<String, String>              │
//! │                                         │ implements ConfigProvider     │
//! │                                         ▼                               │
//! │  SizingConfig::from_provider / PricingConfig::from_provider             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One read per engine run; the engines never touch the database
//! mid-calculation.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// A peak-sun-hours lookup row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PeakSunHoursRow {
    pub id: String,
    pub city: String,
    pub region: Option<String>,
    pub country: String,
    pub hours: f64,
}

/// Repository for settings and location lookups.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets one setting value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Upserts a setting.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key = %key, "Setting value");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Reads the whole table as a snapshot. The returned map implements
    /// `helio_core::ConfigProvider`.
    pub async fn snapshot(&self) -> DbResult<HashMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Fuzzy peak-sun-hours lookup for a free-text location.
    ///
    /// Matches the location against city, region and country with LIKE;
    /// city matches are preferred. Returns `None` when nothing matches
    /// (the sizing engine falls back to its configured default).
    pub async fn peak_sun_hours(&self, location: &str) -> DbResult<Option<f64>> {
        let location = location.trim();
        if location.is_empty() {
            return Ok(None);
        }

        let pattern = format!("%{location}%");
        let row = sqlx::query_as::<_, PeakSunHoursRow>(
            r#"
            SELECT * FROM peak_sun_hours
            WHERE city LIKE ?1 OR region LIKE ?1 OR country LIKE ?1
            ORDER BY CASE WHEN city LIKE ?1 THEN 0 ELSE 1 END
            LIMIT 1
            "#,
        )
        .bind(&pattern)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = &row {
            debug!(location = %location, city = %row.city, hours = row.hours, "Peak sun hours matched");
        }

        Ok(row.map(|r| r.hours))
    }

    /// Inserts a peak-sun-hours row.
    pub async fn insert_peak_sun_hours(
        &self,
        city: &str,
        region: Option<&str>,
        country: &str,
        hours: f64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO peak_sun_hours (id, city, region, country, hours)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(city)
        .bind(region)
        .bind(country)
        .bind(hours)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_and_snapshot() {
        let db = test_db().await;
        let settings = db.settings();

        settings.set("bos_percentage", "10").await.unwrap();
        settings.set("bos_percentage", "12.5").await.unwrap();
        settings.set("design_factor", "1.20").await.unwrap();

        assert_eq!(
            settings.get("bos_percentage").await.unwrap().as_deref(),
            Some("12.5")
        );
        assert_eq!(settings.get("missing_key").await.unwrap(), None);

        let snapshot = settings.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("design_factor").map(String::as_str), Some("1.20"));
    }

    #[tokio::test]
    async fn test_peak_sun_hours_prefers_city_match() {
        let db = test_db().await;
        let settings = db.settings();

        // "Accra" matches Tema's region and Accra's city; the city
        // match must win
        settings
            .insert_peak_sun_hours("Tema", Some("Greater Accra"), "Ghana", 5.1)
            .await
            .unwrap();
        settings
            .insert_peak_sun_hours("Accra", Some("Greater Accra"), "Ghana", 5.3)
            .await
            .unwrap();
        settings
            .insert_peak_sun_hours("Tamale", Some("Northern"), "Ghana", 5.8)
            .await
            .unwrap();

        assert_eq!(settings.peak_sun_hours("Accra").await.unwrap(), Some(5.3));
        // Region-only matches still resolve
        assert_eq!(settings.peak_sun_hours("Northern").await.unwrap(), Some(5.8));
        assert_eq!(settings.peak_sun_hours("Nowhere City").await.unwrap(), None);
        assert_eq!(settings.peak_sun_hours("  ").await.unwrap(), None);
    }
}
