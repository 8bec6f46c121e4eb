//! # Sizing Result Repository
//!
//! One active sizing snapshot per project. Recomputation replaces the
//! row wholesale (INSERT OR REPLACE on the project's unique slot), so a
//! stored result is always internally consistent, never patched field
//! by field.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use helio_core::SizingResult;

/// Repository for sizing result persistence.
#[derive(Debug, Clone)]
pub struct SizingResultRepository {
    pool: SqlitePool,
}

impl SizingResultRepository {
    /// Creates a new SizingResultRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SizingResultRepository { pool }
    }

    /// Gets the current sizing result for a project.
    pub async fn get_for_project(&self, project_id: &str) -> DbResult<Option<SizingResult>> {
        let result = sqlx::query_as::<_, SizingResult>(
            "SELECT * FROM sizing_results WHERE project_id = ?1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    /// Saves a sizing result, replacing any previous snapshot for the
    /// project.
    pub async fn save(&self, result: &SizingResult) -> DbResult<()> {
        debug!(project_id = %result.project_id, "Saving sizing result");

        let mut tx = self.pool.begin().await?;

        // The UNIQUE(project_id) slot makes this a wholesale replace
        sqlx::query("DELETE FROM sizing_results WHERE project_id = ?1")
            .bind(&result.project_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO sizing_results (
                id, project_id,
                total_daily_kwh, location, panel_brand, panel_wattage,
                backup_hours, essential_load_percent,
                effective_daily_kwh, system_size_kw, number_of_panels,
                panel_array_kw, roof_area_m2, min_inverter_kw,
                inverter_total_kw, inverter_count, inverter_unit_kw,
                battery_capacity_kwh, dc_ac_ratio,
                peak_sun_hours, system_efficiency, design_factor,
                created_at, updated_at
            ) VALUES (
                ?1, ?2,
                ?3, ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16, ?17,
                ?18, ?19,
                ?20, ?21, ?22,
                ?23, ?24
            )
            "#,
        )
        .bind(&result.id)
        .bind(&result.project_id)
        .bind(result.total_daily_kwh)
        .bind(&result.location)
        .bind(&result.panel_brand)
        .bind(result.panel_wattage)
        .bind(result.backup_hours)
        .bind(result.essential_load_percent)
        .bind(result.effective_daily_kwh)
        .bind(result.system_size_kw)
        .bind(result.number_of_panels)
        .bind(result.panel_array_kw)
        .bind(result.roof_area_m2)
        .bind(result.min_inverter_kw)
        .bind(result.inverter_total_kw)
        .bind(result.inverter_count)
        .bind(result.inverter_unit_kw)
        .bind(result.battery_capacity_kwh)
        .bind(result.dc_ac_ratio)
        .bind(result.peak_sun_hours)
        .bind(result.system_efficiency)
        .bind(result.design_factor)
        .bind(result.created_at)
        .bind(result.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
