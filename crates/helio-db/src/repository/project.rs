//! # Project Repository
//!
//! Database operations for projects and their status audit trail.
//!
//! ## Status Updates
//! Every transition writes an audit row alongside the status change.
//! The stock ledger drives Accepted/Rejected transitions itself (they
//! must share a transaction with the stock mutations); this repository
//! covers the rest.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use helio_core::{Project, ProjectStatus, SystemType};

/// Repository for project database operations.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    /// Creates a new ProjectRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProjectRepository { pool }
    }

    /// Gets a project by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    /// Gets a project by its reference code.
    pub async fn get_by_reference(&self, reference_code: &str) -> DbResult<Option<Project>> {
        let project =
            sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE reference_code = ?1")
                .bind(reference_code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(project)
    }

    /// Creates a new project in status New.
    pub async fn create(&self, name: &str, system_type: SystemType) -> DbResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            reference_code: generate_reference_code(),
            system_type,
            status: ProjectStatus::New,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %project.id, reference = %project.reference_code, "Creating project");

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, name, reference_code, system_type, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.reference_code)
        .bind(project.system_type)
        .bind(project.status)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(project)
    }

    /// Transitions a project's status, enforcing the state machine and
    /// writing an audit row.
    pub async fn transition(
        &self,
        id: &str,
        to: ProjectStatus,
        changed_by: Option<&str>,
    ) -> DbResult<Project> {
        let mut tx = self.pool.begin().await?;

        let mut project = fetch_for_update(&mut tx, id).await?;
        apply_transition(&mut tx, &mut project, to, changed_by).await?;

        tx.commit().await?;
        Ok(project)
    }

    /// Lists projects in a given status.
    pub async fn list_by_status(&self, status: ProjectStatus) -> DbResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE status = ?1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }
}

// =============================================================================
// Transaction Helpers (shared with the stock ledger)
// =============================================================================

/// Loads a project inside an open transaction.
pub(crate) async fn fetch_for_update(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
) -> DbResult<Project> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| DbError::not_found("Project", id))
}

/// Applies a validated status transition and appends the audit row,
/// all inside the caller's transaction.
pub(crate) async fn apply_transition(
    tx: &mut Transaction<'_, Sqlite>,
    project: &mut Project,
    to: ProjectStatus,
    changed_by: Option<&str>,
) -> DbResult<()> {
    if !project.status.can_transition_to(to) {
        return Err(DbError::conflict(format!(
            "project {} cannot move {:?} -> {:?}",
            project.id, project.status, to
        )));
    }

    let now = Utc::now();
    sqlx::query("UPDATE projects SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(&project.id)
        .bind(to)
        .bind(now)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO project_status_updates (
            id, project_id, from_status, to_status, changed_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&project.id)
    .bind(project.status)
    .bind(to)
    .bind(changed_by)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    debug!(
        project_id = %project.id,
        from = ?project.status,
        to = ?to,
        "Project status transition"
    );

    project.status = to;
    project.updated_at = now;
    Ok(())
}

/// Generates a human-facing project reference ("PRJ-YYYYMMDD-XXXX").
fn generate_reference_code() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = &Uuid::new_v4().simple().to_string()[..4];
    format!("PRJ-{date}-{}", suffix.to_uppercase())
}
