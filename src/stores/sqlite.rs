use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::authz::{ActorId, Role, TeamId};
use crate::errors::StoreError;
use crate::utils::utc_now;

use super::{IdentityStore, TeamRoleStore};

/// Actor profiles backed by the `actor_profiles` table.
///
/// The current actor is whatever the transport layer verified (usually a
/// bearer token) and is fixed at construction.
#[derive(Debug, Clone)]
pub struct SqliteIdentityStore {
    pool: SqlitePool,
    current: Option<ActorId>,
}

impl SqliteIdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, current: None }
    }

    pub fn with_current_actor(mut self, actor_id: Option<ActorId>) -> Self {
        self.current = actor_id;
        self
    }

    /// Creates the profile if needed and replaces its legacy role.
    pub async fn set_legacy_role(&self, actor_id: &ActorId, legacy_role: Option<&str>) -> Result<(), StoreError> {
        let now = utc_now();

        sqlx::query(
            "INSERT INTO actor_profiles (actor_id, legacy_role, created_at, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(actor_id) DO UPDATE SET legacy_role = excluded.legacy_role, updated_at = excluded.updated_at",
        )
        .bind(actor_id.as_str())
        .bind(legacy_role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn current_actor(&self) -> Result<Option<ActorId>, StoreError> {
        Ok(self.current.clone())
    }

    async fn legacy_role(&self, actor_id: &ActorId) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT legacy_role FROM actor_profiles WHERE actor_id = ?")
            .bind(actor_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let legacy_role = row
            .map(|r| r.try_get::<Option<String>, _>("legacy_role"))
            .transpose()?
            .flatten();

        Ok(legacy_role)
    }
}

/// Team-role assignments backed by the `team_roles` table.
#[derive(Debug, Clone)]
pub struct SqliteTeamRoleStore {
    pool: SqlitePool,
}

impl SqliteTeamRoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records `role` for the actor in the team, superseding any previous assignment.
    pub async fn assign(&self, actor_id: &ActorId, team_id: &TeamId, role: Role) -> Result<(), StoreError> {
        let now = utc_now();

        sqlx::query(
            "INSERT INTO team_roles (actor_id, team_id, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(actor_id, team_id) DO UPDATE SET role = excluded.role, updated_at = excluded.updated_at",
        )
        .bind(actor_id.as_str())
        .bind(team_id.as_str())
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(actor_id = %actor_id, team_id = %team_id, role = %role, "team role assigned");
        Ok(())
    }

    /// Removes the assignment; returns whether one existed.
    pub async fn remove(&self, actor_id: &ActorId, team_id: &TeamId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM team_roles WHERE actor_id = ? AND team_id = ?")
            .bind(actor_id.as_str())
            .bind(team_id.as_str())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            tracing::info!(actor_id = %actor_id, team_id = %team_id, "team role removed");
        }
        Ok(removed)
    }
}

#[async_trait]
impl TeamRoleStore for SqliteTeamRoleStore {
    async fn assignment(&self, actor_id: &ActorId, team_id: &TeamId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query("SELECT role FROM team_roles WHERE actor_id = ? AND team_id = ?")
            .bind(actor_id.as_str())
            .bind(team_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("role")?;
        raw.parse::<Role>()
            .map(Some)
            .map_err(|err| StoreError::invalid_value(err.to_string()))
    }
}
