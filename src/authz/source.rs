use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::stores::{IdentityStore, TeamRoleStore};

use super::role::{ActorId, Role, TeamId};

/// One link of the role fallback chain.
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Stable label used in logs and the access introspection view.
    fn name(&self) -> &'static str;

    async fn lookup(&self, actor_id: &ActorId, team_id: &TeamId) -> Result<Option<Role>, StoreError>;
}

/// Explicit per-team assignment. Authoritative when present.
pub struct TeamAssignmentSource {
    store: Arc<dyn TeamRoleStore>,
}

impl TeamAssignmentSource {
    pub const NAME: &'static str = "team_assignment";

    pub fn new(store: Arc<dyn TeamRoleStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleSource for TeamAssignmentSource {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn lookup(&self, actor_id: &ActorId, team_id: &TeamId) -> Result<Option<Role>, StoreError> {
        self.store.assignment(actor_id, team_id).await
    }
}

/// Team-independent legacy role on the actor profile.
pub struct LegacyProfileSource {
    store: Arc<dyn IdentityStore>,
}

impl LegacyProfileSource {
    pub const NAME: &'static str = "legacy_profile";

    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleSource for LegacyProfileSource {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn lookup(&self, actor_id: &ActorId, _team_id: &TeamId) -> Result<Option<Role>, StoreError> {
        let Some(raw) = self.store.legacy_role(actor_id).await? else {
            return Ok(None);
        };

        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        raw.parse::<Role>()
            .map(Some)
            .map_err(|err| StoreError::invalid_value(err.to_string()))
    }
}
