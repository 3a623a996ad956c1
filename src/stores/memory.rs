use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::authz::{ActorId, Role, TeamId};
use crate::errors::StoreError;

use super::{IdentityStore, TeamRoleStore};

/// Knobs shared by the in-memory stores for exercising failure paths.
#[derive(Debug, Default)]
struct Behavior {
    failing: AtomicBool,
    delay_ms: AtomicUsize,
    lookups: AtomicUsize,
}

impl Behavior {
    async fn enter(&self, store: &str) -> Result<(), StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(format!("{store} is failing")));
        }
        Ok(())
    }
}

/// Process-local identity store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    current: RwLock<Option<ActorId>>,
    legacy_roles: RwLock<HashMap<ActorId, String>>,
    behavior: Behavior,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_actor(self, actor_id: impl Into<ActorId>) -> Self {
        self.sign_in(Some(actor_id.into()));
        self
    }

    pub fn with_legacy_role(self, actor_id: impl Into<ActorId>, legacy_role: impl Into<String>) -> Self {
        if let Ok(mut roles) = self.legacy_roles.write() {
            roles.insert(actor_id.into(), legacy_role.into());
        }
        self
    }

    pub fn sign_in(&self, actor_id: Option<ActorId>) {
        if let Ok(mut current) = self.current.write() {
            *current = actor_id;
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.behavior.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.behavior.delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of lookups served (or failed) so far.
    pub fn lookups(&self) -> usize {
        self.behavior.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn current_actor(&self) -> Result<Option<ActorId>, StoreError> {
        self.behavior.enter("identity store").await?;
        let current = self
            .current
            .read()
            .map_err(|_| StoreError::unavailable("identity store lock poisoned"))?;
        Ok(current.clone())
    }

    async fn legacy_role(&self, actor_id: &ActorId) -> Result<Option<String>, StoreError> {
        self.behavior.enter("identity store").await?;
        let roles = self
            .legacy_roles
            .read()
            .map_err(|_| StoreError::unavailable("identity store lock poisoned"))?;
        Ok(roles.get(actor_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTeamRoleStore {
    assignments: RwLock<HashMap<(ActorId, TeamId), Role>>,
    behavior: Behavior,
}

impl InMemoryTeamRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignment(self, actor_id: impl Into<ActorId>, team_id: impl Into<TeamId>, role: Role) -> Self {
        self.assign(actor_id.into(), team_id.into(), role);
        self
    }

    pub fn assign(&self, actor_id: ActorId, team_id: TeamId, role: Role) {
        if let Ok(mut assignments) = self.assignments.write() {
            assignments.insert((actor_id, team_id), role);
        }
    }

    pub fn remove(&self, actor_id: &ActorId, team_id: &TeamId) -> bool {
        self.assignments
            .write()
            .map(|mut assignments| assignments.remove(&(actor_id.clone(), team_id.clone())).is_some())
            .unwrap_or(false)
    }

    pub fn set_failing(&self, failing: bool) {
        self.behavior.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.behavior.delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.behavior.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TeamRoleStore for InMemoryTeamRoleStore {
    async fn assignment(&self, actor_id: &ActorId, team_id: &TeamId) -> Result<Option<Role>, StoreError> {
        self.behavior.enter("team-role store").await?;
        let assignments = self
            .assignments
            .read()
            .map_err(|_| StoreError::unavailable("team-role store lock poisoned"))?;
        Ok(assignments.get(&(actor_id.clone(), team_id.clone())).copied())
    }
}
