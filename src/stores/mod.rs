//! Lookups the authorization core consumes from the outside world.
//!
//! The core only reads through these traits. Write paths on the concrete
//! stores exist for administration and seeding.

mod memory;
mod sqlite;

pub use memory::{InMemoryIdentityStore, InMemoryTeamRoleStore};
pub use sqlite::{SqliteIdentityStore, SqliteTeamRoleStore};

use async_trait::async_trait;

use crate::authz::{ActorId, Role, TeamId};
use crate::errors::StoreError;

/// Source of the verified actor and the per-actor legacy role field.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// The verified actor for the current context, if anyone is signed in.
    async fn current_actor(&self) -> Result<Option<ActorId>, StoreError>;

    /// Team-independent role recorded before per-team roles existed.
    async fn legacy_role(&self, actor_id: &ActorId) -> Result<Option<String>, StoreError>;
}

/// Explicit per-team role assignments.
#[async_trait]
pub trait TeamRoleStore: Send + Sync {
    async fn assignment(&self, actor_id: &ActorId, team_id: &TeamId) -> Result<Option<Role>, StoreError>;
}
