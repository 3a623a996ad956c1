use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::errors::StoreError;
use crate::stores::{IdentityStore, TeamRoleStore};

use super::role::{ActorId, Role, TeamId};
use super::source::{LegacyProfileSource, RoleSource, TeamAssignmentSource};

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Effective role together with the link of the chain that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedRole {
    pub role: Role,
    pub source: &'static str,
}

impl ResolvedRole {
    /// No team context was given.
    pub const NO_TEAM: &'static str = "no_team";
    /// Every source came back empty (or failed).
    pub const DEFAULT: &'static str = "default";
}

/// Resolves an actor's effective role in a team.
///
/// Sources are consulted one at a time in priority order. The first one that
/// answers wins; a failing or slow source counts as "not found" so the chain
/// only ever moves toward less trusted sources and finally to
/// [`Role::Member`].
#[derive(Clone)]
pub struct RoleResolver {
    sources: Vec<Arc<dyn RoleSource>>,
    lookup_timeout: Duration,
}

impl RoleResolver {
    pub fn new(sources: Vec<Arc<dyn RoleSource>>) -> Self {
        Self {
            sources,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Explicit team assignment first, then the legacy profile field.
    pub fn standard(team_roles: Arc<dyn TeamRoleStore>, identity: Arc<dyn IdentityStore>) -> Self {
        Self::new(vec![
            Arc::new(TeamAssignmentSource::new(team_roles)),
            Arc::new(LegacyProfileSource::new(identity)),
        ])
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub async fn resolve(&self, actor_id: &ActorId, team_id: Option<&TeamId>) -> Role {
        self.resolve_detailed(actor_id, team_id).await.role
    }

    pub async fn resolve_detailed(&self, actor_id: &ActorId, team_id: Option<&TeamId>) -> ResolvedRole {
        let Some(team_id) = team_id else {
            tracing::debug!(actor_id = %actor_id, "no team context, resolving to member");
            return ResolvedRole {
                role: Role::Member,
                source: ResolvedRole::NO_TEAM,
            };
        };

        for source in &self.sources {
            match self.lookup(source.as_ref(), actor_id, team_id).await {
                Ok(Some(role)) => {
                    tracing::debug!(
                        actor_id = %actor_id,
                        team_id = %team_id,
                        role = %role,
                        source = source.name(),
                        "effective role resolved"
                    );
                    return ResolvedRole {
                        role,
                        source: source.name(),
                    };
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        actor_id = %actor_id,
                        team_id = %team_id,
                        source = source.name(),
                        error = %err,
                        "role source failed, falling through"
                    );
                }
            }
        }

        tracing::debug!(actor_id = %actor_id, team_id = %team_id, "no role found, resolving to member");
        ResolvedRole {
            role: Role::Member,
            source: ResolvedRole::DEFAULT,
        }
    }

    async fn lookup(
        &self,
        source: &dyn RoleSource,
        actor_id: &ActorId,
        team_id: &TeamId,
    ) -> Result<Option<Role>, StoreError> {
        tokio::time::timeout(self.lookup_timeout, source.lookup(actor_id, team_id))
            .await
            .map_err(|_| StoreError::Timeout(self.lookup_timeout))?
    }
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("RoleResolver")
            .field("sources", &names)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{InMemoryIdentityStore, InMemoryTeamRoleStore};

    fn resolver(teams: &Arc<InMemoryTeamRoleStore>, identity: &Arc<InMemoryIdentityStore>) -> RoleResolver {
        RoleResolver::standard(teams.clone(), identity.clone())
    }

    #[tokio::test]
    async fn explicit_assignment_wins_over_legacy() {
        let teams = Arc::new(InMemoryTeamRoleStore::new().with_assignment("actor", "T1", Role::Owner));
        let identity = Arc::new(InMemoryIdentityStore::new().with_legacy_role("actor", "member"));

        let resolved = resolver(&teams, &identity)
            .resolve_detailed(&"actor".into(), Some(&"T1".into()))
            .await;

        assert_eq!(resolved.role, Role::Owner);
        assert_eq!(resolved.source, TeamAssignmentSource::NAME);
        assert_eq!(identity.lookups(), 0, "legacy lookup must not run once the team answers");
    }

    #[tokio::test]
    async fn explicit_assignment_can_downgrade_legacy() {
        let teams = Arc::new(InMemoryTeamRoleStore::new().with_assignment("actor", "T1", Role::Inspector));
        let identity = Arc::new(InMemoryIdentityStore::new().with_legacy_role("actor", "owner"));

        let role = resolver(&teams, &identity).resolve(&"actor".into(), Some(&"T1".into())).await;
        assert_eq!(role, Role::Inspector);
    }

    #[tokio::test]
    async fn legacy_role_is_the_fallback() {
        let teams = Arc::new(InMemoryTeamRoleStore::new());
        let identity = Arc::new(InMemoryIdentityStore::new().with_legacy_role("actor", "lender"));

        let resolved = resolver(&teams, &identity)
            .resolve_detailed(&"actor".into(), Some(&"T1".into()))
            .await;

        assert_eq!(resolved.role, Role::Lender);
        assert_eq!(resolved.source, LegacyProfileSource::NAME);
    }

    #[tokio::test]
    async fn nothing_found_resolves_to_member() {
        let teams = Arc::new(InMemoryTeamRoleStore::new());
        let identity = Arc::new(InMemoryIdentityStore::new());

        let resolved = resolver(&teams, &identity)
            .resolve_detailed(&"actor".into(), Some(&"T1".into()))
            .await;

        assert_eq!(resolved.role, Role::Member);
        assert_eq!(resolved.source, ResolvedRole::DEFAULT);
    }

    #[tokio::test]
    async fn missing_team_short_circuits() {
        let teams = Arc::new(InMemoryTeamRoleStore::new().with_assignment("actor", "T1", Role::Owner));
        let identity = Arc::new(InMemoryIdentityStore::new().with_legacy_role("actor", "owner"));

        let resolved = resolver(&teams, &identity).resolve_detailed(&"actor".into(), None).await;

        assert_eq!(resolved.role, Role::Member);
        assert_eq!(resolved.source, ResolvedRole::NO_TEAM);
        assert_eq!(teams.lookups(), 0);
        assert_eq!(identity.lookups(), 0);
    }

    #[tokio::test]
    async fn failing_team_store_falls_through_to_legacy() {
        let teams = Arc::new(InMemoryTeamRoleStore::new().with_assignment("actor", "T1", Role::Owner));
        teams.set_failing(true);
        let identity = Arc::new(InMemoryIdentityStore::new().with_legacy_role("actor", "contractor"));

        let role = resolver(&teams, &identity).resolve(&"actor".into(), Some(&"T1".into())).await;
        assert_eq!(role, Role::Contractor);
    }

    #[tokio::test]
    async fn failing_legacy_store_falls_through_to_member() {
        let teams = Arc::new(InMemoryTeamRoleStore::new());
        let identity = Arc::new(InMemoryIdentityStore::new().with_legacy_role("actor", "owner"));
        identity.set_failing(true);

        let role = resolver(&teams, &identity).resolve(&"actor".into(), Some(&"T1".into())).await;
        assert_eq!(role, Role::Member);
    }

    #[tokio::test]
    async fn slow_team_store_times_out_into_legacy() {
        let teams = Arc::new(InMemoryTeamRoleStore::new().with_assignment("actor", "T1", Role::Owner));
        teams.set_delay(Duration::from_millis(200));
        let identity = Arc::new(InMemoryIdentityStore::new().with_legacy_role("actor", "attorney"));

        let role = resolver(&teams, &identity)
            .with_lookup_timeout(Duration::from_millis(20))
            .resolve(&"actor".into(), Some(&"T1".into()))
            .await;

        assert_eq!(role, Role::Attorney);
    }

    #[tokio::test]
    async fn resolution_is_repeatable() {
        let teams = Arc::new(InMemoryTeamRoleStore::new().with_assignment("actor", "T1", Role::BrokerAgent));
        let identity = Arc::new(InMemoryIdentityStore::new());
        let resolver = resolver(&teams, &identity);

        let first = resolver.resolve(&"actor".into(), Some(&"T1".into())).await;
        let second = resolver.resolve(&"actor".into(), Some(&"T1".into())).await;
        assert_eq!(first, second);
        assert_eq!(teams.lookups(), 2);
    }
}
