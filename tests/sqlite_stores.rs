use std::sync::Arc;

use anyhow::Result;

use team_access::authz::{ActorId, ResolvedRole, Role, RoleResolver, TeamId};
use team_access::stores::{IdentityStore, SqliteIdentityStore, SqliteTeamRoleStore, TeamRoleStore};

mod common;

#[tokio::test]
async fn assignment_is_superseded_and_removed() -> Result<()> {
    let (_dir, pool) = common::test_pool("stores_assign.db").await?;
    let store = SqliteTeamRoleStore::new(pool);
    let actor = ActorId::new("a1");
    let team = TeamId::new("t1");

    assert_eq!(store.assignment(&actor, &team).await?, None);

    store.assign(&actor, &team, Role::Inspector).await?;
    store.assign(&actor, &team, Role::BrokerAgent).await?;
    assert_eq!(store.assignment(&actor, &team).await?, Some(Role::BrokerAgent));
    assert_eq!(store.assignment(&actor, &TeamId::new("t2")).await?, None);

    assert!(store.remove(&actor, &team).await?);
    assert!(!store.remove(&actor, &team).await?);
    assert_eq!(store.assignment(&actor, &team).await?, None);

    Ok(())
}

#[tokio::test]
async fn legacy_role_can_be_set_and_cleared() -> Result<()> {
    let (_dir, pool) = common::test_pool("stores_legacy.db").await?;
    let store = SqliteIdentityStore::new(pool);
    let actor = ActorId::new("a1");

    assert_eq!(store.legacy_role(&actor).await?, None);
    store.set_legacy_role(&actor, Some("attorney")).await?;
    assert_eq!(store.legacy_role(&actor).await?.as_deref(), Some("attorney"));
    store.set_legacy_role(&actor, None).await?;
    assert_eq!(store.legacy_role(&actor).await?, None);

    Ok(())
}

#[tokio::test]
async fn corrupt_assignment_row_falls_through_to_legacy_role() -> Result<()> {
    let (_dir, pool) = common::test_pool("stores_corrupt.db").await?;
    sqlx::query(
        "INSERT INTO team_roles (actor_id, team_id, role, created_at, updated_at) \
         VALUES ('a1', 't1', 'superuser', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await?;

    let identity = Arc::new(SqliteIdentityStore::new(pool.clone()));
    identity.set_legacy_role(&ActorId::new("a1"), Some("inspector")).await?;

    let team_roles = Arc::new(SqliteTeamRoleStore::new(pool));
    assert!(team_roles.assignment(&ActorId::new("a1"), &TeamId::new("t1")).await.is_err());

    let resolver = RoleResolver::standard(team_roles, identity);
    let resolved = resolver.resolve_detailed(&ActorId::new("a1"), Some(&TeamId::new("t1"))).await;
    assert_eq!(resolved.role, Role::Inspector);
    assert_eq!(resolved.source, "legacy_profile");

    Ok(())
}

#[tokio::test]
async fn explicit_assignment_may_downgrade_legacy_role() -> Result<()> {
    let (_dir, pool) = common::test_pool("stores_downgrade.db").await?;
    let identity = Arc::new(SqliteIdentityStore::new(pool.clone()));
    identity.set_legacy_role(&ActorId::new("a1"), Some("owner")).await?;
    let team_roles = Arc::new(SqliteTeamRoleStore::new(pool));
    team_roles.assign(&ActorId::new("a1"), &TeamId::new("t1"), Role::Member).await?;

    let resolver = RoleResolver::standard(team_roles, identity);
    assert_eq!(resolver.resolve(&ActorId::new("a1"), Some(&TeamId::new("t1"))).await, Role::Member);
    assert_eq!(resolver.resolve(&ActorId::new("a1"), Some(&TeamId::new("t2"))).await, Role::Owner);

    let no_team = resolver.resolve_detailed(&ActorId::new("a1"), None).await;
    assert_eq!(no_team.role, Role::Member);
    assert_eq!(no_team.source, ResolvedRole::NO_TEAM);

    Ok(())
}
