//! Authorization core - permission matrix, role resolution, access decisions
//!
//! This module answers "what can this actor do, in this team, right now":
//! - Static role to capability matrix
//! - Effective role resolution (team assignment, then legacy profile, then member)
//! - Tri-state access checks that distinguish "still resolving" from "denied"
//! - Per-view sessions that drop results for a stale actor/team context

mod decision;
mod matrix;
mod resolver;
mod role;
mod session;
mod source;

pub use decision::{
    has_any_role, has_capability, is_admin, is_owner, AccessCheck, AccessEngine, AccessState, AuthStatus, Denial,
    DenialReason, Requirement, Resolution,
};
pub use matrix::{capabilities_for, CapabilitySet, PermissionMatrix, STANDARD_MATRIX};
pub use resolver::{ResolvedRole, RoleResolver, DEFAULT_LOOKUP_TIMEOUT};
pub use role::{ActorId, Capability, Role, TeamId, UnknownCapability, UnknownRole};
pub use session::{Applied, RoleSession, Ticket};
pub use source::{LegacyProfileSource, RoleSource, TeamAssignmentSource};

/// Resolves the effective role of `actor_id` in `team_id`.
pub async fn resolve_effective_role(resolver: &RoleResolver, actor_id: &ActorId, team_id: Option<&TeamId>) -> Role {
    resolver.resolve(actor_id, team_id).await
}
