use super::matrix::{CapabilitySet, PermissionMatrix, STANDARD_MATRIX};
use super::role::{ActorId, Capability, Role};

pub fn has_capability(role: Role, capability: Capability) -> bool {
    STANDARD_MATRIX.capabilities_for(role).contains(capability)
}

/// True iff `role` is one of `allowed`. An empty list allows nobody.
pub fn has_any_role(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

pub fn is_owner(role: Role) -> bool {
    role.is_owner()
}

pub fn is_admin(role: Role) -> bool {
    role.is_admin()
}

/// Progress of an effective-role resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Pending,
    Resolved(Role),
    Failed,
}

impl Resolution {
    pub fn role(&self) -> Option<Role> {
        match self {
            Resolution::Resolved(role) => Some(*role),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Pending,
    Authenticated(ActorId),
    Unauthenticated,
}

/// Everything the enforcement layer needs to decide for one view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessState {
    pub auth: AuthStatus,
    pub role: Resolution,
}

impl AccessState {
    pub fn unauthenticated() -> Self {
        Self {
            auth: AuthStatus::Unauthenticated,
            role: Resolution::Pending,
        }
    }

    pub fn resolved(actor_id: ActorId, role: Role) -> Self {
        Self {
            auth: AuthStatus::Authenticated(actor_id),
            role: Resolution::Resolved(role),
        }
    }

    pub fn actor_id(&self) -> Option<&ActorId> {
        match &self.auth {
            AuthStatus::Authenticated(actor_id) => Some(actor_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    RoleNotAllowed,
    MissingCapability(Capability),
    ResolutionFailed,
}

/// Why a check failed. The reason is for logs; only the role is shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    pub role: Role,
    pub reason: DenialReason,
}

impl Denial {
    pub fn message(&self) -> String {
        format!(
            "Access denied. Your current role ({}) does not have sufficient permissions to view this page.",
            self.role
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    Loading,
    Allowed(Role),
    Denied(Denial),
}

impl AccessCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessCheck::Allowed(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AccessCheck::Loading)
    }
}

/// Role and capability constraints attached to a view or fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    pub allowed_roles: Option<Vec<Role>>,
    pub required_capability: Option<Capability>,
}

impl Requirement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = Some(roles.into_iter().collect());
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.required_capability = Some(capability);
        self
    }
}

/// Answers access questions over an already-resolved role.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessEngine {
    matrix: PermissionMatrix,
}

impl AccessEngine {
    pub fn new(matrix: PermissionMatrix) -> Self {
        Self { matrix }
    }

    pub fn capabilities_for(&self, role: Role) -> CapabilitySet {
        self.matrix.capabilities_for(role)
    }

    pub fn has_capability(&self, role: Role, capability: Capability) -> bool {
        self.capabilities_for(role).contains(capability)
    }

    /// Role list first, capability second.
    pub fn evaluate(&self, role: Role, requirement: &Requirement) -> Result<(), Denial> {
        if let Some(allowed) = &requirement.allowed_roles {
            if !has_any_role(role, allowed) {
                return Err(Denial {
                    role,
                    reason: DenialReason::RoleNotAllowed,
                });
            }
        }

        if let Some(capability) = requirement.required_capability {
            if !self.has_capability(role, capability) {
                return Err(Denial {
                    role,
                    reason: DenialReason::MissingCapability(capability),
                });
            }
        }

        Ok(())
    }

    /// Tri-state check: a pending resolution is neither allowed nor denied.
    pub fn check(&self, resolution: &Resolution, requirement: &Requirement) -> AccessCheck {
        match resolution {
            Resolution::Pending => AccessCheck::Loading,
            Resolution::Failed => AccessCheck::Denied(Denial {
                role: Role::Member,
                reason: DenialReason::ResolutionFailed,
            }),
            Resolution::Resolved(role) => match self.evaluate(*role, requirement) {
                Ok(()) => AccessCheck::Allowed(*role),
                Err(denial) => AccessCheck::Denied(denial),
            },
        }
    }

    pub fn check_capability(&self, resolution: &Resolution, capability: Capability) -> AccessCheck {
        self.check(resolution, &Requirement::new().capability(capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lender_capabilities() {
        assert!(has_capability(Role::Lender, Capability::Financial));
        assert!(!has_capability(Role::Lender, Capability::Physical));
    }

    #[test]
    fn has_any_role_is_membership() {
        assert!(has_any_role(Role::Admin, &[Role::Owner, Role::Admin]));
        assert!(!has_any_role(Role::Lender, &[Role::Owner, Role::Admin]));
        for role in Role::ALL {
            assert!(!has_any_role(role, &[]));
        }
    }

    #[test]
    fn owner_and_admin_helpers() {
        assert!(is_owner(Role::Owner));
        assert!(!is_owner(Role::Admin));
        assert!(is_admin(Role::Owner));
        assert!(is_admin(Role::Admin));
        assert!(!is_admin(Role::Inspector));
    }

    #[test]
    fn role_check_runs_before_capability_check() {
        let engine = AccessEngine::default();
        let requirement = Requirement::new().roles([Role::Owner]).capability(Capability::Physical);

        let denial = engine.evaluate(Role::Lender, &requirement).unwrap_err();
        assert_eq!(denial.reason, DenialReason::RoleNotAllowed);
    }

    #[test]
    fn capability_still_enforced_after_role_passes() {
        let engine = AccessEngine::default();
        let requirement = Requirement::new().roles([Role::Admin]).capability(Capability::Financial);

        let denial = engine.evaluate(Role::Admin, &requirement).unwrap_err();
        assert_eq!(denial.reason, DenialReason::MissingCapability(Capability::Financial));
    }

    #[test]
    fn pending_resolution_is_loading_not_denied() {
        let engine = AccessEngine::default();
        let check = engine.check_capability(&Resolution::Pending, Capability::Documents);
        assert!(check.is_loading());
        assert!(!check.is_allowed());
    }

    #[test]
    fn failed_resolution_is_denied() {
        let engine = AccessEngine::default();
        let check = engine.check(&Resolution::Failed, &Requirement::new());
        assert!(matches!(
            check,
            AccessCheck::Denied(Denial {
                reason: DenialReason::ResolutionFailed,
                ..
            })
        ));
    }

    #[test]
    fn unconstrained_requirement_allows_any_resolved_role() {
        let engine = AccessEngine::default();
        for role in Role::ALL {
            assert_eq!(engine.check(&Resolution::Resolved(role), &Requirement::new()), AccessCheck::Allowed(role));
        }
    }

    #[test]
    fn denial_message_names_role_not_data() {
        let denial = Denial {
            role: Role::Contractor,
            reason: DenialReason::MissingCapability(Capability::Financial),
        };
        let message = denial.message();
        assert!(message.contains("contractor"));
        assert!(!message.contains("financial"));
    }
}
