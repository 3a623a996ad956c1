use crate::authz::{
    AccessCheck, AccessEngine, AccessState, AuthStatus, Capability, Denial, DenialReason, PermissionMatrix,
    Requirement, Resolution, Role,
};

pub const DEFAULT_SIGN_IN_ROUTE: &str = "/sign-in";

/// Where a guarded page is in its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    Denied(Denial),
    Authorized(Role),
}

/// What the presentation layer should do with a guarded page.
#[derive(Debug, PartialEq, Eq)]
pub enum GuardOutcome<'a, V> {
    /// Neutral placeholder while authentication or resolution is pending.
    Placeholder,
    RedirectToSignIn(&'a str),
    Redirect(&'a str),
    FallbackView(&'a V, Denial),
    AccessDenied(Denial),
    Render(Role),
}

/// Full-page enforcement: redirect or replace the whole view.
///
/// `V` is whatever the presentation layer renders as a fallback view.
#[derive(Debug, Clone)]
pub struct RouteGuard<V = ()> {
    requirement: Requirement,
    fallback_route: Option<String>,
    fallback_view: Option<V>,
    sign_in_route: String,
    engine: AccessEngine,
}

impl<V> Default for RouteGuard<V> {
    fn default() -> Self {
        Self {
            requirement: Requirement::default(),
            fallback_route: None,
            fallback_view: None,
            sign_in_route: DEFAULT_SIGN_IN_ROUTE.to_string(),
            engine: AccessEngine::default(),
        }
    }
}

impl<V> RouteGuard<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_requirement(requirement: Requirement) -> Self {
        Self {
            requirement,
            ..Self::default()
        }
    }

    pub fn allow_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.requirement = self.requirement.roles(roles);
        self
    }

    pub fn require(mut self, capability: Capability) -> Self {
        self.requirement = self.requirement.capability(capability);
        self
    }

    pub fn fallback_route(mut self, route: impl Into<String>) -> Self {
        self.fallback_route = Some(route.into());
        self
    }

    pub fn fallback_view(mut self, view: V) -> Self {
        self.fallback_view = Some(view);
        self
    }

    pub fn sign_in_route(mut self, route: impl Into<String>) -> Self {
        self.sign_in_route = route.into();
        self
    }

    pub fn with_matrix(mut self, matrix: PermissionMatrix) -> Self {
        self.engine = AccessEngine::new(matrix);
        self
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn evaluate(&self, state: &AccessState) -> GuardState {
        // The actor could not be confirmed, so a stale sign-in state is not trusted either.
        if state.role == Resolution::Failed {
            return GuardState::Denied(Denial {
                role: Role::Member,
                reason: DenialReason::ResolutionFailed,
            });
        }

        match &state.auth {
            AuthStatus::Pending => GuardState::Loading,
            AuthStatus::Unauthenticated => GuardState::Unauthenticated,
            AuthStatus::Authenticated(_) => match self.engine.check(&state.role, &self.requirement) {
                AccessCheck::Loading => GuardState::Loading,
                AccessCheck::Allowed(role) => GuardState::Authorized(role),
                AccessCheck::Denied(denial) => GuardState::Denied(denial),
            },
        }
    }

    /// Maps the decision to an action: fallback route, then fallback view, then the default denial.
    pub fn outcome(&self, state: &AccessState) -> GuardOutcome<'_, V> {
        match self.evaluate(state) {
            GuardState::Loading => GuardOutcome::Placeholder,
            GuardState::Unauthenticated => {
                tracing::debug!(sign_in = %self.sign_in_route, "route guard: not authenticated");
                GuardOutcome::RedirectToSignIn(&self.sign_in_route)
            }
            GuardState::Authorized(role) => {
                tracing::debug!(actor_id = ?state.actor_id(), role = %role, "route guard: authorized");
                GuardOutcome::Render(role)
            }
            GuardState::Denied(denial) => {
                tracing::info!(
                    actor_id = ?state.actor_id(),
                    role = %denial.role,
                    reason = ?denial.reason,
                    "route guard: access denied"
                );
                if let Some(route) = &self.fallback_route {
                    GuardOutcome::Redirect(route)
                } else if let Some(view) = &self.fallback_view {
                    GuardOutcome::FallbackView(view, denial)
                } else {
                    GuardOutcome::AccessDenied(denial)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::CapabilitySet;

    fn authed(role: Role) -> AccessState {
        AccessState::resolved("a1".into(), role)
    }

    #[test]
    fn pending_auth_is_loading() {
        let guard: RouteGuard = RouteGuard::new().require(Capability::Documents);
        assert_eq!(guard.evaluate(&AccessState::default()), GuardState::Loading);
        assert_eq!(guard.outcome(&AccessState::default()), GuardOutcome::Placeholder);
    }

    #[test]
    fn pending_role_after_auth_is_loading() {
        let guard: RouteGuard = RouteGuard::new();
        let state = AccessState {
            auth: AuthStatus::Authenticated("a1".into()),
            role: Resolution::Pending,
        };
        assert_eq!(guard.evaluate(&state), GuardState::Loading);
    }

    #[test]
    fn unauthenticated_redirects_to_sign_in() {
        let guard: RouteGuard = RouteGuard::new().sign_in_route("/login");
        assert_eq!(
            guard.outcome(&AccessState::unauthenticated()),
            GuardOutcome::RedirectToSignIn("/login")
        );
    }

    #[test]
    fn admin_without_financial_is_denied_even_when_role_allowed() {
        let guard: RouteGuard = RouteGuard::new().allow_roles([Role::Admin]).require(Capability::Financial);

        match guard.evaluate(&authed(Role::Admin)) {
            GuardState::Denied(denial) => {
                assert_eq!(denial.reason, DenialReason::MissingCapability(Capability::Financial))
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[test]
    fn role_outside_allowed_list_is_denied() {
        let guard: RouteGuard = RouteGuard::new().allow_roles([Role::Owner, Role::Admin]);
        assert!(matches!(guard.evaluate(&authed(Role::Lender)), GuardState::Denied(_)));
        assert_eq!(guard.evaluate(&authed(Role::Owner)), GuardState::Authorized(Role::Owner));
    }

    #[test]
    fn denial_prefers_fallback_route_then_view_then_default() {
        let state = authed(Role::Member);

        let with_both = RouteGuard::new()
            .require(Capability::Team)
            .fallback_route("/dashboard")
            .fallback_view("upgrade");
        assert_eq!(with_both.outcome(&state), GuardOutcome::Redirect("/dashboard"));

        let with_view = RouteGuard::new().require(Capability::Team).fallback_view("upgrade");
        assert!(matches!(with_view.outcome(&state), GuardOutcome::FallbackView(&"upgrade", _)));

        let bare: RouteGuard<&str> = RouteGuard::new().require(Capability::Team);
        assert!(matches!(bare.outcome(&state), GuardOutcome::AccessDenied(Denial { role: Role::Member, .. })));
    }

    #[test]
    fn failed_resolution_is_denied() {
        let guard: RouteGuard = RouteGuard::new();
        let state = AccessState {
            auth: AuthStatus::Pending,
            role: Resolution::Failed,
        };
        assert!(matches!(guard.evaluate(&state), GuardState::Denied(_)));
    }

    #[test]
    fn failed_resolution_after_sign_out_is_denied_not_sent_to_sign_in() {
        let guard: RouteGuard = RouteGuard::new().fallback_route("/dashboard");
        let state = AccessState {
            auth: AuthStatus::Unauthenticated,
            role: Resolution::Failed,
        };
        let denial = Denial {
            role: Role::Member,
            reason: DenialReason::ResolutionFailed,
        };
        assert_eq!(guard.evaluate(&state), GuardState::Denied(denial));
        assert_eq!(guard.outcome(&state), GuardOutcome::Redirect("/dashboard"));
    }

    #[test]
    fn custom_matrix_is_honored() {
        let matrix = PermissionMatrix::from_fn(|_| CapabilitySet::of(&[Capability::Settings]));
        let guard: RouteGuard = RouteGuard::new().require(Capability::Settings).with_matrix(matrix);
        assert_eq!(guard.evaluate(&authed(Role::Member)), GuardState::Authorized(Role::Member));
    }
}
