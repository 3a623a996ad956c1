use crate::authz::{AccessCheck, AccessEngine, Capability, PermissionMatrix, Requirement, Resolution, Role};

/// Subtree-level enforcement: include a fragment or leave it out.
///
/// Denial is silent by default. A gate never produces an error or an
/// explanation, only the children, the fallback, or nothing.
#[derive(Debug, Clone)]
pub struct ContentGate<V> {
    requirement: Requirement,
    fallback_view: Option<V>,
    render_nothing_on_deny: bool,
    engine: AccessEngine,
}

impl<V> Default for ContentGate<V> {
    fn default() -> Self {
        Self {
            requirement: Requirement::default(),
            fallback_view: None,
            render_nothing_on_deny: true,
            engine: AccessEngine::default(),
        }
    }
}

impl<V: Clone> ContentGate<V> {
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

    /// Shows `view` while loading and on denial. Opts out of silent omission.
    pub fn fallback_view(mut self, view: V) -> Self {
        self.fallback_view = Some(view);
        self.render_nothing_on_deny = false;
        self
    }

    pub fn render_nothing_on_deny(mut self, silent: bool) -> Self {
        self.render_nothing_on_deny = silent;
        self
    }

    pub fn with_matrix(mut self, matrix: PermissionMatrix) -> Self {
        self.engine = AccessEngine::new(matrix);
        self
    }

    pub fn check(&self, resolution: &Resolution) -> AccessCheck {
        self.engine.check(resolution, &self.requirement)
    }

    /// Children when allowed, otherwise the fallback unless the gate is silent.
    pub fn render(&self, resolution: &Resolution, children: impl FnOnce() -> V) -> Option<V> {
        match self.check(resolution) {
            AccessCheck::Allowed(_) => Some(children()),
            AccessCheck::Loading => self.fallback(),
            AccessCheck::Denied(denial) => {
                tracing::debug!(role = %denial.role, reason = ?denial.reason, "content gate: omitted");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> Option<V> {
        if self.render_nothing_on_deny {
            None
        } else {
            self.fallback_view.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_gate_passes_through_once_resolved() {
        let gate: ContentGate<&str> = ContentGate::new();
        for role in Role::ALL {
            assert_eq!(gate.render(&Resolution::Resolved(role), || "children"), Some("children"));
        }
    }

    #[test]
    fn loading_renders_nothing_by_default() {
        let gate: ContentGate<&str> = ContentGate::new();
        assert_eq!(gate.render(&Resolution::Pending, || "children"), None);
    }

    #[test]
    fn loading_renders_fallback_when_not_silent() {
        let gate = ContentGate::new().require(Capability::Financial).fallback_view("...");
        assert_eq!(gate.render(&Resolution::Pending, || "figures"), Some("..."));
    }

    #[test]
    fn denial_is_silent_by_default() {
        let gate = ContentGate::new().require(Capability::Financial);
        assert_eq!(gate.render(&Resolution::Resolved(Role::Contractor), || "figures"), None);
        assert_eq!(gate.render(&Resolution::Resolved(Role::Lender), || "figures"), Some("figures"));
    }

    #[test]
    fn silent_flag_overrides_fallback() {
        let gate = ContentGate::new()
            .require(Capability::Financial)
            .fallback_view("hidden")
            .render_nothing_on_deny(true);
        assert_eq!(gate.render(&Resolution::Resolved(Role::Member), || "figures"), None);
    }

    #[test]
    fn both_role_and_capability_must_pass() {
        let gate = ContentGate::new().allow_roles([Role::Owner, Role::Admin]).require(Capability::Settings);
        assert_eq!(gate.render(&Resolution::Resolved(Role::Admin), || 1), Some(1));
        assert_eq!(gate.render(&Resolution::Resolved(Role::Lender), || 1), None);
    }

    #[test]
    fn children_are_not_built_when_denied() {
        let gate = ContentGate::new().require(Capability::Team);
        let rendered = gate.render(&Resolution::Resolved(Role::Inspector), || -> String {
            panic!("children must not be rendered")
        });
        assert!(rendered.is_none());
    }

    #[test]
    fn failed_resolution_renders_fallback_only() {
        let gate = ContentGate::new().fallback_view("n/a");
        assert_eq!(gate.render(&Resolution::Failed, || "children"), Some("n/a"));
    }
}
