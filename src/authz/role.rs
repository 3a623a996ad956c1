use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Privilege tier an actor holds within a team.
///
/// The set is closed. Adding a variant fails to compile until the
/// permission matrix gives it an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Lender,
    Contractor,
    BrokerAgent,
    Attorney,
    Inspector,
    Member,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Owner,
        Role::Admin,
        Role::Lender,
        Role::Contractor,
        Role::BrokerAgent,
        Role::Attorney,
        Role::Inspector,
        Role::Member,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Lender => "lender",
            Role::Contractor => "contractor",
            Role::BrokerAgent => "broker_agent",
            Role::Attorney => "attorney",
            Role::Inspector => "inspector",
            Role::Member => "member",
        }
    }

    /// Position in [`Role::ALL`], used to index the permission matrix.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    pub fn is_owner(self) -> bool {
        self == Role::Owner
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Named slice of application behavior gated independently of role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Financial,
    Physical,
    Documents,
    Team,
    Settings,
    Analytics,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Financial,
        Capability::Physical,
        Capability::Documents,
        Capability::Team,
        Capability::Settings,
        Capability::Analytics,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::Financial => "financial",
            Capability::Physical => "physical",
            Capability::Documents => "documents",
            Capability::Team => "team",
            Capability::Settings => "settings",
            Capability::Analytics => "analytics",
        }
    }

    pub(crate) const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability: {0}")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str() == normalized)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// Opaque identity of an actor, as issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Blank ids carry no team context. Anything else is kept verbatim.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.filter(|s| !s.trim().is_empty()).map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_text_form_round_trips() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!(" Broker_Agent ".parse::<Role>(), Ok(Role::BrokerAgent));
        assert!("super_admin".parse::<Role>().is_err());
    }

    #[test]
    fn all_lists_roles_in_index_order() {
        for (i, role) in Role::ALL.into_iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }

    #[test]
    fn owner_and_admin_predicates() {
        assert!(Role::Owner.is_owner());
        assert!(!Role::Admin.is_owner());
        assert!(Role::Owner.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Lender.is_admin());
        assert!(!Role::Member.is_admin());
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::BrokerAgent).unwrap();
        assert_eq!(json, "\"broker_agent\"");
    }

    #[test]
    fn blank_team_id_is_absent() {
        assert_eq!(TeamId::parse(None), None);
        assert_eq!(TeamId::parse(Some("   ")), None);
        assert_eq!(TeamId::parse(Some("T1")), Some(TeamId::new("T1")));
    }

    #[test]
    fn team_id_is_kept_verbatim() {
        assert_eq!(TeamId::parse(Some("t1 ")), Some(TeamId::new("t1 ")));
        assert_ne!(TeamId::parse(Some(" t1")), Some(TeamId::new("t1")));
    }
}
