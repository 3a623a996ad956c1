use std::fmt;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use super::role::{Capability, Role};

/// Set of capabilities, stored as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const EMPTY: CapabilitySet = CapabilitySet(0);
    pub const ALL: CapabilitySet = CapabilitySet::of(&Capability::ALL);

    pub const fn of(caps: &[Capability]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < caps.len() {
            bits |= caps[i].bit();
            i += 1;
        }
        CapabilitySet(bits)
    }

    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_subset(self, other: CapabilitySet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |cap| self.contains(*cap))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::EMPTY;
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for cap in self.iter() {
            seq.serialize_element(&cap)?;
        }
        seq.end()
    }
}

/// Total mapping from every [`Role`] to the capabilities it may exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionMatrix {
    entries: [CapabilitySet; Role::ALL.len()],
}

/// The matrix the application ships with.
pub static STANDARD_MATRIX: PermissionMatrix = PermissionMatrix::standard();

const fn standard_entry(role: Role) -> CapabilitySet {
    use Capability::*;

    match role {
        Role::Owner => CapabilitySet::ALL,
        Role::Admin => CapabilitySet::of(&[Physical, Documents, Team, Settings, Analytics]),
        Role::Lender => CapabilitySet::of(&[Financial, Documents, Analytics]),
        Role::Contractor => CapabilitySet::of(&[Physical, Documents]),
        Role::BrokerAgent => CapabilitySet::of(&[Physical, Documents, Analytics]),
        Role::Attorney => CapabilitySet::of(&[Financial, Documents]),
        Role::Inspector => CapabilitySet::of(&[Physical, Documents]),
        Role::Member => CapabilitySet::EMPTY,
    }
}

impl PermissionMatrix {
    pub const fn standard() -> Self {
        let mut entries = [CapabilitySet::EMPTY; Role::ALL.len()];
        let mut i = 0;
        while i < Role::ALL.len() {
            let role = Role::ALL[i];
            entries[role.index()] = standard_entry(role);
            i += 1;
        }
        Self { entries }
    }

    /// Builds a matrix from a total function over roles.
    pub fn from_fn(entry: impl Fn(Role) -> CapabilitySet) -> Self {
        let mut entries = [CapabilitySet::EMPTY; Role::ALL.len()];
        for role in Role::ALL {
            entries[role.index()] = entry(role);
        }
        Self { entries }
    }

    pub fn capabilities_for(&self, role: Role) -> CapabilitySet {
        self.entries[role.index()]
    }

    /// Lookup for a role known only by name. Unidentified roles get no capabilities.
    pub fn capabilities_for_name(&self, name: &str) -> CapabilitySet {
        match name.parse::<Role>() {
            Ok(role) => self.capabilities_for(role),
            Err(_) => self.capabilities_for(Role::Member),
        }
    }
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        STANDARD_MATRIX
    }
}

/// Capabilities granted to `role` by the standard matrix.
pub fn capabilities_for(role: Role) -> CapabilitySet {
    STANDARD_MATRIX.capabilities_for(role)
}
