use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an isolated customer/organization partition. All cached
/// collections are tenant-scoped except user identity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TenantId(i32);

impl TenantId {
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for TenantId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_id_from_i32() {
        let tenant_id = TenantId::from(42);

        assert_eq!(tenant_id.value(), 42);
    }

    #[test]
    fn tenant_id_display_matches_value() {
        let tenant_id = TenantId::new(7);

        assert_eq!(tenant_id.to_string(), "7");
    }

    #[test]
    fn tenant_id_hash_consistent_with_equality() {
        use std::collections::HashSet;

        let a = TenantId::new(3);
        let b = TenantId::new(3);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn tenant_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&TenantId::new(101)).unwrap();

        assert_eq!(json, "101");
    }
}
