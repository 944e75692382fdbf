//! Role hierarchy.
//!
//! Roles form a closed, totally ordered set: `user < manager < admin`.
//! Comparisons always go through [`Role::rank`], never through the textual
//! form, so "at least manager" checks stay monotone.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capability tier of a signed-in user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Manager,
    Admin,
}

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Role; 3] = [Role::User, Role::Manager, Role::Admin];

    /// Role assumed when no record exists or the lookup fails.
    pub const DEFAULT: Role = Role::User;

    pub fn rank(self) -> u8 {
        match self {
            Role::User => 1,
            Role::Manager => 2,
            Role::Admin => 3,
        }
    }

    /// True iff this role ranks at or above `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    /// Parses a role record as stored by the role store (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}

/// The role a guarded UI region demands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleRequirement(Role);

impl RoleRequirement {
    pub fn new(required: Role) -> Self {
        Self(required)
    }

    pub fn role(&self) -> Role {
        self.0
    }

    /// An unresolved role never satisfies a requirement.
    pub fn is_satisfied_by(&self, resolved: Option<Role>) -> bool {
        resolved.is_some_and(|role| role.satisfies(self.0))
    }
}

impl From<Role> for RoleRequirement {
    fn from(value: Role) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ranks_follow_hierarchy() {
        assert_eq!(Role::User.rank(), 1);
        assert_eq!(Role::Manager.rank(), 2);
        assert_eq!(Role::Admin.rank(), 3);
        assert!(Role::User < Role::Manager && Role::Manager < Role::Admin);
    }

    #[test]
    fn parses_store_records() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Manager ".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert_eq!(
            "owner".parse::<Role>().unwrap_err(),
            RoleParseError("owner".to_string())
        );
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn unresolved_role_satisfies_nothing() {
        for required in Role::ALL {
            assert!(!RoleRequirement::new(required).is_satisfied_by(None));
        }
    }

    #[test]
    fn default_is_minimum_privilege() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::ALL.iter().min(), Some(&Role::DEFAULT));
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: if a resolved role satisfies R, it satisfies every R' ranked at or below R.
        #[test]
        fn satisfaction_is_monotone(
            resolved in any_role(),
            required in any_role(),
            lower in any_role(),
        ) {
            let req = RoleRequirement::new(required);
            if req.is_satisfied_by(Some(resolved)) && lower.rank() <= required.rank() {
                prop_assert!(RoleRequirement::new(lower).is_satisfied_by(Some(resolved)));
            }
        }
    }
}
