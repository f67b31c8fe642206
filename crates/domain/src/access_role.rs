use std::fmt::{Display, Formatter};
use std::str::FromStr;

use classgate_core::AppError;
use serde::{Deserialize, Serialize};

/// Ordered access level carried by grants and minimum-role queries.
///
/// Variant order is the authority order: `Viewer < Editor < Manager < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessRole {
    /// Read-only access.
    Viewer,
    /// Read and edit access.
    Editor,
    /// Management access.
    Manager,
    /// Full administrative access.
    Admin,
}

impl AccessRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "VIEWER",
            Self::Editor => "EDITOR",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }

    /// Returns the numeric priority of the role, starting at 1 for viewers.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::Viewer => 1,
            Self::Editor => 2,
            Self::Manager => 3,
            Self::Admin => 4,
        }
    }

    /// Returns whether this role meets the requested minimum role.
    #[must_use]
    pub fn satisfies(&self, minimum: Self) -> bool {
        *self >= minimum
    }

    /// Returns all roles from lowest to highest.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AccessRole] = &[
            AccessRole::Viewer,
            AccessRole::Editor,
            AccessRole::Manager,
            AccessRole::Admin,
        ];

        ALL
    }

    /// Parses a transport value, ignoring ASCII case.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AppError::Validation(format!("unknown access role '{value}'")))
    }
}

impl FromStr for AccessRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "VIEWER" => Ok(Self::Viewer),
            "EDITOR" => Ok(Self::Editor),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown access role '{value}'"
            ))),
        }
    }
}

impl Display for AccessRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::AccessRole;

    fn any_role() -> impl Strategy<Value = AccessRole> {
        prop::sample::select(AccessRole::all().to_vec())
    }

    #[test]
    fn roles_are_ordered_by_authority() {
        assert!(AccessRole::Viewer < AccessRole::Editor);
        assert!(AccessRole::Editor < AccessRole::Manager);
        assert!(AccessRole::Manager < AccessRole::Admin);
    }

    #[test]
    fn storage_value_roundtrips() {
        for role in AccessRole::all() {
            let restored = AccessRole::from_str(role.as_str());
            assert_eq!(restored.ok(), Some(*role));
        }
    }

    #[test]
    fn transport_parsing_ignores_case() {
        assert_eq!(
            AccessRole::from_transport(" editor ").ok(),
            Some(AccessRole::Editor)
        );
        assert!(AccessRole::from_transport("owner").is_err());
    }

    #[test]
    fn storage_parsing_is_strict() {
        assert!(AccessRole::from_str("admin").is_err());
    }

    proptest! {
        #[test]
        fn priority_agrees_with_ordering(left in any_role(), right in any_role()) {
            prop_assert_eq!(left.cmp(&right), left.priority().cmp(&right.priority()));
        }

        #[test]
        fn satisfies_is_monotonic(role in any_role(), low in any_role(), high in any_role()) {
            prop_assume!(low <= high);
            if role.satisfies(high) {
                prop_assert!(role.satisfies(low));
            }
        }
    }
}
