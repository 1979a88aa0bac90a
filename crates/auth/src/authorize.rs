//! Permission evaluation over a cached identity.
//!
//! - No IO
//! - No panics
//! - Roles are evaluated one at a time; permissions are never unioned across
//!   roles for [`PermissionMatch::All`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Identity;

/// How a set of required permissions must be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionMatch {
    /// Some single role must hold every required permission.
    #[default]
    All,
    /// Some role must hold at least one required permission.
    Any,
}

impl PermissionMatch {
    pub fn from_require_all(require_all: bool) -> Self {
        if require_all { Self::All } else { Self::Any }
    }
}

impl core::fmt::Display for PermissionMatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PermissionMatch::All => write!(f, "all"),
            PermissionMatch::Any => write!(f, "any"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated: no current identity")]
    Unauthenticated,

    /// `missing` is what the closest role lacks: for `All`, the role that
    /// covers the most of the requirement; for `Any`, the whole requirement.
    #[error("forbidden: missing {mode} of [{}]", missing.join(", "))]
    Forbidden {
        missing: Vec<String>,
        mode: PermissionMatch,
    },
}

/// Decide whether `identity` satisfies `required` under `mode`.
///
/// - Empty `required` is always satisfied.
/// - An identity without roles satisfies nothing else.
/// - `All`: true iff one role's permissions are a superset of `required`. Two
///   roles that only jointly cover `required` do not satisfy it.
/// - `Any`: true iff some role grants at least one required permission.
pub fn evaluate<P: AsRef<str>>(identity: &Identity, required: &[P], mode: PermissionMatch) -> bool {
    if required.is_empty() {
        return true;
    }

    identity.roles.iter().any(|role| match mode {
        PermissionMatch::All => required.iter().all(|p| role.grants(p.as_ref())),
        PermissionMatch::Any => required.iter().any(|p| role.grants(p.as_ref())),
    })
}

/// [`evaluate`] as a guard, for call sites that propagate with `?`.
pub fn authorize<P: AsRef<str>>(
    identity: Option<&Identity>,
    required: &[P],
    mode: PermissionMatch,
) -> Result<(), AuthzError> {
    if required.is_empty() {
        return Ok(());
    }

    let identity = identity.ok_or(AuthzError::Unauthenticated)?;
    if evaluate(identity, required, mode) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            missing: missing_permissions(identity, required, mode),
            mode,
        })
    }
}

fn missing_permissions<P: AsRef<str>>(identity: &Identity, required: &[P], mode: PermissionMatch) -> Vec<String> {
    let all = || required.iter().map(|p| p.as_ref().to_string()).collect::<Vec<_>>();
    match mode {
        PermissionMatch::Any => all(),
        PermissionMatch::All => identity
            .roles
            .iter()
            .map(|role| {
                required
                    .iter()
                    .map(AsRef::as_ref)
                    .filter(|p| !role.grants(p))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .min_by_key(Vec::len)
            .unwrap_or_else(all),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn identity_with(roles: Vec<Role>) -> Identity {
        roles.into_iter().fold(Identity::new("u1"), Identity::with_role)
    }

    fn admin() -> Role {
        Role::new("r1", "admin", ["read", "write"])
    }

    #[test]
    fn empty_requirement_is_always_satisfied() {
        let nobody = identity_with(vec![]);
        let none: [&str; 0] = [];
        assert!(evaluate(&nobody, &none, PermissionMatch::All));
        assert!(evaluate(&nobody, &none, PermissionMatch::Any));
    }

    #[test]
    fn no_roles_satisfies_nothing() {
        let nobody = identity_with(vec![]);
        assert!(!evaluate(&nobody, &["read"], PermissionMatch::All));
        assert!(!evaluate(&nobody, &["read"], PermissionMatch::Any));
    }

    #[test]
    fn all_requires_single_role_superset() {
        let identity = identity_with(vec![admin()]);
        assert!(evaluate(&identity, &["read", "write"], PermissionMatch::All));
        assert!(!evaluate(&identity, &["read", "delete"], PermissionMatch::All));
    }

    #[test]
    fn all_does_not_union_across_roles() {
        let identity = identity_with(vec![
            Role::new("r1", "reader", ["read"]),
            Role::new("r2", "writer", ["write"]),
        ]);

        assert!(!evaluate(&identity, &["read", "write"], PermissionMatch::All));
        assert!(evaluate(&identity, &["read", "write"], PermissionMatch::Any));
    }

    #[test]
    fn comparison_is_exact() {
        let identity = identity_with(vec![admin()]);
        assert!(!evaluate(&identity, &["READ"], PermissionMatch::Any));
        assert!(!evaluate(&identity, &["read "], PermissionMatch::Any));
    }

    #[test]
    fn authorize_reports_unauthenticated_and_forbidden() {
        assert_eq!(
            authorize(None, &["read"], PermissionMatch::All),
            Err(AuthzError::Unauthenticated)
        );

        let identity = identity_with(vec![admin()]);
        let err = authorize(Some(&identity), &["delete"], PermissionMatch::Any).unwrap_err();
        assert_eq!(err.to_string(), "forbidden: missing any of [delete]");

        assert!(authorize(Some(&identity), &["write"], PermissionMatch::All).is_ok());
    }

    #[test]
    fn forbidden_lists_what_the_closest_role_lacks() {
        let identity = identity_with(vec![
            Role::new("r1", "reader", ["read"]),
            Role::new("r2", "editor", ["read", "write"]),
        ]);

        let err = authorize(Some(&identity), &["read", "write", "delete"], PermissionMatch::All).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                missing: vec!["delete".to_string()],
                mode: PermissionMatch::All,
            }
        );

        let nobody = identity_with(vec![]);
        let err = authorize(Some(&nobody), &["read", "write"], PermissionMatch::All).unwrap_err();
        assert_eq!(err.to_string(), "forbidden: missing all of [read, write]");
    }

    mod proptest_tests {
        use super::*;
        use proptest::collection::{btree_set, vec};
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn perm() -> impl Strategy<Value = String> {
            prop::sample::select(vec!["read", "write", "delete", "audit", "admin"]).prop_map(str::to_string)
        }

        fn role_perms() -> impl Strategy<Value = BTreeSet<String>> {
            btree_set(perm(), 0..5)
        }

        fn identity_from(sets: &[BTreeSet<String>]) -> Identity {
            identity_with(
                sets.iter()
                    .enumerate()
                    .map(|(i, perms)| Role::new(format!("r{i}"), format!("role{i}"), perms.iter().cloned()))
                    .collect(),
            )
        }

        proptest! {
            /// Property: no requirement means no restriction.
            #[test]
            fn empty_required_is_true(roles in vec(role_perms(), 0..4), require_all in any::<bool>()) {
                let identity = identity_from(&roles);
                let none: [String; 0] = [];
                prop_assert!(evaluate(&identity, &none, PermissionMatch::from_require_all(require_all)));
            }

            /// Property: a role-less identity is denied any non-empty requirement.
            #[test]
            fn roleless_identity_is_denied(required in btree_set(perm(), 1..4), require_all in any::<bool>()) {
                let identity = identity_from(&[]);
                let required: Vec<String> = required.into_iter().collect();
                prop_assert!(!evaluate(&identity, &required, PermissionMatch::from_require_all(require_all)));
            }

            /// Property: All holds iff some single role covers the requirement.
            #[test]
            fn all_matches_per_role_superset(roles in vec(role_perms(), 0..4), required in btree_set(perm(), 1..4)) {
                let identity = identity_from(&roles);
                let expected = roles.iter().any(|r| required.is_subset(r));
                let required: Vec<String> = required.into_iter().collect();
                prop_assert_eq!(evaluate(&identity, &required, PermissionMatch::All), expected);
            }

            /// Property: Any holds iff the union of role permissions meets the requirement.
            #[test]
            fn any_matches_union_intersection(roles in vec(role_perms(), 0..4), required in btree_set(perm(), 1..4)) {
                let identity = identity_from(&roles);
                let union: BTreeSet<String> = roles.iter().flatten().cloned().collect();
                let expected = !union.is_disjoint(&required);
                let required: Vec<String> = required.into_iter().collect();
                prop_assert_eq!(evaluate(&identity, &required, PermissionMatch::Any), expected);
            }
        }
    }
}
