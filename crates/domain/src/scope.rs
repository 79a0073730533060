use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Ownership restriction attached to a grant scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipMode {
    /// No ownership restriction.
    #[default]
    All,
    /// The resource owner must be the acting user.
    Owned,
    /// The resource assignee or owner must be the acting user.
    Assigned,
}

impl OwnershipMode {
    /// Returns a stable storage value for this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Owned => "owned",
            Self::Assigned => "assigned",
        }
    }
}

impl std::str::FromStr for OwnershipMode {
    type Err = tessera_core::AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Self::All),
            "owned" => Ok(Self::Owned),
            "assigned" => Ok(Self::Assigned),
            _ => Err(tessera_core::AppError::Validation(format!(
                "unknown ownership mode '{value}'"
            ))),
        }
    }
}

/// Restriction narrowing a grant to resources matching ownership, tag and
/// category conditions.
///
/// An absent tag or category list means "unrestricted" along that dimension.
/// A present-but-empty list is a vacuous restriction and is treated the same
/// way: it never denies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Ownership restriction; `All` removes the restriction.
    #[serde(default)]
    pub ownership: OwnershipMode,
    /// Tags the resource must intersect with, when defined and non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    /// Categories the resource must belong to, when defined and non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeSet<String>>,
}

impl Scope {
    /// Creates a scope with no restrictions.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Creates a scope restricted only by ownership mode.
    #[must_use]
    pub fn with_ownership(ownership: OwnershipMode) -> Self {
        Self {
            ownership,
            tags: None,
            categories: None,
        }
    }

    /// Merges two group-grant scopes, keeping the most permissive result.
    ///
    /// Ownership: `All` on either side wins; otherwise the narrower of the two
    /// modes is kept, ties resolved in favor of `self`. Tags and categories:
    /// union when both sides restrict, unrestricted when either side is
    /// unrestricted, so one unrestricted group always widens access.
    #[must_use]
    pub fn merge_with(&self, other: &Scope) -> Scope {
        let ownership = match (self.ownership, other.ownership) {
            (OwnershipMode::All, _) | (_, OwnershipMode::All) => OwnershipMode::All,
            (left, right) if left == right => left,
            (OwnershipMode::Owned, _) | (_, OwnershipMode::Owned) => OwnershipMode::Owned,
            (left, _) => left,
        };

        Scope {
            ownership,
            tags: merge_restriction(self.tags.as_ref(), other.tags.as_ref()),
            categories: merge_restriction(self.categories.as_ref(), other.categories.as_ref()),
        }
    }

    /// Evaluates this scope against a concrete resource instance.
    ///
    /// All three dimensions are ANDed; any failing check fails the whole
    /// evaluation. Context attributes the caller did not supply are not
    /// checked.
    #[must_use]
    pub fn permits(&self, context: &ResourceContext, user_id: &str) -> bool {
        self.permits_ownership(context, user_id)
            && self.permits_tags(context)
            && self.permits_category(context)
    }

    fn permits_ownership(&self, context: &ResourceContext, user_id: &str) -> bool {
        match self.ownership {
            OwnershipMode::All => true,
            OwnershipMode::Owned => context
                .owner_id
                .as_deref()
                .is_none_or(|owner| owner == user_id),
            OwnershipMode::Assigned => {
                let owner_differs = context
                    .owner_id
                    .as_deref()
                    .is_some_and(|owner| owner != user_id);
                let assignee_differs = context
                    .assigned_to
                    .as_deref()
                    .is_some_and(|assignee| assignee != user_id);

                // The owner always passes an assignment check.
                !(owner_differs && assignee_differs)
            }
        }
    }

    fn permits_tags(&self, context: &ResourceContext) -> bool {
        let Some(required) = self.tags.as_ref().filter(|tags| !tags.is_empty()) else {
            return true;
        };
        let Some(present) = context.tags.as_ref() else {
            return true;
        };

        required.intersection(present).next().is_some()
    }

    fn permits_category(&self, context: &ResourceContext) -> bool {
        let Some(allowed) = self
            .categories
            .as_ref()
            .filter(|categories| !categories.is_empty())
        else {
            return true;
        };
        let Some(category) = context.category.as_deref() else {
            return true;
        };

        allowed.contains(category)
    }
}

// A vacuous empty restriction behaves as unrestricted, and an unrestricted
// side always widens the merge result to unrestricted.
fn merge_restriction(
    left: Option<&BTreeSet<String>>,
    right: Option<&BTreeSet<String>>,
) -> Option<BTreeSet<String>> {
    let left = left.filter(|values| !values.is_empty());
    let right = right.filter(|values| !values.is_empty());

    match (left, right) {
        (Some(left), Some(right)) => Some(left.union(right).cloned().collect()),
        _ => None,
    }
}

/// Concrete resource attributes supplied when evaluating a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    /// Stable identifier of the resource instance.
    pub entity_id: Option<String>,
    /// Owning user, when the entity tracks ownership.
    pub owner_id: Option<String>,
    /// Assigned user, when the entity tracks assignment.
    pub assigned_to: Option<String>,
    /// Tags attached to the resource instance.
    pub tags: Option<BTreeSet<String>>,
    /// Category of the resource instance.
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::{OwnershipMode, ResourceContext, Scope};

    fn tags(values: &[&str]) -> Option<BTreeSet<String>> {
        Some(values.iter().map(|value| (*value).to_owned()).collect())
    }

    #[test]
    fn merge_prefers_all_ownership() {
        let merged = Scope::with_ownership(OwnershipMode::Owned)
            .merge_with(&Scope::with_ownership(OwnershipMode::All));
        assert_eq!(merged.ownership, OwnershipMode::All);
    }

    #[test]
    fn merge_keeps_narrower_ownership_when_neither_is_all() {
        let merged = Scope::with_ownership(OwnershipMode::Assigned)
            .merge_with(&Scope::with_ownership(OwnershipMode::Owned));
        assert_eq!(merged.ownership, OwnershipMode::Owned);
    }

    #[test]
    fn merge_unions_tags_when_both_sides_restrict() {
        let left = Scope {
            tags: tags(&["pci"]),
            ..Scope::unrestricted()
        };
        let right = Scope {
            tags: tags(&["soc2"]),
            ..Scope::unrestricted()
        };

        assert_eq!(left.merge_with(&right).tags, tags(&["pci", "soc2"]));
    }

    #[test]
    fn merge_widens_tags_when_either_side_is_unrestricted() {
        let restricted = Scope {
            tags: tags(&["pci"]),
            ..Scope::unrestricted()
        };

        assert_eq!(restricted.merge_with(&Scope::unrestricted()).tags, None);
        assert_eq!(Scope::unrestricted().merge_with(&restricted).tags, None);
    }

    #[test]
    fn merge_treats_vacuous_empty_tags_as_unrestricted() {
        let vacuous = Scope {
            tags: tags(&[]),
            ..Scope::unrestricted()
        };
        let restricted = Scope {
            tags: tags(&["pci"]),
            ..Scope::unrestricted()
        };

        assert_eq!(vacuous.merge_with(&restricted).tags, None);
    }

    #[test]
    fn owned_scope_rejects_foreign_owner() {
        let scope = Scope::with_ownership(OwnershipMode::Owned);
        let context = ResourceContext {
            owner_id: Some("someone-else".to_owned()),
            ..ResourceContext::default()
        };

        assert!(!scope.permits(&context, "u1"));
    }

    #[test]
    fn owned_scope_passes_when_owner_is_unknown() {
        let scope = Scope::with_ownership(OwnershipMode::Owned);
        assert!(scope.permits(&ResourceContext::default(), "u1"));
    }

    #[test]
    fn assigned_scope_passes_for_owner_with_foreign_assignee() {
        let scope = Scope::with_ownership(OwnershipMode::Assigned);
        let context = ResourceContext {
            owner_id: Some("u1".to_owned()),
            assigned_to: Some("someone-else".to_owned()),
            ..ResourceContext::default()
        };

        assert!(scope.permits(&context, "u1"));
    }

    #[test]
    fn assigned_scope_rejects_when_both_owner_and_assignee_differ() {
        let scope = Scope::with_ownership(OwnershipMode::Assigned);
        let context = ResourceContext {
            owner_id: Some("owner".to_owned()),
            assigned_to: Some("assignee".to_owned()),
            ..ResourceContext::default()
        };

        assert!(!scope.permits(&context, "u1"));
    }

    #[test]
    fn tag_scope_requires_an_intersection() {
        let scope = Scope {
            tags: tags(&["pci", "hipaa"]),
            ..Scope::unrestricted()
        };
        let matching = ResourceContext {
            tags: tags(&["pci", "internal"]),
            ..ResourceContext::default()
        };
        let disjoint = ResourceContext {
            tags: tags(&["internal"]),
            ..ResourceContext::default()
        };

        assert!(scope.permits(&matching, "u1"));
        assert!(!scope.permits(&disjoint, "u1"));
    }

    #[test]
    fn tag_scope_is_skipped_when_context_has_no_tags() {
        let scope = Scope {
            tags: tags(&["pci"]),
            ..Scope::unrestricted()
        };

        assert!(scope.permits(&ResourceContext::default(), "u1"));
    }

    #[test]
    fn vacuous_empty_tag_scope_never_restricts() {
        let scope = Scope {
            tags: tags(&[]),
            ..Scope::unrestricted()
        };
        let context = ResourceContext {
            tags: tags(&["anything"]),
            ..ResourceContext::default()
        };

        assert!(scope.permits(&context, "u1"));
        assert!(scope.permits(&ResourceContext::default(), "u1"));
    }

    #[test]
    fn category_scope_requires_membership() {
        let scope = Scope {
            categories: tags(&["operational"]),
            ..Scope::unrestricted()
        };
        let matching = ResourceContext {
            category: Some("operational".to_owned()),
            ..ResourceContext::default()
        };
        let foreign = ResourceContext {
            category: Some("financial".to_owned()),
            ..ResourceContext::default()
        };

        assert!(scope.permits(&matching, "u1"));
        assert!(!scope.permits(&foreign, "u1"));
    }

    #[test]
    fn scope_deserializes_with_missing_fields_as_unrestricted() {
        let scope: Scope = match serde_json::from_str("{}") {
            Ok(scope) => scope,
            Err(error) => panic!("scope should deserialize from empty object: {error}"),
        };

        assert_eq!(scope, Scope::unrestricted());
    }

    fn arbitrary_ownership() -> impl Strategy<Value = OwnershipMode> {
        prop_oneof![
            Just(OwnershipMode::All),
            Just(OwnershipMode::Owned),
            Just(OwnershipMode::Assigned),
        ]
    }

    fn arbitrary_scope() -> impl Strategy<Value = Scope> {
        (
            arbitrary_ownership(),
            proptest::option::of(proptest::collection::btree_set("[a-z]{1,6}", 0..4)),
            proptest::option::of(proptest::collection::btree_set("[a-z]{1,6}", 0..4)),
        )
            .prop_map(|(ownership, tags, categories)| Scope {
                ownership,
                tags,
                categories,
            })
    }

    proptest! {
        #[test]
        fn merge_with_all_side_always_clears_ownership(scope in arbitrary_scope()) {
            let merged = scope.merge_with(&Scope::unrestricted());
            prop_assert_eq!(merged.ownership, OwnershipMode::All);
        }

        #[test]
        fn merge_with_unrestricted_side_clears_tag_and_category_limits(scope in arbitrary_scope()) {
            let merged = scope.merge_with(&Scope::unrestricted());
            prop_assert_eq!(merged.tags, None);
            prop_assert_eq!(merged.categories, None);
        }

        #[test]
        fn merge_with_unrestricted_side_permits_any_context(
            scope in arbitrary_scope(),
            owner in proptest::option::of("[a-z]{1,4}"),
            tag in proptest::option::of("[a-z]{1,6}"),
        ) {
            let context = ResourceContext {
                owner_id: owner,
                tags: tag.map(|value| std::iter::once(value).collect()),
                ..ResourceContext::default()
            };
            let merged = scope.merge_with(&Scope::unrestricted());

            prop_assert!(merged.permits(&context, "u1"));
        }
    }
}
