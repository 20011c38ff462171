//! Structural equality for rule elements.
//!
//! Every field participates. Optional scalars are compared strictly
//! (absent never equals present), with one exception class: boolean flags
//! that the remote schema defaults to `false` treat absent as `false`
//! (see [`flag_eq`]). Condition lists compare as multisets.

use crate::rule::{AttributeCondition, AttributeRule, Rule};

/// Field-by-field equality used for all element membership tests.
///
/// Implementations must be reflexive and symmetric.
pub trait StructuralEq {
    /// Returns true if `self` and `other` are the same element.
    fn structurally_eq(&self, other: &Self) -> bool;
}

/// Equality for boolean flags whose remote default is `false`.
///
/// The remote side fills these flags in explicitly when echoing a rule
/// back, so a locally absent flag must match a remote `false`.
pub fn flag_eq(a: Option<bool>, b: Option<bool>) -> bool {
    a.unwrap_or(false) == b.unwrap_or(false)
}

impl<T: StructuralEq> StructuralEq for Option<T> {
    fn structurally_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.structurally_eq(b),
            _ => false,
        }
    }
}

impl<T: StructuralEq> StructuralEq for Vec<T> {
    /// Unordered comparison: every element of `self` is matched to a
    /// distinct element of `other`.
    fn structurally_eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut used = vec![false; other.len()];
        self.iter().all(|a| {
            let slot = other
                .iter()
                .enumerate()
                .position(|(i, b)| !used[i] && a.structurally_eq(b));
            match slot {
                Some(i) => {
                    used[i] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl StructuralEq for String {
    fn structurally_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl StructuralEq for i64 {
    fn structurally_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl StructuralEq for AttributeCondition {
    fn structurally_eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.operator == other.operator
            && flag_eq(self.case_sensitive, other.case_sensitive)
            && self.dynamic_key.structurally_eq(&other.dynamic_key)
            && self
                .dynamic_key_source
                .structurally_eq(&other.dynamic_key_source)
            && self.entity_id.structurally_eq(&other.entity_id)
            && self.enum_value.structurally_eq(&other.enum_value)
            && self.integer_value.structurally_eq(&other.integer_value)
            && self.string_value.structurally_eq(&other.string_value)
            && self.tag.structurally_eq(&other.tag)
    }
}

impl StructuralEq for AttributeRule {
    fn structurally_eq(&self, other: &Self) -> bool {
        self.entity_type == other.entity_type
            && self.conditions.structurally_eq(&other.conditions)
            && flag_eq(self.azure_to_pg_propagation, other.azure_to_pg_propagation)
            && flag_eq(
                self.azure_to_service_propagation,
                other.azure_to_service_propagation,
            )
            && flag_eq(self.host_to_pg_propagation, other.host_to_pg_propagation)
            && flag_eq(self.pg_to_host_propagation, other.pg_to_host_propagation)
            && flag_eq(
                self.pg_to_service_propagation,
                other.pg_to_service_propagation,
            )
            && flag_eq(
                self.service_to_host_propagation,
                other.service_to_host_propagation,
            )
            && flag_eq(
                self.service_to_pg_propagation,
                other.service_to_pg_propagation,
            )
    }
}

impl StructuralEq for Rule {
    fn structurally_eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.enabled == other.enabled
            && self.value_normalization == other.value_normalization
            && self.entity_selector.structurally_eq(&other.entity_selector)
            && self.value_format.structurally_eq(&other.value_format)
            && self.attribute_rule.structurally_eq(&other.attribute_rule)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other)
    }
}

impl PartialEq for AttributeRule {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other)
    }
}

impl PartialEq for AttributeCondition {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_eq(other)
    }
}
