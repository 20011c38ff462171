//! Property-based test generators using proptest.
//!
//! The value pools are deliberately small so generated rules collide often
//! enough to exercise duplicate handling.

use proptest::prelude::*;
use rulesync_model::{AttributeCondition, AttributeRule, Rule};

/// Strategy for generating an optional short string.
fn small_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::string::string_regex("[a-c]{0,2}").expect("Invalid regex"))
}

/// Strategy for generating attribute conditions.
pub fn condition_strategy() -> impl Strategy<Value = AttributeCondition> {
    (
        prop::sample::select(vec!["HOST_NAME", "SERVICE_NAME", "HOST_TAGS"]),
        prop::sample::select(vec!["EQUALS", "BEGINS_WITH", "EXISTS"]),
        prop::option::of(any::<bool>()),
        small_text(),
        small_text(),
        prop::option::of(-2i64..2),
    )
        .prop_map(|(key, operator, case_sensitive, string_value, tag, integer_value)| {
            let mut condition = AttributeCondition::new(key, operator);
            condition.case_sensitive = case_sensitive;
            condition.string_value = string_value;
            condition.tag = tag;
            condition.integer_value = integer_value;
            condition
        })
}

/// Strategy for generating attribute rules.
pub fn attribute_rule_strategy() -> impl Strategy<Value = AttributeRule> {
    (
        prop::sample::select(vec!["HOST", "SERVICE", "PROCESS_GROUP"]),
        prop::option::of(prop::collection::vec(condition_strategy(), 0..3)),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(entity_type, conditions, host_to_pg, pg_to_host)| {
            let mut attr = AttributeRule::new(entity_type);
            attr.conditions = conditions;
            attr.host_to_pg_propagation = host_to_pg;
            attr.pg_to_host_propagation = pg_to_host;
            attr
        })
}

/// Strategy for generating rules.
pub fn rule_strategy() -> impl Strategy<Value = Rule> {
    (
        prop::sample::select(vec!["ME", "SELECTOR"]),
        any::<bool>(),
        small_text(),
        small_text(),
        prop::option::of(attribute_rule_strategy()),
    )
        .prop_map(|(kind, enabled, selector, format, attribute_rule)| {
            let mut rule = Rule::new(kind, enabled);
            rule.entity_selector = selector;
            rule.value_format = format;
            rule.attribute_rule = attribute_rule;
            rule
        })
}

/// Strategy for generating a list of rules.
pub fn rules_strategy(max_len: usize) -> impl Strategy<Value = Vec<Rule>> {
    prop::collection::vec(rule_strategy(), 0..=max_len)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesync_model::StructuralEq;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_rules_equal_their_clones(rule in rule_strategy()) {
            prop_assert!(rule.structurally_eq(&rule.clone()));
        }

        #[test]
        fn generated_conditions_have_required_fields(condition in condition_strategy()) {
            prop_assert!(!condition.key.is_empty());
            prop_assert!(!condition.operator.is_empty());
        }

        #[test]
        fn rules_strategy_respects_length(rules in rules_strategy(4)) {
            prop_assert!(rules.len() <= 4);
        }
    }
}
