//! The auto-tag rule element and its nested value types.
//!
//! Field names follow the remote settings schema on the wire (camelCase,
//! absent optionals omitted). Equality is not derived; see
//! [`crate::StructuralEq`].

use serde::{Deserialize, Serialize};

/// Normalization applied when the remote schema omits one.
pub const DEFAULT_VALUE_NORMALIZATION: &str = "Leave text as-is";

fn default_value_normalization() -> String {
    DEFAULT_VALUE_NORMALIZATION.to_string()
}

/// One auto-tag rule: a single element of the shared rule list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Rule kind (`ME`, `SELECTOR`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the rule is enabled.
    pub enabled: bool,
    /// How extracted tag values are normalized.
    #[serde(default = "default_value_normalization")]
    pub value_normalization: String,
    /// Entity selector, for selector-based rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_selector: Option<String>,
    /// Optional tag value format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_format: Option<String>,
    /// Attribute-based matching, for `ME` rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_rule: Option<AttributeRule>,
}

impl Rule {
    /// Creates a rule with the given kind and enablement and no optional
    /// attributes.
    pub fn new(kind: impl Into<String>, enabled: bool) -> Self {
        Self {
            kind: kind.into(),
            enabled,
            value_normalization: default_value_normalization(),
            entity_selector: None,
            value_format: None,
            attribute_rule: None,
        }
    }

    /// Sets the entity selector.
    pub fn with_entity_selector(mut self, selector: impl Into<String>) -> Self {
        self.entity_selector = Some(selector.into());
        self
    }

    /// Sets the value format.
    pub fn with_value_format(mut self, format: impl Into<String>) -> Self {
        self.value_format = Some(format.into());
        self
    }

    /// Sets the value normalization.
    pub fn with_value_normalization(mut self, normalization: impl Into<String>) -> Self {
        self.value_normalization = normalization.into();
        self
    }

    /// Sets the attribute rule.
    pub fn with_attribute_rule(mut self, rule: AttributeRule) -> Self {
        self.attribute_rule = Some(rule);
        self
    }
}

/// Attribute-based matching for a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRule {
    /// Entity type the conditions apply to.
    pub entity_type: String,
    /// Conditions that must all hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<AttributeCondition>>,
    /// Propagate from Azure to process groups.
    #[serde(
        rename = "azureToPGPropagation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub azure_to_pg_propagation: Option<bool>,
    /// Propagate from Azure to services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_to_service_propagation: Option<bool>,
    /// Propagate from hosts to process groups.
    #[serde(
        rename = "hostToPGPropagation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub host_to_pg_propagation: Option<bool>,
    /// Propagate from process groups to hosts.
    #[serde(
        rename = "pgToHostPropagation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pg_to_host_propagation: Option<bool>,
    /// Propagate from process groups to services.
    #[serde(
        rename = "pgToServicePropagation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pg_to_service_propagation: Option<bool>,
    /// Propagate from services to hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_to_host_propagation: Option<bool>,
    /// Propagate from services to process groups.
    #[serde(
        rename = "serviceToPGPropagation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_to_pg_propagation: Option<bool>,
}

impl AttributeRule {
    /// Creates an attribute rule for the given entity type with no
    /// conditions and all propagation flags unset.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            conditions: None,
            azure_to_pg_propagation: None,
            azure_to_service_propagation: None,
            host_to_pg_propagation: None,
            pg_to_host_propagation: None,
            pg_to_service_propagation: None,
            service_to_host_propagation: None,
            service_to_pg_propagation: None,
        }
    }

    /// Appends a condition, creating the condition list if absent.
    pub fn with_condition(mut self, condition: AttributeCondition) -> Self {
        self.conditions.get_or_insert_with(Vec::new).push(condition);
        self
    }
}

/// A single attribute condition inside an [`AttributeRule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeCondition {
    /// Attribute the condition inspects.
    pub key: String,
    /// Comparison operator.
    pub operator: String,
    /// Whether string comparison is case sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    /// Dynamic key, for keyed attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_key: Option<String>,
    /// Source of the dynamic key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_key_source: Option<String>,
    /// Entity id operand.
    #[serde(rename = "entityId", default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Enum operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_value: Option<String>,
    /// Integer operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<i64>,
    /// String operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    /// Tag operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl AttributeCondition {
    /// Creates a condition with no operands.
    pub fn new(key: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            case_sensitive: None,
            dynamic_key: None,
            dynamic_key_source: None,
            entity_id: None,
            enum_value: None,
            integer_value: None,
            string_value: None,
            tag: None,
        }
    }

    /// Sets the string operand.
    pub fn with_string_value(mut self, value: impl Into<String>) -> Self {
        self.string_value = Some(value.into());
        self
    }

    /// Sets the integer operand.
    pub fn with_integer_value(mut self, value: i64) -> Self {
        self.integer_value = Some(value);
        self
    }

    /// Sets the case sensitivity flag.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    /// Sets the tag operand.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}
