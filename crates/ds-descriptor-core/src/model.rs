//! Descriptor value model
//!
//! Plain value types for one service-component descriptor. The rule engine in
//! [`crate::builder`] is the only producer that enforces the component-model
//! invariants; everything here is data plus the string mappings the schema
//! uses for its enumerations.

use serde::{Deserialize, Serialize};

// ── Enumerations ──

/// Value types a component property may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaType {
    String,
    Long,
    Double,
    Float,
    Integer,
    Byte,
    Character,
    Boolean,
    Short,
}

impl JavaType {
    pub const ALL: [JavaType; 9] = [
        JavaType::String,
        JavaType::Long,
        JavaType::Double,
        JavaType::Float,
        JavaType::Integer,
        JavaType::Byte,
        JavaType::Character,
        JavaType::Boolean,
        JavaType::Short,
    ];

    /// Schema spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JavaType::String => "String",
            JavaType::Long => "Long",
            JavaType::Double => "Double",
            JavaType::Float => "Float",
            JavaType::Integer => "Integer",
            JavaType::Byte => "Byte",
            JavaType::Character => "Character",
            JavaType::Boolean => "Boolean",
            JavaType::Short => "Short",
        }
    }

    /// Exact (case-sensitive) lookup, as the schema defines the values.
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationPolicy {
    Optional,
    Require,
    Ignore,
}

impl ConfigurationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationPolicy::Optional => "optional",
            ConfigurationPolicy::Require => "require",
            ConfigurationPolicy::Ignore => "ignore",
        }
    }

    /// Case-insensitive lookup.
    pub fn from_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "optional" => Some(ConfigurationPolicy::Optional),
            "require" => Some(ConfigurationPolicy::Require),
            "ignore" => Some(ConfigurationPolicy::Ignore),
            _ => None,
        }
    }
}

/// Reference cardinality. The schema spells it `0..1`, `1..1`, `0..n`, `1..n`;
/// annotations use the aliases `optional`, `mandatory`, `multiple`,
/// `at_least_one`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "0..1")]
    Optional,
    #[serde(rename = "1..1")]
    Mandatory,
    #[serde(rename = "0..n")]
    Multiple,
    #[serde(rename = "1..n")]
    AtLeastOne,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Optional => "0..1",
            Cardinality::Mandatory => "1..1",
            Cardinality::Multiple => "0..n",
            Cardinality::AtLeastOne => "1..n",
        }
    }

    /// Schema value lookup (`0..1` etc.).
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "0..1" => Some(Cardinality::Optional),
            "1..1" => Some(Cardinality::Mandatory),
            "0..n" => Some(Cardinality::Multiple),
            "1..n" => Some(Cardinality::AtLeastOne),
            _ => None,
        }
    }

    /// Annotation alias lookup, case-insensitive.
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias.to_ascii_lowercase().as_str() {
            "at_least_one" => Some(Cardinality::AtLeastOne),
            "optional" => Some(Cardinality::Optional),
            "mandatory" => Some(Cardinality::Mandatory),
            "multiple" => Some(Cardinality::Multiple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Static,
    Dynamic,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Static => "static",
            Policy::Dynamic => "dynamic",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "static" => Some(Policy::Static),
            "dynamic" => Some(Policy::Dynamic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyOption {
    Reluctant,
    Greedy,
}

impl PolicyOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyOption::Reluctant => "reluctant",
            PolicyOption::Greedy => "greedy",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "reluctant" => Some(PolicyOption::Reluctant),
            "greedy" => Some(PolicyOption::Greedy),
            _ => None,
        }
    }
}

// ── Service ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_factory: Option<bool>,
    #[serde(default)]
    pub provide: Vec<String>,
}

// ── Properties ──

/// A `property` value: one literal, or the aggregated multi-line body used
/// when several annotation entries share a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", content = "text", rename_all = "lowercase")]
pub enum PropertyValue {
    Single(String),
    Multi(String),
}

impl PropertyValue {
    /// Individual values. A multi-line body is split on line breaks and
    /// blank lines are dropped.
    pub fn values(&self) -> Vec<&str> {
        match self {
            PropertyValue::Single(v) => vec![v.as_str()],
            PropertyValue::Multi(body) => body
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<JavaType>,
    pub value: PropertyValue,
}

/// One entry of the ordered `property`/`properties` sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum PropertyEntry {
    Property(Property),
    Properties { entry: String },
}

// ── Reference ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub interface: String,
    pub bind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unbind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_option: Option<PolicyOption>,
}

impl Reference {
    /// A reference with only the mandatory fields filled in.
    pub fn new(
        name: impl Into<String>,
        interface: impl Into<String>,
        bind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            interface: interface.into(),
            bind: bind.into(),
            unbind: None,
            updated: None,
            target: None,
            cardinality: None,
            policy: None,
            policy_option: None,
        }
    }
}

// ── Descriptor ──

/// The root entity: one component declaration.
///
/// `None` means "not set" and lets the runtime apply the schema default; an
/// empty string is a set value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_policy: Option<ConfigurationPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the descriptor: the implementation class.
    pub fn identity(&self) -> Option<&str> {
        self.implementation_class.as_deref()
    }

    /// Effective component name: the explicit name, else the implementation class.
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.implementation_class.as_deref())
    }

    /// Interfaces listed under `service/provide`, in order.
    pub fn provided_interfaces(&self) -> &[String] {
        self.service
            .as_ref()
            .map(|s| s.provide.as_slice())
            .unwrap_or_default()
    }

    /// Look up a reference by name.
    pub fn reference(&self, name: &str) -> Option<&Reference> {
        self.references.iter().find(|r| r.name == name)
    }

    /// Look up a `property` entry by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find_map(|entry| match entry {
            PropertyEntry::Property(p) if p.name == name => Some(p),
            _ => None,
        })
    }
}
