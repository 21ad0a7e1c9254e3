//! Component property strings
//!
//! Component annotations declare properties as `name[:Type]=value` strings.
//! Several strings may share a name; they become one multi-valued property.

use crate::error::DescriptorError;
use serde::{Deserialize, Serialize};

/// Platform line separator used to join multi-valued properties.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// One property declaration as written on the annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentProperty {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub value: String,
}

impl ComponentProperty {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            value: value.into(),
        }
    }

    pub fn typed(name: impl Into<String>, kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind.into()),
            value: value.into(),
        }
    }

    /// Parse `name[:Type]=value`. The value is kept verbatim; name and type
    /// are trimmed.
    pub fn parse(declaration: &str) -> Result<Self, DescriptorError> {
        let (head, value) = declaration
            .split_once('=')
            .ok_or_else(|| DescriptorError::InvalidProperty(declaration.to_string()))?;

        let (name, kind) = match head.split_once(':') {
            Some((name, kind)) => (name.trim(), Some(kind.trim())),
            None => (head.trim(), None),
        };

        if name.is_empty() || kind.is_some_and(str::is_empty) {
            return Err(DescriptorError::InvalidProperty(declaration.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            kind: kind.map(str::to_string),
            value: value.to_string(),
        })
    }
}

/// All declarations sharing one property name, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyGroup {
    pub name: String,
    pub entries: Vec<ComponentProperty>,
}

/// Group declarations by name, preserving first-appearance order.
pub fn group_by_name(properties: impl IntoIterator<Item = ComponentProperty>) -> Vec<PropertyGroup> {
    let mut groups: Vec<PropertyGroup> = Vec::new();
    for property in properties {
        match groups.iter_mut().find(|g| g.name == property.name) {
            Some(group) => group.entries.push(property),
            None => groups.push(PropertyGroup {
                name: property.name.clone(),
                entries: vec![property],
            }),
        }
    }
    groups
}

/// Multi-value body: starts with the separator, each value followed by one.
pub fn aggregate_values<'a>(values: impl IntoIterator<Item = &'a str>, separator: &str) -> String {
    let mut body = String::from(separator);
    for value in values {
        body.push_str(value);
        body.push_str(separator);
    }
    body
}
