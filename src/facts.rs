//! Annotated type facts
//!
//! The input boundary of the builder: a document listing the annotated types
//! of a project, as produced by a host-language front end. YAML and JSON are
//! both accepted.
//!
//! ```yaml
//! types:
//!   - binary_name: de.test.Impl
//!     source: src/de/test/Impl.java
//!     interfaces: [de.test.Api]
//!     component:
//!       immediate: true
//!       property: ["ranking:Integer=10"]
//!     methods:
//!       - name: setLog
//!         parameters: [org.log.Log]
//!         annotations:
//!           - kind: Reference
//!             cardinality: optional
//!       - name: activate
//!         annotations: [{ kind: Activate }]
//! ```

use crate::error::BuildError;
use anyhow::{Context, Result};
use ds_descriptor_core::{MemoryTypeInspector, MethodFacts, TypeFacts};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsDocument {
    #[serde(default)]
    pub types: Vec<AnnotatedType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedType {
    pub binary_name: String,
    /// Source file the type was read from, recorded in the descriptor header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    /// Present only on component classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentAnnotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    /// Parameter types, binary names, in declaration order.
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<MethodAnnotation>,
}

/// Annotation on a method. Anything that is not a lifecycle annotation is
/// kept as `Other` so the unbind checks can still see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MethodAnnotation {
    Activate,
    Deactivate,
    Modified,
    Reference(ReferenceAnnotation),
    Other { name: String },
}

impl MethodAnnotation {
    /// Annotation type name as the type inspector reports it.
    pub fn type_name(&self) -> &str {
        match self {
            MethodAnnotation::Activate => "Activate",
            MethodAnnotation::Deactivate => "Deactivate",
            MethodAnnotation::Modified => "Modified",
            MethodAnnotation::Reference(_) => "Reference",
            MethodAnnotation::Other { name } => name,
        }
    }
}

/// Attributes of a reference annotation. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceAnnotation {
    pub service: Option<String>,
    pub name: Option<String>,
    pub cardinality: Option<String>,
    pub policy: Option<String>,
    #[serde(alias = "policyOption")]
    pub policy_option: Option<String>,
    pub unbind: Option<String>,
    pub updated: Option<String>,
    pub target: Option<String>,
}

/// Attributes of the class-level component annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentAnnotation {
    pub name: Option<String>,
    /// `Some(vec![])` explicitly removes the service element.
    pub service: Option<Vec<String>>,
    pub factory: Option<String>,
    pub enabled: Option<bool>,
    pub immediate: Option<bool>,
    #[serde(alias = "configurationPolicy")]
    pub configuration_policy: Option<String>,
    #[serde(alias = "serviceFactory")]
    pub servicefactory: Option<bool>,
    /// `name[:Type]=value` declarations.
    pub property: Vec<String>,
    /// Bundle entries holding further properties.
    pub properties: Vec<String>,
}

impl FactsDocument {
    /// Type inspector over every type in the document, component or not.
    pub fn inspector(&self) -> MemoryTypeInspector {
        self.types.iter().map(AnnotatedType::to_type_facts).collect()
    }

    pub fn components(&self) -> impl Iterator<Item = &AnnotatedType> {
        self.types.iter().filter(|t| t.component.is_some())
    }

    pub fn component(&self, binary_name: &str) -> Option<&AnnotatedType> {
        self.components().find(|t| t.binary_name == binary_name)
    }
}

impl AnnotatedType {
    pub fn to_type_facts(&self) -> TypeFacts {
        TypeFacts {
            binary_name: self.binary_name.clone(),
            superclass: self.superclass.clone(),
            interfaces: self.interfaces.clone(),
            methods: self
                .methods
                .iter()
                .map(|m| MethodFacts {
                    name: m.name.clone(),
                    annotations: m.annotations.iter().map(|a| a.type_name().to_string()).collect(),
                })
                .collect(),
        }
    }
}

pub fn parse_facts_yaml(content: &str) -> Result<FactsDocument> {
    serde_yaml::from_str(content).context("Failed to parse YAML facts")
}

pub fn parse_facts_json(content: &str) -> Result<FactsDocument> {
    serde_json::from_str(content).context("Failed to parse JSON facts")
}

/// Load a facts file, choosing the format by extension.
pub fn load_facts(path: &Path) -> Result<FactsDocument> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let document = match extension.as_deref() {
        Some("yaml" | "yml") => parse_facts_yaml(&content),
        Some("json") => parse_facts_json(&content),
        _ => return Err(BuildError::UnsupportedFactsFormat(path.to_path_buf()).into()),
    }
    .with_context(|| format!("Failed to load {}", path.display()))?;

    tracing::info!(
        "Loaded {} types ({} components) from {}",
        document.types.len(),
        document.components().count(),
        path.display()
    );
    Ok(document)
}
