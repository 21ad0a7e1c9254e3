//! Type inspection capability
//!
//! The rule engine never walks a syntax tree itself. Everything it needs to
//! know about the component class (its binary name, supertypes, methods and
//! the annotations on them) comes through [`TypeInspector`]. Types are
//! addressed by binary name.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Simple names of the annotations that mark component lifecycle methods.
pub const COMPONENT_ANNOTATIONS: [&str; 5] =
    ["Component", "Activate", "Deactivate", "Modified", "Reference"];

/// Package of the component annotations.
pub const COMPONENT_ANNOTATION_PACKAGE: &str = "org.osgi.service.component.annotations";

/// True if `annotation` (simple or qualified) is one of the component annotations.
pub fn is_component_annotation(annotation: &str) -> bool {
    let simple = match annotation.rsplit_once('.') {
        Some((package, simple)) if package == COMPONENT_ANNOTATION_PACKAGE => simple,
        Some(_) => return false,
        None => annotation,
    };
    COMPONENT_ANNOTATIONS.contains(&simple)
}

/// Read-only view of the host language's type information.
pub trait TypeInspector {
    /// Binary name of a known type, `None` if the type cannot be resolved.
    fn binary_name(&self, ty: &str) -> Option<String>;

    /// Direct superclass, if any.
    fn superclass(&self, ty: &str) -> Option<String>;

    /// Directly implemented interfaces in declaration order.
    fn direct_interfaces(&self, ty: &str) -> Vec<String>;

    /// True if the type declares a method with this name.
    fn method_exists(&self, ty: &str, method: &str) -> bool;

    /// First component annotation found on the named method, if any.
    fn component_annotation(&self, ty: &str, method: &str) -> Option<String>;

    fn has_component_annotation(&self, ty: &str, method: &str) -> bool {
        self.component_annotation(ty, method).is_some()
    }

    /// Depth-first walk over `ty`, its superclass chain and, at every level,
    /// the implemented interfaces. `ty` itself counts as an ancestor.
    fn is_ancestor_of(&self, candidate: &str, ty: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![ty.to_string()];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current == candidate {
                return true;
            }
            // Push interfaces first so the superclass chain is explored first.
            let mut interfaces = self.direct_interfaces(&current);
            interfaces.reverse();
            stack.extend(interfaces);
            if let Some(superclass) = self.superclass(&current) {
                stack.push(superclass);
            }
        }

        false
    }
}

// ── In-memory facts ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodFacts {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl MethodFacts {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }
}

/// Normalized facts about one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFacts {
    pub binary_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodFacts>,
}

impl TypeFacts {
    pub fn new(binary_name: impl Into<String>) -> Self {
        Self {
            binary_name: binary_name.into(),
            ..Self::default()
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn method(mut self, method: MethodFacts) -> Self {
        self.methods.push(method);
        self
    }
}

/// [`TypeInspector`] over a fixed set of [`TypeFacts`].
///
/// Types that were never registered behave as leaves: they resolve to no
/// binary name and have no supertypes or methods, but a walk still matches
/// them by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryTypeInspector {
    types: HashMap<String, TypeFacts>,
}

impl MemoryTypeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register facts for a type. Replaces any existing entry.
    pub fn register(&mut self, facts: TypeFacts) {
        self.types.insert(facts.binary_name.clone(), facts);
    }

    /// Builder-style registration.
    pub fn with_type(mut self, facts: TypeFacts) -> Self {
        self.register(facts);
        self
    }

    pub fn get(&self, ty: &str) -> Option<&TypeFacts> {
        self.types.get(ty)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<TypeFacts> for MemoryTypeInspector {
    fn from_iter<T: IntoIterator<Item = TypeFacts>>(iter: T) -> Self {
        let mut inspector = Self::new();
        for facts in iter {
            inspector.register(facts);
        }
        inspector
    }
}

impl TypeInspector for MemoryTypeInspector {
    fn binary_name(&self, ty: &str) -> Option<String> {
        self.types.get(ty).map(|t| t.binary_name.clone())
    }

    fn superclass(&self, ty: &str) -> Option<String> {
        self.types.get(ty).and_then(|t| t.superclass.clone())
    }

    fn direct_interfaces(&self, ty: &str) -> Vec<String> {
        self.types
            .get(ty)
            .map(|t| t.interfaces.clone())
            .unwrap_or_default()
    }

    fn method_exists(&self, ty: &str, method: &str) -> bool {
        self.types
            .get(ty)
            .is_some_and(|t| t.methods.iter().any(|m| m.name == method))
    }

    fn component_annotation(&self, ty: &str, method: &str) -> Option<String> {
        let facts = self.types.get(ty)?;
        facts
            .methods
            .iter()
            .filter(|m| m.name == method)
            .flat_map(|m| m.annotations.iter())
            .find(|a| is_component_annotation(a))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> MemoryTypeInspector {
        MemoryTypeInspector::new()
            .with_type(
                TypeFacts::new("de.test.Impl")
                    .extends("de.test.Base")
                    .implements("de.test.Api")
                    .method(MethodFacts::new("setLog"))
                    .method(MethodFacts::new("unsetLog").annotated("Reference")),
            )
            .with_type(TypeFacts::new("de.test.Base").implements("de.test.BaseApi"))
            .with_type(TypeFacts::new("de.test.BaseApi").implements("de.test.Marker"))
            .with_type(TypeFacts::new("de.test.Api"))
    }

    #[test]
    fn test_ancestor_walk_covers_supertypes_and_interfaces() {
        let inspector = hierarchy();
        assert!(inspector.is_ancestor_of("de.test.Impl", "de.test.Impl"));
        assert!(inspector.is_ancestor_of("de.test.Api", "de.test.Impl"));
        assert!(inspector.is_ancestor_of("de.test.Base", "de.test.Impl"));
        assert!(inspector.is_ancestor_of("de.test.BaseApi", "de.test.Impl"));
        assert!(inspector.is_ancestor_of("de.test.Marker", "de.test.Impl"));
        assert!(!inspector.is_ancestor_of("de.test.Other", "de.test.Impl"));
        assert!(!inspector.is_ancestor_of("de.test.Impl", "de.test.Base"));
    }

    #[test]
    fn test_ancestor_walk_terminates_on_cycles() {
        let inspector = MemoryTypeInspector::new()
            .with_type(TypeFacts::new("a.A").implements("a.B"))
            .with_type(TypeFacts::new("a.B").implements("a.A"));
        assert!(inspector.is_ancestor_of("a.B", "a.A"));
        assert!(!inspector.is_ancestor_of("a.C", "a.A"));
    }

    #[test]
    fn test_method_lookup() {
        let inspector = hierarchy();
        assert!(inspector.method_exists("de.test.Impl", "setLog"));
        assert!(!inspector.method_exists("de.test.Impl", "removeLog"));
        assert!(!inspector.method_exists("de.test.Unknown", "setLog"));
        assert!(!inspector.has_component_annotation("de.test.Impl", "setLog"));
        assert_eq!(
            inspector.component_annotation("de.test.Impl", "unsetLog"),
            Some("Reference".to_string())
        );
    }

    #[test]
    fn test_component_annotation_names() {
        assert!(is_component_annotation("Reference"));
        assert!(is_component_annotation(
            "org.osgi.service.component.annotations.Activate"
        ));
        assert!(!is_component_annotation("javax.annotation.PostConstruct"));
        assert!(!is_component_annotation("other.pkg.Activate"));
        assert!(!is_component_annotation("Override"));
    }

    #[test]
    fn test_unknown_types_are_leaves() {
        let inspector = hierarchy();
        assert_eq!(inspector.binary_name("java.lang.Runnable"), None);
        assert!(inspector.direct_interfaces("java.lang.Runnable").is_empty());
        assert!(inspector.is_ancestor_of("java.lang.Runnable", "java.lang.Runnable"));
    }
}
