//! ds-descriptor-core: service-component descriptor model and rule engine
//!
//! This crate contains the pure descriptor logic with NO file system access:
//! - Descriptor value model (component, service, properties, references)
//! - Type inspection capability and an in-memory implementation
//! - Rule engine that derives and validates descriptor content
//! - Nom-based target filter parser
//! - Problem types for error reporting
//! - XML adapter and descriptor equivalence
//!
//! Reading annotation facts, writing descriptor files and the CLI live in
//! the `ds-annotation-builder` package.

pub mod builder;
pub mod diagnostics;
pub mod equivalence;
pub mod error;
pub mod filter;
pub mod inspector;
pub mod model;
pub mod naming;
pub mod property;
pub mod xml;

// Re-export commonly used types
pub use builder::{BuildOutcome, DescriptorBuilder, ReferenceRequest};
pub use diagnostics::{has_errors, Problem, ProblemCode, Severity};
pub use equivalence::{descriptors_equal, matches_persisted};
pub use error::DescriptorError;
pub use filter::{is_valid_filter, parse_filter, Filter, FilterError};
pub use inspector::{MemoryTypeInspector, MethodFacts, TypeFacts, TypeInspector};
pub use model::{
    Cardinality, ConfigurationPolicy, Descriptor, JavaType, Policy, PolicyOption, Property,
    PropertyEntry, PropertyValue, Reference, Service,
};
pub use property::{group_by_name, ComponentProperty, PropertyGroup, LINE_SEPARATOR};
pub use xml::{SchemaDefinition, XmlAdapter, XmlError};
