//! Descriptor rule engine
//!
//! [`DescriptorBuilder`] populates one [`Descriptor`] for one component type.
//! Every operation either succeeds and mutates the descriptor or returns a
//! [`DescriptorError`] without touching it. Callers that want every problem of
//! a type in one pass feed results through [`DescriptorBuilder::apply`], which
//! records recoverable failures and only propagates precondition violations.
//!
//! ## Reference derivation
//!
//! ```text
//! bind "setLog"  → name "Log", unbind "unsetLog"  (if it exists), updated "updatedLog"  (if it exists)
//! bind "addLog"  → name "Log", unbind "removeLog" (if it exists), updated "updatedLog"  (if it exists)
//! bind "bindLog" → name "Log", unbind "unbindLog" (if it exists), updated "updatedLog"  (if it exists)
//! ```

use crate::diagnostics::{Problem, ProblemCode};
use crate::error::*;
use crate::filter::parse_filter;
use crate::inspector::TypeInspector;
use crate::model::*;
use crate::naming::{self, derive_reference_name, derive_unbind_name, derive_updated_name, NO_METHOD};
use crate::property::{aggregate_values, PropertyGroup, LINE_SEPARATOR};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ── Reference request ──

/// Intent to add one reference, as read from a reference annotation.
///
/// All values are raw strings; blank values count as "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRequest {
    pub service: Option<String>,
    pub bind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cardinality: Option<String>,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub policy_option: Option<String>,
    #[serde(default)]
    pub unbind: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

impl ReferenceRequest {
    pub fn new(service: impl Into<String>, bind: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            bind: Some(bind.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_cardinality(mut self, cardinality: impl Into<String>) -> Self {
        self.cardinality = Some(cardinality.into());
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    pub fn with_policy_option(mut self, policy_option: impl Into<String>) -> Self {
        self.policy_option = Some(policy_option.into());
        self
    }

    pub fn with_unbind(mut self, unbind: impl Into<String>) -> Self {
        self.unbind = Some(unbind.into());
        self
    }

    pub fn with_updated(mut self, updated: impl Into<String>) -> Self {
        self.updated = Some(updated.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Non-blank value of an optional argument.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !naming::is_blank(Some(v)))
}

// ── Outcome ──

/// Result of one build: the descriptor plus everything recorded against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub descriptor: Descriptor,
    pub problems: Vec<Problem>,
}

impl BuildOutcome {
    /// True if no error-severity problem was recorded.
    pub fn is_valid(&self) -> bool {
        !crate::diagnostics::has_errors(&self.problems)
    }
}

// ── Builder ──

pub struct DescriptorBuilder<'i, I: TypeInspector + ?Sized> {
    inspector: &'i I,
    type_name: String,
    line_separator: String,
    descriptor: Descriptor,
    problems: Vec<Problem>,
}

impl<'i, I: TypeInspector + ?Sized> DescriptorBuilder<'i, I> {
    /// Start a build for `type_name`. Fails if the inspector cannot resolve it.
    pub fn new(inspector: &'i I, type_name: &str) -> Result<Self, DescriptorError> {
        if type_name.trim().is_empty() {
            return Err(DescriptorError::MissingArgument("type"));
        }
        let binary_name = inspector
            .binary_name(type_name)
            .ok_or_else(|| DescriptorError::UnresolvedType(type_name.to_string()))?;

        Ok(Self {
            inspector,
            type_name: binary_name,
            line_separator: LINE_SEPARATOR.to_string(),
            descriptor: Descriptor::new(),
            problems: Vec::new(),
        })
    }

    /// Override the separator used to join multi-valued properties.
    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    /// Binary name of the component type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Identity of the component: the implementation class, once set.
    pub fn name(&self) -> Option<&str> {
        self.descriptor.identity()
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    pub fn record(&mut self, problem: Problem) {
        warn!(component = %self.type_name, "{}", problem);
        self.problems.push(problem);
    }

    /// Record a recoverable failure and carry on; propagate preconditions.
    pub fn apply<T>(&mut self, result: Result<T, DescriptorError>) -> Result<Option<T>, DescriptorError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_precondition() => Err(err),
            Err(err) => {
                self.record(err.to_problem());
                Ok(None)
            }
        }
    }

    pub fn finish(self) -> BuildOutcome {
        BuildOutcome {
            descriptor: self.descriptor,
            problems: self.problems,
        }
    }

    // =========================================================================
    // Component attributes
    // =========================================================================

    /// Name, implementation class and provided services from the type itself.
    /// Services are the directly implemented interfaces, not the transitive set.
    pub fn set_component_defaults(&mut self) -> Result<(), DescriptorError> {
        let binary_name = self.type_name.clone();
        self.descriptor.name = Some(binary_name.clone());
        self.descriptor.implementation_class = Some(binary_name);

        let interfaces = self.inspector.direct_interfaces(&self.type_name);
        self.set_service(&interfaces)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.descriptor.name = Some(name.into());
    }

    pub fn set_activate_method(&mut self, method: &str) -> Result<(), DescriptorError> {
        if self.descriptor.deactivate.as_deref() == Some(method) {
            return Err(DescriptorError::Conflict {
                field: FIELD_ACTIVATE,
                method: method.to_string(),
            });
        }
        self.descriptor.activate = Some(method.to_string());
        Ok(())
    }

    pub fn set_deactivate_method(&mut self, method: &str) -> Result<(), DescriptorError> {
        if self.descriptor.activate.as_deref() == Some(method) {
            return Err(DescriptorError::Conflict {
                field: FIELD_DEACTIVATE,
                method: method.to_string(),
            });
        }
        self.descriptor.deactivate = Some(method.to_string());
        Ok(())
    }

    /// Stored as given; a missing method is only a warning.
    pub fn set_modified_method(&mut self, method: &str) {
        if !self.inspector.method_exists(&self.type_name, method) {
            self.record(
                Problem::warning(
                    ProblemCode::NonExistingMethod,
                    format!("Non existing modified method '{}'.", method),
                )
                .with_field(FIELD_MODIFIED),
            );
        }
        self.descriptor.modified = Some(method.to_string());
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.descriptor.enabled = Some(enabled);
    }

    pub fn set_immediate(&mut self, immediate: bool) {
        self.descriptor.immediate = Some(immediate);
    }

    pub fn set_factory(&mut self, factory: impl Into<String>) {
        self.descriptor.factory = Some(factory.into());
    }

    pub fn set_configuration_policy(&mut self, value: &str) -> Result<(), DescriptorError> {
        let policy = ConfigurationPolicy::from_value(value).ok_or_else(|| {
            DescriptorError::InvalidEnumValue {
                field: FIELD_CONFIGURATION_POLICY,
                value: value.to_string(),
            }
        })?;
        self.descriptor.configuration_policy = Some(policy);
        Ok(())
    }

    /// Replace the provided interfaces. An empty list removes the service
    /// element. Every interface must be an ancestor of the component type;
    /// nothing changes if one is not.
    pub fn set_service<S: AsRef<str>>(&mut self, interfaces: &[S]) -> Result<(), DescriptorError> {
        if interfaces.is_empty() {
            self.descriptor.service = None;
            return Ok(());
        }

        if let Some(foreign) = interfaces
            .iter()
            .map(AsRef::as_ref)
            .find(|iface| !self.inspector.is_ancestor_of(iface, &self.type_name))
        {
            return Err(DescriptorError::NoSupertype(foreign.to_string()));
        }

        let service = self.descriptor.service.get_or_insert_with(Service::default);
        service.provide = interfaces.iter().map(|i| i.as_ref().to_string()).collect();
        debug!(component = %self.type_name, provide = ?service.provide, "service set");
        Ok(())
    }

    pub fn set_service_factory(&mut self, service_factory: bool) {
        self.descriptor
            .service
            .get_or_insert_with(Service::default)
            .service_factory = Some(service_factory);
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Append a `properties` element pointing at a bundle entry.
    pub fn add_properties(&mut self, entry: impl Into<String>) {
        self.descriptor.properties.push(PropertyEntry::Properties {
            entry: entry.into(),
        });
    }

    /// Append one `property` element per group. A group with several entries
    /// becomes a multi-line value; type and name come from the first entry.
    /// Types are checked for every group before anything is appended.
    pub fn add_property(&mut self, groups: &[PropertyGroup]) -> Result<(), DescriptorError> {
        let mut properties = Vec::with_capacity(groups.len());

        for group in groups {
            let Some(first) = group.entries.first() else {
                continue;
            };

            let kind = match first.kind.as_deref() {
                Some(kind) => Some(JavaType::from_value(kind).ok_or_else(|| {
                    DescriptorError::UnknownType {
                        property: first.name.clone(),
                        kind: kind.to_string(),
                    }
                })?),
                None => None,
            };

            let value = if group.entries.len() == 1 {
                PropertyValue::Single(first.value.clone())
            } else {
                PropertyValue::Multi(aggregate_values(
                    group.entries.iter().map(|p| p.value.as_str()),
                    &self.line_separator,
                ))
            };

            properties.push(PropertyEntry::Property(Property {
                name: first.name.clone(),
                kind,
                value,
            }));
        }

        self.descriptor.properties.extend(properties);
        Ok(())
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Resolve, validate and append one reference.
    pub fn add_reference(&mut self, request: &ReferenceRequest) -> Result<(), DescriptorError> {
        let service = given(&request.service).ok_or(DescriptorError::MissingArgument("service"))?;
        let bind = given(&request.bind).ok_or(DescriptorError::MissingArgument("bind"))?;

        let mut reference = Reference::new(self.resolve_reference_name(request, bind)?, service, bind);

        if self.descriptor.reference(&reference.name).is_some() {
            return Err(DescriptorError::DuplicateReferenceName(reference.name));
        }

        reference.unbind = self.resolve_unbind(request, bind)?;
        reference.updated = self.resolve_updated(request, bind)?;

        if let Some(target) = given(&request.target) {
            parse_filter(target).map_err(|err| {
                debug!(component = %self.type_name, %target, error = %err, "target rejected");
                DescriptorError::InvalidFilter(target.to_string())
            })?;
            reference.target = Some(target.to_string());
        }

        let mut unknown_cardinality = None;
        if let Some(alias) = given(&request.cardinality) {
            reference.cardinality = Cardinality::from_alias(alias);
            if reference.cardinality.is_none() {
                unknown_cardinality = Some(
                    Problem::warning(
                        ProblemCode::UnknownCardinality,
                        format!(
                            "Unknown cardinality '{}' on reference '{}' is ignored.",
                            alias, reference.name
                        ),
                    )
                    .with_field(FIELD_CARDINALITY),
                );
            }
        }

        if let Some(policy) = given(&request.policy) {
            reference.policy = Some(Policy::from_value(policy).ok_or_else(|| {
                DescriptorError::InvalidEnumValue {
                    field: FIELD_POLICY,
                    value: policy.to_string(),
                }
            })?);
        }

        if let Some(option) = given(&request.policy_option) {
            reference.policy_option = Some(PolicyOption::from_value(option).ok_or_else(|| {
                DescriptorError::InvalidEnumValue {
                    field: FIELD_POLICY_OPTION,
                    value: option.to_string(),
                }
            })?);
        }

        debug!(
            component = %self.type_name,
            reference = %reference.name,
            unbind = ?reference.unbind,
            updated = ?reference.updated,
            "reference added"
        );
        if let Some(warning) = unknown_cardinality {
            self.record(warning);
        }
        self.descriptor.references.push(reference);
        Ok(())
    }

    fn resolve_reference_name(
        &self,
        request: &ReferenceRequest,
        bind: &str,
    ) -> Result<String, DescriptorError> {
        match request.name.as_deref() {
            Some(name) if name.trim().is_empty() => {
                Err(DescriptorError::InvalidReferenceName(name.to_string()))
            }
            Some(name) => Ok(name.to_string()),
            None => derive_reference_name(bind)
                .map(str::to_string)
                .ok_or_else(|| DescriptorError::InvalidDerivedReferenceName(bind.to_string())),
        }
    }

    fn resolve_unbind(
        &self,
        request: &ReferenceRequest,
        bind: &str,
    ) -> Result<Option<String>, DescriptorError> {
        match given(&request.unbind) {
            Some(NO_METHOD) => Ok(None),
            Some(unbind) => {
                if !self.inspector.method_exists(&self.type_name, unbind) {
                    return Err(DescriptorError::NonExistingUnbindMethod(unbind.to_string()));
                }
                self.assert_not_annotated(unbind)?;
                Ok(Some(unbind.to_string()))
            }
            None => {
                let derived = derive_unbind_name(bind);
                if !self.inspector.method_exists(&self.type_name, &derived) {
                    return Ok(None);
                }
                self.assert_not_annotated(&derived)?;
                Ok(Some(derived))
            }
        }
    }

    fn resolve_updated(
        &self,
        request: &ReferenceRequest,
        bind: &str,
    ) -> Result<Option<String>, DescriptorError> {
        match given(&request.updated) {
            Some(NO_METHOD) => Ok(None),
            Some(updated) => {
                if !self.inspector.method_exists(&self.type_name, updated) {
                    return Err(DescriptorError::NonExistingUpdatedMethod(updated.to_string()));
                }
                Ok(Some(updated.to_string()))
            }
            None => {
                let derived = derive_updated_name(bind);
                Ok(self
                    .inspector
                    .method_exists(&self.type_name, &derived)
                    .then_some(derived))
            }
        }
    }

    fn assert_not_annotated(&self, method: &str) -> Result<(), DescriptorError> {
        match self.inspector.component_annotation(&self.type_name, method) {
            Some(annotation) => Err(DescriptorError::AnnotatedUnbindMethod {
                method: method.to_string(),
                annotation: annotation
                    .rsplit('.')
                    .next()
                    .unwrap_or(&annotation)
                    .to_string(),
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
