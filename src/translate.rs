//! Annotation-to-intent translation
//!
//! Walks one component type's annotations and drives the rule engine.
//! Every recoverable problem of the type is collected in one pass; only a
//! precondition violation stops the type early and fails the run.

use crate::error::BuildError;
use crate::facts::{AnnotatedType, ComponentAnnotation, FactsDocument, MethodAnnotation, MethodDecl, ReferenceAnnotation};
use ds_descriptor_core::{
    group_by_name, BuildOutcome, ComponentProperty, DescriptorBuilder, DescriptorError,
    ReferenceRequest, TypeInspector,
};
use tracing::{debug, info};

/// Result of translating one component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTranslation {
    pub type_name: String,
    pub source: Option<String>,
    pub outcome: BuildOutcome,
}

impl TypeTranslation {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_valid()
    }
}

/// Translate every component type of the document, in document order.
pub fn translate_all(document: &FactsDocument, line_separator: &str) -> Result<Vec<TypeTranslation>, BuildError> {
    let inspector = document.inspector();
    let translations = document
        .types
        .iter()
        .filter_map(|ty| translate_type(&inspector, ty, line_separator).transpose())
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Translated {} components, {} with errors",
        translations.len(),
        translations.iter().filter(|t| !t.is_valid()).count()
    );
    Ok(translations)
}

/// Translate one type. Types without a component annotation yield `None`.
pub fn translate_type<I: TypeInspector + ?Sized>(
    inspector: &I,
    ty: &AnnotatedType,
    line_separator: &str,
) -> Result<Option<TypeTranslation>, BuildError> {
    let Some(component) = &ty.component else {
        return Ok(None);
    };
    let precondition = |err: DescriptorError| BuildError::precondition(&ty.binary_name, err);

    let mut builder = DescriptorBuilder::new(inspector, &ty.binary_name)
        .map_err(precondition)?
        .with_line_separator(line_separator);

    let result = builder.set_component_defaults();
    builder.apply(result).map_err(precondition)?;

    apply_component_attributes(&mut builder, component).map_err(precondition)?;

    for method in &ty.methods {
        for annotation in &method.annotations {
            apply_method_annotation(&mut builder, method, annotation).map_err(precondition)?;
        }
    }

    let outcome = builder.finish();
    debug!(
        component = %ty.binary_name,
        problems = outcome.problems.len(),
        "component translated"
    );

    Ok(Some(TypeTranslation {
        type_name: ty.binary_name.clone(),
        source: ty.source.clone(),
        outcome,
    }))
}

fn apply_component_attributes<I: TypeInspector + ?Sized>(
    builder: &mut DescriptorBuilder<'_, I>,
    component: &ComponentAnnotation,
) -> Result<(), DescriptorError> {
    if let Some(name) = non_empty(&component.name) {
        builder.set_name(name);
    }

    if let Some(service) = &component.service {
        let result = builder.set_service(service);
        builder.apply(result)?;
    }

    if let Some(factory) = non_empty(&component.factory) {
        builder.set_factory(factory);
    }
    if let Some(enabled) = component.enabled {
        builder.set_enabled(enabled);
    }
    if let Some(immediate) = component.immediate {
        builder.set_immediate(immediate);
    }

    if let Some(policy) = non_empty(&component.configuration_policy) {
        let result = builder.set_configuration_policy(policy);
        builder.apply(result)?;
    }

    if let Some(service_factory) = component.servicefactory {
        builder.set_service_factory(service_factory);
    }

    let mut declarations = Vec::with_capacity(component.property.len());
    for declaration in &component.property {
        if let Some(property) = builder.apply(ComponentProperty::parse(declaration))? {
            declarations.push(property);
        }
    }
    if !declarations.is_empty() {
        let result = builder.add_property(&group_by_name(declarations));
        builder.apply(result)?;
    }

    for entry in &component.properties {
        builder.add_properties(entry.as_str());
    }

    Ok(())
}

fn apply_method_annotation<I: TypeInspector + ?Sized>(
    builder: &mut DescriptorBuilder<'_, I>,
    method: &MethodDecl,
    annotation: &MethodAnnotation,
) -> Result<(), DescriptorError> {
    match annotation {
        MethodAnnotation::Activate => {
            let result = builder.set_activate_method(&method.name);
            builder.apply(result)?;
        }
        MethodAnnotation::Deactivate => {
            let result = builder.set_deactivate_method(&method.name);
            builder.apply(result)?;
        }
        MethodAnnotation::Modified => builder.set_modified_method(&method.name),
        MethodAnnotation::Reference(reference) => {
            let request = reference_request(method, reference);
            let result = builder.add_reference(&request);
            builder.apply(result)?;
        }
        MethodAnnotation::Other { .. } => {}
    }
    Ok(())
}

/// The bind method is the annotated method; the service defaults to its
/// first parameter type.
fn reference_request(method: &MethodDecl, annotation: &ReferenceAnnotation) -> ReferenceRequest {
    let own = |value: &Option<String>| non_empty(value).map(str::to_string);

    ReferenceRequest {
        service: own(&annotation.service).or_else(|| method.parameters.first().cloned()),
        bind: Some(method.name.clone()),
        name: own(&annotation.name),
        cardinality: own(&annotation.cardinality),
        policy: own(&annotation.policy),
        policy_option: own(&annotation.policy_option),
        unbind: own(&annotation.unbind),
        updated: own(&annotation.updated),
        target: own(&annotation.target),
    }
}

/// Annotation attributes default to `""`, which means "not given".
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
