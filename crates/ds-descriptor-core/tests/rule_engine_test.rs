//! Rule engine scenarios driven through the public API with an in-memory
//! type inspector.

use ds_descriptor_core::{
    descriptors_equal, group_by_name, ComponentProperty, DescriptorBuilder, DescriptorError,
    MemoryTypeInspector, MethodFacts, ProblemCode, ReferenceRequest, TypeFacts, XmlAdapter,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const IMPL: &str = "org.example.Impl";

fn inspector() -> MemoryTypeInspector {
    [
        TypeFacts::new(IMPL)
            .extends("org.example.Base")
            .implements("org.example.Api")
            .implements("org.example.Spi")
            .method(MethodFacts::new("setStore"))
            .method(MethodFacts::new("unsetStore"))
            .method(MethodFacts::new("start"))
            .method(MethodFacts::new("stop")),
        TypeFacts::new("org.example.Base").implements("org.example.BaseApi"),
        TypeFacts::new("org.example.BaseApi").implements("org.example.Marker"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_component_defaults_scenario() {
    let inspector = inspector();
    let mut builder = DescriptorBuilder::new(&inspector, IMPL).unwrap();
    builder.set_component_defaults().unwrap();
    let outcome = builder.finish();

    assert!(outcome.is_valid());
    assert_eq!(outcome.descriptor.name.as_deref(), Some(IMPL));
    assert_eq!(outcome.descriptor.implementation_class.as_deref(), Some(IMPL));
    assert_eq!(
        outcome.descriptor.provided_interfaces(),
        &["org.example.Api".to_string(), "org.example.Spi".to_string()]
    );
}

#[test]
fn test_round_trip_with_reference_and_multi_value_property() {
    let inspector = inspector();
    let mut builder = DescriptorBuilder::new(&inspector, IMPL)
        .unwrap()
        .with_line_separator("\n");
    builder.set_component_defaults().unwrap();
    builder.set_activate_method("start").unwrap();
    builder.set_deactivate_method("stop").unwrap();
    builder
        .add_property(&group_by_name(vec![
            ComponentProperty::parse("region=eu").unwrap(),
            ComponentProperty::parse("region=us").unwrap(),
        ]))
        .unwrap();
    builder
        .add_reference(&ReferenceRequest::new("org.example.Store", "setStore").with_target("(kind=disk)"))
        .unwrap();
    let original = builder.finish().descriptor;

    let adapter = XmlAdapter::default();
    let xml = adapter.to_xml(&original, Some("src/org/example/Impl.java")).unwrap();
    let parsed = adapter.from_xml(&xml).unwrap();

    assert_eq!(parsed, original);
    assert!(descriptors_equal(&parsed, &original));
    assert_eq!(parsed.activate.is_some(), original.activate.is_some());
    assert_eq!(parsed.deactivate.is_some(), original.deactivate.is_some());
}

#[test]
fn test_service_must_be_ancestor() {
    let inspector = inspector();
    for ancestor in ["org.example.Api", "org.example.Base", "org.example.Marker", IMPL] {
        let mut builder = DescriptorBuilder::new(&inspector, IMPL).unwrap();
        assert!(builder.set_service(&[ancestor]).is_ok(), "{} is an ancestor", ancestor);
    }

    let mut builder = DescriptorBuilder::new(&inspector, IMPL).unwrap();
    assert_eq!(
        builder.set_service(&["a.B"]),
        Err(DescriptorError::NoSupertype("a.B".to_string()))
    );
}

#[test]
fn test_cardinality_aliases() {
    let inspector = inspector();
    let cases = [
        ("AT_LEAST_ONE", "1..n"),
        ("Optional", "0..1"),
        ("mandatory", "1..1"),
        ("MULTIPLE", "0..n"),
    ];
    for (i, (alias, expected)) in cases.iter().enumerate() {
        let mut builder = DescriptorBuilder::new(&inspector, IMPL).unwrap();
        let name = format!("ref{}", i);
        builder
            .add_reference(
                &ReferenceRequest::new("org.example.Store", "setStore")
                    .with_name(name.as_str())
                    .with_cardinality(*alias),
            )
            .unwrap();
        let reference = builder.descriptor().reference(&name).unwrap();
        assert_eq!(reference.cardinality.map(|c| c.as_str()), Some(*expected));
    }
}

#[test]
fn test_duplicate_names_explicit_and_derived() {
    let inspector = inspector();
    let mut builder = DescriptorBuilder::new(&inspector, IMPL).unwrap();
    builder
        .add_reference(&ReferenceRequest::new("org.example.Store", "setStore"))
        .unwrap();

    let result = builder.add_reference(&ReferenceRequest::new("org.example.Other", "bindStore"));
    let recorded = builder.apply(result).unwrap();
    assert_eq!(recorded, None);
    assert_eq!(builder.problems()[0].code, ProblemCode::DuplicateReferenceName);

    builder
        .add_reference(&ReferenceRequest::new("org.example.Other", "bindOther"))
        .unwrap();
    assert_eq!(builder.descriptor().references.len(), 2);
}

proptest! {
    #[test]
    fn prop_activate_deactivate_order_does_not_matter(
        activate in "[a-z]{1,8}",
        deactivate in "[a-z]{1,8}",
    ) {
        let inspector = inspector();

        let mut forward = DescriptorBuilder::new(&inspector, IMPL).unwrap();
        let forward_ok = forward.set_activate_method(&activate).is_ok()
            && forward.set_deactivate_method(&deactivate).is_ok();

        let mut backward = DescriptorBuilder::new(&inspector, IMPL).unwrap();
        let backward_ok = backward.set_deactivate_method(&deactivate).is_ok()
            && backward.set_activate_method(&activate).is_ok();

        prop_assert_eq!(forward_ok, backward_ok);
        prop_assert_eq!(forward_ok, activate != deactivate);
    }
}
