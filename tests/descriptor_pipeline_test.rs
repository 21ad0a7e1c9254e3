//! End-to-end descriptor build over the fixture bundle.
//!
//! Covers the whole pipeline: facts loading, translation, XML output,
//! incremental writes and removal of stale descriptors.

use ds_annotation_builder::{
    build, check, load_facts, render, BuilderConfig, FactsDocument, LineSeparator, OutputStatus,
};
use ds_descriptor_core::{
    Cardinality, JavaType, Policy, ProblemCode, PropertyEntry, PropertyValue, XmlAdapter,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

const CONSOLE: &str = "org.example.log.internal.ConsoleLogWriter";
const BROKEN: &str = "org.example.log.internal.BrokenWriter";

fn fixture() -> FactsDocument {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/components.yaml");
    load_facts(&path).expect("load fixture facts")
}

fn config() -> BuilderConfig {
    BuilderConfig {
        line_separator: LineSeparator::Lf,
        ..BuilderConfig::default()
    }
}

#[test]
fn test_build_writes_valid_components_only() {
    let out = tempfile::tempdir().unwrap();
    let report = build(&fixture(), &config(), out.path()).unwrap();

    assert_eq!(report.types.len(), 2);
    assert!(report.has_errors());
    assert_eq!(report.get(CONSOLE).unwrap().status, OutputStatus::Written);
    assert_eq!(report.get(BROKEN).unwrap().status, OutputStatus::Skipped);

    let written = out.path().join("OSGI-INF").join(format!("{}.xml", CONSOLE));
    assert!(written.is_file());
    assert!(!out.path().join("OSGI-INF").join(format!("{}.xml", BROKEN)).exists());

    let xml = std::fs::read_to_string(&written).unwrap();
    assert!(xml.contains(
        "<!-- Generated by ds-annotation-builder from src/org/example/log/internal/ConsoleLogWriter.java -->"
    ));

    let descriptor = XmlAdapter::default().from_xml(&xml).unwrap();
    assert_eq!(descriptor.implementation_class.as_deref(), Some(CONSOLE));
    assert_eq!(descriptor.immediate, Some(true));
    assert_eq!(descriptor.activate.as_deref(), Some("activate"));
    assert_eq!(descriptor.deactivate.as_deref(), Some("deactivate"));
    assert_eq!(
        descriptor.provided_interfaces(),
        &["org.example.log.LogWriter".to_string()]
    );

    let ranking = descriptor.property("service.ranking").unwrap();
    assert_eq!(ranking.kind, Some(JavaType::Integer));
    assert_eq!(ranking.value, PropertyValue::Single("10".to_string()));
    assert_eq!(
        descriptor.property("channels").unwrap().value.values(),
        vec!["console", "stderr"]
    );
    assert!(matches!(
        descriptor.properties.last(),
        Some(PropertyEntry::Properties { entry }) if entry == "OSGI-INF/console.properties"
    ));

    let formatter = descriptor.reference("Formatter").unwrap();
    assert_eq!(formatter.interface, "org.example.log.Formatter");
    assert_eq!(formatter.unbind.as_deref(), Some("unsetFormatter"));
    assert_eq!(formatter.updated.as_deref(), Some("updatedFormatter"));
    assert_eq!(formatter.cardinality, Some(Cardinality::Optional));
    assert_eq!(formatter.policy, Some(Policy::Dynamic));
    assert_eq!(
        formatter.target.as_deref(),
        Some("(&(format=plain)(!(legacy=true)))")
    );
}

#[test]
fn test_broken_component_reports_every_problem() {
    let report = check(&fixture(), &config()).unwrap();
    let broken = report.get(BROKEN).unwrap();

    assert_eq!(broken.status, OutputStatus::Skipped);
    assert_eq!(broken.path, None);
    let codes: Vec<ProblemCode> = broken.problems.iter().map(|p| p.code).collect();
    assert_eq!(
        codes,
        vec![
            ProblemCode::NoSupertype,
            ProblemCode::Conflict,
            ProblemCode::AnnotatedUnbindMethod,
        ]
    );
    assert_eq!(broken.problems[0].message, "NO SUPERTYPE 'org.example.log.Unrelated'.");
    assert_eq!(broken.problems[1].field.as_deref(), Some("deactivate"));

    assert_eq!(report.get(CONSOLE).unwrap().status, OutputStatus::Valid);
}

#[test]
fn test_rebuild_leaves_equivalent_descriptor_untouched() {
    let out = tempfile::tempdir().unwrap();
    build(&fixture(), &config(), out.path()).unwrap();

    let path = out.path().join("OSGI-INF").join(format!("{}.xml", CONSOLE));
    // Reformat the persisted file; it still describes the same component.
    let original = std::fs::read_to_string(&path).unwrap();
    let reformatted = original.replace("<!--", "<!-- edited").replace("  <", "    <");
    std::fs::write(&path, &reformatted).unwrap();

    let report = build(&fixture(), &config(), out.path()).unwrap();
    assert_eq!(report.get(CONSOLE).unwrap().status, OutputStatus::Unchanged);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), reformatted);

    let mut changed = fixture();
    changed.types[0].component.as_mut().unwrap().immediate = Some(false);
    let report = build(&changed, &config(), out.path()).unwrap();
    assert_eq!(report.get(CONSOLE).unwrap().status, OutputStatus::Written);
    assert!(std::fs::read_to_string(&path).unwrap().contains("immediate=\"false\""));
}

#[test]
fn test_unparsable_descriptor_is_replaced() {
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().join("OSGI-INF");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.xml", CONSOLE));
    std::fs::write(&path, "<<garbage").unwrap();

    let report = build(&fixture(), &config(), out.path()).unwrap();
    assert_eq!(report.get(CONSOLE).unwrap().status, OutputStatus::Written);
    assert!(XmlAdapter::default()
        .from_xml(&std::fs::read_to_string(&path).unwrap())
        .is_ok());
}

#[test]
fn test_stale_descriptor_removed_on_error() {
    let out = tempfile::tempdir().unwrap();
    let dir = out.path().join("OSGI-INF");
    std::fs::create_dir_all(&dir).unwrap();
    let stale = dir.join(format!("{}.xml", BROKEN));
    std::fs::write(&stale, "<scr:component/>").unwrap();

    build(&fixture(), &config(), out.path()).unwrap();
    assert!(!stale.exists());
}

#[test]
fn test_config_controls_folder_and_header() {
    let out = tempfile::tempdir().unwrap();
    let config = BuilderConfig {
        descriptor_folder: "META-INF/ds".to_string(),
        generate_header: false,
        schema_version: "1.1.0".to_string(),
        line_separator: LineSeparator::Lf,
    };
    build(&fixture(), &config, out.path()).unwrap();

    let xml = std::fs::read_to_string(
        out.path().join("META-INF/ds").join(format!("{}.xml", CONSOLE)),
    )
    .unwrap();
    assert!(!xml.contains("<!--"));
    assert!(xml.contains("http://www.osgi.org/xmlns/scr/v1.1.0"));
}

#[test]
fn test_render_single_component() {
    let (xml, problems) = render(&fixture(), &config(), CONSOLE).unwrap();
    assert!(problems.is_empty());
    assert!(xml.contains("<implementation class=\"org.example.log.internal.ConsoleLogWriter\"/>"));

    let (_, problems) = render(&fixture(), &config(), BROKEN).unwrap();
    assert_eq!(problems.len(), 3);

    assert!(render(&fixture(), &config(), "org.example.log.internal.AbstractWriter").is_err());
}
