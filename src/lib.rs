//! ds-annotation-builder: component descriptors from annotated type facts
//!
//! Reads the facts of a project's annotated types, runs each component type
//! through the descriptor rule engine of `ds-descriptor-core`, and writes one
//! descriptor XML file per valid component.
//!
//! - `facts` - YAML/JSON fact documents and the in-memory type inspector
//! - `translate` - annotation-to-intent translation, collecting all problems
//! - `output` - descriptor files, incremental writes, per-type report
//! - `config` - `BuilderConfig` and its loader

pub mod config;
pub mod error;
pub mod facts;
pub mod output;
pub mod translate;

pub use config::{BuilderConfig, ConfigLoader, LineSeparator};
pub use error::BuildError;
pub use facts::{load_facts, AnnotatedType, FactsDocument};
pub use output::{BuildReport, DescriptorWriter, OutputStatus, TypeReport};
pub use translate::{translate_all, TypeTranslation};

use anyhow::Result;
use std::path::Path;

/// Translate and write every component below `out`.
pub fn build(document: &FactsDocument, config: &BuilderConfig, out: &Path) -> Result<BuildReport> {
    let translations = translate_all(document, config.line_separator.as_str())?;
    DescriptorWriter::new(out, config.clone()).write_all(translations)
}

/// Translate every component without touching the file system.
pub fn check(document: &FactsDocument, config: &BuilderConfig) -> Result<BuildReport, BuildError> {
    let translations = translate_all(document, config.line_separator.as_str())?;
    Ok(output::check_report(translations))
}

/// Descriptor XML of one component, together with its problems.
pub fn render(
    document: &FactsDocument,
    config: &BuilderConfig,
    type_name: &str,
) -> Result<(String, Vec<ds_descriptor_core::Problem>), BuildError> {
    let ty = document
        .component(type_name)
        .ok_or_else(|| BuildError::UnknownComponent(type_name.to_string()))?;
    let translation = translate::translate_type(&document.inspector(), ty, config.line_separator.as_str())?
        .ok_or_else(|| BuildError::UnknownComponent(type_name.to_string()))?;

    let xml = DescriptorWriter::new(".", config.clone()).render(&translation)?;
    Ok((xml, translation.outcome.problems))
}
