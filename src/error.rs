//! Application-level errors
//!
//! Semantic problems in annotations never surface here; they are reported as
//! [`Problem`](ds_descriptor_core::Problem)s on the per-type report. A
//! `BuildError` means the run itself could not proceed.

use ds_descriptor_core::{DescriptorError, XmlError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// The fact input asked the engine for something it cannot start from.
    #[error("cannot build descriptor for '{type_name}': {source}")]
    Precondition {
        type_name: String,
        #[source]
        source: DescriptorError,
    },

    #[error("failed to render descriptor for '{type_name}': {source}")]
    Render {
        type_name: String,
        #[source]
        source: XmlError,
    },

    #[error("unsupported facts file '{}': expected .yaml, .yml or .json", .0.display())]
    UnsupportedFactsFormat(PathBuf),

    #[error("no annotated component '{0}' in facts")]
    UnknownComponent(String),
}

impl BuildError {
    pub fn precondition(type_name: impl Into<String>, source: DescriptorError) -> Self {
        BuildError::Precondition {
            type_name: type_name.into(),
            source,
        }
    }
}
