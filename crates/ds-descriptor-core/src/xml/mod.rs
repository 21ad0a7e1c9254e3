//! Descriptor XML adapter
//!
//! Maps a [`Descriptor`] to and from the `scr:component` document form.
//! The schema namespace is fixed when the adapter is constructed; there is
//! no process-wide binding context.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <!-- Generated by ds-annotation-builder from src/de/test/Impl.java -->
//! <scr:component xmlns:scr="http://www.osgi.org/xmlns/scr/v1.2.0" name="de.test.Impl">
//!   <implementation class="de.test.Impl"/>
//!   <property name="ranking" type="Integer" value="10"/>
//!   <service>
//!     <provide interface="de.test.Api"/>
//!   </service>
//!   <reference name="Log" interface="org.log.Log" bind="setLog" unbind="unsetLog"/>
//! </scr:component>
//! ```

mod export;
mod import;

use crate::model::Descriptor;
use thiserror::Error;

/// Namespace base; the schema version is appended.
pub const SCR_NAMESPACE_BASE: &str = "http://www.osgi.org/xmlns/scr/v";
pub const DEFAULT_SCHEMA_VERSION: &str = "1.2.0";
pub const DEFAULT_PREFIX: &str = "scr";

/// Tool name recorded in the generated-file header comment.
pub const GENERATOR: &str = "ds-annotation-builder";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("I/O error while writing descriptor: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("descriptor is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("malformed descriptor: {0}")]
    Malformed(String),

    #[error("no component element found")]
    MissingRoot,

    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),

    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<{element}> has invalid {attribute} '{value}'")]
    InvalidValue {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
}

/// The descriptor schema an adapter reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    pub namespace: String,
    pub prefix: String,
}

impl SchemaDefinition {
    pub fn for_version(version: &str) -> Self {
        Self {
            namespace: format!("{}{}", SCR_NAMESPACE_BASE, version),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Default for SchemaDefinition {
    fn default() -> Self {
        Self::for_version(DEFAULT_SCHEMA_VERSION)
    }
}

/// Converts descriptors to and from XML text.
#[derive(Debug, Clone, Default)]
pub struct XmlAdapter {
    schema: SchemaDefinition,
}

impl XmlAdapter {
    pub fn new(schema: SchemaDefinition) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// Render a descriptor. `source` is recorded in a header comment when given.
    pub fn to_xml(&self, descriptor: &Descriptor, source: Option<&str>) -> Result<String, XmlError> {
        export::write_descriptor(&self.schema, descriptor, source)
    }

    /// Parse a descriptor document. Comments, namespace declarations and
    /// unknown elements are ignored; child order is free.
    pub fn from_xml(&self, xml: &str) -> Result<Descriptor, XmlError> {
        import::read_descriptor(xml)
    }
}
