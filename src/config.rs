//! Builder configuration
//!
//! Loads `BuilderConfig` from YAML.
//!
//! Path resolution order:
//! 1. Explicit path (`--config`)
//! 2. `DS_BUILDER_CONFIG` environment variable
//! 3. `ds-builder.yaml` in the working directory
//! 4. Built-in defaults

use anyhow::{Context, Result};
use ds_descriptor_core::xml::DEFAULT_SCHEMA_VERSION;
use ds_descriptor_core::{SchemaDefinition, XmlAdapter, LINE_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_ENV_VAR: &str = "DS_BUILDER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ds-builder.yaml";
pub const DEFAULT_DESCRIPTOR_FOLDER: &str = "OSGI-INF";

/// Separator placed between the values of a multi-valued property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    #[default]
    Platform,
    Lf,
    Crlf,
}

impl LineSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineSeparator::Platform => LINE_SEPARATOR,
            LineSeparator::Lf => "\n",
            LineSeparator::Crlf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// Folder under the output root that receives the descriptors.
    pub descriptor_folder: String,
    /// Emit the "Generated by ..." header comment when the source is known.
    pub generate_header: bool,
    /// Version suffix of the `scr` namespace.
    pub schema_version: String,
    pub line_separator: LineSeparator,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            descriptor_folder: DEFAULT_DESCRIPTOR_FOLDER.to_string(),
            generate_header: true,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            line_separator: LineSeparator::default(),
        }
    }
}

impl BuilderConfig {
    pub fn schema(&self) -> SchemaDefinition {
        SchemaDefinition::for_version(&self.schema_version)
    }

    pub fn adapter(&self) -> XmlAdapter {
        XmlAdapter::new(self.schema())
    }
}

pub struct ConfigLoader {
    explicit: Option<PathBuf>,
    working_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            working_dir: PathBuf::from("."),
        }
    }

    /// Look for `ds-builder.yaml` in `dir` instead of the working directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Config file to load, `None` for built-in defaults.
    pub fn resolve(&self) -> Option<PathBuf> {
        self.resolve_with(std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    fn resolve_with(&self, env_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            return Some(path.clone());
        }
        if let Some(path) = env_path {
            return Some(path);
        }
        let local = self.working_dir.join(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    }

    pub fn load(&self) -> Result<BuilderConfig> {
        match self.resolve() {
            Some(path) => Self::load_file(&path),
            None => {
                debug!("No builder configuration found, using defaults");
                Ok(BuilderConfig::default())
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<BuilderConfig> {
        info!("Loading builder configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: BuilderConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        anyhow::ensure!(
            !config.descriptor_folder.trim().is_empty(),
            "descriptor_folder in {} must not be empty",
            path.display()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.descriptor_folder, "OSGI-INF");
        assert!(config.generate_header);
        assert_eq!(config.schema().namespace, "http://www.osgi.org/xmlns/scr/v1.2.0");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: BuilderConfig =
            serde_yaml::from_str("descriptor_folder: META-INF/ds\nline_separator: crlf\n").unwrap();
        assert_eq!(config.descriptor_folder, "META-INF/ds");
        assert_eq!(config.line_separator.as_str(), "\r\n");
        assert!(config.generate_header);
        assert_eq!(config.schema_version, "1.2.0");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(serde_yaml::from_str::<BuilderConfig>("descriptor_dir: x\n").is_err());
    }

    #[test]
    fn test_resolution_order() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(None).in_dir(dir.path());
        assert_eq!(loader.resolve_with(None), None);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "generate_header: false\n").unwrap();
        assert_eq!(
            loader.resolve_with(None),
            Some(dir.path().join(DEFAULT_CONFIG_FILE))
        );
        assert_eq!(
            loader.resolve_with(Some(PathBuf::from("env.yaml"))),
            Some(PathBuf::from("env.yaml"))
        );

        let explicit = ConfigLoader::new(Some(PathBuf::from("explicit.yaml"))).in_dir(dir.path());
        assert_eq!(
            explicit.resolve_with(Some(PathBuf::from("env.yaml"))),
            Some(PathBuf::from("explicit.yaml"))
        );
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builder.yaml");
        std::fs::write(&path, "schema_version: 1.1.0\ngenerate_header: false\n").unwrap();
        let config = ConfigLoader::load_file(&path).unwrap();
        assert!(!config.generate_header);
        assert_eq!(config.schema().namespace, "http://www.osgi.org/xmlns/scr/v1.1.0");

        std::fs::write(&path, "descriptor_folder: ' '\n").unwrap();
        assert!(ConfigLoader::load_file(&path).is_err());
        assert!(ConfigLoader::load_file(&dir.path().join("missing.yaml")).is_err());
    }
}
