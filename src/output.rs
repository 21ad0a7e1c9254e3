//! Descriptor output
//!
//! Writes one `<descriptor folder>/<binary name>.xml` per valid component.
//! Files whose persisted content is equivalent to the new descriptor are left
//! untouched. A component with errors gets no file, and any descriptor left
//! over from an earlier build is removed.

use crate::config::BuilderConfig;
use crate::error::BuildError;
use crate::translate::TypeTranslation;
use anyhow::{Context, Result};
use ds_descriptor_core::{has_errors, matches_persisted, Problem, XmlAdapter};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Written,
    Unchanged,
    /// Valid, but checked without writing.
    Valid,
    /// Not written because of errors.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReport {
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub status: OutputStatus,
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub types: Vec<TypeReport>,
}

impl BuildReport {
    pub fn has_errors(&self) -> bool {
        self.types.iter().any(|t| has_errors(&t.problems))
    }

    pub fn count(&self, status: OutputStatus) -> usize {
        self.types.iter().filter(|t| t.status == status).count()
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeReport> {
        self.types.iter().find(|t| t.type_name == type_name)
    }
}

/// Report for a run that writes nothing.
pub fn check_report(translations: Vec<TypeTranslation>) -> BuildReport {
    let types = translations
        .into_iter()
        .map(|t| TypeReport {
            status: if t.is_valid() {
                OutputStatus::Valid
            } else {
                OutputStatus::Skipped
            },
            type_name: t.type_name,
            path: None,
            problems: t.outcome.problems,
        })
        .collect();
    BuildReport { types }
}

pub struct DescriptorWriter {
    root: PathBuf,
    config: BuilderConfig,
    adapter: XmlAdapter,
}

impl DescriptorWriter {
    pub fn new(root: impl Into<PathBuf>, config: BuilderConfig) -> Self {
        let adapter = config.adapter();
        Self {
            root: root.into(),
            config,
            adapter,
        }
    }

    pub fn descriptor_path(&self, type_name: &str) -> PathBuf {
        self.root
            .join(&self.config.descriptor_folder)
            .join(format!("{}.xml", type_name))
    }

    /// Render the descriptor text, with the header comment when enabled.
    pub fn render(&self, translation: &TypeTranslation) -> Result<String, BuildError> {
        let source = translation
            .source
            .as_deref()
            .filter(|_| self.config.generate_header);
        self.adapter
            .to_xml(&translation.outcome.descriptor, source)
            .map_err(|source| BuildError::Render {
                type_name: translation.type_name.clone(),
                source,
            })
    }

    pub fn write_all(&self, translations: Vec<TypeTranslation>) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        for translation in translations {
            report.types.push(self.write(translation)?);
        }
        info!(
            "Descriptors: {} written, {} unchanged, {} skipped",
            report.count(OutputStatus::Written),
            report.count(OutputStatus::Unchanged),
            report.count(OutputStatus::Skipped)
        );
        Ok(report)
    }

    pub fn write(&self, translation: TypeTranslation) -> Result<TypeReport> {
        let path = self.descriptor_path(&translation.type_name);

        let status = if !translation.is_valid() {
            self.remove_stale(&path)?;
            warn!(
                "Skipping {}: {} problem(s)",
                translation.type_name,
                translation.outcome.problems.len()
            );
            OutputStatus::Skipped
        } else if self.is_unchanged(&path, &translation) {
            debug!("Unchanged {}", path.display());
            OutputStatus::Unchanged
        } else {
            let xml = self.render(&translation)?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, xml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
            OutputStatus::Written
        };

        Ok(TypeReport {
            type_name: translation.type_name,
            path: Some(path),
            status,
            problems: translation.outcome.problems,
        })
    }

    /// A persisted file that cannot be read or parsed counts as changed.
    fn is_unchanged(&self, path: &Path, translation: &TypeTranslation) -> bool {
        let Ok(persisted) = std::fs::read_to_string(path) else {
            return false;
        };
        match matches_persisted(&self.adapter, &translation.outcome.descriptor, &persisted) {
            Ok(equal) => equal,
            Err(err) => {
                debug!("Replacing unreadable {}: {}", path.display(), err);
                false
            }
        }
    }

    fn remove_stale(&self, path: &Path) -> Result<()> {
        if path.is_file() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            info!("Removed stale {}", path.display());
        }
        Ok(())
    }
}
