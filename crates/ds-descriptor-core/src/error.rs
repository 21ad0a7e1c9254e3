//! Rule engine errors
//!
//! Every semantic rule failure is a [`DescriptorError`] variant. They split
//! into two tiers: precondition violations (a caller bug, aborts the build)
//! and recoverable validation failures, which convert into [`Problem`]s.

use crate::diagnostics::{Problem, ProblemCode};
use thiserror::Error;

pub const FIELD_ACTIVATE: &str = "activate";
pub const FIELD_DEACTIVATE: &str = "deactivate";
pub const FIELD_MODIFIED: &str = "modified";
pub const FIELD_SERVICE: &str = "service";
pub const FIELD_PROPERTY: &str = "property";
pub const FIELD_CONFIGURATION_POLICY: &str = "configurationPolicy";
pub const FIELD_NAME: &str = "name";
pub const FIELD_UNBIND: &str = "unbind";
pub const FIELD_UPDATED: &str = "updated";
pub const FIELD_TARGET: &str = "target";
pub const FIELD_CARDINALITY: &str = "cardinality";
pub const FIELD_POLICY: &str = "policy";
pub const FIELD_POLICY_OPTION: &str = "policyOption";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    // ── Preconditions ──
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("cannot resolve component type '{0}'")]
    UnresolvedType(String),

    // ── Component attributes ──
    #[error("Activate and deactivate method have the same name '{method}'.")]
    Conflict { field: &'static str, method: String },

    #[error("NO SUPERTYPE '{0}'.")]
    NoSupertype(String),

    #[error("Unknown property type '{kind}' for property '{property}'.")]
    UnknownType { property: String, kind: String },

    #[error("Invalid property '{0}': expected 'name[:type]=value'.")]
    InvalidProperty(String),

    #[error("Invalid {field} value '{value}'.")]
    InvalidEnumValue { field: &'static str, value: String },

    // ── References ──
    #[error("Invalid reference name '{0}'.")]
    InvalidReferenceName(String),

    #[error("Invalid reference name '' (derived from bind method name '{0}').")]
    InvalidDerivedReferenceName(String),

    #[error("Reference name '{0}' is not unique.")]
    DuplicateReferenceName(String),

    #[error("Non existing unbind method '{0}'.")]
    NonExistingUnbindMethod(String),

    #[error("Non existing updated method '{0}'.")]
    NonExistingUpdatedMethod(String),

    #[error("Method '{method}' must not be annotated with the DS annotation '@{annotation}'.")]
    AnnotatedUnbindMethod { method: String, annotation: String },

    #[error("Invalid filter '{0}'.")]
    InvalidFilter(String),
}

impl DescriptorError {
    /// Precondition violations indicate a caller bug and abort the build.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DescriptorError::MissingArgument(_) | DescriptorError::UnresolvedType(_)
        )
    }

    /// Descriptor field the failure is attributed to.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DescriptorError::MissingArgument(arg) => Some(*arg),
            DescriptorError::UnresolvedType(_) => None,
            DescriptorError::Conflict { field, .. } => Some(*field),
            DescriptorError::NoSupertype(_) => Some(FIELD_SERVICE),
            DescriptorError::UnknownType { .. } | DescriptorError::InvalidProperty(_) => {
                Some(FIELD_PROPERTY)
            }
            DescriptorError::InvalidEnumValue { field, .. } => Some(*field),
            DescriptorError::InvalidReferenceName(_)
            | DescriptorError::InvalidDerivedReferenceName(_)
            | DescriptorError::DuplicateReferenceName(_) => Some(FIELD_NAME),
            DescriptorError::NonExistingUnbindMethod(_)
            | DescriptorError::AnnotatedUnbindMethod { .. } => Some(FIELD_UNBIND),
            DescriptorError::NonExistingUpdatedMethod(_) => Some(FIELD_UPDATED),
            DescriptorError::InvalidFilter(_) => Some(FIELD_TARGET),
        }
    }

    pub fn code(&self) -> ProblemCode {
        match self {
            DescriptorError::MissingArgument(_) | DescriptorError::UnresolvedType(_) => {
                ProblemCode::Precondition
            }
            DescriptorError::Conflict { .. } => ProblemCode::Conflict,
            DescriptorError::NoSupertype(_) => ProblemCode::NoSupertype,
            DescriptorError::UnknownType { .. } => ProblemCode::UnknownType,
            DescriptorError::InvalidProperty(_) => ProblemCode::InvalidProperty,
            DescriptorError::InvalidEnumValue { .. } => ProblemCode::InvalidEnumValue,
            DescriptorError::InvalidReferenceName(_)
            | DescriptorError::InvalidDerivedReferenceName(_) => ProblemCode::InvalidReferenceName,
            DescriptorError::DuplicateReferenceName(_) => ProblemCode::DuplicateReferenceName,
            DescriptorError::NonExistingUnbindMethod(_) => ProblemCode::NonExistingUnbindMethod,
            DescriptorError::NonExistingUpdatedMethod(_) => ProblemCode::NonExistingUpdatedMethod,
            DescriptorError::AnnotatedUnbindMethod { .. } => ProblemCode::AnnotatedUnbindMethod,
            DescriptorError::InvalidFilter(_) => ProblemCode::InvalidFilter,
        }
    }

    /// Convert a recoverable failure into a reportable problem.
    pub fn to_problem(&self) -> Problem {
        let problem = Problem::error(self.code(), self.to_string());
        match self.field() {
            Some(field) => problem.with_field(field),
            None => problem,
        }
    }
}

impl From<&DescriptorError> for Problem {
    fn from(err: &DescriptorError) -> Self {
        err.to_problem()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_split() {
        assert!(DescriptorError::MissingArgument("bind").is_precondition());
        assert!(DescriptorError::UnresolvedType("a.B".into()).is_precondition());
        assert!(!DescriptorError::Conflict {
            field: FIELD_DEACTIVATE,
            method: "stop".into(),
        }
        .is_precondition());
    }

    #[test]
    fn test_problem_conversion_keeps_field() {
        let problem = DescriptorError::InvalidFilter("(a=".into()).to_problem();
        assert_eq!(problem.code, ProblemCode::InvalidFilter);
        assert_eq!(problem.field.as_deref(), Some("target"));
        assert_eq!(problem.message, "Invalid filter '(a='.");

        let problem = DescriptorError::NoSupertype("a.B".into()).to_problem();
        assert_eq!(problem.message, "NO SUPERTYPE 'a.B'.");
        assert_eq!(problem.field.as_deref(), Some("service"));
    }
}
