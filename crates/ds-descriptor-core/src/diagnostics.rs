//! Problem reporting
//!
//! Single problem type produced by the rule engine and the intent translator.
//! A problem is attributable: it carries a code, a message and, where one
//! exists, the name of the descriptor field that caused it.

use serde::{Deserialize, Serialize};

/// Problem severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Problem codes for categorizing issues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemCode {
    Precondition,

    // =========================================================================
    // Component attributes
    // =========================================================================
    Conflict,
    NoSupertype,
    UnknownType,
    InvalidEnumValue,
    InvalidProperty,
    NonExistingMethod,

    // =========================================================================
    // References
    // =========================================================================
    InvalidReferenceName,
    DuplicateReferenceName,
    NonExistingUnbindMethod,
    NonExistingUpdatedMethod,
    AnnotatedUnbindMethod,
    InvalidFilter,
    UnknownCardinality,
}

/// A validation failure with severity, message and optional offending field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub severity: Severity,
    pub code: ProblemCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Problem {
    /// Create an error problem
    pub fn error(code: ProblemCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Create a warning problem
    pub fn warning(code: ProblemCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Attribute the problem to a descriptor field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.field {
            Some(field) => write!(f, "{} [{:?}] {}: {}", level, self.code, field, self.message),
            None => write!(f, "{} [{:?}] {}", level, self.code, self.message),
        }
    }
}

/// True if any problem in the slice blocks descriptor output
pub fn has_errors(problems: &[Problem]) -> bool {
    problems.iter().any(Problem::is_error)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let problem = Problem::error(ProblemCode::Conflict, "same method");
        assert!(problem.is_error());
        assert!(!problem.is_warning());
        assert_eq!(problem.message, "same method");
        assert!(problem.field.is_none());
    }

    #[test]
    fn test_with_field() {
        let problem =
            Problem::error(ProblemCode::InvalidFilter, "Invalid filter '(a='.").with_field("target");
        assert_eq!(problem.field.as_deref(), Some("target"));
        assert_eq!(
            problem.to_string(),
            "error [InvalidFilter] target: Invalid filter '(a='."
        );
    }

    #[test]
    fn test_warnings_do_not_block_output() {
        let problems = vec![Problem::warning(
            ProblemCode::UnknownCardinality,
            "unknown cardinality 'lots'",
        )];
        assert!(!has_errors(&problems));

        let mut problems = problems;
        problems.push(Problem::error(ProblemCode::NoSupertype, "NO SUPERTYPE 'a.B'."));
        assert!(has_errors(&problems));
    }
}
