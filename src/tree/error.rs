//! Errors raised by tree validation and mutation

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single validation problem at a location in the input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location in the input, e.g. `root.children[1].type`
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Input did not conform to the expected shape
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Shorthand for a single issue
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(path, message)])
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    const SHOWN: usize = 3;
    let mut parts: Vec<String> = issues.iter().take(SHOWN).map(|i| i.to_string()).collect();
    if issues.len() > SHOWN {
        parts.push(format!("and {} more", issues.len() - SHOWN));
    }
    parts.join("; ")
}

/// Failures of the pure mutation primitives
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message_truncates() {
        let err = ValidationError::new(
            (0..5)
                .map(|i| ValidationIssue::new(format!("root.children[{}]", i), "bad"))
                .collect(),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("Validation failed: root.children[0]: bad"));
        assert!(msg.ends_with("and 2 more"));
    }

    #[test]
    fn test_issue_without_path() {
        assert_eq!(ValidationIssue::new("", "empty").to_string(), "empty");
    }
}
