//! The outcome record shared by every validator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message used when a failure is constructed without one.
const UNSPECIFIED_FAILURE: &str = "Validation failed";

/// Explanation attached to a failing result. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FailureMessage(String);

impl FailureMessage {
    /// The message text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FailureMessage {
    fn from(msg: String) -> Self {
        if msg.is_empty() {
            Self(UNSPECIFIED_FAILURE.to_string())
        } else {
            Self(msg)
        }
    }
}

impl From<&str> for FailureMessage {
    fn from(msg: &str) -> Self {
        Self::from(msg.to_string())
    }
}

impl From<FailureMessage> for String {
    fn from(msg: FailureMessage) -> Self {
        msg.0
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single validator run.
///
/// A result is either valid, or invalid with a non-empty message explaining
/// what the user has to change in the scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    /// The configuration passed the check.
    Valid,
    /// The configuration failed the check.
    Invalid {
        /// Human-readable explanation of the failure.
        msg: FailureMessage,
    },
}

impl ValidationResult {
    /// A passing result.
    pub fn valid() -> Self {
        ValidationResult::Valid
    }

    /// A failing result. An empty message is replaced by a generic one.
    pub fn invalid(msg: impl Into<String>) -> Self {
        ValidationResult::Invalid {
            msg: FailureMessage::from(msg.into()),
        }
    }

    /// Build a result from a boolean verdict, as older validators do.
    pub fn from_verdict(is_valid: bool, msg: impl Into<String>) -> Self {
        if is_valid {
            ValidationResult::Valid
        } else {
            ValidationResult::invalid(msg)
        }
    }

    /// Normalize the "nothing returned" convention of legacy validators.
    pub fn from_legacy(result: Option<ValidationResult>) -> Self {
        result.unwrap_or(ValidationResult::Valid)
    }

    /// Whether the check passed.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Failure message; empty for a passing result.
    pub fn msg(&self) -> &str {
        match self {
            ValidationResult::Valid => "",
            ValidationResult::Invalid { msg } => msg.as_str(),
        }
    }

    /// Consume the result, yielding the failure message if there is one.
    pub fn into_failure(self) -> Option<String> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid { msg } => Some(msg.into()),
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        ValidationResult::Valid
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Valid => write!(f, "valid"),
            ValidationResult::Invalid { msg } => write!(f, "invalid: {}", msg),
        }
    }
}
