//! Error types for Preflight.
//!
//! Uses thiserror for structured errors with context. Two families matter:
//! - Failures a user fixes by editing the scenario are never errors; they are
//!   reported as [`ValidationResult::Invalid`](crate::core::result::ValidationResult).
//! - Everything else (malformed command specs, unknown validators, transport or
//!   authentication failures of the platform clients) is an error and aborts
//!   the validation run.

use crate::core::result::ValidationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type for Preflight.
#[derive(Error, Debug)]
pub enum PreflightError {
    /// A scenario argument names nothing that can be resolved.
    #[error("Invalid scenario argument: {0}")]
    InvalidScenarioArgument(String),

    /// A platform client call failed.
    #[error("Platform client error: {0}")]
    Client(#[from] ClientError),

    /// A command dictionary is malformed.
    #[error("Invalid command specification: {0}")]
    Command(#[from] CommandSpecError),

    /// No validator is registered under the requested key.
    #[error("Validator '{name}' not found in namespace '{namespace}'")]
    UnknownValidator {
        /// Requested name.
        name: String,
        /// Requested namespace.
        namespace: String,
    },

    /// A validator declaration carries arguments the validator cannot use.
    #[error("Invalid arguments for validator '{validator}': {reason}")]
    InvalidValidatorArgs {
        /// Validator name.
        validator: String,
        /// What is wrong with the arguments.
        reason: String,
    },

    /// No legacy function has this name.
    #[error("Legacy validator function '{0}' is not known")]
    UnknownLegacyFunction(String),

    /// No deprecated entry point has this name.
    #[error("Deprecated validator '{0}' is not known")]
    UnknownDeprecatedValidator(String),

    /// A plugin manifest is inconsistent.
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// Reading a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PreflightError {
    /// Whether this error means "the named resource could not be resolved".
    ///
    /// Both a platform not-found and a rejected identifier transform qualify;
    /// resolvers turn these into validation failures instead of propagating them.
    pub fn is_resolution_miss(&self) -> bool {
        match self {
            PreflightError::InvalidScenarioArgument(_) => true,
            PreflightError::Client(error) => error.is_not_found(),
            _ => false,
        }
    }

    /// Shorthand for a validator argument error.
    pub fn invalid_args(validator: impl Into<String>, reason: impl Into<String>) -> Self {
        PreflightError::InvalidValidatorArgs {
            validator: validator.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by platform clients.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientError {
    /// The platform has no such resource.
    #[error("{resource} not found")]
    NotFound {
        /// What was looked up.
        resource: String,
    },

    /// The client library for a component is missing.
    #[error("Client for {component} is not installed")]
    ClientUnavailable {
        /// Component name.
        component: String,
        /// How to install the client, when known.
        hint: Option<String>,
    },

    /// The platform API answered with an error status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// The request never got an answer.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The credential was rejected.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),
}

impl ClientError {
    /// Shorthand for a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        ClientError::NotFound {
            resource: resource.into(),
        }
    }

    /// Check if the platform reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound { .. } => true,
            ClientError::Api { status, .. } => *status == 404,
            _ => false,
        }
    }
}

/// Structural errors in a command-specifying dictionary.
///
/// Every variant that inspected a dictionary carries it so the message shows
/// exactly what was supplied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandSpecError {
    /// The command is not a mapping.
    #[error("Command must be a dictionary")]
    NotAMapping,

    /// Both or neither of the inline and file scripts are given.
    #[error("Exactly one of script_inline or script_file with interpreter is expected: {command}")]
    ConflictingScript {
        /// The supplied dictionary.
        command: Value,
    },

    /// An uploaded interpreter does not match `remote_path`.
    #[error("When uploading an interpreter its path should be as well specified as the `remote_path' string: {command}")]
    InterpreterPathMismatch {
        /// The supplied dictionary.
        command: Value,
    },

    /// Neither an interpreter nor a remote path is given.
    #[error("Supplied dict specifies no command to execute, either interpreter or remote_path is required: {command}")]
    NoCommand {
        /// The supplied dictionary.
        command: Value,
    },

    /// The dictionary has keys outside the known set.
    #[error("Unexpected command parameters: {}", .keys.join(", "))]
    UnexpectedKeys {
        /// The unknown keys, sorted.
        keys: Vec<String>,
    },
}

/// Result type alias for Preflight operations.
pub type PreflightResult<T> = Result<T, PreflightError>;

/// Result type alias for platform client calls.
pub type ClientResult<T> = Result<T, ClientError>;

// ============================================================================
// Validation Report
// ============================================================================

/// The first failure of a plugin validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Name of the validator that failed.
    pub validator: String,
    /// Failure message.
    pub message: String,
}

/// Report of validating one scenario plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Identifier used to correlate log lines of this run.
    pub run_id: RunId,
    /// Name of the validated plugin.
    pub plugin: String,
    /// Whether every validator passed.
    pub success: bool,
    /// The failure that stopped the run, if any.
    pub failure: Option<ValidationFailure>,
    /// Number of validators that were executed.
    pub validators_run: usize,
    /// Time taken for validation in milliseconds.
    pub duration_ms: u64,
}

impl ValidationReport {
    /// Create a new empty report (success).
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            run_id: RunId::new(),
            plugin: plugin.into(),
            success: true,
            failure: None,
            validators_run: 0,
            duration_ms: 0,
        }
    }

    /// Record the failure that ends the run.
    pub fn fail(&mut self, validator: impl Into<String>, message: impl Into<String>) {
        self.success = false;
        self.failure = Some(ValidationFailure {
            validator: validator.into(),
            message: message.into(),
        });
    }

    /// The outcome of the run as a single validation result.
    pub fn result(&self) -> ValidationResult {
        match &self.failure {
            None => ValidationResult::valid(),
            Some(failure) => ValidationResult::invalid(failure.message.clone()),
        }
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!(
                "✓ {} passed {} validator(s)",
                self.plugin, self.validators_run
            ),
            Some(failure) => format!(
                "✗ {} failed validator '{}': {}",
                self.plugin, failure.validator, failure.message
            ),
        }
    }
}
