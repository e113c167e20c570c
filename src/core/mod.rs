//! Core types for the Preflight validation framework.
//!
//! This module contains the foundational types every validator works with:
//! - The validation result
//! - Scenario configuration and validator arguments
//! - Credentials and the deployment view
//! - Error types
//! - Run-wide settings

pub mod args;
pub mod config;
pub mod credentials;
pub mod error;
pub mod result;
pub mod settings;

// Re-export commonly used types
pub use args::ValidatorArgs;
pub use config::ScenarioConfig;
pub use credentials::{Credential, Credentials, Deployment, PlatformCredentials, UserCredential};
pub use error::{ClientError, CommandSpecError, PreflightError, PreflightResult};
pub use result::ValidationResult;
pub use settings::Settings;
