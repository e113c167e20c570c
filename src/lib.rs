//! # Preflight - Benchmark Scenario Validation
//!
//! Preflight checks a benchmark scenario configuration before any workload
//! runs: are the arguments well formed, do the images and flavors it names
//! exist, does the platform offer the services, clients and API versions the
//! scenario needs?
//!
//! ## Features
//!
//! - **Validator registry**: validators are registered under a `(name, namespace)` key
//! - **Resource resolution**: images and flavors resolve through the live catalog or
//!   through resources the scenario context pre-provisions
//! - **Legacy functions**: plain functions run per user through an adapter
//! - **Deprecated entry points**: old validator names forward to their replacements
//! - **Manifests**: plugins and their validators can be declared in TOML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use preflight::prelude::*;
//! use serde_json::json;
//!
//! let registry = ValidatorRegistry::with_builtins();
//!
//! let plugin = ScenarioPlugin::builder("NovaServers.boot_server")
//!     .validator("image_valid_on_flavor", ValidatorArgs::new().arg("flavor").arg("image"))
//!     .validator_in("number", "default", ValidatorArgs::new().arg("count").kwarg("minval", 1))
//!     .build();
//!
//! let config = ScenarioConfig::new()
//!     .with_arg("flavor", json!({"name": "m1.tiny"}))
//!     .with_arg("image", json!({"name": "cirros"}))
//!     .with_arg("count", json!(2));
//!
//! let pipeline = ValidationPipeline::new(&registry);
//! let report = pipeline.validate(&plugin, &credentials, &config, None)?;
//! println!("{}", report.summary());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: results, scenario configuration, credentials, arguments and errors
//! - [`platform`]: the client capability validators talk to the platform through
//! - [`resources`]: image and flavor resolution
//! - [`validators`]: registry, built-in validators, plugin declarations
//! - [`validation`]: the pipeline running a plugin's validators
//!
//! ## Writing a Validator
//!
//! ```rust,ignore
//! use preflight::prelude::*;
//!
//! struct NotEmpty {
//!     param_name: String,
//! }
//!
//! impl ConfigurableValidator for NotEmpty {
//!     fn metadata() -> ValidatorMetadata {
//!         ValidatorMetadata::builder("not_empty", "default")
//!             .description("Check that an argument is set")
//!             .build()
//!     }
//!
//!     fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
//!         Ok(Self { param_name: args.required_str("not_empty", 0, "param_name")? })
//!     }
//! }
//!
//! impl Validator for NotEmpty {
//!     fn validate(
//!         &self,
//!         _credentials: &Credentials,
//!         config: &ScenarioConfig,
//!         _plugin: &ScenarioPlugin,
//!         _platform_config: Option<&serde_json::Value>,
//!     ) -> PreflightResult<ValidationResult> {
//!         Ok(ValidationResult::from_verdict(
//!             config.present_arg(&self.param_name).is_some(),
//!             format!("Parameter {} is not specified.", self.param_name),
//!         ))
//!     }
//! }
//!
//! ValidatorRegistry::global().write().register_type::<NotEmpty>();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod platform;
pub mod resources;
pub mod validation;
pub mod validators;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use preflight::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::args::ValidatorArgs;
    pub use crate::core::config::ScenarioConfig;
    pub use crate::core::credentials::{
        Credential, Credentials, Deployment, PlatformCredentials, UserCredential, DEFAULT_PLATFORM,
    };
    pub use crate::core::result::{FailureMessage, ValidationResult};
    pub use crate::core::settings::{Settings, DEFAULT_NAMESPACE};

    // Errors
    pub use crate::core::error::{
        ClientError, ClientResult, CommandSpecError, PreflightError, PreflightResult, RunId,
        ValidationFailure, ValidationReport,
    };

    // Platform
    pub use crate::platform::{Clients, IdentityVersion};

    // Resources
    pub use crate::resources::{
        FlavorDescriptor, FlavorId, IdentifierTransform, ImageDescriptor, Resolution, ResourceResolver,
    };

    // Validators
    pub use crate::validators::legacy::{LegacyFunction, LegacyValidator};
    pub use crate::validators::manifest::PluginManifest;
    pub use crate::validators::plugin::{ScenarioPlugin, ScenarioPluginBuilder, ValidatorSpec};
    pub use crate::validators::registry::{
        Capabilities, ConfigurableValidator, Validator, ValidatorKind, ValidatorMetadata, ValidatorRegistry,
    };

    // Validation
    pub use crate::validation::pipeline::ValidationPipeline;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
