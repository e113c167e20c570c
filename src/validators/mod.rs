//! Validator registry, built-in validators and plugin declarations.
//!
//! Validators are registered under a `(name, namespace)` key together with
//! metadata describing what they need from the deployment. Scenario plugins
//! declare the validators they rely on; the validation pipeline resolves
//! those declarations against a registry and runs them.

pub mod builtin;
pub mod deprecated;
pub mod legacy;
pub mod manifest;
pub mod plugin;
pub mod registry;

pub use deprecated::{DeprecatedValidator, DEPRECATED_VALIDATORS};
pub use legacy::{LegacyFn, LegacyFunction, LegacyValidator};
pub use manifest::{PluginEntry, PluginManifest, ValidatorEntry};
pub use plugin::{PluginSummary, ScenarioPlugin, ScenarioPluginBuilder, ValidatorSpec};
pub use registry::{
    Capabilities, ConfigurableValidator, RegistryEntry, Validator, ValidatorFactory, ValidatorKey,
    ValidatorKind, ValidatorMetadata, ValidatorRegistry,
};
