//! Legacy adapter.
//!
//! Older validators are plain functions of `(config, clients, deployment,
//! args)` that return a failure or nothing. [`LegacyValidator`] runs such a
//! function under the current contract: once per user of the platform, in
//! order, stopping at the first failure.

use crate::core::args::ValidatorArgs;
use crate::core::config::ScenarioConfig;
use crate::core::credentials::{Credentials, Deployment, DEFAULT_PLATFORM};
use crate::core::error::{PreflightError, PreflightResult};
use crate::core::result::ValidationResult;
use crate::core::settings::DEFAULT_NAMESPACE;
use crate::platform::Clients;
use crate::validators::plugin::ScenarioPlugin;
use crate::validators::registry::{Validator, ValidatorMetadata, ValidatorRegistry};
use serde_json::Value;
use std::fmt;

/// Signature of a legacy validator function.
///
/// `clients` is `None` when the platform has no users. Returning `Ok(None)`
/// means the check passed.
pub type LegacyFn = fn(
    &ScenarioConfig,
    Option<&dyn Clients>,
    &Deployment<'_>,
    &ValidatorArgs,
) -> PreflightResult<Option<ValidationResult>>;

/// A named legacy validator function.
#[derive(Clone, Copy)]
pub struct LegacyFunction {
    /// Name used in declarations.
    pub name: &'static str,
    /// The function itself.
    pub call: LegacyFn,
}

impl LegacyFunction {
    /// Pair a name with a function.
    pub const fn new(name: &'static str, call: LegacyFn) -> Self {
        Self { name, call }
    }

    /// Find a built-in legacy function by name.
    pub fn lookup(name: &str) -> PreflightResult<Self> {
        crate::validators::builtin::legacy_functions()
            .iter()
            .find(|function| function.name == name)
            .copied()
            .ok_or_else(|| PreflightError::UnknownLegacyFunction(name.to_string()))
    }
}

impl PartialEq for LegacyFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for LegacyFunction {}

impl fmt::Debug for LegacyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LegacyFunction({})", self.name)
    }
}

/// Runs a [`LegacyFunction`] once per platform user.
#[derive(Debug, Clone)]
pub struct LegacyValidator {
    function: LegacyFunction,
    args: ValidatorArgs,
    platform: String,
}

impl LegacyValidator {
    /// Wrap a function for the default platform.
    pub fn new(function: LegacyFunction, args: ValidatorArgs) -> Self {
        Self {
            function,
            args,
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    /// Iterate the users of another platform.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// The wrapped function.
    pub fn function(&self) -> LegacyFunction {
        self.function
    }

    fn run(
        &self,
        config: &ScenarioConfig,
        clients: Option<&dyn Clients>,
        deployment: &Deployment<'_>,
    ) -> PreflightResult<ValidationResult> {
        let outcome = (self.function.call)(config, clients, deployment, &self.args)?;
        Ok(ValidationResult::from_legacy(outcome))
    }
}

impl Validator for LegacyValidator {
    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let deployment = Deployment::new(credentials);
        let users = credentials.users(&self.platform);

        if users.is_empty() {
            return self.run(config, None, &deployment);
        }

        for user in users {
            let clients = user.credential.clients()?;
            let result = self.run(config, Some(clients.as_ref()), &deployment)?;
            if !result.is_valid() {
                log::debug!(
                    "Legacy validator '{}' failed for user '{}'",
                    self.function.name,
                    user.credential.username()
                );
                return Ok(result);
            }
        }
        Ok(ValidationResult::valid())
    }
}

/// Register the `old_validator` entry point.
///
/// Its first positional argument names the legacy function; the remaining
/// arguments are handed to that function.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register(
        ValidatorMetadata::builder("old_validator", DEFAULT_NAMESPACE)
            .description("Run a legacy validator function for every user")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build(),
        |args| {
            let name = args.required_str("old_validator", 0, "fn")?;
            let function = LegacyFunction::lookup(&name)?;
            let mut forwarded = args.clone();
            forwarded.kwargs.shift_remove("fn");
            if !forwarded.args.is_empty() && !args.kwargs.contains_key("fn") {
                forwarded.args.remove(0);
            }
            Ok(Box::new(LegacyValidator::new(function, forwarded)))
        },
    );
}
