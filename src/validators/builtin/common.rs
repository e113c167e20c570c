//! Platform-independent validators that only look at the scenario
//! configuration and the shape of the credentials.

use crate::core::args::ValidatorArgs;
use crate::core::config::{display_value, ScenarioConfig};
use crate::core::credentials::Credentials;
use crate::core::error::{PreflightError, PreflightResult};
use crate::core::result::ValidationResult;
use crate::validators::builtin::structural::{file_access_ok, AccessMode};
use crate::validators::plugin::ScenarioPlugin;
use crate::validators::registry::{ConfigurableValidator, Validator, ValidatorMetadata, ValidatorRegistry};
use serde_json::{Map, Value};

/// Namespace of the platform-independent validators.
pub const GENERIC_NAMESPACE: &str = "default";

/// Register the generic validators.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register_type::<RequiredPlatform>();
    registry.register_type::<NumberValidator>();
    registry.register_type::<FileExists>();
    registry.register_type::<RestrictedParameters>();
    registry.register_type::<RequiredParamOrContext>();
    registry.register_type::<RequiredContexts>();
}

// ============================================================================
// required_platform
// ============================================================================

/// The deployment must provide admin and/or user credentials for a platform.
#[derive(Debug, Clone)]
pub struct RequiredPlatform {
    platform: String,
    admin: bool,
    users: bool,
}

impl ConfigurableValidator for RequiredPlatform {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_platform", GENERIC_NAMESPACE)
            .description("Check that the deployment has the requested credentials for a platform")
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: args.required_str("required_platform", 0, "platform")?,
            admin: args.bool_or("required_platform", 1, "admin", false)?,
            users: args.bool_or("required_platform", 2, "users", false)?,
        })
    }
}

impl Validator for RequiredPlatform {
    fn validate(
        &self,
        credentials: &Credentials,
        _config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        if !(self.admin || self.users) {
            return Ok(ValidationResult::invalid(
                "You should specify admin=True or users=True or both.",
            ));
        }

        let has_admin = credentials.admin(&self.platform).is_some();
        let has_users = !credentials.users(&self.platform).is_empty();

        if self.admin && !has_admin {
            return Ok(ValidationResult::invalid(format!(
                "No admin credential for {}",
                self.platform
            )));
        }
        // Users can be created from the admin credential.
        if self.users && !has_users && !has_admin {
            return Ok(ValidationResult::invalid(format!(
                "No user credentials for {}",
                self.platform
            )));
        }
        Ok(ValidationResult::valid())
    }
}

// ============================================================================
// number
// ============================================================================

/// A scenario argument must be a number within optional bounds.
#[derive(Debug, Clone)]
pub struct NumberValidator {
    param_name: String,
    minval: Option<f64>,
    maxval: Option<f64>,
    nullable: bool,
    integer_only: bool,
}

impl NumberValidator {
    fn parse(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) if self.integer_only => n.as_i64().map(|i| i as f64),
            Value::Number(n) => n.as_f64(),
            Value::String(s) if self.integer_only => s.trim().parse::<i64>().ok().map(|i| i as f64),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

impl ConfigurableValidator for NumberValidator {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("number", GENERIC_NAMESPACE)
            .description("Check that a scenario argument is a number within bounds")
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            param_name: args.required_str("number", 0, "param_name")?,
            minval: args.opt_f64("number", 1, "minval")?,
            maxval: args.opt_f64("number", 2, "maxval")?,
            nullable: args.bool_or("number", 3, "nullable", false)?,
            integer_only: args.bool_or("number", 4, "integer_only", false)?,
        })
    }
}

impl Validator for NumberValidator {
    fn validate(
        &self,
        _credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let value = config.arg(&self.param_name).cloned().unwrap_or(Value::Null);
        let shown = display_value(&value);

        if self.integer_only && matches!(&value, Value::Number(n) if n.is_f64()) {
            return Ok(ValidationResult::invalid(format!(
                "{} is {} which hasn't int type",
                self.param_name, shown
            )));
        }
        if self.nullable && value.is_null() {
            return Ok(ValidationResult::valid());
        }

        let Some(number) = self.parse(&value) else {
            let kind = if self.integer_only { "int" } else { "float" };
            return Ok(ValidationResult::invalid(format!(
                "{} is {} which is not a valid {}",
                self.param_name, shown, kind
            )));
        };

        if let Some(minval) = self.minval.filter(|min| number < *min) {
            return Ok(ValidationResult::invalid(format!(
                "{} is {} which is less than the minimum ({})",
                self.param_name, shown, minval
            )));
        }
        if let Some(maxval) = self.maxval.filter(|max| number > *max) {
            return Ok(ValidationResult::invalid(format!(
                "{} is {} which is greater than the maximum ({})",
                self.param_name, shown, maxval
            )));
        }
        Ok(ValidationResult::valid())
    }
}

// ============================================================================
// file_exists
// ============================================================================

/// A scenario argument must name an accessible file.
#[derive(Debug, Clone)]
pub struct FileExists {
    param_name: String,
    mode: AccessMode,
    required: bool,
}

impl ConfigurableValidator for FileExists {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("file_exists", GENERIC_NAMESPACE)
            .description("Check that a file named by a scenario argument is accessible")
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        let mode = match args.get(1, "mode") {
            Some(mode) => AccessMode::from_value("file_exists", mode)?,
            None => AccessMode::default(),
        };
        Ok(Self {
            param_name: args.required_str("file_exists", 0, "param_name")?,
            mode,
            required: args.bool_or("file_exists", 2, "required", true)?,
        })
    }
}

impl Validator for FileExists {
    fn validate(
        &self,
        _credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let filename = config.present_arg(&self.param_name).map(display_value);
        Ok(file_access_ok(
            filename.as_deref(),
            self.mode,
            &self.param_name,
            self.required,
        ))
    }
}

// ============================================================================
// restricted_parameters
// ============================================================================

/// Some parameters must not appear in the arguments, or in one of their
/// sub-dictionaries.
#[derive(Debug, Clone)]
pub struct RestrictedParameters {
    param_names: Vec<String>,
    subdict: Option<String>,
}

impl ConfigurableValidator for RestrictedParameters {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("restricted_parameters", GENERIC_NAMESPACE)
            .description("Check that restricted parameters are not set")
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        let param_names = match args.get(0, "param_names") {
            Some(Value::String(name)) => vec![name.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(String::from).ok_or_else(|| {
                        PreflightError::invalid_args(
                            "restricted_parameters",
                            format!("'param_names' must contain strings, got {}", item),
                        )
                    })
                })
                .collect::<PreflightResult<_>>()?,
            Some(other) => {
                return Err(PreflightError::invalid_args(
                    "restricted_parameters",
                    format!("'param_names' must be a string or a list, got {}", other),
                ))
            }
            None => {
                return Err(PreflightError::invalid_args(
                    "restricted_parameters",
                    "missing required argument 'param_names'",
                ))
            }
        };
        Ok(Self {
            param_names,
            subdict: args.opt_str("restricted_parameters", 1, "subdict")?,
        })
    }
}

impl Validator for RestrictedParameters {
    fn validate(
        &self,
        _credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let empty = Map::new();
        let scope = match &self.subdict {
            Some(subdict) => config.arg(subdict).and_then(Value::as_object).unwrap_or(&empty),
            None => &config.args,
        };

        let restricted: Vec<&str> = self
            .param_names
            .iter()
            .filter(|name| scope.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if restricted.is_empty() {
            return Ok(ValidationResult::valid());
        }
        Ok(ValidationResult::invalid(format!(
            "You can't specify parameters '{}' in '{}'",
            restricted.join(", "),
            self.subdict.as_deref().unwrap_or("args")
        )))
    }
}

// ============================================================================
// required_param_or_context
// ============================================================================

/// Either a scenario argument or a context must be present.
#[derive(Debug, Clone)]
pub struct RequiredParamOrContext {
    param_name: String,
    ctx_name: String,
}

impl ConfigurableValidator for RequiredParamOrContext {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_param_or_context", GENERIC_NAMESPACE)
            .description("Check that either an argument or a context is specified")
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            param_name: args.required_str("required_param_or_context", 0, "param_name")?,
            ctx_name: args.required_str("required_param_or_context", 1, "ctx_name")?,
        })
    }
}

impl Validator for RequiredParamOrContext {
    fn validate(
        &self,
        _credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let satisfied = config.has_context(&self.ctx_name) || config.args.contains_key(&self.param_name);
        Ok(ValidationResult::from_verdict(
            satisfied,
            format!(
                "You should specify either scenario argument {} or use context {}.",
                self.param_name, self.ctx_name
            ),
        ))
    }
}

// ============================================================================
// required_contexts
// ============================================================================

/// A required context, or a group of which at least one is required.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ContextRequirement {
    Single(String),
    AnyOf(Vec<String>),
}

impl ContextRequirement {
    fn from_value(value: &Value) -> PreflightResult<Self> {
        let as_name = |value: &Value| {
            value.as_str().map(String::from).ok_or_else(|| {
                PreflightError::invalid_args(
                    "required_contexts",
                    format!("context names must be strings, got {}", value),
                )
            })
        };
        match value {
            Value::Array(group) => Ok(ContextRequirement::AnyOf(
                group.iter().map(as_name).collect::<PreflightResult<_>>()?,
            )),
            single => as_name(single).map(ContextRequirement::Single),
        }
    }

    fn satisfied_by(&self, config: &ScenarioConfig) -> bool {
        match self {
            ContextRequirement::Single(name) => config.has_context(name),
            ContextRequirement::AnyOf(group) => group.iter().any(|name| config.has_context(name)),
        }
    }

    fn describe(&self) -> String {
        match self {
            ContextRequirement::Single(name) => name.clone(),
            ContextRequirement::AnyOf(group) => format!("'{}'", group.join("' or '")),
        }
    }
}

/// Every listed context must be present in the scenario configuration.
#[derive(Debug, Clone)]
pub struct RequiredContexts {
    contexts: Vec<ContextRequirement>,
}

impl ConfigurableValidator for RequiredContexts {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_contexts", GENERIC_NAMESPACE)
            .description("Check that the required contexts are specified")
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        let declared: Vec<&Value> = match args.kwargs.get("contexts") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
            None => args.args.iter().collect(),
        };
        Ok(Self {
            contexts: declared
                .into_iter()
                .map(ContextRequirement::from_value)
                .collect::<PreflightResult<_>>()?,
        })
    }
}

impl Validator for RequiredContexts {
    fn validate(
        &self,
        _credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let missing: Vec<String> = self
            .contexts
            .iter()
            .filter(|requirement| !requirement.satisfied_by(config))
            .map(ContextRequirement::describe)
            .collect();
        if missing.is_empty() {
            return Ok(ValidationResult::valid());
        }
        Ok(ValidationResult::invalid(format!(
            "The following context(s) are required but missing from the input task file: {}",
            missing.join(", ")
        )))
    }
}
