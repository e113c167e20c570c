//! Scenario plugin declarations.
//!
//! A scenario plugin carries an ordered list of validator declarations. The
//! list is assembled once through [`ScenarioPluginBuilder`] and never
//! changes afterwards.

use crate::core::args::ValidatorArgs;
use crate::core::error::PreflightResult;
use crate::core::settings::Settings;
use crate::validators::deprecated;
use crate::validators::legacy::{LegacyFunction, LegacyValidator};
use crate::validators::registry::{ValidatorKind, ValidatorRegistry};
use serde::Serialize;

/// One validator declaration of a scenario plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorSpec {
    /// A validator looked up in the registry.
    Registered {
        /// Registered name.
        name: String,
        /// Namespace; the run's default namespace when unset.
        namespace: Option<String>,
        /// Declaration arguments.
        args: ValidatorArgs,
    },
    /// A legacy function run through the legacy adapter.
    Legacy {
        /// The function.
        function: LegacyFunction,
        /// Arguments handed to the function.
        args: ValidatorArgs,
    },
}

impl ValidatorSpec {
    /// Declare a registered validator in the default namespace.
    pub fn registered(name: impl Into<String>, args: ValidatorArgs) -> Self {
        ValidatorSpec::Registered {
            name: name.into(),
            namespace: None,
            args,
        }
    }

    /// Name shown in reports and logs.
    pub fn name(&self) -> &str {
        match self {
            ValidatorSpec::Registered { name, .. } => name,
            ValidatorSpec::Legacy { function, .. } => function.name,
        }
    }

    /// Declaration arguments.
    pub fn args(&self) -> &ValidatorArgs {
        match self {
            ValidatorSpec::Registered { args, .. } | ValidatorSpec::Legacy { args, .. } => args,
        }
    }

    /// Build the validator this declaration describes.
    pub fn instantiate(&self, registry: &ValidatorRegistry, settings: &Settings) -> PreflightResult<ValidatorKind> {
        match self {
            ValidatorSpec::Registered { name, namespace, args } => {
                let namespace = namespace.as_deref().unwrap_or(&settings.namespace);
                let mut validator = registry.instantiate(name, namespace, args)?;
                validator.bind_platform(&settings.platform);
                Ok(ValidatorKind::Native(validator))
            }
            ValidatorSpec::Legacy { function, args } => Ok(ValidatorKind::Legacy(
                LegacyValidator::new(*function, args.clone()).with_platform(settings.platform.clone()),
            )),
        }
    }
}

/// A scenario plugin and its validator declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPlugin {
    name: String,
    validators: Vec<ValidatorSpec>,
}

impl ScenarioPlugin {
    /// Start declaring a plugin.
    pub fn builder(name: impl Into<String>) -> ScenarioPluginBuilder {
        ScenarioPluginBuilder::new(name)
    }

    /// Plugin name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validator declarations in order.
    pub fn validators(&self) -> &[ValidatorSpec] {
        &self.validators
    }

    /// Short description for listings.
    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            validators: self.validators.iter().map(|spec| spec.name().to_string()).collect(),
        }
    }
}

/// Serializable overview of a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginSummary {
    /// Plugin name.
    pub name: String,
    /// Validator names in declaration order.
    pub validators: Vec<String>,
}

/// Builder for ScenarioPlugin.
pub struct ScenarioPluginBuilder {
    name: String,
    validators: Vec<ValidatorSpec>,
}

impl ScenarioPluginBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validators: Vec::new(),
        }
    }

    /// Add a registered validator from the default namespace.
    pub fn validator(mut self, name: impl Into<String>, args: ValidatorArgs) -> Self {
        self.validators.push(ValidatorSpec::registered(name, args));
        self
    }

    /// Add a registered validator from a given namespace.
    pub fn validator_in(
        mut self,
        name: impl Into<String>,
        namespace: impl Into<String>,
        args: ValidatorArgs,
    ) -> Self {
        self.validators.push(ValidatorSpec::Registered {
            name: name.into(),
            namespace: Some(namespace.into()),
            args,
        });
        self
    }

    /// Add a legacy function.
    pub fn legacy(mut self, function: LegacyFunction, args: ValidatorArgs) -> Self {
        self.validators.push(ValidatorSpec::Legacy { function, args });
        self
    }

    /// Add a built-in legacy function by name.
    pub fn legacy_named(self, name: &str, args: ValidatorArgs) -> PreflightResult<Self> {
        let function = LegacyFunction::lookup(name)?;
        Ok(self.legacy(function, args))
    }

    /// Add a validator through a deprecated entry point.
    ///
    /// A warning is logged and the declaration is stored under the new name.
    pub fn deprecated(mut self, old_name: &str, args: ValidatorArgs) -> PreflightResult<Self> {
        let spec = deprecated::forward(&self.name, old_name, args)?;
        self.validators.push(spec);
        Ok(self)
    }

    /// Add a prepared declaration.
    pub fn spec(mut self, spec: ValidatorSpec) -> Self {
        self.validators.push(spec);
        self
    }

    /// Build the plugin.
    pub fn build(self) -> ScenarioPlugin {
        ScenarioPlugin {
            name: self.name,
            validators: self.validators,
        }
    }
}
