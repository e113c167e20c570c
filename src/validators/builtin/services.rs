//! Service validators: the platform must offer the services, clients,
//! extensions and API versions a scenario relies on.

use crate::core::args::ValidatorArgs;
use crate::core::config::{display_value, ScenarioConfig};
use crate::core::credentials::{Credentials, DEFAULT_PLATFORM};
use crate::core::error::{ClientError, PreflightError, PreflightResult};
use crate::core::result::ValidationResult;
use crate::core::settings::DEFAULT_NAMESPACE;
use crate::platform::Clients;
use crate::validators::builtin::structural::expand_user;
use crate::validators::builtin::{for_each_user, with_admin};
use crate::validators::plugin::ScenarioPlugin;
use crate::validators::registry::{ConfigurableValidator, Validator, ValidatorMetadata, ValidatorRegistry};
use serde_json::Value;
use std::fs;

const NOVA_NETWORK: &str = "nova-network";

/// Register service validators.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register_type::<RequiredServices>();
    registry.register_type::<RequiredClients>();
    registry.register_type::<RequiredNeutronExtensions>();
    registry.register_type::<RequiredApiVersions>();
    registry.register_type::<RequiredCinderServices>();
    registry.register_type::<ValidateHeatTemplate>();
}

/// Services must be present in the admin service catalog.
///
/// `nova-network` is also accepted when the compute service reports an
/// enabled `nova-network` process.
#[derive(Debug, Clone)]
pub struct RequiredServices {
    services: Vec<String>,
    platform: String,
}

impl ConfigurableValidator for RequiredServices {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_services", DEFAULT_NAMESPACE)
            .description("Check that the required services are available")
            .platform(DEFAULT_PLATFORM)
            .admin()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            services: args.str_list("required_services", 0, "services")?,
        })
    }
}

impl Validator for RequiredServices {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        with_admin(credentials, &self.platform, |clients| {
            let catalog = clients.services()?;
            // An enabled nova-network compute process counts even when the catalog omits it.
            let nova_network_enabled = if self.services.iter().any(|service| service == NOVA_NETWORK) {
                log::warn!(
                    "Service '{}' is deprecated and no longer supported by the compute client",
                    NOVA_NETWORK
                );
                clients
                    .compute()?
                    .list_services()?
                    .iter()
                    .any(|process| process.binary == NOVA_NETWORK && process.status == "enabled")
            } else {
                false
            };

            for service in &self.services {
                // Services with a custom type or name are validated by the api_versions context.
                let customized = config
                    .api_versions(service)
                    .map(|settings| settings.contains_key("service_type") || settings.contains_key("service_name"))
                    .unwrap_or(false);
                if customized {
                    continue;
                }

                let available = catalog.values().any(|name| name == service)
                    || (service == NOVA_NETWORK && nova_network_enabled);
                if !available {
                    return Ok(ValidationResult::invalid(format!(
                        "'{0}' service is not available. Hint: If '{0}' service has non-default \
                         service_type, try to setup it via 'api_versions' context.",
                        service
                    )));
                }
            }
            Ok(ValidationResult::valid())
        })
    }
}

/// Clients for the given components must be installed.
#[derive(Debug, Clone)]
pub struct RequiredClients {
    components: Vec<String>,
    admin: bool,
    platform: String,
}

impl RequiredClients {
    fn check(&self, clients: &dyn Clients) -> PreflightResult<ValidationResult> {
        for component in &self.components {
            match clients.ensure_client(component) {
                Ok(()) => {}
                Err(ClientError::ClientUnavailable { component, hint }) => {
                    let msg = match hint {
                        Some(hint) => format!("Client for {} is not installed. {}", component, hint),
                        None => format!("Client for {} is not installed", component),
                    };
                    return Ok(ValidationResult::invalid(msg));
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(ValidationResult::valid())
    }
}

impl ConfigurableValidator for RequiredClients {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_clients", DEFAULT_NAMESPACE)
            .description("Check that the clients for the given components are installed")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            components: args.str_list("required_clients", 0, "components")?,
            admin: match args.kwargs.get("admin") {
                None => false,
                Some(Value::Bool(admin)) => *admin,
                Some(other) => {
                    return Err(PreflightError::invalid_args(
                        "required_clients",
                        format!("'admin' must be a boolean, got {}", other),
                    ))
                }
            },
        })
    }
}

impl Validator for RequiredClients {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        _config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        if self.admin {
            with_admin(credentials, &self.platform, |clients| self.check(clients))
        } else {
            for_each_user(credentials, &self.platform, |_, clients| self.check(clients))
        }
    }
}

/// Network extensions must be enabled for every user.
#[derive(Debug, Clone)]
pub struct RequiredNeutronExtensions {
    extensions: Vec<String>,
    platform: String,
}

impl ConfigurableValidator for RequiredNeutronExtensions {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_neutron_extensions", DEFAULT_NAMESPACE)
            .description("Check that the required network extensions are configured")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            extensions: args.str_list("required_neutron_extensions", 0, "extensions")?,
        })
    }
}

impl Validator for RequiredNeutronExtensions {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        _config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        for_each_user(credentials, &self.platform, |_, clients| {
            let enabled = clients.network()?.list_extensions()?;
            let missing = self.extensions.iter().find(|extension| !enabled.contains(extension));
            Ok(match missing {
                Some(extension) => {
                    ValidationResult::invalid(format!("Neutron extension {} is not configured", extension))
                }
                None => ValidationResult::valid(),
            })
        })
    }
}

/// The API version in use must be one the scenario was designed for.
#[derive(Debug, Clone)]
pub struct RequiredApiVersions {
    component: String,
    versions: Vec<String>,
    platform: String,
}

/// Compare version labels numerically when both parse, textually otherwise.
fn same_version(a: &str, b: &str) -> bool {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

impl RequiredApiVersions {
    fn accepts(&self, version: &str) -> bool {
        self.versions.iter().any(|accepted| same_version(accepted, version))
    }

    fn mismatch(&self, selected: &str) -> ValidationResult {
        ValidationResult::invalid(format!(
            "Task was designed to be used with {} V{}, but V{} is selected.",
            self.component,
            self.versions.join(", "),
            selected
        ))
    }
}

impl ConfigurableValidator for RequiredApiVersions {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_api_versions", DEFAULT_NAMESPACE)
            .description("Check that the selected API version is supported by the scenario")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        let versions = match args.get(1, "versions") {
            Some(Value::Array(items)) => items.iter().map(display_value).collect(),
            Some(single) => vec![display_value(single)],
            None => {
                return Err(PreflightError::invalid_args(
                    "required_api_versions",
                    "missing required argument 'versions'",
                ))
            }
        };
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            component: args.required_str("required_api_versions", 0, "component")?,
            versions,
        })
    }
}

impl Validator for RequiredApiVersions {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        for_each_user(credentials, &self.platform, |_, clients| {
            if self.component == "keystone" {
                let selected = clients.identity()?.version()?.label();
                return Ok(if self.accepts(selected) {
                    ValidationResult::valid()
                } else {
                    self.mismatch(selected)
                });
            }

            let configured = config
                .api_versions(&self.component)
                .and_then(|settings| settings.get("version"))
                .filter(|version| !version.is_null())
                .map(display_value);
            let selected = match configured {
                Some(version) => Some(version),
                None => clients.choose_version(&self.component)?,
            };

            Ok(match selected {
                None => ValidationResult::invalid("Unable to determine the API version."),
                Some(version) if self.accepts(&version) => ValidationResult::valid(),
                Some(version) => self.mismatch(&version),
            })
        })
    }
}

/// A block storage service must be up.
#[derive(Debug, Clone)]
pub struct RequiredCinderServices {
    service: String,
    platform: String,
}

impl ConfigurableValidator for RequiredCinderServices {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("required_cinder_services", DEFAULT_NAMESPACE)
            .description("Check that the block storage service is up")
            .platform(DEFAULT_PLATFORM)
            .admin()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            service: args.required_str("required_cinder_services", 0, "services")?,
        })
    }
}

impl Validator for RequiredCinderServices {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        _config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        with_admin(credentials, &self.platform, |clients| {
            let running = clients
                .volume()?
                .list_services()?
                .iter()
                .any(|service| service.binary == self.service && service.state == "up");
            Ok(ValidationResult::from_verdict(
                running,
                format!("{} service is not available", self.service),
            ))
        })
    }
}

/// Orchestration templates named by scenario arguments must validate.
#[derive(Debug, Clone)]
pub struct ValidateHeatTemplate {
    params: Vec<String>,
    platform: String,
}

impl ConfigurableValidator for ValidateHeatTemplate {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("validate_heat_template", DEFAULT_NAMESPACE)
            .description("Check that the orchestration templates are valid")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            params: args.str_list("validate_heat_template", 0, "params")?,
        })
    }
}

impl Validator for ValidateHeatTemplate {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        for param_name in &self.params {
            let Some(template_path) = config.present_arg(param_name).map(display_value) else {
                return Ok(ValidationResult::invalid(format!(
                    "Path to heat template is not specified. Its needed for heat template \
                     validation. Please check the content of `{}` scenario argument.",
                    param_name
                )));
            };

            let path = expand_user(&template_path);
            if !path.exists() {
                return Ok(ValidationResult::invalid(format!(
                    "No file found by the given path {}",
                    path.display()
                )));
            }
            let template = fs::read_to_string(&path)?;

            let result = for_each_user(credentials, &self.platform, |_, clients| {
                let outcome = clients
                    .orchestration()
                    .and_then(|orchestration| orchestration.validate_template(&template));
                Ok(match outcome {
                    Ok(()) => ValidationResult::valid(),
                    Err(error) => ValidationResult::invalid(format!(
                        "Heat template validation failed on {}. Original error message: {}.",
                        path.display(),
                        error
                    )),
                })
            })?;
            if !result.is_valid() {
                return Ok(result);
            }
        }
        Ok(ValidationResult::valid())
    }
}
