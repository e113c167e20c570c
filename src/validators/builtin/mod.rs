//! Built-in validator implementations.
//!
//! This module contains the standard validators that ship with Preflight.

mod common;
mod resources;
mod services;
mod structural;

use crate::core::credentials::{Credentials, UserCredential};
use crate::core::error::PreflightResult;
use crate::core::result::ValidationResult;
use crate::platform::Clients;
use crate::validators::legacy::{self, LegacyFunction};
use crate::validators::registry::ValidatorRegistry;

/// Register all built-in validators.
pub fn register_all(registry: &mut ValidatorRegistry) {
    common::register(registry);
    resources::register(registry);
    services::register(registry);
    legacy::register(registry);
}

/// Built-in legacy validator functions.
pub fn legacy_functions() -> &'static [LegacyFunction] {
    const FUNCTIONS: &[LegacyFunction] = &[
        LegacyFunction::new("valid_command", structural::valid_command),
        LegacyFunction::new("validate_share_proto", structural::validate_share_proto),
        LegacyFunction::new("workbook_contains_workflow", structural::workbook_contains_workflow),
        LegacyFunction::new("flavor_exists", resources::flavor_exists),
    ];
    FUNCTIONS
}

// Re-export for direct access
pub use common::{
    FileExists, NumberValidator, RequiredContexts, RequiredParamOrContext, RequiredPlatform,
    RestrictedParameters, GENERIC_NAMESPACE,
};
pub use resources::{ExternalNetworkExists, ImageExists, ImageValidOnFlavor, VolumeTypeExists};
pub use services::{
    RequiredApiVersions, RequiredCinderServices, RequiredClients, RequiredNeutronExtensions,
    RequiredServices, ValidateHeatTemplate,
};
pub use structural::{check_command_dict, expand_user, file_access_ok, AccessMode, SHARE_PROTOCOLS};

/// Run `check` for every user of `platform` in order; the first failure wins.
///
/// A platform without users passes.
pub(crate) fn for_each_user<F>(credentials: &Credentials, platform: &str, mut check: F) -> PreflightResult<ValidationResult>
where
    F: FnMut(&UserCredential, &dyn Clients) -> PreflightResult<ValidationResult>,
{
    for user in credentials.users(platform) {
        let clients = user.credential.clients()?;
        let result = check(user, clients.as_ref())?;
        if !result.is_valid() {
            return Ok(result);
        }
    }
    Ok(ValidationResult::valid())
}

/// Run `check` with the admin clients of `platform`, falling back to the
/// first user when there is no admin.
pub(crate) fn with_admin<F>(credentials: &Credentials, platform: &str, check: F) -> PreflightResult<ValidationResult>
where
    F: FnOnce(&dyn Clients) -> PreflightResult<ValidationResult>,
{
    let Some(admin) = credentials
        .get(platform)
        .and_then(|creds| creds.admin_or_first_user())
    else {
        return Ok(ValidationResult::invalid(format!(
            "No admin credentials for platform '{}'",
            platform
        )));
    };
    let clients = admin.clients()?;
    check(clients.as_ref())
}

#[cfg(test)]
pub(crate) fn run(
    validator: &dyn crate::validators::registry::Validator,
    credentials: &Credentials,
    config: &crate::core::config::ScenarioConfig,
) -> ValidationResult {
    let plugin = crate::validators::plugin::ScenarioPlugin::builder("Dummy.scenario").build();
    match validator.validate(credentials, config, &plugin, None) {
        Ok(result) => result,
        Err(error) => panic!("validator raised: {}", error),
    }
}
