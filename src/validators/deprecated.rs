//! Deprecated validator entry points.
//!
//! Each entry forwards to a registered validator under its current name,
//! logging a warning every time it is used.

use crate::core::args::ValidatorArgs;
use crate::core::error::{PreflightError, PreflightResult};
use crate::validators::plugin::ValidatorSpec;
use semver::Version;
use serde_json::Value;

/// A deprecated entry point and where it forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeprecatedValidator {
    /// Name the entry point was used under.
    pub old_name: &'static str,
    /// Registered validator it forwards to.
    pub new_name: &'static str,
    /// Release in which the entry point goes away, as `(major, minor, patch)`.
    pub removal: (u64, u64, u64),
    /// Keyword arguments the entry point fixes unless the caller sets them.
    pub preset: &'static [(&'static str, &'static str)],
}

impl DeprecatedValidator {
    const fn renamed(old_name: &'static str, new_name: &'static str) -> Self {
        Self {
            old_name,
            new_name,
            removal: (0, 10, 0),
            preset: &[],
        }
    }

    const fn same(name: &'static str) -> Self {
        Self::renamed(name, name)
    }

    /// Release in which the entry point goes away.
    pub fn removal_version(&self) -> Version {
        let (major, minor, patch) = self.removal;
        Version::new(major, minor, patch)
    }

    /// Declaration under the new name, with preset arguments applied.
    pub fn spec(&self, mut args: ValidatorArgs) -> ValidatorSpec {
        for (key, value) in self.preset {
            args.kwargs
                .entry((*key).to_string())
                .or_insert_with(|| Value::from(*value));
        }
        ValidatorSpec::registered(self.new_name, args)
    }
}

/// Every deprecated entry point.
pub const DEPRECATED_VALIDATORS: &[DeprecatedValidator] = &[
    DeprecatedValidator {
        preset: &[("platform", "openstack")],
        ..DeprecatedValidator::renamed("required_openstack", "required_platform")
    },
    DeprecatedValidator::same("number"),
    DeprecatedValidator::same("image_exists"),
    DeprecatedValidator::same("external_network_exists"),
    DeprecatedValidator::same("required_neutron_extensions"),
    DeprecatedValidator::same("image_valid_on_flavor"),
    DeprecatedValidator::same("required_clients"),
    DeprecatedValidator::same("required_services"),
    DeprecatedValidator::same("validate_heat_template"),
    DeprecatedValidator::same("restricted_parameters"),
    DeprecatedValidator::same("required_cinder_services"),
    DeprecatedValidator::same("required_api_versions"),
    DeprecatedValidator::same("required_contexts"),
    DeprecatedValidator::same("required_param_or_context"),
    DeprecatedValidator::same("volume_type_exists"),
    DeprecatedValidator::same("file_exists"),
];

/// Find a deprecated entry point.
pub fn lookup(old_name: &str) -> Option<&'static DeprecatedValidator> {
    DEPRECATED_VALIDATORS.iter().find(|entry| entry.old_name == old_name)
}

/// Turn a deprecated declaration of `plugin` into its current form.
pub fn forward(plugin: &str, old_name: &str, args: ValidatorArgs) -> PreflightResult<ValidatorSpec> {
    let entry = lookup(old_name)
        .ok_or_else(|| PreflightError::UnknownDeprecatedValidator(old_name.to_string()))?;

    log::warn!(
        "Plugin '{}' uses validator '{}' which is deprecated in favor of '{}' \
         and will be removed in v{}",
        plugin,
        entry.old_name,
        entry.new_name,
        entry.removal_version()
    );
    Ok(entry.spec(args))
}
