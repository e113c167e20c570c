//! Plugin manifests.
//!
//! A manifest is a TOML document declaring scenario plugins and their
//! validators, plus the run-wide [`Settings`]:
//!
//! ```toml
//! [settings]
//! namespace = "openstack"
//!
//! [[plugins]]
//! name = "NovaServers.boot_server"
//!
//! [[plugins.validators]]
//! name = "image_valid_on_flavor"
//! args = ["flavor", "image"]
//!
//! [[plugins.validators]]
//! deprecated = "required_openstack"
//! kwargs = { users = true }
//!
//! [[plugins.validators]]
//! legacy = "valid_command"
//! kwargs = { param_name = "command", required = false }
//! ```

use crate::core::args::ValidatorArgs;
use crate::core::error::{PreflightError, PreflightResult};
use crate::core::settings::Settings;
use crate::validators::plugin::{ScenarioPlugin, ScenarioPluginBuilder};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One validator entry of a plugin.
///
/// Exactly one of `name`, `legacy` and `deprecated` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorEntry {
    /// Registered validator name.
    pub name: Option<String>,
    /// Built-in legacy function name.
    pub legacy: Option<String>,
    /// Deprecated entry point name.
    pub deprecated: Option<String>,
    /// Namespace of a registered validator.
    pub namespace: Option<String>,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: IndexMap<String, Value>,
}

impl ValidatorEntry {
    fn arguments(&self) -> ValidatorArgs {
        ValidatorArgs {
            args: self.args.clone(),
            kwargs: self.kwargs.clone(),
        }
    }

    fn apply(&self, plugin: &str, builder: ScenarioPluginBuilder) -> PreflightResult<ScenarioPluginBuilder> {
        let args = self.arguments();
        match (&self.name, &self.legacy, &self.deprecated) {
            (Some(name), None, None) => Ok(match &self.namespace {
                Some(namespace) => builder.validator_in(name, namespace, args),
                None => builder.validator(name, args),
            }),
            (None, Some(function), None) if self.namespace.is_none() => builder.legacy_named(function, args),
            (None, None, Some(old_name)) if self.namespace.is_none() => builder.deprecated(old_name, args),
            (None, Some(_), None) | (None, None, Some(_)) => Err(PreflightError::Manifest(format!(
                "plugin '{}': 'namespace' only applies to registered validators",
                plugin
            ))),
            _ => Err(PreflightError::Manifest(format!(
                "plugin '{}': a validator entry must set exactly one of 'name', 'legacy' or 'deprecated'",
                plugin
            ))),
        }
    }
}

/// One plugin of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginEntry {
    /// Plugin name.
    pub name: String,
    /// Validator entries in declaration order.
    #[serde(default)]
    pub validators: Vec<ValidatorEntry>,
}

impl PluginEntry {
    /// Build the plugin this entry declares.
    pub fn build(&self) -> PreflightResult<ScenarioPlugin> {
        let mut builder = ScenarioPlugin::builder(&self.name);
        for entry in &self.validators {
            builder = entry.apply(&self.name, builder)?;
        }
        Ok(builder.build())
    }
}

/// A manifest of scenario plugins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    /// Run-wide settings.
    #[serde(default)]
    pub settings: Settings,
    /// Declared plugins.
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
}

impl PluginManifest {
    /// Parse a manifest from TOML text.
    pub fn from_toml_str(source: &str) -> PreflightResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> PreflightResult<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Build every declared plugin in order.
    pub fn build_plugins(&self) -> PreflightResult<Vec<ScenarioPlugin>> {
        let mut seen = HashSet::new();
        self.plugins
            .iter()
            .map(|entry| {
                if !seen.insert(entry.name.as_str()) {
                    return Err(PreflightError::Manifest(format!(
                        "plugin '{}' is declared more than once",
                        entry.name
                    )));
                }
                entry.build()
            })
            .collect()
    }

    /// Build one plugin by name.
    pub fn plugin(&self, name: &str) -> PreflightResult<Option<ScenarioPlugin>> {
        self.plugins
            .iter()
            .find(|entry| entry.name == name)
            .map(PluginEntry::build)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::plugin::ValidatorSpec;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
[settings]
namespace = "openstack"

[[plugins]]
name = "NovaServers.boot_server"

[[plugins.validators]]
name = "image_valid_on_flavor"
args = ["flavor", "image"]

[[plugins.validators]]
name = "number"
namespace = "default"
args = ["count"]
kwargs = { minval = 1, integer_only = true }

[[plugins.validators]]
deprecated = "required_openstack"
kwargs = { users = true }

[[plugins.validators]]
legacy = "valid_command"
kwargs = { param_name = "command", required = false }

[[plugins]]
name = "Dummy.dummy"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = PluginManifest::from_toml_str(MANIFEST).unwrap();
        assert_eq!(manifest.settings, Settings::default());

        let plugins = manifest.build_plugins().unwrap();
        assert_eq!(plugins.len(), 2);
        assert_eq!(
            plugins[0].summary().validators,
            vec!["image_valid_on_flavor", "number", "required_platform", "valid_command"]
        );
        assert!(plugins[1].validators().is_empty());

        match &plugins[0].validators()[1] {
            ValidatorSpec::Registered { namespace, args, .. } => {
                assert_eq!(namespace.as_deref(), Some("default"));
                assert_eq!(args.kwargs["minval"], json!(1));
            }
            other => panic!("unexpected spec {:?}", other),
        }
        assert_eq!(plugins[0].validators()[2].args().kwargs["platform"], json!("openstack"));
    }

    #[test]
    fn test_entry_must_name_one_kind() {
        let source = r#"
[[plugins]]
name = "Broken"

[[plugins.validators]]
name = "number"
legacy = "valid_command"
"#;
        let manifest = PluginManifest::from_toml_str(source).unwrap();
        let error = manifest.build_plugins().unwrap_err();
        assert!(matches!(error, PreflightError::Manifest(_)));

        let source = r#"
[[plugins]]
name = "Broken"

[[plugins.validators]]
legacy = "valid_command"
namespace = "default"
"#;
        let manifest = PluginManifest::from_toml_str(source).unwrap();
        assert!(manifest.build_plugins().is_err());
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let source = r#"
[[plugins]]
name = "Broken"

[[plugins.validators]]
legacy = "no_such_function"
"#;
        let manifest = PluginManifest::from_toml_str(source).unwrap();
        assert!(matches!(
            manifest.build_plugins().unwrap_err(),
            PreflightError::UnknownLegacyFunction(_)
        ));

        assert!(matches!(
            PluginManifest::from_toml_str("[[plugins]]\nname = \"A\"\nunexpected = 1").unwrap_err(),
            PreflightError::Toml(_)
        ));
    }

    #[test]
    fn test_duplicate_plugins() {
        let manifest = PluginManifest::from_toml_str("[[plugins]]\nname = \"A\"\n\n[[plugins]]\nname = \"A\"\n").unwrap();
        assert!(manifest.build_plugins().is_err());
        assert!(manifest.plugin("A").unwrap().is_some());
        assert!(manifest.plugin("B").unwrap().is_none());
    }

    #[test]
    fn test_load_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let manifest = PluginManifest::from_path(file.path()).unwrap();
        assert_eq!(manifest.plugins.len(), 2);
    }
}
