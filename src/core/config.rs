//! Scenario configuration as seen by validators.
//!
//! A scenario configuration has two halves: `args`, the parameters passed to
//! the scenario, and `context`, the resources provisioned before the run.
//! Both are free-form JSON objects; validators read them through the typed
//! accessors below and never mutate them.

use crate::core::error::{PreflightError, PreflightResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Scenario arguments and pre-provisioned context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario parameters.
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Pre-provisioned resource declarations.
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl ScenarioConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from a JSON value with `args` and `context` keys.
    ///
    /// Missing keys are treated as empty; non-object values are rejected.
    pub fn from_value(value: Value) -> PreflightResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(source: &str) -> PreflightResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(source: &str) -> PreflightResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Load a configuration file; `.yaml`/`.yml` are parsed as YAML, anything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> PreflightResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            _ => Self::from_json_str(&source),
        }
    }

    /// Set a scenario argument.
    pub fn with_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    /// Set a context section.
    pub fn with_context(mut self, name: impl Into<String>, value: Value) -> Self {
        self.context.insert(name.into(), value);
        self
    }

    /// Raw scenario argument, `null` included.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Scenario argument that carries a usable value.
    ///
    /// Absent keys, `null` and empty strings, arrays or objects all count as
    /// "not specified"; templated task files routinely leave such values behind.
    pub fn present_arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|value| !is_blank(value))
    }

    /// Scenario argument as a string.
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.present_arg(name).and_then(Value::as_str)
    }

    /// Whether the context declares a section.
    pub fn has_context(&self, name: &str) -> bool {
        self.context.contains_key(name)
    }

    /// Raw context section.
    pub fn context_section(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }

    /// The `images` context section.
    pub fn image_context(&self) -> Option<&Map<String, Value>> {
        self.context.get("images").and_then(Value::as_object)
    }

    /// The flavor definitions of the `flavors` context section.
    ///
    /// Returns `None` when the section is absent; a present section that is not
    /// a list is reported as an empty list.
    pub fn flavors_context(&self) -> Option<&[Value]> {
        self.context
            .get("flavors")
            .map(|flavors| flavors.as_array().map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Per-service settings of the `api_versions` context section.
    pub fn api_versions(&self, service: &str) -> Option<&Map<String, Value>> {
        self.context
            .get("api_versions")
            .and_then(|versions| versions.get(service))
            .and_then(Value::as_object)
    }
}

/// Check whether a value counts as "not specified".
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Render a scenario value for messages: strings bare, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read an optional non-negative number from a JSON object, defaulting to 0.
///
/// Missing keys, `null` and non-numeric values all yield 0; fractional
/// values are truncated.
pub fn number_or_zero(map: &Map<String, Value>, key: &str) -> u64 {
    map.get(key).map(value_as_u64).unwrap_or(0)
}

pub(crate) fn value_as_u64(value: &Value) -> u64 {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
        .unwrap_or(0)
}

impl TryFrom<Value> for ScenarioConfig {
    type Error = PreflightError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
