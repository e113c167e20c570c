//! Arguments a scenario plugin passes to a validator.
//!
//! Validators are declared with positional and keyword arguments. A
//! parameter may be given either way, so the typed getters take both the
//! position and the keyword; the keyword wins when both are present.

use crate::core::error::{PreflightError, PreflightResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Positional and keyword arguments of a validator declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorArgs {
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments in declaration order.
    #[serde(default)]
    pub kwargs: IndexMap<String, Value>,
}

impl ValidatorArgs {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Check whether there are no arguments at all.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Look a parameter up by keyword, then by position. `null` counts as absent.
    pub fn get(&self, position: usize, name: &str) -> Option<&Value> {
        self.kwargs
            .get(name)
            .or_else(|| self.args.get(position))
            .filter(|value| !value.is_null())
    }

    /// A required string parameter.
    pub fn required_str(&self, validator: &str, position: usize, name: &str) -> PreflightResult<String> {
        match self.get(position, name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(PreflightError::invalid_args(
                validator,
                format!("'{}' must be a string, got {}", name, other),
            )),
            None => Err(PreflightError::invalid_args(
                validator,
                format!("missing required argument '{}'", name),
            )),
        }
    }

    /// An optional string parameter.
    pub fn opt_str(&self, validator: &str, position: usize, name: &str) -> PreflightResult<Option<String>> {
        match self.get(position, name) {
            None => Ok(None),
            Some(_) => self.required_str(validator, position, name).map(Some),
        }
    }

    /// A boolean parameter with a default.
    pub fn bool_or(&self, validator: &str, position: usize, name: &str, default: bool) -> PreflightResult<bool> {
        match self.get(position, name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(PreflightError::invalid_args(
                validator,
                format!("'{}' must be a boolean, got {}", name, other),
            )),
        }
    }

    /// An optional numeric parameter.
    pub fn opt_f64(&self, validator: &str, position: usize, name: &str) -> PreflightResult<Option<f64>> {
        match self.get(position, name) {
            None => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                PreflightError::invalid_args(validator, format!("'{}' must be a number, got {}", name, value))
            }),
        }
    }

    /// A list of strings given either as one list argument or as the
    /// remaining positional arguments starting at `position`.
    ///
    /// A single string is accepted as a one-element list.
    pub fn str_list(&self, validator: &str, position: usize, name: &str) -> PreflightResult<Vec<String>> {
        let values: Vec<&Value> = match self.kwargs.get(name) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
            None => match self.args.get(position) {
                Some(Value::Array(items)) => items.iter().collect(),
                Some(_) => self.args[position..].iter().collect(),
                None => Vec::new(),
            },
        };

        values
            .into_iter()
            .map(|value| match value {
                Value::String(s) => Ok(s.clone()),
                other => Err(PreflightError::invalid_args(
                    validator,
                    format!("'{}' must contain strings, got {}", name, other),
                )),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keyword_wins_over_position() {
        let args = ValidatorArgs::new().arg("image").kwarg("param_name", "flavor");
        assert_eq!(args.required_str("v", 0, "param_name").unwrap(), "flavor");
    }

    #[test]
    fn test_missing_required_argument() {
        let args = ValidatorArgs::new();
        let error = args.required_str("image_exists", 0, "param_name").unwrap_err();
        assert!(error.to_string().contains("param_name"));
        assert!(error.to_string().contains("image_exists"));
    }

    #[test]
    fn test_bool_default_and_type_check() {
        let args = ValidatorArgs::new().arg("image").arg(true);
        assert!(args.bool_or("v", 1, "nullable", false).unwrap());
        assert!(!args.bool_or("v", 2, "other", false).unwrap());

        let args = ValidatorArgs::new().kwarg("nullable", "yes");
        assert!(args.bool_or("v", 1, "nullable", false).is_err());
    }

    #[test]
    fn test_str_list_forms() {
        let variadic = ValidatorArgs::new().arg("keystone").arg("nova");
        assert_eq!(variadic.str_list("v", 0, "services").unwrap(), vec!["keystone", "nova"]);

        let listed = ValidatorArgs::new().arg(json!(["keystone", "nova"]));
        assert_eq!(listed.str_list("v", 0, "services").unwrap(), vec!["keystone", "nova"]);

        let keyword = ValidatorArgs::new().kwarg("services", "nova");
        assert_eq!(keyword.str_list("v", 0, "services").unwrap(), vec!["nova"]);

        let bad = ValidatorArgs::new().arg(json!([1]));
        assert!(bad.str_list("v", 0, "services").is_err());
    }

    #[test]
    fn test_null_counts_as_absent() {
        let args = ValidatorArgs::new().kwarg("minval", Value::Null);
        assert_eq!(args.opt_f64("number", 1, "minval").unwrap(), None);
    }
}
