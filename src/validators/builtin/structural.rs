//! Structural validators: checks on the shape of scenario arguments and on
//! local files they reference. None of them talk to the platform.

use crate::core::args::ValidatorArgs;
use crate::core::config::{display_value, ScenarioConfig};
use crate::core::credentials::Deployment;
use crate::core::error::{CommandSpecError, PreflightError, PreflightResult};
use crate::core::result::ValidationResult;
use crate::platform::Clients;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const COMMAND_KEYS: [&str; 6] = [
    "script_file",
    "script_inline",
    "interpreter",
    "remote_path",
    "local_path",
    "command_args",
];

/// Share protocols a share can be created with.
pub const SHARE_PROTOCOLS: [&str; 5] = ["NFS", "CIFS", "GLUSTERFS", "HDFS", "CEPHFS"];

/// Whether a value counts as set: `null`, `false`, `0` and empty
/// strings or collections do not.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Check a command-specifying dictionary.
///
/// Values rather than key presence decide what is set, since templated task
/// files leave keys with empty values behind.
pub fn check_command_dict(command: &Value) -> Result<(), CommandSpecError> {
    let Value::Object(map) = command else {
        return Err(CommandSpecError::NotAMapping);
    };
    let set = |key: &str| map.get(key).filter(|value| is_set(value));

    if let Some(interpreter) = set("interpreter") {
        if set("script_file").is_some() && map.contains_key("script_inline") {
            return Err(CommandSpecError::ConflictingScript {
                command: command.clone(),
            });
        }

        let interpreter = match interpreter {
            Value::Array(parts) => parts.last(),
            other => Some(other),
        };
        if set("local_path").is_some() && map.get("remote_path") != interpreter {
            return Err(CommandSpecError::InterpreterPathMismatch {
                command: command.clone(),
            });
        }
    } else if set("remote_path").is_none() {
        return Err(CommandSpecError::NoCommand {
            command: command.clone(),
        });
    }

    let mut unexpected: Vec<String> = map
        .keys()
        .filter(|key| !COMMAND_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort();
        return Err(CommandSpecError::UnexpectedKeys { keys: unexpected });
    }
    Ok(())
}

/// Kind of access a file check asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Readable.
    #[default]
    Read,
    /// Writable.
    Write,
    /// Executable.
    Execute,
}

impl AccessMode {
    /// Parse a mode argument: `"r"`/`"read"`, `"w"`/`"write"`, `"x"`/`"execute"`,
    /// or the numeric access flags 4, 2 and 1.
    pub fn from_value(validator: &str, value: &Value) -> PreflightResult<Self> {
        match value {
            Value::String(s) => match s.to_lowercase().as_str() {
                "r" | "read" => Ok(AccessMode::Read),
                "w" | "write" => Ok(AccessMode::Write),
                "x" | "execute" => Ok(AccessMode::Execute),
                other => Err(PreflightError::invalid_args(
                    validator,
                    format!("unknown access mode '{}'", other),
                )),
            },
            Value::Number(n) => match n.as_u64() {
                Some(4) => Ok(AccessMode::Read),
                Some(2) => Ok(AccessMode::Write),
                Some(1) => Ok(AccessMode::Execute),
                _ => Err(PreflightError::invalid_args(
                    validator,
                    format!("unknown access mode {}", n),
                )),
            },
            other => Err(PreflightError::invalid_args(
                validator,
                format!("access mode must be a string or a number, got {}", other),
            )),
        }
    }

    #[cfg(unix)]
    fn permits(&self, path: &Path) -> bool {
        use nix::unistd::{access, AccessFlags};
        let flags = match self {
            AccessMode::Read => AccessFlags::R_OK,
            AccessMode::Write => AccessFlags::W_OK,
            AccessMode::Execute => AccessFlags::X_OK,
        };
        access(path, flags).is_ok()
    }

    #[cfg(not(unix))]
    fn permits(&self, path: &Path) -> bool {
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        match self {
            AccessMode::Read if metadata.is_dir() => fs::read_dir(path).is_ok(),
            AccessMode::Read => fs::File::open(path).is_ok(),
            AccessMode::Write => !metadata.permissions().readonly(),
            AccessMode::Execute => true,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "r"),
            AccessMode::Write => write!(f, "w"),
            AccessMode::Execute => write!(f, "x"),
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_user(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

/// Check that a file referenced by a scenario argument is accessible.
pub fn file_access_ok(
    filename: Option<&str>,
    mode: AccessMode,
    param_name: &str,
    required: bool,
) -> ValidationResult {
    let Some(filename) = filename.filter(|name| !name.is_empty()) else {
        return ValidationResult::from_verdict(!required, format!("Parameter {} required", param_name));
    };
    if !mode.permits(&expand_user(filename)) {
        return ValidationResult::invalid(format!(
            "Could not open {} with mode {} for parameter {}",
            filename, mode, param_name
        ));
    }
    ValidationResult::valid()
}

/// Check that a parameter is a proper command-specifying dictionary and that
/// the script or local file it names can be read.
///
/// Arguments: `param_name`, `required` (default `true`).
pub fn valid_command(
    config: &ScenarioConfig,
    _clients: Option<&dyn Clients>,
    _deployment: &Deployment<'_>,
    args: &ValidatorArgs,
) -> PreflightResult<Option<ValidationResult>> {
    let param_name = args.required_str("valid_command", 0, "param_name")?;
    let required = args.bool_or("valid_command", 1, "required", true)?;

    let command = config.arg(&param_name).filter(|value| !value.is_null());
    let Some(command) = command else {
        if required {
            return Ok(Some(ValidationResult::invalid(
                CommandSpecError::NotAMapping.to_string(),
            )));
        }
        return Ok(None);
    };

    if let Err(error) = check_command_dict(command) {
        return Ok(Some(ValidationResult::invalid(error.to_string())));
    }

    for key in ["script_file", "local_path"] {
        if let Some(path) = command.get(key).filter(|value| is_set(value)) {
            return Ok(Some(file_access_ok(
                Some(&display_value(path)),
                AccessMode::Read,
                &format!("{}.{}", param_name, key),
                true,
            )));
        }
    }
    Ok(None)
}

/// Check the `share_proto` argument against the known share protocols,
/// ignoring case.
pub fn validate_share_proto(
    config: &ScenarioConfig,
    _clients: Option<&dyn Clients>,
    _deployment: &Deployment<'_>,
    _args: &ValidatorArgs,
) -> PreflightResult<Option<ValidationResult>> {
    let share_proto = config.arg("share_proto").map(display_value).unwrap_or_else(|| "null".to_string());
    if SHARE_PROTOCOLS.contains(&share_proto.to_uppercase().as_str()) {
        return Ok(None);
    }
    Ok(Some(ValidationResult::invalid(format!(
        "Share protocol '{}' is invalid, allowed values are '{}'.",
        share_proto,
        SHARE_PROTOCOLS.join("', '")
    ))))
}

/// When a workflow is requested, check that the workbook file defines it.
///
/// Arguments: `workbook` and `workflow_name`, both names of scenario arguments.
pub fn workbook_contains_workflow(
    config: &ScenarioConfig,
    _clients: Option<&dyn Clients>,
    _deployment: &Deployment<'_>,
    args: &ValidatorArgs,
) -> PreflightResult<Option<ValidationResult>> {
    let workbook = args.required_str("workbook_contains_workflow", 0, "workbook")?;
    let workflow_name = args.required_str("workbook_contains_workflow", 1, "workflow_name")?;

    let Some(workflow) = config.present_arg(&workflow_name).map(display_value) else {
        return Ok(None);
    };

    let workbook_path = config.arg_str(&workbook);
    let access = file_access_ok(workbook_path, AccessMode::Read, &workbook, true);
    if !access.is_valid() {
        return Ok(Some(access));
    }

    let path = expand_user(workbook_path.unwrap_or_default());
    let definition: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(&path)?)?;
    let defines_workflow = definition
        .get("workflows")
        .and_then(serde_yaml::Value::as_mapping)
        .map(|workflows| workflows.contains_key(workflow.as_str()))
        .unwrap_or(false);

    if defines_workflow {
        return Ok(None);
    }
    let rendered = serde_json::to_string(&definition).unwrap_or_else(|_| path.display().to_string());
    Ok(Some(ValidationResult::invalid(format!(
        "workflow '{}' not found in the definition '{}'",
        workflow, rendered
    ))))
}
