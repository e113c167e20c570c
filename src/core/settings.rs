//! Run-wide settings.

use crate::core::credentials::DEFAULT_PLATFORM;
use serde::{Deserialize, Serialize};

/// Namespace built-in platform validators are registered under.
pub const DEFAULT_NAMESPACE: &str = "openstack";

/// Settings shared by every plugin of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Platform whose credentials legacy validators iterate.
    pub platform: String,
    /// Namespace used for validator lookups that do not name one.
    pub namespace: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl Settings {
    /// Use another platform.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Use another default namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}
