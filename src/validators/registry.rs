//! Validator registry for managing available validator types.

use crate::core::args::ValidatorArgs;
use crate::core::config::ScenarioConfig;
use crate::core::credentials::Credentials;
use crate::core::error::{PreflightError, PreflightResult};
use crate::core::result::ValidationResult;
use crate::validators::legacy::LegacyValidator;
use crate::validators::plugin::ScenarioPlugin;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// The validator contract.
///
/// A validator inspects the credential set and the scenario configuration
/// and returns a verdict. User-fixable problems are reported as
/// [`ValidationResult::Invalid`]; an `Err` aborts the whole run.
pub trait Validator: Send + Sync {
    /// Check the scenario.
    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        plugin: &ScenarioPlugin,
        platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult>;

    /// Read credentials of `platform` instead of the default one.
    ///
    /// Validators that never touch a platform keep the no-op.
    fn bind_platform(&mut self, _platform: &str) {}
}

/// A validator type the registry can build from declaration arguments.
pub trait ConfigurableValidator: Validator + Sized + 'static {
    /// Registry metadata of this type.
    fn metadata() -> ValidatorMetadata;

    /// Build an instance from the arguments of a validator declaration.
    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self>;
}

/// A validator ready to run.
pub enum ValidatorKind {
    /// A free function wrapped in the legacy adapter.
    Legacy(LegacyValidator),
    /// A registered validator instance.
    Native(Box<dyn Validator>),
}

impl Validator for ValidatorKind {
    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        plugin: &ScenarioPlugin,
        platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        match self {
            ValidatorKind::Legacy(legacy) => legacy.validate(credentials, config, plugin, platform_config),
            ValidatorKind::Native(native) => native.validate(credentials, config, plugin, platform_config),
        }
    }
}

impl fmt::Debug for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorKind::Legacy(legacy) => f.debug_tuple("Legacy").field(legacy).finish(),
            ValidatorKind::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// What a validator needs from the credential set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Platform whose credentials are used, if any.
    pub platform: Option<String>,
    /// Whether an admin credential is used.
    pub admin: bool,
    /// Whether user credentials are used.
    pub users: bool,
}

/// Metadata describing a registered validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorMetadata {
    /// Validator name (e.g., "image_exists").
    pub name: String,
    /// Namespace the name is unique in.
    pub namespace: String,
    /// Detailed description.
    pub description: String,
    /// Credential requirements.
    pub capabilities: Capabilities,
}

impl ValidatorMetadata {
    /// Create a new metadata builder.
    pub fn builder(name: impl Into<String>, namespace: impl Into<String>) -> ValidatorMetadataBuilder {
        ValidatorMetadataBuilder::new(name, namespace)
    }

    /// Registry key of this validator.
    pub fn key(&self) -> ValidatorKey {
        ValidatorKey::new(&self.name, &self.namespace)
    }
}

/// Builder for ValidatorMetadata.
pub struct ValidatorMetadataBuilder {
    name: String,
    namespace: String,
    description: String,
    capabilities: Capabilities,
}

impl ValidatorMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            description: String::new(),
            capabilities: Capabilities::default(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the platform whose credentials are used.
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.capabilities.platform = Some(platform.into());
        self
    }

    /// Mark as using the admin credential.
    pub fn admin(mut self) -> Self {
        self.capabilities.admin = true;
        self
    }

    /// Mark as using user credentials.
    pub fn users(mut self) -> Self {
        self.capabilities.users = true;
        self
    }

    /// Build the metadata.
    pub fn build(self) -> ValidatorMetadata {
        ValidatorMetadata {
            name: self.name,
            namespace: self.namespace,
            description: self.description,
            capabilities: self.capabilities,
        }
    }
}

/// `(name, namespace)` pair identifying a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidatorKey {
    /// Validator name.
    pub name: String,
    /// Namespace.
    pub namespace: String,
}

impl ValidatorKey {
    /// Create a key.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ValidatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.namespace)
    }
}

/// Factory function for creating validator instances.
pub type ValidatorFactory =
    Arc<dyn Fn(&ValidatorArgs) -> PreflightResult<Box<dyn Validator>> + Send + Sync>;

/// Registry entry containing metadata and factory.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Factory function to create instances.
    pub factory: ValidatorFactory,
    /// Metadata, available without creating an instance.
    pub metadata: ValidatorMetadata,
}

/// Registry for all available validator types.
///
/// Validators are keyed by `(name, namespace)`. Lookups that miss in the
/// requested namespace fall back to a registration of the same name in any
/// namespace, as long as exactly one exists.
pub struct ValidatorRegistry {
    /// Validators indexed by key, in registration order.
    validators: IndexMap<ValidatorKey, RegistryEntry>,
}

static GLOBAL: OnceLock<RwLock<ValidatorRegistry>> = OnceLock::new();

impl ValidatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            validators: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with built-in validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::validators::builtin::register_all(&mut registry);
        registry
    }

    /// The process-wide registry, populated with the built-ins on first use.
    ///
    /// Plugins register at load time; validation runs only take the read lock.
    pub fn global() -> &'static RwLock<ValidatorRegistry> {
        GLOBAL.get_or_init(|| RwLock::new(Self::with_builtins()))
    }

    /// Register a validator factory.
    ///
    /// A registration under an existing key replaces the earlier one.
    pub fn register<F>(&mut self, metadata: ValidatorMetadata, factory: F)
    where
        F: Fn(&ValidatorArgs) -> PreflightResult<Box<dyn Validator>> + Send + Sync + 'static,
    {
        let key = metadata.key();
        let entry = RegistryEntry {
            factory: Arc::new(factory),
            metadata,
        };
        if self.validators.insert(key.clone(), entry).is_some() {
            log::warn!("Validator '{}' registered twice, keeping the latest registration", key);
        }
    }

    /// Register a [`ConfigurableValidator`] type.
    pub fn register_type<V: ConfigurableValidator>(&mut self) {
        self.register(V::metadata(), |args| Ok(Box::new(V::from_args(args)?)));
    }

    /// Find the entry for a name, preferring the given namespace.
    pub fn lookup(&self, name: &str, namespace: &str) -> Option<&RegistryEntry> {
        if let Some(entry) = self.validators.get(&ValidatorKey::new(name, namespace)) {
            return Some(entry);
        }

        let mut candidates = self.validators.values().filter(|e| e.metadata.name == name);
        match (candidates.next(), candidates.next()) {
            (Some(entry), None) => Some(entry),
            _ => None,
        }
    }

    /// Create a validator instance.
    pub fn instantiate(
        &self,
        name: &str,
        namespace: &str,
        args: &ValidatorArgs,
    ) -> PreflightResult<Box<dyn Validator>> {
        let entry = self
            .lookup(name, namespace)
            .ok_or_else(|| PreflightError::UnknownValidator {
                name: name.to_string(),
                namespace: namespace.to_string(),
            })?;
        (entry.factory)(args)
    }

    /// Get metadata for a validator without creating an instance.
    pub fn get_metadata(&self, name: &str, namespace: &str) -> Option<&ValidatorMetadata> {
        self.lookup(name, namespace).map(|e| &e.metadata)
    }

    /// Check if a validator is registered under exactly this key.
    pub fn contains(&self, name: &str, namespace: &str) -> bool {
        self.validators.contains_key(&ValidatorKey::new(name, namespace))
    }

    /// Every registration of a name, across namespaces.
    pub fn find_by_name(&self, name: &str) -> Vec<&ValidatorMetadata> {
        self.validators
            .values()
            .filter(|e| e.metadata.name == name)
            .map(|e| &e.metadata)
            .collect()
    }

    /// Get all registered validators.
    pub fn validators(&self) -> impl Iterator<Item = (&ValidatorKey, &RegistryEntry)> {
        self.validators.iter()
    }

    /// Unregister a validator.
    pub fn unregister(&mut self, name: &str, namespace: &str) -> bool {
        self.validators
            .shift_remove(&ValidatorKey::new(name, namespace))
            .is_some()
    }

    /// Get the total number of registered validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Get validators grouped by namespace for display.
    pub fn grouped_by_namespace(&self) -> IndexMap<String, Vec<&ValidatorMetadata>> {
        let mut grouped: IndexMap<String, Vec<&ValidatorMetadata>> = IndexMap::new();

        for entry in self.validators.values() {
            grouped
                .entry(entry.metadata.namespace.clone())
                .or_insert_with(Vec::new)
                .push(&entry.metadata);
        }

        for validators in grouped.values_mut() {
            validators.sort_by(|a, b| a.name.cmp(&b.name));
        }
        grouped.sort_keys();

        grouped
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
