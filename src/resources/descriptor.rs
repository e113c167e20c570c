//! Normalized image and flavor descriptors.
//!
//! Descriptors are synthesized per call, either from a live platform object
//! or from the scenario context, and never outlive the validation call.

use crate::core::config::{number_or_zero, value_as_u64};
use crate::platform::{FlavorRecord, ImagePayload};
use crate::resources::transform::NamedResource;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Where a descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSource {
    /// Declared in the scenario context.
    Context,
    /// Looked up on the platform.
    Platform,
}

/// Image requirements relevant to flavor checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Platform id, or the context image name for context images.
    pub id: String,
    /// Image name, when known.
    pub name: Option<String>,
    /// Image size in bytes.
    pub size: u64,
    /// Minimum RAM in MiB.
    pub min_ram: u64,
    /// Minimum disk in GiB.
    pub min_disk: u64,
    /// Origin of the descriptor.
    pub source: ResourceSource,
}

impl ImageDescriptor {
    /// Synthesize a descriptor from the `images` context section.
    ///
    /// The context only declares `min_disk`, which also stands in for the size.
    pub fn from_context(image_name: &str, images: &Map<String, Value>) -> Self {
        let min_disk = number_or_zero(images, "min_disk");
        Self {
            id: image_name.to_string(),
            name: Some(image_name.to_string()),
            size: min_disk,
            min_ram: number_or_zero(images, "min_ram"),
            min_disk,
            source: ResourceSource::Context,
        }
    }

    /// Normalize an image service payload.
    pub fn from_payload(requested_id: &str, payload: &ImagePayload) -> Self {
        let document = payload.to_document();
        Self {
            id: payload.id().unwrap_or_else(|| requested_id.to_string()),
            name: document.get("name").and_then(Value::as_str).map(String::from),
            size: payload.number("size"),
            min_ram: payload.number("min_ram"),
            min_disk: payload.number("min_disk"),
            source: ResourceSource::Platform,
        }
    }
}

/// Identity of a resolved flavor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum FlavorId {
    /// A real platform flavor id.
    Platform(String),
    /// A flavor declared in the scenario context; there is nothing to query.
    Context(String),
}

impl FlavorId {
    /// Whether the id can be used in further platform calls.
    pub fn is_queryable(&self) -> bool {
        matches!(self, FlavorId::Platform(_))
    }
}

impl fmt::Display for FlavorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlavorId::Platform(id) => write!(f, "{}", id),
            FlavorId::Context(name) => write!(f, "<context flavor: {}>", name),
        }
    }
}

/// Flavor capacities relevant to image checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorDescriptor {
    /// Flavor identity.
    pub id: FlavorId,
    /// Flavor name.
    pub name: String,
    /// RAM in MiB.
    pub ram: u64,
    /// Root disk in GiB; 0 means "no fixed root disk".
    pub disk: u64,
    /// Virtual CPUs.
    pub vcpus: u64,
}

impl From<FlavorRecord> for FlavorDescriptor {
    fn from(record: FlavorRecord) -> Self {
        Self {
            id: FlavorId::Platform(record.id),
            name: record.name,
            ram: record.ram,
            disk: record.disk,
            vcpus: record.vcpus,
        }
    }
}

/// A flavor definition from the `flavors` context section.
///
/// Capacities accept any JSON number; fractional values are truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFlavor {
    /// Flavor name.
    pub name: String,
    /// RAM in MiB.
    #[serde(default, deserialize_with = "capacity")]
    pub ram: u64,
    /// Virtual CPUs.
    #[serde(default = "default_vcpus", deserialize_with = "capacity")]
    pub vcpus: u64,
    /// Root disk in GiB.
    #[serde(default, deserialize_with = "capacity")]
    pub disk: u64,
    /// Swap in MiB.
    #[serde(default, deserialize_with = "capacity")]
    pub swap: u64,
    /// Ephemeral disk in GiB.
    #[serde(default, deserialize_with = "capacity")]
    pub ephemeral: u64,
    /// Extra specs.
    #[serde(default)]
    pub extra_specs: Option<Map<String, Value>>,
}

fn default_vcpus() -> u64 {
    1
}

fn capacity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        value @ Value::Number(_) => Ok(value_as_u64(&value)),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}

impl NamedResource for ContextFlavor {
    fn resource_id(&self) -> &str {
        &self.name
    }

    fn resource_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl From<&ContextFlavor> for FlavorDescriptor {
    fn from(flavor: &ContextFlavor) -> Self {
        Self {
            id: FlavorId::Context(flavor.name.clone()),
            name: flavor.name.clone(),
            ram: flavor.ram,
            disk: flavor.disk,
            vcpus: flavor.vcpus,
        }
    }
}

/// Outcome of resolving a named resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// The resource was resolved.
    Found(T),
    /// The resource could not be resolved; the message is user-facing.
    Missing(String),
}

impl<T> Resolution<T> {
    /// The resolved value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Resolution::Found(value) => Some(value),
            Resolution::Missing(_) => None,
        }
    }

    /// Whether the resource was resolved.
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// The resolution as a validation verdict.
    pub fn to_result(&self) -> crate::core::result::ValidationResult {
        match self {
            Resolution::Found(_) => crate::core::result::ValidationResult::valid(),
            Resolution::Missing(msg) => crate::core::result::ValidationResult::invalid(msg.clone()),
        }
    }
}
