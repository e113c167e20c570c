//! Platform client capability.
//!
//! Validators never talk to a platform SDK directly. They receive a
//! [`Clients`] handle per credential and reach the individual services
//! through it. Every call is synchronous and may fail with
//! [`ClientError::NotFound`](crate::core::error::ClientError::NotFound).

#[cfg(test)]
pub(crate) mod fakes;

use crate::core::config::{number_or_zero, value_as_u64};
use crate::core::error::ClientResult;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Entry of an image catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    /// Platform image id.
    pub id: String,
    /// Image name; images may be unnamed.
    #[serde(default)]
    pub name: Option<String>,
}

/// Image details in the shape of the fixed-schema image API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Platform image id.
    pub id: String,
    /// Image name.
    pub name: Option<String>,
    /// Image size in bytes.
    pub size: Option<u64>,
    /// Minimum RAM in MiB.
    pub min_ram: Option<u64>,
    /// Minimum disk in GiB.
    pub min_disk: Option<u64>,
}

/// Image details as returned by different image API versions.
///
/// Older API versions return a fixed record, newer ones a free-form document
/// in which any field may be absent or `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    /// Fixed-schema record.
    Record(ImageRecord),
    /// Free-form document.
    Document(Map<String, Value>),
}

impl ImagePayload {
    /// Convert to a document, the common shape both versions share.
    pub fn to_document(&self) -> Map<String, Value> {
        match self {
            ImagePayload::Document(doc) => doc.clone(),
            ImagePayload::Record(record) => match serde_json::to_value(record) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
        }
    }

    /// Image id, if the payload carries one.
    pub fn id(&self) -> Option<String> {
        match self {
            ImagePayload::Record(record) => Some(record.id.clone()),
            ImagePayload::Document(doc) => doc.get("id").and_then(Value::as_str).map(String::from),
        }
    }

    /// Numeric field with the platform's "missing means zero" convention.
    pub fn number(&self, key: &str) -> u64 {
        match self {
            ImagePayload::Document(doc) => number_or_zero(doc, key),
            ImagePayload::Record(record) => match key {
                "size" => record.size.unwrap_or(0),
                "min_ram" => record.min_ram.unwrap_or(0),
                "min_disk" => record.min_disk.unwrap_or(0),
                _ => self.to_document().get(key).map(value_as_u64).unwrap_or(0),
            },
        }
    }
}

/// Compute flavor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRecord {
    /// Platform flavor id.
    pub id: String,
    /// Flavor name.
    pub name: String,
    /// RAM in MiB.
    pub ram: u64,
    /// Root disk in GiB.
    pub disk: u64,
    /// Virtual CPUs.
    pub vcpus: u64,
}

/// A service process reported by a service listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Service binary name (e.g. `nova-network`).
    pub binary: String,
    /// Administrative status (`enabled` / `disabled`).
    pub status: String,
    /// Liveness state (`up` / `down`).
    pub state: String,
}

/// Network visible to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Network name.
    pub name: String,
    /// Whether the network is external (usable for floating IPs).
    pub router_external: bool,
}

/// Identity API generation in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityVersion {
    /// Tenant-based identity API.
    V2,
    /// Project-based identity API.
    V3,
}

impl IdentityVersion {
    /// The version label used in task files.
    pub fn label(&self) -> &'static str {
        match self {
            IdentityVersion::V2 => "2.0",
            IdentityVersion::V3 => "3",
        }
    }
}

/// Image service.
pub trait ImageService: Send + Sync {
    /// Fetch an image by id.
    fn get(&self, image_id: &str) -> ClientResult<ImagePayload>;
    /// List images visible to the user.
    fn list(&self) -> ClientResult<Vec<ImageSummary>>;
}

/// Compute service.
pub trait ComputeService: Send + Sync {
    /// Fetch a flavor by id.
    fn get_flavor(&self, flavor_id: &str) -> ClientResult<FlavorRecord>;
    /// List flavors visible to the user.
    fn list_flavors(&self) -> ClientResult<Vec<FlavorRecord>>;
    /// List compute service processes.
    fn list_services(&self) -> ClientResult<Vec<ServiceRecord>>;
}

/// Network service.
pub trait NetworkService: Send + Sync {
    /// List networks visible to the user.
    fn list_networks(&self) -> ClientResult<Vec<NetworkRecord>>;
    /// List aliases of enabled extensions.
    fn list_extensions(&self) -> ClientResult<Vec<String>>;
}

/// Block storage service.
pub trait VolumeService: Send + Sync {
    /// List block storage service processes.
    fn list_services(&self) -> ClientResult<Vec<ServiceRecord>>;
    /// List volume type names.
    fn list_volume_types(&self) -> ClientResult<Vec<String>>;
}

/// Identity service.
pub trait IdentityService: Send + Sync {
    /// Identity API generation the client talks.
    fn version(&self) -> ClientResult<IdentityVersion>;
}

/// Orchestration service.
pub trait OrchestrationService: Send + Sync {
    /// Ask the platform to validate a template.
    fn validate_template(&self, template: &str) -> ClientResult<()>;
}

/// Per-credential handle to every platform service.
pub trait Clients: Send + Sync {
    /// Image service client.
    fn image(&self) -> ClientResult<Arc<dyn ImageService>>;
    /// Compute service client.
    fn compute(&self) -> ClientResult<Arc<dyn ComputeService>>;
    /// Network service client.
    fn network(&self) -> ClientResult<Arc<dyn NetworkService>>;
    /// Block storage service client.
    fn volume(&self) -> ClientResult<Arc<dyn VolumeService>>;
    /// Identity service client.
    fn identity(&self) -> ClientResult<Arc<dyn IdentityService>>;
    /// Orchestration service client.
    fn orchestration(&self) -> ClientResult<Arc<dyn OrchestrationService>>;

    /// Service catalog: service type to service name.
    fn services(&self) -> ClientResult<IndexMap<String, String>>;

    /// Check that the client for a component can be constructed.
    ///
    /// Fails with [`ClientError::ClientUnavailable`](crate::core::error::ClientError::ClientUnavailable)
    /// when it cannot.
    fn ensure_client(&self, component: &str) -> ClientResult<()>;

    /// API version the client for a component negotiated, if it can tell.
    fn choose_version(&self, component: &str) -> ClientResult<Option<String>>;
}
