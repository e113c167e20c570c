//! In-memory platform used by unit tests.

use crate::core::credentials::{Credential, Credentials, PlatformCredentials, DEFAULT_PLATFORM};
use crate::core::error::{ClientError, ClientResult};
use crate::platform::{
    Clients, ComputeService, FlavorRecord, IdentityService, IdentityVersion, ImagePayload,
    ImageRecord, ImageService, ImageSummary, NetworkRecord, NetworkService, OrchestrationService,
    ServiceRecord, VolumeService,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Platform state shared by every client handle built from it.
#[derive(Default)]
pub(crate) struct FakeCloud {
    images: Vec<(ImageSummary, ImagePayload)>,
    image_error: Option<ClientError>,
    flavors: Vec<FlavorRecord>,
    flavor_error: Option<ClientError>,
    compute_services: Vec<ServiceRecord>,
    volume_services: Vec<ServiceRecord>,
    networks: Vec<NetworkRecord>,
    extensions: Vec<String>,
    volume_types: Vec<String>,
    catalog: IndexMap<String, String>,
    identity: Option<IdentityVersion>,
    versions: HashMap<String, String>,
    unavailable: HashMap<String, Option<String>>,
    template_error: Option<ClientError>,
    calls: Mutex<Vec<String>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, id: &str, name: &str, size: u64, min_ram: u64, min_disk: u64) -> Self {
        let record = ImageRecord {
            id: id.to_string(),
            name: Some(name.to_string()),
            size: Some(size),
            min_ram: Some(min_ram),
            min_disk: Some(min_disk),
        };
        self.images.push((
            ImageSummary {
                id: id.to_string(),
                name: Some(name.to_string()),
            },
            ImagePayload::Record(record),
        ));
        self
    }

    pub fn with_image_payload(mut self, id: &str, name: &str, payload: ImagePayload) -> Self {
        self.images.push((
            ImageSummary {
                id: id.to_string(),
                name: Some(name.to_string()),
            },
            payload,
        ));
        self
    }

    pub fn with_image_error(mut self, error: ClientError) -> Self {
        self.image_error = Some(error);
        self
    }

    pub fn with_flavor(mut self, id: &str, name: &str, ram: u64, disk: u64) -> Self {
        self.flavors.push(FlavorRecord {
            id: id.to_string(),
            name: name.to_string(),
            ram,
            disk,
            vcpus: 1,
        });
        self
    }

    pub fn with_flavor_error(mut self, error: ClientError) -> Self {
        self.flavor_error = Some(error);
        self
    }

    pub fn with_compute_service(mut self, binary: &str, status: &str) -> Self {
        self.compute_services.push(ServiceRecord {
            binary: binary.to_string(),
            status: status.to_string(),
            state: "up".to_string(),
        });
        self
    }

    pub fn with_volume_service(mut self, binary: &str, state: &str) -> Self {
        self.volume_services.push(ServiceRecord {
            binary: binary.to_string(),
            status: "enabled".to_string(),
            state: state.to_string(),
        });
        self
    }

    pub fn with_network(mut self, name: &str, external: bool) -> Self {
        self.networks.push(NetworkRecord {
            name: name.to_string(),
            router_external: external,
        });
        self
    }

    pub fn with_extension(mut self, alias: &str) -> Self {
        self.extensions.push(alias.to_string());
        self
    }

    pub fn with_volume_type(mut self, name: &str) -> Self {
        self.volume_types.push(name.to_string());
        self
    }

    pub fn with_service(mut self, service_type: &str, name: &str) -> Self {
        self.catalog.insert(service_type.to_string(), name.to_string());
        self
    }

    pub fn with_identity(mut self, version: IdentityVersion) -> Self {
        self.identity = Some(version);
        self
    }

    pub fn with_version(mut self, component: &str, version: &str) -> Self {
        self.versions.insert(component.to_string(), version.to_string());
        self
    }

    pub fn without_client(mut self, component: &str, hint: Option<&str>) -> Self {
        self.unavailable
            .insert(component.to_string(), hint.map(String::from));
        self
    }

    pub fn with_template_error(mut self, error: ClientError) -> Self {
        self.template_error = Some(error);
        self
    }

    /// Every service call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl ImageService for FakeCloud {
    fn get(&self, image_id: &str) -> ClientResult<ImagePayload> {
        self.record(format!("image.get {}", image_id));
        if let Some(error) = &self.image_error {
            return Err(error.clone());
        }
        self.images
            .iter()
            .find(|(summary, _)| summary.id == image_id)
            .map(|(_, payload)| payload.clone())
            .ok_or_else(|| ClientError::not_found(format!("Image {}", image_id)))
    }

    fn list(&self) -> ClientResult<Vec<ImageSummary>> {
        self.record("image.list".to_string());
        Ok(self.images.iter().map(|(summary, _)| summary.clone()).collect())
    }
}

impl ComputeService for FakeCloud {
    fn get_flavor(&self, flavor_id: &str) -> ClientResult<FlavorRecord> {
        self.record(format!("compute.get_flavor {}", flavor_id));
        if let Some(error) = &self.flavor_error {
            return Err(error.clone());
        }
        self.flavors
            .iter()
            .find(|flavor| flavor.id == flavor_id)
            .cloned()
            .ok_or_else(|| ClientError::not_found(format!("Flavor {}", flavor_id)))
    }

    fn list_flavors(&self) -> ClientResult<Vec<FlavorRecord>> {
        self.record("compute.list_flavors".to_string());
        if let Some(error) = &self.flavor_error {
            return Err(error.clone());
        }
        Ok(self.flavors.clone())
    }

    fn list_services(&self) -> ClientResult<Vec<ServiceRecord>> {
        self.record("compute.list_services".to_string());
        Ok(self.compute_services.clone())
    }
}

impl NetworkService for FakeCloud {
    fn list_networks(&self) -> ClientResult<Vec<NetworkRecord>> {
        self.record("network.list_networks".to_string());
        Ok(self.networks.clone())
    }

    fn list_extensions(&self) -> ClientResult<Vec<String>> {
        self.record("network.list_extensions".to_string());
        Ok(self.extensions.clone())
    }
}

impl VolumeService for FakeCloud {
    fn list_services(&self) -> ClientResult<Vec<ServiceRecord>> {
        self.record("volume.list_services".to_string());
        Ok(self.volume_services.clone())
    }

    fn list_volume_types(&self) -> ClientResult<Vec<String>> {
        self.record("volume.list_volume_types".to_string());
        Ok(self.volume_types.clone())
    }
}

impl IdentityService for FakeCloud {
    fn version(&self) -> ClientResult<IdentityVersion> {
        self.record("identity.version".to_string());
        Ok(self.identity.unwrap_or(IdentityVersion::V3))
    }
}

impl OrchestrationService for FakeCloud {
    fn validate_template(&self, template: &str) -> ClientResult<()> {
        self.record(format!("orchestration.validate {}", template));
        match &self.template_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Client handle over a shared [`FakeCloud`].
#[derive(Clone)]
pub(crate) struct FakeClients(pub Arc<FakeCloud>);

impl FakeClients {
    pub fn new(cloud: FakeCloud) -> Self {
        Self(Arc::new(cloud))
    }

    pub fn cloud(&self) -> &FakeCloud {
        &self.0
    }
}

impl Clients for FakeClients {
    fn image(&self) -> ClientResult<Arc<dyn ImageService>> {
        Ok(self.0.clone())
    }

    fn compute(&self) -> ClientResult<Arc<dyn ComputeService>> {
        Ok(self.0.clone())
    }

    fn network(&self) -> ClientResult<Arc<dyn NetworkService>> {
        Ok(self.0.clone())
    }

    fn volume(&self) -> ClientResult<Arc<dyn VolumeService>> {
        Ok(self.0.clone())
    }

    fn identity(&self) -> ClientResult<Arc<dyn IdentityService>> {
        Ok(self.0.clone())
    }

    fn orchestration(&self) -> ClientResult<Arc<dyn OrchestrationService>> {
        Ok(self.0.clone())
    }

    fn services(&self) -> ClientResult<IndexMap<String, String>> {
        self.0.record("services".to_string());
        Ok(self.0.catalog.clone())
    }

    fn ensure_client(&self, component: &str) -> ClientResult<()> {
        self.0.record(format!("ensure_client {}", component));
        match self.0.unavailable.get(component) {
            Some(hint) => Err(ClientError::ClientUnavailable {
                component: component.to_string(),
                hint: hint.clone(),
            }),
            None => Ok(()),
        }
    }

    fn choose_version(&self, component: &str) -> ClientResult<Option<String>> {
        self.0.record(format!("choose_version {}", component));
        Ok(self.0.versions.get(component).cloned())
    }
}

/// Credential producing [`FakeClients`], counting how often it was asked.
pub(crate) struct FakeCredential {
    username: String,
    clients: FakeClients,
    clients_calls: AtomicUsize,
}

impl FakeCredential {
    pub fn new(username: &str, cloud: FakeCloud) -> Arc<Self> {
        Self::shared(username, FakeClients::new(cloud))
    }

    pub fn shared(username: &str, clients: FakeClients) -> Arc<Self> {
        Arc::new(Self {
            username: username.to_string(),
            clients,
            clients_calls: AtomicUsize::new(0),
        })
    }

    pub fn cloud(&self) -> &FakeCloud {
        self.clients.cloud()
    }

    pub fn clients_calls(&self) -> usize {
        self.clients_calls.load(Ordering::SeqCst)
    }
}

impl Credential for FakeCredential {
    fn username(&self) -> &str {
        &self.username
    }

    fn clients(&self) -> ClientResult<Arc<dyn Clients>> {
        self.clients_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clients.clone()))
    }
}

/// Credentials of the default platform built from fake credentials.
pub(crate) fn openstack_credentials(
    admin: Option<Arc<FakeCredential>>,
    users: &[Arc<FakeCredential>],
) -> Credentials {
    let mut creds = PlatformCredentials::new();
    if let Some(admin) = admin {
        creds = creds.with_admin(admin);
    }
    for user in users {
        creds = creds.with_user(user.clone());
    }
    Credentials::new().with_platform(DEFAULT_PLATFORM, creds)
}
