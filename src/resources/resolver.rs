//! Resource resolver.
//!
//! Reconciles a named image or flavor between the scenario context and the
//! live platform. Images are looked up in the context first and only then on
//! the platform; flavors go the other way round.

use crate::core::config::{display_value, ScenarioConfig};
use crate::core::error::{PreflightError, PreflightResult};
use crate::platform::Clients;
use crate::resources::descriptor::{ContextFlavor, FlavorDescriptor, ImageDescriptor, Resolution};
use crate::resources::transform::{select, CatalogTransform, IdentifierTransform, NamedResource, ResourceSelector};
use regex::Regex;
use serde_json::Value;

static CATALOG: CatalogTransform = CatalogTransform;

/// Resolves scenario resource references into descriptors.
#[derive(Clone, Copy)]
pub struct ResourceResolver<'t> {
    transform: &'t dyn IdentifierTransform,
}

impl Default for ResourceResolver<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceResolver<'static> {
    /// Resolver backed by the live catalog.
    pub fn new() -> Self {
        Self { transform: &CATALOG }
    }
}

impl<'t> ResourceResolver<'t> {
    /// Resolver using a custom identifier transform.
    pub fn with_transform(transform: &'t dyn IdentifierTransform) -> Self {
        Self { transform }
    }

    /// Resolve the image named by `args[param_name]`.
    pub fn resolve_image(
        &self,
        config: &ScenarioConfig,
        clients: &dyn Clients,
        param_name: &str,
    ) -> PreflightResult<Resolution<ImageDescriptor>> {
        let Some(arg) = config.present_arg(param_name) else {
            return Ok(Resolution::Missing(not_specified(param_name)));
        };

        if let Some(image) = image_from_context(config, arg) {
            log::debug!("Image '{}' resolved from context", image.id);
            return Ok(Resolution::Found(image));
        }

        let lookup = self.transform.image_id(clients, arg).and_then(|image_id| {
            let payload = clients.image()?.get(&image_id)?;
            Ok(ImageDescriptor::from_payload(&image_id, &payload))
        });

        match lookup {
            Ok(image) => Ok(Resolution::Found(image)),
            Err(error) if error.is_resolution_miss() => {
                log::debug!("Image lookup for '{}' missed: {}", param_name, error);
                Ok(Resolution::Missing(format!("Image '{}' not found", display_value(arg))))
            }
            Err(error) => Err(error),
        }
    }

    /// Resolve an image parameter that may be left unspecified.
    ///
    /// An unspecified parameter resolves to `Found(None)`.
    pub fn resolve_optional_image(
        &self,
        config: &ScenarioConfig,
        clients: &dyn Clients,
        param_name: &str,
    ) -> PreflightResult<Resolution<Option<ImageDescriptor>>> {
        if config.present_arg(param_name).is_none() {
            return Ok(Resolution::Found(None));
        }
        Ok(match self.resolve_image(config, clients, param_name)? {
            Resolution::Found(image) => Resolution::Found(Some(image)),
            Resolution::Missing(msg) => Resolution::Missing(msg),
        })
    }

    /// Resolve the flavor named by `args[param_name]`.
    pub fn resolve_flavor(
        &self,
        config: &ScenarioConfig,
        clients: &dyn Clients,
        param_name: &str,
    ) -> PreflightResult<Resolution<FlavorDescriptor>> {
        let Some(arg) = config.present_arg(param_name) else {
            return Ok(Resolution::Missing(not_specified(param_name)));
        };

        let lookup = self.transform.flavor_id(clients, arg).and_then(|flavor_id| {
            Ok(FlavorDescriptor::from(clients.compute()?.get_flavor(&flavor_id)?))
        });

        let live_miss = match lookup {
            Ok(flavor) => return Ok(Resolution::Found(flavor)),
            Err(error) if error.is_resolution_miss() => error,
            Err(error) => return Err(error),
        };
        log::debug!("Flavor lookup for '{}' missed, trying context: {}", param_name, live_miss);

        match flavor_from_context(config, arg) {
            Ok(flavor) => Ok(Resolution::Found(flavor)),
            Err(error) if error.is_resolution_miss() => {
                log::debug!("Context flavor lookup for '{}' missed: {}", param_name, error);
                Ok(Resolution::Missing(format!("Flavor '{}' not found", display_value(arg))))
            }
            Err(error) => Err(error),
        }
    }
}

/// Find a flavor among the `flavors` context definitions.
///
/// Only the matching definition is parsed, so a malformed sibling does not
/// hide a well-formed flavor. Fails with
/// [`PreflightError::InvalidScenarioArgument`] when the context has no
/// flavors section, no single definition matches, or the match is malformed.
pub fn flavor_from_context(config: &ScenarioConfig, arg: &Value) -> PreflightResult<FlavorDescriptor> {
    let definitions = config
        .flavors_context()
        .ok_or_else(|| PreflightError::InvalidScenarioArgument("No flavors context".to_string()))?;

    let selector = match ResourceSelector::from_arg(arg, "flavor")? {
        ResourceSelector::Id(id) => {
            return Err(PreflightError::InvalidScenarioArgument(format!(
                "Context flavors have no ids, cannot look up '{}'",
                id
            )))
        }
        selector => selector,
    };

    let named: Vec<ContextDefinition<'_>> = definitions
        .iter()
        .filter_map(|definition| {
            let name = definition.get("name").and_then(Value::as_str)?;
            Some(ContextDefinition { name, definition })
        })
        .collect();
    let matched = select(&selector, &named, "flavor")?;

    let flavor = serde_json::from_value::<ContextFlavor>(matched.definition.clone()).map_err(|e| {
        PreflightError::InvalidScenarioArgument(format!("Invalid context flavor '{}': {}", matched.name, e))
    })?;
    Ok(FlavorDescriptor::from(&flavor))
}

/// A context flavor definition known only by its name.
struct ContextDefinition<'a> {
    name: &'a str,
    definition: &'a Value,
}

impl NamedResource for ContextDefinition<'_> {
    fn resource_id(&self) -> &str {
        self.name
    }

    fn resource_name(&self) -> Option<&str> {
        Some(self.name)
    }
}

/// Descriptor for the context image when the argument refers to it.
fn image_from_context(config: &ScenarioConfig, arg: &Value) -> Option<ImageDescriptor> {
    let images = config.image_context()?;
    let context_name = images.get("image_name").and_then(Value::as_str)?;

    let by_name = match arg {
        Value::String(name) => name == context_name,
        other => other.get("name").and_then(Value::as_str) == Some(context_name),
    };
    let by_regex = arg
        .get("regex")
        .and_then(Value::as_str)
        .map(|pattern| matches_at_start(pattern, context_name))
        .unwrap_or(false);

    (by_name || by_regex).then(|| ImageDescriptor::from_context(context_name, images))
}

/// Whether `pattern` matches a prefix of `text`. Invalid patterns never match.
fn matches_at_start(pattern: &str, text: &str) -> bool {
    Regex::new(&format!("^(?:{})", pattern))
        .map(|regex| regex.is_match(text))
        .unwrap_or(false)
}

fn not_specified(param_name: &str) -> String {
    format!("Parameter {} is not specified.", param_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ClientError;
    use crate::platform::fakes::{FakeClients, FakeCloud};
    use crate::platform::ImagePayload;
    use crate::resources::descriptor::{FlavorId, ResourceSource};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Transform that records its inputs and resolves everything to a fixed id.
    struct RecordingTransform {
        seen: Mutex<Vec<Value>>,
        id: String,
    }

    impl RecordingTransform {
        fn new(id: &str) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                id: id.to_string(),
            }
        }
    }

    impl IdentifierTransform for RecordingTransform {
        fn image_id(&self, _clients: &dyn Clients, arg: &Value) -> PreflightResult<String> {
            self.seen.lock().push(arg.clone());
            Ok(self.id.clone())
        }

        fn flavor_id(&self, _clients: &dyn Clients, arg: &Value) -> PreflightResult<String> {
            self.seen.lock().push(arg.clone());
            Ok(self.id.clone())
        }
    }

    fn context_image_config(arg: Value) -> ScenarioConfig {
        ScenarioConfig::new()
            .with_arg("image", arg)
            .with_context("images", json!({"image_name": "foo", "min_ram": 64, "min_disk": 2}))
    }

    #[test]
    fn test_unspecified_parameter() {
        let clients = FakeClients::new(FakeCloud::new());
        let resolver = ResourceResolver::new();
        let config = ScenarioConfig::new().with_arg("image", json!(""));

        let resolution = resolver.resolve_image(&config, &clients, "image").unwrap();
        assert_eq!(resolution, Resolution::Missing("Parameter image is not specified.".into()));

        let resolution = resolver.resolve_flavor(&config, &clients, "flavor").unwrap();
        assert_eq!(resolution, Resolution::Missing("Parameter flavor is not specified.".into()));

        let optional = resolver.resolve_optional_image(&config, &clients, "image").unwrap();
        assert_eq!(optional, Resolution::Found(None));
        assert!(clients.cloud().calls().is_empty());
    }

    #[test]
    fn test_context_image_wins_without_client_calls() {
        let clients = FakeClients::new(FakeCloud::new());
        let transform = RecordingTransform::new("live");
        let resolver = ResourceResolver::with_transform(&transform);

        for arg in [json!("foo"), json!({"name": "foo"}), json!({"regex": "f.o"}), json!({"regex": "fo"})] {
            let image = resolver
                .resolve_image(&context_image_config(arg), &clients, "image")
                .unwrap()
                .found()
                .unwrap();
            assert_eq!(image.id, "foo");
            assert_eq!(image.size, 2);
            assert_eq!(image.min_ram, 64);
            assert_eq!(image.source, ResourceSource::Context);
        }

        assert!(transform.seen.lock().is_empty());
        assert!(clients.cloud().calls().is_empty());
    }

    #[test]
    fn test_context_regex_is_anchored_at_start() {
        let clients = FakeClients::new(FakeCloud::new().with_image("oo-id", "oo", 1, 0, 0));
        let resolver = ResourceResolver::new();

        let image = resolver
            .resolve_image(&context_image_config(json!({"regex": "oo"})), &clients, "image")
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(image.id, "oo-id");
        assert_eq!(image.source, ResourceSource::Platform);
    }

    #[test]
    fn test_live_image_from_document_payload() {
        let payload = ImagePayload::Document(
            json!({"id": "img", "size": null, "min_ram": 128})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let clients = FakeClients::new(FakeCloud::new().with_image_payload("img", "cirros", payload));
        let resolver = ResourceResolver::new();
        let config = ScenarioConfig::new().with_arg("image", json!({"name": "cirros"}));

        let image = resolver.resolve_image(&config, &clients, "image").unwrap().found().unwrap();
        assert_eq!(image.id, "img");
        assert_eq!(image.size, 0);
        assert_eq!(image.min_ram, 128);
        assert_eq!(image.min_disk, 0);
    }

    #[test]
    fn test_image_not_found_vs_environment_error() {
        let resolver = ResourceResolver::new();
        let config = ScenarioConfig::new().with_arg("image", json!({"id": "nope"}));

        let clients = FakeClients::new(FakeCloud::new());
        let resolution = resolver.resolve_image(&config, &clients, "image").unwrap();
        assert_eq!(resolution, Resolution::Missing(r#"Image '{"id":"nope"}' not found"#.into()));

        let clients = FakeClients::new(FakeCloud::new().with_image_error(ClientError::Transport("reset".into())));
        assert!(resolver.resolve_image(&config, &clients, "image").is_err());
    }

    #[test]
    fn test_live_flavor_is_preferred() {
        let clients = FakeClients::new(FakeCloud::new().with_flavor("42", "m1.tiny", 512, 1));
        let resolver = ResourceResolver::new();
        let config = ScenarioConfig::new()
            .with_arg("flavor", json!({"name": "m1.tiny"}))
            .with_context("flavors", json!([{"name": "m1.tiny", "ram": 1}]));

        let flavor = resolver.resolve_flavor(&config, &clients, "flavor").unwrap().found().unwrap();
        assert_eq!(flavor.id, FlavorId::Platform("42".into()));
        assert_eq!(flavor.ram, 512);
    }

    #[test]
    fn test_flavor_falls_back_to_context_after_live_miss() {
        let clients = FakeClients::new(FakeCloud::new());
        let resolver = ResourceResolver::new();
        let config = ScenarioConfig::new()
            .with_arg("flavor", json!({"name": "m1.nano"}))
            .with_context("flavors", json!([{"name": "m1.nano", "ram": 64}]));

        let flavor = resolver.resolve_flavor(&config, &clients, "flavor").unwrap().found().unwrap();
        assert_eq!(flavor.id, FlavorId::Context("m1.nano".into()));
        assert_eq!(flavor.id.to_string(), "<context flavor: m1.nano>");
        assert_eq!(clients.cloud().call_count("compute.list_flavors"), 1);
    }

    #[test]
    fn test_flavor_missing_everywhere() {
        let clients = FakeClients::new(FakeCloud::new());
        let resolver = ResourceResolver::new();

        let config = ScenarioConfig::new().with_arg("flavor", json!("m1.huge"));
        let resolution = resolver.resolve_flavor(&config, &clients, "flavor").unwrap();
        assert_eq!(resolution, Resolution::Missing("Flavor 'm1.huge' not found".into()));

        let config = config.with_context("flavors", json!([{"name": "m1.nano"}]));
        let resolution = resolver.resolve_flavor(&config, &clients, "flavor").unwrap();
        assert!(!resolution.is_found());
    }

    #[test]
    fn test_malformed_context_flavor_does_not_hide_siblings() {
        let clients = FakeClients::new(FakeCloud::new());
        let resolver = ResourceResolver::new();
        let config = ScenarioConfig::new()
            .with_arg("flavor", json!({"name": "m1.nano"}))
            .with_context(
                "flavors",
                json!([{"name": "m1.nano", "ram": 64}, {"name": "m1.big", "ram": 1.5}, {"name": "m1.bad", "ram": "x"}]),
            );

        let flavor = resolver.resolve_flavor(&config, &clients, "flavor").unwrap().found().unwrap();
        assert_eq!(flavor.id, FlavorId::Context("m1.nano".into()));
        assert_eq!(flavor.ram, 64);

        let error = flavor_from_context(&config, &json!("m1.bad")).unwrap_err();
        assert!(error.to_string().contains("Invalid context flavor 'm1.bad'"), "{}", error);
        let resolution = resolver
            .resolve_flavor(&config.clone().with_arg("flavor", json!("m1.bad")), &clients, "flavor")
            .unwrap();
        assert_eq!(resolution, Resolution::Missing("Flavor 'm1.bad' not found".into()));
    }

    #[test]
    fn test_flavor_environment_error_skips_context() {
        let cloud = FakeCloud::new().with_flavor_error(ClientError::Transport("reset".into()));
        let clients = FakeClients::new(cloud);
        let resolver = ResourceResolver::new();
        let config = ScenarioConfig::new()
            .with_arg("flavor", json!({"name": "m1.nano"}))
            .with_context("flavors", json!([{"name": "m1.nano", "ram": 64}]));

        let error = resolver.resolve_flavor(&config, &clients, "flavor").unwrap_err();
        assert!(matches!(error, PreflightError::Client(ClientError::Transport(ref m)) if m == "reset"));
    }

    #[test]
    fn test_flavor_from_context_requires_section() {
        let error = flavor_from_context(&ScenarioConfig::new(), &json!("m1.nano")).unwrap_err();
        assert_eq!(error.to_string(), "Invalid scenario argument: No flavors context");
    }
}
