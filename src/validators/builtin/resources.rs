//! Resource validators: images, flavors, networks and volume types named by
//! scenario arguments must exist for every user.

use crate::core::args::ValidatorArgs;
use crate::core::config::{display_value, ScenarioConfig};
use crate::core::credentials::{Credentials, Deployment, DEFAULT_PLATFORM};
use crate::core::error::PreflightResult;
use crate::core::result::ValidationResult;
use crate::core::settings::DEFAULT_NAMESPACE;
use crate::platform::Clients;
use crate::resources::{flavor_from_context, FlavorDescriptor, Resolution, ResourceResolver};
use crate::validators::builtin::for_each_user;
use crate::validators::plugin::ScenarioPlugin;
use crate::validators::registry::{ConfigurableValidator, Validator, ValidatorMetadata, ValidatorRegistry};
use serde_json::Value;

const GIB: u64 = 1024 * 1024 * 1024;

/// Register resource validators.
pub fn register(registry: &mut ValidatorRegistry) {
    registry.register_type::<ImageExists>();
    registry.register_type::<ImageValidOnFlavor>();
    registry.register_type::<ExternalNetworkExists>();
    registry.register_type::<VolumeTypeExists>();
}

/// Image named by a scenario argument exists.
#[derive(Debug, Clone)]
pub struct ImageExists {
    param_name: String,
    nullable: bool,
    platform: String,
}

impl ConfigurableValidator for ImageExists {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("image_exists", DEFAULT_NAMESPACE)
            .description("Check that the image named by a scenario argument exists")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            param_name: args.required_str("image_exists", 0, "param_name")?,
            nullable: args.bool_or("image_exists", 1, "nullable", false)?,
        })
    }
}

impl Validator for ImageExists {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        if config.present_arg(&self.param_name).is_none() {
            return Ok(ValidationResult::from_verdict(
                self.nullable,
                format!("Parameter {} is not specified.", self.param_name),
            ));
        }

        let resolver = ResourceResolver::new();
        for_each_user(credentials, &self.platform, |_, clients| {
            Ok(resolver.resolve_image(config, clients, &self.param_name)?.to_result())
        })
    }
}

/// Image fits into the flavor it is booted with.
#[derive(Debug, Clone)]
pub struct ImageValidOnFlavor {
    flavor_param: String,
    image_param: String,
    fail_on_404_image: bool,
    validate_disk: bool,
    platform: String,
}

impl ConfigurableValidator for ImageValidOnFlavor {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("image_valid_on_flavor", DEFAULT_NAMESPACE)
            .description("Check that the flavor has enough memory and disk for the image")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        const NAME: &str = "image_valid_on_flavor";
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            flavor_param: args.required_str(NAME, 0, "flavor_param")?,
            image_param: args.required_str(NAME, 1, "image_param")?,
            fail_on_404_image: args.bool_or(NAME, 2, "fail_on_404_image", true)?,
            validate_disk: args.bool_or(NAME, 3, "validate_disk", true)?,
        })
    }
}

impl Validator for ImageValidOnFlavor {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let resolver = ResourceResolver::new();
        let mut resolved_flavor: Option<FlavorDescriptor> = None;

        for user in credentials.users(&self.platform) {
            let clients = user.credential.clients()?;
            let clients = clients.as_ref();

            let flavor = match resolved_flavor.take() {
                Some(flavor) => flavor,
                None => match resolver.resolve_flavor(config, clients, &self.flavor_param)? {
                    Resolution::Found(found) => found,
                    Resolution::Missing(msg) => return Ok(ValidationResult::invalid(msg)),
                },
            };
            let flavor = &*resolved_flavor.insert(flavor);

            let image = match resolver.resolve_image(config, clients, &self.image_param)? {
                Resolution::Found(image) => image,
                Resolution::Missing(_) if !self.fail_on_404_image => return Ok(ValidationResult::valid()),
                Resolution::Missing(msg) => return Ok(ValidationResult::invalid(msg)),
            };

            if flavor.ram < image.min_ram {
                return Ok(ValidationResult::invalid(format!(
                    "The memory size for flavor '{}' is too small for requested image '{}'",
                    flavor.id, image.id
                )));
            }

            if self.validate_disk && flavor.disk != 0 {
                if image.size > flavor.disk.saturating_mul(GIB) {
                    return Ok(ValidationResult::invalid(format!(
                        "The disk size for flavor '{}' is too small for requested image '{}'",
                        flavor.id, image.id
                    )));
                }
                if image.min_disk > flavor.disk {
                    return Ok(ValidationResult::invalid(format!(
                        "The minimal disk size for flavor '{}' is too small for requested image '{}'",
                        flavor.id, image.id
                    )));
                }
            }
        }
        Ok(ValidationResult::valid())
    }
}

/// External network named by a scenario argument is visible to every user.
#[derive(Debug, Clone)]
pub struct ExternalNetworkExists {
    param_name: String,
    platform: String,
}

impl ConfigurableValidator for ExternalNetworkExists {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("external_network_exists", DEFAULT_NAMESPACE)
            .description("Check that the external (floating) network exists")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            param_name: args
                .opt_str("external_network_exists", 0, "param_name")?
                .unwrap_or_else(|| "floating_network".to_string()),
        })
    }
}

impl Validator for ExternalNetworkExists {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let Some(network) = config.present_arg(&self.param_name).map(display_value) else {
            return Ok(ValidationResult::valid());
        };

        for_each_user(credentials, &self.platform, |user, clients| {
            let external: Vec<String> = clients
                .network()?
                .list_networks()?
                .into_iter()
                .filter(|net| net.router_external)
                .map(|net| net.name)
                .collect();
            Ok(ValidationResult::from_verdict(
                external.contains(&network),
                format!(
                    "External (floating) network with name {} not found by user {}. \
                     Available networks: [{}]",
                    network,
                    user.credential.username(),
                    external.join(", ")
                ),
            ))
        })
    }
}

/// Volume type named by a scenario argument exists for every user.
#[derive(Debug, Clone)]
pub struct VolumeTypeExists {
    param_name: String,
    nullable: bool,
    platform: String,
}

impl ConfigurableValidator for VolumeTypeExists {
    fn metadata() -> ValidatorMetadata {
        ValidatorMetadata::builder("volume_type_exists", DEFAULT_NAMESPACE)
            .description("Check that the requested volume type exists")
            .platform(DEFAULT_PLATFORM)
            .users()
            .build()
    }

    fn from_args(args: &ValidatorArgs) -> PreflightResult<Self> {
        Ok(Self {
            platform: DEFAULT_PLATFORM.to_string(),
            param_name: args.required_str("volume_type_exists", 0, "param_name")?,
            nullable: args.bool_or("volume_type_exists", 1, "nullable", true)?,
        })
    }
}

impl Validator for VolumeTypeExists {
    fn bind_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    fn validate(
        &self,
        credentials: &Credentials,
        config: &ScenarioConfig,
        _plugin: &ScenarioPlugin,
        _platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationResult> {
        let Some(volume_type) = config.present_arg(&self.param_name).map(display_value) else {
            return Ok(ValidationResult::from_verdict(
                self.nullable,
                format!(
                    "The parameter '{}' is required and should not be empty.",
                    self.param_name
                ),
            ));
        };

        for_each_user(credentials, &self.platform, |user, clients| {
            let types = clients.volume()?.list_volume_types()?;
            Ok(ValidationResult::from_verdict(
                types.contains(&volume_type),
                format!(
                    "Specified volume type {} not found for user {}. List of available types: [{}]",
                    volume_type,
                    user.credential.username(),
                    types.join(", ")
                ),
            ))
        })
    }
}

/// Legacy check that the flavor named by `param_name` can be resolved.
///
/// Without clients only the `flavors` context is consulted.
pub fn flavor_exists(
    config: &ScenarioConfig,
    clients: Option<&dyn Clients>,
    _deployment: &Deployment<'_>,
    args: &ValidatorArgs,
) -> PreflightResult<Option<ValidationResult>> {
    let param_name = args.required_str("flavor_exists", 0, "param_name")?;

    let resolution = match clients {
        Some(clients) => ResourceResolver::new().resolve_flavor(config, clients, &param_name)?,
        None => match config.present_arg(&param_name) {
            None => Resolution::Missing(format!("Parameter {} is not specified.", param_name)),
            Some(arg) => match flavor_from_context(config, arg) {
                Ok(flavor) => Resolution::Found(flavor),
                Err(error) if error.is_resolution_miss() => {
                    Resolution::Missing(format!("Flavor '{}' not found", display_value(arg)))
                }
                Err(error) => return Err(error),
            },
        },
    };
    Ok(Some(resolution.to_result()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ClientError;
    use crate::platform::fakes::{openstack_credentials, FakeCloud, FakeCredential};
    use crate::validators::builtin::run;
    use serde_json::json;

    fn image_valid_on_flavor(fail_on_404_image: bool) -> ImageValidOnFlavor {
        ImageValidOnFlavor::from_args(
            &ValidatorArgs::new()
                .arg("flavor")
                .arg("image")
                .kwarg("fail_on_404_image", fail_on_404_image),
        )
        .unwrap()
    }

    fn boot_config() -> ScenarioConfig {
        ScenarioConfig::new()
            .with_arg("flavor", json!({"name": "m1.tiny"}))
            .with_arg("image", json!({"name": "cirros"}))
    }

    #[test]
    fn test_image_exists_nullable_and_missing() {
        let user = FakeCredential::new("alice", FakeCloud::new());
        let credentials = openstack_credentials(None, &[user.clone()]);

        let nullable = ImageExists::from_args(&ValidatorArgs::new().arg("image").arg(true)).unwrap();
        assert!(run(&nullable, &credentials, &ScenarioConfig::new()).is_valid());

        let required = ImageExists::from_args(&ValidatorArgs::new().arg("image")).unwrap();
        assert_eq!(
            run(&required, &credentials, &ScenarioConfig::new()).msg(),
            "Parameter image is not specified."
        );
        assert_eq!(user.clients_calls(), 0);

        let config = ScenarioConfig::new().with_arg("image", json!("fake_image"));
        assert_eq!(run(&required, &credentials, &config).msg(), "Image 'fake_image' not found");
    }

    #[test]
    fn test_image_exists_checks_every_user() {
        let first = FakeCredential::new("a", FakeCloud::new().with_image("id", "cirros", 1, 0, 0));
        let second = FakeCredential::new("b", FakeCloud::new());
        let credentials = openstack_credentials(None, &[first, second.clone()]);

        let validator = ImageExists::from_args(&ValidatorArgs::new().arg("image")).unwrap();
        let config = ScenarioConfig::new().with_arg("image", json!({"name": "cirros"}));
        assert!(!run(&validator, &credentials, &config).is_valid());
        assert_eq!(second.cloud().call_count("image.list"), 1);
    }

    #[test]
    fn test_image_valid_on_flavor_ram_check_comes_first() {
        let cloud = FakeCloud::new()
            .with_flavor("f1", "m1.tiny", 64, 1)
            .with_image("i1", "cirros", 10 * GIB, 128, 10);
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", cloud)]);

        assert_eq!(
            run(&image_valid_on_flavor(true), &credentials, &boot_config()).msg(),
            "The memory size for flavor 'f1' is too small for requested image 'i1'"
        );
    }

    #[test]
    fn test_image_valid_on_flavor_disk_checks() {
        let too_big = FakeCloud::new()
            .with_flavor("f1", "m1.tiny", 512, 1)
            .with_image("i1", "cirros", 2 * GIB, 0, 0);
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", too_big)]);
        assert_eq!(
            run(&image_valid_on_flavor(true), &credentials, &boot_config()).msg(),
            "The disk size for flavor 'f1' is too small for requested image 'i1'"
        );

        let min_disk = FakeCloud::new()
            .with_flavor("f1", "m1.tiny", 512, 1)
            .with_image("i1", "cirros", GIB / 2, 0, 2);
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", min_disk)]);
        assert_eq!(
            run(&image_valid_on_flavor(true), &credentials, &boot_config()).msg(),
            "The minimal disk size for flavor 'f1' is too small for requested image 'i1'"
        );

        let no_disk = FakeCloud::new()
            .with_flavor("f1", "m1.tiny", 512, 0)
            .with_image("i1", "cirros", 100 * GIB, 0, 50);
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", no_disk)]);
        assert!(run(&image_valid_on_flavor(true), &credentials, &boot_config()).is_valid());

        let skip_disk = ImageValidOnFlavor::from_args(
            &ValidatorArgs::new().arg("flavor").arg("image").kwarg("validate_disk", false),
        )
        .unwrap();
        let small = FakeCloud::new()
            .with_flavor("f1", "m1.tiny", 512, 1)
            .with_image("i1", "cirros", 100 * GIB, 0, 50);
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", small)]);
        assert!(run(&skip_disk, &credentials, &boot_config()).is_valid());
    }

    #[test]
    fn test_image_valid_on_flavor_missing_image_policy() {
        let cloud = || FakeCloud::new().with_flavor("f1", "m1.tiny", 512, 1);

        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", cloud())]);
        assert_eq!(
            run(&image_valid_on_flavor(true), &credentials, &boot_config()).msg(),
            r#"Image '{"name":"cirros"}' not found"#
        );
        assert!(run(&image_valid_on_flavor(false), &credentials, &boot_config()).is_valid());
    }

    #[test]
    fn test_image_valid_on_flavor_resolves_flavor_once() {
        let first = FakeCredential::new(
            "a",
            FakeCloud::new()
                .with_flavor("f1", "m1.tiny", 512, 1)
                .with_image("i1", "cirros", 1, 0, 0),
        );
        let second = FakeCredential::new("b", FakeCloud::new().with_image("i1", "cirros", 1, 0, 0));
        let credentials = openstack_credentials(None, &[first, second.clone()]);

        assert!(run(&image_valid_on_flavor(true), &credentials, &boot_config()).is_valid());
        assert_eq!(second.cloud().call_count("compute."), 0);
        assert_eq!(second.cloud().call_count("image.get"), 1);
    }

    #[test]
    fn test_image_valid_on_flavor_with_context_resources() {
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", FakeCloud::new())]);
        let config = ScenarioConfig::new()
            .with_arg("flavor", json!({"name": "m1.nano"}))
            .with_arg("image", json!({"name": "ctx-image"}))
            .with_context("flavors", json!([{"name": "m1.nano", "ram": 64, "disk": 1}]))
            .with_context("images", json!({"image_name": "ctx-image", "min_ram": 128}));

        assert_eq!(
            run(&image_valid_on_flavor(true), &credentials, &config).msg(),
            "The memory size for flavor '<context flavor: m1.nano>' is too small for requested image 'ctx-image'"
        );
    }

    #[test]
    fn test_external_network_exists() {
        let cloud = FakeCloud::new()
            .with_network("public", true)
            .with_network("private", false)
            .with_network("custom", true);
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", cloud)]);
        let validator = ExternalNetworkExists::from_args(&ValidatorArgs::new().arg("net")).unwrap();

        assert!(run(&validator, &credentials, &ScenarioConfig::new()).is_valid());

        let config = ScenarioConfig::new().with_arg("net", json!("custom"));
        assert!(run(&validator, &credentials, &config).is_valid());

        let config = ScenarioConfig::new().with_arg("net", json!("private"));
        assert_eq!(
            run(&validator, &credentials, &config).msg(),
            "External (floating) network with name private not found by user alice. \
             Available networks: [public, custom]"
        );
    }

    #[test]
    fn test_volume_type_exists() {
        let cloud = FakeCloud::new().with_volume_type("lvm");
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", cloud)]);

        let nullable = VolumeTypeExists::from_args(&ValidatorArgs::new().arg("volume_type")).unwrap();
        assert!(run(&nullable, &credentials, &ScenarioConfig::new()).is_valid());

        let required = VolumeTypeExists::from_args(&ValidatorArgs::new().arg("volume_type").arg(false)).unwrap();
        assert_eq!(
            run(&required, &credentials, &ScenarioConfig::new()).msg(),
            "The parameter 'volume_type' is required and should not be empty."
        );

        let config = ScenarioConfig::new().with_arg("volume_type", json!("ceph"));
        assert_eq!(
            run(&nullable, &credentials, &config).msg(),
            "Specified volume type ceph not found for user alice. List of available types: [lvm]"
        );
    }

    #[test]
    fn test_flavor_exists_without_clients_uses_context() {
        let credentials = Credentials::new();
        let deployment = Deployment::new(&credentials);
        let args = ValidatorArgs::new().arg("flavor");

        let config = ScenarioConfig::new()
            .with_arg("flavor", json!("m1.nano"))
            .with_context("flavors", json!([{"name": "m1.nano"}]));
        let result = flavor_exists(&config, None, &deployment, &args).unwrap();
        assert!(ValidationResult::from_legacy(result).is_valid());

        let config = ScenarioConfig::new().with_arg("flavor", json!("m1.nano"));
        let result = flavor_exists(&config, None, &deployment, &args).unwrap();
        assert_eq!(ValidationResult::from_legacy(result).msg(), "Flavor 'm1.nano' not found");
    }

    #[test]
    fn test_environment_errors_propagate() {
        let cloud = FakeCloud::new()
            .with_flavor("f1", "m1.tiny", 512, 1)
            .with_image("i1", "cirros", 1, 0, 0)
            .with_image_error(ClientError::Unauthorized("token expired".into()));
        let credentials = openstack_credentials(None, &[FakeCredential::new("alice", cloud)]);
        let plugin = ScenarioPlugin::builder("Dummy").build();

        let outcome = image_valid_on_flavor(true).validate(&credentials, &boot_config(), &plugin, None);
        assert!(outcome.is_err());
    }
}
