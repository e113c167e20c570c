//! Identifier transform: scenario argument to platform resource id.
//!
//! A scenario may reference a resource by `id`, by exact `name` or by
//! `regex`; a bare string is taken as a name. Anything that cannot be turned
//! into exactly one id is rejected with
//! [`PreflightError::InvalidScenarioArgument`].

use crate::core::config::display_value;
use crate::core::error::{PreflightError, PreflightResult};
use crate::platform::{Clients, FlavorRecord, ImageSummary};
use regex::Regex;
use serde_json::Value;

/// How a scenario argument selects a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSelector {
    /// Exact platform id.
    Id(String),
    /// Exact name.
    Name(String),
    /// Regular expression searched in the name.
    Regex(String),
}

impl ResourceSelector {
    /// Interpret a scenario argument.
    pub fn from_arg(arg: &Value, typename: &str) -> PreflightResult<Self> {
        let field = |key: &str| arg.get(key).and_then(Value::as_str).map(String::from);
        match arg {
            Value::String(name) => Ok(ResourceSelector::Name(name.clone())),
            Value::Object(_) => field("id")
                .map(ResourceSelector::Id)
                .or_else(|| field("name").map(ResourceSelector::Name))
                .or_else(|| field("regex").map(ResourceSelector::Regex))
                .ok_or_else(|| {
                    PreflightError::InvalidScenarioArgument(format!(
                        "{} 'id', 'name', or 'regex' not found in '{}'",
                        typename,
                        display_value(arg)
                    ))
                }),
            other => Err(PreflightError::InvalidScenarioArgument(format!(
                "{} reference must be a string or a mapping, got '{}'",
                typename, other
            ))),
        }
    }

    fn pattern(&self) -> &str {
        match self {
            ResourceSelector::Id(s) | ResourceSelector::Name(s) | ResourceSelector::Regex(s) => s,
        }
    }
}

/// A resource that can be picked out of a listing.
pub trait NamedResource {
    /// Resource id.
    fn resource_id(&self) -> &str;
    /// Resource name, if it has one.
    fn resource_name(&self) -> Option<&str>;
}

impl NamedResource for ImageSummary {
    fn resource_id(&self) -> &str {
        &self.id
    }

    fn resource_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl NamedResource for FlavorRecord {
    fn resource_id(&self) -> &str {
        &self.id
    }

    fn resource_name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// Pick exactly one resource out of a listing.
pub fn select<'a, R: NamedResource>(
    selector: &ResourceSelector,
    resources: &'a [R],
    typename: &str,
) -> PreflightResult<&'a R> {
    let matching: Vec<&R> = match selector {
        ResourceSelector::Id(id) => resources.iter().filter(|r| r.resource_id() == id).collect(),
        ResourceSelector::Name(name) => resources
            .iter()
            .filter(|r| r.resource_name() == Some(name.as_str()))
            .collect(),
        ResourceSelector::Regex(pattern) => {
            let regex = Regex::new(pattern).map_err(|e| {
                PreflightError::InvalidScenarioArgument(format!(
                    "{} pattern '{}' is not a valid regular expression: {}",
                    typename, pattern, e
                ))
            })?;
            resources
                .iter()
                .filter(|r| regex.is_match(r.resource_name().unwrap_or("")))
                .collect()
        }
    };

    match matching.as_slice() {
        [] => Err(PreflightError::InvalidScenarioArgument(format!(
            "{} with pattern '{}' not found",
            typename,
            selector.pattern()
        ))),
        [single] => Ok(*single),
        many => Err(PreflightError::InvalidScenarioArgument(format!(
            "{} with name '{}' is ambiguous, possible matches by id: {}",
            typename,
            selector.pattern(),
            many.iter().map(|r| r.resource_id()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

/// Turns a scenario argument into a concrete platform id.
pub trait IdentifierTransform: Send + Sync {
    /// Resolve an image reference.
    fn image_id(&self, clients: &dyn Clients, arg: &Value) -> PreflightResult<String>;
    /// Resolve a flavor reference.
    fn flavor_id(&self, clients: &dyn Clients, arg: &Value) -> PreflightResult<String>;
}

/// Transform resolving names and patterns against the live catalog.
///
/// Explicit ids are returned as-is without a listing call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogTransform;

impl IdentifierTransform for CatalogTransform {
    fn image_id(&self, clients: &dyn Clients, arg: &Value) -> PreflightResult<String> {
        match ResourceSelector::from_arg(arg, "image")? {
            ResourceSelector::Id(id) => Ok(id),
            selector => {
                let images = clients.image()?.list()?;
                Ok(select(&selector, &images, "image")?.id.clone())
            }
        }
    }

    fn flavor_id(&self, clients: &dyn Clients, arg: &Value) -> PreflightResult<String> {
        match ResourceSelector::from_arg(arg, "flavor")? {
            ResourceSelector::Id(id) => Ok(id),
            selector => {
                let flavors = clients.compute()?.list_flavors()?;
                Ok(select(&selector, &flavors, "flavor")?.id.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fakes::{FakeClients, FakeCloud};
    use serde_json::json;

    fn flavors() -> Vec<FlavorRecord> {
        vec![
            FlavorRecord { id: "1".into(), name: "m1.tiny".into(), ..Default::default() },
            FlavorRecord { id: "2".into(), name: "m1.small".into(), ..Default::default() },
        ]
    }

    #[test]
    fn test_selector_forms() {
        assert_eq!(
            ResourceSelector::from_arg(&json!("cirros"), "image").unwrap(),
            ResourceSelector::Name("cirros".into())
        );
        assert_eq!(
            ResourceSelector::from_arg(&json!({"id": "abc", "name": "x"}), "image").unwrap(),
            ResourceSelector::Id("abc".into())
        );
        assert_eq!(
            ResourceSelector::from_arg(&json!({"regex": "^cir"}), "image").unwrap(),
            ResourceSelector::Regex("^cir".into())
        );

        let error = ResourceSelector::from_arg(&json!({"size": 1}), "image").unwrap_err();
        assert!(error.is_resolution_miss());
    }

    #[test]
    fn test_select_by_name_and_regex() {
        let flavors = flavors();
        let by_name = select(&ResourceSelector::Name("m1.small".into()), &flavors, "flavor").unwrap();
        assert_eq!(by_name.id, "2");

        let by_regex = select(&ResourceSelector::Regex("tiny$".into()), &flavors, "flavor").unwrap();
        assert_eq!(by_regex.id, "1");
    }

    #[test]
    fn test_select_ambiguous_and_missing() {
        let flavors = flavors();
        let error = select(&ResourceSelector::Regex("^m1".into()), &flavors, "flavor").unwrap_err();
        assert!(error.to_string().contains("ambiguous"));
        assert!(error.to_string().contains("1, 2"));

        let error = select(&ResourceSelector::Name("m1.huge".into()), &flavors, "flavor").unwrap_err();
        assert!(error.to_string().contains("not found"));
    }

    #[test]
    fn test_catalog_transform_skips_listing_for_ids() {
        let clients = FakeClients::new(FakeCloud::new().with_image("abc", "cirros", 1, 0, 0));

        assert_eq!(CatalogTransform.image_id(&clients, &json!({"id": "zzz"})).unwrap(), "zzz");
        assert_eq!(clients.cloud().call_count("image.list"), 0);

        assert_eq!(CatalogTransform.image_id(&clients, &json!("cirros")).unwrap(), "abc");
        assert_eq!(clients.cloud().call_count("image.list"), 1);
    }
}
