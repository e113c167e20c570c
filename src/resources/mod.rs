//! Resource resolution.
//!
//! Turns image and flavor references found in scenario arguments into
//! normalized descriptors, consulting the scenario context and the live
//! platform.

pub mod descriptor;
pub mod resolver;
pub mod transform;

pub use descriptor::{ContextFlavor, FlavorDescriptor, FlavorId, ImageDescriptor, Resolution, ResourceSource};
pub use resolver::{flavor_from_context, ResourceResolver};
pub use transform::{CatalogTransform, IdentifierTransform, NamedResource, ResourceSelector};
