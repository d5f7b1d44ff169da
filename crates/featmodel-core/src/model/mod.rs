pub mod artifact_id;
pub mod configuration;
pub mod extension;
pub mod feature;
pub mod module;
pub mod value;

pub use artifact_id::{ArtifactId, Coordinate, Version};
pub use configuration::{Configuration, Configurations, MODULE_PROPERTY};
pub use extension::{Extension, ExtensionKind, ExtensionPayload, ExtensionType, Extensions};
pub use feature::{Application, Capability, Feature, Include, Prototype, Removals, Requirement};
pub use module::{Module, Modules, START_ORDER};
pub use value::{structural_eq, ConfigValue};
