//! Featmodel Core - composition engine for feature descriptors
//!
//! A feature is a named, versioned descriptor of a deployable unit: module
//! coordinates, configurations, framework properties, capabilities and
//! named extensions. This crate provides:
//! - The feature data model with structural equality for configuration values
//! - A diff engine producing a delta tree and an upgrade descriptor
//! - An assembly engine resolving includes with removals, cycle detection
//!   and pluggable extension handlers
//! - Upgrade and application assembly on top of it
//! - Structured logging and a stable error facility

pub mod assembly;
pub mod diff;
pub mod errors;
pub mod handlers;
pub mod logging_facility;
pub mod model;

pub use featmodel_core_types;

// Re-export commonly used types
pub use assembly::{
    assemble, assemble_application, assemble_application_by_ids, assemble_application_into,
    assemble_cached, assemble_with_upgrades, ArtifactMerge, AssemblyCache, AssemblyNotice, BuilderContext,
    FeatureProvider, MapFeatureProvider, UpgradeResult,
};
pub use diff::{compute_diff, diff, Delta, DiffRequest, FeatureDiff, SectionFilter, SectionId};
pub use errors::{ExError, ExErrorKind, FeatureError, Result};
pub use handlers::{ExtensionHandler, ExtensionHandlerRegistry};
pub use model::{Application, ArtifactId, ConfigValue, Feature};
