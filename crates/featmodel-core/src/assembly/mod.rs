//! Assembly engine
//!
//! Resolves a feature's includes through a [`FeatureProvider`], applies
//! include-scoped removals, and merges everything into one self-contained
//! feature. Upgrades (features naming a prototype) and whole applications
//! are assembled on top of the same recursion.
//!
//! # Example
//!
//! ```
//! use featmodel_core::assembly::{assemble, BuilderContext, MapFeatureProvider};
//! use featmodel_core::model::{ArtifactId, Feature, Include};
//!
//! let base = Feature::new(ArtifactId::parse("g:base:1.0").unwrap());
//! let mut app = Feature::new(ArtifactId::parse("g:app:1.0").unwrap());
//! app.includes.push(Include::new(base.id.clone()));
//!
//! let provider = MapFeatureProvider::new().with_feature(base);
//! let assembled = assemble(&app, &BuilderContext::new(&provider)).unwrap();
//! assert!(assembled.is_assembled());
//! assert!(assembled.includes.is_empty());
//! ```

pub mod application;
pub mod builder;
pub mod cache;
pub mod context;
pub mod merge;
pub mod removals;
pub mod upgrade;

pub use application::{
    assemble_application, assemble_application_by_ids, assemble_application_into,
};
pub use builder::{assemble, assemble_cached};
pub use cache::AssemblyCache;
pub use context::{ArtifactMerge, BuilderContext, FeatureProvider, MapFeatureProvider};
pub use removals::apply_removals;
pub use upgrade::{assemble_with_upgrades, AssemblyNotice, UpgradeResult};
