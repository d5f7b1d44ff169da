//! Feature diff engine.
//!
//! Compares two versions of a feature section by section and produces a
//! typed [`Delta`] per changed section, plus an upgrade descriptor that
//! turns the previous version into the current one when assembled.
//!
//! ## Entry point
//!
//! ```
//! use featmodel_core::diff::{diff, render_human_summary, SectionFilter};
//! use featmodel_core::model::{ArtifactId, Feature};
//!
//! let previous = Feature::new(ArtifactId::parse("g:f:1.0").unwrap());
//! let current = Feature::new(ArtifactId::parse("g:f:1.1").unwrap());
//! let result = diff(&previous, &current, SectionFilter::all()).unwrap();
//! assert!(result.is_empty());
//! let _summary = render_human_summary(&result);
//! ```
//!
//! ## Guarantees
//!
//! - **Reflexivity**: diffing a feature with itself yields no deltas.
//! - **Literal filters**: an empty section filter processes nothing.
//! - **Replace, not update**: a module version change is a removal plus an
//!   addition, with the version change recorded as an updated item.
//! - **Fatal parse failures**: a malformed structured-document extension
//!   aborts the diff.

pub mod comparators;
pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{compute_diff, diff, DiffRequest};
pub use human_summary::render_human_summary;
pub use model::{Delta, FeatureDiff, SectionFilter, SectionId, UpdatedItem};
