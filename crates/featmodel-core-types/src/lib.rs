//! Core types shared across featmodel facilities
//!
//! This crate provides foundational types used by both the error and the
//! logging facility of the composition engine:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
