//! Feature diff computation engine.
//!
//! The core entry point is [`compute_diff`], which runs the comparators a
//! [`SectionFilter`] activates over two features and produces a
//! [`FeatureDiff`].

use std::time::Instant;

use crate::diff::comparators::{
    compare_configurations, compare_extensions, compare_modules, compare_properties,
};
use crate::diff::model::{FeatureDiff, SectionFilter, SectionId};
use crate::errors::{ExError, FeatureError};
use featmodel_core_types::RequestContext;
use crate::handlers::ExtensionHandlerRegistry;
use crate::model::{Feature, Prototype, Removals};
use crate::{log_op_end, log_op_error, log_op_start};

/// Inputs of one diff computation
#[derive(Debug, Clone)]
pub struct DiffRequest<'a> {
    pub previous: &'a Feature,
    pub current: &'a Feature,
    pub filter: SectionFilter,
    pub handlers: ExtensionHandlerRegistry,
    pub request_context: RequestContext,
}

impl<'a> DiffRequest<'a> {
    pub fn new(previous: &'a Feature, current: &'a Feature, filter: SectionFilter) -> Self {
        Self {
            previous,
            current,
            filter,
            handlers: ExtensionHandlerRegistry::new(),
            request_context: RequestContext::new(),
        }
    }

    /// Correlate logs and errors with a caller's request
    pub fn with_request_context(mut self, request_context: RequestContext) -> Self {
        self.request_context = request_context;
        self
    }

    /// Use custom extension comparisons
    pub fn with_handlers(mut self, handlers: ExtensionHandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }
}

/// Diff two features with the default extension comparisons
///
/// # Errors
///
/// See [`compute_diff`].
pub fn diff(
    previous: &Feature,
    current: &Feature,
    filter: SectionFilter,
) -> Result<FeatureDiff, ExError> {
    compute_diff(&DiffRequest::new(previous, current, filter))
}

/// Compute the diff described by `request`
///
/// Sections are processed in a fixed order (bundles, configurations,
/// framework properties, extensions); only sections that changed produce a
/// delta. An empty filter processes nothing.
///
/// # Errors
///
/// - `MalformedExtension` if a structured-document extension cannot be parsed
/// - `HandlerFailed` or any other error a registered handler raises
pub fn compute_diff(request: &DiffRequest<'_>) -> Result<FeatureDiff, ExError> {
    let correlation = &request.request_context;
    log_op_start!(
        "compute_diff",
        feature_id = %request.current.id,
        previous_id = %request.previous.id,
        request_id = %correlation.request_id,
        trace_id = correlation.trace_id_str()
    );
    let start = Instant::now();

    let result = compute_diff_impl(request).map_err(|e| {
        log_op_error!(
            "compute_diff",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %correlation.request_id,
            trace_id = correlation.trace_id_str()
        );
        ExError::from(e)
            .with_op("compute_diff")
            .with_request_context(correlation)
    })?;

    log_op_end!(
        "compute_diff",
        duration_ms = start.elapsed().as_millis() as u64,
        delta_count = result.deltas.len()
    );

    Ok(result)
}

fn compute_diff_impl(request: &DiffRequest<'_>) -> Result<FeatureDiff, FeatureError> {
    let previous = request.previous;
    let current = request.current;
    let filter = &request.filter;

    let mut descriptor = Feature::new(current.id.clone());
    let mut removals = Removals::default();
    let mut deltas = Vec::new();

    if filter.is_active(&SectionId::Modules) {
        deltas.push(compare_modules(
            &previous.modules,
            &current.modules,
            &mut removals,
            &mut descriptor,
        ));
    }
    if filter.is_active(&SectionId::Configurations) {
        deltas.push(compare_configurations(
            &previous.configurations,
            &current.configurations,
            &mut removals,
            &mut descriptor,
        ));
    }
    if filter.is_active(&SectionId::FrameworkProperties) {
        deltas.push(compare_properties(
            &previous.properties,
            &current.properties,
            &mut removals,
            &mut descriptor,
        ));
    }
    if filter.any_extension_active() {
        deltas.push(compare_extensions(
            &previous.extensions,
            &current.extensions,
            filter,
            &request.handlers,
            &mut removals,
            &mut descriptor,
        )?);
    }

    deltas.retain(|d| !d.is_empty());
    for delta in &deltas {
        tracing::debug!(
            feature_id = %current.id,
            section = %delta.id,
            changes = delta.change_count(),
            "section changed"
        );
    }

    descriptor.prototype = Some(Prototype {
        id: previous.id.clone(),
        removals,
    });

    Ok(FeatureDiff {
        previous: previous.id.clone(),
        current: current.id.clone(),
        deltas,
        descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactId, Configuration, Module};

    fn feature(id: &str) -> Feature {
        Feature::new(ArtifactId::parse(id).unwrap())
    }

    #[test]
    fn test_identical_features_have_no_deltas() {
        let mut f = feature("g:f:1.0");
        f.modules
            .add(Module::new(ArtifactId::parse("g:m:1.0").unwrap()));
        f.configurations
            .add(Configuration::new("pid").with_property("k", "v"));

        let result = diff(&f, &f, SectionFilter::all()).unwrap();
        assert!(result.is_empty());
        let prototype = result.descriptor.prototype.unwrap();
        assert!(prototype.removals.is_empty());
    }

    #[test]
    fn test_section_order_is_fixed() {
        let previous = feature("g:f:1.0");
        let mut current = feature("g:f:2.0");
        current
            .properties
            .insert("p".to_string(), "v".to_string());
        current
            .modules
            .add(Module::new(ArtifactId::parse("g:m:1.0").unwrap()));

        let result = diff(&previous, &current, SectionFilter::all()).unwrap();
        let ids: Vec<&str> = result.deltas.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["bundles", "framework-properties"]);
    }

    #[test]
    fn test_malformed_extension_maps_to_error_code() {
        let mut previous = feature("g:f:1.0");
        previous.extensions.add(crate::model::Extension::json(
            "api-regions",
            crate::model::ExtensionKind::Optional,
            "not json",
        ));
        let current = previous.clone();

        let err = diff(&previous, &current, SectionFilter::all()).unwrap_err();
        assert_eq!(err.code(), "ERR_MALFORMED_EXTENSION");
        assert_eq!(err.op(), Some("compute_diff"));
        assert_eq!(err.entity_id(), Some("api-regions"));
    }
}
