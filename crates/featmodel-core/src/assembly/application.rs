//! Assembly of a flat application out of several top-level features.

use std::time::Instant;

use crate::assembly::builder::assemble_feature;
use crate::assembly::cache::AssemblyCache;
use crate::assembly::context::{BuilderContext, ListFeatureProvider};
use crate::assembly::merge::merge_into_application;
use crate::errors::{FeatureError, Result};
use crate::model::{Application, ArtifactId, Feature};
use crate::{log_op_end, log_op_error, log_op_start};

/// Assemble `features` and merge them into one [`Application`]
///
/// Features sharing a coordinate are reduced to the highest version, the
/// rest are listed in `discarded_feature_ids`. The survivors are assembled
/// in identity order; includes are resolved against the whole given list
/// first (discarded entries included) and the context's provider second.
/// Modules and module-list extensions merge with the higher version winning.
///
/// # Errors
///
/// Any error of [`assemble`](crate::assembly::assemble).
pub fn assemble_application(
    features: &[Feature],
    context: &BuilderContext<'_>,
) -> Result<Application> {
    let mut app = Application::new();
    assemble_application_into(&mut app, features, context)?;
    Ok(app)
}

/// Like [`assemble_application`], merging into an existing application
///
/// Content already in `app` takes part in the merge like an earlier
/// feature. New feature ids are added to `feature_ids`, which stays sorted.
///
/// # Errors
///
/// Any error of [`assemble`](crate::assembly::assemble). `app` may hold
/// partially merged content afterwards.
pub fn assemble_application_into(
    app: &mut Application,
    features: &[Feature],
    context: &BuilderContext<'_>,
) -> Result<()> {
    let request = context.request_context();
    log_op_start!(
        "assemble_application",
        feature_count = features.len(),
        request_id = %request.request_id,
        trace_id = request.trace_id_str()
    );
    let start = Instant::now();

    assemble_application_impl(app, features, context).map_err(|e| {
        log_op_error!(
            "assemble_application",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request.request_id,
            trace_id = request.trace_id_str()
        );
        e
    })?;

    log_op_end!(
        "assemble_application",
        duration_ms = start.elapsed().as_millis() as u64,
        feature_count = app.feature_ids.len(),
        discarded_count = app.discarded_feature_ids.len()
    );

    Ok(())
}

/// Resolve `ids` through the context's provider, then assemble them
///
/// # Errors
///
/// - `UnresolvedInclude` if the provider cannot supply an id
/// - any error of [`assemble_application`]
pub fn assemble_application_by_ids(
    ids: &[ArtifactId],
    context: &BuilderContext<'_>,
) -> Result<Application> {
    let features = ids
        .iter()
        .map(|id| {
            context
                .provider()
                .provide(id)
                .ok_or_else(|| FeatureError::UnresolvedInclude { id: id.to_mvn_id() })
        })
        .collect::<Result<Vec<_>>>()?;
    assemble_application(&features, context)
}

fn assemble_application_impl(
    app: &mut Application,
    features: &[Feature],
    context: &BuilderContext<'_>,
) -> Result<()> {
    let mut selected: Vec<&Feature> = Vec::new();
    for feature in features {
        match selected.iter_mut().find(|s| s.id.is_same(&feature.id)) {
            Some(slot) if feature.id > slot.id => {
                app.discarded_feature_ids.push(slot.id.clone());
                *slot = feature;
            }
            Some(_) => app.discarded_feature_ids.push(feature.id.clone()),
            None => selected.push(feature),
        }
    }
    selected.sort_by(|a, b| a.id.cmp(&b.id));

    let provider = ListFeatureProvider {
        features,
        fallback: context.provider(),
    };
    let scoped = context.with_provider(&provider);
    let mut cache = AssemblyCache::new();

    for feature in selected {
        tracing::debug!(feature_id = %feature.id, "assembling application feature");
        let assembled = assemble_feature(feature, &scoped, &mut cache)?;
        merge_into_application(app, &assembled, scoped.handlers())?;
        app.feature_ids.push(feature.id.clone());
    }
    app.feature_ids.sort();
    app.feature_ids.dedup();

    Ok(())
}
