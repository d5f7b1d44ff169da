//! Recursive feature assembly.
//!
//! A feature moves through `unprocessed -> assembling -> assembled`. While
//! it is assembling its identity sits on an explicit inclusion path; meeting
//! it again in the same role is a cycle. An upgrade and the base it is
//! retargeted onto may share an identity (a snapshot diffed against itself),
//! so path entries are keyed by identity and role. Inputs are never mutated:
//! every call returns a new feature with `assembled` set.

use std::time::Instant;

use crate::assembly::cache::AssemblyCache;
use crate::assembly::context::BuilderContext;
use crate::assembly::merge::merge_feature;
use crate::assembly::removals::apply_removals;
use crate::errors::{FeatureError, Result};
use crate::model::{ArtifactId, Feature, Include};
use crate::{log_op_end, log_op_error, log_op_start};

/// Assemble a feature by resolving and merging all its includes
///
/// A feature already marked assembled is returned unchanged.
///
/// # Errors
///
/// - `CyclicInclusion` if the inclusion path revisits a feature
/// - `UnresolvedInclude` if the provider cannot supply an included feature
/// - `ExtensionTypeMismatch` if same-name extensions differ in type
/// - any error an extension handler raises
pub fn assemble(feature: &Feature, context: &BuilderContext<'_>) -> Result<Feature> {
    let mut cache = AssemblyCache::new();
    run_logged("assemble", feature, context, &mut cache)
}

/// Like [`assemble`], memoizing results in a caller-owned cache
///
/// The cache is consulted for the feature itself and for every include.
///
/// # Errors
///
/// See [`assemble`].
pub fn assemble_cached(
    feature: &Feature,
    context: &BuilderContext<'_>,
    cache: &mut AssemblyCache,
) -> Result<Feature> {
    run_logged("assemble_cached", feature, context, cache)
}

fn run_logged(
    op: &'static str,
    feature: &Feature,
    context: &BuilderContext<'_>,
    cache: &mut AssemblyCache,
) -> Result<Feature> {
    let request = context.request_context();
    log_op_start!(
        op,
        feature_id = %feature.id,
        request_id = %request.request_id,
        trace_id = request.trace_id_str()
    );
    let start = Instant::now();

    let result = assemble_feature(feature, context, cache).map_err(|e| {
        log_op_error!(
            op,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            feature_id = %feature.id,
            request_id = %request.request_id,
            trace_id = request.trace_id_str()
        );
        e
    })?;

    log_op_end!(
        op,
        duration_ms = start.elapsed().as_millis() as u64,
        feature_id = %result.id
    );

    Ok(result)
}

/// Assembly without operation logging, for use by the other entry points
pub(crate) fn assemble_feature(
    feature: &Feature,
    context: &BuilderContext<'_>,
    cache: &mut AssemblyCache,
) -> Result<Feature> {
    let mut path = Vec::new();
    assemble_on_path(feature, context, &mut path, cache)
}

/// One feature being assembled on the current inclusion path
#[derive(Debug, PartialEq)]
struct PathEntry {
    id: ArtifactId,
    upgrade: bool,
}

impl PathEntry {
    fn of(feature: &Feature) -> Self {
        Self {
            id: feature.id.clone(),
            upgrade: feature.prototype.is_some(),
        }
    }
}

fn assemble_on_path(
    feature: &Feature,
    context: &BuilderContext<'_>,
    path: &mut Vec<PathEntry>,
    cache: &mut AssemblyCache,
) -> Result<Feature> {
    if feature.assembled {
        return Ok(feature.clone());
    }
    let entry = PathEntry::of(feature);
    if path.contains(&entry) {
        let mut cycle: Vec<String> = path.iter().map(|e| e.id.to_mvn_id()).collect();
        cycle.push(feature.id.to_mvn_id());
        return Err(FeatureError::CyclicInclusion {
            id: feature.id.to_mvn_id(),
            path: cycle,
        });
    }

    // an upgrade of its own identity would shadow its base in the cache
    let cacheable = !is_self_upgrade(feature);
    if cacheable {
        if let Some(done) = cache.get(&feature.id) {
            tracing::debug!(feature_id = %feature.id, "assembled feature served from cache");
            return Ok(done.clone());
        }
    }

    path.push(entry);
    let outcome = compose(feature, context, path, cache);
    path.pop();

    let result = outcome?;
    if cacheable {
        cache.insert(feature.id.clone(), result.clone());
    }
    Ok(result)
}

fn is_self_upgrade(feature: &Feature) -> bool {
    feature
        .prototype
        .as_ref()
        .is_some_and(|prototype| prototype.id == feature.id)
}

fn compose(
    feature: &Feature,
    context: &BuilderContext<'_>,
    path: &mut Vec<PathEntry>,
    cache: &mut AssemblyCache,
) -> Result<Feature> {
    let mut result = working_copy(feature);

    if !result.includes.is_empty() {
        let includes = std::mem::take(&mut result.includes);
        result.clear_sections();

        for include in &includes {
            tracing::debug!(
                feature_id = %feature.id,
                include_id = %include.id,
                depth = path.len(),
                "resolving include"
            );
            let included = context
                .provider()
                .provide(&include.id)
                .ok_or_else(|| FeatureError::UnresolvedInclude {
                    id: include.id.to_mvn_id(),
                })?;

            let mut assembled = assemble_on_path(&included, context, path, cache)?;
            apply_removals(&mut assembled, &include.removals);
            merge_feature(
                &mut result,
                &assembled,
                context.artifact_merge(),
                context.handlers(),
            )?;
        }

        // own content last
        merge_feature(
            &mut result,
            feature,
            context.artifact_merge(),
            context.handlers(),
        )?;
    }

    result.assembled = true;
    Ok(result)
}

/// Copy of `feature` to accumulate into
///
/// A feature declaring a prototype is retargeted onto the base identity:
/// the base becomes the first include, and the feature's own id is
/// recorded as an upgrade of the result.
fn working_copy(feature: &Feature) -> Feature {
    let Some(prototype) = &feature.prototype else {
        return feature.clone();
    };

    let base_include = feature
        .include_of(&prototype.id)
        .cloned()
        .unwrap_or_else(|| Include {
            id: prototype.id.clone(),
            removals: prototype.removals.clone(),
        });

    let mut copy = feature.copy_as(prototype.id.clone());
    copy.prototype = None;
    copy.includes.retain(|i| i.id != prototype.id);
    copy.includes.insert(0, base_include);
    copy.upgrades.push(feature.id.clone());
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::context::MapFeatureProvider;
    use crate::model::{Module, Prototype};

    fn id(s: &str) -> ArtifactId {
        ArtifactId::parse(s).unwrap()
    }

    #[test]
    fn test_base_case_is_marked_copy() {
        let mut f = Feature::new(id("g:f:1.0"));
        f.modules.add(Module::new(id("g:m:1.0")));
        let provider = MapFeatureProvider::new();

        let assembled = assemble(&f, &BuilderContext::new(&provider)).unwrap();
        let mut expected = f.clone();
        expected.assembled = true;
        assert_eq!(assembled, expected);
        assert!(!f.assembled, "input must not be mutated");
    }

    #[test]
    fn test_working_copy_inserts_base_first() {
        let mut f = Feature::new(id("g:up:1.1"));
        f.includes.push(Include::new(id("g:other:1.0")));
        f.prototype = Some(Prototype::new(id("g:base:1.0")));

        let copy = working_copy(&f);
        assert_eq!(copy.id, id("g:base:1.0"));
        assert_eq!(copy.includes[0].id, id("g:base:1.0"));
        assert_eq!(copy.includes[1].id, id("g:other:1.0"));
        assert_eq!(copy.upgrades, vec![id("g:up:1.1")]);
        assert!(copy.prototype.is_none());
    }

    #[test]
    fn test_working_copy_reuses_declared_base_include() {
        let mut declared = Include::new(id("g:base:1.0"));
        declared.removals.properties.push("p".to_string());
        let mut f = Feature::new(id("g:up:1.1"));
        f.includes.push(Include::new(id("g:other:1.0")));
        f.includes.push(declared.clone());
        f.prototype = Some(Prototype::new(id("g:base:1.0")));

        let copy = working_copy(&f);
        assert_eq!(copy.includes.len(), 2);
        assert_eq!(copy.includes[0], declared);
    }

    #[test]
    fn test_self_include_is_cycle() {
        let mut f = Feature::new(id("g:f:1.0"));
        f.includes.push(Include::new(id("g:f:1.0")));
        let provider = MapFeatureProvider::new().with_feature(f.clone());

        let err = assemble(&f, &BuilderContext::new(&provider)).unwrap_err();
        assert_eq!(
            err,
            FeatureError::CyclicInclusion {
                id: "g:f:1.0".to_string(),
                path: vec!["g:f:1.0".to_string(), "g:f:1.0".to_string()],
            }
        );
    }

    #[test]
    fn test_upgrade_of_same_identity_assembles_base() {
        let mut base = Feature::new(id("g:f:1.0"));
        base.modules.add(Module::new(id("g:m:1.0")));
        let mut upgrade = Feature::new(id("g:f:1.0"));
        upgrade.modules.add(Module::new(id("g:extra:1.0")));
        upgrade.prototype = Some(Prototype::new(id("g:f:1.0")));
        let provider = MapFeatureProvider::new().with_feature(base);
        let mut cache = AssemblyCache::new();

        let assembled = assemble_cached(&upgrade, &BuilderContext::new(&provider), &mut cache)
            .unwrap();
        assert!(assembled.modules.contains_exact(&id("g:m:1.0")));
        assert!(assembled.modules.contains_exact(&id("g:extra:1.0")));
        assert_eq!(assembled.upgrades, vec![id("g:f:1.0")]);

        // the cache still holds the base, not the upgraded result
        let cached = cache.get(&id("g:f:1.0")).unwrap();
        assert!(!cached.modules.contains_exact(&id("g:extra:1.0")));
    }

    #[test]
    fn test_upgrade_provided_as_its_own_base_is_cycle() {
        let mut upgrade = Feature::new(id("g:f:1.0"));
        upgrade.prototype = Some(Prototype::new(id("g:f:1.0")));
        let provider = MapFeatureProvider::new().with_feature(upgrade.clone());

        let err = assemble(&upgrade, &BuilderContext::new(&provider)).unwrap_err();
        assert!(matches!(err, FeatureError::CyclicInclusion { .. }));
    }

    #[test]
    fn test_mutual_inclusion_is_cycle() {
        let mut f = Feature::new(id("g:f:1.0"));
        f.includes.push(Include::new(id("g:g:1.0")));
        let mut g = Feature::new(id("g:g:1.0"));
        g.includes.push(Include::new(id("g:f:1.0")));
        let provider = MapFeatureProvider::new()
            .with_feature(f.clone())
            .with_feature(g);

        let err = assemble(&f, &BuilderContext::new(&provider)).unwrap_err();
        assert_eq!(
            err,
            FeatureError::CyclicInclusion {
                id: "g:f:1.0".to_string(),
                path: vec![
                    "g:f:1.0".to_string(),
                    "g:g:1.0".to_string(),
                    "g:f:1.0".to_string()
                ],
            }
        );
    }
}
