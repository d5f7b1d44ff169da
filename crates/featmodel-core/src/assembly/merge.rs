//! Per-section merge policies.

use std::collections::BTreeMap;

use crate::assembly::context::ArtifactMerge;
use crate::errors::{FeatureError, Result};
use crate::handlers::ExtensionHandlerRegistry;
use crate::model::{Application, Configurations, ExtensionPayload, Extensions, Feature, Modules};

/// Merge modules by coordinate
///
/// The source is walked level by level in start order. `Latest` always lets
/// the source replace; `Highest` keeps an existing module with a strictly
/// higher version. A replaced module moves to the end of the list.
pub fn merge_modules(target: &mut Modules, source: &Modules, mode: ArtifactMerge) {
    for module in source.by_start_order().into_values().flatten() {
        let replace = match mode {
            ArtifactMerge::Latest => true,
            ArtifactMerge::Highest => target.get_same(&module.id).map_or(true, |existing| {
                existing.id.semantic_version() <= module.id.semantic_version()
            }),
        };
        if replace {
            target.remove_same(&module.id);
            target.add(module.clone());
        }
    }
}

/// Union by pid; on the same pid the source's properties override key-wise
pub fn merge_configurations(target: &mut Configurations, source: &Configurations) {
    for cfg in source {
        match target.get_mut(&cfg.pid) {
            Some(existing) => existing
                .properties
                .extend(cfg.properties.iter().map(|(k, v)| (k.clone(), v.clone()))),
            None => target.add(cfg.clone()),
        }
    }
}

/// Key union, the source wins on conflict
pub fn merge_properties(target: &mut BTreeMap<String, String>, source: &BTreeMap<String, String>) {
    target.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
}

/// Union by name
///
/// Same-name extensions must share a type. A handler claiming the name may
/// take over; otherwise module lists merge like modules and text or
/// structured documents are replaced by the source.
///
/// # Errors
///
/// - `ExtensionTypeMismatch` if same-name extensions differ in type
/// - any error a handler raises
pub fn merge_extensions(
    target: &mut Extensions,
    source: &Extensions,
    mode: ArtifactMerge,
    handlers: &ExtensionHandlerRegistry,
) -> Result<()> {
    for ext in source {
        let Some(current) = target.get_mut(&ext.name) else {
            target.add(ext.clone());
            continue;
        };

        if current.extension_type() != ext.extension_type() {
            return Err(FeatureError::ExtensionTypeMismatch {
                name: ext.name.clone(),
                left: current.extension_type().to_string(),
                right: ext.extension_type().to_string(),
            });
        }

        if let Some(merged) = handlers.merge(&ext.name, current, ext)? {
            tracing::debug!(extension = %ext.name, "extension merged by handler");
            *current = merged;
            continue;
        }

        match (&ext.payload, current.module_list_mut()) {
            (ExtensionPayload::Modules(from), Some(into)) => merge_modules(into, from, mode),
            _ => *current = ext.clone(),
        }
    }
    Ok(())
}

/// Merge every section of `source` into `target`, then post-process
///
/// Requirements and capabilities are concatenated.
///
/// # Errors
///
/// See [`merge_extensions`]; post-processing errors propagate too.
pub fn merge_feature(
    target: &mut Feature,
    source: &Feature,
    mode: ArtifactMerge,
    handlers: &ExtensionHandlerRegistry,
) -> Result<()> {
    merge_modules(&mut target.modules, &source.modules, mode);
    merge_configurations(&mut target.configurations, &source.configurations);
    merge_properties(&mut target.properties, &source.properties);
    target
        .requirements
        .extend(source.requirements.iter().cloned());
    target
        .capabilities
        .extend(source.capabilities.iter().cloned());
    merge_extensions(&mut target.extensions, &source.extensions, mode, handlers)?;
    handlers.post_process(target)
}

/// Merge an assembled feature into an application, higher version winning
///
/// # Errors
///
/// See [`merge_extensions`].
pub fn merge_into_application(
    target: &mut Application,
    source: &Feature,
    handlers: &ExtensionHandlerRegistry,
) -> Result<()> {
    merge_modules(&mut target.modules, &source.modules, ArtifactMerge::Highest);
    merge_configurations(&mut target.configurations, &source.configurations);
    merge_properties(&mut target.properties, &source.properties);
    target
        .requirements
        .extend(source.requirements.iter().cloned());
    target
        .capabilities
        .extend(source.capabilities.iter().cloned());
    merge_extensions(
        &mut target.extensions,
        &source.extensions,
        ArtifactMerge::Highest,
        handlers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::AppendTextHandler;
    use crate::model::{
        ArtifactId, ConfigValue, Configuration, Extension, ExtensionKind, Module, START_ORDER,
    };

    fn id(s: &str) -> ArtifactId {
        ArtifactId::parse(s).unwrap()
    }

    fn modules(ids: &[&str]) -> Modules {
        ids.iter().map(|s| Module::new(id(s))).collect()
    }

    #[test]
    fn test_latest_replaces_regardless_of_version() {
        let mut target = modules(&["g:m:2.0"]);
        merge_modules(&mut target, &modules(&["g:m:1.0"]), ArtifactMerge::Latest);
        assert!(target.contains_exact(&id("g:m:1.0")));
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn test_highest_keeps_higher_version() {
        let mut target = modules(&["g:m:2.0"]);
        merge_modules(&mut target, &modules(&["g:m:1.0"]), ArtifactMerge::Highest);
        assert!(target.contains_exact(&id("g:m:2.0")));

        merge_modules(&mut target, &modules(&["g:m:3.0"]), ArtifactMerge::Highest);
        assert!(target.contains_exact(&id("g:m:3.0")));
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn test_source_merged_in_start_order() {
        let mut source = Modules::new();
        source.add(Module::new(id("g:late:1.0")).with_metadata(START_ORDER, "20"));
        source.add(Module::new(id("g:default:1.0")));
        source.add(Module::new(id("g:early:1.0")).with_metadata(START_ORDER, "5"));

        let mut target = Modules::new();
        merge_modules(&mut target, &source, ArtifactMerge::Latest);
        let order: Vec<String> = target.iter().map(|m| m.id.to_mvn_id()).collect();
        assert_eq!(order, vec!["g:default:1.0", "g:early:1.0", "g:late:1.0"]);
    }

    #[test]
    fn test_configuration_properties_override_key_wise() {
        let mut target: Configurations = [Configuration::new("pid")
            .with_property("a", 1i64)
            .with_property("b", 1i64)]
        .into_iter()
        .collect();
        let source: Configurations = [Configuration::new("pid")
            .with_property("b", 2i64)
            .with_property("c", 2i64)]
        .into_iter()
        .collect();
        merge_configurations(&mut target, &source);

        let merged = target.get("pid").unwrap();
        assert_eq!(merged.properties["a"], ConfigValue::Long(1));
        assert_eq!(merged.properties["b"], ConfigValue::Long(2));
        assert_eq!(merged.properties["c"], ConfigValue::Long(2));
    }

    #[test]
    fn test_extension_type_mismatch_is_fatal() {
        let mut target: Extensions = [Extension::text("x", ExtensionKind::Optional, "a")]
            .into_iter()
            .collect();
        let source: Extensions = [Extension::json("x", ExtensionKind::Optional, "{}")]
            .into_iter()
            .collect();
        let result = merge_extensions(
            &mut target,
            &source,
            ArtifactMerge::Latest,
            &ExtensionHandlerRegistry::new(),
        );
        assert!(matches!(
            result,
            Err(FeatureError::ExtensionTypeMismatch { ref name, .. }) if name == "x"
        ));
    }

    #[test]
    fn test_text_replaced_unless_handler_claims() {
        let base = || -> Extensions {
            [Extension::text("repoinit", ExtensionKind::Optional, "a")]
                .into_iter()
                .collect()
        };
        let source: Extensions = [Extension::text("repoinit", ExtensionKind::Optional, "b")]
            .into_iter()
            .collect();

        let mut replaced = base();
        merge_extensions(
            &mut replaced,
            &source,
            ArtifactMerge::Latest,
            &ExtensionHandlerRegistry::new(),
        )
        .unwrap();
        assert_eq!(
            replaced.get("repoinit").unwrap().payload,
            ExtensionPayload::Text("b".to_string())
        );

        let mut appended = base();
        let handlers = ExtensionHandlerRegistry::new().with_handler(AppendTextHandler::new());
        merge_extensions(&mut appended, &source, ArtifactMerge::Latest, &handlers).unwrap();
        assert_eq!(
            appended.get("repoinit").unwrap().payload,
            ExtensionPayload::Text("a\nb".to_string())
        );
    }
}
