//! Include-scoped removal instructions.

use crate::model::{Feature, Removals};

/// Apply removal instructions to an assembled feature before it is merged
///
/// - modules are removed by exact id, and every configuration whose
///   `module` property names that id goes with them
/// - configuration entries remove the record, or only one property when
///   suffixed with `@property`
/// - property keys and extension names are removed outright
/// - per-extension module ids are removed from the named module list
///
/// Instructions naming something absent are ignored.
pub fn apply_removals(feature: &mut Feature, removals: &Removals) {
    for id in &removals.modules {
        feature.modules.remove_exact(id);
        let mvn_id = id.to_mvn_id();
        feature
            .configurations
            .retain(|cfg| cfg.module_ref() != Some(mvn_id.as_str()));
    }

    for entry in &removals.configurations {
        remove_configuration(feature, entry);
    }

    for key in &removals.properties {
        feature.properties.remove(key);
    }

    for name in &removals.extensions {
        feature.extensions.remove(name);
    }

    for (name, ids) in &removals.extension_modules {
        let Some(modules) = feature
            .extensions
            .get_mut(name)
            .and_then(|ext| ext.module_list_mut())
        else {
            continue;
        };
        for id in ids {
            modules.remove_exact(id);
        }
    }

    tracing::debug!(feature_id = %feature.id, "removals applied");
}

fn remove_configuration(feature: &mut Feature, entry: &str) {
    let (selector, attribute) = match entry.split_once('@') {
        Some((selector, attribute)) => (selector, Some(attribute)),
        None => (entry, None),
    };

    let found = match selector.split_once('~') {
        Some((factory_pid, name)) => feature.configurations.get_factory(factory_pid, name),
        None => feature.configurations.get(selector),
    }
    .map(|cfg| cfg.pid.clone());

    let Some(pid) = found else {
        return;
    };
    match attribute {
        None => {
            feature.configurations.remove(&pid);
        }
        Some(attribute) => {
            if let Some(cfg) = feature.configurations.get_mut(&pid) {
                cfg.properties.remove(attribute);
            }
        }
    }
}
