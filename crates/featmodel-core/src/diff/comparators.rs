//! Per-section comparators.
//!
//! Every comparator returns the section's [`Delta`] and records the same
//! changes for the upgrade descriptor: removals into a [`Removals`] that
//! becomes its prototype, additions and replacements into its sections.

use std::collections::BTreeMap;

use crate::diff::model::{Delta, SectionFilter, SectionId, UpdatedItem};
use crate::errors::Result;
use crate::handlers::{parse_document, ExtensionHandlerRegistry};
use crate::model::{
    ArtifactId, ConfigValue, Configuration, Configurations, Extension, ExtensionPayload,
    Extensions, Feature, Module, Modules, Removals,
};

/// Generic keyed comparison with structural value equality
pub fn compare_maps(
    id: &str,
    previous: &BTreeMap<String, ConfigValue>,
    current: &BTreeMap<String, ConfigValue>,
) -> Delta {
    let mut delta = Delta::new(id);

    for (key, previous_value) in previous {
        match current.get(key) {
            None => {
                delta.removed.insert(key.clone());
            }
            Some(current_value) if previous_value != current_value => {
                delta.updated_items.push(UpdatedItem::new(
                    key.clone(),
                    previous_value.clone(),
                    current_value.clone(),
                ));
            }
            Some(_) => {}
        }
    }

    for key in current.keys() {
        if !previous.contains_key(key) {
            delta.added.insert(key.clone());
        }
    }

    delta
}

fn string_map(map: &BTreeMap<String, String>) -> BTreeMap<String, ConfigValue> {
    map.iter()
        .map(|(k, v)| (k.clone(), ConfigValue::String(v.clone())))
        .collect()
}

/// Outcome of comparing two module lists
struct ModuleChanges {
    delta: Delta,
    /// Previous ids to remove
    removals: Vec<ArtifactId>,
    /// Current modules to add or replace
    additions: Vec<Module>,
}

fn compare_module_lists(id: &str, previous: &Modules, current: &Modules) -> ModuleChanges {
    let mut changes = ModuleChanges {
        delta: Delta::new(id),
        removals: Vec::new(),
        additions: Vec::new(),
    };

    for previous_module in previous {
        let Some(current_module) = current.get_same(&previous_module.id) else {
            changes.delta.removed.insert(previous_module.id.to_string());
            changes.removals.push(previous_module.id.clone());
            continue;
        };

        let coordinate = previous_module.id.coordinate().to_string();
        let mut replaced = false;

        if previous_module.id != current_module.id {
            // replace, recorded with the version change
            changes.delta.removed.insert(previous_module.id.to_string());
            changes.delta.added.insert(current_module.id.to_string());
            changes.delta.updated_items.push(UpdatedItem::new(
                coordinate.clone(),
                previous_module.id.version(),
                current_module.id.version(),
            ));
            changes.removals.push(previous_module.id.clone());
            replaced = true;
        }

        let metadata = compare_maps(
            &coordinate,
            &string_map(&previous_module.metadata),
            &string_map(&current_module.metadata),
        );
        let metadata_changed = !metadata.is_empty();
        changes.delta.attach(metadata);

        if replaced || metadata_changed {
            changes.additions.push(current_module.clone());
        }
    }

    for current_module in current {
        if !previous.contains_same(&current_module.id) {
            changes.delta.added.insert(current_module.id.to_string());
            changes.additions.push(current_module.clone());
        }
    }

    changes
}

/// Module comparator, matching by coordinate
pub fn compare_modules(
    previous: &Modules,
    current: &Modules,
    removals: &mut Removals,
    target: &mut Feature,
) -> Delta {
    let changes = compare_module_lists(SectionId::BUNDLES, previous, current);
    removals.modules.extend(changes.removals);
    for module in changes.additions {
        target.modules.add(module);
    }
    changes.delta
}

/// Configuration comparator, matching by pid
///
/// Module removals already recorded in `removals` drop the configurations
/// linked to those modules on reassembly, so such a configuration is
/// carried whole rather than as a partial record.
pub fn compare_configurations(
    previous: &Configurations,
    current: &Configurations,
    removals: &mut Removals,
    target: &mut Feature,
) -> Delta {
    let mut delta = Delta::new(SectionId::CONFIGURATIONS);

    for previous_cfg in previous {
        let Some(current_cfg) = current.get(&previous_cfg.pid) else {
            delta.removed.insert(previous_cfg.pid.clone());
            removals.configurations.push(previous_cfg.pid.clone());
            continue;
        };

        let nested = compare_maps(
            &previous_cfg.pid,
            &previous_cfg.properties,
            &current_cfg.properties,
        );

        if linked_module_removed(previous_cfg, removals) {
            target.configurations.add(current_cfg.clone());
            delta.attach(nested);
            continue;
        }
        if nested.is_empty() {
            continue;
        }

        // carry only the changed and added properties
        let mut partial = Configuration::new(previous_cfg.pid.clone());
        for key in nested
            .added
            .iter()
            .chain(nested.updated_items.iter().map(|u| &u.id))
        {
            if let Some(value) = current_cfg.properties.get(key) {
                partial.properties.insert(key.clone(), value.clone());
            }
        }
        if !partial.properties.is_empty() {
            target.configurations.add(partial);
        }
        for key in &nested.removed {
            removals
                .configurations
                .push(format!("{}@{}", previous_cfg.pid, key));
        }

        delta.attach(nested);
    }

    for current_cfg in current {
        if previous.get(&current_cfg.pid).is_none() {
            delta.added.insert(current_cfg.pid.clone());
            target.configurations.add(current_cfg.clone());
        }
    }

    delta
}

fn linked_module_removed(cfg: &Configuration, removals: &Removals) -> bool {
    cfg.module_ref().is_some_and(|module| {
        removals
            .modules
            .iter()
            .any(|removed| removed.to_mvn_id() == module)
    })
}

/// Framework properties comparator
pub fn compare_properties(
    previous: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
    removals: &mut Removals,
    target: &mut Feature,
) -> Delta {
    let delta = compare_maps(
        SectionId::FRAMEWORK_PROPERTIES,
        &string_map(previous),
        &string_map(current),
    );

    removals.properties.extend(delta.removed.iter().cloned());
    for key in delta
        .added
        .iter()
        .chain(delta.updated_items.iter().map(|u| &u.id))
    {
        if let Some(value) = current.get(key) {
            target.properties.insert(key.clone(), value.clone());
        }
    }

    delta
}

/// Extension comparator, matching by name
///
/// Only extensions the filter activates are compared.
///
/// # Errors
///
/// - `MalformedExtension` if a structured document cannot be parsed
/// - any error raised by a registered handler
pub fn compare_extensions(
    previous: &Extensions,
    current: &Extensions,
    filter: &SectionFilter,
    handlers: &ExtensionHandlerRegistry,
    removals: &mut Removals,
    target: &mut Feature,
) -> Result<Delta> {
    let mut delta = Delta::new(SectionId::EXTENSIONS);

    for previous_ext in previous {
        if !filter.is_extension_active(&previous_ext.name) {
            continue;
        }
        match current.get(&previous_ext.name) {
            None => {
                delta.removed.insert(previous_ext.name.clone());
                removals.extensions.push(previous_ext.name.clone());
            }
            Some(current_ext) => {
                compare_extension(previous_ext, current_ext, handlers, &mut delta, removals, target)?
            }
        }
    }

    for current_ext in current {
        if filter.is_extension_active(&current_ext.name) && previous.get(&current_ext.name).is_none()
        {
            delta.added.insert(current_ext.name.clone());
            target.extensions.add(current_ext.clone());
        }
    }

    Ok(delta)
}

fn compare_extension(
    previous: &Extension,
    current: &Extension,
    handlers: &ExtensionHandlerRegistry,
    delta: &mut Delta,
    removals: &mut Removals,
    target: &mut Feature,
) -> Result<()> {
    let name = previous.name.as_str();

    if let Some(mut custom) = handlers.diff(name, previous, current)? {
        if !custom.is_empty() {
            custom.id = name.to_string();
            delta.attach(custom);
            replace_extension(current, removals, target);
        }
        return Ok(());
    }

    let replace = match (&previous.payload, &current.payload) {
        (ExtensionPayload::Modules(previous_modules), ExtensionPayload::Modules(current_modules)) => {
            let changes = compare_module_lists(name, previous_modules, current_modules);
            if !changes.removals.is_empty() {
                removals
                    .extension_modules
                    .entry(name.to_string())
                    .or_default()
                    .extend(changes.removals);
            }
            if !changes.additions.is_empty() {
                target.extensions.add(Extension::modules(
                    name,
                    current.kind,
                    changes.additions.into_iter().collect(),
                ));
            }
            delta.attach(changes.delta);
            false
        }
        (ExtensionPayload::Text(previous_text), ExtensionPayload::Text(current_text)) => {
            previous_text != current_text
        }
        (ExtensionPayload::Json(previous_json), ExtensionPayload::Json(current_json)) => {
            parse_document(name, previous_json)? != parse_document(name, current_json)?
        }
        _ => {
            tracing::debug!(
                extension = name,
                previous_type = %previous.extension_type(),
                current_type = %current.extension_type(),
                "extension type changed"
            );
            true
        }
    };

    if replace {
        delta.removed.insert(name.to_string());
        delta.added.insert(name.to_string());
        replace_extension(current, removals, target);
    }
    Ok(())
}

/// Record a full replace of `current` on the upgrade descriptor
fn replace_extension(current: &Extension, removals: &mut Removals, target: &mut Feature) {
    removals.extensions.push(current.name.clone());
    target.extensions.add(current.clone());
}
