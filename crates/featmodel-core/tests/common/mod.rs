use featmodel_core::model::{
    ArtifactId, ConfigValue, Configuration, Extension, ExtensionKind, Feature, Include, Module,
    Modules, Prototype,
};

/// Parse an artifact id, panicking on malformed test input
#[allow(dead_code)]
pub fn id(s: &str) -> ArtifactId {
    ArtifactId::parse(s).unwrap()
}

/// Create an empty feature with the given id
#[allow(dead_code)]
pub fn feature(feature_id: &str) -> Feature {
    Feature::new(id(feature_id))
}

/// Create a feature exporting the given modules
#[allow(dead_code)]
pub fn feature_with_modules(feature_id: &str, module_ids: &[&str]) -> Feature {
    let mut f = feature(feature_id);
    for m in module_ids {
        f.modules.add(Module::new(id(m)));
    }
    f
}

/// Create a feature including the given features, in order
#[allow(dead_code)]
pub fn feature_including(feature_id: &str, includes: &[&str]) -> Feature {
    let mut f = feature(feature_id);
    for i in includes {
        f.includes.push(Include::new(id(i)));
    }
    f
}

/// Create a feature declared as an upgrade of `base`
#[allow(dead_code)]
pub fn upgrade_of(feature_id: &str, base: &str) -> Feature {
    let mut f = feature(feature_id);
    f.prototype = Some(Prototype::new(id(base)));
    f
}

/// Build a configuration from `serde_json` literal properties
#[allow(dead_code)]
pub fn configuration(pid: &str, properties: serde_json::Value) -> Configuration {
    let mut cfg = Configuration::new(pid);
    if let serde_json::Value::Object(map) = properties {
        for (key, value) in map {
            cfg.properties
                .insert(key, ConfigValue::try_from(value).unwrap());
        }
    }
    cfg
}

/// Module-list extension holding the given modules
#[allow(dead_code)]
pub fn module_extension(name: &str, module_ids: &[&str]) -> Extension {
    let modules: Modules = module_ids.iter().map(|m| Module::new(id(m))).collect();
    Extension::modules(name, ExtensionKind::Optional, modules)
}

/// Sorted module ids, for order-insensitive comparisons
#[allow(dead_code)]
pub fn module_ids(modules: &Modules) -> Vec<String> {
    let mut ids: Vec<String> = modules.iter().map(|m| m.id.to_mvn_id()).collect();
    ids.sort();
    ids
}
