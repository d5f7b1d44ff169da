use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::artifact_id::ArtifactId;
use super::configuration::Configurations;
use super::extension::Extensions;
use super::module::Modules;

/// Removal instructions applied to an included feature before it is merged
///
/// Configuration entries are `pid` or `factoryPid~name`, optionally suffixed
/// with `@property` to remove a single property instead of the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Removals {
    /// Modules removed by exact id (coordinate and version)
    pub modules: Vec<ArtifactId>,
    pub configurations: Vec<String>,
    pub properties: Vec<String>,
    pub extensions: Vec<String>,
    /// Single modules removed from named module-list extensions
    pub extension_modules: BTreeMap<String, Vec<ArtifactId>>,
}

impl Removals {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
            && self.configurations.is_empty()
            && self.properties.is_empty()
            && self.extensions.is_empty()
            && self.extension_modules.values().all(Vec::is_empty)
    }
}

/// Reference to another feature plus the removals applied to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    pub id: ArtifactId,
    #[serde(default)]
    pub removals: Removals,
}

impl Include {
    pub fn new(id: ArtifactId) -> Self {
        Self {
            id,
            removals: Removals::default(),
        }
    }
}

/// The base a feature is declared as an upgrade of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prototype {
    pub id: ArtifactId,
    #[serde(default)]
    pub removals: Removals,
}

impl Prototype {
    pub fn new(id: ArtifactId) -> Self {
        Self {
            id,
            removals: Removals::default(),
        }
    }
}

/// Opaque requirement entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub namespace: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub directives: BTreeMap<String, String>,
}

/// Opaque capability entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub namespace: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub directives: BTreeMap<String, String>,
}

/// A feature descriptor
///
/// Features are plain values. Assembly never mutates its input; it returns
/// a new feature with `assembled` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: ArtifactId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default)]
    pub includes: Vec<Include>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype: Option<Prototype>,
    /// Features that upgrade this one
    #[serde(default)]
    pub upgrades: Vec<ArtifactId>,

    #[serde(default)]
    pub modules: Modules,
    #[serde(default)]
    pub configurations: Configurations,
    /// Framework properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub extensions: Extensions,

    #[serde(default)]
    pub assembled: bool,
}

impl Feature {
    pub fn new(id: ArtifactId) -> Self {
        Self {
            id,
            title: None,
            description: None,
            vendor: None,
            license: None,
            includes: Vec::new(),
            prototype: None,
            upgrades: Vec::new(),
            modules: Modules::new(),
            configurations: Configurations::new(),
            properties: BTreeMap::new(),
            requirements: Vec::new(),
            capabilities: Vec::new(),
            extensions: Extensions::new(),
            assembled: false,
        }
    }

    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    /// The identity this feature upgrades, if any
    pub fn upgrade_of(&self) -> Option<&ArtifactId> {
        self.prototype.as_ref().map(|p| &p.id)
    }

    /// The declared include targeting `id` exactly
    pub fn include_of(&self, id: &ArtifactId) -> Option<&Include> {
        self.includes.iter().find(|i| &i.id == id)
    }

    /// Copy of this feature under another identity
    pub fn copy_as(&self, id: ArtifactId) -> Feature {
        let mut copy = self.clone();
        copy.id = id;
        copy
    }

    /// Empty all mergeable sections and the include list
    pub(crate) fn clear_sections(&mut self) {
        self.modules.clear();
        self.configurations.clear();
        self.properties.clear();
        self.requirements.clear();
        self.capabilities.clear();
        self.extensions.clear();
        self.includes.clear();
    }
}

/// Result of composing several top-level features
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub modules: Modules,
    #[serde(default)]
    pub configurations: Configurations,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub extensions: Extensions,

    /// Features merged into this application, in merge order
    #[serde(default)]
    pub feature_ids: Vec<ArtifactId>,
    /// Lower-version duplicates dropped in favour of a higher version
    #[serde(default)]
    pub discarded_feature_ids: Vec<ArtifactId>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }
}
