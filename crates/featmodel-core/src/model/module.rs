use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::artifact_id::ArtifactId;

/// Well-known metadata key holding the module start level
pub const START_ORDER: &str = "start-order";

/// Reference to one deployable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ArtifactId,

    /// Free-form string metadata (e.g. `start-order`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Module {
    pub fn new(id: ArtifactId) -> Self {
        Self {
            id,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style metadata setter
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Start level from the `start-order` metadata, 0 if absent or not a number
    pub fn start_order(&self) -> u32 {
        self.metadata
            .get(START_ORDER)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Ordered module container
///
/// Keeps insertion order. At most one module per coordinate is expected,
/// but the container does not enforce it; the merge policies do.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modules {
    items: Vec<Module>,
}

impl Modules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: Module) {
        self.items.push(module);
    }

    /// Module at the same coordinate, any version
    pub fn get_same(&self, id: &ArtifactId) -> Option<&Module> {
        self.items.iter().find(|m| m.id.is_same(id))
    }

    /// Module with exactly this id
    pub fn get_exact(&self, id: &ArtifactId) -> Option<&Module> {
        self.items.iter().find(|m| &m.id == id)
    }

    pub fn contains_exact(&self, id: &ArtifactId) -> bool {
        self.get_exact(id).is_some()
    }

    pub fn contains_same(&self, id: &ArtifactId) -> bool {
        self.get_same(id).is_some()
    }

    /// Remove every module at the same coordinate; true if any was removed
    pub fn remove_same(&mut self, id: &ArtifactId) -> bool {
        let before = self.items.len();
        self.items.retain(|m| !m.id.is_same(id));
        before != self.items.len()
    }

    /// Remove the module with exactly this id; true if it was present
    pub fn remove_exact(&mut self, id: &ArtifactId) -> bool {
        match self.items.iter().position(|m| &m.id == id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Module> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Modules grouped by start level, ascending; insertion order within a level
    pub fn by_start_order(&self) -> BTreeMap<u32, Vec<&Module>> {
        let mut grouped: BTreeMap<u32, Vec<&Module>> = BTreeMap::new();
        for module in &self.items {
            grouped.entry(module.start_order()).or_default().push(module);
        }
        grouped
    }
}

impl FromIterator<Module> for Modules {
    fn from_iter<I: IntoIterator<Item = Module>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Modules {
    type Item = &'a Module;
    type IntoIter = std::slice::Iter<'a, Module>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
