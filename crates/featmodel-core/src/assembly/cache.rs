use std::collections::HashMap;

use crate::model::{ArtifactId, Feature};

/// Caller-owned memo of assembled features, keyed by input identity
///
/// The key is the identity of the feature handed to assembly, so a feature
/// declaring a prototype is cached under its own id even though its
/// assembled result carries the base id. An upgrade whose prototype is its
/// own id is never cached; the entry belongs to the base.
#[derive(Debug, Clone, Default)]
pub struct AssemblyCache {
    entries: HashMap<ArtifactId, Feature>,
}

impl AssemblyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ArtifactId) -> Option<&Feature> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn insert(&mut self, id: ArtifactId, assembled: Feature) {
        self.entries.insert(id, assembled);
    }

    /// Forget one entry, e.g. after its source changed
    pub fn invalidate(&mut self, id: &ArtifactId) -> Option<Feature> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
