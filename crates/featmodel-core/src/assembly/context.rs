//! Collaborators handed to the assembly engine.

use std::collections::BTreeMap;

use featmodel_core_types::RequestContext;

use crate::handlers::ExtensionHandlerRegistry;
use crate::model::{ArtifactId, Feature};

/// Resolves a feature by its exact identity
///
/// Must answer deterministically for a given identity within one assembly
/// pass. `None` means not found, which is fatal for the pass.
pub trait FeatureProvider {
    fn provide(&self, id: &ArtifactId) -> Option<Feature>;
}

impl<F> FeatureProvider for F
where
    F: Fn(&ArtifactId) -> Option<Feature>,
{
    fn provide(&self, id: &ArtifactId) -> Option<Feature> {
        self(id)
    }
}

/// In-memory provider keyed by identity
#[derive(Debug, Clone, Default)]
pub struct MapFeatureProvider {
    features: BTreeMap<ArtifactId, Feature>,
}

impl MapFeatureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.insert(feature);
        self
    }

    pub fn insert(&mut self, feature: Feature) {
        self.features.insert(feature.id.clone(), feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Feature> for MapFeatureProvider {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut provider = Self::new();
        for feature in iter {
            provider.insert(feature);
        }
        provider
    }
}

impl FeatureProvider for MapFeatureProvider {
    fn provide(&self, id: &ArtifactId) -> Option<Feature> {
        self.features.get(id).cloned()
    }
}

/// Answers from a fixed feature list first, then from a fallback provider
pub(crate) struct ListFeatureProvider<'a> {
    pub features: &'a [Feature],
    pub fallback: &'a dyn FeatureProvider,
}

impl FeatureProvider for ListFeatureProvider<'_> {
    fn provide(&self, id: &ArtifactId) -> Option<Feature> {
        self.features
            .iter()
            .find(|f| &f.id == id)
            .cloned()
            .or_else(|| self.fallback.provide(id))
    }
}

/// Tie-break when two merge sources contribute the same coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactMerge {
    /// The later merge source wins
    #[default]
    Latest,
    /// The higher version wins regardless of merge order
    Highest,
}

/// Everything one assembly pass needs
///
/// # Example
///
/// ```
/// use featmodel_core::assembly::{BuilderContext, MapFeatureProvider};
/// use featmodel_core::handlers::{AppendTextHandler, ExtensionHandlerRegistry};
///
/// let provider = MapFeatureProvider::new();
/// let context = BuilderContext::new(&provider)
///     .with_handlers(ExtensionHandlerRegistry::new().with_handler(AppendTextHandler::new()));
/// assert_eq!(context.handlers().len(), 1);
/// ```
#[derive(Clone)]
pub struct BuilderContext<'a> {
    provider: &'a dyn FeatureProvider,
    handlers: ExtensionHandlerRegistry,
    artifact_merge: ArtifactMerge,
    request_context: RequestContext,
}

impl<'a> BuilderContext<'a> {
    pub fn new(provider: &'a dyn FeatureProvider) -> Self {
        Self {
            provider,
            handlers: ExtensionHandlerRegistry::new(),
            artifact_merge: ArtifactMerge::Latest,
            request_context: RequestContext::new(),
        }
    }

    pub fn with_handlers(mut self, handlers: ExtensionHandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Tie-break used when merging includes into a feature
    pub fn with_artifact_merge(mut self, artifact_merge: ArtifactMerge) -> Self {
        self.artifact_merge = artifact_merge;
        self
    }

    pub fn with_request_context(mut self, request_context: RequestContext) -> Self {
        self.request_context = request_context;
        self
    }

    /// Same settings, another provider
    pub fn with_provider<'b>(&self, provider: &'b dyn FeatureProvider) -> BuilderContext<'b> {
        BuilderContext {
            provider,
            handlers: self.handlers.clone(),
            artifact_merge: self.artifact_merge,
            request_context: self.request_context.clone(),
        }
    }

    pub fn provider(&self) -> &'a dyn FeatureProvider {
        self.provider
    }

    pub fn handlers(&self) -> &ExtensionHandlerRegistry {
        &self.handlers
    }

    pub fn artifact_merge(&self) -> ArtifactMerge {
        self.artifact_merge
    }

    pub fn request_context(&self) -> &RequestContext {
        &self.request_context
    }
}

impl std::fmt::Debug for BuilderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderContext")
            .field("handlers", &self.handlers)
            .field("artifact_merge", &self.artifact_merge)
            .field("request_context", &self.request_context)
            .finish_non_exhaustive()
    }
}
