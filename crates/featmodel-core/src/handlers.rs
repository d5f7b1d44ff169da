//! Extension handler trait and registry
//!
//! An `ExtensionHandler` customizes how named extensions are merged during
//! assembly and compared during diffing. Handlers are registered explicitly
//! in an `ExtensionHandlerRegistry` that is handed to the engine; the first
//! handler claiming a name and producing a result wins, otherwise the
//! default behavior applies.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::diff::model::Delta;
use crate::errors::{FeatureError, Result};
use crate::model::{Extension, ExtensionPayload, Feature};

/// Strategy for one or more named extensions
///
/// All hooks have pass-through defaults, so a handler implements only what
/// it customizes.
pub trait ExtensionHandler: Send + Sync {
    /// Check if this handler customizes the named extension
    fn handles(&self, name: &str) -> bool;

    /// Merge `incoming` onto `accumulated`
    ///
    /// # Returns
    /// * `Ok(Some(ext))` - the merged extension replaces `accumulated`
    /// * `Ok(None)` - not handled, fall through to the default merge
    ///
    /// # Errors
    ///
    /// Any error aborts the assembly.
    fn merge_extension(
        &self,
        _name: &str,
        _accumulated: &Extension,
        _incoming: &Extension,
    ) -> Result<Option<Extension>> {
        Ok(None)
    }

    /// Compare two versions of the named extension
    ///
    /// `Ok(None)` falls through to the default comparison.
    ///
    /// # Errors
    ///
    /// Any error aborts the diff.
    fn diff_extension(
        &self,
        _name: &str,
        _previous: &Extension,
        _current: &Extension,
    ) -> Result<Option<Delta>> {
        Ok(None)
    }

    /// Called after every feature merge, once per extension of the target
    ///
    /// # Errors
    ///
    /// Any error aborts the assembly.
    fn post_process(&self, _feature: &mut Feature, _name: &str) -> Result<()> {
        Ok(())
    }
}

/// Ordered list of extension handlers
#[derive(Clone, Default)]
pub struct ExtensionHandlerRegistry {
    handlers: Vec<Arc<dyn ExtensionHandler>>,
}

impl ExtensionHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn with_handler(mut self, handler: impl ExtensionHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn register(&mut self, handler: Arc<dyn ExtensionHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Merge through the first handler that claims the name and handles it
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn merge(
        &self,
        name: &str,
        accumulated: &Extension,
        incoming: &Extension,
    ) -> Result<Option<Extension>> {
        for handler in self.handlers.iter().filter(|h| h.handles(name)) {
            if let Some(merged) = handler.merge_extension(name, accumulated, incoming)? {
                return Ok(Some(merged));
            }
        }
        Ok(None)
    }

    /// Diff through the first handler that claims the name and handles it
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn diff(
        &self,
        name: &str,
        previous: &Extension,
        current: &Extension,
    ) -> Result<Option<Delta>> {
        for handler in self.handlers.iter().filter(|h| h.handles(name)) {
            if let Some(delta) = handler.diff_extension(name, previous, current)? {
                return Ok(Some(delta));
            }
        }
        Ok(None)
    }

    /// Run every handler's post-processing for every extension of `feature`
    ///
    /// # Errors
    ///
    /// Propagates the first handler error.
    pub fn post_process(&self, feature: &mut Feature) -> Result<()> {
        if self.handlers.is_empty() {
            return Ok(());
        }
        for name in feature.extensions.names() {
            for handler in &self.handlers {
                handler.post_process(feature, &name)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ExtensionHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionHandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Names a handler applies to; empty means every name
#[derive(Debug, Clone, Default)]
struct NameSet(Vec<String>);

impl NameSet {
    fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameSet(names.into_iter().map(Into::into).collect())
    }

    fn contains(&self, name: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|n| n == name)
    }
}

/// Concatenates text extensions with a newline
#[derive(Debug, Clone, Default)]
pub struct AppendTextHandler {
    names: NameSet,
}

impl AppendTextHandler {
    /// Handle every text extension
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle only the given extension names
    pub fn for_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: NameSet::from_names(names),
        }
    }
}

impl ExtensionHandler for AppendTextHandler {
    fn handles(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn merge_extension(
        &self,
        _name: &str,
        accumulated: &Extension,
        incoming: &Extension,
    ) -> Result<Option<Extension>> {
        match (&accumulated.payload, &incoming.payload) {
            (ExtensionPayload::Text(left), ExtensionPayload::Text(right)) => {
                let mut merged = accumulated.clone();
                merged.payload = ExtensionPayload::Text(format!("{}\n{}", left, right));
                Ok(Some(merged))
            }
            _ => Ok(None),
        }
    }
}

/// Deep-merges structured-document extensions
///
/// Arrays are appended, objects merged key-wise, and on a type change the
/// incoming value wins.
#[derive(Debug, Clone, Default)]
pub struct JsonMergeHandler {
    names: NameSet,
}

impl JsonMergeHandler {
    /// Handle every structured-document extension
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle only the given extension names
    pub fn for_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: NameSet::from_names(names),
        }
    }
}

impl ExtensionHandler for JsonMergeHandler {
    fn handles(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn merge_extension(
        &self,
        name: &str,
        accumulated: &Extension,
        incoming: &Extension,
    ) -> Result<Option<Extension>> {
        match (&accumulated.payload, &incoming.payload) {
            (ExtensionPayload::Json(left), ExtensionPayload::Json(right)) => {
                let mut target = parse_document(name, left)?;
                let source = parse_document(name, right)?;
                merge_json(&mut target, source);

                let mut merged = accumulated.clone();
                merged.payload = ExtensionPayload::Json(serde_json::to_string(&target)?);
                Ok(Some(merged))
            }
            _ => Ok(None),
        }
    }
}

/// Parse a structured-document payload, naming the extension on failure
pub(crate) fn parse_document(name: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| FeatureError::MalformedExtension {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn merge_json(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Array(left), Value::Array(right)) => left.extend(right),
        (Value::Object(left), Value::Object(right)) => {
            for (key, value) in right {
                match left.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        left.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArtifactId, ExtensionKind};
    use serde_json::json;

    #[test]
    fn test_append_text_handler() {
        let handler = AppendTextHandler::for_names(["repoinit"]);
        assert!(handler.handles("repoinit"));
        assert!(!handler.handles("other"));

        let a = Extension::text("repoinit", ExtensionKind::Mandatory, "create path /a");
        let b = Extension::text("repoinit", ExtensionKind::Mandatory, "create path /b");
        let merged = handler.merge_extension("repoinit", &a, &b).unwrap().unwrap();
        assert_eq!(
            merged.payload,
            ExtensionPayload::Text("create path /a\ncreate path /b".to_string())
        );
    }

    #[test]
    fn test_json_merge_handler_deep_merges() {
        let handler = JsonMergeHandler::new();
        let a = Extension::json(
            "api-regions",
            ExtensionKind::Optional,
            json!({"list": [1], "obj": {"x": 1}, "scalar": "a"}).to_string(),
        );
        let b = Extension::json(
            "api-regions",
            ExtensionKind::Optional,
            json!({"list": [2], "obj": {"y": 2}, "scalar": 3}).to_string(),
        );
        let merged = handler.merge_extension("api-regions", &a, &b).unwrap().unwrap();
        let ExtensionPayload::Json(text) = merged.payload else {
            panic!("expected json payload");
        };
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"list": [1, 2], "obj": {"x": 1, "y": 2}, "scalar": 3})
        );
    }

    #[test]
    fn test_json_merge_handler_rejects_malformed() {
        let handler = JsonMergeHandler::new();
        let a = Extension::json("api-regions", ExtensionKind::Optional, "[");
        let b = Extension::json("api-regions", ExtensionKind::Optional, "[]");
        assert!(matches!(
            handler.merge_extension("api-regions", &a, &b),
            Err(FeatureError::MalformedExtension { .. })
        ));
    }

    struct Counting;

    impl ExtensionHandler for Counting {
        fn handles(&self, _name: &str) -> bool {
            true
        }

        fn post_process(&self, feature: &mut Feature, name: &str) -> Result<()> {
            feature
                .properties
                .insert(format!("seen.{}", name), "true".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_registry_falls_through_and_post_processes() {
        let registry = ExtensionHandlerRegistry::new()
            .with_handler(Counting)
            .with_handler(AppendTextHandler::new());

        let a = Extension::text("notes", ExtensionKind::Optional, "a");
        let b = Extension::text("notes", ExtensionKind::Optional, "b");
        let merged = registry.merge("notes", &a, &b).unwrap().unwrap();
        assert_eq!(merged.payload, ExtensionPayload::Text("a\nb".to_string()));

        let mut feature = Feature::new(ArtifactId::parse("g:f:1.0").unwrap());
        feature.extensions.add(a);
        registry.post_process(&mut feature).unwrap();
        assert_eq!(feature.properties.get("seen.notes"), Some(&"true".to_string()));
    }
}
