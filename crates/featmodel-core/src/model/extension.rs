use std::fmt;

use serde::{Deserialize, Serialize};

use super::module::Modules;

/// How strictly a runtime must honour an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    Mandatory,
    #[default]
    Optional,
    Transient,
}

/// Payload shape of an extension, derived from its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionType {
    Text,
    Json,
    Modules,
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExtensionType::Text => "text",
            ExtensionType::Json => "json",
            ExtensionType::Modules => "modules",
        };
        f.write_str(label)
    }
}

/// Exactly one payload per extension
///
/// `Json` keeps the raw document text; it is parsed only when compared or
/// merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ExtensionPayload {
    Text(String),
    Json(String),
    Modules(Modules),
}

/// A named, typed extension section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(default)]
    pub kind: ExtensionKind,
    pub payload: ExtensionPayload,
}

impl Extension {
    pub fn new(name: impl Into<String>, kind: ExtensionKind, payload: ExtensionPayload) -> Self {
        Self {
            name: name.into(),
            kind,
            payload,
        }
    }

    pub fn text(name: impl Into<String>, kind: ExtensionKind, text: impl Into<String>) -> Self {
        Self::new(name, kind, ExtensionPayload::Text(text.into()))
    }

    pub fn json(name: impl Into<String>, kind: ExtensionKind, json: impl Into<String>) -> Self {
        Self::new(name, kind, ExtensionPayload::Json(json.into()))
    }

    pub fn modules(name: impl Into<String>, kind: ExtensionKind, modules: Modules) -> Self {
        Self::new(name, kind, ExtensionPayload::Modules(modules))
    }

    pub fn extension_type(&self) -> ExtensionType {
        match self.payload {
            ExtensionPayload::Text(_) => ExtensionType::Text,
            ExtensionPayload::Json(_) => ExtensionType::Json,
            ExtensionPayload::Modules(_) => ExtensionType::Modules,
        }
    }

    /// The module list, if this is a module-list extension
    pub fn module_list(&self) -> Option<&Modules> {
        match &self.payload {
            ExtensionPayload::Modules(modules) => Some(modules),
            _ => None,
        }
    }

    pub fn module_list_mut(&mut self) -> Option<&mut Modules> {
        match &mut self.payload {
            ExtensionPayload::Modules(modules) => Some(modules),
            _ => None,
        }
    }
}

/// Ordered extension container keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions {
    items: Vec<Extension>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, extension: Extension) {
        self.items.push(extension);
    }

    pub fn get(&self, name: &str) -> Option<&Extension> {
        self.items.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Extension> {
        self.items.iter_mut().find(|e| e.name == name)
    }

    /// Remove by name; true if it was present
    pub fn remove(&mut self, name: &str) -> bool {
        match self.items.iter().position(|e| e.name == name) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|e| e.name.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extension> {
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
}

impl FromIterator<Extension> for Extensions {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Extensions {
    type Item = &'a Extension;
    type IntoIter = std::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
