use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::ConfigValue;

/// Property linking a configuration to the module it belongs to
///
/// Holds the module's Maven id. Removing that module through an include
/// removal also removes the configuration.
pub const MODULE_PROPERTY: &str = "module";

/// Separator between factory pid and instance name
pub const FACTORY_SEPARATOR: char = '~';

/// A configuration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// `pid`, or `factoryPid~name` for factory instances
    pub pid: String,

    #[serde(default)]
    pub properties: BTreeMap<String, ConfigValue>,
}

impl Configuration {
    pub fn new(pid: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Factory configuration instance `factory_pid~name`
    pub fn new_factory(factory_pid: &str, name: &str) -> Self {
        Self::new(format!("{}{}{}", factory_pid, FACTORY_SEPARATOR, name))
    }

    /// Builder-style property setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_factory(&self) -> bool {
        self.pid.contains(FACTORY_SEPARATOR)
    }

    /// Factory pid, if this is a factory instance
    pub fn factory_pid(&self) -> Option<&str> {
        self.pid.split_once(FACTORY_SEPARATOR).map(|(f, _)| f)
    }

    /// Instance name, if this is a factory instance
    pub fn name(&self) -> Option<&str> {
        self.pid.split_once(FACTORY_SEPARATOR).map(|(_, n)| n)
    }

    /// Module id string from the `module` property, if any
    pub fn module_ref(&self) -> Option<&str> {
        self.properties.get(MODULE_PROPERTY).and_then(ConfigValue::as_str)
    }
}

/// Ordered configuration container keyed by pid
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configurations {
    items: Vec<Configuration>,
}

impl Configurations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, configuration: Configuration) {
        self.items.push(configuration);
    }

    pub fn get(&self, pid: &str) -> Option<&Configuration> {
        self.items.iter().find(|c| c.pid == pid)
    }

    pub fn get_mut(&mut self, pid: &str) -> Option<&mut Configuration> {
        self.items.iter_mut().find(|c| c.pid == pid)
    }

    pub fn get_factory(&self, factory_pid: &str, name: &str) -> Option<&Configuration> {
        self.items
            .iter()
            .find(|c| c.factory_pid() == Some(factory_pid) && c.name() == Some(name))
    }

    /// Remove by pid; true if it was present
    pub fn remove(&mut self, pid: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|c| c.pid != pid);
        before != self.items.len()
    }

    /// Keep only configurations matching the predicate
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Configuration) -> bool,
    {
        self.items.retain(keep);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Configuration> {
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

impl FromIterator<Configuration> for Configurations {
    fn from_iter<I: IntoIterator<Item = Configuration>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Configurations {
    type Item = &'a Configuration;
    type IntoIter = std::slice::Iter<'a, Configuration>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
