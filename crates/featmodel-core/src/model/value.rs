//! Typed configuration property values and their structural equality.
//!
//! Configuration properties are a closed set of shapes: scalars, sequences
//! and string-keyed maps. Equality is decided by [`structural_eq`], which the
//! diff engine relies on to classify configuration properties as unchanged
//! or updated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{FeatureError, Result};

/// A configuration property value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

/// Deep equality over configuration values
///
/// - two sequences are equal when they have the same length and are
///   element-wise equal
/// - two maps are equal when their key sets match exactly and every value
///   is equal
/// - two scalars of the same variant compare by value
/// - values of different variants are never equal (`Long(1) != Double(1.0)`)
pub fn structural_eq(a: &ConfigValue, b: &ConfigValue) -> bool {
    match (a, b) {
        (ConfigValue::Sequence(left), ConfigValue::Sequence(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(l, r)| structural_eq(l, r))
        }
        (ConfigValue::Map(left), ConfigValue::Map(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, l)| match right.get(key) {
                    Some(r) => structural_eq(l, r),
                    None => false,
                })
        }
        (ConfigValue::Bool(l), ConfigValue::Bool(r)) => l == r,
        (ConfigValue::Long(l), ConfigValue::Long(r)) => l == r,
        (ConfigValue::Double(l), ConfigValue::Double(r)) => l.to_bits() == r.to_bits() || l == r,
        (ConfigValue::String(l), ConfigValue::String(r)) => l == r,
        _ => false,
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other)
    }
}

impl ConfigValue {
    /// The string content if this is a `String` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in summaries
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Long(_) => "long",
            ConfigValue::Double(_) => "double",
            ConfigValue::String(_) => "string",
            ConfigValue::Sequence(_) => "sequence",
            ConfigValue::Map(_) => "map",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Long(n) => write!(f, "{}", n),
            ConfigValue::Double(n) => write!(f, "{}", n),
            ConfigValue::String(s) => write!(f, "{:?}", s),
            ConfigValue::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ConfigValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Long(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Double(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::Sequence(value)
    }
}

impl TryFrom<serde_json::Value> for ConfigValue {
    type Error = FeatureError;

    /// JSON `null` has no configuration counterpart and is rejected.
    fn try_from(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value;
        Ok(match value {
            Value::Null => {
                return Err(FeatureError::Serialization {
                    message: "null is not a valid configuration value".to_string(),
                })
            }
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Long(i),
                None => ConfigValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ConfigValue::String(s),
            Value::Array(items) => ConfigValue::Sequence(
                items
                    .into_iter()
                    .map(ConfigValue::try_from)
                    .collect::<Result<_>>()?,
            ),
            Value::Object(entries) => ConfigValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, ConfigValue::try_from(v)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}
