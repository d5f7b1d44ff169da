//! Feature diff output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! Added and removed keys are kept in `BTreeSet`s so serialized output is
//! deterministic.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{FeatureError, Result};
use crate::model::{ArtifactId, ConfigValue, Feature};

/// Typed change record for one section (or one record inside a section).
///
/// A delta is empty iff all four collections are empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Delta {
    /// Section id, pid, extension name or module coordinate
    pub id: String,
    /// Keys present in current but not in previous
    pub added: BTreeSet<String>,
    /// Keys present in previous but not in current
    pub removed: BTreeSet<String>,
    /// Nested deltas for compound records, attached only when non-empty
    pub children: Vec<Delta>,
    /// Keys present on both sides with different values
    pub updated_items: Vec<UpdatedItem>,
}

impl Delta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.children.is_empty()
            && self.updated_items.is_empty()
    }

    /// Attach a nested delta unless it is empty
    pub fn attach(&mut self, child: Delta) {
        if !child.is_empty() {
            self.children.push(child);
        }
    }

    /// Find a nested delta by id
    pub fn child(&self, id: &str) -> Option<&Delta> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Find an updated item by id
    pub fn updated(&self, id: &str) -> Option<&UpdatedItem> {
        self.updated_items.iter().find(|u| u.id == id)
    }

    /// Total number of change entries, nested deltas included
    pub fn change_count(&self) -> usize {
        self.added.len()
            + self.removed.len()
            + self.updated_items.len()
            + self.children.iter().map(Delta::change_count).sum::<usize>()
    }
}

/// One key whose value differs between previous and current
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdatedItem {
    pub id: String,
    pub previous: ConfigValue,
    pub current: ConfigValue,
}

impl UpdatedItem {
    pub fn new(
        id: impl Into<String>,
        previous: impl Into<ConfigValue>,
        current: impl Into<ConfigValue>,
    ) -> Self {
        Self {
            id: id.into(),
            previous: previous.into(),
            current: current.into(),
        }
    }
}

/// Section of a feature the diff engine can compare
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionId {
    /// `bundles` (also accepted as `modules`)
    Modules,
    Configurations,
    Extensions,
    FrameworkProperties,
    /// A single extension by name
    Extension(String),
}

impl SectionId {
    pub const BUNDLES: &'static str = "bundles";
    pub const MODULES: &'static str = "modules";
    pub const CONFIGURATIONS: &'static str = "configurations";
    pub const EXTENSIONS: &'static str = "extensions";
    pub const FRAMEWORK_PROPERTIES: &'static str = "framework-properties";

    pub fn parse(value: &str) -> Self {
        match value {
            Self::BUNDLES | Self::MODULES => SectionId::Modules,
            Self::CONFIGURATIONS => SectionId::Configurations,
            Self::EXTENSIONS => SectionId::Extensions,
            Self::FRAMEWORK_PROPERTIES => SectionId::FrameworkProperties,
            other => SectionId::Extension(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SectionId::Modules => Self::BUNDLES,
            SectionId::Configurations => Self::CONFIGURATIONS,
            SectionId::Extensions => Self::EXTENSIONS,
            SectionId::FrameworkProperties => Self::FRAMEWORK_PROPERTIES,
            SectionId::Extension(name) => name,
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        SectionId::parse(value)
    }
}

impl Serialize for SectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SectionId::parse(&s))
    }
}

/// Which sections a diff processes
///
/// An empty set processes nothing, in either mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionFilter {
    Include(BTreeSet<SectionId>),
    Exclude(BTreeSet<SectionId>),
}

impl SectionFilter {
    /// Include filter from section id strings
    pub fn include<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SectionFilter::Include(sections.into_iter().map(|s| SectionId::parse(s.as_ref())).collect())
    }

    /// Exclude filter from section id strings
    pub fn exclude<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SectionFilter::Exclude(sections.into_iter().map(|s| SectionId::parse(s.as_ref())).collect())
    }

    /// Include filter naming every built-in section
    pub fn all() -> Self {
        SectionFilter::Include(
            [
                SectionId::Modules,
                SectionId::Configurations,
                SectionId::Extensions,
                SectionId::FrameworkProperties,
            ]
            .into_iter()
            .collect(),
        )
    }

    /// Build a filter from separate include and exclude lists
    ///
    /// Two empty lists yield an empty include filter.
    ///
    /// # Errors
    ///
    /// `InvalidSectionFilter` if both lists are non-empty.
    pub fn from_lists(include: &[&str], exclude: &[&str]) -> Result<Self> {
        match (include.is_empty(), exclude.is_empty()) {
            (false, false) => Err(FeatureError::InvalidSectionFilter {
                reason: "include and exclude lists are mutually exclusive".to_string(),
            }),
            (false, true) => Ok(Self::include(include)),
            (true, false) => Ok(Self::exclude(exclude)),
            (true, true) => Ok(SectionFilter::Include(BTreeSet::new())),
        }
    }

    /// True if the given section is processed
    pub fn is_active(&self, section: &SectionId) -> bool {
        match self {
            SectionFilter::Include(set) => set.contains(section),
            SectionFilter::Exclude(set) => !set.is_empty() && !set.contains(section),
        }
    }

    /// True if the named extension is compared
    pub fn is_extension_active(&self, name: &str) -> bool {
        let section = SectionId::Extension(name.to_string());
        match self {
            SectionFilter::Include(set) => {
                set.contains(&SectionId::Extensions) || set.contains(&section)
            }
            SectionFilter::Exclude(_) => {
                self.is_active(&SectionId::Extensions) && self.is_active(&section)
            }
        }
    }

    /// True if the extension comparator has anything to do
    pub(crate) fn any_extension_active(&self) -> bool {
        match self {
            SectionFilter::Include(set) => set.iter().any(|s| {
                matches!(s, SectionId::Extensions | SectionId::Extension(_))
            }),
            SectionFilter::Exclude(_) => self.is_active(&SectionId::Extensions),
        }
    }
}

/// The result of diffing two features
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureDiff {
    pub previous: ArtifactId,
    pub current: ArtifactId,
    /// One delta per processed section that changed, in section order
    pub deltas: Vec<Delta>,
    /// Upgrade descriptor: `current` id, prototype of `previous` carrying
    /// the removals, sections carrying additions and replacements
    pub descriptor: Feature,
}

impl FeatureDiff {
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Delta of one section, if it changed
    pub fn section(&self, id: &str) -> Option<&Delta> {
        self.deltas.iter().find(|d| d.id == id)
    }
}
