use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{FeatureError, Result};

/// Default artifact type when none (or `bundle`) is given
pub const DEFAULT_TYPE: &str = "jar";

/// Semantic version derived from an artifact version string
///
/// `major.minor.micro` are numeric; everything else ends up in the
/// qualifier. `1.0.0-SNAPSHOT`, `1.0.0.SNAPSHOT` and `1_0_0` are all
/// understood.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
    pub qualifier: String,
}

impl Version {
    /// Parse a version string
    ///
    /// # Errors
    ///
    /// `InvalidVersion` if one of the first three components is not numeric.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || FeatureError::InvalidVersion {
            value: value.to_string(),
        };
        if value.is_empty() {
            return Err(invalid());
        }

        // A '-' ends the numeric part: 1.0.0-SNAPSHOT, 1.0-rc1
        let (base, dash_qualifier) = match value.split_once('-') {
            Some((base, qualifier)) => (base, Some(qualifier)),
            None => (value, None),
        };

        let mut parts: Vec<&str> = base.split('.').collect();
        if parts.len() < 4 && dash_qualifier.is_none() {
            // odd versions like 1_2_3
            parts = parts.iter().flat_map(|p| p.split('_')).collect();
        }

        let numeric: Vec<u64> = parts
            .iter()
            .take(3)
            .map(|p| p.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<_>>()?;

        let mut qualifier_parts: Vec<&str> = parts.iter().skip(3).copied().collect();
        if let Some(q) = dash_qualifier {
            qualifier_parts.push(q);
        }
        let qualifier = qualifier_parts
            .join(".")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        Ok(Self {
            major: numeric[0],
            minor: numeric.get(1).copied().unwrap_or(0),
            micro: numeric.get(2).copied().unwrap_or(0),
            qualifier,
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

/// Identity ignoring the version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub artifact_type: String,
    pub classifier: Option<String>,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if self.classifier.is_some() || self.artifact_type != DEFAULT_TYPE {
            write!(f, ":{}", self.artifact_type)?;
            if let Some(classifier) = &self.classifier {
                write!(f, ":{}", classifier)?;
            }
        }
        Ok(())
    }
}

/// Identity of a feature or module: group, name, version, classifier, type
///
/// Equality includes the version; use [`ArtifactId::is_same`] for the
/// coordinate-only comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId {
    group: String,
    artifact: String,
    version: String,
    classifier: Option<String>,
    artifact_type: String,
    parsed_version: Version,
}

impl ArtifactId {
    /// Create a new artifact id
    ///
    /// An empty classifier is treated as none; an empty type or `bundle`
    /// becomes `jar`.
    ///
    /// # Errors
    ///
    /// - `InvalidArtifactId` if group or artifact is empty
    /// - `InvalidVersion` if the version cannot be parsed
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
        classifier: Option<&str>,
        artifact_type: Option<&str>,
    ) -> Result<Self> {
        let group = group.into();
        let artifact = artifact.into();
        let version = version.into();
        if group.is_empty() || artifact.is_empty() {
            return Err(FeatureError::InvalidArtifactId {
                value: format!("{}:{}:{}", group, artifact, version),
                reason: "group and artifact must not be empty".to_string(),
            });
        }
        let parsed_version = Version::parse(&version)?;
        let artifact_type = match artifact_type {
            None | Some("") | Some("bundle") => DEFAULT_TYPE.to_string(),
            Some(t) => t.to_string(),
        };
        let classifier = classifier.filter(|c| !c.is_empty()).map(str::to_string);
        Ok(Self {
            group,
            artifact,
            version,
            classifier,
            artifact_type,
            parsed_version,
        })
    }

    /// Parse either a Maven id or a `mvn:` URL
    ///
    /// # Errors
    ///
    /// `InvalidArtifactId` if the string is neither.
    pub fn parse(s: &str) -> Result<Self> {
        if s.starts_with("mvn:") || (!s.contains(':') && s.contains('/')) {
            Self::from_mvn_url(s)
        } else if s.contains(':') {
            Self::from_mvn_id(s)
        } else {
            Err(FeatureError::InvalidArtifactId {
                value: s.to_string(),
                reason: "unable to parse mvn coordinates/url".to_string(),
            })
        }
    }

    /// Parse `group:artifact[:type[:classifier]]:version`
    ///
    /// # Errors
    ///
    /// `InvalidArtifactId` if there are fewer than 3 or more than 5 parts.
    pub fn from_mvn_id(coordinates: &str) -> Result<Self> {
        let parts: Vec<&str> = coordinates.split(':').collect();
        if !(3..=5).contains(&parts.len()) {
            return Err(FeatureError::InvalidArtifactId {
                value: coordinates.to_string(),
                reason: "expected group:artifact[:type[:classifier]]:version".to_string(),
            });
        }
        let version = parts[parts.len() - 1];
        let artifact_type = if parts.len() > 3 { Some(parts[2]) } else { None };
        let classifier = if parts.len() > 4 { Some(parts[3]) } else { None };
        Self::new(parts[0], parts[1], version, classifier, artifact_type)
    }

    /// Parse `mvn:group/artifact/version[/type[/classifier]]`
    ///
    /// # Errors
    ///
    /// `InvalidArtifactId` on a repository URL (`!`) or missing parts.
    pub fn from_mvn_url(url: &str) -> Result<Self> {
        let invalid = |reason: &str| FeatureError::InvalidArtifactId {
            value: url.to_string(),
            reason: reason.to_string(),
        };
        if url.contains('!') {
            return Err(invalid("repository urls are not supported"));
        }
        let coordinates = url.strip_prefix("mvn:").unwrap_or(url);
        let parts: Vec<Option<&str>> = coordinates
            .split('/')
            .map(|p| if p.is_empty() { None } else { Some(p) })
            .collect();
        let part = |i: usize| parts.get(i).copied().flatten();
        match (part(0), part(1), part(2)) {
            (Some(group), Some(artifact), Some(version)) => {
                Self::new(group, artifact, version, part(4), part(3))
            }
            _ => Err(invalid("expected mvn:group/artifact/version")),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    /// The semantic version used for HIGHEST comparisons
    pub fn semantic_version(&self) -> &Version {
        &self.parsed_version
    }

    /// The version-free part of this id
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            artifact_type: self.artifact_type.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// True if both ids point to the same artifact, ignoring the version
    pub fn is_same(&self, other: &ArtifactId) -> bool {
        self.group == other.group
            && self.artifact == other.artifact
            && self.artifact_type == other.artifact_type
            && self.classifier == other.classifier
    }

    /// Copy of this id with another version
    ///
    /// # Errors
    ///
    /// `InvalidVersion` if the version cannot be parsed.
    pub fn with_version(&self, version: &str) -> Result<Self> {
        Self::new(
            self.group.clone(),
            self.artifact.clone(),
            version,
            self.classifier.as_deref(),
            Some(&self.artifact_type),
        )
    }

    /// Render as `group:artifact[:type[:classifier]]:version`
    pub fn to_mvn_id(&self) -> String {
        let mut id = format!("{}:{}", self.group, self.artifact);
        if self.classifier.is_some() || self.artifact_type != DEFAULT_TYPE {
            id.push(':');
            id.push_str(&self.artifact_type);
            if let Some(classifier) = &self.classifier {
                id.push(':');
                id.push_str(classifier);
            }
        }
        id.push(':');
        id.push_str(&self.version);
        id
    }

    /// Render as `mvn:group/artifact/version[/type[/classifier]]`
    pub fn to_mvn_url(&self) -> String {
        let mut url = format!("mvn:{}/{}/{}", self.group, self.artifact, self.version);
        if self.classifier.is_some() || self.artifact_type != DEFAULT_TYPE {
            url.push('/');
            url.push_str(&self.artifact_type);
            if let Some(classifier) = &self.classifier {
                url.push('/');
                url.push_str(classifier);
            }
        }
        url
    }
}

impl Ord for ArtifactId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group
            .cmp(&other.group)
            .then_with(|| self.artifact.cmp(&other.artifact))
            .then_with(|| self.artifact_type.cmp(&other.artifact_type))
            .then_with(|| self.classifier.cmp(&other.classifier))
            .then_with(|| self.parsed_version.cmp(&other.parsed_version))
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for ArtifactId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mvn_id())
    }
}

impl FromStr for ArtifactId {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ArtifactId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_mvn_id())
    }
}

impl<'de> Deserialize<'de> for ArtifactId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
