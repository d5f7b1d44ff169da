use featmodel_core_types::{RequestContext, RequestId, TraceId};
use thiserror::Error;

/// Result type alias using FeatureError
pub type Result<T> = std::result::Result<T, FeatureError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (release tooling,
/// deployment pipelines) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    InvalidArtifactId,
    InvalidVersion,
    InvalidSectionFilter,

    // Assembly
    CyclicInclusion,
    UnresolvedInclude,
    ExtensionTypeMismatch,
    HandlerFailed,

    // Diff
    /// A structured-document extension could not be parsed
    MalformedExtension,

    // Integration
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidArtifactId => "ERR_INVALID_ARTIFACT_ID",
            ExErrorKind::InvalidVersion => "ERR_INVALID_VERSION",
            ExErrorKind::InvalidSectionFilter => "ERR_INVALID_SECTION_FILTER",
            ExErrorKind::CyclicInclusion => "ERR_CYCLIC_INCLUSION",
            ExErrorKind::UnresolvedInclude => "ERR_UNRESOLVED_INCLUDE",
            ExErrorKind::ExtensionTypeMismatch => "ERR_EXTENSION_TYPE_MISMATCH",
            ExErrorKind::HandlerFailed => "ERR_HANDLER_FAILED",
            ExErrorKind::MalformedExtension => "ERR_MALFORMED_EXTENSION",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus optional context
/// (operation, feature id, inclusion path, correlation ids).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
    path: Option<Vec<String>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
            path: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity (feature / extension) context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add both correlation ids of a request
    pub fn with_request_context(mut self, context: &RequestContext) -> Self {
        self.request_id = Some(context.request_id.clone());
        self.trace_id = context.trace_id.clone();
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Add the inclusion path (used for CyclicInclusion)
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = Some(path);
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Get the inclusion path, if any (populated on CyclicInclusion)
    pub fn path(&self) -> Option<&[String]> {
        self.path.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.join(" -> "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for composition operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    // ===== Assembly Errors =====
    /// The inclusion path visits the same feature twice
    #[error("Recursive inclusion of {id} via {}", path.join(" -> "))]
    CyclicInclusion { id: String, path: Vec<String> },

    /// The resolver could not provide an included feature
    #[error("Unable to find included feature {id}")]
    UnresolvedInclude { id: String },

    /// Two extensions with the same name carry different payload types
    #[error("Found different types for extension {name}: {left} and {right}")]
    ExtensionTypeMismatch {
        name: String,
        left: String,
        right: String,
    },

    /// An extension handler refused to merge or diff an extension
    #[error("Extension handler failed for {name}: {reason}")]
    HandlerFailed { name: String, reason: String },

    // ===== Diff Errors =====
    /// A structured-document extension payload is not valid JSON
    #[error("Malformed extension {name}: {reason}")]
    MalformedExtension { name: String, reason: String },

    /// Both an include and an exclude filter were supplied
    #[error("Invalid section filter: {reason}")]
    InvalidSectionFilter { reason: String },

    // ===== Model Errors =====
    /// Artifact id string cannot be parsed
    #[error("Invalid artifact id '{value}': {reason}")]
    InvalidArtifactId { value: String, reason: String },

    /// Version string has a non-numeric major/minor/micro component
    #[error("Invalid version: {value}")]
    InvalidVersion { value: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from FeatureError to ExError
impl From<FeatureError> for ExError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::CyclicInclusion { id, path } => {
                ExError::new(ExErrorKind::CyclicInclusion)
                    .with_entity_id(id)
                    .with_path(path)
                    .with_message("Recursive inclusion detected")
            }

            FeatureError::UnresolvedInclude { id } => ExError::new(ExErrorKind::UnresolvedInclude)
                .with_entity_id(id)
                .with_message("Unable to find included feature"),

            FeatureError::ExtensionTypeMismatch { name, left, right } => {
                ExError::new(ExErrorKind::ExtensionTypeMismatch)
                    .with_entity_id(name)
                    .with_message(format!("Found different types: {} and {}", left, right))
            }

            FeatureError::HandlerFailed { name, reason } => {
                ExError::new(ExErrorKind::HandlerFailed)
                    .with_entity_id(name)
                    .with_message(reason)
            }

            FeatureError::MalformedExtension { name, reason } => {
                ExError::new(ExErrorKind::MalformedExtension)
                    .with_entity_id(name)
                    .with_message(reason)
            }

            FeatureError::InvalidSectionFilter { reason } => {
                ExError::new(ExErrorKind::InvalidSectionFilter).with_message(reason)
            }

            FeatureError::InvalidArtifactId { value, reason } => {
                ExError::new(ExErrorKind::InvalidArtifactId)
                    .with_entity_id(value)
                    .with_message(reason)
            }

            FeatureError::InvalidVersion { value } => ExError::new(ExErrorKind::InvalidVersion)
                .with_entity_id(value)
                .with_message("Version is not a valid semantic version"),

            FeatureError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            FeatureError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to FeatureError
impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::Serialization {
            message: err.to_string(),
        }
    }
}
