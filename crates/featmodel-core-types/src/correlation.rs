//! Correlation identifiers for a single composition request
//!
//! A diff or assembly pass may recurse through many descriptors. The ids
//! below tie every log event and every error of one pass together: the
//! request id names the pass, the optional trace id names whatever
//! triggered it upstream (a release, a deployment).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh, time-ordered id (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Adopt an id minted elsewhere
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id! {
    /// One diff or assembly call, including everything it recurses into
    RequestId
}

correlation_id! {
    /// Upstream trigger shared by several requests
    TraceId
}

/// Correlation carried through one composition pass
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Trace id as a log field value; absent ids are not recorded
    pub fn trace_id_str(&self) -> Option<&str> {
        self.trace_id.as_ref().map(TraceId::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(RequestId::new(), RequestId::new());
        assert_ne!(TraceId::new(), TraceId::new());
    }

    #[test]
    fn test_adopted_id_displays_verbatim() {
        let id = RequestId::from_string("release-42".to_string());
        assert_eq!(id.to_string(), "release-42");
        assert_eq!(id.as_str(), "release-42");
    }

    #[test]
    fn test_trace_id_is_optional() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.trace_id_str(), None);

        let ctx = ctx.with_trace_id(TraceId::from_string("deploy-7".to_string()));
        assert_eq!(ctx.trace_id_str(), Some("deploy-7"));
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = TraceId::from_string("deploy-7".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"deploy-7\"");
        let back: TraceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
