//! Correlation identifiers
//!
//! Sign-in followed by report migration touches the guest cache and the remote
//! account store in one flow. A [`RequestContext`] ties the log lines and
//! errors of that flow together.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh time-ordered id (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
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

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// One user-initiated flow, e.g. a migration attempt
    RequestId
);

correlation_id!(
    /// Trace propagated from the caller (an API response header, a UI span)
    TraceId
);

/// Ids carried through a flow
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traced(trace_id: impl Into<TraceId>) -> Self {
        Self {
            request_id: RequestId::new(),
            trace_id: Some(trace_id.into()),
        }
    }

    /// Trace id for log fields; empty when untraced
    pub fn trace_str(&self) -> &str {
        self.trace_id.as_ref().map_or("", TraceId::as_str)
    }
}
