//! Core types shared across the JobPostScore client crates
//!
//! This crate provides the small vocabulary that the error facility, the
//! logging facility and the guest cache all agree on:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Sensitive data**: Sensitive<T> marker for access tokens
//! - **Schema constants**: Canonical log field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RequestContext, RequestId, TraceId};
pub use sensitive::Sensitive;
