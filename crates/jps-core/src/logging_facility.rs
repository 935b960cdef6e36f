//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`,
//!   `log_op_error!`, `log_op_degraded!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use jps_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```
//!
//! `log_op_degraded!` is what the guest cache emits when it swallows a
//! storage failure on the UI path: the caller sees `false`/`None`, the log
//! sees the error code.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use jps_core_types::schema;
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
