//! Canonical logging macros

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use jps_core::log_op_start;
/// log_op_start!("guest_save");
/// log_op_start!("guest_save", report_id = "r-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use jps_core::log_op_end;
/// log_op_end!("guest_save", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log an operation error
///
/// # Example
///
/// ```
/// # use jps_core::log_op_error;
/// # use jps_core::errors::JpsError;
/// let err = JpsError::ReportNotFound { report_id: "r-1".to_string() };
/// log_op_error!("guest_open", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Log a failure that was swallowed and degraded to a neutral value
///
/// # Example
///
/// ```
/// # use jps_core::log_op_degraded;
/// # use jps_core::errors::{ExError, ExErrorKind};
/// let err = ExError::new(ExErrorKind::QuotaExceeded);
/// log_op_degraded!("guest_save", &err);
/// ```
#[macro_export]
macro_rules! log_op_degraded {
    ($op:expr, $err:expr) => {{
        let ex_err: &$crate::errors::ExError = $err;
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_DEGRADED,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            error = %ex_err,
        );
    }};
    ($op:expr, $err:expr, $($field:tt)*) => {{
        let ex_err: &$crate::errors::ExError = $err;
        tracing::warn!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_DEGRADED,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            error = %ex_err,
            $($field)*
        );
    }};
}
