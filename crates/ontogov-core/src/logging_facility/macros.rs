//! Operation bracketing macros
//!
//! Each public governance operation emits one `start` event and then exactly
//! one `end` or `end_error` event, all carrying `component`, `op` and `event`.
//! Extra `key = value` fields pass straight through to `tracing`.

/// Emit the `start` event of an operation
///
/// ```
/// # use ontogov_core::log_op_start;
/// log_op_start!("diff");
/// log_op_start!("diff", old_snapshot = "sales_v1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = ontogov_core_types::schema::EVENT_START,
            $($($field)+)?
        )
    };
}

/// Emit the `end` event of an operation; `duration_ms` is mandatory
///
/// ```
/// # use ontogov_core::log_op_end;
/// log_op_end!("merge", duration_ms = 3);
/// log_op_end!("merge", duration_ms = 3, conflict_count = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = ontogov_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)+)?
        )
    };
}

/// Emit the `end_error` event at ERROR level
///
/// `$err` is anything convertible into `ExError`; its kind, stable code and
/// identity path (when present) are attached.
///
/// ```
/// # use ontogov_core::log_op_error;
/// # use ontogov_core::errors::{ExError, ExErrorKind};
/// let err = ExError::new(ExErrorKind::DuplicateIdentity).with_path("Customer");
/// log_op_error!("diff", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = ontogov_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_path = ex_err.path(),
            $($($field)+)?
        )
    }};
}
