//! Canonical schema constants for structured logging and audit records
//!
//! These constants keep field names identical across log events, audit
//! records and error reports.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Snapshot identifiers
pub const FIELD_SNAPSHOT: &str = "snapshot";
pub const FIELD_PATH: &str = "path";
pub const FIELD_STRATEGY: &str = "strategy";

// Report sizes
pub const FIELD_ENTRY_COUNT: &str = "entry_count";
pub const FIELD_CONFLICT_COUNT: &str = "conflict_count";
pub const FIELD_ISSUE_COUNT: &str = "issue_count";
pub const FIELD_CRITICAL_COUNT: &str = "critical_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";
pub const FIELD_ERR_PATH: &str = "err_path";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_DIFF: &str = "diff";
pub const OP_MERGE: &str = "merge";
pub const OP_DETECT_DRIFT: &str = "detect_drift";
pub const OP_ANALYZE_DEBT: &str = "analyze_debt";
