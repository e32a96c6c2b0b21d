//! Audit hook for governance operations
//!
//! The core never records anything on its own. Callers that need an audit
//! trail inject an [`AuditSink`] and wrap core calls with [`audited`].

#![allow(clippy::result_large_err)]

use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use ontogov_core_types::{RequestContext, RequestId, TraceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Ok,
    Error { code: String, message: String },
}

/// One audited invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub request_id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,
    pub op: String,
    /// What the operation ran over, e.g. `sales_v1 -> sales_v2`
    pub subject: String,
    pub outcome: AuditOutcome,
    pub duration_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn is_ok(&self) -> bool {
        self.outcome == AuditOutcome::Ok
    }
}

/// Append-only audit destination
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Discards every record.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _: AuditRecord) {}
}

/// Keeps records in memory, in arrival order
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// Run `f`, record its outcome, and stamp errors with the request's correlation ids
///
/// # Errors
///
/// Whatever `f` returns, with `op`, request id and trace id attached.
pub fn audited<T, F>(
    sink: &dyn AuditSink,
    ctx: &RequestContext,
    op: &str,
    subject: &str,
    f: F,
) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let start = Instant::now();
    let result = f().map_err(|e| {
        let e = e.with_op(op).with_request_id(ctx.request_id.clone());
        match &ctx.trace_id {
            Some(trace_id) => e.with_trace_id(trace_id.clone()),
            None => e,
        }
    });

    let outcome = match &result {
        Ok(_) => AuditOutcome::Ok,
        Err(e) => AuditOutcome::Error {
            code: e.code().to_string(),
            message: e.message().to_string(),
        },
    };
    sink.record(AuditRecord {
        request_id: ctx.request_id.clone(),
        trace_id: ctx.trace_id.clone(),
        op: op.to_string(),
        subject: subject.to_string(),
        outcome,
        duration_ms: start.elapsed().as_millis() as u64,
        recorded_at: Utc::now(),
    });

    result
}
