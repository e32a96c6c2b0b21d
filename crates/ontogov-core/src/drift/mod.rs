//! Schema drift detector.
//!
//! Checks physical bindings (semantic property → table column) against a
//! live [`TableCatalog`](crate::model::TableCatalog) and classifies each
//! discrepancy with a severity and a remediation. Callers gate automated
//! actions on [`DriftReport::ensure_no_critical`].

pub mod detector;
pub mod model;

pub use detector::{detect_drift, detect_drift_with, detect_snapshot_drift, DriftConfig};
pub use model::{DriftIssue, DriftKind, DriftReport, Remediation};
