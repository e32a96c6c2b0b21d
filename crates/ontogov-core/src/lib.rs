//! Ontogov Core - ontology snapshot governance
//!
//! This crate compares, reconciles and audits versioned ontology snapshots
//! (entities, properties, relationships, rules) extracted from BI semantic
//! models, including:
//! - Structural diff with rename detection
//! - Three-way merge with explicit conflict objects and strategies
//! - Schema drift detection of physical bindings against a live catalog
//! - Semantic debt analysis across many snapshots
//! - Markdown renderers for changelogs and reports
//!
//! Every operation is a pure, synchronous function over immutable inputs.

pub mod audit;
pub mod config;
pub mod debt;
pub mod diff;
pub mod drift;
pub mod errors;
pub mod logging_facility;
pub mod matching;
pub mod merge;
pub mod model;
pub mod render;
pub mod severity;

// Re-export commonly used types
pub use audit::{audited, AuditRecord, AuditSink, MemoryAuditSink, NoopAuditSink};
pub use config::GovernanceConfig;
pub use debt::{analyze_debt, analyze_debt_with, DebtPolicy, DebtReport};
pub use diff::{diff, diff_with, DiffReport};
pub use drift::{detect_drift, detect_drift_with, detect_snapshot_drift, DriftConfig, DriftReport};
pub use errors::{ExError, ExErrorKind, GovernanceError, Result};
pub use matching::MatchConfig;
pub use merge::{merge, merge_with, MergeOutcome, MergeStrategy, Resolutions};
pub use model::{Binding, OntologySnapshot, TableCatalog};
pub use severity::Severity;
