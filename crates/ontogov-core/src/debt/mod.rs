//! Semantic debt analyzer.
//!
//! Compares N labelled snapshots and reports every shared public name
//! (entity, `Entity.Property`, relationship, rule) whose definitions
//! disagree, with a configurable severity per conflict type and a flat
//! reconciliation-cost estimate.

pub mod analyzer;
pub mod model;

pub use analyzer::{analyze_debt, analyze_debt_with, normalize_expression};
pub use model::{DebtConflict, DebtConflictType, DebtPolicy, DebtReport, Recommendation};
