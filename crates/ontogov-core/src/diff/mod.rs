//! Structural diff engine.
//!
//! Compares two ontology snapshots and produces an identity-keyed, ordered
//! change report with rename detection.
//!
//! ## Entry point
//!
//! ```
//! use ontogov_core::diff::diff;
//! use ontogov_core::model::{EntityDef, OntologySnapshot, PropertyDef};
//!
//! let old = OntologySnapshot::new("crm", "1")
//!     .with_entity(EntityDef::new("Customer").with_property(PropertyDef::new("Email", "String")));
//! let new = OntologySnapshot::new("crm", "2")
//!     .with_entity(EntityDef::new("Customer").with_property(PropertyDef::new("EmailAddress", "String")));
//!
//! let report = diff(&old, &new).unwrap();
//! let rename = report.entry("Customer.Email").unwrap();
//! assert_eq!(rename.renamed_to.as_deref(), Some("Customer.EmailAddress"));
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: entries are ordered by element group, then path.
//! - **Self-diff**: `diff(X, X)` contains only `Unchanged` entries.
//! - **Symmetry**: `Added` paths of `diff(A, B)` are the `Removed` paths of
//!   `diff(B, A)`; modified entries mirror with swapped before/after.
//! - **Unique paths**: no two entries share an identity path.

pub mod engine;
pub mod model;

pub use engine::{align_snapshots, diff, diff_with, Aligned, Alignment};
pub use model::{ChangeCounts, ChangeType, DiffEntry, DiffReport, ElementType, FieldChange};
