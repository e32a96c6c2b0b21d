//! Three-way merge engine.
//!
//! Combines two divergent edits (`ours`, `theirs`) of a common ancestor
//! (`base`). Both sides are aligned against the base with the diff engine's
//! matcher, so renames on one side merge cleanly with edits on the other.
//!
//! ## Guarantees
//!
//! - `merge(base, base, T, _)` and `merge(base, T, base, _)` both yield `T`.
//! - Under `Union`, disjoint additive changes merge identically whichever
//!   side they come from.
//! - Merged collections never hold two elements with one name; placeholders
//!   for open conflicts are chosen so that this holds as well.
//! - Every open conflict blocks [`MergeOutcome::finalize`].

pub mod engine;
pub mod model;

pub use engine::{merge, merge_with};
pub use model::{ConflictKind, MergeConflict, MergeOutcome, MergeStrategy, Resolution, Resolutions};
