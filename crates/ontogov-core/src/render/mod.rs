//! Markdown renderers for review workflows.
//!
//! Everything here reads structured report fields only and is informational;
//! nothing downstream should parse the output.

pub mod changelog;
pub mod summary;
pub mod unified;

pub use changelog::render_changelog;
pub use summary::{render_debt_markdown, render_drift_summary, render_merge_summary};
pub use unified::render_unified_diff;

pub(crate) fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
