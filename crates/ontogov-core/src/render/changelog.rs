//! Changelog renderer for snapshot diffs.

use crate::diff::model::{ChangeType, DiffEntry, DiffReport, ElementType};
use crate::render::short;

const SECTIONS: [(ElementType, &str); 5] = [
    (ElementType::Entity, "Entities"),
    (ElementType::Property, "Properties"),
    (ElementType::Relationship, "Relationships"),
    (ElementType::Rule, "Rules"),
    (ElementType::Metadata, "Metadata"),
];

fn entry_line(entry: &DiffEntry) -> String {
    let mut line = match (&entry.change, &entry.renamed_to) {
        (ChangeType::Modified, Some(to)) => format!("- `{}` renamed to `{}`", entry.path, to),
        (ChangeType::Added, _) => format!("- Added `{}`", entry.path),
        (ChangeType::Removed, _) => format!("- Removed `{}`", entry.path),
        _ => format!("- Modified `{}`", entry.path),
    };
    if let Some(score) = entry.similarity {
        line.push_str(&format!(" (similarity {:.2})", score));
    }
    if let Some(near) = &entry.near_match {
        line.push_str(&format!(
            " _possible rename of `{}` ({:.2}), below threshold_",
            near.key, near.score
        ));
    }
    line.push('\n');
    for change in &entry.field_changes {
        line.push_str(&format!(
            "  - `{}`: {} -> {}\n",
            change.field, change.before, change.after
        ));
    }
    line
}

/// Render a Markdown changelog of a [`DiffReport`]
pub fn render_changelog(report: &DiffReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "## Changelog: {} {} -> {} {}\n\n",
        report.old_name, report.old_version, report.new_name, report.new_version
    ));
    out.push_str(&format!(
        "Digests: `{}` -> `{}`\n\n",
        short(&report.old_digest),
        short(&report.new_digest)
    ));

    if !report.has_changes() {
        out.push_str("_No changes._\n");
        return out;
    }

    let t = &report.totals;
    out.push_str(&format!(
        "**Added**: {}  \n**Removed**: {}  \n**Modified**: {}  \n**Unchanged**: {}\n\n",
        t.added, t.removed, t.modified, t.unchanged
    ));

    for (element, title) in SECTIONS {
        let changed: Vec<&DiffEntry> = report
            .entries_of(element)
            .filter(|e| e.change != ChangeType::Unchanged)
            .collect();
        if changed.is_empty() {
            continue;
        }
        out.push_str(&format!("### {}\n\n", title));
        for entry in changed {
            out.push_str(&entry_line(entry));
        }
        out.push('\n');
    }

    out
}
