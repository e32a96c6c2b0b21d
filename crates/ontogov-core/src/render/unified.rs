//! Unified-diff view of a [`DiffReport`].
//!
//! Every changed entry contributes `element: path = value` lines, its old
//! value to the left side and its new value to the right side. Both sides are
//! sorted and compared line by line, so the output reads like `git diff` of two
//! flattened snapshots.

use serde_json::Value;

use crate::diff::model::DiffReport;

const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

impl Tag {
    fn marker(self) -> char {
        match self {
            Tag::Equal => ' ',
            Tag::Delete => '-',
            Tag::Insert => '+',
        }
    }
}

fn side_lines(report: &DiffReport, old_side: bool) -> Vec<String> {
    let mut lines: Vec<String> = report
        .changes()
        .filter_map(|entry| {
            let (path, value) = if old_side {
                (entry.path.as_str(), entry.before.as_ref()?)
            } else {
                let path = entry.renamed_to.as_deref().unwrap_or(&entry.path);
                (path, entry.after.as_ref()?)
            };
            Some(format!("{}: {} = {}", entry.element.as_str(), path, compact(value)))
        })
        .collect();
    lines.sort();
    lines
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Longest-common-subsequence edit script
fn edit_script<'a>(old: &'a [String], new: &'a [String]) -> Vec<(Tag, &'a str)> {
    let (n, m) = (old.len(), new.len());
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push((Tag::Equal, old[i].as_str()));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push((Tag::Delete, old[i].as_str()));
            i += 1;
        } else {
            ops.push((Tag::Insert, new[j].as_str()));
            j += 1;
        }
    }
    ops.extend(old[i..].iter().map(|l| (Tag::Delete, l.as_str())));
    ops.extend(new[j..].iter().map(|l| (Tag::Insert, l.as_str())));
    ops
}

/// Hunk range in `start,length` form; a one-line range drops the length
fn range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

/// Render the report as a unified diff
///
/// Headers name each side as `<name> v<version>`. A report without changes
/// renders as an empty string.
pub fn render_unified_diff(report: &DiffReport) -> String {
    let old = side_lines(report, true);
    let new = side_lines(report, false);
    let ops = edit_script(&old, &new);

    let changed: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, (tag, _))| *tag != Tag::Equal)
        .map(|(idx, _)| idx)
        .collect();
    let Some(&first) = changed.first() else {
        return String::new();
    };

    // Line offsets on each side before every op
    let mut offsets = Vec::with_capacity(ops.len());
    let (mut o, mut n) = (0, 0);
    for (tag, _) in &ops {
        offsets.push((o, n));
        match tag {
            Tag::Equal => {
                o += 1;
                n += 1;
            }
            Tag::Delete => o += 1,
            Tag::Insert => n += 1,
        }
    }

    // Changes separated by at most two contexts of equal lines share a hunk
    let mut groups = vec![(first, first)];
    for &idx in &changed[1..] {
        match groups.last_mut() {
            Some(last) if idx - last.1 <= 2 * CONTEXT + 1 => last.1 = idx,
            _ => groups.push((idx, idx)),
        }
    }

    let mut out = format!(
        "--- {} v{}\n+++ {} v{}\n",
        report.old_name, report.old_version, report.new_name, report.new_version
    );
    for (first_change, last_change) in groups {
        let start = first_change.saturating_sub(CONTEXT);
        let end = (last_change + CONTEXT + 1).min(ops.len());
        let hunk = &ops[start..end];
        let old_len = hunk.iter().filter(|(t, _)| *t != Tag::Insert).count();
        let new_len = hunk.iter().filter(|(t, _)| *t != Tag::Delete).count();
        let (old_start, new_start) = offsets[start];

        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            range(old_start, old_len),
            range(new_start, new_len)
        ));
        for (tag, line) in hunk {
            out.push(tag.marker());
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::model::{EntityDef, OntologySnapshot, PropertyDef};

    fn customer(version: &str, prop: &str) -> OntologySnapshot {
        OntologySnapshot::new("crm", version).with_entity(
            EntityDef::new("Customer")
                .with_property(PropertyDef::new("CustomerId", "int"))
                .with_property(PropertyDef::new(prop, "text")),
        )
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_edit_script_keeps_common_lines() {
        let old = lines(&["a", "b", "c"]);
        let new = lines(&["a", "c", "d"]);
        let tags: Vec<Tag> = edit_script(&old, &new).into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            tags,
            vec![Tag::Equal, Tag::Delete, Tag::Equal, Tag::Insert]
        );
    }

    #[test]
    fn test_range_format() {
        assert_eq!(range(0, 0), "0,0");
        assert_eq!(range(4, 1), "5");
        assert_eq!(range(0, 3), "1,3");
    }

    #[test]
    fn test_unchanged_report_renders_empty() {
        let s = customer("1", "Email");
        assert_eq!(render_unified_diff(&diff(&s, &s).unwrap()), "");
    }

    #[test]
    fn test_metadata_change_hunk() {
        let old = customer("1", "Email").with_metadata("owner", serde_json::json!("finance"));
        let new = customer("2", "Email").with_metadata("owner", serde_json::json!("ops"));
        let out = render_unified_diff(&diff(&old, &new).unwrap());
        assert_eq!(
            out,
            "--- crm v1\n+++ crm v2\n@@ -1 +1 @@\n\
             -metadata: metadata:owner = finance\n\
             +metadata: metadata:owner = ops\n"
        );
    }

    #[test]
    fn test_rename_shows_both_paths() {
        let report = diff(&customer("1", "Email"), &customer("2", "EmailAddress")).unwrap();
        let out = render_unified_diff(&report);
        assert!(out.starts_with("--- crm v1\n+++ crm v2\n@@ -"));
        assert!(out.lines().any(|l| l.starts_with("-property: Customer.Email = ")));
        assert!(out.lines().any(|l| l.starts_with("+property: Customer.EmailAddress = ")));
    }
}
