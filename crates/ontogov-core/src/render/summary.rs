//! Markdown summaries for merge, drift and debt reports.

use crate::debt::{DebtConflict, DebtReport};
use crate::drift::{DriftReport, Remediation};
use crate::merge::{ConflictKind, MergeConflict, MergeOutcome, Resolution};
use crate::severity::Severity;

fn conflict_kind_label(kind: &ConflictKind) -> &'static str {
    match kind {
        ConflictKind::ModifyModify => "modified on both sides",
        ConflictKind::AddAdd => "added on both sides",
        ConflictKind::DeleteModify => "deleted on one side, modified on the other",
        ConflictKind::NameCollision => "name collision",
    }
}

fn resolution_label(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Base => "base",
        Resolution::Ours => "ours",
        Resolution::Theirs => "theirs",
        Resolution::Union => "union",
    }
}

fn conflict_line(conflict: &MergeConflict) -> String {
    let state = match &conflict.resolution {
        Some(r) => format!("resolved: {}", resolution_label(r)),
        None => "**open**".to_string(),
    };
    format!(
        "- `{}` ({}, {}): {}\n",
        conflict.path,
        conflict.element.as_str(),
        conflict_kind_label(&conflict.kind),
        state
    )
}

/// Render a Markdown summary of a [`MergeOutcome`]
pub fn render_merge_summary(outcome: &MergeOutcome) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "## Merge: {} {}\n\n",
        outcome.merged.name, outcome.merged.version
    ));
    out.push_str(&format!(
        "**Strategy**: {}  \n**Ours changed**: {}  \n**Theirs changed**: {}\n\n",
        outcome.strategy.as_str(),
        outcome.ours_diff.totals.changed(),
        outcome.theirs_diff.totals.changed()
    ));

    if outcome.conflicts.is_empty() {
        out.push_str("_Merged cleanly._\n");
        return out;
    }

    let open = outcome.open_conflicts().count();
    out.push_str(&format!(
        "### Conflicts ({} total, {} open)\n\n",
        outcome.conflicts.len(),
        open
    ));
    for conflict in &outcome.conflicts {
        out.push_str(&conflict_line(conflict));
    }
    out.push('\n');

    if open > 0 {
        out.push_str("_Resolve the open conflicts before publishing the merged snapshot._\n");
    }
    out
}

fn remediation_text(remediation: &Remediation) -> String {
    match remediation {
        Remediation::Rebind { column } => format!("rebind to `{}`", column),
        Remediation::RemoveBinding => "remove binding".to_string(),
        Remediation::UpdateTypeMapping { new_type } => format!("update type to `{}`", new_type),
    }
}

const SEVERITY_SECTIONS: [(Severity, &str); 3] = [
    (Severity::Critical, "Critical"),
    (Severity::Warning, "Warning"),
    (Severity::Info, "Info"),
];

/// Render a Markdown summary of a [`DriftReport`]
pub fn render_drift_summary(report: &DriftReport) -> String {
    let mut out = String::new();

    out.push_str("## Schema Drift\n\n");
    out.push_str(&format!(
        "**Critical**: {}  \n**Warning**: {}  \n**Info**: {}  \n**Clean bindings**: {}\n\n",
        report.count(Severity::Critical),
        report.count(Severity::Warning),
        report.count(Severity::Info),
        report.clean_bindings.len()
    ));

    if report.issues.is_empty() {
        out.push_str("_No drift detected._\n");
        return out;
    }

    for (severity, title) in SEVERITY_SECTIONS {
        let issues: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .collect();
        if issues.is_empty() {
            continue;
        }
        out.push_str(&format!("### {}\n\n", title));
        for issue in issues {
            out.push_str(&format!("- `{}`: {}", issue.binding, issue.description));
            if let Some(remediation) = &issue.remediation {
                out.push_str(&format!(" -> {}", remediation_text(remediation)));
            }
            if let Some(near) = &issue.near_match {
                out.push_str(&format!(
                    " _closest column `{}` ({:.2})_",
                    near.key, near.score
                ));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if report.has_critical() {
        out.push_str("_Critical drift blocks automated refreshes until bindings are fixed._\n");
    }
    out
}

fn debt_conflict_lines(conflict: &DebtConflict) -> String {
    let mut lines = format!(
        "#### {} `{}`\n\n{}\n\n",
        conflict.conflict_type.as_str(),
        conflict.name,
        conflict.description
    );
    for (label, definition) in &conflict.definitions {
        lines.push_str(&format!("- **{}**: `{}`\n", label, definition));
    }
    lines.push_str(&format!(
        "\n**Recommendation**: {}\n\n",
        conflict.recommendation.text(&conflict.name)
    ));
    lines
}

/// Render a Markdown report of a [`DebtReport`]
pub fn render_debt_markdown(report: &DebtReport) -> String {
    let mut out = String::new();

    out.push_str("# Semantic Debt Report\n\n");
    out.push_str(&format!(
        "**Snapshots analyzed**: {}  \n**Conflicts**: {}  \n**Estimated reconciliation cost**: ${:.0}\n\n",
        report.snapshots_analyzed.join(", "),
        report.conflicts.len(),
        report.estimated_cost
    ));

    if !report.has_conflicts() {
        out.push_str("_No semantic conflicts._\n");
        return out;
    }

    out.push_str("| Type | Count |\n|---|---|\n");
    for (conflict_type, count) in &report.by_type {
        out.push_str(&format!("| {} | {} |\n", conflict_type.as_str(), count));
    }
    out.push('\n');

    for (severity, title) in SEVERITY_SECTIONS {
        let conflicts: Vec<&DebtConflict> = report
            .conflicts
            .iter()
            .filter(|c| c.severity == severity)
            .collect();
        if conflicts.is_empty() {
            continue;
        }
        out.push_str(&format!("### {} ({})\n\n", title, conflicts.len()));
        for conflict in conflicts {
            out.push_str(&debt_conflict_lines(conflict));
        }
    }

    if !report.recommendations.is_empty() {
        out.push_str("### Recommendations\n\n");
        for (i, rec) in report.recommendations.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, rec));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::analyze_debt;
    use crate::drift::detect_drift;
    use crate::model::{Binding, ColumnDef, OntologySnapshot, RuleDef, TableCatalog, TableDef};
    use std::collections::BTreeMap;

    #[test]
    fn test_drift_summary_lists_remediation() {
        let bindings = vec![Binding::new("Order", "Total", "dbo.Orders", "Total", "int")];
        let catalog = TableCatalog::new().with_table(
            "dbo.Orders",
            TableDef::new().with_column(ColumnDef::new("Total", "bigint")),
        );
        let out = render_drift_summary(&detect_drift(&bindings, &catalog).unwrap());
        assert!(out.contains("### Warning"));
        assert!(out.contains("update type to `bigint`"));
        assert!(!out.contains("### Critical"));
    }

    #[test]
    fn test_debt_markdown() {
        let finance = OntologySnapshot::new("finance", "1")
            .with_rule(RuleDef::new("Revenue", "Sales", "", "").derived_from("SUM(Sales[Net])"));
        let marketing = OntologySnapshot::new("marketing", "1")
            .with_rule(RuleDef::new("Revenue", "Sales", "", "").derived_from("SUM(Sales[Gross])"));
        let snapshots = BTreeMap::from([
            ("finance".to_string(), finance),
            ("marketing".to_string(), marketing),
        ]);
        let out = render_debt_markdown(&analyze_debt(&snapshots).unwrap());
        assert!(out.contains("### Critical (1)"));
        assert!(out.contains("MEASURE `Revenue`"));
        assert!(out.contains("$50000"));
    }
}
