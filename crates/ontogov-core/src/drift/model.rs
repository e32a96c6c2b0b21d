use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{GovernanceError, Result};
use crate::matching::NearMatch;
use crate::severity::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// Nullability or default differs from the recorded expectation
    AttributeChanged,
    /// Bound column vanished; a similar unbound column appeared
    ProbableRename,
    /// Bound column vanished without a plausible replacement
    ColumnRemoved,
    /// Column type narrowed or changed family
    TypeIncompatible,
    /// Column type widened
    TypeWidened,
    /// Bound table vanished
    TableMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Remediation {
    /// Point the binding at another column
    Rebind { column: String },
    /// Drop the binding
    RemoveBinding,
    /// Record the column's new physical type on the binding
    UpdateTypeMapping { new_type: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftIssue {
    /// Binding identity (`Entity.Property`)
    pub binding: String,
    pub table: String,
    pub column: String,
    pub severity: Severity,
    pub kind: DriftKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Remediation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near_match: Option<NearMatch>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriftReport {
    /// Most severe first, then by binding identity
    pub issues: Vec<DriftIssue>,
    /// Bindings without any issue, sorted
    pub clean_bindings: Vec<String>,
    pub counts: BTreeMap<Severity, usize>,
}

impl DriftReport {
    pub(crate) fn new(mut issues: Vec<DriftIssue>, mut clean_bindings: Vec<String>) -> Self {
        issues.sort_by(|a, b| {
            (Reverse(a.severity), &a.binding).cmp(&(Reverse(b.severity), &b.binding))
        });
        clean_bindings.sort();
        let mut counts = BTreeMap::new();
        for issue in &issues {
            *counts.entry(issue.severity).or_insert(0) += 1;
        }
        Self {
            issues,
            clean_bindings,
            counts,
        }
    }

    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.counts.get(&severity).copied().unwrap_or(0)
    }

    pub fn issues_for<'a>(&'a self, binding: &'a str) -> impl Iterator<Item = &'a DriftIssue> {
        self.issues.iter().filter(move |i| i.binding == binding)
    }

    /// Gate for automated actions
    ///
    /// # Errors
    ///
    /// `ERR_CRITICAL_DRIFT` listing the affected bindings.
    pub fn ensure_no_critical(&self) -> Result<()> {
        if !self.has_critical() {
            return Ok(());
        }
        let bindings = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .map(|i| i.binding.clone())
            .collect();
        Err(GovernanceError::CriticalDrift { bindings }.into())
    }
}
