use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtConflictType {
    /// Rule logic or derived formula differs
    Measure,
    /// Declared property type differs
    Type,
    /// Entity kind or property set differs
    Entity,
    /// Cardinality or endpoints differ
    Relationship,
    /// Rule classification or priority differs, same logic
    Rule,
}

impl DebtConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtConflictType::Measure => "MEASURE",
            DebtConflictType::Type => "TYPE",
            DebtConflictType::Entity => "ENTITY",
            DebtConflictType::Relationship => "RELATIONSHIP",
            DebtConflictType::Rule => "RULE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Recommendation {
    /// Adopt the definition held by `preferred` everywhere
    Canonicalize { preferred: String },
    /// Same name, unrelated concepts: rename one occurrence
    Rename,
}

impl Recommendation {
    pub fn text(&self, name: &str) -> String {
        match self {
            Recommendation::Canonicalize { preferred } => {
                format!("Canonicalize '{}' to the definition in {}", name, preferred)
            }
            Recommendation::Rename => {
                format!("Rename one occurrence of '{}' to disambiguate", name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtConflict {
    /// Shared public name (`Entity`, `Entity.Property`, relationship or rule name)
    pub name: String,
    pub conflict_type: DebtConflictType,
    pub severity: Severity,

    /// Contributing snapshot labels, sorted; always two or more
    pub snapshots: Vec<String>,

    /// Normalized definition per contributing snapshot
    pub definitions: BTreeMap<String, serde_json::Value>,

    pub description: String,
    pub recommendation: Recommendation,
}

/// Severity table and cost model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtPolicy {
    /// Entries given in configuration override the defaults one by one
    #[serde(deserialize_with = "overlay_severities")]
    pub severities: BTreeMap<DebtConflictType, Severity>,
    pub cost_per_conflict: f64,
}

fn default_severities() -> BTreeMap<DebtConflictType, Severity> {
    BTreeMap::from([
        (DebtConflictType::Measure, Severity::Critical),
        (DebtConflictType::Relationship, Severity::Critical),
        (DebtConflictType::Type, Severity::Warning),
        (DebtConflictType::Entity, Severity::Warning),
        (DebtConflictType::Rule, Severity::Warning),
    ])
}

fn overlay_severities<'de, D>(deserializer: D) -> Result<BTreeMap<DebtConflictType, Severity>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = BTreeMap::<DebtConflictType, Severity>::deserialize(deserializer)?;
    let mut severities = default_severities();
    severities.extend(overrides);
    Ok(severities)
}

impl Default for DebtPolicy {
    fn default() -> Self {
        Self {
            severities: default_severities(),
            cost_per_conflict: 50_000.0,
        }
    }
}

impl DebtPolicy {
    /// Severity for a conflict type; types missing from the table are warnings
    pub fn severity_for(&self, conflict_type: DebtConflictType) -> Severity {
        self.severities
            .get(&conflict_type)
            .copied()
            .unwrap_or(Severity::Warning)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DebtReport {
    /// Snapshot labels, sorted
    pub snapshots_analyzed: Vec<String>,
    /// Most severe first, then by conflict type and name
    pub conflicts: Vec<DebtConflict>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<DebtConflictType, usize>,
    pub cost_per_conflict: f64,
    pub estimated_cost: f64,
    pub recommendations: Vec<String>,
}

impl DebtReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn count_of(&self, conflict_type: DebtConflictType) -> usize {
        self.by_type.get(&conflict_type).copied().unwrap_or(0)
    }

    pub fn conflicts_of(
        &self,
        conflict_type: DebtConflictType,
    ) -> impl Iterator<Item = &DebtConflict> {
        self.conflicts
            .iter()
            .filter(move |c| c.conflict_type == conflict_type)
    }

    pub fn conflict(&self, conflict_type: DebtConflictType, name: &str) -> Option<&DebtConflict> {
        self.conflicts
            .iter()
            .find(|c| c.conflict_type == conflict_type && c.name == name)
    }
}
