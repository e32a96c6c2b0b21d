use serde::{Deserialize, Serialize};

/// Where a rule came from
///
/// Rules translated from an analytical formula are *measures*; debt
/// analysis compares their formulas across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleProvenance {
    #[default]
    Manual,
    DerivedFromFormula { formula: String },
}

/// A named business rule scoped to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    pub name: String,

    /// Owning entity name
    pub entity: String,

    pub condition: String,

    pub action: String,

    #[serde(default)]
    pub classification: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub provenance: RuleProvenance,

    #[serde(default)]
    pub description: String,
}

impl RuleDef {
    pub fn new(
        name: impl Into<String>,
        entity: impl Into<String>,
        condition: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            condition: condition.into(),
            action: action.into(),
            classification: String::new(),
            priority: 0,
            provenance: RuleProvenance::Manual,
            description: String::new(),
        }
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = classification.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the rule as derived from an analytical formula
    pub fn derived_from(mut self, formula: impl Into<String>) -> Self {
        self.provenance = RuleProvenance::DerivedFromFormula {
            formula: formula.into(),
        };
        self
    }

    pub fn is_measure(&self) -> bool {
        matches!(self.provenance, RuleProvenance::DerivedFromFormula { .. })
    }

    pub fn formula(&self) -> Option<&str> {
        match &self.provenance {
            RuleProvenance::DerivedFromFormula { formula } => Some(formula),
            RuleProvenance::Manual => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_detection() {
        let manual = RuleDef::new("HighValue", "Customer", "Revenue > 10000", "flag");
        assert!(!manual.is_measure());
        assert_eq!(manual.formula(), None);

        let measure = manual.derived_from("SUM(Sales[Amount])");
        assert!(measure.is_measure());
        assert_eq!(measure.formula(), Some("SUM(Sales[Amount])"));
    }

    #[test]
    fn test_provenance_serde() {
        let rule = RuleDef::new("Revenue", "Sales", "", "").derived_from("SUM(Sales[Amount])");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["provenance"]["kind"], "derived_from_formula");
        let back: RuleDef = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }
}
