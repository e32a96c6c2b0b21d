//! Governance configuration
//!
//! One TOML document configures matching, drift and debt analysis:
//!
//! ```toml
//! [matching]
//! rename_threshold = 0.75
//!
//! [drift]
//! ordinal_weight = 0.2
//!
//! [debt]
//! cost_per_conflict = 40000.0
//!
//! [debt.severities]
//! TYPE = "CRITICAL"
//! ```
//!
//! Every section and key is optional; missing values take their defaults.

#![allow(clippy::result_large_err)]

use serde::{Deserialize, Serialize};

use crate::debt::DebtPolicy;
use crate::drift::DriftConfig;
use crate::errors::{GovernanceError, Result};
use crate::matching::MatchConfig;

const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub matching: MatchConfig,
    pub drift: DriftConfig,
    pub debt: DebtPolicy,
}

fn invalid(field: &str, reason: impl Into<String>) -> GovernanceError {
    GovernanceError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn unit_interval(field: &str, value: f64) -> std::result::Result<(), GovernanceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{} is outside [0, 1]", value)))
    }
}

impl GovernanceConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_CONFIG` for malformed TOML or values rejected by
    /// [`GovernanceConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: GovernanceConfig =
            toml::from_str(text).map_err(|e| invalid("document", e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    ///
    /// `ERR_SERIALIZATION` if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| {
            GovernanceError::Serialization {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// `ERR_INVALID_CONFIG` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        unit_interval("matching.rename_threshold", m.rename_threshold)?;
        unit_interval("matching.ambiguity_floor", m.ambiguity_floor)?;
        if m.ambiguity_floor > m.rename_threshold {
            return Err(invalid(
                "matching.ambiguity_floor",
                format!(
                    "floor {} exceeds rename threshold {}",
                    m.ambiguity_floor, m.rename_threshold
                ),
            )
            .into());
        }
        unit_interval("matching.entity_name_weight", m.entity_name_weight)?;
        unit_interval("matching.entity_property_weight", m.entity_property_weight)?;
        if (m.entity_name_weight + m.entity_property_weight - 1.0).abs() > WEIGHT_EPSILON {
            return Err(invalid(
                "matching.entity_name_weight",
                "entity name and property weights must sum to 1",
            )
            .into());
        }

        unit_interval("drift.ordinal_weight", self.drift.ordinal_weight)?;

        let cost = self.debt.cost_per_conflict;
        if !cost.is_finite() || cost < 0.0 {
            return Err(invalid("debt.cost_per_conflict", format!("{} is not a valid cost", cost)).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debt::DebtConflictType;
    use crate::errors::ExErrorKind;
    use crate::severity::Severity;

    #[test]
    fn test_defaults_are_valid() {
        GovernanceConfig::default().validate().unwrap();
        let parsed = GovernanceConfig::from_toml_str("").unwrap();
        assert_eq!(parsed, GovernanceConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = GovernanceConfig::from_toml_str(
            r#"
[matching]
rename_threshold = 0.8

[debt]
cost_per_conflict = 1000.0

[debt.severities]
TYPE = "CRITICAL"
"#,
        )
        .unwrap();
        assert_eq!(config.matching.rename_threshold, 0.8);
        assert_eq!(config.matching.ambiguity_floor, 0.4);
        assert_eq!(config.debt.cost_per_conflict, 1000.0);
        assert_eq!(config.debt.severity_for(DebtConflictType::Type), Severity::Critical);
        assert_eq!(config.drift, DriftConfig::default());
    }

    #[test]
    fn test_partial_synonyms_extend_defaults() {
        let config = GovernanceConfig::from_toml_str(
            r#"
[matching.synonyms]
wh = "warehouse"
no = "no"
"#,
        )
        .unwrap();
        let synonyms = &config.matching.synonyms;
        assert_eq!(synonyms.get("wh").map(String::as_str), Some("warehouse"));
        assert_eq!(synonyms.get("facility").map(String::as_str), Some("location"));
        assert_eq!(synonyms.get("no").map(String::as_str), Some("no"));
        assert_eq!(synonyms.len(), MatchConfig::default().synonyms.len() + 1);

        // default rewrites still drive rename scoring
        assert_eq!(
            config.matching.name_similarity("Warehouse_Location", "FacilityID"),
            1.0
        );
        assert_eq!(config.matching.name_similarity("WH_Code", "Warehouse_Code"), 1.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = GovernanceConfig::from_toml_str("[matching]\nrename_threshold = 1.5\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
        assert_eq!(err.path(), Some("matching.rename_threshold"));
    }

    #[test]
    fn test_rejects_floor_above_threshold() {
        let err = GovernanceConfig::from_toml_str(
            "[matching]\nrename_threshold = 0.5\nambiguity_floor = 0.6\n",
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("matching.ambiguity_floor"));
    }

    #[test]
    fn test_rejects_unbalanced_weights() {
        let mut config = GovernanceConfig::default();
        config.matching.entity_name_weight = 0.9;
        assert_eq!(config.validate().unwrap_err().kind(), ExErrorKind::InvalidConfig);
    }

    #[test]
    fn test_rejects_negative_cost() {
        let mut config = GovernanceConfig::default();
        config.debt.cost_per_conflict = -1.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.path(), Some("debt.cost_per_conflict"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = GovernanceConfig::from_toml_str("[matching\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = GovernanceConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(GovernanceConfig::from_toml_str(&text).unwrap(), config);
    }
}
