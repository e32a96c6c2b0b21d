use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{EntityDef, PropertyDef};
use super::relationship::RelationshipDef;
use super::rule::RuleDef;

/// A complete, versioned ontology state
///
/// Snapshots are treated as immutable values: every governance operation
/// borrows them, and merge produces a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologySnapshot {
    /// Snapshot identity
    pub name: String,

    pub version: String,

    /// Free-form origin label (model file, workspace, team)
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub entities: Vec<EntityDef>,

    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,

    #[serde(default)]
    pub rules: Vec<RuleDef>,

    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl OntologySnapshot {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source: String::new(),
            created_at: None,
            entities: Vec::new(),
            relationships: Vec::new(),
            rules: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipDef) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn with_rule(mut self, rule: RuleDef) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn property(&self, entity: &str, property: &str) -> Option<&PropertyDef> {
        self.entity(entity).and_then(|e| e.property(property))
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn rule(&self, name: &str) -> Option<&RuleDef> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Rules derived from analytical formulas
    pub fn measures(&self) -> impl Iterator<Item = &RuleDef> {
        self.rules.iter().filter(|r| r.is_measure())
    }

    /// Total number of properties across all entities
    pub fn property_count(&self) -> usize {
        self.entities.iter().map(|e| e.properties.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
            && self.relationships.is_empty()
            && self.rules.is_empty()
            && self.metadata.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, EntityKind};

    fn sample() -> OntologySnapshot {
        OntologySnapshot::new("sales", "1.0")
            .with_entity(
                EntityDef::new("Customer")
                    .with_kind(EntityKind::Dimension)
                    .with_property(PropertyDef::new("CustomerID", "Int64").unique())
                    .with_property(PropertyDef::new("Email", "String")),
            )
            .with_entity(EntityDef::new("Orders").with_property(PropertyDef::new("Total", "Decimal")))
            .with_relationship(RelationshipDef::new(
                "customer_orders",
                "Customer",
                "Orders",
                Cardinality::OneToMany,
            ))
            .with_rule(RuleDef::new("Revenue", "Orders", "", "").derived_from("SUM(Orders[Total])"))
    }

    #[test]
    fn test_lookups() {
        let snap = sample();
        assert!(snap.entity("Customer").is_some());
        assert!(snap.property("Customer", "Email").is_some());
        assert!(snap.property("Customer", "Missing").is_none());
        assert!(snap.relationship("customer_orders").is_some());
        assert_eq!(snap.measures().count(), 1);
        assert_eq!(snap.property_count(), 3);
        assert!(!snap.is_empty());
    }

    #[test]
    fn test_deserialize_minimal_snapshot() {
        let snap: OntologySnapshot =
            serde_json::from_str(r#"{"name":"empty","version":"0"}"#).unwrap();
        assert!(snap.is_empty());
        assert!(snap.created_at.is_none());
    }
}
