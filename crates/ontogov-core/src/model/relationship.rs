use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        }
    }
}

/// Filter propagation direction across a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossFilter {
    #[default]
    Single,
    Both,
}

/// A named directed link between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub name: String,
    pub source_entity: String,
    pub target_entity: String,
    pub cardinality: Cardinality,

    #[serde(default)]
    pub cross_filter: CrossFilter,

    /// Joining column on the source side
    #[serde(default)]
    pub source_key: String,

    /// Joining column on the target side
    #[serde(default)]
    pub target_key: String,

    #[serde(default)]
    pub description: String,
}

impl RelationshipDef {
    pub fn new(
        name: impl Into<String>,
        source_entity: impl Into<String>,
        target_entity: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            source_entity: source_entity.into(),
            target_entity: target_entity.into(),
            cardinality,
            cross_filter: CrossFilter::Single,
            source_key: String::new(),
            target_key: String::new(),
            description: String::new(),
        }
    }

    pub fn with_keys(mut self, source_key: impl Into<String>, target_key: impl Into<String>) -> Self {
        self.source_key = source_key.into();
        self.target_key = target_key.into();
        self
    }

    pub fn with_cross_filter(mut self, cross_filter: CrossFilter) -> Self {
        self.cross_filter = cross_filter;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// True when both relationships connect the same ordered entity pair
    pub fn same_endpoints(&self, other: &RelationshipDef) -> bool {
        self.source_entity == other.source_entity && self.target_entity == other.target_entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_wire_names() {
        let json = serde_json::to_string(&Cardinality::ManyToMany).unwrap();
        assert_eq!(json, "\"many-to-many\"");
        assert_eq!(Cardinality::OneToMany.as_str(), "one-to-many");
    }

    #[test]
    fn test_same_endpoints_is_directional() {
        let a = RelationshipDef::new("places", "Customer", "Order", Cardinality::OneToMany);
        let b = RelationshipDef::new("placed_by", "Order", "Customer", Cardinality::ManyToOne);
        assert!(!a.same_endpoints(&b));
        assert!(a.same_endpoints(&a.clone().with_description("renamed")));
    }
}
