use serde::{Deserialize, Serialize};

/// Role an entity plays in the analytical model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Standard,
    Dimension,
    Fact,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Standard => "standard",
            EntityKind::Dimension => "dimension",
            EntityKind::Fact => "fact",
        }
    }
}

/// Declarative constraint attached to an entity or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Length {
        #[serde(default)]
        min: Option<u32>,
        #[serde(default)]
        max: Option<u32>,
    },
    Pattern {
        regex: String,
    },
    Enumeration {
        values: Vec<String>,
    },
    Custom {
        name: String,
        expression: String,
    },
}

/// A typed attribute of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Unique within the owning entity
    pub name: String,

    /// Semantic type text (`String`, `Int64`, `decimal(18,2)`, ...)
    pub data_type: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            required: false,
            unique: false,
            description: String::new(),
            constraints: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// A named business concept (Customer, Shipment, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Unique within the snapshot
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub kind: EntityKind,

    /// Ordered; names unique within the entity
    #[serde(default)]
    pub properties: Vec<PropertyDef>,

    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: EntityKind::Standard,
            properties: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Look up a property by exact name
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    /// Copy of the entity without its properties
    ///
    /// Properties are diffed and merged individually; the header carries
    /// everything else.
    pub fn header(&self) -> EntityDef {
        EntityDef {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind,
            properties: Vec::new(),
            constraints: self.constraints.clone(),
        }
    }

    /// Header equality ignoring the name
    pub fn same_header_content(&self, other: &EntityDef) -> bool {
        self.description == other.description
            && self.kind == other.kind
            && self.constraints == other.constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_drops_properties() {
        let entity = EntityDef::new("Customer")
            .with_kind(EntityKind::Dimension)
            .with_property(PropertyDef::new("Email", "String").required());
        let header = entity.header();
        assert!(header.properties.is_empty());
        assert_eq!(header.kind, EntityKind::Dimension);
        assert!(entity.same_header_content(&header));
    }

    #[test]
    fn test_constraint_serde_tagging() {
        let c = Constraint::Length {
            min: None,
            max: Some(255),
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "length");
        assert_eq!(json["max"], 255);
        let back: Constraint = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_property_defaults_on_deserialize() {
        let p: PropertyDef =
            serde_json::from_str(r#"{"name":"Email","data_type":"String"}"#).unwrap();
        assert!(!p.required);
        assert!(p.constraints.is_empty());
    }
}
