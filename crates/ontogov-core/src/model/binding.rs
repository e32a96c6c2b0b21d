//! Physical bindings and the live table catalog they are checked against

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping of a semantic property onto a physical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub entity: String,
    pub property: String,
    pub table: String,
    pub column: String,

    /// Physical type recorded when the binding was made
    pub physical_type: String,

    /// Expected nullability, if recorded
    #[serde(default)]
    pub nullable: Option<bool>,

    /// Expected column default, if recorded
    #[serde(default)]
    pub default: Option<String>,

    /// Expected ordinal position, if recorded
    #[serde(default)]
    pub ordinal: Option<u32>,
}

impl Binding {
    pub fn new(
        entity: impl Into<String>,
        property: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        physical_type: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            property: property.into(),
            table: table.into(),
            column: column.into(),
            physical_type: physical_type.into(),
            nullable: None,
            default: None,
            ordinal: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// Binding identity: `Entity.Property`
    pub fn id(&self) -> String {
        format!("{}.{}", self.entity, self.property)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,

    #[serde(default = "default_nullable")]
    pub nullable: bool,

    #[serde(default)]
    pub default: Option<String>,

    #[serde(default)]
    pub ordinal: Option<u32>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            ordinal: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Case-insensitive column lookup, exact match preferred
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }
}

/// Snapshot of the live physical schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableCatalog {
    #[serde(default)]
    pub tables: BTreeMap<String, TableDef>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, table: TableDef) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Case-insensitive table lookup, exact match preferred
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.resolve(name).map(|(_, t)| t)
    }

    /// Like [`TableCatalog::table`], also returning the catalog's own key
    pub fn resolve(&self, name: &str) -> Option<(&str, &TableDef)> {
        self.tables
            .get_key_value(name)
            .or_else(|| self.tables.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)))
            .map(|(k, t)| (k.as_str(), t))
    }
}
