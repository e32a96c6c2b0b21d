use ontogov_core::model::{
    Binding, Cardinality, ColumnDef, EntityDef, EntityKind, OntologySnapshot, PropertyDef,
    RelationshipDef, RuleDef, TableCatalog, TableDef,
};
use std::collections::BTreeMap;

/// Customer/Order sales model used as the common base snapshot
#[allow(dead_code)]
pub fn sales_base() -> OntologySnapshot {
    OntologySnapshot::new("sales", "1.0")
        .with_source("Sales.pbix")
        .with_entity(
            EntityDef::new("Customer")
                .with_kind(EntityKind::Dimension)
                .with_property(PropertyDef::new("CustomerId", "int").required().unique())
                .with_property(PropertyDef::new("Name", "nvarchar(100)"))
                .with_property(PropertyDef::new("Email", "nvarchar(255)")),
        )
        .with_entity(
            EntityDef::new("Orders")
                .with_kind(EntityKind::Fact)
                .with_property(PropertyDef::new("OrderId", "int").required().unique())
                .with_property(PropertyDef::new("CustomerId", "int"))
                .with_property(PropertyDef::new("Total", "decimal(18,2)")),
        )
        .with_relationship(
            RelationshipDef::new("Customer_Orders", "Customer", "Orders", Cardinality::OneToMany)
                .with_keys("CustomerId", "CustomerId"),
        )
        .with_rule(
            RuleDef::new("Revenue", "Orders", "", "")
                .with_classification("measure")
                .derived_from("SUM(Orders[Total])"),
        )
        .with_metadata("owner", serde_json::json!("finance"))
}

/// Replace one entity of a snapshot, keeping its position
#[allow(dead_code)]
pub fn replace_entity(mut snapshot: OntologySnapshot, entity: EntityDef) -> OntologySnapshot {
    if let Some(slot) = snapshot.entities.iter_mut().find(|e| e.name == entity.name) {
        *slot = entity;
    } else {
        snapshot.entities.push(entity);
    }
    snapshot
}

/// Rename a property in place
#[allow(dead_code)]
pub fn rename_property(
    mut snapshot: OntologySnapshot,
    entity: &str,
    from: &str,
    to: &str,
) -> OntologySnapshot {
    if let Some(e) = snapshot.entities.iter_mut().find(|e| e.name == entity) {
        if let Some(p) = e.properties.iter_mut().find(|p| p.name == from) {
            p.name = to.to_string();
        }
    }
    snapshot
}

/// Shipments table bindings recorded at model publish time
#[allow(dead_code)]
pub fn shipment_bindings() -> Vec<Binding> {
    vec![
        Binding::new("Shipment", "ShipmentId", "dbo.Shipments", "ShipmentID", "int")
            .with_nullable(false)
            .with_ordinal(1),
        Binding::new("Shipment", "Location", "dbo.Shipments", "Warehouse_Location", "varchar(50)")
            .with_ordinal(2),
        Binding::new("Shipment", "Weight", "dbo.Shipments", "Weight", "int").with_ordinal(3),
    ]
}

/// Live catalog matching [`shipment_bindings`] exactly
#[allow(dead_code)]
pub fn shipment_catalog() -> TableCatalog {
    TableCatalog::new().with_table(
        "dbo.Shipments",
        TableDef::new()
            .with_column(ColumnDef::new("ShipmentID", "int").not_null().with_ordinal(1))
            .with_column(ColumnDef::new("Warehouse_Location", "varchar(50)").with_ordinal(2))
            .with_column(ColumnDef::new("Weight", "int").with_ordinal(3)),
    )
}

/// Snapshot map keyed by label
#[allow(dead_code)]
pub fn labelled(snapshots: Vec<(&str, OntologySnapshot)>) -> BTreeMap<String, OntologySnapshot> {
    snapshots
        .into_iter()
        .map(|(label, s)| (label.to_string(), s))
        .collect()
}
