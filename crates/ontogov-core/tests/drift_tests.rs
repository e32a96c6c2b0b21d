#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{shipment_bindings, shipment_catalog};
use ontogov_core::drift::{
    detect_drift, detect_drift_with, detect_snapshot_drift, DriftConfig, DriftKind, Remediation,
};
use ontogov_core::errors::ExErrorKind;
use ontogov_core::matching::MatchConfig;
use ontogov_core::model::{
    Binding, ColumnDef, EntityDef, OntologySnapshot, PropertyDef, TableCatalog, TableDef,
};
use ontogov_core::severity::Severity;

/// Catalog with `Weight` replaced by `column` and `Warehouse_Location` by `location`
fn altered_catalog(location: ColumnDef, weight: Option<ColumnDef>) -> TableCatalog {
    let mut table = TableDef::new()
        .with_column(ColumnDef::new("ShipmentID", "int").not_null().with_ordinal(1))
        .with_column(location);
    if let Some(weight) = weight {
        table = table.with_column(weight);
    }
    TableCatalog::new().with_table("dbo.Shipments", table)
}

fn location_column() -> ColumnDef {
    ColumnDef::new("Warehouse_Location", "varchar(50)").with_ordinal(2)
}

// ----------------------------------------------------------------------------
// Clean and renamed columns
// ----------------------------------------------------------------------------

#[test]
fn test_matching_catalog_is_clean() {
    let report = detect_drift(&shipment_bindings(), &shipment_catalog()).unwrap();
    assert!(report.issues.is_empty());
    assert_eq!(
        report.clean_bindings,
        vec!["Shipment.Location", "Shipment.ShipmentId", "Shipment.Weight"]
    );
    assert!(report.ensure_no_critical().is_ok());
}

#[test]
fn test_renamed_column_is_probable_rename() {
    let catalog = altered_catalog(
        ColumnDef::new("FacilityID", "varchar(50)").with_ordinal(2),
        Some(ColumnDef::new("Weight", "int").with_ordinal(3)),
    );
    let report = detect_drift(&shipment_bindings(), &catalog).unwrap();

    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.binding, "Shipment.Location");
    assert_eq!(issue.severity, Severity::Critical);
    assert_eq!(issue.kind, DriftKind::ProbableRename);
    assert_eq!(
        issue.remediation,
        Some(Remediation::Rebind {
            column: "FacilityID".to_string()
        })
    );
    assert_eq!(issue.similarity, Some(1.0));

    let err = report.ensure_no_critical().unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::CriticalDrift);
    assert_eq!(err.candidates(), Some(&["Shipment.Location".to_string()][..]));
}

#[test]
fn test_rename_requires_same_type_family() {
    let catalog = altered_catalog(
        ColumnDef::new("FacilityID", "int").with_ordinal(2),
        Some(ColumnDef::new("Weight", "int").with_ordinal(3)),
    );
    let report = detect_drift(&shipment_bindings(), &catalog).unwrap();
    let issue = report.issues_for("Shipment.Location").next().unwrap();
    assert_eq!(issue.kind, DriftKind::ColumnRemoved);
    assert_eq!(issue.remediation, Some(Remediation::RemoveBinding));
}

#[test]
fn test_removed_column_without_candidate() {
    let report = detect_drift(&shipment_bindings(), &altered_catalog(location_column(), None)).unwrap();
    let issue = report.issues_for("Shipment.Weight").next().unwrap();
    assert_eq!(issue.kind, DriftKind::ColumnRemoved);
    assert_eq!(issue.severity, Severity::Critical);
    assert!(issue.near_match.is_none());
    assert!(issue.similarity.is_none());
}

#[test]
fn test_removed_column_with_near_match() {
    let catalog = altered_catalog(location_column(), Some(ColumnDef::new("Wgt", "int").with_ordinal(3)));
    let report = detect_drift(&shipment_bindings(), &catalog).unwrap();

    let issue = report.issues_for("Shipment.Weight").next().unwrap();
    assert_eq!(issue.kind, DriftKind::ColumnRemoved);
    let near = issue.near_match.as_ref().unwrap();
    assert_eq!(near.key, "Wgt");
    assert_eq!(near.score, 0.5);
}

// ----------------------------------------------------------------------------
// Type and attribute changes
// ----------------------------------------------------------------------------

#[test]
fn test_widening_is_warning() {
    let catalog = altered_catalog(location_column(), Some(ColumnDef::new("Weight", "bigint").with_ordinal(3)));
    let report = detect_drift(&shipment_bindings(), &catalog).unwrap();

    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, DriftKind::TypeWidened);
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(
        issue.remediation,
        Some(Remediation::UpdateTypeMapping {
            new_type: "bigint".to_string()
        })
    );
    assert!(!report.has_critical());
    assert!(report.ensure_no_critical().is_ok());
}

#[test]
fn test_narrowing_and_family_change_are_critical() {
    let catalog = altered_catalog(
        ColumnDef::new("Warehouse_Location", "varchar(20)").with_ordinal(2),
        Some(ColumnDef::new("Weight", "varchar(10)").with_ordinal(3)),
    );
    let report = detect_drift(&shipment_bindings(), &catalog).unwrap();

    assert_eq!(report.count(Severity::Critical), 2);
    assert!(report
        .issues
        .iter()
        .all(|i| i.kind == DriftKind::TypeIncompatible));
}

#[test]
fn test_nullability_change_is_info() {
    let catalog = TableCatalog::new().with_table(
        "dbo.Shipments",
        TableDef::new()
            .with_column(ColumnDef::new("ShipmentID", "int").with_ordinal(1))
            .with_column(location_column())
            .with_column(ColumnDef::new("Weight", "int").with_ordinal(3)),
    );
    let report = detect_drift(&shipment_bindings(), &catalog).unwrap();

    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, DriftKind::AttributeChanged);
    assert_eq!(report.issues[0].severity, Severity::Info);
    assert!(report.issues[0].remediation.is_none());
    assert!(report.ensure_no_critical().is_ok());
}

// ----------------------------------------------------------------------------
// Tables and ordering
// ----------------------------------------------------------------------------

#[test]
fn test_missing_table_flags_every_binding() {
    let report = detect_drift(&shipment_bindings(), &TableCatalog::new()).unwrap();
    assert_eq!(report.issues.len(), 3);
    assert!(report.issues.iter().all(|i| i.kind == DriftKind::TableMissing));
    assert!(report.clean_bindings.is_empty());
}

#[test]
fn test_table_lookup_is_case_insensitive() {
    let bindings = vec![Binding::new("Shipment", "Weight", "DBO.SHIPMENTS", "weight", "int")];
    let report = detect_drift(&bindings, &shipment_catalog()).unwrap();
    assert!(report.issues.is_empty());
}

#[test]
fn test_non_ascii_table_keeps_missing_binding() {
    let bindings = vec![
        Binding::new("Lager", "Nr", "Ärger", "LagerNr", "int"),
        Binding::new("Lager", "Ort", "Ärger", "Warehouse_Location", "varchar(50)"),
    ];
    let catalog = TableCatalog::new().with_table(
        "Ärger",
        TableDef::new()
            .with_column(ColumnDef::new("LagerNr", "int"))
            .with_column(ColumnDef::new("FacilityID", "nvarchar(50)")),
    );

    let report = detect_drift(&bindings, &catalog).unwrap();
    assert_eq!(report.clean_bindings, vec!["Lager.Nr"]);
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.binding, "Lager.Ort");
    assert_eq!(issue.kind, DriftKind::ProbableRename);
    assert_eq!(issue.severity, Severity::Critical);
    assert_eq!(
        issue.remediation,
        Some(Remediation::Rebind {
            column: "FacilityID".to_string()
        })
    );
}

#[test]
fn test_differently_cased_table_names_share_one_rename_search() {
    // `ShipmentID` is bound through one spelling, so it is no rename target for the other
    let bindings = vec![
        Binding::new("Shipment", "ShipmentId", "dbo.Shipments", "ShipmentID", "int"),
        Binding::new("Shipment", "Key", "DBO.SHIPMENTS", "Shipment_Key", "int"),
    ];
    let catalog = TableCatalog::new().with_table(
        "dbo.Shipments",
        TableDef::new().with_column(ColumnDef::new("ShipmentID", "int")),
    );

    let report = detect_drift(&bindings, &catalog).unwrap();
    assert_eq!(report.clean_bindings, vec!["Shipment.ShipmentId"]);
    let issue = report.issues_for("Shipment.Key").next().unwrap();
    assert_eq!(issue.kind, DriftKind::ColumnRemoved);
    assert_eq!(report.issues.len() + report.clean_bindings.len(), bindings.len());
}

#[test]
fn test_issues_ordered_by_severity_then_binding() {
    let catalog = altered_catalog(
        ColumnDef::new("Warehouse_Location", "varchar(100)").with_ordinal(2),
        None,
    );
    let mut bindings = shipment_bindings();
    bindings.push(Binding::new("Returns", "Reason", "dbo.Returns", "Reason", "text"));

    let report = detect_drift(&bindings, &catalog).unwrap();
    let order: Vec<(&str, Severity)> = report
        .issues
        .iter()
        .map(|i| (i.binding.as_str(), i.severity))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Returns.Reason", Severity::Critical),
            ("Shipment.Weight", Severity::Critical),
            ("Shipment.Location", Severity::Warning),
        ]
    );
    assert_eq!(report.clean_bindings, vec!["Shipment.ShipmentId"]);
}

#[test]
fn test_ordinal_weight_blends_into_similarity() {
    let catalog = altered_catalog(
        ColumnDef::new("FacilityID", "varchar(50)").with_ordinal(3),
        None,
    );
    let config = DriftConfig {
        ordinal_weight: 0.5,
        ..DriftConfig::default()
    };
    let report =
        detect_drift_with(&shipment_bindings(), &catalog, &MatchConfig::default(), &config).unwrap();

    let issue = report.issues_for("Shipment.Location").next().unwrap();
    assert_eq!(issue.kind, DriftKind::ProbableRename);
    let score = issue.similarity.unwrap();
    assert!(score < 1.0 && score >= 0.7, "blended score {}", score);
}

// ----------------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------------

#[test]
fn test_duplicate_binding_rejected() {
    let mut bindings = shipment_bindings();
    bindings.push(bindings[0].clone());
    let err = detect_drift(&bindings, &shipment_catalog()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::DuplicateIdentity);
    assert_eq!(err.path(), Some("Shipment.ShipmentId"));
}

#[test]
fn test_malformed_types_rejected() {
    let bindings = vec![Binding::new("Shipment", "Weight", "dbo.Shipments", "Weight", "varchar(abc)")];
    let err = detect_drift(&bindings, &shipment_catalog()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidTypeDescriptor);
    assert_eq!(err.path(), Some("Shipment.Weight"));

    let catalog = TableCatalog::new().with_table(
        "dbo.Shipments",
        TableDef::new().with_column(ColumnDef::new("Weight", "decimal(18,")),
    );
    let err = detect_drift(&shipment_bindings(), &catalog).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidTypeDescriptor);
    assert_eq!(err.path(), Some("dbo.Shipments.Weight"));
}

#[test]
fn test_snapshot_drift_checks_binding_targets() {
    let snapshot = OntologySnapshot::new("logistics", "1").with_entity(
        EntityDef::new("Shipment")
            .with_property(PropertyDef::new("ShipmentId", "int"))
            .with_property(PropertyDef::new("Location", "text"))
            .with_property(PropertyDef::new("Weight", "int")),
    );
    let report = detect_snapshot_drift(&snapshot, &shipment_bindings(), &shipment_catalog()).unwrap();
    assert!(report.issues.is_empty());

    let mut bindings = shipment_bindings();
    bindings.push(Binding::new("Shipment", "Volume", "dbo.Shipments", "Volume", "int"));
    let err = detect_snapshot_drift(&snapshot, &bindings, &shipment_catalog()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::UnknownBindingTarget);
    assert_eq!(err.path(), Some("Shipment.Volume"));
}
