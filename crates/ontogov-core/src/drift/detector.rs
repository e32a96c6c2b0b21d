//! Drift classification.

#![allow(clippy::result_large_err)]

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::drift::model::{DriftIssue, DriftKind, DriftReport, Remediation};
use crate::errors::{GovernanceError, Result};
use crate::matching::{best_pairs, MatchConfig};
use crate::model::{
    validate_snapshot, Binding, ColumnDef, OntologySnapshot, TableCatalog, TableDef, TypeChange,
    TypeDescriptor,
};
use crate::severity::Severity;
use crate::{log_op_end, log_op_error, log_op_start};
use ontogov_core_types::schema::OP_DETECT_DRIFT;

/// Drift detector tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Weight of ordinal proximity in the rename score (0 disables)
    pub ordinal_weight: f64,

    /// Report nullability/default differences as `AttributeChanged`
    pub check_attributes: bool,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            ordinal_weight: 0.0,
            check_attributes: true,
        }
    }
}

/// Detect drift with default matching and drift settings
///
/// # Errors
///
/// - `ERR_DUPLICATE_IDENTITY` when two bindings share an `Entity.Property`
/// - `ERR_INVALID_TYPE_DESCRIPTOR` for malformed binding or column types
pub fn detect_drift(bindings: &[Binding], catalog: &TableCatalog) -> Result<DriftReport> {
    detect_drift_with(bindings, catalog, &MatchConfig::default(), &DriftConfig::default())
}

/// Validate bindings against a snapshot, then detect drift
///
/// # Errors
///
/// Snapshot validation errors, `ERR_UNKNOWN_BINDING_TARGET` for bindings
/// naming an entity or property absent from `snapshot`, and the errors of
/// [`detect_drift`].
pub fn detect_snapshot_drift(
    snapshot: &OntologySnapshot,
    bindings: &[Binding],
    catalog: &TableCatalog,
) -> Result<DriftReport> {
    validate_snapshot(snapshot)?;
    for binding in bindings {
        let target = match snapshot.entity(&binding.entity) {
            None => Some(format!("entity {}", binding.entity)),
            Some(entity) if entity.property(&binding.property).is_none() => {
                Some(format!("property {}", binding.id()))
            }
            Some(_) => None,
        };
        if let Some(target) = target {
            return Err(GovernanceError::UnknownBindingTarget {
                binding: binding.id(),
                target,
            }
            .into());
        }
    }
    detect_drift(bindings, catalog)
}

/// Detect drift with explicit settings
///
/// # Errors
///
/// See [`detect_drift`].
pub fn detect_drift_with(
    bindings: &[Binding],
    catalog: &TableCatalog,
    matching: &MatchConfig,
    config: &DriftConfig,
) -> Result<DriftReport> {
    log_op_start!(OP_DETECT_DRIFT, binding_count = bindings.len() as u64);
    let start = Instant::now();

    let report = detect_impl(bindings, catalog, matching, config).map_err(|e| {
        log_op_error!(
            OP_DETECT_DRIFT,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        OP_DETECT_DRIFT,
        duration_ms = start.elapsed().as_millis() as u64,
        issue_count = report.issues.len() as u64,
        critical_count = report.count(Severity::Critical) as u64
    );

    Ok(report)
}

fn validate_inputs(bindings: &[Binding], catalog: &TableCatalog) -> Result<()> {
    let mut seen = BTreeSet::new();
    for binding in bindings {
        let id = binding.id();
        if !seen.insert(id.clone()) {
            return Err(GovernanceError::DuplicateIdentity {
                snapshot: "bindings".to_string(),
                path: id,
            }
            .into());
        }
        TypeDescriptor::parse_at(&binding.physical_type, &id)?;
    }
    for (table_name, table) in &catalog.tables {
        for column in &table.columns {
            TypeDescriptor::parse_at(&column.data_type, &format!("{}.{}", table_name, column.name))?;
        }
    }
    Ok(())
}

fn issue(
    binding: &Binding,
    severity: Severity,
    kind: DriftKind,
    description: String,
    remediation: Option<Remediation>,
) -> DriftIssue {
    DriftIssue {
        binding: binding.id(),
        table: binding.table.clone(),
        column: binding.column.clone(),
        severity,
        kind,
        description,
        remediation,
        similarity: None,
        near_match: None,
    }
}

/// Issue for a binding whose column is still present
fn check_present(
    binding: &Binding,
    column: &ColumnDef,
    config: &DriftConfig,
) -> Result<Option<DriftIssue>> {
    let bound = TypeDescriptor::parse_at(&binding.physical_type, &binding.id())?;
    let actual = TypeDescriptor::parse_at(&column.data_type, &binding.id())?;

    let (severity, kind, verb) = match bound.change_to(&actual) {
        TypeChange::Same => (None, DriftKind::AttributeChanged, ""),
        TypeChange::Widened => (Some(Severity::Warning), DriftKind::TypeWidened, "widened"),
        TypeChange::Narrowed => (Some(Severity::Critical), DriftKind::TypeIncompatible, "narrowed"),
        TypeChange::Incompatible => (Some(Severity::Critical), DriftKind::TypeIncompatible, "changed"),
    };
    if let Some(severity) = severity {
        return Ok(Some(issue(
            binding,
            severity,
            kind,
            format!(
                "{}.{} {} from {} to {}",
                binding.table, column.name, verb, binding.physical_type, column.data_type
            ),
            Some(Remediation::UpdateTypeMapping {
                new_type: column.data_type.clone(),
            }),
        )));
    }

    if !config.check_attributes {
        return Ok(None);
    }
    let mut changed = Vec::new();
    if let Some(expected) = binding.nullable {
        if expected != column.nullable {
            changed.push(format!("nullable {} -> {}", expected, column.nullable));
        }
    }
    if let Some(expected) = &binding.default {
        if Some(expected) != column.default.as_ref() {
            changed.push(format!(
                "default {} -> {}",
                expected,
                column.default.as_deref().unwrap_or("none")
            ));
        }
    }
    if changed.is_empty() {
        return Ok(None);
    }
    Ok(Some(issue(
        binding,
        Severity::Info,
        DriftKind::AttributeChanged,
        format!("{}.{}: {}", binding.table, column.name, changed.join(", ")),
        None,
    )))
}

fn ordinal_proximity(binding: &Binding, column: &ColumnDef, width: usize) -> Option<f64> {
    let (a, b) = (binding.ordinal?, column.ordinal?);
    let span = width.max(1) as f64;
    Some((1.0 - (f64::from(a) - f64::from(b)).abs() / span).max(0.0))
}

/// Rename search for the bindings of one table whose columns vanished
fn check_missing(
    missing: &[&Binding],
    table: &TableDef,
    bound_columns: &BTreeSet<&str>,
    matching: &MatchConfig,
    config: &DriftConfig,
) -> Result<Vec<DriftIssue>> {
    let unbound: Vec<(&str, &ColumnDef)> = table
        .columns
        .iter()
        .filter(|c| !bound_columns.contains(c.name.as_str()))
        .map(|c| (c.name.as_str(), c))
        .collect();
    let removed: Vec<(&str, &Binding)> = missing.iter().map(|b| (b.column.as_str(), *b)).collect();

    let width = table.columns.len();
    let pairing = best_pairs(&removed, &unbound, matching, |binding, column| {
        let bound = TypeDescriptor::parse(&binding.physical_type).ok()?;
        let actual = TypeDescriptor::parse(&column.data_type).ok()?;
        if !bound.same_family(&actual) {
            return None;
        }
        let name = matching.name_similarity(&binding.column, &column.name);
        Some(match ordinal_proximity(binding, column, width) {
            Some(ordinal) if config.ordinal_weight > 0.0 => {
                (1.0 - config.ordinal_weight) * name + config.ordinal_weight * ordinal
            }
            _ => name,
        })
    });

    let mut issues = Vec::new();
    for pair in &pairing.pairs {
        let binding = removed[pair.removed].1;
        let column = unbound[pair.added].1;
        let mut found = issue(
            binding,
            Severity::Critical,
            DriftKind::ProbableRename,
            format!(
                "{}.{} no longer exists; {} looks like its rename",
                binding.table, binding.column, column.name
            ),
            Some(Remediation::Rebind {
                column: column.name.clone(),
            }),
        );
        found.similarity = Some(pair.score);
        issues.push(found);
    }
    for (idx, near) in &pairing.unmatched_removed {
        let binding = removed[*idx].1;
        let mut found = issue(
            binding,
            Severity::Critical,
            DriftKind::ColumnRemoved,
            format!("{}.{} no longer exists", binding.table, binding.column),
            Some(Remediation::RemoveBinding),
        );
        found.near_match = near.clone();
        issues.push(found);
    }
    Ok(issues)
}

fn detect_impl(
    bindings: &[Binding],
    catalog: &TableCatalog,
    matching: &MatchConfig,
    config: &DriftConfig,
) -> Result<DriftReport> {
    validate_inputs(bindings, catalog)?;

    let mut issues = Vec::new();
    let mut clean = Vec::new();
    // Keyed by the catalog's own table key so every binding lands in one group
    let mut missing: BTreeMap<&str, (&TableDef, Vec<&Binding>)> = BTreeMap::new();
    let mut bound: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for binding in bindings {
        let Some((table_key, table)) = catalog.resolve(&binding.table) else {
            issues.push(issue(
                binding,
                Severity::Critical,
                DriftKind::TableMissing,
                format!("table {} no longer exists", binding.table),
                Some(Remediation::RemoveBinding),
            ));
            continue;
        };
        match table.column(&binding.column) {
            Some(column) => {
                bound.entry(table_key).or_default().insert(column.name.as_str());
                match check_present(binding, column, config)? {
                    Some(found) => issues.push(found),
                    None => clean.push(binding.id()),
                }
            }
            None => missing
                .entry(table_key)
                .or_insert_with(|| (table, Vec::new()))
                .1
                .push(binding),
        }
    }

    let no_columns = BTreeSet::new();
    for (table_key, (table, table_missing)) in &missing {
        let bound_columns = bound.get(table_key).unwrap_or(&no_columns);
        issues.extend(check_missing(table_missing, table, bound_columns, matching, config)?);
    }

    Ok(DriftReport::new(issues, clean))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipments() -> TableDef {
        TableDef::new()
            .with_column(ColumnDef::new("ShipmentID", "int").not_null().with_ordinal(1))
            .with_column(ColumnDef::new("FacilityID", "int").with_ordinal(2))
    }

    #[test]
    fn test_ordinal_proximity() {
        let b = Binding::new("S", "W", "t", "W", "int").with_ordinal(2);
        let c = ColumnDef::new("F", "int").with_ordinal(2);
        assert_eq!(ordinal_proximity(&b, &c, 4), Some(1.0));
        let far = ColumnDef::new("F", "int").with_ordinal(6);
        assert_eq!(ordinal_proximity(&b, &far, 4), Some(0.0));
        assert_eq!(ordinal_proximity(&b, &ColumnDef::new("F", "int"), 4), None);
    }

    #[test]
    fn test_attribute_change_is_info() {
        let binding = Binding::new("Shipment", "ShipmentID", "dbo.Shipments", "ShipmentID", "int")
            .with_nullable(true);
        let table = shipments();
        let column = table.column("ShipmentID").unwrap();
        let found = check_present(&binding, column, &DriftConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(found.kind, DriftKind::AttributeChanged);
        assert_eq!(found.severity, Severity::Info);

        let quiet = DriftConfig {
            check_attributes: false,
            ..DriftConfig::default()
        };
        assert!(check_present(&binding, column, &quiet).unwrap().is_none());
    }

    #[test]
    fn test_type_gate_blocks_rename() {
        let binding = Binding::new("Shipment", "Warehouse_Location", "dbo.Shipments", "Warehouse_Location", "varchar(50)");
        let table = shipments();
        let bound = BTreeSet::from(["ShipmentID"]);
        let issues = check_missing(
            &[&binding],
            &table,
            &bound,
            &MatchConfig::default(),
            &DriftConfig::default(),
        )
        .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, DriftKind::ColumnRemoved);
        assert!(issues[0].near_match.is_none());
    }
}
