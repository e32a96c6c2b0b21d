//! Cross-snapshot conflict analysis.

#![allow(clippy::result_large_err)]

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde_json::{json, Value};

use crate::debt::model::{DebtConflict, DebtConflictType, DebtPolicy, DebtReport, Recommendation};
use crate::diff::engine::{entity_key, property_key, relationship_key, rule_key};
use crate::errors::Result;
use crate::model::{validate_snapshot, EntityDef, OntologySnapshot, PropertyDef, RuleDef, TypeDescriptor};
use crate::severity::Severity;
use crate::{log_op_end, log_op_error, log_op_start};
use ontogov_core_types::schema::OP_ANALYZE_DEBT;

/// Labelled definitions of one shared name
type Definitions<'a> = BTreeMap<String, Vec<(&'a str, Value)>>;

/// Analyze snapshots under the default policy
///
/// # Errors
///
/// Validation errors of any input snapshot.
pub fn analyze_debt(snapshots: &BTreeMap<String, OntologySnapshot>) -> Result<DebtReport> {
    analyze_debt_with(snapshots, &DebtPolicy::default())
}

/// Analyze snapshots under an explicit policy
///
/// # Errors
///
/// See [`analyze_debt`].
pub fn analyze_debt_with(
    snapshots: &BTreeMap<String, OntologySnapshot>,
    policy: &DebtPolicy,
) -> Result<DebtReport> {
    log_op_start!(OP_ANALYZE_DEBT, snapshot_count = snapshots.len() as u64);
    let start = Instant::now();

    let report = analyze_impl(snapshots, policy).map_err(|e| {
        log_op_error!(
            OP_ANALYZE_DEBT,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        OP_ANALYZE_DEBT,
        duration_ms = start.elapsed().as_millis() as u64,
        conflict_count = report.conflicts.len() as u64,
        critical_count = report.count(Severity::Critical) as u64
    );

    Ok(report)
}

/// Canonical form of a rule expression
///
/// Whitespace is dropped and text is lowercased, except inside `"..."`
/// string literals which are kept verbatim.
pub fn normalize_expression(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    let mut in_literal = false;
    for c in expr.chars() {
        if c == '"' {
            in_literal = !in_literal;
            out.push(c);
        } else if in_literal {
            out.push(c);
        } else if !c.is_whitespace() {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn entity_value(entity: &EntityDef) -> Value {
    let properties: BTreeSet<&str> = entity.properties.iter().map(property_key).collect();
    json!({ "kind": entity.kind.as_str(), "properties": properties })
}

fn type_value(property: &PropertyDef) -> Value {
    let canonical = match TypeDescriptor::parse(&property.data_type) {
        Ok(descriptor) => descriptor.to_string(),
        Err(_) => property.data_type.trim().to_lowercase(),
    };
    Value::String(canonical)
}

/// What a rule computes; the owning entity is bookkeeping, not logic
fn rule_logic_value(rule: &RuleDef) -> Value {
    json!({
        "condition": normalize_expression(&rule.condition),
        "action": normalize_expression(&rule.action),
        "formula": rule.formula().map(normalize_expression),
    })
}

fn rule_meta_value(rule: &RuleDef) -> Value {
    json!({
        "entity": rule.entity,
        "classification": rule.classification,
        "priority": rule.priority,
    })
}

/// Labels grouped by identical definition
fn variants<'a>(entries: &[(&'a str, Value)]) -> BTreeMap<String, Vec<&'a str>> {
    let mut out: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
    for (label, value) in entries {
        out.entry(value.to_string()).or_default().push(*label);
    }
    out
}

/// Majority definition's first label; ties go to the lexicographically first label
fn preferred_label<'a>(variants: &BTreeMap<String, Vec<&'a str>>) -> Option<&'a str> {
    variants
        .values()
        .filter_map(|labels| labels.iter().min().map(|first| (labels.len(), *first)))
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, label)| label)
}

fn judge(
    name: &str,
    conflict_type: DebtConflictType,
    entries: &[(&str, Value)],
    policy: &DebtPolicy,
) -> Option<DebtConflict> {
    if entries.len() < 2 {
        return None;
    }
    let variants = variants(entries);
    if variants.len() < 2 {
        return None;
    }
    let preferred = preferred_label(&variants)?;

    let mut snapshots: Vec<String> = entries.iter().map(|(l, _)| l.to_string()).collect();
    snapshots.sort();
    Some(DebtConflict {
        name: name.to_string(),
        conflict_type,
        severity: policy.severity_for(conflict_type),
        description: format!(
            "{} '{}' has {} different definitions across {} snapshots",
            conflict_type.as_str().to_lowercase(),
            name,
            variants.len(),
            snapshots.len()
        ),
        snapshots,
        definitions: entries
            .iter()
            .map(|(l, v)| (l.to_string(), v.clone()))
            .collect(),
        recommendation: Recommendation::Canonicalize {
            preferred: preferred.to_string(),
        },
    })
}

/// Every pair of contributors has non-empty, non-overlapping property sets
fn pairwise_disjoint(entities: &[&EntityDef]) -> bool {
    let sets: Vec<BTreeSet<&str>> = entities
        .iter()
        .map(|e| e.properties.iter().map(property_key).collect())
        .collect();
    if sets.iter().any(BTreeSet::is_empty) {
        return false;
    }
    sets.iter()
        .enumerate()
        .all(|(i, a)| sets[i + 1..].iter().all(|b| a.is_disjoint(b)))
}

fn entity_conflicts(
    snapshots: &BTreeMap<String, OntologySnapshot>,
    policy: &DebtPolicy,
) -> Vec<DebtConflict> {
    let mut shared: BTreeMap<&str, Vec<(&str, &EntityDef)>> = BTreeMap::new();
    for (label, snapshot) in snapshots {
        for entity in &snapshot.entities {
            shared
                .entry(entity_key(entity))
                .or_default()
                .push((label.as_str(), entity));
        }
    }

    let mut out = Vec::new();
    for (name, group) in shared {
        let entries: Vec<(&str, Value)> = group.iter().map(|(l, e)| (*l, entity_value(e))).collect();
        let Some(mut conflict) = judge(name, DebtConflictType::Entity, &entries, policy) else {
            continue;
        };
        let members: Vec<&EntityDef> = group.iter().map(|(_, e)| *e).collect();
        if pairwise_disjoint(&members) {
            conflict.severity = Severity::Info;
            conflict.recommendation = Recommendation::Rename;
            conflict.description = format!(
                "entity '{}' names unrelated concepts in {} snapshots",
                name,
                conflict.snapshots.len()
            );
        }
        out.push(conflict);
    }
    out
}

fn type_conflicts(
    snapshots: &BTreeMap<String, OntologySnapshot>,
    policy: &DebtPolicy,
) -> Vec<DebtConflict> {
    let mut shared: Definitions<'_> = BTreeMap::new();
    for (label, snapshot) in snapshots {
        for entity in &snapshot.entities {
            for property in &entity.properties {
                shared
                    .entry(format!("{}.{}", entity_key(entity), property_key(property)))
                    .or_default()
                    .push((label.as_str(), type_value(property)));
            }
        }
    }
    shared
        .iter()
        .filter_map(|(path, entries)| judge(path, DebtConflictType::Type, entries, policy))
        .collect()
}

fn relationship_conflicts(
    snapshots: &BTreeMap<String, OntologySnapshot>,
    policy: &DebtPolicy,
) -> Vec<DebtConflict> {
    let mut shared: Definitions<'_> = BTreeMap::new();
    for (label, snapshot) in snapshots {
        for rel in &snapshot.relationships {
            let value = json!({
                "source": rel.source_entity,
                "target": rel.target_entity,
                "cardinality": rel.cardinality.as_str(),
            });
            shared
                .entry(relationship_key(rel).to_string())
                .or_default()
                .push((label.as_str(), value));
        }
    }
    shared
        .iter()
        .filter_map(|(name, entries)| judge(name, DebtConflictType::Relationship, entries, policy))
        .collect()
}

/// Logic differences win over classification differences for the same rule
fn rule_conflicts(
    snapshots: &BTreeMap<String, OntologySnapshot>,
    policy: &DebtPolicy,
) -> Vec<DebtConflict> {
    let mut shared: BTreeMap<&str, Vec<(&str, &RuleDef)>> = BTreeMap::new();
    for (label, snapshot) in snapshots {
        for rule in &snapshot.rules {
            shared
                .entry(rule_key(rule))
                .or_default()
                .push((label.as_str(), rule));
        }
    }

    let mut out = Vec::new();
    for (name, group) in shared {
        let logic: Vec<(&str, Value)> = group.iter().map(|(l, r)| (*l, rule_logic_value(r))).collect();
        if let Some(conflict) = judge(name, DebtConflictType::Measure, &logic, policy) {
            out.push(conflict);
            continue;
        }
        let meta: Vec<(&str, Value)> = group.iter().map(|(l, r)| (*l, rule_meta_value(r))).collect();
        out.extend(judge(name, DebtConflictType::Rule, &meta, policy));
    }
    out
}

fn recommendations(report: &DebtReport) -> Vec<String> {
    let mut out = Vec::new();
    let critical = report.count(Severity::Critical);
    if critical > 0 {
        out.push(format!(
            "Resolve {} critical conflict(s) before relying on shared measures or relationships",
            critical
        ));
    }
    if report.count_of(DebtConflictType::Type) > 0 {
        out.push("Standardize property types in a shared data dictionary".to_string());
    }
    if report.count_of(DebtConflictType::Entity) > 0 {
        out.push("Derive snapshots from a common master ontology".to_string());
    }
    if report.count_of(DebtConflictType::Measure) + report.count_of(DebtConflictType::Rule) > 0 {
        out.push("Keep measures and business rules in a single source of truth".to_string());
    }
    if report.count(Severity::Warning) > 3 {
        out.push("Schedule a cross-team semantic alignment review".to_string());
    }
    out
}

fn analyze_impl(
    snapshots: &BTreeMap<String, OntologySnapshot>,
    policy: &DebtPolicy,
) -> Result<DebtReport> {
    for snapshot in snapshots.values() {
        validate_snapshot(snapshot)?;
    }

    let mut report = DebtReport {
        snapshots_analyzed: snapshots.keys().cloned().collect(),
        cost_per_conflict: policy.cost_per_conflict,
        ..DebtReport::default()
    };
    if snapshots.len() < 2 {
        return Ok(report);
    }

    let mut conflicts = entity_conflicts(snapshots, policy);
    conflicts.extend(type_conflicts(snapshots, policy));
    conflicts.extend(relationship_conflicts(snapshots, policy));
    conflicts.extend(rule_conflicts(snapshots, policy));
    conflicts.sort_by(|a, b| {
        (Reverse(a.severity), a.conflict_type, &a.name).cmp(&(Reverse(b.severity), b.conflict_type, &b.name))
    });

    for conflict in &conflicts {
        *report.by_severity.entry(conflict.severity).or_insert(0) += 1;
        *report.by_type.entry(conflict.conflict_type).or_insert(0) += 1;
    }
    report.estimated_cost = conflicts.len() as f64 * policy.cost_per_conflict;
    report.conflicts = conflicts;
    report.recommendations = recommendations(&report);

    Ok(report)
}
