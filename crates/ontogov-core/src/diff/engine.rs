//! Snapshot diff computation engine.
//!
//! [`diff`] validates both snapshots, aligns every element collection by
//! identity (falling back to rename matching for leftovers) and turns the
//! alignment into ordered [`DiffEntry`] values. [`align_snapshots`] exposes
//! the alignment itself for the merge engine.

#![allow(clippy::result_large_err)]

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde_json::Value;

use crate::diff::model::{ChangeCounts, ChangeType, DiffEntry, DiffReport, ElementType, FieldChange};
use crate::errors::{ExError, ExErrorKind, Result};
use crate::matching::{best_pairs, MatchConfig, NearMatch};
use crate::model::digest::content_digest;
use crate::model::{validate_snapshot, EntityDef, OntologySnapshot, PropertyDef, RelationshipDef, RuleDef};
use crate::{log_op_end, log_op_error, log_op_start};
use ontogov_core_types::schema::OP_DIFF;

/// Pairing of one element collection between an old and a new snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aligned {
    /// `(old index, new index, rename score)`; the score is `None` when the
    /// identities are equal
    pub matched: Vec<(usize, usize, Option<f64>)>,
    pub removed: Vec<(usize, Option<NearMatch>)>,
    pub added: Vec<(usize, Option<NearMatch>)>,
}

impl Aligned {
    pub fn new_index_of(&self, old: usize) -> Option<usize> {
        self.matched.iter().find(|m| m.0 == old).map(|m| m.1)
    }

    pub fn old_index_of(&self, new: usize) -> Option<usize> {
        self.matched.iter().find(|m| m.1 == new).map(|m| m.0)
    }

    pub fn rename_score(&self, old: usize) -> Option<f64> {
        self.matched.iter().find(|m| m.0 == old).and_then(|m| m.2)
    }
}

/// Alignment of two whole snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub entities: Aligned,
    /// Property alignment per matched entity pair `(old index, new index)`
    pub properties: BTreeMap<(usize, usize), Aligned>,
    pub relationships: Aligned,
    pub rules: Aligned,
    /// Indices refer to metadata keys in sorted order
    pub metadata: Aligned,
}

pub(crate) fn entity_key(e: &EntityDef) -> &str {
    &e.name
}

pub(crate) fn property_key(p: &PropertyDef) -> &str {
    &p.name
}

pub(crate) fn relationship_key(r: &RelationshipDef) -> &str {
    &r.name
}

pub(crate) fn rule_key(r: &RuleDef) -> &str {
    &r.name
}

fn metadata_key<'a>(m: &'a (&String, &Value)) -> &'a str {
    m.0.as_str()
}

/// Exact identity matches first, then rename matching over the leftovers
fn align_by<T, S>(
    old: &[T],
    new: &[T],
    key: fn(&T) -> &str,
    config: &MatchConfig,
    score: S,
) -> Aligned
where
    S: Fn(&T, &T) -> Option<f64>,
{
    let new_index: BTreeMap<&str, usize> =
        new.iter().enumerate().map(|(i, t)| (key(t), i)).collect();

    let mut matched = Vec::new();
    let mut new_taken = vec![false; new.len()];
    let mut removed_idx = Vec::new();
    for (oi, o) in old.iter().enumerate() {
        match new_index.get(key(o)) {
            Some(&ni) => {
                matched.push((oi, ni, None));
                new_taken[ni] = true;
            }
            None => removed_idx.push(oi),
        }
    }
    let added_idx: Vec<usize> = (0..new.len()).filter(|i| !new_taken[*i]).collect();

    let removed_c: Vec<(&str, &T)> = removed_idx.iter().map(|&i| (key(&old[i]), &old[i])).collect();
    let added_c: Vec<(&str, &T)> = added_idx.iter().map(|&i| (key(&new[i]), &new[i])).collect();
    let pairing = best_pairs(&removed_c, &added_c, config, |r, a| score(*r, *a));

    for pair in &pairing.pairs {
        matched.push((removed_idx[pair.removed], added_idx[pair.added], Some(pair.score)));
    }
    matched.sort_by_key(|m| m.0);

    Aligned {
        matched,
        removed: pairing
            .unmatched_removed
            .into_iter()
            .map(|(i, near)| (removed_idx[i], near))
            .collect(),
        added: pairing
            .unmatched_added
            .into_iter()
            .map(|(i, near)| (added_idx[i], near))
            .collect(),
    }
}

/// Align two snapshots without validating them
pub(crate) fn align(old: &OntologySnapshot, new: &OntologySnapshot, config: &MatchConfig) -> Alignment {
    let entities = align_by(&old.entities, &new.entities, entity_key, config, |a, b| {
        config.entity_score(a, b)
    });

    let properties = entities
        .matched
        .iter()
        .map(|&(oi, ni, _)| {
            let aligned = align_by(
                &old.entities[oi].properties,
                &new.entities[ni].properties,
                property_key,
                config,
                |a, b| config.property_score(a, b),
            );
            ((oi, ni), aligned)
        })
        .collect();

    let relationships = align_by(
        &old.relationships,
        &new.relationships,
        relationship_key,
        config,
        |a, b| config.relationship_score(a, b),
    );
    let rules = align_by(&old.rules, &new.rules, rule_key, config, |a, b| {
        config.rule_score(a, b)
    });

    let old_meta: Vec<(&String, &Value)> = old.metadata.iter().collect();
    let new_meta: Vec<(&String, &Value)> = new.metadata.iter().collect();
    let metadata = align_by(&old_meta, &new_meta, metadata_key, config, |a, b| {
        config.metadata_score((a.0.as_str(), a.1), (b.0.as_str(), b.1))
    });

    Alignment {
        entities,
        properties,
        relationships,
        rules,
        metadata,
    }
}

/// Validate both snapshots and align every element collection
///
/// # Errors
///
/// Validation errors from [`validate_snapshot`] for either input.
pub fn align_snapshots(
    old: &OntologySnapshot,
    new: &OntologySnapshot,
    config: &MatchConfig,
) -> Result<Alignment> {
    validate_snapshot(old)?;
    validate_snapshot(new)?;
    Ok(align(old, new, config))
}

/// Entity value compared by the diff: everything except its properties
pub(crate) fn entity_header_value(entity: &EntityDef) -> Result<Value> {
    let mut value = serde_json::to_value(entity.header())?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("properties");
    }
    Ok(value)
}

fn field_changes(before: &Value, after: &Value) -> Vec<FieldChange> {
    match (before.as_object(), after.as_object()) {
        (Some(b), Some(a)) => {
            let keys: BTreeSet<&String> = b.keys().chain(a.keys()).collect();
            keys.into_iter()
                .filter_map(|k| {
                    let bv = b.get(k).unwrap_or(&Value::Null);
                    let av = a.get(k).unwrap_or(&Value::Null);
                    (bv != av).then(|| FieldChange {
                        field: k.clone(),
                        before: bv.clone(),
                        after: av.clone(),
                    })
                })
                .collect()
        }
        _ if before != after => vec![FieldChange {
            field: "value".to_string(),
            before: before.clone(),
            after: after.clone(),
        }],
        _ => Vec::new(),
    }
}

fn compared(
    element: ElementType,
    path: String,
    renamed_to: Option<String>,
    similarity: Option<f64>,
    before: Value,
    after: Value,
) -> DiffEntry {
    let field_changes = field_changes(&before, &after);
    let change = if renamed_to.is_some() || !field_changes.is_empty() {
        ChangeType::Modified
    } else {
        ChangeType::Unchanged
    };
    DiffEntry {
        element,
        change,
        path,
        renamed_to,
        before: Some(before),
        after: Some(after),
        field_changes,
        similarity,
        near_match: None,
    }
}

fn one_sided(
    element: ElementType,
    change: ChangeType,
    path: String,
    value: Value,
    near_match: Option<NearMatch>,
) -> DiffEntry {
    let (before, after) = match change {
        ChangeType::Added => (None, Some(value)),
        _ => (Some(value), None),
    };
    DiffEntry {
        element,
        change,
        path,
        renamed_to: None,
        before,
        after,
        field_changes: Vec::new(),
        similarity: None,
        near_match,
    }
}

fn entity_one_sided(
    entity: &EntityDef,
    change: ChangeType,
    near: Option<NearMatch>,
    entries: &mut Vec<DiffEntry>,
) -> Result<()> {
    entries.push(one_sided(
        ElementType::Entity,
        change,
        entity.name.clone(),
        entity_header_value(entity)?,
        near,
    ));
    for property in &entity.properties {
        entries.push(one_sided(
            ElementType::Property,
            change,
            format!("{}.{}", entity.name, property.name),
            serde_json::to_value(property)?,
            None,
        ));
    }
    Ok(())
}

/// Entries for a flat collection (relationships, rules)
fn collection_entries<T: serde::Serialize>(
    element: ElementType,
    old: &[T],
    new: &[T],
    aligned: &Aligned,
    path_of: impl Fn(&T) -> String,
    entries: &mut Vec<DiffEntry>,
) -> Result<()> {
    for &(oi, ni, score) in &aligned.matched {
        let renamed_to = score.map(|_| path_of(&new[ni]));
        entries.push(compared(
            element,
            path_of(&old[oi]),
            renamed_to,
            score,
            serde_json::to_value(&old[oi])?,
            serde_json::to_value(&new[ni])?,
        ));
    }
    for (oi, near) in &aligned.removed {
        entries.push(one_sided(
            element,
            ChangeType::Removed,
            path_of(&old[*oi]),
            serde_json::to_value(&old[*oi])?,
            near.clone(),
        ));
    }
    for (ni, near) in &aligned.added {
        entries.push(one_sided(
            element,
            ChangeType::Added,
            path_of(&new[*ni]),
            serde_json::to_value(&new[*ni])?,
            near.clone(),
        ));
    }
    Ok(())
}

fn build_entries(
    old: &OntologySnapshot,
    new: &OntologySnapshot,
    alignment: &Alignment,
) -> Result<Vec<DiffEntry>> {
    let mut entries = Vec::new();

    for &(oi, ni, score) in &alignment.entities.matched {
        let (oe, ne) = (&old.entities[oi], &new.entities[ni]);
        entries.push(compared(
            ElementType::Entity,
            oe.name.clone(),
            score.map(|_| ne.name.clone()),
            score,
            entity_header_value(oe)?,
            entity_header_value(ne)?,
        ));

        let Some(props) = alignment.properties.get(&(oi, ni)) else {
            continue;
        };
        for &(po, pn, pscore) in &props.matched {
            let (op, np) = (&oe.properties[po], &ne.properties[pn]);
            entries.push(compared(
                ElementType::Property,
                format!("{}.{}", oe.name, op.name),
                pscore.map(|_| format!("{}.{}", ne.name, np.name)),
                pscore,
                serde_json::to_value(op)?,
                serde_json::to_value(np)?,
            ));
        }
        for (po, near) in &props.removed {
            let op = &oe.properties[*po];
            entries.push(one_sided(
                ElementType::Property,
                ChangeType::Removed,
                format!("{}.{}", oe.name, op.name),
                serde_json::to_value(op)?,
                near.clone().map(|n| NearMatch {
                    key: format!("{}.{}", ne.name, n.key),
                    score: n.score,
                }),
            ));
        }
        for (pn, near) in &props.added {
            let np = &ne.properties[*pn];
            entries.push(one_sided(
                ElementType::Property,
                ChangeType::Added,
                format!("{}.{}", ne.name, np.name),
                serde_json::to_value(np)?,
                near.clone().map(|n| NearMatch {
                    key: format!("{}.{}", oe.name, n.key),
                    score: n.score,
                }),
            ));
        }
    }
    for (oi, near) in &alignment.entities.removed {
        entity_one_sided(&old.entities[*oi], ChangeType::Removed, near.clone(), &mut entries)?;
    }
    for (ni, near) in &alignment.entities.added {
        entity_one_sided(&new.entities[*ni], ChangeType::Added, near.clone(), &mut entries)?;
    }

    collection_entries(
        ElementType::Relationship,
        &old.relationships,
        &new.relationships,
        &alignment.relationships,
        |r| format!("relationship:{}", r.name),
        &mut entries,
    )?;
    collection_entries(
        ElementType::Rule,
        &old.rules,
        &new.rules,
        &alignment.rules,
        |r| format!("rule:{}", r.name),
        &mut entries,
    )?;

    let old_meta: Vec<(&String, &Value)> = old.metadata.iter().collect();
    let new_meta: Vec<(&String, &Value)> = new.metadata.iter().collect();
    let meta_path = |k: &str| format!("metadata:{}", k);
    for &(oi, ni, score) in &alignment.metadata.matched {
        entries.push(compared(
            ElementType::Metadata,
            meta_path(old_meta[oi].0.as_str()),
            score.map(|_| meta_path(new_meta[ni].0.as_str())),
            score,
            old_meta[oi].1.clone(),
            new_meta[ni].1.clone(),
        ));
    }
    for (oi, near) in &alignment.metadata.removed {
        entries.push(one_sided(
            ElementType::Metadata,
            ChangeType::Removed,
            meta_path(old_meta[*oi].0.as_str()),
            old_meta[*oi].1.clone(),
            near.clone(),
        ));
    }
    for (ni, near) in &alignment.metadata.added {
        entries.push(one_sided(
            ElementType::Metadata,
            ChangeType::Added,
            meta_path(new_meta[*ni].0.as_str()),
            new_meta[*ni].1.clone(),
            near.clone(),
        ));
    }

    entries.sort_by(|a, b| {
        (a.element.group_rank(), &a.path).cmp(&(b.element.group_rank(), &b.path))
    });

    let mut seen = BTreeSet::new();
    for entry in &entries {
        if !seen.insert(entry.path.as_str()) {
            return Err(ExError::new(ExErrorKind::Internal)
                .with_op(OP_DIFF)
                .with_path(entry.path.clone())
                .with_message("diff produced two entries for one identity path"));
        }
    }

    Ok(entries)
}

pub(crate) fn diff_impl(
    old: &OntologySnapshot,
    new: &OntologySnapshot,
    config: &MatchConfig,
) -> Result<DiffReport> {
    let alignment = align_snapshots(old, new, config)?;
    let entries = build_entries(old, new, &alignment)?;

    let mut counts: BTreeMap<ElementType, ChangeCounts> = BTreeMap::new();
    let mut totals = ChangeCounts::default();
    for entry in &entries {
        counts.entry(entry.element).or_default().record(entry.change);
        totals.record(entry.change);
    }

    Ok(DiffReport {
        diff_schema_version: 1,
        old_name: old.name.clone(),
        old_version: old.version.clone(),
        new_name: new.name.clone(),
        new_version: new.version.clone(),
        old_digest: content_digest(old)?,
        new_digest: content_digest(new)?,
        entries,
        counts,
        totals,
    })
}

/// Diff two snapshots with the default matching configuration
///
/// # Errors
///
/// Validation errors (`ERR_DUPLICATE_IDENTITY`, `ERR_INVALID_INPUT`,
/// `ERR_INVALID_TYPE_DESCRIPTOR`) for either input.
pub fn diff(old: &OntologySnapshot, new: &OntologySnapshot) -> Result<DiffReport> {
    diff_with(old, new, &MatchConfig::default())
}

/// Diff two snapshots with explicit matching thresholds
///
/// # Errors
///
/// See [`diff`].
pub fn diff_with(
    old: &OntologySnapshot,
    new: &OntologySnapshot,
    config: &MatchConfig,
) -> Result<DiffReport> {
    log_op_start!(
        OP_DIFF,
        old_snapshot = old.name.as_str(),
        new_snapshot = new.name.as_str()
    );
    let start = Instant::now();

    let report = diff_impl(old, new, config).map_err(|e| {
        log_op_error!(
            OP_DIFF,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        OP_DIFF,
        duration_ms = start.elapsed().as_millis() as u64,
        entry_count = report.entries.len() as u64,
        change_count = report.totals.changed() as u64
    );

    Ok(report)
}
