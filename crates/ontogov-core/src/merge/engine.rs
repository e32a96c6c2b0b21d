//! Three-way merge computation.
//!
//! Each element collection is merged slot by slot. A slot is anchored either
//! on a base element (index) or on an added name; anchors drive the final
//! ordering and keep one element per identity.

#![allow(clippy::result_large_err)]

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::diff::engine::{align, diff_impl, entity_key, property_key, relationship_key, rule_key};
use crate::diff::{Aligned, Alignment, ElementType};
use crate::errors::{ExError, ExErrorKind, Result};
use crate::matching::MatchConfig;
use crate::merge::model::{
    ConflictKind, MergeConflict, MergeOutcome, MergeStrategy, Resolution, Resolutions,
};
use crate::model::{validate_snapshot, EntityDef, OntologySnapshot, PropertyDef};
use crate::{log_op_end, log_op_error, log_op_start};
use ontogov_core_types::schema::OP_MERGE;

/// Which side a merged element's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Base,
    Ours,
    Theirs,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Anchor {
    Base(usize),
    Added(String),
}

struct Slot<T> {
    anchor: Anchor,
    item: T,
    origin: Origin,
}

struct MergeCtx<'r> {
    strategy: MergeStrategy,
    resolutions: &'r Resolutions,
    conflicts: Vec<MergeConflict>,
}

impl MergeCtx<'_> {
    /// Explicit resolution for `path`, else the strategy's default
    fn choose(&self, path: &str) -> Option<Resolution> {
        if let Some(resolution) = self.resolutions.get(path) {
            return Some(*resolution);
        }
        match self.strategy {
            MergeStrategy::Ours => Some(Resolution::Ours),
            MergeStrategy::Theirs => Some(Resolution::Theirs),
            MergeStrategy::Union => Some(Resolution::Union),
            MergeStrategy::Manual => None,
        }
    }

    /// Like `choose`, for conflicts that have no union form
    fn choose_single(&self, path: &str) -> Option<Resolution> {
        match self.choose(path) {
            Some(Resolution::Union) => None,
            other => other,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record<T: Serialize>(
        &mut self,
        path: &str,
        element: ElementType,
        kind: ConflictKind,
        base: Option<&T>,
        ours: Option<&T>,
        theirs: Option<&T>,
        resolution: Option<Resolution>,
    ) -> Result<()> {
        self.conflicts.push(MergeConflict {
            path: path.to_string(),
            element,
            kind,
            base: to_value(base)?,
            ours: to_value(ours)?,
            theirs: to_value(theirs)?,
            resolution,
        });
        Ok(())
    }
}

fn to_value<T: Serialize>(item: Option<&T>) -> Result<Option<Value>> {
    Ok(item.map(serde_json::to_value).transpose()?)
}

/// Merge one snapshot header field, keyed `snapshot:<field>`
///
/// Header fields have no union form; an unresolved conflict keeps the base
/// value.
fn merge_header<T: Clone + PartialEq + Serialize>(
    ctx: &mut MergeCtx<'_>,
    field: &str,
    base: &T,
    ours: &T,
    theirs: &T,
) -> Result<T> {
    if ours == base {
        return Ok(theirs.clone());
    }
    if theirs == base || ours == theirs {
        return Ok(ours.clone());
    }
    let path = format!("snapshot:{}", field);
    let resolution = ctx.choose_single(&path);
    ctx.record(
        &path,
        ElementType::Snapshot,
        ConflictKind::ModifyModify,
        Some(base),
        Some(ours),
        Some(theirs),
        resolution,
    )?;
    Ok(match resolution {
        Some(Resolution::Ours) => ours.clone(),
        Some(Resolution::Theirs) => theirs.clone(),
        _ => base.clone(),
    })
}

/// Merge one base element given its counterparts (absent = deleted)
fn three_way<T: Clone + PartialEq + Serialize>(
    ctx: &mut MergeCtx<'_>,
    element: ElementType,
    path: &str,
    b: &T,
    o: Option<&T>,
    t: Option<&T>,
) -> Result<Option<(T, Origin)>> {
    match (o, t) {
        (None, None) => Ok(None),
        (Some(ov), Some(tv)) => {
            if ov == b && tv == b {
                return Ok(Some((b.clone(), Origin::Base)));
            }
            if ov == b {
                return Ok(Some((tv.clone(), Origin::Theirs)));
            }
            if tv == b || ov == tv {
                let origin = if tv == b { Origin::Ours } else { Origin::Both };
                return Ok(Some((ov.clone(), origin)));
            }
            let resolution = ctx.choose_single(path);
            ctx.record(path, element, ConflictKind::ModifyModify, Some(b), o, t, resolution)?;
            Ok(Some(match resolution {
                Some(Resolution::Ours) => (ov.clone(), Origin::Ours),
                Some(Resolution::Theirs) => (tv.clone(), Origin::Theirs),
                _ => (b.clone(), Origin::Base),
            }))
        }
        (Some(kept), None) | (None, Some(kept)) => {
            // deletion wins over an untouched element
            if kept == b {
                return Ok(None);
            }
            let resolution = ctx.choose_single(path);
            ctx.record(path, element, ConflictKind::DeleteModify, Some(b), o, t, resolution)?;
            Ok(match resolution {
                Some(Resolution::Ours) => o.map(|v| (v.clone(), Origin::Ours)),
                Some(Resolution::Theirs) => t.map(|v| (v.clone(), Origin::Theirs)),
                _ => Some((b.clone(), Origin::Base)),
            })
        }
    }
}

fn no_union<T>(_: &mut MergeCtx<'_>, _: &T, _: &T) -> Result<Option<T>> {
    Ok(None)
}

/// Merge elements added on either side, grouped by name
fn merge_additions<T, U>(
    ctx: &mut MergeCtx<'_>,
    element: ElementType,
    ours_added: &[&T],
    theirs_added: &[&T],
    name_of: fn(&T) -> &str,
    path_of: &dyn Fn(&str) -> String,
    mut union: U,
) -> Result<Vec<Slot<T>>>
where
    T: Clone + PartialEq + Serialize,
    U: FnMut(&mut MergeCtx<'_>, &T, &T) -> Result<Option<T>>,
{
    let mut by_name: BTreeMap<&str, (Option<&T>, Option<&T>)> = BTreeMap::new();
    for o in ours_added {
        by_name.entry(name_of(*o)).or_default().0 = Some(*o);
    }
    for t in theirs_added {
        by_name.entry(name_of(*t)).or_default().1 = Some(*t);
    }

    let mut slots = Vec::new();
    for (name, pair) in by_name {
        let (item, origin) = match pair {
            (Some(o), None) => (o.clone(), Origin::Ours),
            (None, Some(t)) => (t.clone(), Origin::Theirs),
            (Some(o), Some(t)) if o == t => (o.clone(), Origin::Both),
            (Some(o), Some(t)) => {
                let path = path_of(name);
                let kind = ConflictKind::AddAdd;
                match ctx.choose(&path) {
                    Some(Resolution::Ours) => {
                        ctx.record(&path, element, kind, None, Some(o), Some(t), Some(Resolution::Ours))?;
                        (o.clone(), Origin::Ours)
                    }
                    Some(Resolution::Theirs) => {
                        ctx.record(&path, element, kind, None, Some(o), Some(t), Some(Resolution::Theirs))?;
                        (t.clone(), Origin::Theirs)
                    }
                    Some(Resolution::Union) => {
                        let idx = ctx.conflicts.len();
                        ctx.record(&path, element, kind, None, Some(o), Some(t), Some(Resolution::Union))?;
                        match union(ctx, o, t)? {
                            Some(combined) => (combined, Origin::Both),
                            None => {
                                // not combinable: open, nothing merged in its place
                                ctx.conflicts[idx].resolution = None;
                                continue;
                            }
                        }
                    }
                    resolution => {
                        ctx.record(&path, element, kind, None, Some(o), Some(t), resolution)?;
                        continue;
                    }
                }
            }
            (None, None) => continue,
        };
        slots.push(Slot {
            anchor: Anchor::Added(name.to_string()),
            item,
            origin,
        });
    }
    Ok(slots)
}

/// Keep one slot per name, recording a `NameCollision` for each clash
fn resolve_collisions<T: Clone + PartialEq + Serialize>(
    ctx: &mut MergeCtx<'_>,
    element: ElementType,
    slots: Vec<Slot<T>>,
    name_of: fn(&T) -> &str,
    path_of: &dyn Fn(&str) -> String,
) -> Result<Vec<Slot<T>>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, slot) in slots.iter().enumerate() {
        groups
            .entry(name_of(&slot.item).to_string())
            .or_default()
            .push(i);
    }

    let mut dropped = vec![false; slots.len()];
    for (name, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
        let path = path_of(name);
        let from_side = |side: Origin| {
            members
                .iter()
                .copied()
                .find(|&i| slots[i].origin == side || slots[i].origin == Origin::Both)
        };
        let ours_idx = from_side(Origin::Ours);
        let theirs_idx = from_side(Origin::Theirs);
        let base_idx = members
            .iter()
            .copied()
            .find(|&i| matches!(slots[i].anchor, Anchor::Base(_)));

        let resolution = ctx.choose_single(&path);
        let keep = match resolution {
            Some(Resolution::Ours) => ours_idx,
            Some(Resolution::Theirs) => theirs_idx,
            _ => base_idx,
        }
        .unwrap_or(members[0]);

        ctx.record(
            &path,
            element,
            ConflictKind::NameCollision,
            base_idx.map(|i| &slots[i].item),
            ours_idx.map(|i| &slots[i].item),
            theirs_idx.map(|i| &slots[i].item),
            resolution,
        )?;
        for &i in members {
            dropped[i] = i != keep;
        }
    }

    Ok(slots
        .into_iter()
        .zip(dropped)
        .filter(|(_, d)| !d)
        .map(|(slot, _)| slot)
        .collect())
}

fn side_sequence<T>(items: &[T], aligned: &Aligned, name_of: fn(&T) -> &str) -> Vec<Anchor> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match aligned.old_index_of(i) {
            Some(bi) => Anchor::Base(bi),
            None => Anchor::Added(name_of(item).to_string()),
        })
        .collect()
}

/// A side keeps base order when it added nothing and did not reorder
fn keeps_base_order(seq: &[Anchor]) -> bool {
    seq.iter().all(|a| matches!(a, Anchor::Base(_))) && seq.windows(2).all(|w| w[0] < w[1])
}

/// Follow the sides' order when they agree, or the other side's order when
/// exactly one side kept base order; otherwise base order, then additions
/// by name.
fn order_slots<T>(slots: Vec<Slot<T>>, ours_seq: &[Anchor], theirs_seq: &[Anchor]) -> Vec<T> {
    let primary: &[Anchor] = match (keeps_base_order(ours_seq), keeps_base_order(theirs_seq)) {
        _ if ours_seq == theirs_seq => ours_seq,
        (true, false) => theirs_seq,
        (false, true) => ours_seq,
        _ => &[],
    };
    let mut remaining: BTreeMap<Anchor, T> =
        slots.into_iter().map(|s| (s.anchor, s.item)).collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    for anchor in primary {
        if let Some(item) = remaining.remove(anchor) {
            ordered.push(item);
        }
    }
    ordered.extend(remaining.into_values());
    ordered
}

struct CollectionInput<'a, T> {
    base: &'a [T],
    ours: &'a [T],
    theirs: &'a [T],
    ours_al: &'a Aligned,
    theirs_al: &'a Aligned,
}

impl<T> CollectionInput<'_, T> {
    fn ours_added(&self) -> Vec<&T> {
        self.ours_al.added.iter().map(|(i, _)| &self.ours[*i]).collect()
    }

    fn theirs_added(&self) -> Vec<&T> {
        self.theirs_al.added.iter().map(|(i, _)| &self.theirs[*i]).collect()
    }
}

/// Merge a collection of leaf elements (properties, relationships, rules)
fn merge_leaves<T: Clone + PartialEq + Serialize>(
    ctx: &mut MergeCtx<'_>,
    element: ElementType,
    input: CollectionInput<'_, T>,
    name_of: fn(&T) -> &str,
    path_of: &dyn Fn(&str) -> String,
) -> Result<Vec<T>> {
    let mut slots = Vec::new();
    for (bi, b) in input.base.iter().enumerate() {
        let o = input.ours_al.new_index_of(bi).map(|i| &input.ours[i]);
        let t = input.theirs_al.new_index_of(bi).map(|i| &input.theirs[i]);
        if let Some((item, origin)) = three_way(ctx, element, &path_of(name_of(b)), b, o, t)? {
            slots.push(Slot {
                anchor: Anchor::Base(bi),
                item,
                origin,
            });
        }
    }

    slots.extend(merge_additions(
        ctx,
        element,
        &input.ours_added(),
        &input.theirs_added(),
        name_of,
        path_of,
        no_union::<T>,
    )?);
    let slots = resolve_collisions(ctx, element, slots, name_of, path_of)?;

    Ok(order_slots(
        slots,
        &side_sequence(input.ours, input.ours_al, name_of),
        &side_sequence(input.theirs, input.theirs_al, name_of),
    ))
}

fn property_alignment(alignment: &Alignment, base_idx: usize, side_idx: usize) -> Result<&Aligned> {
    alignment.properties.get(&(base_idx, side_idx)).ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op(OP_MERGE)
            .with_message("missing property alignment for matched entity pair")
    })
}

/// Both sides changed one entity differently: merge header and properties
fn merge_entity_pair(
    ctx: &mut MergeCtx<'_>,
    b: &EntityDef,
    o: &EntityDef,
    t: &EntityDef,
    ours_props: &Aligned,
    theirs_props: &Aligned,
) -> Result<EntityDef> {
    let header = three_way(
        ctx,
        ElementType::Entity,
        &b.name,
        &b.header(),
        Some(&o.header()),
        Some(&t.header()),
    )?
    .map(|(h, _)| h)
    .unwrap_or_else(|| b.header());

    let path_of = |name: &str| format!("{}.{}", b.name, name);
    let properties = merge_leaves(
        ctx,
        ElementType::Property,
        CollectionInput {
            base: &b.properties,
            ours: &o.properties,
            theirs: &t.properties,
            ours_al: ours_props,
            theirs_al: theirs_props,
        },
        property_key,
        &path_of,
    )?;

    Ok(EntityDef {
        properties,
        ..header
    })
}

/// Same-name entity additions combine when their headers agree
fn union_entities(
    ctx: &mut MergeCtx<'_>,
    o: &EntityDef,
    t: &EntityDef,
) -> Result<Option<EntityDef>> {
    if !o.same_header_content(t) {
        return Ok(None);
    }
    let path_of = |name: &str| format!("{}.{}", o.name, name);
    let ours_props: Vec<&PropertyDef> = o.properties.iter().collect();
    let theirs_props: Vec<&PropertyDef> = t.properties.iter().collect();
    let slots = merge_additions(
        ctx,
        ElementType::Property,
        &ours_props,
        &theirs_props,
        property_key,
        &path_of,
        no_union::<PropertyDef>,
    )?;

    let added = |props: &[PropertyDef]| -> Vec<Anchor> {
        props.iter().map(|p| Anchor::Added(p.name.clone())).collect()
    };
    Ok(Some(EntityDef {
        properties: order_slots(slots, &added(&o.properties), &added(&t.properties)),
        ..o.header()
    }))
}

fn merge_entities(
    ctx: &mut MergeCtx<'_>,
    base: &OntologySnapshot,
    ours: &OntologySnapshot,
    theirs: &OntologySnapshot,
    ours_al: &Alignment,
    theirs_al: &Alignment,
) -> Result<Vec<EntityDef>> {
    let mut slots = Vec::new();
    for (bi, b) in base.entities.iter().enumerate() {
        let oi = ours_al.entities.new_index_of(bi);
        let ti = theirs_al.entities.new_index_of(bi);
        let merged = match (oi, ti) {
            (Some(oi), Some(ti)) => {
                let (o, t) = (&ours.entities[oi], &theirs.entities[ti]);
                if o == b || t == b || o == t {
                    three_way(ctx, ElementType::Entity, &b.name, b, Some(o), Some(t))?
                } else {
                    let entity = merge_entity_pair(
                        ctx,
                        b,
                        o,
                        t,
                        property_alignment(ours_al, bi, oi)?,
                        property_alignment(theirs_al, bi, ti)?,
                    )?;
                    Some((entity, Origin::Both))
                }
            }
            (oi, ti) => three_way(
                ctx,
                ElementType::Entity,
                &b.name,
                b,
                oi.map(|i| &ours.entities[i]),
                ti.map(|i| &theirs.entities[i]),
            )?,
        };
        if let Some((item, origin)) = merged {
            slots.push(Slot {
                anchor: Anchor::Base(bi),
                item,
                origin,
            });
        }
    }

    let path_of = |name: &str| name.to_string();
    let ours_added: Vec<&EntityDef> = ours_al
        .entities
        .added
        .iter()
        .map(|(i, _)| &ours.entities[*i])
        .collect();
    let theirs_added: Vec<&EntityDef> = theirs_al
        .entities
        .added
        .iter()
        .map(|(i, _)| &theirs.entities[*i])
        .collect();
    slots.extend(merge_additions(
        ctx,
        ElementType::Entity,
        &ours_added,
        &theirs_added,
        entity_key,
        &path_of,
        union_entities,
    )?);
    let slots = resolve_collisions(ctx, ElementType::Entity, slots, entity_key, &path_of)?;

    Ok(order_slots(
        slots,
        &side_sequence(&ours.entities, &ours_al.entities, entity_key),
        &side_sequence(&theirs.entities, &theirs_al.entities, entity_key),
    ))
}

fn merge_metadata(
    ctx: &mut MergeCtx<'_>,
    base: &OntologySnapshot,
    ours: &OntologySnapshot,
    theirs: &OntologySnapshot,
) -> Result<BTreeMap<String, Value>> {
    let keys: BTreeSet<&String> = base
        .metadata
        .keys()
        .chain(ours.metadata.keys())
        .chain(theirs.metadata.keys())
        .collect();

    let mut merged = BTreeMap::new();
    for key in keys {
        let (b, o, t) = (
            base.metadata.get(key),
            ours.metadata.get(key),
            theirs.metadata.get(key),
        );
        let value = if o == b {
            t
        } else if t == b || o == t {
            o
        } else {
            let path = format!("metadata:{}", key);
            let kind = match (b, o, t) {
                (None, _, _) => ConflictKind::AddAdd,
                (Some(_), Some(_), Some(_)) => ConflictKind::ModifyModify,
                _ => ConflictKind::DeleteModify,
            };
            let resolution = ctx.choose_single(&path);
            ctx.record(&path, ElementType::Metadata, kind, b, o, t, resolution)?;
            match resolution {
                Some(Resolution::Ours) => o,
                Some(Resolution::Theirs) => t,
                _ => b,
            }
        };
        if let Some(v) = value {
            merged.insert(key.clone(), v.clone());
        }
    }
    Ok(merged)
}

fn merge_impl(
    base: &OntologySnapshot,
    ours: &OntologySnapshot,
    theirs: &OntologySnapshot,
    strategy: MergeStrategy,
    resolutions: &Resolutions,
    config: &MatchConfig,
) -> Result<MergeOutcome> {
    validate_snapshot(base)?;
    validate_snapshot(ours)?;
    validate_snapshot(theirs)?;

    let ours_al = align(base, ours, config);
    let theirs_al = align(base, theirs, config);
    let mut ctx = MergeCtx {
        strategy,
        resolutions,
        conflicts: Vec::new(),
    };

    let entities = merge_entities(&mut ctx, base, ours, theirs, &ours_al, &theirs_al)?;
    let relationships = merge_leaves(
        &mut ctx,
        ElementType::Relationship,
        CollectionInput {
            base: &base.relationships,
            ours: &ours.relationships,
            theirs: &theirs.relationships,
            ours_al: &ours_al.relationships,
            theirs_al: &theirs_al.relationships,
        },
        relationship_key,
        &|name: &str| format!("relationship:{}", name),
    )?;
    let rules = merge_leaves(
        &mut ctx,
        ElementType::Rule,
        CollectionInput {
            base: &base.rules,
            ours: &ours.rules,
            theirs: &theirs.rules,
            ours_al: &ours_al.rules,
            theirs_al: &theirs_al.rules,
        },
        rule_key,
        &|name: &str| format!("rule:{}", name),
    )?;
    let metadata = merge_metadata(&mut ctx, base, ours, theirs)?;

    let merged = OntologySnapshot {
        name: merge_header(&mut ctx, "name", &base.name, &ours.name, &theirs.name)?,
        version: merge_header(&mut ctx, "version", &base.version, &ours.version, &theirs.version)?,
        source: merge_header(&mut ctx, "source", &base.source, &ours.source, &theirs.source)?,
        created_at: merge_header(
            &mut ctx,
            "created_at",
            &base.created_at,
            &ours.created_at,
            &theirs.created_at,
        )?,
        entities,
        relationships,
        rules,
        metadata,
    };
    validate_snapshot(&merged)?;

    let mut conflicts = ctx.conflicts;
    conflicts.sort_by(|a, b| {
        (a.element.group_rank(), &a.path).cmp(&(b.element.group_rank(), &b.path))
    });

    Ok(MergeOutcome {
        merged,
        conflicts,
        strategy,
        ours_diff: diff_impl(base, ours, config)?,
        theirs_diff: diff_impl(base, theirs, config)?,
    })
}

/// Three-way merge with the default matching configuration
///
/// # Errors
///
/// Validation errors for any of the three inputs. Conflicts are not errors;
/// they are reported in the outcome.
pub fn merge(
    base: &OntologySnapshot,
    ours: &OntologySnapshot,
    theirs: &OntologySnapshot,
    strategy: MergeStrategy,
) -> Result<MergeOutcome> {
    merge_with(
        base,
        ours,
        theirs,
        strategy,
        &Resolutions::new(),
        &MatchConfig::default(),
    )
}

/// Three-way merge applying explicit per-path resolutions
///
/// A resolution keyed by a conflict path overrides the strategy for that
/// conflict; re-running with a resolution for every open path of a previous
/// outcome yields a final outcome.
///
/// # Errors
///
/// See [`merge`].
pub fn merge_with(
    base: &OntologySnapshot,
    ours: &OntologySnapshot,
    theirs: &OntologySnapshot,
    strategy: MergeStrategy,
    resolutions: &Resolutions,
    config: &MatchConfig,
) -> Result<MergeOutcome> {
    log_op_start!(
        OP_MERGE,
        snapshot = base.name.as_str(),
        strategy = strategy.as_str(),
        resolution_count = resolutions.len() as u64
    );
    let start = Instant::now();

    let outcome = merge_impl(base, ours, theirs, strategy, resolutions, config).map_err(|e| {
        log_op_error!(
            OP_MERGE,
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        OP_MERGE,
        duration_ms = start.elapsed().as_millis() as u64,
        conflict_count = outcome.conflicts.len() as u64,
        open_count = outcome.open_conflicts().count() as u64
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_base_order() {
        assert!(keeps_base_order(&[Anchor::Base(0), Anchor::Base(2)]));
        assert!(!keeps_base_order(&[Anchor::Base(2), Anchor::Base(0)]));
        assert!(!keeps_base_order(&[Anchor::Base(0), Anchor::Added("X".into())]));
        assert!(keeps_base_order(&[]));
    }

    #[test]
    fn test_order_follows_reordering_side() {
        let slots = vec![
            Slot { anchor: Anchor::Base(0), item: "a", origin: Origin::Base },
            Slot { anchor: Anchor::Base(1), item: "b", origin: Origin::Base },
            Slot { anchor: Anchor::Added("c".into()), item: "c", origin: Origin::Theirs },
        ];
        let ours = [Anchor::Base(0), Anchor::Base(1)];
        let theirs = [Anchor::Added("c".into()), Anchor::Base(1), Anchor::Base(0)];
        assert_eq!(order_slots(slots, &ours, &theirs), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_order_falls_back_to_base_then_names() {
        let slots = vec![
            Slot { anchor: Anchor::Added("z".into()), item: "z", origin: Origin::Ours },
            Slot { anchor: Anchor::Base(0), item: "a", origin: Origin::Base },
            Slot { anchor: Anchor::Added("m".into()), item: "m", origin: Origin::Theirs },
        ];
        let ours = [Anchor::Base(0), Anchor::Added("z".into())];
        let theirs = [Anchor::Added("m".into()), Anchor::Base(0)];
        assert_eq!(order_slots(slots, &ours, &theirs), vec!["a", "m", "z"]);
    }

    #[test]
    fn test_order_follows_agreeing_sides() {
        let slots = vec![
            Slot { anchor: Anchor::Added("z".into()), item: "z", origin: Origin::Both },
            Slot { anchor: Anchor::Added("a".into()), item: "a", origin: Origin::Both },
        ];
        let seq = [Anchor::Added("z".into()), Anchor::Added("a".into())];
        assert_eq!(order_slots(slots, &seq, &seq), vec!["z", "a"]);
    }

    #[test]
    fn test_header_field_takes_one_sided_change() {
        let resolutions = Resolutions::new();
        let mut ctx = MergeCtx {
            strategy: MergeStrategy::Manual,
            resolutions: &resolutions,
            conflicts: Vec::new(),
        };
        assert_eq!(merge_header(&mut ctx, "version", &"1", &"1", &"3").unwrap(), "3");
        assert_eq!(merge_header(&mut ctx, "version", &"1", &"2", &"2").unwrap(), "2");
        assert!(ctx.conflicts.is_empty());

        assert_eq!(merge_header(&mut ctx, "version", &"1", &"2", &"3").unwrap(), "1");
        assert_eq!(ctx.conflicts[0].path, "snapshot:version");
        assert!(ctx.conflicts[0].is_open());
    }

    #[test]
    fn test_header_conflict_explicit_resolution() {
        let resolutions = Resolutions::from([("snapshot:source".to_string(), Resolution::Theirs)]);
        let mut ctx = MergeCtx {
            strategy: MergeStrategy::Union,
            resolutions: &resolutions,
            conflicts: Vec::new(),
        };
        let merged = merge_header(&mut ctx, "source", &"a.pbix", &"b.pbix", &"c.pbix").unwrap();
        assert_eq!(merged, "c.pbix");
        assert_eq!(ctx.conflicts[0].element, ElementType::Snapshot);
        assert_eq!(ctx.conflicts[0].resolution, Some(Resolution::Theirs));
    }

    #[test]
    fn test_three_way_delete_of_untouched_element() {
        let resolutions = Resolutions::new();
        let mut ctx = MergeCtx {
            strategy: MergeStrategy::Manual,
            resolutions: &resolutions,
            conflicts: Vec::new(),
        };
        let base = 1;
        let out = three_way(&mut ctx, ElementType::Rule, "rule:x", &base, None, Some(&1)).unwrap();
        assert!(out.is_none());
        assert!(ctx.conflicts.is_empty());

        let out = three_way(&mut ctx, ElementType::Rule, "rule:x", &base, None, Some(&2)).unwrap();
        assert_eq!(out.map(|(v, _)| v), Some(1));
        assert_eq!(ctx.conflicts.len(), 1);
        assert_eq!(ctx.conflicts[0].kind, ConflictKind::DeleteModify);
        assert!(ctx.conflicts[0].is_open());
    }
}
