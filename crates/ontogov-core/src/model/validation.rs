//! Structural validation of snapshots
//!
//! Every governance operation validates its inputs before comparing them, so
//! the engines may assume unique identities and parseable types.

use std::collections::BTreeSet;

use crate::errors::{GovernanceError, Result};
use crate::model::snapshot::OntologySnapshot;
use crate::model::types::TypeDescriptor;

/// Validate identity uniqueness, non-empty names and property types
///
/// Entity and property paths share one namespace (`Entity`, `Entity.Property`),
/// so a dotted name that composes into another element's path is rejected.
/// Entity names may not contain `:`, which is reserved for the prefixed
/// paths of relationships, rules, metadata and header fields.
///
/// # Errors
///
/// - `ERR_INVALID_INPUT` for empty or ambiguous names
/// - `ERR_DUPLICATE_IDENTITY` for repeated entity, property, relationship or
///   rule names within their scope
/// - `ERR_INVALID_TYPE_DESCRIPTOR` for malformed property types
pub fn validate_snapshot(snapshot: &OntologySnapshot) -> Result<()> {
    let snap = snapshot.name.as_str();
    let empty = |element: String| GovernanceError::EmptyName {
        snapshot: snap.to_string(),
        element,
    };
    let duplicate = |path: String| GovernanceError::DuplicateIdentity {
        snapshot: snap.to_string(),
        path,
    };
    let ambiguous = |path: String, reason: &str| GovernanceError::AmbiguousName {
        snapshot: snap.to_string(),
        path,
        reason: reason.to_string(),
    };

    if snapshot.name.trim().is_empty() {
        return Err(empty("snapshot".to_string()).into());
    }

    let mut entity_names = BTreeSet::new();
    let mut element_paths = BTreeSet::new();
    for (idx, entity) in snapshot.entities.iter().enumerate() {
        if entity.name.trim().is_empty() {
            return Err(empty(format!("entities[{}]", idx)).into());
        }
        if !entity_names.insert(entity.name.as_str()) {
            return Err(duplicate(entity.name.clone()).into());
        }
        if entity.name.contains(':') {
            return Err(ambiguous(entity.name.clone(), "entity names may not contain ':'").into());
        }
        if !element_paths.insert(entity.name.clone()) {
            return Err(ambiguous(entity.name.clone(), "path already names a property").into());
        }

        let mut property_names = BTreeSet::new();
        for (pidx, property) in entity.properties.iter().enumerate() {
            if property.name.trim().is_empty() {
                return Err(empty(format!("{}.properties[{}]", entity.name, pidx)).into());
            }
            let path = format!("{}.{}", entity.name, property.name);
            if !property_names.insert(property.name.as_str()) {
                return Err(duplicate(path).into());
            }
            if !element_paths.insert(path.clone()) {
                return Err(ambiguous(path, "path already names another element").into());
            }
            TypeDescriptor::parse_at(&property.data_type, &path)
                .map_err(|e| e.with_snapshot(snap))?;
        }
    }

    let mut relationship_names = BTreeSet::new();
    for (idx, rel) in snapshot.relationships.iter().enumerate() {
        if rel.name.trim().is_empty() {
            return Err(empty(format!("relationships[{}]", idx)).into());
        }
        if !relationship_names.insert(rel.name.as_str()) {
            return Err(duplicate(format!("relationship:{}", rel.name)).into());
        }
    }

    let mut rule_names = BTreeSet::new();
    for (idx, rule) in snapshot.rules.iter().enumerate() {
        if rule.name.trim().is_empty() {
            return Err(empty(format!("rules[{}]", idx)).into());
        }
        if !rule_names.insert(rule.name.as_str()) {
            return Err(duplicate(format!("rule:{}", rule.name)).into());
        }
    }

    Ok(())
}
