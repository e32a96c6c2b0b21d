//! Diff output types.
//!
//! Collections use `BTreeMap` and sorted `Vec` for deterministic serialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::matching::NearMatch;

/// Kind of ontology element an entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Entity,
    Property,
    Relationship,
    Rule,
    Metadata,
    /// Snapshot header field; only merge conflicts carry it
    Snapshot,
}

impl ElementType {
    /// Report grouping: entities with their properties, then relationships,
    /// rules, metadata and finally the snapshot header
    pub fn group_rank(&self) -> u8 {
        match self {
            ElementType::Entity | ElementType::Property => 0,
            ElementType::Relationship => 1,
            ElementType::Rule => 2,
            ElementType::Metadata => 3,
            ElementType::Snapshot => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Entity => "entity",
            ElementType::Property => "property",
            ElementType::Relationship => "relationship",
            ElementType::Rule => "rule",
            ElementType::Metadata => "metadata",
            ElementType::Snapshot => "snapshot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "ADDED",
            ChangeType::Removed => "REMOVED",
            ChangeType::Modified => "MODIFIED",
            ChangeType::Unchanged => "UNCHANGED",
        }
    }
}

/// One differing top-level field of a modified element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub element: ElementType,
    pub change: ChangeType,

    /// Identity path in the old snapshot (new snapshot for additions)
    pub path: String,

    /// New identity path when the element was matched under another name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_changes: Vec<FieldChange>,

    /// Rename score, present on renamed entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,

    /// Closest sub-threshold counterpart of an unmatched addition/removal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near_match: Option<NearMatch>,
}

impl DiffEntry {
    pub fn is_rename(&self) -> bool {
        self.renamed_to.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl ChangeCounts {
    pub fn record(&mut self, change: ChangeType) {
        match change {
            ChangeType::Added => self.added += 1,
            ChangeType::Removed => self.removed += 1,
            ChangeType::Modified => self.modified += 1,
            ChangeType::Unchanged => self.unchanged += 1,
        }
    }

    /// Added + removed + modified
    pub fn changed(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// The structured diff between two snapshots.
///
/// `diff_schema_version` is always 1 for this implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub diff_schema_version: u32,
    pub old_name: String,
    pub old_version: String,
    pub new_name: String,
    pub new_version: String,
    /// Content digests (created_at excluded)
    pub old_digest: String,
    pub new_digest: String,
    pub entries: Vec<DiffEntry>,
    pub counts: BTreeMap<ElementType, ChangeCounts>,
    pub totals: ChangeCounts,
}

impl DiffReport {
    pub fn has_changes(&self) -> bool {
        self.totals.changed() > 0
    }

    /// Entries other than `Unchanged`
    pub fn changes(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries
            .iter()
            .filter(|e| e.change != ChangeType::Unchanged)
    }

    pub fn entries_of(&self, element: ElementType) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(move |e| e.element == element)
    }

    pub fn entry(&self, path: &str) -> Option<&DiffEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn renames(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(|e| e.is_rename())
    }

    pub fn paths_with(&self, change: ChangeType) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.change == change)
            .map(|e| e.path.as_str())
            .collect()
    }
}
