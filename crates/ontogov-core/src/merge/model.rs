use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diff::{DiffReport, ElementType};
use crate::errors::{GovernanceError, Result};
use crate::model::OntologySnapshot;

/// How conflicting edits are settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Take our side for every conflict
    Ours,
    /// Take their side for every conflict
    Theirs,
    /// Keep both sides where they can coexist; leave the rest open
    Union,
    /// Leave every conflict open with the base value in place
    Manual,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Ours => "ours",
            MergeStrategy::Theirs => "theirs",
            MergeStrategy::Union => "union",
            MergeStrategy::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both sides changed the same element differently
    ModifyModify,
    /// Both sides added an element under one name with different content
    AddAdd,
    /// One side deleted an element the other side changed
    DeleteModify,
    /// Two distinct elements would end up under one name
    NameCollision,
}

/// Choice applied to a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Base,
    Ours,
    Theirs,
    /// Both sides combined (entity additions with equal headers)
    Union,
}

/// Explicit per-path resolutions for a re-run of the merge
pub type Resolutions = BTreeMap<String, Resolution>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    /// Identity path in the base snapshot (added name for additions)
    pub path: String,
    pub element: ElementType,
    pub kind: ConflictKind,
    pub base: Option<Value>,
    pub ours: Option<Value>,
    pub theirs: Option<Value>,
    /// `None` while the conflict is open
    pub resolution: Option<Resolution>,
}

impl MergeConflict {
    pub fn is_open(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Result of a three-way merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Merged snapshot; open conflicts hold their base placeholder
    pub merged: OntologySnapshot,
    /// Every conflict encountered, ordered by path
    pub conflicts: Vec<MergeConflict>,
    pub strategy: MergeStrategy,
    /// base → ours
    pub ours_diff: DiffReport,
    /// base → theirs
    pub theirs_diff: DiffReport,
}

impl MergeOutcome {
    pub fn open_conflicts(&self) -> impl Iterator<Item = &MergeConflict> {
        self.conflicts.iter().filter(|c| c.is_open())
    }

    pub fn is_final(&self) -> bool {
        self.open_conflicts().next().is_none()
    }

    /// Paths of open conflicts, suitable as keys of [`Resolutions`]
    pub fn open_paths(&self) -> Vec<String> {
        self.open_conflicts().map(|c| c.path.clone()).collect()
    }

    /// Consume the outcome, yielding the merged snapshot once nothing is open
    ///
    /// # Errors
    ///
    /// `ERR_UNRESOLVED_CONFLICT` listing the open paths as candidates.
    pub fn finalize(self) -> Result<OntologySnapshot> {
        if self.is_final() {
            Ok(self.merged)
        } else {
            Err(GovernanceError::UnresolvedConflicts {
                paths: self.open_paths(),
            }
            .into())
        }
    }
}
