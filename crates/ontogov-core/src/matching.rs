//! Name similarity and candidate pairing
//!
//! Shared by the diff engine (rename detection), the drift detector (column
//! rename search) and the debt analyzer. Two ingredients:
//!
//! - [`MatchConfig::name_similarity`]: a symmetric score in `[0, 1]` over
//!   canonical name tokens.
//! - [`best_pairs`]: greedy, globally best-first assignment of removed to
//!   added candidates. Ties are broken on the unordered key pair, so swapping
//!   the two candidate lists swaps the result and nothing else.
//!
//! Scoring closures return `None` when the type/kind gate rejects a pair.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{EntityDef, PropertyDef, RelationshipDef, RuleDef, TypeDescriptor};

/// Tunables for rename detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum score for a removed/added pair to count as a rename
    pub rename_threshold: f64,

    /// Minimum score for an unmatched candidate to carry a near-match note
    pub ambiguity_floor: f64,

    /// Entity score = name_weight * name + property_weight * property Jaccard
    pub entity_name_weight: f64,
    pub entity_property_weight: f64,

    /// Token rewrites applied after tokenization
    ///
    /// Entries given in configuration override the defaults one by one; map a
    /// token to itself to switch a default rewrite off.
    #[serde(deserialize_with = "overlay_synonyms")]
    pub synonyms: BTreeMap<String, String>,

    /// Tokens dropped unless they are the only token
    pub qualifiers: BTreeSet<String>,
}

fn default_synonyms() -> BTreeMap<String, String> {
    [
        ("loc", "location"),
        ("facility", "location"),
        ("site", "location"),
        ("qty", "quantity"),
        ("amt", "amount"),
        ("cust", "customer"),
        ("desc", "description"),
        ("addr", "address"),
        ("num", "number"),
        ("nbr", "number"),
        ("no", "number"),
        ("key", "id"),
        ("dt", "date"),
        ("cat", "category"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

fn overlay_synonyms<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = BTreeMap::<String, String>::deserialize(deserializer)?;
    let mut synonyms = default_synonyms();
    synonyms.extend(overrides);
    Ok(synonyms)
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rename_threshold: 0.7,
            ambiguity_floor: 0.4,
            entity_name_weight: 0.6,
            entity_property_weight: 0.4,
            synonyms: default_synonyms(),
            qualifiers: ["id".to_string()].into_iter().collect(),
        }
    }
}

impl MatchConfig {
    /// Canonical tokens of a name: tokenized, synonym-mapped, qualifiers dropped
    pub fn canonical_tokens(&self, name: &str) -> Vec<String> {
        let mapped: Vec<String> = tokenize(name)
            .into_iter()
            .map(|t| self.synonyms.get(&t).cloned().unwrap_or(t))
            .collect();
        let kept: Vec<String> = mapped
            .iter()
            .filter(|t| !self.qualifiers.contains(*t))
            .cloned()
            .collect();
        if kept.is_empty() {
            mapped
        } else {
            kept
        }
    }

    /// Symmetric similarity in `[0, 1]`
    ///
    /// Max of the token overlap coefficient and the normalized Levenshtein
    /// similarity of the concatenated canonical tokens.
    pub fn name_similarity(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let ta = self.canonical_tokens(a);
        let tb = self.canonical_tokens(b);
        if ta.is_empty() || tb.is_empty() {
            return 0.0;
        }

        let sa: BTreeSet<&str> = ta.iter().map(String::as_str).collect();
        let sb: BTreeSet<&str> = tb.iter().map(String::as_str).collect();
        let shared = sa.intersection(&sb).count() as f64;
        let overlap = shared / sa.len().min(sb.len()) as f64;

        let ja = ta.concat();
        let jb = tb.concat();
        let longest = ja.chars().count().max(jb.chars().count());
        let edit = if longest == 0 {
            0.0
        } else {
            1.0 - levenshtein(&ja, &jb) as f64 / longest as f64
        };

        overlap.max(edit).clamp(0.0, 1.0)
    }

    /// Properties are comparable only within one type family
    pub fn property_score(&self, a: &PropertyDef, b: &PropertyDef) -> Option<f64> {
        let ta = TypeDescriptor::parse(&a.data_type).ok()?;
        let tb = TypeDescriptor::parse(&b.data_type).ok()?;
        if !ta.same_family(&tb) {
            return None;
        }
        Some(self.name_similarity(&a.name, &b.name))
    }

    /// Kind-gated blend of name similarity and property-name Jaccard
    pub fn entity_score(&self, a: &EntityDef, b: &EntityDef) -> Option<f64> {
        if a.kind != b.kind {
            return None;
        }
        let pa: BTreeSet<String> = a.property_names().map(str::to_lowercase).collect();
        let pb: BTreeSet<String> = b.property_names().map(str::to_lowercase).collect();
        let union = pa.union(&pb).count();
        let jaccard = if union == 0 {
            1.0
        } else {
            pa.intersection(&pb).count() as f64 / union as f64
        };
        Some(
            self.entity_name_weight * self.name_similarity(&a.name, &b.name)
                + self.entity_property_weight * jaccard,
        )
    }

    pub fn relationship_score(&self, a: &RelationshipDef, b: &RelationshipDef) -> Option<f64> {
        a.same_endpoints(b)
            .then(|| self.name_similarity(&a.name, &b.name))
    }

    pub fn rule_score(&self, a: &RuleDef, b: &RuleDef) -> Option<f64> {
        (a.entity == b.entity).then(|| self.name_similarity(&a.name, &b.name))
    }

    pub fn metadata_score(
        &self,
        (ka, va): (&str, &serde_json::Value),
        (kb, vb): (&str, &serde_json::Value),
    ) -> Option<f64> {
        (va == vb).then(|| self.name_similarity(ka, kb))
    }
}

/// Split a name into lowercase tokens
///
/// Separators are any non-alphanumeric character. Case boundaries split
/// `customerName` and `FacilityID`; an acronym run ends before the capital
/// that starts the next word (`HTTPServer` gives `http`, `server`).
/// Letter/digit boundaries split as well.
pub fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for part in name.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && !current.is_empty() {
                let prev = chars[i - 1];
                let next = chars.get(i + 1).copied();
                let boundary = (prev.is_lowercase() && c.is_uppercase())
                    || (prev.is_alphabetic() && c.is_numeric())
                    || (prev.is_numeric() && c.is_alphabetic())
                    || (prev.is_uppercase()
                        && c.is_uppercase()
                        && next.is_some_and(|n| n.is_lowercase()));
                if boundary {
                    tokens.push(current.to_lowercase());
                    current.clear();
                }
            }
            current.push(c);
        }
        if !current.is_empty() {
            tokens.push(current.to_lowercase());
        }
    }
    tokens
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Best sub-threshold (or contested) counterpart of an unmatched candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMatch {
    /// Key of the counterpart candidate
    pub key: String,
    pub score: f64,
}

/// One accepted removed/added pairing
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub removed: usize,
    pub added: usize,
    pub score: f64,
}

/// Result of [`best_pairs`]; indices refer to the input slices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairing {
    pub pairs: Vec<MatchedPair>,
    pub unmatched_removed: Vec<(usize, Option<NearMatch>)>,
    pub unmatched_added: Vec<(usize, Option<NearMatch>)>,
}

/// Greedy global best-first assignment
///
/// Every `(removed, added)` pair the scorer accepts with a score at or above
/// `config.rename_threshold` is a candidate; candidates are taken in
/// descending score order, ties ordered by the unordered `(min, max)` key
/// pair, skipping any whose ends are already taken.
pub fn best_pairs<R, A, F>(
    removed: &[(&str, R)],
    added: &[(&str, A)],
    config: &MatchConfig,
    score: F,
) -> Pairing
where
    F: Fn(&R, &A) -> Option<f64>,
{
    let mut scored: Vec<(usize, usize, f64)> = Vec::new();
    for (ri, (_, r)) in removed.iter().enumerate() {
        for (ai, (_, a)) in added.iter().enumerate() {
            if let Some(s) = score(r, a) {
                scored.push((ri, ai, s));
            }
        }
    }

    let unordered = |ri: usize, ai: usize| {
        let (x, y) = (removed[ri].0, added[ai].0);
        if x <= y {
            (x, y)
        } else {
            (y, x)
        }
    };

    let mut accepted: Vec<&(usize, usize, f64)> = scored
        .iter()
        .filter(|(_, _, s)| *s >= config.rename_threshold)
        .collect();
    accepted.sort_by(|a, b| {
        b.2.total_cmp(&a.2)
            .then_with(|| unordered(a.0, a.1).cmp(&unordered(b.0, b.1)))
    });

    let mut removed_taken = vec![false; removed.len()];
    let mut added_taken = vec![false; added.len()];
    let mut pairs = Vec::new();
    for &&(ri, ai, s) in &accepted {
        if removed_taken[ri] || added_taken[ai] {
            continue;
        }
        removed_taken[ri] = true;
        added_taken[ai] = true;
        pairs.push(MatchedPair {
            removed: ri,
            added: ai,
            score: s,
        });
    }

    // Near matches: best counterpart at or above the floor, keyed lexicographically on ties
    let near = |own: usize, from_removed: bool| -> Option<NearMatch> {
        scored
            .iter()
            .filter(|(ri, ai, s)| {
                *s >= config.ambiguity_floor && if from_removed { *ri == own } else { *ai == own }
            })
            .map(|&(ri, ai, s)| {
                let key = if from_removed { added[ai].0 } else { removed[ri].0 };
                (key, s)
            })
            .min_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(key, s)| NearMatch {
                key: key.to_string(),
                score: s,
            })
    };

    let unmatched_removed = (0..removed.len())
        .filter(|i| !removed_taken[*i])
        .map(|i| (i, near(i, true)))
        .collect();
    let unmatched_added = (0..added.len())
        .filter(|i| !added_taken[*i])
        .map(|i| (i, near(i, false)))
        .collect();

    Pairing {
        pairs,
        unmatched_removed,
        unmatched_added,
    }
}
