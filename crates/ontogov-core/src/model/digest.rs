//! Content digests for snapshots
//!
//! The content digest hashes the canonical JSON form of a snapshot with
//! `created_at` removed, so two snapshots describing the same ontology share
//! a digest regardless of when they were produced. Element order is part of
//! the content.

use sha2::{Digest, Sha256};

use crate::errors::Result;
use crate::model::snapshot::OntologySnapshot;

/// Hex-encoded SHA256 over the snapshot content, excluding `created_at`
///
/// # Errors
///
/// `ERR_SERIALIZATION` if the snapshot cannot be converted to JSON
/// (non-finite constraint bounds).
pub fn content_digest(snapshot: &OntologySnapshot) -> Result<String> {
    let mut value = serde_json::to_value(snapshot)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("created_at");
    }
    // serde_json maps are key-sorted, which makes this serialization canonical
    let canonical = serde_json::to_string(&value)?;
    Ok(hash_string(&canonical))
}

fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}
