//! Canonical serialization and action hashing per CANON.md §3
//!
//! Invariants:
//! - C2: canon(x) == canon(x) under any input key ordering
//! - C3: semantically-unordered fields never affect the hash
//! - C4: the hash is a pure function of canonical content + engine version,
//!   so engine upgrades can never silently collide with old hashes
//!
//! Key ordering comes for free: serde_json's default Map is a BTreeMap, so
//! object keys in the canonical rendering are always sorted. Phase/block/item
//! order is semantic and preserved.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

use super::dose::DoseFeatures;
use super::errors::CanonResult;
use super::plan::WorkoutPlan;
use crate::ENGINE_VERSION;

/// Stable identity of a canonicalized plan.
///
/// Lowercase hex SHA-256 of the canonical rendering, salted with the engine
/// version. Used as the cross-expert join key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ActionId(String);

impl ActionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The result of canonicalizing a plan: the typed plan, its canonical JSON
/// rendering, its action id, and the derived dose features.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalAction {
    pub plan: WorkoutPlan,
    pub canonical_json: String,
    pub action_id: ActionId,
    pub dose_features: DoseFeatures,
}

/// Validate and canonicalize an arbitrary plan payload.
///
/// Per CANON.md §C1 the payload is validated first; a schema violation is
/// returned as `ValidationError` and nothing is hashed or stored.
pub fn canonicalize(payload: &Value) -> CanonResult<CanonicalAction> {
    let plan = WorkoutPlan::from_value(payload)?;
    Ok(canonicalize_plan(plan))
}

/// Canonicalize an already-typed plan.
pub fn canonicalize_plan(plan: WorkoutPlan) -> CanonicalAction {
    let canonical_json = canonical_rendering(&plan);
    let action_id = hash_canonical(&canonical_json);
    let dose_features = DoseFeatures::derive(&plan);
    CanonicalAction {
        plan,
        canonical_json,
        action_id,
        dose_features,
    }
}

/// Render the canonical JSON form of a plan.
///
/// Serializing the typed plan through serde_json yields sorted object keys
/// (BTreeMap) and fixed field names; compact formatting removes whitespace
/// variance. Two payloads that parse to the same typed plan always render
/// identically (C2, C3).
fn canonical_rendering(plan: &WorkoutPlan) -> String {
    // Round-trip through Value so struct field order cannot leak into the
    // rendering: Value objects are key-sorted.
    let value = serde_json::to_value(plan).expect("typed plan serializes");
    serde_json::to_string(&value).expect("value renders")
}

/// Hash a canonical rendering into an ActionId (C4).
fn hash_canonical(canonical_json: &str) -> ActionId {
    let mut hasher = Sha256::new();
    hasher.update(ENGINE_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical_json.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    ActionId(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "name": "limit boulder day",
            "phases": [{
                "name": "main",
                "blocks": [{
                    "name": "limit attempts",
                    "items": [{
                        "activity": "climbing",
                        "style": "boulder",
                        "attempts": 12,
                        "intensity": 0.9,
                        "rest_between_s": 180
                    }]
                }]
            }]
        })
    }

    #[test]
    fn test_canonicalization_deterministic() {
        let a = canonicalize(&sample_payload()).unwrap();
        let b = canonicalize(&sample_payload()).unwrap();
        assert_eq!(a.action_id, b.action_id, "C2 VIOLATION: canon not deterministic");
        assert_eq!(a.canonical_json, b.canonical_json);
    }

    #[test]
    fn test_key_order_does_not_affect_action_id() {
        // Same item with reordered keys
        let reordered = json!({
            "phases": [{
                "blocks": [{
                    "items": [{
                        "rest_between_s": 180,
                        "intensity": 0.9,
                        "attempts": 12,
                        "style": "boulder",
                        "activity": "climbing"
                    }],
                    "name": "limit attempts"
                }],
                "name": "main"
            }],
            "name": "limit boulder day"
        });

        let a = canonicalize(&sample_payload()).unwrap();
        let b = canonicalize(&reordered).unwrap();
        assert_eq!(a.action_id, b.action_id, "C3 VIOLATION: key order changed hash");
    }

    #[test]
    fn test_canon_is_idempotent() {
        let first = canonicalize(&sample_payload()).unwrap();
        // Re-canonicalize the canonical rendering itself
        let reparsed: Value = serde_json::from_str(&first.canonical_json).unwrap();
        let second = canonicalize(&reparsed).unwrap();
        assert_eq!(first.action_id, second.action_id, "C2 VIOLATION: canon(canon(x)) != canon(x)");
        assert_eq!(first.canonical_json, second.canonical_json);
    }

    #[test]
    fn test_different_plans_different_action_ids() {
        let mut other = sample_payload();
        other["phases"][0]["blocks"][0]["items"][0]["attempts"] = json!(13);

        let a = canonicalize(&sample_payload()).unwrap();
        let b = canonicalize(&other).unwrap();
        assert_ne!(a.action_id, b.action_id);
    }

    #[test]
    fn test_action_id_is_hex_sha256() {
        let action = canonicalize(&sample_payload()).unwrap();
        assert_eq!(action.action_id.as_str().len(), 64);
        assert!(action
            .action_id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_dose_features_materialized() {
        let action = canonicalize(&sample_payload()).unwrap();
        assert_eq!(action.dose_features.hi_attempts, 12);
    }
}
