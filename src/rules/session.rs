//! SessionState — live pre-session state evaluated against rules
//!
//! Fields are named and typed; rules reference them by name through
//! `condition_fields`. Unknown extra fields ride in `extras` so surrounding
//! application surfaces can add signals without a core change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed field value, comparable by rule conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Live pre-session state supplied by the caller at serve time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Composite readiness in [0, 1]
    #[serde(default)]
    pub readiness: f64,
    /// Self-reported fatigue in [0, 1]
    #[serde(default)]
    pub fatigue: f64,
    /// Self-reported motivation in [0, 1]
    #[serde(default)]
    pub motivation: f64,
    /// Whether the athlete reports pain
    #[serde(default)]
    pub has_pain: bool,
    /// Last-night sleep quality in [0, 1]
    #[serde(default)]
    pub sleep_quality: f64,
    /// Life stress in [0, 1]
    #[serde(default)]
    pub stress: f64,
    /// Minutes available for the session
    #[serde(default)]
    pub available_min: f64,
    /// Current training phase name
    #[serde(default)]
    pub phase: String,
    /// Additional named signals
    #[serde(default)]
    pub extras: BTreeMap<String, FieldValue>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            readiness: 0.5,
            fatigue: 0.5,
            motivation: 0.5,
            has_pain: false,
            sleep_quality: 0.5,
            stress: 0.5,
            available_min: 60.0,
            phase: "base".to_string(),
            extras: BTreeMap::new(),
        }
    }
}

impl SessionState {
    /// Look up a field by name. Typed fields first, then extras.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "readiness" => Some(FieldValue::Number(self.readiness)),
            "fatigue" => Some(FieldValue::Number(self.fatigue)),
            "motivation" => Some(FieldValue::Number(self.motivation)),
            "has_pain" => Some(FieldValue::Bool(self.has_pain)),
            "sleep_quality" => Some(FieldValue::Number(self.sleep_quality)),
            "stress" => Some(FieldValue::Number(self.stress)),
            "available_min" => Some(FieldValue::Number(self.available_min)),
            "phase" => Some(FieldValue::Text(self.phase.clone())),
            other => self.extras.get(other).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_field_lookup() {
        let state = SessionState {
            readiness: 0.8,
            has_pain: true,
            ..SessionState::default()
        };
        assert_eq!(state.field("readiness"), Some(FieldValue::Number(0.8)));
        assert_eq!(state.field("has_pain"), Some(FieldValue::Bool(true)));
        assert_eq!(
            state.field("phase"),
            Some(FieldValue::Text("base".to_string()))
        );
    }

    #[test]
    fn test_extras_lookup() {
        let mut state = SessionState::default();
        state
            .extras
            .insert("hrv".to_string(), FieldValue::Number(62.0));
        assert_eq!(state.field("hrv"), Some(FieldValue::Number(62.0)));
        assert_eq!(state.field("unknown"), None);
    }
}
