//! Typed workout plan per CANON.md §2
//!
//! A plan is phases → blocks → prescribed items. Items are a CLOSED set of
//! tagged activity variants, each with a typed dose record. Free-form
//! payloads are validated into these types at the boundary; nothing
//! downstream ever re-parses raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{CanonResult, ValidationError};

/// A structured workout plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    /// Plan name (normalized: trimmed, internal whitespace collapsed)
    pub name: String,
    /// Ordered phases (order is semantic and preserved)
    pub phases: Vec<PlanPhase>,
}

/// One phase of a plan (e.g., warm-up, main, cool-down).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPhase {
    pub name: String,
    /// Ordered blocks within the phase
    pub blocks: Vec<PlanBlock>,
}

/// One block of prescribed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBlock {
    pub name: String,
    /// Ordered prescribed items
    pub items: Vec<Activity>,
}

/// The closed set of activity variants.
///
/// Per CANON.md §2: an activity tag outside this set is rejected with
/// BETA_PLAN_UNKNOWN_ACTIVITY. Each variant carries a typed dose record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "activity", rename_all = "snake_case")]
pub enum Activity {
    Climbing(ClimbingDose),
    Strength(StrengthDose),
    Mobility(MobilityDose),
    Endurance(EnduranceDose),
    Rest(RestDose),
}

impl Activity {
    /// Returns the activity tag string.
    pub fn tag(&self) -> &'static str {
        match self {
            Activity::Climbing(_) => "climbing",
            Activity::Strength(_) => "strength",
            Activity::Mobility(_) => "mobility",
            Activity::Endurance(_) => "endurance",
            Activity::Rest(_) => "rest",
        }
    }
}

/// Climbing dose. `intensity` is a fraction of limit grade in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimbingDose {
    pub style: ClimbStyle,
    pub attempts: u32,
    pub intensity: f64,
    /// Rest between attempts, seconds
    pub rest_between_s: u32,
}

/// Climbing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimbStyle {
    Boulder,
    Sport,
    Board,
}

impl ClimbStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClimbStyle::Boulder => "boulder",
            ClimbStyle::Sport => "sport",
            ClimbStyle::Board => "board",
        }
    }
}

/// Strength dose. `intensity` is a fraction of 1RM in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthDose {
    pub lift: String,
    pub sets: u32,
    pub reps: u32,
    pub intensity: f64,
    /// Total time under tension, seconds
    pub time_under_tension_s: u32,
}

/// Mobility dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobilityDose {
    pub focus: String,
    pub duration_min: u32,
}

/// Endurance dose. `intensity` in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnduranceDose {
    pub duration_min: u32,
    pub intensity: f64,
}

/// Rest dose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestDose {
    pub duration_min: u32,
}

impl WorkoutPlan {
    /// Validate an arbitrary JSON payload into a typed plan.
    ///
    /// Per CANON.md §C1: validation happens BEFORE hashing. Any schema
    /// violation (unknown activity, missing dose field, wrong type,
    /// out-of-range value) is rejected here and never stored.
    pub fn from_value(value: &Value) -> CanonResult<Self> {
        let obj = as_object(value, "plan")?;

        let name = normalize_name(req_str(obj, "name", "plan")?);
        let phases_raw = req_array(obj, "phases", "plan")?;
        if phases_raw.is_empty() {
            return Err(ValidationError::empty_plan("phases"));
        }

        let mut phases = Vec::with_capacity(phases_raw.len());
        for (pi, phase_val) in phases_raw.iter().enumerate() {
            let path = format!("phases[{}]", pi);
            let phase_obj = as_object(phase_val, &path)?;
            let phase_name = normalize_name(req_str(phase_obj, "name", &path)?);

            let blocks_raw = req_array(phase_obj, "blocks", &path)?;
            if blocks_raw.is_empty() {
                return Err(ValidationError::empty_plan(format!("{}.blocks", path)));
            }

            let mut blocks = Vec::with_capacity(blocks_raw.len());
            for (bi, block_val) in blocks_raw.iter().enumerate() {
                let path = format!("{}.blocks[{}]", path, bi);
                let block_obj = as_object(block_val, &path)?;
                let block_name = normalize_name(req_str(block_obj, "name", &path)?);

                let items_raw = req_array(block_obj, "items", &path)?;
                if items_raw.is_empty() {
                    return Err(ValidationError::empty_plan(format!("{}.items", path)));
                }

                let mut items = Vec::with_capacity(items_raw.len());
                for (ii, item_val) in items_raw.iter().enumerate() {
                    let path = format!("{}.items[{}]", path, ii);
                    items.push(parse_activity(item_val, &path)?);
                }

                blocks.push(PlanBlock {
                    name: block_name,
                    items,
                });
            }

            phases.push(PlanPhase {
                name: phase_name,
                blocks,
            });
        }

        Ok(WorkoutPlan { name, phases })
    }

    /// Iterate all prescribed items across phases and blocks, in plan order.
    pub fn items(&self) -> impl Iterator<Item = &Activity> {
        self.phases
            .iter()
            .flat_map(|p| p.blocks.iter())
            .flat_map(|b| b.items.iter())
    }
}

fn parse_activity(value: &Value, path: &str) -> CanonResult<Activity> {
    let obj = as_object(value, path)?;
    let tag = req_str(obj, "activity", path)?;

    match tag {
        "climbing" => {
            let style = match req_str(obj, "style", path)? {
                "boulder" => ClimbStyle::Boulder,
                "sport" => ClimbStyle::Sport,
                "board" => ClimbStyle::Board,
                other => {
                    return Err(ValidationError::type_mismatch(
                        format!("{}.style", path),
                        "one of: boulder, sport, board",
                        other,
                    ))
                }
            };
            Ok(Activity::Climbing(ClimbingDose {
                style,
                attempts: req_u32(obj, "attempts", path)?,
                intensity: req_unit_fraction(obj, "intensity", path)?,
                rest_between_s: req_u32(obj, "rest_between_s", path)?,
            }))
        }
        "strength" => Ok(Activity::Strength(StrengthDose {
            lift: normalize_name(req_str(obj, "lift", path)?),
            sets: req_u32(obj, "sets", path)?,
            reps: req_u32(obj, "reps", path)?,
            intensity: req_unit_fraction(obj, "intensity", path)?,
            time_under_tension_s: req_u32(obj, "time_under_tension_s", path)?,
        })),
        "mobility" => Ok(Activity::Mobility(MobilityDose {
            focus: normalize_name(req_str(obj, "focus", path)?),
            duration_min: req_u32(obj, "duration_min", path)?,
        })),
        "endurance" => Ok(Activity::Endurance(EnduranceDose {
            duration_min: req_u32(obj, "duration_min", path)?,
            intensity: req_unit_fraction(obj, "intensity", path)?,
        })),
        "rest" => Ok(Activity::Rest(RestDose {
            duration_min: req_u32(obj, "duration_min", path)?,
        })),
        other => Err(ValidationError::unknown_activity(
            format!("{}.activity", path),
            other,
        )),
    }
}

/// Normalize a free-text name: trim, collapse internal whitespace.
///
/// Names are semantically unordered labels; normalization keeps two plans
/// that differ only in incidental whitespace canonically equal (C3).
fn normalize_name(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> CanonResult<&'a serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::type_mismatch(path, "object", json_type_name(value)))
}

fn req_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &str,
    path: &str,
) -> CanonResult<&'a str> {
    let value = obj
        .get(key)
        .ok_or_else(|| ValidationError::missing_field(format!("{}.{}", path, key)))?;
    value.as_str().ok_or_else(|| {
        ValidationError::type_mismatch(
            format!("{}.{}", path, key),
            "string",
            json_type_name(value),
        )
    })
}

fn req_array<'a>(
    obj: &'a serde_json::Map<String, Value>,
    key: &str,
    path: &str,
) -> CanonResult<&'a Vec<Value>> {
    let value = obj
        .get(key)
        .ok_or_else(|| ValidationError::missing_field(format!("{}.{}", path, key)))?;
    value.as_array().ok_or_else(|| {
        ValidationError::type_mismatch(format!("{}.{}", path, key), "array", json_type_name(value))
    })
}

fn req_u32(obj: &serde_json::Map<String, Value>, key: &str, path: &str) -> CanonResult<u32> {
    let value = obj
        .get(key)
        .ok_or_else(|| ValidationError::missing_field(format!("{}.{}", path, key)))?;
    let n = value.as_u64().ok_or_else(|| {
        ValidationError::type_mismatch(
            format!("{}.{}", path, key),
            "non-negative integer",
            json_type_name(value),
        )
    })?;
    u32::try_from(n).map_err(|_| {
        ValidationError::out_of_range(format!("{}.{}", path, key), "<= u32::MAX", n.to_string())
    })
}

fn req_unit_fraction(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    path: &str,
) -> CanonResult<f64> {
    let value = obj
        .get(key)
        .ok_or_else(|| ValidationError::missing_field(format!("{}.{}", path, key)))?;
    let f = value.as_f64().ok_or_else(|| {
        ValidationError::type_mismatch(
            format!("{}.{}", path, key),
            "number",
            json_type_name(value),
        )
    })?;
    if !(0.0..=1.0).contains(&f) || !f.is_finite() {
        return Err(ValidationError::out_of_range(
            format!("{}.{}", path, key),
            "in [0.0, 1.0]",
            f.to_string(),
        ));
    }
    Ok(f)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
