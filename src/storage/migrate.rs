//! Load-time migrations for older state file layouts.
//!
//! Migrations run on the raw JSON tree before it is deserialized into the
//! typed records, so renamed statuses and reshaped history entries never
//! reach the store in their old form.

use serde_json::{Map, Value};

/// Retired status labels and their current equivalents.
const STATUS_RENAMES: &[(&str, &str)] = &[("current", "assigned"), ("unknown", "future")];

/// Rewrite a raw state document in place. Returns how many fields changed.
pub fn migrate(doc: &mut Value) -> usize {
    let mut changed = 0;

    if let Some(matches) = doc.get_mut("matches").and_then(Value::as_object_mut) {
        for (id, record) in matches.iter_mut() {
            if let Some(fields) = record.as_object_mut() {
                changed += migrate_match(id, fields);
            }
        }
    }

    if let Some(history) = doc.get_mut("execution_history").and_then(Value::as_array_mut) {
        for entry in history.iter_mut() {
            if let Some(fields) = entry.as_object_mut() {
                if fields.contains_key("completed_matches") {
                    *fields = reshape_legacy_execution(fields);
                    changed += 1;
                }
            }
        }
    }

    changed
}

fn migrate_match(id: &str, fields: &mut Map<String, Value>) -> usize {
    let mut changed = 0;

    if let Some(Value::String(status)) = fields.get_mut("status") {
        if let Some((_, current)) = STATUS_RENAMES.iter().find(|(old, _)| *old == status.as_str()) {
            *status = (*current).to_string();
            changed += 1;
        }
    }

    if !fields.contains_key("uuid") {
        fields.insert("uuid".to_string(), Value::String(id.to_string()));
        changed += 1;
    }

    if let Some(marker) = fields.get_mut("match_completed") {
        let normalized = normalize_completed_marker(marker);
        if normalized != *marker {
            *marker = normalized;
            changed += 1;
        }
    }

    changed
}

/// Older history entries counted `completed_matches`/`unknown_matches`;
/// those map to today's `assigned_matches`/`future_matches`.
fn reshape_legacy_execution(old: &Map<String, Value>) -> Map<String, Value> {
    let count = |key: &str| old.get(key).cloned().unwrap_or(Value::from(0));

    let mut fresh = Map::new();
    if let Some(ts) = old.get("timestamp") {
        fresh.insert("timestamp".to_string(), ts.clone());
    }
    fresh.insert("matches_found".to_string(), count("matches_found"));
    fresh.insert("new_matches".to_string(), count("new_matches"));
    fresh.insert("future_matches".to_string(), count("unknown_matches"));
    fresh.insert("assigned_matches".to_string(), count("completed_matches"));
    fresh
}

/// The results API reports completion as an opaque scalar. Falsy values mean
/// "not completed"; anything else is kept as its string form.
pub fn normalize_completed_marker(raw: &Value) -> Value {
    match raw {
        Value::Null | Value::Bool(false) => Value::Null,
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(_) => raw.clone(),
        Value::Number(n) if n.as_f64() == Some(0.0) => Value::Null,
        Value::Bool(true) => Value::String("true".to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(_) | Value::Object(_) => Value::String(raw.to_string()),
    }
}
