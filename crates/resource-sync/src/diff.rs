//! # Audit Diff
//!
//! Field-level comparison of an audit entry's before/after snapshots.
//!
//! Values are compared whole: a nested object that changed anywhere shows up as one
//! `modified` field carrying both complete values.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    #[serde(rename = "type")]
    pub change: ChangeType,
}

/// Lists every field that differs between `old` and `new`, sorted by field name.
///
/// A missing side behaves like an empty object, so `diff(None, Some(new))` reports every
/// key of `new` as added.
pub fn diff(old: Option<&Map<String, Value>>, new: Option<&Map<String, Value>>) -> Vec<FieldChange> {
    let empty = Map::new();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);

    let fields: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    fields
        .into_iter()
        .filter_map(|field| {
            let change = match (old.get(field), new.get(field)) {
                (None, Some(_)) => ChangeType::Added,
                (Some(_), None) => ChangeType::Removed,
                (Some(before), Some(after)) if before != after => ChangeType::Modified,
                _ => return None,
            };
            Some(FieldChange {
                field: field.clone(),
                old_value: old.get(field).cloned(),
                new_value: new.get(field).cloned(),
                change,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_diff_classifies_every_key() {
        let old = object(json!({"a": 1, "b": 2, "c": {"x": 1}}));
        let new = object(json!({"b": 3, "c": {"x": 1}, "d": 4}));

        let changes = diff(Some(&old), Some(&new));
        assert_eq!(
            changes,
            vec![
                FieldChange {
                    field: "a".into(),
                    old_value: Some(json!(1)),
                    new_value: None,
                    change: ChangeType::Removed,
                },
                FieldChange {
                    field: "b".into(),
                    old_value: Some(json!(2)),
                    new_value: Some(json!(3)),
                    change: ChangeType::Modified,
                },
                FieldChange {
                    field: "d".into(),
                    old_value: None,
                    new_value: Some(json!(4)),
                    change: ChangeType::Added,
                },
            ]
        );
    }

    #[test]
    fn test_missing_old_values_means_everything_added() {
        let new = object(json!({"name": "Acme", "plan": "pro"}));
        let changes = diff(None, Some(&new));
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.change == ChangeType::Added));
    }

    #[test]
    fn test_nested_change_is_one_modified_field() {
        let old = object(json!({"address": {"city": "Lyon", "zip": "69001"}}));
        let new = object(json!({"address": {"city": "Paris", "zip": "69001"}}));
        let changes = diff(Some(&old), Some(&new));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "address");
        assert_eq!(changes[0].new_value, Some(json!({"city": "Paris", "zip": "69001"})));
    }

    #[test]
    fn test_identical_and_empty_inputs_yield_nothing() {
        let same = object(json!({"a": [1, 2], "b": null}));
        assert!(diff(Some(&same), Some(&same)).is_empty());
        assert!(diff(None, None).is_empty());
    }

    #[test]
    fn test_serializes_with_type_field() {
        let change = FieldChange {
            field: "status".into(),
            old_value: Some(json!("active")),
            new_value: Some(json!("suspended")),
            change: ChangeType::Modified,
        };
        assert_eq!(
            serde_json::to_value(change).unwrap(),
            json!({"field": "status", "oldValue": "active", "newValue": "suspended", "type": "modified"})
        );
    }
}
