//! Draft values and error maps

use super::schema::{Absent, FieldKind, FieldSpec, Schema};
use super::value::FieldValue;
use crate::state::Record;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Field name to human-readable message, one per field
pub type ErrorMap = BTreeMap<String, String>;

/// In-progress, unsaved values of an entity form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    values: BTreeMap<String, FieldValue>,
}

impl Draft {
    /// Draft holding every field's declared default
    pub fn defaults(schema: &Schema) -> Self {
        Self {
            values: schema
                .fields
                .iter()
                .map(|spec| (spec.name.to_string(), spec.default_value()))
                .collect(),
        }
    }

    /// Draft seeded from an existing record's recognized fields.
    ///
    /// Unknown keys are ignored. Missing, null or mistyped values fall back
    /// to the field's empty value, never to its create-form default.
    pub fn seed(schema: &Schema, initial: Option<&Record>) -> Self {
        let Some(record) = initial else {
            return Self::defaults(schema);
        };
        Self {
            values: schema
                .fields
                .iter()
                .map(|spec| (spec.name.to_string(), seed_value(spec, record)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text of a field, empty for flags and unknown names
    pub fn text(&self, name: &str) -> &str {
        self.values.get(name).map(FieldValue::as_text).unwrap_or("")
    }

    pub fn flag(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(FieldValue::as_flag)
    }

    /// Write a value for a known field; unknown names are ignored
    pub fn set(&mut self, name: &str, value: FieldValue) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Reset a field to its empty value
    pub fn clear(&mut self, name: &str) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = slot.emptied();
        }
    }

    /// Build the submit payload, applying each field's absent policy to
    /// empty and hidden values
    pub fn to_payload(&self, schema: &Schema) -> Record {
        let mut payload = Record::new();
        for spec in schema.fields {
            let value = self.get(spec.name).cloned().unwrap_or_else(|| spec.empty_value());
            let present = spec.is_visible(self) && !value.is_empty();
            let json = if present {
                present_json(spec, &value)
            } else {
                match spec.absent {
                    Absent::Empty => empty_json(spec),
                    Absent::Null => Value::Null,
                }
            };
            payload.insert(spec.name.to_string(), json);
        }
        payload
    }
}

fn seed_value(spec: &FieldSpec, record: &Record) -> FieldValue {
    let empty = spec.empty_value();
    let Some(json) = record.get(spec.name) else {
        return empty;
    };
    match empty.coerce_json(json) {
        Some(FieldValue::Text(s)) if spec.kind == FieldKind::Date => {
            // Timestamps keep only their calendar date
            let date = s.split('T').next().unwrap_or_default().to_string();
            FieldValue::Text(date)
        }
        Some(value) => value,
        None => empty,
    }
}

fn present_json(spec: &FieldSpec, value: &FieldValue) -> Value {
    match (spec.kind, value) {
        (_, FieldValue::Flag(b)) => Value::Bool(*b),
        (FieldKind::Decimal, FieldValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        (_, FieldValue::Text(s)) | (_, FieldValue::Choice(s)) => Value::String(s.clone()),
    }
}

fn empty_json(spec: &FieldSpec) -> Value {
    match spec.kind {
        FieldKind::Flag => Value::Bool(false),
        _ => Value::String(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::catalog;
    use crate::state::EntityKind;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    mod seeding {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_seed_without_initial_equals_defaults() {
            let schema = catalog::schema_for(EntityKind::Application);
            assert_eq!(Draft::seed(schema, None), Draft::defaults(schema));
        }

        #[test]
        fn test_application_defaults() {
            let draft = Draft::defaults(catalog::schema_for(EntityKind::Application));
            assert_eq!(draft.text("project_code"), "");
            assert_eq!(draft.text("status"), "Development");
            assert_eq!(draft.text("reason_withdrawn"), "");
            assert_eq!(draft.text("outcome"), "");
        }

        #[test]
        fn test_project_defaults_have_false_flag() {
            let draft = Draft::defaults(catalog::schema_for(EntityKind::Project));
            assert!(!draft.flag("archived"));
            assert_eq!(draft.get("archived"), Some(&FieldValue::Flag(false)));
        }

        #[test]
        fn test_seed_ignores_unknown_fields() {
            let schema = catalog::schema_for(EntityKind::Project);
            let initial = record(json!({
                "project_code": "ABCD",
                "project_name": "Riverside",
                "created_at": "2024-01-01T00:00:00Z",
            }));
            let draft = Draft::seed(schema, Some(&initial));
            assert_eq!(draft.text("project_code"), "ABCD");
            assert_eq!(draft.text("project_name"), "Riverside");
            assert!(draft.get("created_at").is_none());
        }

        #[test]
        fn test_seed_falls_back_to_empties() {
            let schema = catalog::schema_for(EntityKind::Application);
            let initial = record(json!({
                "project_code": "ABCD",
                "reason_withdrawn": null,
                "outcome": 7,
            }));
            let draft = Draft::seed(schema, Some(&initial));
            assert_eq!(draft.text("status"), "");
            assert_eq!(draft.text("reason_withdrawn"), "");
            assert_eq!(draft.text("outcome"), "7");
        }

        #[test]
        fn test_seed_mistyped_flag_is_false() {
            let schema = catalog::schema_for(EntityKind::Project);
            let initial = record(json!({ "archived": "yes" }));
            assert!(!Draft::seed(schema, Some(&initial)).flag("archived"));
        }

        #[test]
        fn test_seed_trims_timestamp_to_date_and_stringifies_numbers() {
            let schema = catalog::schema_for(EntityKind::Quote);
            let initial = record(json!({
                "date_quoted": "2024-03-05T10:00:00.000Z",
                "fee_ex_vat": 1250.5,
            }));
            let draft = Draft::seed(schema, Some(&initial));
            assert_eq!(draft.text("date_quoted"), "2024-03-05");
            assert_eq!(draft.text("fee_ex_vat"), "1250.5");
        }
    }

    mod editing {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_set_unknown_field_is_ignored() {
            let mut draft = Draft::defaults(catalog::schema_for(EntityKind::Project));
            assert!(!draft.set("nope", FieldValue::Text("x".to_string())));
            assert!(draft.get("nope").is_none());
        }

        #[test]
        fn test_clear_resets_to_empty() {
            let mut draft = Draft::defaults(catalog::schema_for(EntityKind::Application));
            draft.clear("status");
            assert_eq!(draft.get("status"), Some(&FieldValue::Choice(String::new())));
        }
    }

    mod payload {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_application_hidden_fields_are_null() {
            let schema = catalog::schema_for(EntityKind::Application);
            let mut draft = Draft::defaults(schema);
            draft.set("project_code", FieldValue::Choice("ABCD".to_string()));
            draft.set("reason_withdrawn", FieldValue::Text("stale".to_string()));

            let payload = draft.to_payload(schema);
            assert_eq!(
                Value::Object(payload),
                json!({
                    "project_code": "ABCD",
                    "status": "Development",
                    "reason_withdrawn": null,
                    "outcome": null,
                })
            );
        }

        #[test]
        fn test_quote_numbers_and_nulls() {
            let schema = catalog::schema_for(EntityKind::Quote);
            let mut draft = Draft::defaults(schema);
            draft.set("quote_status", FieldValue::Choice("Received".to_string()));
            draft.set("fee_ex_vat", FieldValue::Text("99.5".to_string()));

            let payload = draft.to_payload(schema);
            assert_eq!(payload.get("fee_ex_vat"), Some(&json!(99.5)));
            assert_eq!(payload.get("date_quoted"), Some(&Value::Null));
            assert_eq!(payload.get("quote_reference"), Some(&Value::Null));
        }

        #[test]
        fn test_project_keeps_empty_strings_and_flags() {
            let schema = catalog::schema_for(EntityKind::Project);
            let mut draft = Draft::defaults(schema);
            draft.set("project_code", FieldValue::Text("ABCD".to_string()));
            draft.set("project_name", FieldValue::Text("Riverside".to_string()));

            let payload = draft.to_payload(schema);
            assert_eq!(payload.get("description"), Some(&json!("")));
            assert_eq!(payload.get("archived"), Some(&json!(false)));
        }

        #[test]
        fn test_cleared_relations_are_sent_as_null() {
            let schema = catalog::schema_for(EntityKind::Task);
            let initial = record(json!({
                "task_id": 4,
                "title": "Site visit",
                "project_code": "ABCD",
                "application_id": 2,
            }));
            let mut draft = Draft::seed(schema, Some(&initial));
            draft.clear("project_code");
            draft.clear("application_id");

            let payload = draft.to_payload(schema);
            assert_eq!(payload.get("project_code"), Some(&Value::Null));
            assert_eq!(payload.get("application_id"), Some(&Value::Null));
            assert_eq!(payload.get("title"), Some(&json!("Site visit")));
        }

        #[test]
        fn test_every_declared_field_is_in_the_payload() {
            for kind in EntityKind::ALL {
                let schema = catalog::schema_for(kind);
                let payload = Draft::defaults(schema).to_payload(schema);
                assert_eq!(payload.len(), schema.fields.len(), "{kind:?}");
            }
        }
    }
}
