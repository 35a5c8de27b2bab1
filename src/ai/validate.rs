//! Structural checks applied before a generated schema is approved.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

fn invalid(message: impl Into<String>) -> Error {
    Error::SchemaValidation(message.into())
}

fn require_string(schema: &Map<String, Value>, key: &str) -> Result<()> {
    match schema.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        Some(Value::String(_)) => Err(invalid(format!("Schema '{key}' must not be empty"))),
        Some(_) => Err(invalid(format!("Schema '{key}' must be a string"))),
        None => Err(invalid(format!("Schema must have a '{key}' field"))),
    }
}

fn require_array<'a>(schema: &'a Map<String, Value>, key: &str) -> Result<&'a [Value]> {
    match schema.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(invalid(format!("Schema '{key}' must be an array"))),
        None => Err(invalid(format!("Schema must have a '{key}' array"))),
    }
}

fn string_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Validate a generated form schema.
///
/// The first violation found is returned as [`Error::SchemaValidation`].
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use gradian_client::ai::validate_schema;
///
/// let err = validate_schema(&json!({"fields": [], "sections": []})).unwrap_err();
/// assert!(err.to_string().contains("id"));
/// ```
pub fn validate_schema(schema: &Value) -> Result<()> {
    let object = schema
        .as_object()
        .ok_or_else(|| invalid("Schema must be a JSON object"))?;

    match object.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => {}
        _ => return Err(invalid("Schema must have an 'id' field")),
    }
    require_string(object, "singular_name")?;
    require_string(object, "plural_name")?;

    let sections = require_array(object, "sections")?;
    let mut section_ids = HashSet::new();
    for (index, section) in sections.iter().enumerate() {
        let id = string_field(section, "id")
            .ok_or_else(|| invalid(format!("Section at index {index} must have an 'id'")))?;
        section_ids.insert(id);
    }

    let fields = require_array(object, "fields")?;
    let mut field_ids = HashSet::new();
    for (index, field) in fields.iter().enumerate() {
        let id = string_field(field, "id")
            .ok_or_else(|| invalid(format!("Field at index {index} must have an 'id'")))?;
        if string_field(field, "name").is_none() {
            return Err(invalid(format!("Field '{id}' must have a 'name'")));
        }
        if !field_ids.insert(id) {
            return Err(invalid(format!("Duplicate field id '{id}'")));
        }
        if let Some(section_id) = string_field(field, "sectionId") {
            if !section_ids.contains(section_id) {
                return Err(invalid(format!(
                    "Field '{id}' references unknown section '{section_id}'"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": "tickets",
            "singular_name": "Ticket",
            "plural_name": "Tickets",
            "sections": [{"id": "main", "title": "Main"}],
            "fields": [
                {"id": "title", "name": "title", "sectionId": "main"},
                {"id": "notes", "name": "notes"}
            ]
        })
    }

    fn message(schema: &Value) -> String {
        validate_schema(schema).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_schema() {
        validate_schema(&valid()).unwrap();
    }

    #[test]
    fn test_missing_id() {
        let msg = message(&json!({"fields": [], "sections": []}));
        assert_eq!(msg, "Schema must have an 'id' field");
    }

    #[test]
    fn test_not_an_object() {
        assert!(message(&json!([1, 2])).contains("object"));
    }

    #[test]
    fn test_names_must_be_strings() {
        let mut schema = valid();
        schema["plural_name"] = json!(3);
        assert!(message(&schema).contains("plural_name"));

        schema.as_object_mut().unwrap().remove("singular_name");
        assert!(message(&schema).contains("singular_name"));
    }

    #[test]
    fn test_arrays_required() {
        let mut schema = valid();
        schema["fields"] = json!({});
        assert!(message(&schema).contains("'fields' must be an array"));
    }

    #[test]
    fn test_field_requirements() {
        let mut schema = valid();
        schema["fields"] = json!([{"id": "a"}]);
        assert!(message(&schema).contains("'name'"));

        schema["fields"] = json!([{"name": "a"}]);
        assert!(message(&schema).contains("index 0"));
    }

    #[test]
    fn test_unknown_section_reference() {
        let mut schema = valid();
        schema["fields"] = json!([{"id": "a", "name": "a", "sectionId": "nope"}]);
        assert!(message(&schema).contains("unknown section 'nope'"));
    }

    #[test]
    fn test_duplicate_field_ids() {
        let mut schema = valid();
        schema["fields"] = json!([
            {"id": "a", "name": "a"},
            {"id": "a", "name": "b"}
        ]);
        assert!(message(&schema).contains("Duplicate field id 'a'"));
    }
}
