//! Check tool call arguments against the tool's declared schema.

use serde_json::Value;

/// Validate arguments against an object-shaped JSON Schema.
///
/// Checks the top-level type, required fields, property types and, for
/// arrays, the declared item type. Returns a message describing the first
/// violation.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(format!(
            "expected object arguments, got {}",
            json_type_name(args)
        ));
    }
    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    if let Some(missing) = required.into_iter().find(|name| !obj.contains_key(*name)) {
        return Err(format!("missing required field '{missing}'"));
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in obj {
        let Some(prop_schema) = properties.get(key) else {
            continue;
        };
        check_property(key, value, prop_schema)?;
    }
    Ok(())
}

fn check_property(key: &str, value: &Value, schema: &Value) -> Result<(), String> {
    let Some(expected) = schema.get("type").and_then(Value::as_str) else {
        return Ok(());
    };
    if !value_matches_type(value, expected) {
        return Err(format!(
            "field '{key}' expected type '{expected}', got {}",
            json_type_name(value)
        ));
    }
    if let (Some(items), Some(item_type)) = (
        value.as_array(),
        schema
            .get("items")
            .and_then(|items| items.get("type"))
            .and_then(Value::as_str),
    ) {
        if let Some((idx, bad)) = items
            .iter()
            .enumerate()
            .find(|(_, item)| !value_matches_type(item, item_type))
        {
            return Err(format!(
                "field '{key}[{idx}]' expected type '{item_type}', got {}",
                json_type_name(bad)
            ));
        }
    }
    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "q": { "type": "string" },
                "maxResults": { "type": "integer" },
                "fields": { "type": "array", "items": { "type": "string" } },
            },
            "required": ["q"],
        })
    }

    #[test]
    fn rejects_non_object_arguments() {
        let err = validate_arguments(&json!([1, 2]), &query_schema()).unwrap_err();
        assert!(err.contains("expected object"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = validate_arguments(&json!({ "maxResults": 3 }), &query_schema()).unwrap_err();
        assert_eq!(err, "missing required field 'q'");
    }

    #[test]
    fn rejects_wrong_property_type() {
        let err =
            validate_arguments(&json!({ "q": "rust", "maxResults": "3" }), &query_schema())
                .unwrap_err();
        assert!(err.contains("'maxResults' expected type 'integer'"));
    }

    #[test]
    fn rejects_wrong_array_item_type() {
        let err = validate_arguments(&json!({ "q": "rust", "fields": ["name", 7] }), &query_schema())
            .unwrap_err();
        assert!(err.contains("'fields[1]'"));
    }

    #[test]
    fn accepts_valid_arguments_and_unknown_extras() {
        let args = json!({ "q": "rust", "maxResults": 3, "fields": ["title"], "extra": true });
        assert!(validate_arguments(&args, &query_schema()).is_ok());
    }

    #[test]
    fn untyped_properties_accept_anything() {
        let schema = json!({
            "type": "object",
            "properties": { "data": { "description": "anything" } },
            "required": ["data"],
        });
        assert!(validate_arguments(&json!({ "data": [1, { "a": null }] }), &schema).is_ok());
    }
}
