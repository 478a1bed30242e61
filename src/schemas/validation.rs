//! Structural checks of extracted calls against their declared schemas.
//!
//! Every mismatch becomes one human-readable line. The lines are fed back to
//! the model verbatim when a retry is allowed, so their wording is part of
//! the prompt surface.

use serde_json::Value;

use crate::types::{ExtractedCall, ToolSchema};

/// Validate every call, concatenating the errors in call order.
pub fn validate_calls(calls: &[ExtractedCall], schemas: &[ToolSchema]) -> Vec<String> {
    calls
        .iter()
        .flat_map(|call| validate_call(call, schemas))
        .collect()
}

/// Validate one call. An empty result means the call is valid.
pub fn validate_call(call: &ExtractedCall, schemas: &[ToolSchema]) -> Vec<String> {
    let Some(schema) = schemas.iter().find(|schema| schema.name == call.name) else {
        return vec![format!("unknown function: {}", call.name)];
    };

    let mut errors = Vec::new();

    for required in schema.required_parameters() {
        if !call.parameters.contains_key(required) {
            errors.push(format!(
                "missing required parameter '{}' for function '{}'",
                required, call.name
            ));
        }
    }

    let properties = schema.properties();
    for (param, value) in &call.parameters {
        match properties.and_then(|props| props.get(param)) {
            Some(declared) => {
                if let Some(expected) = declared.get("type") {
                    if !type_matches(expected, value) {
                        errors.push(format!(
                            "invalid type for parameter '{}' of function '{}': expected {}, got {}",
                            param,
                            call.name,
                            describe_expected(expected),
                            json_type_name(value)
                        ));
                    }
                }
            }
            None if schema.allows_additional_parameters() => {}
            None => errors.push(format!(
                "unexpected parameter '{}' for function '{}'",
                param, call.name
            )),
        }
    }

    errors
}

fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(name) => primitive_matches(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(|name| name.as_str())
            .any(|name| primitive_matches(name, value)),
        _ => true,
    }
}

fn primitive_matches(type_name: &str, value: &Value) -> bool {
    match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown declared types are accepted.
        _ => true,
    }
}

fn describe_expected(expected: &Value) -> String {
    match expected {
        Value::String(name) => name.clone(),
        Value::Array(names) => names
            .iter()
            .filter_map(|name| name.as_str())
            .collect::<Vec<_>>()
            .join(" | "),
        other => other.to_string(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schemas() -> Vec<ToolSchema> {
        vec![ToolSchema::new(
            "GetWeather",
            "Get weather details of a given location.",
            json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string"},
                    "days": {"type": "integer"},
                    "detailed": {"type": "boolean"},
                    "units": {"type": ["string", "null"]},
                    "when": {"type": "date"}
                },
                "required": ["location"]
            }),
        )]
    }

    fn call(value: Value) -> ExtractedCall {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_call_has_no_errors() {
        let call = call(json!({"name": "GetWeather", "parameters": {"location": "NY", "days": 3}}));
        assert!(validate_call(&call, &schemas()).is_empty());
    }

    #[test]
    fn test_unknown_function_skips_other_checks() {
        let call = call(json!({"name": "GetTime", "parameters": {"zone": 1}}));
        assert_eq!(validate_call(&call, &schemas()), vec!["unknown function: GetTime"]);
    }

    #[test]
    fn test_missing_required_parameter() {
        let call = call(json!({"name": "GetWeather", "parameters": {}}));
        assert_eq!(
            validate_call(&call, &schemas()),
            vec!["missing required parameter 'location' for function 'GetWeather'"]
        );
    }

    #[test]
    fn test_unexpected_parameter() {
        let call = call(json!({"name": "GetWeather", "parameters": {"location": "NY", "zip": "10001"}}));
        assert_eq!(
            validate_call(&call, &schemas()),
            vec!["unexpected parameter 'zip' for function 'GetWeather'"]
        );
    }

    #[test]
    fn test_type_mismatches() {
        let call = call(json!({
            "name": "GetWeather",
            "parameters": {"location": 42, "days": 2.5, "detailed": "yes"}
        }));
        let errors = validate_call(&call, &schemas());

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(
            &"invalid type for parameter 'location' of function 'GetWeather': expected string, got integer"
                .to_string()
        ));
        assert!(errors.iter().any(|e| e.contains("'days'") && e.contains("got number")));
        assert!(errors.iter().any(|e| e.contains("'detailed'") && e.contains("expected boolean")));
    }

    #[test]
    fn test_union_and_unknown_types_are_permissive() {
        let call = call(json!({
            "name": "GetWeather",
            "parameters": {"location": "NY", "units": null, "when": "tomorrow"}
        }));
        assert!(validate_call(&call, &schemas()).is_empty());
    }

    #[test]
    fn test_additional_properties_true_allows_extras() {
        let open = vec![ToolSchema::new(
            "Log",
            "Log anything",
            json!({"type": "object", "properties": {}, "additionalProperties": true}),
        )];
        let call = call(json!({"name": "Log", "parameters": {"anything": [1, 2]}}));
        assert!(validate_call(&call, &open).is_empty());
    }

    #[test]
    fn test_validate_calls_keeps_call_order() {
        let calls = vec![
            call(json!({"name": "Nope", "parameters": {}})),
            call(json!({"name": "GetWeather", "parameters": {}})),
        ];
        let errors = validate_calls(&calls, &schemas());
        assert_eq!(errors[0], "unknown function: Nope");
        assert!(errors[1].starts_with("missing required parameter 'location'"));
    }
}
