use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::from_value_at_path;
use crate::{
    error::{Result, ToolError},
    schemas::FunctionSchema,
};

/// Caller-declared description of a callable function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON-Schema-like object describing the parameters
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Declared properties, if the parameter schema has any
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.parameters
            .get("properties")
            .and_then(|value| value.as_object())
    }

    /// Names listed under `required`, in declaration order
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|value| value.as_array())
            .map(|names| names.iter().filter_map(|name| name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Only an explicit `"additionalProperties": true` opts out of the
    /// unexpected-parameter check.
    pub fn allows_additional_parameters(&self) -> bool {
        self.parameters
            .get("additionalProperties")
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}

/// Caller-pinned requirement that a specific tool be invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoice {
    pub name: String,
}

impl ToolChoice {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&str> for ToolChoice {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A function call recovered from model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedCall {
    pub name: String,
    /// Absent or `null` parameters decode as an empty map
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parameters: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExtractedCall {
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Decode one `<functioncall>` payload
    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload.trim())
    }

    /// Get a human-readable description
    pub fn describe(&self) -> String {
        format!("{}({})", self.name, Value::Object(self.parameters.clone()))
    }

    /// Deserialize the parameters into `T`, reporting the failing path on error.
    pub fn parse_parameters<T: DeserializeOwned>(&self) -> Result<T> {
        let params = Value::Object(self.parameters.clone());
        serde_path_to_error::deserialize(params).map_err(|err| {
            let path = err.path().to_string();
            let location = if path == "." {
                "<root>".to_string()
            } else {
                path
            };
            ToolError::SchemaValidation(format!(
                "failed to deserialize parameters of `{}` at {}: {}",
                self.name,
                location,
                err.into_inner()
            ))
        })
    }

    /// Like [`parse_parameters`](Self::parse_parameters), but first checks
    /// that the call targets `T`'s function. A call for another function is a
    /// `SchemaValidation` error.
    pub fn parse<T: FunctionSchema>(&self) -> Result<T> {
        let expected = &T::tool_schema().name;
        if &self.name != expected {
            return Err(ToolError::SchemaValidation(format!(
                "call targets `{}` but `{}` was expected",
                self.name, expected
            )));
        }
        self.parse_parameters()
    }
}

/// Parse a JSON array of `{name, description, parameters}` objects.
pub fn parse_tools(value: Value) -> Result<Vec<ToolSchema>> {
    from_value_at_path(value, "tools")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_schema() -> ToolSchema {
        ToolSchema::new(
            "GetWeather",
            "Get weather details of a given location.",
            json!({
                "type": "object",
                "properties": {"location": {"type": "string"}, "days": {"type": "integer"}},
                "required": ["location"]
            }),
        )
    }

    #[test]
    fn test_schema_accessors() {
        let schema = weather_schema();
        assert_eq!(schema.required_parameters(), vec!["location"]);
        assert!(schema.properties().unwrap().contains_key("days"));
        assert!(!schema.allows_additional_parameters());
    }

    #[test]
    fn test_call_from_payload() {
        let call =
            ExtractedCall::from_payload(r#" {"name": "GetWeather", "parameters": {"location": "NY"}} "#)
                .unwrap();
        assert_eq!(call.name, "GetWeather");
        assert_eq!(call.parameters["location"], "NY");
        assert_eq!(call.describe(), r#"GetWeather({"location":"NY"})"#);
    }

    #[test]
    fn test_call_without_parameters_defaults_to_empty() {
        let call = ExtractedCall::from_payload(r#"{"name": "Ping"}"#).unwrap();
        assert!(call.parameters.is_empty());
    }

    #[test]
    fn test_null_parameters_decode_as_empty() {
        let call = ExtractedCall::from_payload(r#"{"name": "Ping", "parameters": null}"#).unwrap();
        assert_eq!(call.name, "Ping");
        assert!(call.parameters.is_empty());

        assert!(ExtractedCall::from_payload(r#"{"name": "Ping", "parameters": [1]}"#).is_err());
    }

    #[test]
    fn test_parse_parameters_reports_path() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Forecast {
            location: String,
            days: u32,
        }

        let call = ExtractedCall::from_payload(
            r#"{"name": "GetWeather", "parameters": {"location": "NY", "days": "three"}}"#,
        )
        .unwrap();

        let err = call.parse_parameters::<Forecast>().unwrap_err();
        assert!(err.to_string().contains("at days"), "got: {}", err);
    }

    #[test]
    fn test_parse_tools_requires_description() {
        let err = parse_tools(json!([{"name": "AddTodo", "parameters": {}}])).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_VALIDATION_ERROR");
    }
}
