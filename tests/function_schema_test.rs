use claude_tools_rs::{
    function_schema, schema::FunctionSchema, ChatMessage, ExtractedCall, ScriptedCaller,
    ToolCaller, ToolError, ToolRequest,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

/// Get the current weather for a location.
#[function_schema(name = "GetWeather")]
#[derive(Debug, Deserialize, JsonSchema)]
struct GetWeather {
    /// City and state, e.g. San Francisco, CA
    location: String,
    #[serde(default)]
    unit: Option<String>,
}

#[function_schema(description = "Add a TODO with text to remember.")]
#[derive(Debug, Deserialize, JsonSchema)]
struct AddTodo {
    text: String,
}

#[test]
fn test_schema_uses_explicit_name_and_doc_description() {
    let schema = GetWeather::tool_schema();

    assert_eq!(schema.name, "GetWeather");
    assert_eq!(schema.description, "Get the current weather for a location.");
    assert_eq!(schema.parameters["type"], "object");
    assert!(schema.parameters.get("$schema").is_none());
    assert_eq!(schema.required_parameters(), vec!["location"]);
    assert_eq!(
        schema.parameters["properties"]["location"]["description"],
        "City and state, e.g. San Francisco, CA"
    );
}

#[test]
fn test_schema_name_defaults_to_struct_name() {
    let schema = AddTodo::tool_schema();

    assert_eq!(schema.name, "AddTodo");
    assert_eq!(schema.description, "Add a TODO with text to remember.");
    assert!(std::ptr::eq(schema, AddTodo::tool_schema()));
}

#[test]
fn test_parse_typed_parameters() {
    let call = ExtractedCall::from_payload(
        r#"{"name": "GetWeather", "parameters": {"location": "New York, NY"}}"#,
    )
    .unwrap();

    let params: GetWeather = call.parse().unwrap();
    assert_eq!(params.location, "New York, NY");
    assert!(params.unit.is_none());

    let err = call.parse::<AddTodo>().unwrap_err();
    assert!(matches!(err, ToolError::SchemaValidation(_)));
    assert_eq!(err.error_code(), "SCHEMA_VALIDATION_ERROR");
    assert!(err.to_string().contains("`GetWeather` but `AddTodo`"));
}

#[test]
fn test_parse_reports_failing_path() {
    let call = ExtractedCall::from_payload(r#"{"name": "GetWeather", "parameters": {"location": 42}}"#)
        .unwrap();

    let err = call.parse::<GetWeather>().unwrap_err();
    assert!(err.to_string().contains("location"));
}

#[tokio::test]
async fn test_typed_tools_drive_an_invocation() {
    let tool_caller = ToolCaller::new(ScriptedCaller::with_responses([
        r#"<singlefunction><functioncall>{"name":"AddTodo","parameters":{"text":"Laundry"}}</functioncall></singlefunction>"#,
    ]));

    let request = ToolRequest::new(
        "claude-3-haiku-20240307",
        vec![ChatMessage::user("I need to do my laundry")],
        Vec::new(),
    )
    .with_tool::<GetWeather>()
    .with_tool::<AddTodo>()
    .with_tool_choice("AddTodo");

    let call = tool_caller
        .invoke(&request)
        .await
        .unwrap()
        .into_call()
        .unwrap();
    let todo: AddTodo = call.parse().unwrap();
    assert_eq!(todo.text, "Laundry");

    let system = &tool_caller.caller().requests()[0].system;
    assert!(system.contains(r#""name":"GetWeather""#));
    assert!(system.contains(&json!("Add a TODO with text to remember.").to_string()));
}
