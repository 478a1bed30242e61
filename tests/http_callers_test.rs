use claude_tools_rs::{
    AnthropicCaller, AnthropicConfig, BedrockCaller, BedrockConfig, ChatMessage,
    OpenAICompatibleCaller, ToolCaller, ToolError, ToolRequest, ToolSchema,
};
use mockito::Matcher;
use serde_json::json;

fn weather_request() -> ToolRequest {
    ToolRequest::new(
        "claude-3-haiku-20240307",
        vec![ChatMessage::user("What's the weather like in New York?")],
        vec![ToolSchema::new(
            "GetWeather",
            "Get the current weather for a location",
            json!({
                "type": "object",
                "properties": {"location": {"type": "string"}},
                "required": ["location"]
            }),
        )],
    )
}

fn anthropic_caller(base_url: String) -> AnthropicCaller {
    AnthropicCaller::new(AnthropicConfig::new("test-key").with_base_url(base_url)).unwrap()
}

#[tokio::test]
async fn test_anthropic_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "model": "claude-3-haiku-20240307",
            "max_tokens": 1024
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [{
                    "type": "text",
                    "text": "<singlefunction><functioncall>{\"name\":\"GetWeather\",\"parameters\":{\"location\":\"NY\"}}</functioncall></singlefunction>"
                }],
                "stop_reason": "end_turn"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let tool_caller = ToolCaller::new(anthropic_caller(server.url()));
    let call = tool_caller
        .invoke(&weather_request())
        .await
        .unwrap()
        .into_call()
        .unwrap();

    assert_eq!(call.name, "GetWeather");
    assert_eq!(call.parameters["location"], "NY");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_anthropic_sends_system_prompt_as_top_level_field() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_body(Matcher::Regex(r#""system":"You are a helpful assistant"#.to_string()))
        .with_status(200)
        .with_body(r#"{"content": [{"type": "text", "text": "no call here"}]}"#)
        .create_async()
        .await;

    let tool_caller = ToolCaller::new(anthropic_caller(server.url()));
    let outcome = tool_caller
        .invoke(&weather_request().with_force_tool_call(false))
        .await
        .unwrap();

    assert_eq!(outcome.text(), Some("no call here"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_anthropic_api_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(400)
        .with_body(
            r#"{"type":"error","error":{"type":"invalid_request_error","message":"messages: roles must alternate"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let tool_caller = ToolCaller::new(anthropic_caller(server.url()));
    let err = tool_caller.invoke(&weather_request()).await.unwrap_err();

    match err {
        ToolError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "messages: roles must alternate");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    mock.assert_async().await;
}

fn bedrock_caller(endpoint_url: String) -> BedrockCaller {
    BedrockCaller::new(
        BedrockConfig::new("us-east-1", "AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY")
            .with_endpoint_url(endpoint_url),
    )
    .unwrap()
}

#[tokio::test]
async fn test_bedrock_signed_invoke() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/model/anthropic.claude-3-haiku-20240307-v1/invoke")
        .match_header(
            "authorization",
            Matcher::Regex(
                r"^AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\d{8}/us-east-1/bedrock/aws4_request"
                    .to_string(),
            ),
        )
        .match_header("x-amz-date", Matcher::Any)
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 1024
            })),
            Matcher::Regex(r#""system":"You are a helpful assistant"#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "msg_bdrk_01",
                "type": "message",
                "role": "assistant",
                "content": [{
                    "type": "text",
                    "text": "<singlefunction><functioncall>{\"name\":\"GetWeather\",\"parameters\":{\"location\":\"NY\"}}</functioncall></singlefunction>"
                }],
                "stop_reason": "end_turn"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let mut request = weather_request();
    request.model = "anthropic.claude-3-haiku-20240307-v1".to_string();

    let call = ToolCaller::new(bedrock_caller(server.url()))
        .invoke(&request)
        .await
        .unwrap()
        .into_call()
        .unwrap();

    assert_eq!(call.name, "GetWeather");
    assert_eq!(call.parameters["location"], "NY");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bedrock_service_error_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/model/anthropic.claude-3-haiku-20240307-v1/invoke")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_header("x-amzn-errortype", "ValidationException")
        .with_body(r#"{"message":"max_tokens: field required"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut request = weather_request();
    request.model = "anthropic.claude-3-haiku-20240307-v1".to_string();

    let err = ToolCaller::new(bedrock_caller(server.url()))
        .invoke(&request)
        .await
        .unwrap_err();

    match err {
        ToolError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "max_tokens: field required");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_compatible_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"model": "openai/gpt-4.1-mini"})),
            Matcher::Regex(r#""role":"system""#.to_string()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "<singlefunction><functioncall>{\"name\":\"GetWeather\",\"parameters\":{\"location\":\"NY\"}}</functioncall></singlefunction>"
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let caller = OpenAICompatibleCaller::new("sk-test")
        .unwrap()
        .with_base_url(server.url());
    let mut request = weather_request();
    request.model = "openai/gpt-4.1-mini".to_string();

    let outcome = ToolCaller::new(caller).invoke(&request).await.unwrap();

    assert_eq!(outcome.calls()[0].parameters["location"], "NY");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_compatible_rate_limit() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("retry-after", "7")
        .with_body(r#"{"error": {"message": "slow down"}}"#)
        .expect(1)
        .create_async()
        .await;

    let caller = OpenAICompatibleCaller::new("sk-test")
        .unwrap()
        .with_base_url(server.url());
    let err = ToolCaller::new(caller)
        .invoke(&weather_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::RateLimit { retry_after: 7 }));
    assert!(err.is_recoverable());
    mock.assert_async().await;
}
