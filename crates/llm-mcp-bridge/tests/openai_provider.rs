//! OpenAiProvider against a mock OpenAI-compatible endpoint.

use llm_mcp_bridge::{
    BackendConfig, BridgeError, CompletionBackend, FinishReason, GenerationConfig, Message,
    OpenAiFunction, OpenAiProvider, ToolCall, ToolSchema,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(message: Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": finish_reason,
            "logprobs": null
        }]
    })
}

fn add_row_schema() -> ToolSchema {
    ToolSchema::function(OpenAiFunction {
        name: "add_row".into(),
        description: Some("insert a row".into()),
        parameters: json!({"type": "object", "properties": {"name": {"type": "string"}}}),
    })
}

#[tokio::test]
async fn parses_tool_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "test-model", "max_tokens": 4096})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "add_row", "arguments": "{\"name\":\"X\"}"}
                }]
            }),
            "tool_calls",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        OpenAiProvider::new(&BackendConfig::new(server.uri(), "test-model").with_api_key("sk-test"));
    let messages = vec![Message::system("sys"), Message::user("add a row with name X")];
    let tools = vec![add_row_schema()];

    let response = provider
        .chat(&messages, Some(&tools), &GenerationConfig::default())
        .await
        .unwrap();

    assert_eq!(response.finish_reason, FinishReason::ToolCalls);
    assert_eq!(
        response.tool_calls,
        vec![ToolCall::new("call_1", "add_row", r#"{"name":"X"}"#)]
    );

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "add_row");
    assert_eq!(body["messages"][1]["content"], "add a row with name X");
}

#[tokio::test]
async fn followup_request_carries_tool_results_without_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "I've added a row named X."}),
            "stop",
        )))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&BackendConfig::new(server.uri(), "test-model"));
    let call = ToolCall::new("call_1", "add_row", r#"{"name":"X"}"#);
    let messages = vec![
        Message::system("sys"),
        Message::user("add a row with name X"),
        Message::assistant_with_tools("", vec![call.clone()]),
        Message::tool(&call, "1 row inserted"),
    ];

    let response = provider
        .chat(&messages, None, &GenerationConfig::default())
        .await
        .unwrap();

    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.content.as_deref(), Some("I've added a row named X."));
    assert!(response.tool_calls.is_empty());

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("tools").is_none());
    assert_eq!(body["messages"][3]["role"], "tool");
    assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
    assert_eq!(body["messages"][3]["content"], "1 row inserted");
}

#[tokio::test]
async fn trailing_slash_in_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({"role": "assistant", "content": "hi"}),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/", server.uri());
    let provider = OpenAiProvider::new(&BackendConfig::new(base, "test-model"));
    let response = provider
        .chat(&[Message::user("hello")], None, &GenerationConfig::default())
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("hi"));
}

#[tokio::test]
async fn rejected_request_is_completion_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "model 'nope' not found",
                "type": "invalid_request_error",
                "param": null,
                "code": null
            }
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&BackendConfig::new(server.uri(), "nope"));
    let err = provider
        .chat(&[Message::user("hello")], None, &GenerationConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Completion(ref m) if m.contains("not found")));
}
