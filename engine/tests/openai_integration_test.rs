//! Integration tests for the OpenAI-compatible provider
//!
//! Runs the provider and a full agent against a local mock HTTP server.

use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use pilot_engine::agent::Agent;
use pilot_engine::config::{Config, LLMConfig};
use pilot_engine::llm::openai::OpenAIProvider;
use pilot_engine::llm::{LLMError, LLMProvider, Message};
use sdk::errors::EngineError;

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn provider_for(server: &MockServer) -> OpenAIProvider {
    let config = LLMConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    OpenAIProvider::new(&config, "sk-test".into()).unwrap()
}

#[tokio::test]
async fn test_complete_returns_first_choice() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "temperature": 0.1,
            "messages": [{"role": "user", "content": "Say hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi!")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    let reply = provider.complete("Say hi").await.unwrap();
    assert_eq!(reply, "Hi!");
}

#[tokio::test]
async fn test_non_success_status_is_backend_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    match provider.complete("hello").await {
        Err(LLMError::Backend { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected Backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_2xx_status_is_backend_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(202).set_body_json(completion("queued")))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    assert!(matches!(
        provider.complete("hello").await,
        Err(LLMError::Backend { status: 202, .. })
    ));
}

#[tokio::test]
async fn test_missing_choices_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let provider = provider_for(&mock_server);
    assert!(matches!(
        provider.complete("hello").await,
        Err(LLMError::ParseError(_))
    ));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("too late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = LLMConfig {
        base_url: mock_server.uri(),
        request_timeout_secs: 1,
        ..Default::default()
    };
    let provider = OpenAIProvider::new(&config, "sk-test".into()).unwrap();

    assert!(matches!(
        provider.complete("hello").await,
        Err(LLMError::Timeout)
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = LLMConfig {
        // Reserved port, nothing listens here
        base_url: "http://127.0.0.1:9".to_string(),
        ..Default::default()
    };
    let provider = OpenAIProvider::new(&config, "sk-test".into()).unwrap();

    let err: EngineError = provider.complete("hello").await.unwrap_err().into();
    assert!(matches!(err, EngineError::Network(_)));
}

/// Full turn over HTTP: each stage is answered by a mock keyed on its prompt
#[tokio::test]
async fn test_agent_turn_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Parse the following user request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"task_type": "calculate", "query": "5 * 7", "parameters": {}}"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("plan the steps needed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"[{"tool": "calculate", "parameters": {"expression": "5 * 7"}}]"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("generate a helpful response"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("5 * 7 = 35")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.llm.base_url = mock_server.uri();

    let agent = Agent::from_config(&config, Some("sk-test".into())).unwrap();
    let reply = agent.chat("What's 5 * 7?").await.unwrap();

    assert_eq!(reply, "5 * 7 = 35");
    assert_eq!(
        agent.history().await,
        vec![Message::user("What's 5 * 7?"), Message::assistant("5 * 7 = 35")]
    );

    // The synthesis request carries the tool result as an integer
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let synthesis = String::from_utf8_lossy(&requests[2].body);
    assert!(synthesis.contains(r#"\"result\": 35"#));
}

#[tokio::test]
async fn test_agent_reports_backend_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.llm.base_url = mock_server.uri();

    let agent = Agent::from_config(&config, Some("sk-wrong".into())).unwrap();
    let err = agent.chat("hello").await.unwrap_err();

    assert!(matches!(
        err.root_cause().downcast_ref::<EngineError>(),
        Some(EngineError::Backend { status: 401, .. })
    ));
    assert_eq!(agent.history_len().await, 1);
}
