use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatguard::error::CollaboratorError;
use chatguard::gate::OperatingMode;
use chatguard::generator::{AnswerGenerator, ChatCompletionsGenerator};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

#[tokio::test]
async fn generate_sends_bearer_and_returns_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "tiny", "max_tokens": 512})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Sunny today.  ")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = ChatCompletionsGenerator::new(
        &format!("{}/v1", server.uri()),
        Some("test-key"),
        "tiny",
        0.3,
        2_000,
    );
    let draft = generator
        .generate("weather?", "No specific context found.", OperatingMode::Normal)
        .await
        .unwrap();

    assert_eq!(draft, "Sunny today.");
    server.verify().await;
}

#[tokio::test]
async fn peak_mode_caps_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 128})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Brief.")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = ChatCompletionsGenerator::new(&server.uri(), None, "tiny", 0.3, 2_000);
    let draft = generator
        .generate("q", "ctx", OperatingMode::Peak)
        .await
        .unwrap();
    assert_eq!(draft, "Brief.");
    server.verify().await;
}

#[tokio::test]
async fn empty_completion_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let generator = ChatCompletionsGenerator::new(&server.uri(), None, "tiny", 0.3, 2_000);
    let err = generator
        .generate("q", "ctx", OperatingMode::Normal)
        .await
        .unwrap_err();
    assert!(matches!(err, CollaboratorError::Malformed { .. }));
}

#[tokio::test]
async fn error_body_secrets_are_scrubbed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("invalid key sk-live-abcdef123456"),
        )
        .mount(&server)
        .await;

    let generator = ChatCompletionsGenerator::new(&server.uri(), Some("k"), "tiny", 0.3, 2_000);
    let err = generator
        .generate("q", "ctx", OperatingMode::Normal)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, CollaboratorError::Unavailable { .. }));
    assert!(message.contains("401"));
    assert!(!message.contains("abcdef123456"));
}
