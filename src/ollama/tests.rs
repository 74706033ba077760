use super::*;
use crate::config::OllamaConfig;

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        generation_model: "test-generate".to_string(),
        embedding_model: "test-embed".to_string(),
        timeout_seconds: 45,
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.generation_model, "test-generate");
    assert_eq!(client.embedding_model, "test-embed");
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    // Note: timeout is part of the agent configuration
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(std::time::Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn chat_request_serializes_options() {
    let request = ChatRequest {
        model: "qwen2.5:14b".to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: "hello".to_string(),
        }],
        stream: false,
        options: ChatOptions {
            temperature: 0.1,
            top_p: 0.95,
        },
    };

    let json = serde_json::to_value(&request).expect("serializes");
    assert_eq!(json["stream"], serde_json::Value::Bool(false));
    assert!((json["options"]["temperature"].as_f64().expect("temperature") - 0.1).abs() < 1e-6);
    assert_eq!(json["messages"][0]["role"], "user");
}
