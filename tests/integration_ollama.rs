#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance.
// These are no-ops unless AIGIST_LIVE_OLLAMA_TESTS is set:
//   AIGIST_LIVE_OLLAMA_TESTS=1 cargo test --test integration_ollama

use aigist::config::OllamaConfig;
use aigist::generation::GenerationOptions;
use aigist::ollama::OllamaClient;
use std::env;
use std::time::Duration;
use tracing::info;

fn live_tests_enabled() -> bool {
    env::var("AIGIST_LIVE_OLLAMA_TESTS").is_ok()
}

fn create_live_client() -> OllamaClient {
    let mut config = OllamaConfig::default();
    if let Ok(host) = env::var("OLLAMA_HOST") {
        config.host = host;
    }
    if let Ok(port) = env::var("OLLAMA_PORT") {
        config.port = port.parse().expect("OLLAMA_PORT must be a port number");
    }
    if let Ok(model) = env::var("OLLAMA_EMBED_MODEL") {
        config.embedding_model = model;
    }
    if let Ok(model) = env::var("OLLAMA_MODEL") {
        config.generation_model = model;
    }

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok(); // Ignore error if already initialized
}

#[test]
fn real_ollama_ping_and_models() {
    if !live_tests_enabled() {
        return;
    }
    init_test_tracing();

    let client = create_live_client();

    client.ping().expect("Ollama server should be reachable");

    let models = client.list_models().expect("can list models");
    assert!(
        !models.is_empty(),
        "Should have at least one model available"
    );
    info!("Found {} models", models.len());
}

#[test]
fn real_ollama_single_embedding() {
    if !live_tests_enabled() {
        return;
    }
    init_test_tracing();

    let client = create_live_client();

    let text = "This is a test document about machine learning and artificial intelligence.";
    let embedding = client.embed_text(text).expect("embedding should succeed");

    assert!(
        embedding.len() >= 100,
        "Embedding should have a reasonable number of dimensions"
    );
    info!("Generated embedding with {} dimensions", embedding.len());
}

#[test]
fn real_ollama_embeddings_are_consistent_in_dimension() {
    if !live_tests_enabled() {
        return;
    }
    init_test_tracing();

    let client = create_live_client();

    let first = client
        .embed_text("Guide to sourdough bread baking.")
        .expect("first embedding");
    let second = client
        .embed_text("Introduction to container orchestration.")
        .expect("second embedding");

    assert_eq!(
        first.len(),
        second.len(),
        "All embeddings from one model share a dimension"
    );
}

#[test]
fn real_ollama_chat_completion() {
    if !live_tests_enabled() {
        return;
    }
    init_test_tracing();

    let client = create_live_client();

    let answer = client
        .chat(
            "You answer in exactly one short sentence.",
            "What color is a clear daytime sky?",
            &GenerationOptions::default(),
        )
        .expect("chat should succeed");

    assert!(!answer.trim().is_empty(), "Answer should not be empty");
    info!("Chat answer: {}", answer);
}
