use super::*;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config {
        ollama: OllamaConfig::default(),
        chunking: ChunkingConfig::default(),
        retrieval: RetrievalConfig::default(),
        base_dir: PathBuf::from("/tmp/aigist-test"),
    };

    assert!(config.validate().is_ok());
    assert_eq!(config.retrieval.retention_cap, 5);
    assert_eq!(config.chunking.chunk_size, 600);
    assert_eq!(config.chunking.overlap, 100);
    assert_eq!(config.ollama.embedding_model, "nomic-embed-text");
}

#[test]
fn load_missing_file_returns_defaults() {
    let dir = TempDir::new().expect("can create tempdir");

    let config = Config::load(dir.path()).expect("can load defaults");

    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.base_dir, dir.path());
    assert_eq!(config.store_path(), dir.path().join("vector_store.json"));
}

#[test]
fn save_and_reload_round_trip() {
    let dir = TempDir::new().expect("can create tempdir");

    let mut config = Config::load(dir.path()).expect("can load defaults");
    config
        .ollama
        .set_host("embeddings.internal".to_string())
        .expect("valid host");
    config
        .ollama
        .set_generation_model("llama3.1:8b".to_string())
        .expect("valid model");
    config
        .retrieval
        .set_retention_cap(7)
        .expect("valid retention cap");
    config.save().expect("can save config");

    let reloaded = Config::load(dir.path()).expect("can reload config");

    assert_eq!(reloaded.ollama.host, "embeddings.internal");
    assert_eq!(reloaded.ollama.generation_model, "llama3.1:8b");
    assert_eq!(reloaded.retrieval.retention_cap, 7);
}

#[test]
fn ollama_url_builds_from_parts() {
    let config = OllamaConfig::default();

    let url = config.ollama_url().expect("valid url");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn invalid_protocol_rejected() {
    let mut config = OllamaConfig::default();

    assert!(matches!(
        config.set_protocol("ftp".to_string()),
        Err(ConfigError::InvalidProtocol(_))
    ));

    config.protocol = "gopher".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn empty_models_rejected() {
    let mut config = OllamaConfig::default();

    assert!(config.set_generation_model("  ".to_string()).is_err());
    assert!(config.set_embedding_model(String::new()).is_err());
}

#[test]
fn timeout_bounds_enforced() {
    let mut config = OllamaConfig::default();

    assert!(config.set_timeout_seconds(0).is_err());
    assert!(config.set_timeout_seconds(3601).is_err());
    assert!(config.set_timeout_seconds(60).is_ok());
}

#[test]
fn retention_cap_bounds_enforced() {
    let mut config = RetrievalConfig::default();

    assert!(config.set_retention_cap(0).is_err());
    assert!(config.set_retention_cap(101).is_err());
    assert!(config.set_retention_cap(1).is_ok());
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    let config = Config {
        ollama: OllamaConfig::default(),
        chunking: ChunkingConfig {
            chunk_size: 100,
            overlap: 100,
        },
        retrieval: RetrievalConfig::default(),
        base_dir: PathBuf::from("/tmp/aigist-test"),
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidOverlap(100, 100))
    ));
}

#[test]
fn strategy_kind_serializes_lowercase() {
    let retrieval = RetrievalConfig {
        strategy: StrategyKind::Keyword,
        ..RetrievalConfig::default()
    };

    let toml = toml::to_string(&retrieval).expect("serializes");
    assert!(toml.contains("strategy = \"keyword\""));
}
