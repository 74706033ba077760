use super::*;
use crate::ledger::Document;
use crate::store::RecordMetadata;
use chrono::Utc;
use tempfile::TempDir;

fn meta(user_id: &str, doc_id: Uuid, chunk_index: u32, title: &str, text: &str) -> RecordMetadata {
    RecordMetadata {
        user_id: user_id.to_string(),
        doc_id,
        chunk_index,
        doc_title: title.to_string(),
        upload_time: Utc::now(),
        text: text.to_string(),
    }
}

fn fixture() -> (TempDir, VectorStore, DocumentLedger) {
    let dir = TempDir::new().expect("can create tempdir");
    let store = VectorStore::new(dir.path().join("vector_store.json"));
    (dir, store, DocumentLedger::new())
}

#[test]
fn full_context_groups_chunks_per_document() {
    let (_dir, mut store, ledger) = fixture();
    let history = Uuid::new_v4();
    let recipes = Uuid::new_v4();

    store
        .add(vec![1.0], meta("alice", history, 0, "History", "The club formed in 1901."))
        .expect("add");
    store
        .add(vec![1.0], meta("alice", recipes, 0, "Recipes", "Bread needs flour."))
        .expect("add");
    store
        .add(vec![1.0], meta("alice", history, 1, "History", "It moved stadiums in 1923."))
        .expect("add");

    let context = FullDocumentContext.assemble("anything", "alice", &store, &ledger);

    assert_eq!(
        context,
        "Document: History\nThe club formed in 1901. It moved stadiums in 1923.\
         \n\n---\n\nDocument: Recipes\nBread needs flour."
    );
}

#[test]
fn full_context_is_scoped_to_the_user() {
    let (_dir, mut store, ledger) = fixture();

    store
        .add(vec![1.0], meta("alice", Uuid::new_v4(), 0, "Mine", "alice content"))
        .expect("add");
    store
        .add(vec![1.0], meta("bob", Uuid::new_v4(), 0, "Theirs", "bob content"))
        .expect("add");

    let context = FullDocumentContext.assemble("anything", "alice", &store, &ledger);

    assert!(context.contains("alice content"));
    assert!(!context.contains("bob content"));
}

#[test]
fn full_context_falls_back_to_ledger_when_store_is_empty() {
    let (_dir, store, mut ledger) = fixture();
    ledger.register(Document::new(
        "alice",
        "Session Notes",
        "remembered in process",
        vec!["remembered in process".to_string()],
    ));

    let context = FullDocumentContext.assemble("anything", "alice", &store, &ledger);

    assert_eq!(context, "Document: Session Notes\nremembered in process");
}

#[test]
fn full_context_empty_when_user_has_nothing() {
    let (_dir, store, ledger) = fixture();

    let context = FullDocumentContext.assemble("anything", "alice", &store, &ledger);

    assert!(context.is_empty());
}

#[test]
fn keyword_context_ranks_matching_chunks_first() {
    let (_dir, mut store, ledger) = fixture();
    let doc = Uuid::new_v4();

    store
        .add(vec![1.0], meta("alice", doc, 0, "Doc", "Nothing relevant here at all."))
        .expect("add");
    store
        .add(
            vec![1.0],
            meta("alice", doc, 1, "Doc", "The stadium hosted the championship game."),
        )
        .expect("add");
    store
        .add(
            vec![1.0],
            meta(
                "alice",
                doc,
                2,
                "Doc",
                "The stadium stadium stadium was rebuilt.",
            ),
        )
        .expect("add");

    let strategy = KeywordRankedContext { top_k: 2 };
    let context = strategy.assemble("Where is the stadium?", "alice", &store, &ledger);

    let blocks: Vec<&str> = context.split("\n\n---\n\n").collect();
    assert_eq!(blocks.len(), 2);
    // Highest term frequency wins
    assert!(blocks[0].contains("rebuilt"));
    assert!(blocks[1].contains("championship"));
    assert!(!context.contains("Nothing relevant"));
}

#[test]
fn keyword_context_expands_synonyms_at_lower_weight() {
    let (_dir, mut store, ledger) = fixture();
    let doc = Uuid::new_v4();

    store
        .add(
            vec![1.0],
            meta("alice", doc, 0, "Doc", "The company was founded long ago."),
        )
        .expect("add");
    store
        .add(
            vec![1.0],
            meta("alice", doc, 1, "Doc", "The charter was established in 1900."),
        )
        .expect("add");

    let strategy = KeywordRankedContext { top_k: 2 };
    let context = strategy.assemble("When was it established?", "alice", &store, &ledger);

    let blocks: Vec<&str> = context.split("\n\n---\n\n").collect();
    assert_eq!(blocks.len(), 2);
    // Verbatim question term outweighs the synonym hit
    assert!(blocks[0].contains("established in 1900"));
    assert!(blocks[1].contains("founded long ago"));
}

#[test]
fn keyword_context_empty_for_stopword_questions() {
    let (_dir, mut store, ledger) = fixture();

    store
        .add(vec![1.0], meta("alice", Uuid::new_v4(), 0, "Doc", "content"))
        .expect("add");

    let strategy = KeywordRankedContext { top_k: 5 };
    assert!(strategy.assemble("what is the", "alice", &store, &ledger).is_empty());
}

#[test]
fn keyword_context_ignores_other_users() {
    let (_dir, mut store, ledger) = fixture();

    store
        .add(
            vec![1.0],
            meta("bob", Uuid::new_v4(), 0, "Doc", "stadium details here"),
        )
        .expect("add");

    let strategy = KeywordRankedContext { top_k: 5 };
    assert!(
        strategy
            .assemble("Where is the stadium?", "alice", &store, &ledger)
            .is_empty()
    );
}

#[test]
fn strategy_kind_round_trips_from_str() {
    assert_eq!("full".parse::<StrategyKind>(), Ok(StrategyKind::Full));
    assert_eq!("Keyword".parse::<StrategyKind>(), Ok(StrategyKind::Keyword));
    assert!("cosine".parse::<StrategyKind>().is_err());
    assert_eq!(StrategyKind::Full.to_string(), "full");
}
