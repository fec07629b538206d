use async_trait::async_trait;
use folio_core::RecordSource;
use folio_error::FolioResult;
use folio_interface::EmbeddingProvider;
use folio_memory::{VectorIndex, VectorMemory};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Embeds text onto three keyword axes: sea, lamp, map.
struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> FolioResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        let axis = |word: &str| lower.matches(word).count() as f32;
        Ok(vec![axis("sea"), axis("lamp"), axis("map"), 0.1])
    }

    fn provider_name(&self) -> &'static str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-3"
    }
}

#[tokio::test]
async fn test_query_on_empty_memory_returns_nothing_without_embedding() {
    let embedder = KeywordEmbedder::new();
    let memory = VectorMemory::new(embedder.clone());

    let hits = memory.query("the sea", 4).await.unwrap();

    assert!(hits.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_query_with_fewer_records_than_k_returns_all_in_order() {
    let memory = VectorMemory::new(KeywordEmbedder::new());
    memory.insert(RecordSource::Architecture, 0, "lamp lamp").await.unwrap();
    memory.insert(RecordSource::Chapter(1), 0, "the sea and the map").await.unwrap();

    let hits = memory.query("sea", 10).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].record.source, RecordSource::Chapter(1));
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn test_ties_go_to_earlier_insertion() {
    let memory = VectorMemory::new(KeywordEmbedder::new());
    memory.insert(RecordSource::Chapter(2), 0, "map").await.unwrap();
    memory.insert(RecordSource::Chapter(1), 0, "map").await.unwrap();
    memory.insert(RecordSource::Chapter(3), 0, "map").await.unwrap();

    let hits = memory.query("map", 2).await.unwrap();

    let sources: Vec<_> = hits.iter().map(|hit| hit.record.source.clone()).collect();
    assert_eq!(sources, vec![RecordSource::Chapter(2), RecordSource::Chapter(1)]);
}

#[tokio::test]
async fn test_replace_source_never_leaves_duplicates() {
    let memory = VectorMemory::new(KeywordEmbedder::new());
    let first = memory.embed_chunks("The sea was grey.\n\nThe lamp failed.", 20).await.unwrap();
    let mut staged = memory.snapshot().await;
    staged.replace_source(&RecordSource::Chapter(1), first).unwrap();
    memory.install(staged).await;
    assert_eq!(memory.count_source(&RecordSource::Chapter(1)).await, 2);

    let second = memory.embed_chunks("Only the map remained.", 100).await.unwrap();
    let mut staged = memory.snapshot().await;
    let (removed, inserted) = staged.replace_source(&RecordSource::Chapter(1), second).unwrap();
    memory.install(staged).await;

    assert_eq!((removed, inserted), (2, 1));
    let records = memory.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "Only the map remained.");
    // Insertion ids keep increasing across replacements.
    assert_eq!(records[0].id, 2);
}

#[tokio::test]
async fn test_failed_replacement_leaves_index_untouched() {
    let mut index = VectorIndex::default();
    index.insert(RecordSource::Chapter(1), 0, "kept", vec![1.0, 0.0]).unwrap();

    let bad = vec![
        ("fine".to_string(), vec![0.0, 1.0]),
        ("wrong width".to_string(), vec![1.0, 0.0, 0.0]),
    ];
    let err = index.replace_source(&RecordSource::Chapter(1), bad).unwrap_err();

    assert_eq!(err.code(), "memory_error");
    assert_eq!(index.len(), 1);
    assert_eq!(index.records()[0].text, "kept");
}

#[tokio::test]
async fn test_readers_never_observe_partial_replacement() {
    let memory = Arc::new(VectorMemory::new(KeywordEmbedder::new()));
    let old: Vec<_> = (0..3).map(|i| (format!("sea {i}"), vec![1.0, 0.0, 0.0, 0.1])).collect();
    let mut staged = memory.snapshot().await;
    staged.replace_source(&RecordSource::Chapter(1), old).unwrap();
    memory.install(staged).await;

    let readers: Vec<_> = (0..16)
        .map(|_| {
            let memory = memory.clone();
            tokio::spawn(async move {
                let hits = memory.query("sea", 10).await.unwrap();
                hits.iter()
                    .filter(|hit| hit.record.source == RecordSource::Chapter(1))
                    .count()
            })
        })
        .collect();

    let new: Vec<_> = (0..5).map(|i| (format!("map {i}"), vec![0.0, 0.0, 1.0, 0.1])).collect();
    let mut staged = memory.snapshot().await;
    staged.replace_source(&RecordSource::Chapter(1), new).unwrap();
    memory.install(staged).await;

    for reader in readers {
        let seen = reader.await.unwrap();
        assert!(seen == 3 || seen == 5, "observed {seen} records");
    }
}

#[test]
fn test_index_rebuilds_insertion_counter_from_records() {
    let mut index = VectorIndex::default();
    index.insert(RecordSource::Architecture, 0, "a", vec![1.0]).unwrap();
    index.insert(RecordSource::Architecture, 1, "b", vec![1.0]).unwrap();
    let mut rebuilt = VectorIndex::from_records(index.records().to_vec());
    let id = rebuilt.insert(RecordSource::Chapter(1), 0, "c", vec![1.0]).unwrap();
    assert_eq!(id, 2);
}
