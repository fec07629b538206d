use folio_core::{
    Architecture, Blueprint, Chapter, ChapterSpec, ChapterStatus, CharacterUpdate, PlotUpdate,
    ProjectConfig, ProjectState, RecordSource, Stage, VectorRecord,
};
use folio_interface::{ProjectStore, StoredProject};
use folio_storage::{FileSystemProjectStore, InMemoryProjectStore};
use std::collections::BTreeMap;

fn sample_snapshot() -> StoredProject {
    let config = ProjectConfig::builder()
        .topic("A lighthouse keeper finds a map")
        .num_chapters(2u32)
        .build()
        .unwrap();
    let mut state = ProjectState::new("lighthouse", config);
    state.architecture = Some(Architecture::new("Mara keeps the light on Gull Rock."));
    state.blueprint = Some(
        Blueprint::new(
            vec![
                ChapterSpec::new(1, "The Map", "Mara finds a map."),
                ChapterSpec::new(2, "The Boat", "Mara sails out."),
            ],
            2,
        )
        .unwrap(),
    );
    let mut first = Chapter::drafted(1, "outline one", "draft one");
    first.status = ChapterStatus::Finalized;
    first.finalized = Some("final one".to_string());
    state.chapters.insert(1, first);
    state.chapters.insert(2, Chapter::drafted(2, "outline two", "draft two"));
    state.global_summary.append(1, "Mara finds a map.");
    let mut updates = BTreeMap::new();
    updates.insert(
        "Mara".to_string(),
        CharacterUpdate {
            attributes: [("eyes".to_string(), "green".to_string())].into(),
            arc_position: Some("curious".to_string()),
        },
    );
    state.characters.merge(1, &updates);
    state.plot_arcs.apply(
        1,
        &PlotUpdate {
            opened: vec!["Who drew the map?".to_string()],
            resolved: vec![],
        },
    );
    state.set_stage(Stage::ChaptersInProgress);

    StoredProject {
        state,
        records: vec![VectorRecord {
            id: 0,
            source: RecordSource::Chapter(1),
            chunk: 0,
            text: "final one".to_string(),
            embedding: vec![0.5, 0.5],
        }],
    }
}

#[tokio::test]
async fn test_commit_then_load_restores_snapshot() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSystemProjectStore::new(temp.path()).unwrap();
    let snapshot = sample_snapshot();

    store.commit(&snapshot).await.unwrap();
    let loaded = store.load("lighthouse").await.unwrap().unwrap();

    assert_eq!(loaded, snapshot);
}

#[tokio::test]
async fn test_artifacts_follow_documented_layout() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSystemProjectStore::new(temp.path()).unwrap();
    store.commit(&sample_snapshot()).await.unwrap();

    let root = store.current_generation("lighthouse").await.unwrap().unwrap();
    for file in [
        "project.json",
        "architecture.txt",
        "blueprint.json",
        "chapters/chapter_1_outline.txt",
        "chapters/chapter_1_draft.txt",
        "chapters/chapter_1_final.txt",
        "chapters/chapter_2_draft.txt",
        "global_summary.json",
        "global_summary.txt",
        "character_state.json",
        "plot_arcs.json",
        "vector_store/records.json",
    ] {
        assert!(root.join(file).exists(), "missing {file}");
    }
    assert!(!root.join("chapters/chapter_2_final.txt").exists());
    let final_text = std::fs::read_to_string(root.join("chapters/chapter_1_final.txt")).unwrap();
    assert_eq!(final_text, "final one");
}

#[tokio::test]
async fn test_missing_project_loads_as_none() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSystemProjectStore::new(temp.path()).unwrap();
    assert!(store.load("nobody").await.unwrap().is_none());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_two_generations_are_kept() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSystemProjectStore::new(temp.path()).unwrap();
    let mut snapshot = sample_snapshot();
    for _ in 0..4 {
        snapshot.state.bump_revision();
        store.commit(&snapshot).await.unwrap();
    }

    let generations: Vec<_> = std::fs::read_dir(store.project_dir("lighthouse"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("gen-"))
        .collect();
    assert_eq!(generations.len(), 2);

    let loaded = store.load("lighthouse").await.unwrap().unwrap();
    assert_eq!(loaded.state.project.revision(), 4);
    assert_eq!(store.list().await.unwrap(), vec!["lighthouse".to_string()]);
}

#[tokio::test]
async fn test_tampered_artifact_is_reported_as_corrupt() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSystemProjectStore::new(temp.path()).unwrap();
    store.commit(&sample_snapshot()).await.unwrap();

    let root = store.current_generation("lighthouse").await.unwrap().unwrap();
    std::fs::write(root.join("chapters/chapter_1_final.txt"), "rewritten").unwrap();

    let err = store.load("lighthouse").await.unwrap_err();
    assert_eq!(err.code(), "persistence_error");
    assert!(format!("{err}").contains("hash mismatch"));
}

#[tokio::test]
async fn test_unsafe_project_names_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let store = FileSystemProjectStore::new(temp.path()).unwrap();
    let err = store.load("../outside").await.unwrap_err();
    assert_eq!(err.code(), "invalid_project_name");
}

#[tokio::test]
async fn test_in_memory_store_round_trips() {
    let store = InMemoryProjectStore::new();
    let snapshot = sample_snapshot();
    store.commit(&snapshot).await.unwrap();
    assert_eq!(store.load("lighthouse").await.unwrap(), Some(snapshot));
    assert_eq!(store.location(), "memory");
}
