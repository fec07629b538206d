use folio_core::{
    Architecture, Blueprint, Chapter, ChapterDirectives, ChapterSpec, ChapterStatus,
    CharacterUpdate, PipelineSettings, PlotUpdate, ProjectConfig, ProjectState, RecordSource,
    ScoredRecord, Stage, VectorRecord,
};
use folio_pipeline::{PromptAssembler, PromptTask, named_characters};
use std::collections::BTreeMap;

fn state() -> ProjectState {
    let config = ProjectConfig::builder()
        .topic("A keeper and a drowned sea")
        .genre("Gothic")
        .num_chapters(3u32)
        .words_per_chapter(900u32)
        .user_guidance("Keep the sea menacing.")
        .build()
        .unwrap();
    let mut state = ProjectState::new("skerry", config);
    state.architecture = Some(Architecture::new(
        "Mara Vell keeps the Skerry light. Tomas is her brother.",
    ));
    state.blueprint = Some(
        Blueprint::new(
            vec![
                ChapterSpec::new(1, "The Lamp", "Mara tends the lamp."),
                ChapterSpec::new(2, "The Letter", "A letter from Tomas arrives."),
                ChapterSpec::new(3, "The Return", "Tomas comes home."),
            ],
            3,
        )
        .unwrap(),
    );
    state.set_stage(Stage::ChaptersInProgress);

    let mut first = Chapter::drafted(1, "outline", "Mara lit the lamp.");
    first.status = ChapterStatus::Finalized;
    first.finalized = Some("Mara lit the lamp and watched the water.".to_string());
    state.chapters.insert(1, first);
    state.global_summary.append(1, "Mara keeps the light burning.");

    let mut updates = BTreeMap::new();
    updates.insert(
        "Mara".to_string(),
        CharacterUpdate {
            attributes: BTreeMap::from([("eyes".to_string(), "grey".to_string())]),
            arc_position: Some("steadfast".to_string()),
        },
    );
    updates.insert(
        "Ines".to_string(),
        CharacterUpdate {
            attributes: BTreeMap::from([("role".to_string(), "ferrywoman".to_string())]),
            arc_position: None,
        },
    );
    state.characters.merge(1, &updates);
    state.plot_arcs.apply(
        1,
        &PlotUpdate {
            opened: vec!["Why did Tomas leave?".to_string()],
            resolved: vec![],
        },
    );
    state
}

fn hit(id: u64, chapter: u32, text: &str, score: f64) -> ScoredRecord {
    ScoredRecord {
        record: VectorRecord {
            id,
            source: RecordSource::Chapter(chapter),
            chunk: 0,
            text: text.to_string(),
            embedding: vec![1.0, 0.0],
        },
        score,
    }
}

#[test]
fn test_draft_prompt_carries_chapter_context() {
    let state = state();
    let directives = ChapterDirectives::builder()
        .characters_involved(vec!["Ines".to_string()])
        .scene_location("the ferry slip")
        .build()
        .unwrap();
    let retrieved = vec![hit(0, 1, "The water was black and still.", 0.8)];

    let prompt = PromptAssembler::default()
        .build(
            &state,
            PromptTask::ChapterDraft {
                chapter: 2,
                directives: &directives,
                outline: "1. The letter arrives.",
            },
            &retrieved,
        )
        .unwrap();

    assert!(prompt.starts_with("## Project\nTopic: A keeper and a drowned sea"));
    assert!(prompt.contains("## Author guidance\nKeep the sea menacing."));
    assert!(prompt.contains("## Chapter 2: The Letter\nA letter from Tomas arrives."));
    assert!(prompt.contains("## Chapter 1 (final text)\nMara lit the lamp and watched the water."));
    assert!(prompt.contains("- [1] Why did Tomas leave?"));
    assert!(prompt.contains("- Ines:"));
    assert!(prompt.contains("Scene location: the ferry slip"));
    assert!(prompt.contains("## Chapter outline\n1. The letter arrives."));
    assert!(prompt.contains("[chapter 1 #0, similarity 0.800]\nThe water was black and still."));

    let passages = prompt.find("## Related passages").unwrap();
    let instructions = prompt.find("## Instructions").unwrap();
    assert!(passages < instructions);
}

#[test]
fn test_previous_chapter_falls_back_to_summary_when_too_long() {
    let mut state = state();
    let long = "The tide came in. ".repeat(400);
    state.chapters.get_mut(&1).unwrap().finalized = Some(long);
    let settings = PipelineSettings::builder()
        .max_prompt_chars(4_000usize)
        .build()
        .unwrap();

    let prompt = PromptAssembler::new(settings)
        .build(
            &state,
            PromptTask::ChapterOutline {
                chapter: 2,
                directives: &ChapterDirectives::default(),
            },
            &[],
        )
        .unwrap();

    assert!(!prompt.contains("(final text)"));
    assert!(prompt.contains("## Chapter 1 (summary)\nMara keeps the light burning."));
}

fn draft_chapter_two(state: &ProjectState, retrieved: &[ScoredRecord]) -> String {
    PromptAssembler::default()
        .build(
            state,
            PromptTask::ChapterDraft {
                chapter: 2,
                directives: &ChapterDirectives::default(),
                outline: "1. The letter arrives.",
            },
            retrieved,
        )
        .unwrap()
}

#[test]
fn test_large_architecture_and_previous_chapter_stay_in_budget() {
    let mut state = state();
    state.architecture = Some(Architecture::new(
        "Skerry is a rock of black basalt in a drowned sea. ".repeat(280),
    ));
    state.chapters.get_mut(&1).unwrap().finalized =
        Some("Mara trimmed the wick and watched the swell. ".repeat(250));
    let budget = PipelineSettings::default().max_prompt_chars();
    let retrieved = vec![hit(0, 1, "The water was black and still.", 0.99)];

    let prompt = draft_chapter_two(&state, &retrieved);

    assert!(prompt.chars().count() <= budget);
    assert!(prompt.contains("## Architecture\nSkerry is a rock"));
    assert!(!prompt.contains("(final text)"));
    assert!(prompt.contains("## Chapter 1 (summary)\nMara keeps the light burning."));
    assert!(prompt.contains("[chapter 1 #0, similarity 0.990]"));
    assert!(prompt.contains("## Instructions"));
}

#[test]
fn test_oversized_architecture_is_shortened_not_dropped() {
    let mut state = state();
    state.architecture = Some(Architecture::new(
        "Skerry is a rock of black basalt in a drowned sea. ".repeat(600),
    ));
    let budget = PipelineSettings::default().max_prompt_chars();
    let retrieved = vec![hit(0, 1, "The water was black and still.", 0.99)];

    let prompt = draft_chapter_two(&state, &retrieved);

    assert!(prompt.chars().count() <= budget);
    assert!(prompt.contains("## Architecture\nSkerry is a rock"));
    assert!(prompt.contains(" [shortened]"));
    assert!(!prompt.contains("## Open plot threads"));
    assert!(prompt.contains("## Chapter 2: The Letter"));
    assert!(prompt.contains("[chapter 1 #0, similarity 0.990]"));
    assert!(prompt.contains("## Instructions"));
}

#[test]
fn test_retrieved_passages_respect_the_budget() {
    let state = state();
    let directives = ChapterDirectives::default();
    let task = PromptTask::ChapterOutline {
        chapter: 2,
        directives: &directives,
    };
    let bare = PromptAssembler::default().build(&state, task, &[]).unwrap();
    let budget = bare.chars().count() + 200;
    let settings = PipelineSettings::builder()
        .max_prompt_chars(budget)
        .build()
        .unwrap();

    let retrieved: Vec<ScoredRecord> = (0..10)
        .map(|i| hit(i, 1, &format!("Passage {i} about the lamp and the sea."), 0.9 - i as f64 * 0.05))
        .collect();
    let prompt = PromptAssembler::new(settings)
        .build(&state, task, &retrieved)
        .unwrap();

    assert!(prompt.chars().count() <= budget);
    assert!(prompt.contains("Passage 0 about"));
    assert!(!prompt.contains("Passage 9 about"));
}

#[test]
fn test_assembly_is_deterministic() {
    let state = state();
    let directives = ChapterDirectives::default();
    let retrieved = vec![hit(0, 1, "alpha", 0.7), hit(1, 1, "beta", 0.6)];
    let assembler = PromptAssembler::default();
    let task = PromptTask::ChapterDraft {
        chapter: 3,
        directives: &directives,
        outline: "outline",
    };

    let first = assembler.build(&state, task, &retrieved).unwrap();
    let second = assembler.build(&state, task, &retrieved).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_custom_prompt_replaces_instructions_only() {
    let state = state();
    let directives = ChapterDirectives::builder()
        .custom_prompt(Some("Write it as a ship's log.".to_string()))
        .build()
        .unwrap();

    let prompt = PromptAssembler::default()
        .build(
            &state,
            PromptTask::ChapterDraft {
                chapter: 2,
                directives: &directives,
                outline: "outline",
            },
            &[],
        )
        .unwrap();

    assert!(prompt.ends_with("## Instructions\nWrite it as a ship's log.\n\n"));
    assert!(prompt.contains("## Chapter 2: The Letter"));
}

#[test]
fn test_missing_artifacts_are_reported() {
    let mut state = state();
    state.architecture = None;
    let err = PromptAssembler::default()
        .build(&state, PromptTask::Blueprint { guidance: None }, &[])
        .unwrap_err();
    assert_eq!(err.code(), "missing_artifact");

    let state = self::state();
    let err = PromptAssembler::default()
        .build(
            &state,
            PromptTask::Finalization {
                chapter: 9,
                text: "text",
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(err.code(), "chapter_out_of_range");
}

#[test]
fn test_named_characters_match_whole_words() {
    let state = state();
    let found: Vec<&str> = named_characters(&state, "mara waits by the lamp", &[])
        .into_iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(found, vec!["Mara"]);

    assert!(named_characters(&state, "Maraschino cherries", &[]).is_empty());

    let forced = named_characters(&state, "", &["ines".to_string()]);
    assert_eq!(forced.len(), 1);
}

#[test]
fn test_retrieval_query_includes_directives() {
    let spec = ChapterSpec::new(2, "The Letter", "A letter arrives.");
    let directives = ChapterDirectives::builder()
        .scene_location("the harbour")
        .key_items("a brass key")
        .build()
        .unwrap();
    let query = PromptAssembler::retrieval_query(&spec, &directives);
    assert!(query.contains("The Letter"));
    assert!(query.contains("the harbour"));
    assert!(query.contains("a brass key"));
}
