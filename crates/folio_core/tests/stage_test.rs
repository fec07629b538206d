use folio_core::{
    Blueprint, Chapter, ChapterSpec, ChapterStatus, ProjectConfig, ProjectState, Stage,
};
use strum::IntoEnumIterator;

fn three_chapter_state() -> ProjectState {
    let config = ProjectConfig::builder().num_chapters(3u32).build().unwrap();
    ProjectState::new("lighthouse", config)
}

#[test]
fn test_stages_step_forward_in_declaration_order() {
    let stages: Vec<Stage> = Stage::iter().collect();
    for pair in stages.windows(2) {
        assert_eq!(pair[0].next(), Some(pair[1]));
        assert!(pair[0] < pair[1]);
    }
    assert_eq!(Stage::Complete.next(), None);
}

#[test]
fn test_stage_parses_from_display_name() {
    let stage: Stage = "BlueprintReady".parse().unwrap();
    assert_eq!(stage, Stage::BlueprintReady);
    assert!(!Stage::ArchitectureReady.allows_chapter_work());
    assert!(Stage::ChaptersInProgress.allows_chapter_work());
}

#[test]
fn test_chapter_spec_requires_blueprint_and_range() {
    let mut state = three_chapter_state();
    let err = state.chapter_spec(1).unwrap_err();
    assert_eq!(err.code(), "missing_artifact");

    let specs = (1..=3)
        .map(|i| ChapterSpec::new(i, format!("Chapter {i}"), "synopsis"))
        .collect();
    state.blueprint = Some(Blueprint::new(specs, 3).unwrap());

    assert_eq!(state.chapter_spec(2).unwrap().title, "Chapter 2");
    assert_eq!(state.chapter_spec(0).unwrap_err().code(), "chapter_out_of_range");
    assert_eq!(state.chapter_spec(4).unwrap_err().code(), "chapter_out_of_range");
}

#[test]
fn test_all_finalized_requires_every_chapter() {
    let mut state = three_chapter_state();
    let specs = (1..=3)
        .map(|i| ChapterSpec::new(i, format!("Chapter {i}"), "synopsis"))
        .collect();
    state.blueprint = Some(Blueprint::new(specs, 3).unwrap());
    assert!(!state.all_finalized());

    for i in 1..=3 {
        let mut chapter = Chapter::drafted(i, "outline", "draft");
        chapter.status = ChapterStatus::Finalized;
        chapter.finalized = Some("final".to_string());
        state.chapters.insert(i, chapter);
    }
    assert!(state.all_finalized());

    state.chapters.get_mut(&2).unwrap().redraft("new outline", "new draft");
    assert!(!state.all_finalized());
    assert_eq!(state.chapter(2).unwrap().finalized.as_deref(), Some("final"));
}

#[test]
fn test_blueprint_rejects_wrong_length() {
    let specs = vec![ChapterSpec::new(1, "Only", "one")];
    let err = Blueprint::new(specs, 3).unwrap_err();
    assert!(err.contains("expected 3"));
}

#[test]
fn test_revision_bumps_on_commit() {
    let mut state = three_chapter_state();
    assert_eq!(state.project.revision(), 0);
    state.bump_revision();
    state.bump_revision();
    assert_eq!(state.project.revision(), 2);
    assert_eq!(state.stage(), Stage::Uninitialized);
}
