//! Core data types for the folio narrative pipeline.
//!
//! This crate holds the project model shared by every other folio crate:
//! stages, blueprints, chapters, the accumulated narrative memory
//! (summaries, characters, plot threads) and vector records.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blueprint;
mod chapter;
mod character;
mod generation;
mod plot;
mod project;
mod record;
mod report;
mod settings;
mod stage;
mod state;
mod summary;

pub use blueprint::{Architecture, Blueprint, ChapterSpec};
pub use chapter::{Chapter, ChapterStatus};
pub use character::{CharacterProfile, CharacterState, CharacterUpdate, MergeConflict};
pub use generation::{ChapterDirectives, ChapterDirectivesBuilder, GenerationConfig};
pub use plot::{PlotArcs, PlotThread, PlotUpdate, ThreadStatus};
pub use project::{Project, ProjectConfig, ProjectConfigBuilder};
pub use record::{RecordSource, ScoredRecord, VectorRecord};
pub use report::{ConsistencyReport, FinalizationResult, Finding};
pub use settings::{PipelineSettings, PipelineSettingsBuilder};
pub use stage::{Stage, StageInput, StageOutput};
pub use state::ProjectState;
pub use summary::{GlobalSummary, SummaryEntry};
