//! Generation pipeline for folio projects.
//!
//! - [`StageController`] enforces stage order and produces architecture,
//!   blueprint and chapter drafts.
//! - [`PromptAssembler`] composes bounded prompts from project state and
//!   retrieved memory.
//! - [`FinalizationCommitter`] turns an approved draft into canonical text,
//!   summary, character, plot and vector updates in one change.
//! - [`ConsistencyChecker`] reports contradictions without mutating anything.
//! - [`Workspace`] exposes the project operations, serializing mutations per
//!   project and committing each one atomically.
//!
//! Pipeline steps never write directly. They return a [`Staged`] value
//! holding the complete next state, which the workspace persists and then
//! swaps in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod consistency;
mod controller;
mod extraction;
mod finalize;
mod lease;
mod prompts;
mod staged;
mod status;
mod workspace;

pub use assembler::{PromptAssembler, PromptTask, named_characters};
pub use consistency::ConsistencyChecker;
pub use controller::{Invalidation, Regenerate, StageController, invalidate};
pub use extraction::{extract_json, parse_json};
pub use finalize::{ChapterDigest, FinalizationCommitter};
pub use lease::{ProjectLease, ProjectLocks};
pub use staged::Staged;
pub use status::{ArtifactState, ChapterLine, HealthReport, ProjectStatus};
pub use workspace::Workspace;
