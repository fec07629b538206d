//! Advisory contradiction checks.

use crate::assembler::{PromptAssembler, PromptTask};
use crate::controller::complete;
use crate::extraction::parse_json;
use folio_core::{ConsistencyReport, Finding, ProjectState, RecordSource};
use folio_error::{ConsistencyError, FolioErrorKind, FolioResult, StageError, StageErrorKind};
use folio_interface::LlmProvider;
use folio_memory::{VectorMemory, chunk_text};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Chapter query plus the opening of the text, capped at one embedding chunk.
fn bounded_query(query: &str, text: &str, chunk_chars: usize) -> String {
    let limit = chunk_chars.max(1);
    let opening = chunk_text(text, limit).into_iter().next().unwrap_or_default();
    format!("{query}\n{opening}").chars().take(limit).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContradictionReply {
    Wrapped {
        #[serde(alias = "findings")]
        contradictions: Vec<FindingReply>,
    },
    Bare(Vec<FindingReply>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FindingReply {
    Detailed {
        explanation: String,
        #[serde(default)]
        entity: Option<String>,
    },
    Plain(String),
}

impl From<FindingReply> for Finding {
    fn from(reply: FindingReply) -> Self {
        match reply {
            FindingReply::Detailed {
                explanation,
                entity,
            } => Finding {
                explanation,
                entity: entity.filter(|e| !e.trim().is_empty()),
            },
            FindingReply::Plain(explanation) => Finding {
                explanation,
                entity: None,
            },
        }
    }
}

/// Cross-checks a chapter against established characters, open threads and earlier text.
///
/// Never mutates project state. Any failure after the request is validated
/// is reported as `CheckUnavailable`, so an empty report always means the
/// check ran and found nothing.
#[derive(Clone)]
pub struct ConsistencyChecker {
    llm: Arc<dyn LlmProvider>,
    assembler: PromptAssembler,
}

impl std::fmt::Debug for ConsistencyChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistencyChecker")
            .field("llm", &self.llm.provider_name())
            .finish_non_exhaustive()
    }
}

impl ConsistencyChecker {
    /// Create a checker.
    pub fn new(llm: Arc<dyn LlmProvider>, assembler: PromptAssembler) -> Self {
        Self { llm, assembler }
    }

    /// Check the finalized text of `chapter`, or its draft when not yet finalized.
    ///
    /// # Errors
    ///
    /// `ChapterOutOfRange`/`MissingArtifact`/`ChapterNotDrafted` for requests
    /// that cannot be checked; `CheckUnavailable` when retrieval, the model
    /// call or reply parsing fails.
    #[instrument(skip(self, state, memory), fields(project = %state.name()))]
    pub async fn check(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        chapter: u32,
    ) -> FolioResult<ConsistencyReport> {
        let spec = state.chapter_spec(chapter)?;
        let text = state
            .chapter(chapter)
            .map(|c| c.best_text())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                StageError::new(StageErrorKind::ChapterNotDrafted {
                    chapter,
                    reason: "nothing to check".to_string(),
                })
            })?;

        match self.run(state, memory, chapter, &spec.retrieval_query(), text).await {
            Ok(report) => {
                info!(chapter, findings = report.findings.len(), "Consistency check complete");
                Ok(report)
            }
            Err(e) => {
                warn!(chapter, error = %e, "Consistency check unavailable");
                let message = match e.kind() {
                    FolioErrorKind::Provider(provider) => provider.kind.to_string(),
                    _ => e.to_string(),
                };
                Err(ConsistencyError::new(message).into())
            }
        }
    }

    async fn run(
        &self,
        state: &ProjectState,
        memory: &VectorMemory,
        chapter: u32,
        query: &str,
        text: &str,
    ) -> FolioResult<ConsistencyReport> {
        let query = bounded_query(query, text, self.assembler.settings().chunk_chars());
        // Only material established before this chapter counts as context.
        let retrieved = memory
            .query_filtered(
                &query,
                self.assembler.settings().consistency_k(),
                move |record| match record.source {
                    RecordSource::Chapter(index) => index < chapter,
                    _ => true,
                },
            )
            .await?;

        let prompt = self
            .assembler
            .build(state, PromptTask::Consistency { chapter, text }, &retrieved)?;
        let reply = complete(self.llm.as_ref(), "consistency", &prompt).await?;
        let findings = match parse_json::<ContradictionReply>(&reply)? {
            ContradictionReply::Wrapped { contradictions } | ContradictionReply::Bare(contradictions) => {
                contradictions
                    .into_iter()
                    .map(Finding::from)
                    .filter(|finding| !finding.explanation.trim().is_empty())
                    .collect()
            }
        };
        Ok(ConsistencyReport { chapter, findings })
    }
}
