//! Results of finalization and consistency checks.

use crate::{MergeConflict, Stage};
use serde::{Deserialize, Serialize};

/// One contradiction flagged by a consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Free-text explanation
    pub explanation: String,
    /// Character or thread involved, when identified
    #[serde(default)]
    pub entity: Option<String>,
}

/// Advisory list of contradictions; empty means none were found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Checked chapter
    pub chapter: u32,
    /// Flagged contradictions
    pub findings: Vec<Finding>,
}

impl ConsistencyReport {
    /// Whether no contradictions were flagged.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Everything a successful finalization committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationResult {
    /// Finalized chapter
    pub chapter: u32,
    /// Summary revision appended for the chapter
    pub summary_revision: u32,
    /// Summary text appended
    pub summary: String,
    /// Attribute updates kept back because they contradicted established facts
    pub merge_conflicts: Vec<MergeConflict>,
    /// Newly opened plot thread ids
    pub opened_threads: Vec<u32>,
    /// Plot thread ids resolved by the chapter
    pub resolved_threads: Vec<u32>,
    /// Vector records written for the chapter
    pub records_indexed: usize,
    /// Vector records of an earlier finalization that were replaced
    pub records_replaced: usize,
    /// Project stage after the commit
    pub stage: Stage,
}
