//! Persistence trait for project snapshots.

use async_trait::async_trait;
use folio_core::{ProjectState, VectorRecord};
use folio_error::FolioResult;
use serde::{Deserialize, Serialize};

/// Everything persisted for a project: state plus vector memory contents.
///
/// Both halves are committed together so a reader never sees summaries
/// without their vector records or the reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProject {
    /// Project artifacts
    pub state: ProjectState,
    /// Vector memory records in insertion order
    pub records: Vec<VectorRecord>,
}

/// Durable storage of project snapshots.
///
/// `commit` must be atomic: after a failed commit, `load` returns the
/// previously committed snapshot unchanged.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load the latest committed snapshot, or `None` if the project was never committed.
    async fn load(&self, name: &str) -> FolioResult<Option<StoredProject>>;

    /// Atomically replace the committed snapshot.
    async fn commit(&self, snapshot: &StoredProject) -> FolioResult<()>;

    /// Names of every stored project.
    async fn list(&self) -> FolioResult<Vec<String>>;

    /// Human-readable location for diagnostics.
    fn location(&self) -> String;
}
