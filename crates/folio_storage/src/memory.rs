//! In-memory project store.

use async_trait::async_trait;
use folio_error::FolioResult;
use folio_interface::{ProjectStore, StoredProject};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Project store holding snapshots in memory.
#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<HashMap<String, StoredProject>>,
}

impl InMemoryProjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn load(&self, name: &str) -> FolioResult<Option<StoredProject>> {
        Ok(self.projects.read().await.get(name).cloned())
    }

    async fn commit(&self, snapshot: &StoredProject) -> FolioResult<()> {
        self.projects
            .write()
            .await
            .insert(snapshot.state.name().to_string(), snapshot.clone());
        tracing::debug!(project = snapshot.state.name(), "Committed project in memory");
        Ok(())
    }

    async fn list(&self) -> FolioResult<Vec<String>> {
        let mut names: Vec<String> = self.projects.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
