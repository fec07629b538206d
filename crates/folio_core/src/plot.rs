//! Plot threads.

use serde::{Deserialize, Serialize};

/// Whether a thread is still in play.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum ThreadStatus {
    /// Unresolved
    Open,
    /// Paid off
    Resolved,
}

/// One narrative thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotThread {
    /// Stable identifier, assigned in creation order
    pub id: u32,
    /// What the thread is about
    pub description: String,
    /// Current status
    pub status: ThreadStatus,
    /// Chapter that opened the thread
    pub opened_in: Option<u32>,
    /// Chapter that resolved the thread
    pub resolved_in: Option<u32>,
}

/// Thread changes proposed by a finalized chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotUpdate {
    /// Descriptions of newly opened threads
    #[serde(default)]
    pub opened: Vec<String>,
    /// Identifiers of threads the chapter resolves
    #[serde(default)]
    pub resolved: Vec<u32>,
}

/// Set of plot threads. Threads are never removed.
///
/// # Examples
///
/// ```
/// use folio_core::{PlotArcs, PlotUpdate, ThreadStatus};
///
/// let mut arcs = PlotArcs::default();
/// let (opened, _) = arcs.apply(1, &PlotUpdate {
///     opened: vec!["Who drew the map?".to_string()],
///     resolved: vec![],
/// });
/// assert_eq!(opened, vec![1]);
///
/// let (_, resolved) = arcs.apply(2, &PlotUpdate { opened: vec![], resolved: vec![1, 99] });
/// assert_eq!(resolved, vec![1]);
/// assert_eq!(arcs.threads()[0].status, ThreadStatus::Resolved);
/// assert!(arcs.open().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotArcs {
    threads: Vec<PlotThread>,
}

impl PlotArcs {
    /// Every thread in creation order.
    pub fn threads(&self) -> &[PlotThread] {
        &self.threads
    }

    /// Threads still open.
    pub fn open(&self) -> Vec<&PlotThread> {
        self.threads
            .iter()
            .filter(|thread| thread.status == ThreadStatus::Open)
            .collect()
    }

    /// Apply an update, returning `(opened ids, resolved ids)`.
    ///
    /// Unknown or already resolved ids are ignored. A new description that
    /// matches an open thread does not open a duplicate.
    pub fn apply(&mut self, chapter: u32, update: &PlotUpdate) -> (Vec<u32>, Vec<u32>) {
        let mut resolved = Vec::new();
        for id in &update.resolved {
            match self.threads.iter_mut().find(|thread| thread.id == *id) {
                Some(thread) if thread.status == ThreadStatus::Open => {
                    thread.status = ThreadStatus::Resolved;
                    thread.resolved_in = Some(chapter);
                    resolved.push(*id);
                }
                Some(_) => {}
                None => tracing::warn!(thread = id, chapter, "Ignoring resolution of unknown thread"),
            }
        }

        let mut opened = Vec::new();
        for description in &update.opened {
            let description = description.trim();
            if description.is_empty() {
                continue;
            }
            let duplicate = self.threads.iter().any(|thread| {
                thread.status == ThreadStatus::Open
                    && thread.description.eq_ignore_ascii_case(description)
            });
            if duplicate {
                continue;
            }
            let id = self.threads.iter().map(|thread| thread.id).max().unwrap_or(0) + 1;
            self.threads.push(PlotThread {
                id,
                description: description.to_string(),
                status: ThreadStatus::Open,
                opened_in: Some(chapter),
                resolved_in: None,
            });
            opened.push(id);
        }
        (opened, resolved)
    }
}
