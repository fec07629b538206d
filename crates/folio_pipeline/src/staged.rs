//! Uncommitted results of a pipeline step.

use folio_core::ProjectState;
use folio_memory::VectorIndex;

/// A step's result together with the project state it produced.
///
/// Nothing here is visible to readers until the workspace commits it; when
/// `index` is `None` the vector memory is unchanged.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    /// Value returned to the caller
    pub value: T,
    /// Full state to commit
    pub state: ProjectState,
    /// Full vector index to commit, if the step changed it
    pub index: Option<VectorIndex>,
}

impl<T> Staged<T> {
    /// A staged state without vector changes.
    pub fn new(value: T, state: ProjectState) -> Self {
        Self {
            value,
            state,
            index: None,
        }
    }

    /// Transform the value, keeping the staged state and index.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Staged<U> {
        Staged {
            value: f(self.value),
            state: self.state,
            index: self.index,
        }
    }

    /// Attach a staged vector index.
    pub fn with_index(mut self, index: VectorIndex) -> Self {
        self.index = Some(index);
        self
    }
}
