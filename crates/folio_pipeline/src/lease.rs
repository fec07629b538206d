//! Per-project mutation leases.

use folio_error::{FolioResult, WorkspaceError, WorkspaceErrorKind};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Registry of projects with a mutation in flight.
///
/// At most one lease per project exists at a time; a second request is
/// rejected with `ProjectBusy` instead of waiting. Leases for different
/// projects never contend beyond the registry's short critical section.
///
/// # Examples
///
/// ```
/// use folio_pipeline::ProjectLocks;
///
/// let locks = ProjectLocks::default();
/// let lease = locks.try_acquire("saga").unwrap();
/// assert_eq!(locks.try_acquire("saga").unwrap_err().code(), "project_busy");
/// assert!(locks.try_acquire("other").is_ok());
///
/// drop(lease);
/// assert!(locks.try_acquire("saga").is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    active: Arc<Mutex<HashSet<String>>>,
}

impl ProjectLocks {
    fn registry(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panic while holding the guard cannot leave the set half-updated.
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the lease for `project`.
    ///
    /// # Errors
    ///
    /// `ProjectBusy` if another mutation of `project` is in flight.
    pub fn try_acquire(&self, project: &str) -> FolioResult<ProjectLease> {
        if !self.registry().insert(project.to_string()) {
            warn!(project, "Rejected concurrent mutation");
            return Err(
                WorkspaceError::new(WorkspaceErrorKind::ProjectBusy(project.to_string())).into(),
            );
        }
        debug!(project, "Lease acquired");
        Ok(ProjectLease {
            project: project.to_string(),
            locks: self.clone(),
        })
    }

    /// Whether a mutation of `project` is in flight.
    pub fn is_busy(&self, project: &str) -> bool {
        self.registry().contains(project)
    }
}

/// Exclusive right to mutate one project; released on drop.
#[derive(Debug)]
pub struct ProjectLease {
    project: String,
    locks: ProjectLocks,
}

impl ProjectLease {
    /// Project this lease covers.
    pub fn project(&self) -> &str {
        &self.project
    }
}

impl Drop for ProjectLease {
    fn drop(&mut self) {
        self.locks.registry().remove(&self.project);
        debug!(project = %self.project, "Lease released");
    }
}
