//! Durable project storage.
//!
//! Two [`folio_interface::ProjectStore`] backends are provided:
//!
//! - [`FileSystemProjectStore`] writes one directory per project, laid out as
//!   human-readable artifacts (architecture, blueprint, chapter texts,
//!   summaries, character and plot state, vector records). Every commit
//!   writes a complete generation directory and then atomically moves the
//!   `CURRENT` pointer to it.
//! - [`InMemoryProjectStore`] keeps snapshots in memory, for tests and
//!   ephemeral workspaces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifacts;
mod filesystem;
mod memory;

pub use artifacts::{ArtifactFile, assemble_artifacts, render_artifacts};
pub use filesystem::FileSystemProjectStore;
pub use memory::InMemoryProjectStore;
