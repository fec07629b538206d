//! Error types for the folio narrative pipeline.
//!
//! This crate provides the foundation error types used throughout the folio crates.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Every [`FolioError`] exposes a stable machine code through [`FolioError::code`]
//! alongside its human-readable `Display` form.
//!
//! # Examples
//!
//! ```
//! use folio_error::{FolioResult, StageError, StageErrorKind};
//!
//! fn draft_too_early() -> FolioResult<()> {
//!     Err(StageError::new(StageErrorKind::InvalidStageTransition {
//!         operation: "generate_chapter_draft".to_string(),
//!         required: "BlueprintReady".to_string(),
//!         actual: "ArchitectureReady".to_string(),
//!     }))?
//! }
//!
//! let err = draft_too_early().unwrap_err();
//! assert_eq!(err.code(), "invalid_stage_transition");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod consistency;
mod error;
mod memory;
mod persistence;
mod provider;
mod stage;
mod workspace;

pub use config::ConfigError;
pub use consistency::ConsistencyError;
pub use error::{FolioError, FolioErrorKind, FolioResult};
pub use memory::{MemoryError, MemoryErrorKind};
pub use persistence::{PersistenceError, PersistenceErrorKind};
pub use provider::{ProviderError, ProviderErrorKind, RetryableError};
pub use stage::{StageError, StageErrorKind};
pub use workspace::{WorkspaceError, WorkspaceErrorKind};
