//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the folio binary.

mod commands;
mod run;

pub use commands::{Cli, Commands, DraftArgs, ProjectOverrides};
pub use run::execute;
