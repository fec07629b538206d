//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Folio - staged, retrieval-grounded novel generation
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Staged, retrieval-grounded novel generation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file used instead of ./folio.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project, or show it if it already exists
    Init {
        /// Project name
        project: String,

        #[command(flatten)]
        overrides: ProjectOverrides,
    },

    /// Generate (or regenerate) the architecture document
    Architecture {
        /// Project name
        project: String,

        /// Extra guidance for this request
        #[arg(long)]
        guidance: Option<String>,

        /// Replace an existing architecture, marking dependents stale
        #[arg(long)]
        regenerate: bool,
    },

    /// Generate (or regenerate) the chapter blueprint
    Blueprint {
        /// Project name
        project: String,

        /// Extra guidance for this request
        #[arg(long)]
        guidance: Option<String>,

        /// Replace an existing blueprint, marking drafts stale
        #[arg(long)]
        regenerate: bool,
    },

    /// Outline and draft one chapter
    Draft {
        /// Project name
        project: String,

        /// Chapter index, 1-based
        chapter: u32,

        #[command(flatten)]
        directives: DraftArgs,
    },

    /// Finalize a drafted chapter
    Finalize {
        /// Project name
        project: String,

        /// Chapter index, 1-based
        chapter: u32,

        /// File holding edited chapter text to finalize instead of the draft
        #[arg(long)]
        text_file: Option<PathBuf>,
    },

    /// Check a chapter for contradictions
    Check {
        /// Project name
        project: String,

        /// Chapter index, 1-based
        chapter: u32,
    },

    /// Index a reference document into vector memory
    Import {
        /// Project name
        project: String,

        /// Document name; re-importing a name replaces its records
        name: String,

        /// Text file to import
        file: PathBuf,
    },

    /// Remove every vector memory record of a project
    ClearVectors {
        /// Project name
        project: String,
    },

    /// Show stage, chapters and memory size
    Status {
        /// Project name
        project: String,
    },

    /// Show plot threads
    PlotArcs {
        /// Project name
        project: String,
    },

    /// Show the running chapter summary
    Summary {
        /// Project name
        project: String,
    },

    /// Show established character facts
    Characters {
        /// Project name
        project: String,
    },

    /// Show configured providers and stored projects
    Health,
}

/// Values that override `[defaults]` when creating a project.
#[derive(Args, Debug, Default)]
pub struct ProjectOverrides {
    /// Premise of the story
    #[arg(long)]
    pub topic: Option<String>,

    /// Genre label
    #[arg(long)]
    pub genre: Option<String>,

    /// Number of chapters
    #[arg(long)]
    pub chapters: Option<u32>,

    /// Target words per chapter
    #[arg(long)]
    pub words: Option<u32>,

    /// Guidance applied to every stage
    #[arg(long)]
    pub guidance: Option<String>,
}

/// Per-chapter drafting directives.
#[derive(Args, Debug, Default)]
pub struct DraftArgs {
    /// Guidance for this chapter
    #[arg(long)]
    pub guidance: Option<String>,

    /// Characters that must appear
    #[arg(long, value_delimiter = ',')]
    pub characters: Vec<String>,

    /// Items that matter in this chapter
    #[arg(long)]
    pub key_items: Option<String>,

    /// Where the chapter takes place
    #[arg(long)]
    pub location: Option<String>,

    /// Time pressure or period
    #[arg(long)]
    pub time: Option<String>,

    /// Records retrieved from memory
    #[arg(long)]
    pub k: Option<usize>,

    /// Word target for this chapter
    #[arg(long)]
    pub words: Option<u32>,

    /// File whose contents replace the drafting instructions
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,
}
