//! Command handlers.

use super::{Cli, Commands, DraftArgs, ProjectOverrides};
use folio::{ChapterDirectives, FolioConfig, ProjectConfig, Workspace};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tracing::{debug, instrument};

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Run one command and print its result as JSON on stdout.
#[instrument(skip(cli))]
pub async fn execute(cli: Cli) -> CliResult {
    let config = FolioConfig::load_with(cli.config.as_deref())?;
    debug!(projects_dir = %config.workspace().projects_dir().display(), "Configuration loaded");
    let workspace = config.build_workspace()?;

    match cli.command {
        Commands::Init { project, overrides } => {
            let project_config = project_config(config.defaults(), overrides)?;
            let created = workspace
                .create_or_load_project(&project, project_config)
                .await?;
            print_json(&created)
        }

        Commands::Architecture {
            project,
            guidance,
            regenerate,
        } => {
            let guidance = guidance.as_deref();
            let text = if regenerate {
                workspace.regenerate_architecture(&project, guidance).await?
            } else {
                workspace.generate_architecture(&project, guidance).await?
            };
            println!("{text}");
            Ok(())
        }

        Commands::Blueprint {
            project,
            guidance,
            regenerate,
        } => {
            let guidance = guidance.as_deref();
            let chapters = if regenerate {
                workspace.regenerate_blueprint(&project, guidance).await?
            } else {
                workspace.generate_blueprint(&project, guidance).await?
            };
            print_json(&chapters)
        }

        Commands::Draft {
            project,
            chapter,
            directives,
        } => {
            let directives = chapter_directives(directives).await?;
            let drafted = workspace
                .generate_chapter_draft(&project, chapter, &directives)
                .await?;
            print_json(&drafted)
        }

        Commands::Finalize {
            project,
            chapter,
            text_file,
        } => {
            let approved = match text_file {
                Some(path) => Some(read_text(&path).await?),
                None => None,
            };
            let result = workspace
                .finalize_chapter(&project, chapter, approved.as_deref())
                .await?;
            print_json(&result)
        }

        Commands::Check { project, chapter } => {
            print_json(&workspace.check_consistency(&project, chapter).await?)
        }

        Commands::Import {
            project,
            name,
            file,
        } => {
            let text = read_text(&file).await?;
            let inserted = workspace
                .import_reference_document(&project, &name, &text)
                .await?;
            print_json(&serde_json::json!({ "document": name, "records": inserted }))
        }

        Commands::ClearVectors { project } => {
            let removed = workspace.clear_vector_store(&project).await?;
            print_json(&serde_json::json!({ "removed": removed }))
        }

        Commands::Status { project } => print_json(&workspace.project_status(&project).await?),

        Commands::PlotArcs { project } => print_json(&workspace.plot_arcs(&project).await?),

        Commands::Summary { project } => {
            print_json(&workspace.global_summary(&project).await?)
        }

        Commands::Characters { project } => {
            print_json(&workspace.character_state(&project).await?)
        }

        Commands::Health => health(&workspace).await,
    }
}

async fn health(workspace: &Workspace) -> CliResult {
    print_json(&workspace.health().await?)
}

fn project_config(defaults: &ProjectConfig, overrides: ProjectOverrides) -> CliResult<ProjectConfig> {
    let config = ProjectConfig::builder()
        .topic(overrides.topic.unwrap_or_else(|| defaults.topic().clone()))
        .genre(overrides.genre.unwrap_or_else(|| defaults.genre().clone()))
        .num_chapters(overrides.chapters.unwrap_or(defaults.num_chapters()))
        .words_per_chapter(overrides.words.unwrap_or(defaults.words_per_chapter()))
        .user_guidance(
            overrides
                .guidance
                .unwrap_or_else(|| defaults.user_guidance().clone()),
        )
        .build()?;
    Ok(config)
}

async fn chapter_directives(args: DraftArgs) -> CliResult<ChapterDirectives> {
    let custom_prompt = match &args.prompt_file {
        Some(path) => Some(read_text(path).await?),
        None => None,
    };
    Ok(ChapterDirectives {
        user_guidance: args.guidance.unwrap_or_default(),
        characters_involved: args
            .characters
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        key_items: args.key_items.unwrap_or_default(),
        scene_location: args.location.unwrap_or_default(),
        time_constraint: args.time.unwrap_or_default(),
        retrieval_k: args.k,
        words: args.words,
        custom_prompt,
    })
}

async fn read_text(path: &Path) -> CliResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into())
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
