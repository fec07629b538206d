//! Mapping between a project snapshot and its artifact files.

use folio_core::{
    Architecture, Blueprint, Chapter, ChapterStatus, CharacterState, GlobalSummary, PlotArcs,
    Project, ProjectState, VectorRecord,
};
use folio_error::{FolioResult, PersistenceError, PersistenceErrorKind};
use folio_interface::StoredProject;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One file of a project generation, path relative to the generation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    /// Relative path using `/` separators
    pub path: String,
    /// File contents
    pub contents: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchitectureMeta {
    stale: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChapterMeta {
    index: u32,
    status: ChapterStatus,
    stale: bool,
    grounding_stale: bool,
    has_final: bool,
}

fn to_json<T: Serialize>(value: &T, what: &str) -> FolioResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| {
        PersistenceError::new(PersistenceErrorKind::Serialization(format!("{what}: {e}"))).into()
    })
}

fn from_json<T: for<'de> Deserialize<'de>>(bytes: &[u8], what: &str) -> FolioResult<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        PersistenceError::new(PersistenceErrorKind::Serialization(format!("{what}: {e}"))).into()
    })
}

fn text(path: String, value: &str) -> ArtifactFile {
    ArtifactFile {
        path,
        contents: value.as_bytes().to_vec(),
    }
}

fn json<T: Serialize>(path: &str, value: &T) -> FolioResult<ArtifactFile> {
    Ok(ArtifactFile {
        path: path.to_string(),
        contents: to_json(value, path)?,
    })
}

/// Render a snapshot as artifact files.
pub fn render_artifacts(snapshot: &StoredProject) -> FolioResult<Vec<ArtifactFile>> {
    let state = &snapshot.state;
    let mut files = vec![json("project.json", &state.project)?];

    if let Some(architecture) = &state.architecture {
        files.push(text("architecture.txt".to_string(), &architecture.text));
        files.push(json(
            "architecture.json",
            &ArchitectureMeta {
                stale: architecture.stale,
            },
        )?);
    }
    if let Some(blueprint) = &state.blueprint {
        files.push(json("blueprint.json", blueprint)?);
    }
    for chapter in state.chapters.values() {
        let n = chapter.index;
        files.push(text(format!("chapters/chapter_{n}_outline.txt"), &chapter.outline));
        files.push(text(format!("chapters/chapter_{n}_draft.txt"), &chapter.draft));
        if let Some(finalized) = &chapter.finalized {
            files.push(text(format!("chapters/chapter_{n}_final.txt"), finalized));
        }
        files.push(json(
            &format!("chapters/chapter_{n}.json"),
            &ChapterMeta {
                index: n,
                status: chapter.status,
                stale: chapter.stale,
                grounding_stale: chapter.grounding_stale,
                has_final: chapter.finalized.is_some(),
            },
        )?);
    }
    files.push(json("global_summary.json", &state.global_summary)?);
    files.push(text("global_summary.txt".to_string(), &state.global_summary.render()));
    files.push(json("character_state.json", &state.characters)?);
    files.push(json("plot_arcs.json", &state.plot_arcs)?);
    files.push(json("vector_store/records.json", &snapshot.records)?);
    Ok(files)
}

fn required<'a>(files: &'a HashMap<String, Vec<u8>>, path: &str) -> FolioResult<&'a [u8]> {
    files.get(path).map(Vec::as_slice).ok_or_else(|| {
        PersistenceError::new(PersistenceErrorKind::Corrupt(format!("missing {path}"))).into()
    })
}

fn utf8(bytes: &[u8], path: &str) -> FolioResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        PersistenceError::new(PersistenceErrorKind::Corrupt(format!("{path}: {e}"))).into()
    })
}

/// Rebuild a snapshot from artifact files keyed by relative path.
pub fn assemble_artifacts(files: &HashMap<String, Vec<u8>>) -> FolioResult<StoredProject> {
    let project: Project = from_json(required(files, "project.json")?, "project.json")?;

    let architecture = match files.get("architecture.txt") {
        Some(bytes) => {
            let meta: ArchitectureMeta =
                from_json(required(files, "architecture.json")?, "architecture.json")?;
            Some(Architecture {
                text: utf8(bytes, "architecture.txt")?,
                stale: meta.stale,
            })
        }
        None => None,
    };

    let blueprint: Option<Blueprint> = files
        .get("blueprint.json")
        .map(|bytes| from_json(bytes, "blueprint.json"))
        .transpose()?;

    let mut chapters = BTreeMap::new();
    let mut meta_paths: Vec<&String> = files
        .keys()
        .filter(|path| path.starts_with("chapters/") && path.ends_with(".json"))
        .collect();
    meta_paths.sort();
    for path in meta_paths {
        let meta: ChapterMeta = from_json(required(files, path)?, path)?;
        let n = meta.index;
        let read = |kind: &str| -> FolioResult<String> {
            let path = format!("chapters/chapter_{n}_{kind}.txt");
            utf8(required(files, &path)?, &path)
        };
        let finalized = if meta.has_final {
            Some(read("final")?)
        } else {
            None
        };
        chapters.insert(
            n,
            Chapter {
                index: n,
                status: meta.status,
                outline: read("outline")?,
                draft: read("draft")?,
                finalized,
                stale: meta.stale,
                grounding_stale: meta.grounding_stale,
            },
        );
    }

    let global_summary: GlobalSummary =
        from_json(required(files, "global_summary.json")?, "global_summary.json")?;
    let characters: CharacterState =
        from_json(required(files, "character_state.json")?, "character_state.json")?;
    let plot_arcs: PlotArcs = from_json(required(files, "plot_arcs.json")?, "plot_arcs.json")?;
    let records: Vec<VectorRecord> = from_json(
        required(files, "vector_store/records.json")?,
        "vector_store/records.json",
    )?;

    Ok(StoredProject {
        state: ProjectState {
            project,
            architecture,
            blueprint,
            chapters,
            global_summary,
            characters,
            plot_arcs,
        },
        records,
    })
}
