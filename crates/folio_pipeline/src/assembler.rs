//! Bounded, retrieval-augmented prompt composition.

use crate::prompts;
use folio_core::{
    ChapterDirectives, ChapterSpec, CharacterProfile, PipelineSettings, PlotThread, ProjectState,
    ScoredRecord,
};
use folio_error::{FolioResult, StageError, StageErrorKind};
use regex::RegexBuilder;
use tracing::{debug, warn};

/// What a prompt is being assembled for.
#[derive(Debug, Clone, Copy)]
pub enum PromptTask<'a> {
    /// World, characters and plot seeds
    Architecture {
        /// Extra guidance for this request
        guidance: Option<&'a str>,
    },
    /// Chapter-by-chapter plan
    Blueprint {
        /// Extra guidance for this request
        guidance: Option<&'a str>,
    },
    /// Scene outline for one chapter
    ChapterOutline {
        /// Chapter index
        chapter: u32,
        /// Caller directives
        directives: &'a ChapterDirectives,
    },
    /// Full draft for one chapter
    ChapterDraft {
        /// Chapter index
        chapter: u32,
        /// Caller directives
        directives: &'a ChapterDirectives,
        /// Outline produced for this draft
        outline: &'a str,
    },
    /// Summary, character and plot extraction from approved text
    Finalization {
        /// Chapter index
        chapter: u32,
        /// Approved chapter text
        text: &'a str,
    },
    /// Contradiction search over a chapter
    Consistency {
        /// Chapter index
        chapter: u32,
        /// Chapter text under review
        text: &'a str,
    },
}

/// Composes prompts from project state and already-retrieved memory records.
///
/// Output depends only on its inputs and never exceeds
/// `max_prompt_chars` characters. Retrieved records are expected in
/// descending similarity; when they do not all fit the least similar are
/// dropped first, whole. Up to a quarter of the budget is held for them.
///
/// Structured context that overruns the rest of the budget is reduced in
/// steps: the previous chapter falls back from its final text to its
/// summary, then optional sections are cut whole (story so far, open
/// threads, characters, previous chapter), and only then is the longest
/// remaining section shortened.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    settings: PipelineSettings,
}

impl PromptAssembler {
    /// Create an assembler with the given budget settings.
    pub fn new(settings: PipelineSettings) -> Self {
        Self { settings }
    }

    /// Budget settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Retrieval query for drafting a chapter.
    pub fn retrieval_query(spec: &ChapterSpec, directives: &ChapterDirectives) -> String {
        let mut query = spec.retrieval_query();
        for extra in [&directives.scene_location, &directives.key_items] {
            if !extra.trim().is_empty() {
                query.push('\n');
                query.push_str(extra.trim());
            }
        }
        if !directives.characters_involved.is_empty() {
            query.push('\n');
            query.push_str(&directives.characters_involved.join(", "));
        }
        query
    }

    /// Build the prompt for `task`.
    ///
    /// # Errors
    ///
    /// `MissingArtifact` when the task needs an architecture or blueprint the
    /// project lacks, `ChapterOutOfRange` for an index outside the blueprint.
    pub fn build(
        &self,
        state: &ProjectState,
        task: PromptTask<'_>,
        retrieved: &[ScoredRecord],
    ) -> FolioResult<String> {
        let mut sections = Sections::default();
        let config = state.project.config();
        sections.push(
            "Project",
            format!(
                "Topic: {}\nGenre: {}\nChapters: {}\nTarget words per chapter: {}",
                config.topic(),
                config.genre(),
                config.num_chapters(),
                config.words_per_chapter()
            ),
        );
        if !config.user_guidance().trim().is_empty() {
            sections.push("Author guidance", config.user_guidance().trim());
        }

        let instruction = match task {
            PromptTask::Architecture { guidance } => {
                push_guidance(&mut sections, guidance);
                prompts::architecture()
            }
            PromptTask::Blueprint { guidance } => {
                sections.push("Architecture", &require_architecture(state)?.text);
                push_guidance(&mut sections, guidance);
                prompts::blueprint(config.num_chapters())
            }
            PromptTask::ChapterOutline {
                chapter,
                directives,
            } => {
                let spec = state.chapter_spec(chapter)?;
                self.push_chapter_context(&mut sections, state, spec, directives)?;
                prompts::outline(spec)
            }
            PromptTask::ChapterDraft {
                chapter,
                directives,
                outline,
            } => {
                let spec = state.chapter_spec(chapter)?;
                self.push_chapter_context(&mut sections, state, spec, directives)?;
                sections.push("Chapter outline", outline);
                let words = directives.words.unwrap_or(config.words_per_chapter());
                match directives.custom_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
                    Some(custom) => custom.trim().to_string(),
                    None => prompts::draft(spec, words),
                }
            }
            PromptTask::Finalization { chapter, text } => {
                let spec = state.chapter_spec(chapter)?;
                if !state.global_summary.is_empty() {
                    sections.push_cuttable(
                        "Story so far",
                        state.global_summary.render(),
                        Cut::StorySoFar,
                        None,
                    );
                }
                push_characters(&mut sections, state.characters.iter().collect());
                push_threads(&mut sections, &state.plot_arcs.open());
                sections.push(
                    &format!("Approved text of chapter {} \"{}\"", spec.index, spec.title),
                    text,
                );
                prompts::finalization(spec.index)
            }
            PromptTask::Consistency { chapter, text } => {
                let spec = state.chapter_spec(chapter)?;
                let haystack = format!("{}\n{}", spec.retrieval_query(), text);
                push_characters(&mut sections, named_characters(state, &haystack, &[]));
                push_threads(&mut sections, &state.plot_arcs.open());
                sections.push(
                    &format!("Chapter {} \"{}\" under review", spec.index, spec.title),
                    text,
                );
                prompts::consistency()
            }
        };

        sections.push_trailing("Instructions", instruction);

        let budget = self.settings.max_prompt_chars();
        let reserve = fit_retrieved(retrieved, usize::MAX)
            .chars
            .min(budget / RETRIEVAL_SHARE);
        let fitted = sections.fit(budget - reserve);
        if fitted.reduced() {
            debug!(
                summarised = fitted.summarised,
                cut = fitted.cut,
                shortened = fitted.shortened,
                budget,
                "Reduced structured context to fit prompt budget"
            );
        }
        let fixed_chars = sections.chars();
        if fixed_chars > budget - reserve {
            warn!(fixed_chars, budget, "Section headings alone exceed prompt budget");
        }

        let retrieval = fit_retrieved(retrieved, budget.saturating_sub(fixed_chars));
        if retrieval.kept < retrieved.len() {
            debug!(
                kept = retrieval.kept,
                dropped = retrieved.len() - retrieval.kept,
                budget,
                "Dropped least similar records to fit prompt budget"
            );
        }

        Ok(sections.render(false) + &retrieval.text + &sections.render(true))
    }

    fn push_chapter_context(
        &self,
        sections: &mut Sections,
        state: &ProjectState,
        spec: &ChapterSpec,
        directives: &ChapterDirectives,
    ) -> FolioResult<()> {
        sections.push("Architecture", &require_architecture(state)?.text);
        sections.push(
            &format!("Chapter {}: {}", spec.index, spec.title),
            &spec.synopsis,
        );

        if let Some(previous) = state.previous_chapter(spec.index) {
            let summary = state
                .global_summary
                .latest(previous.index)
                .map(|entry| (format!("Chapter {} (summary)", previous.index), entry.text.clone()));
            match (&previous.finalized, summary) {
                (Some(text), summary) => sections.push_cuttable(
                    &format!("Chapter {} (final text)", previous.index),
                    text,
                    Cut::PreviousChapter,
                    summary,
                ),
                (None, Some((heading, text))) => {
                    sections.push_cuttable(&heading, text, Cut::PreviousChapter, None)
                }
                (None, None) => {}
            }
        }

        let haystack = spec.retrieval_query();
        push_characters(
            sections,
            named_characters(state, &haystack, &directives.characters_involved),
        );
        push_threads(sections, &state.plot_arcs.open());

        let mut requested = Vec::new();
        if !directives.user_guidance.trim().is_empty() {
            requested.push(format!("Guidance: {}", directives.user_guidance.trim()));
        }
        if !directives.characters_involved.is_empty() {
            requested.push(format!(
                "Characters involved: {}",
                directives.characters_involved.join(", ")
            ));
        }
        for (label, value) in [
            ("Key items", &directives.key_items),
            ("Scene location", &directives.scene_location),
            ("Time constraint", &directives.time_constraint),
        ] {
            if !value.trim().is_empty() {
                requested.push(format!("{label}: {}", value.trim()));
            }
        }
        if !requested.is_empty() {
            sections.push("Chapter directives", requested.join("\n"));
        }
        Ok(())
    }
}

/// Characters whose identifier appears as a whole word in `text`, or who are listed in `extra`.
pub fn named_characters<'a>(
    state: &'a ProjectState,
    text: &str,
    extra: &[String],
) -> Vec<(&'a String, &'a CharacterProfile)> {
    state
        .characters
        .iter()
        .filter(|(name, _)| {
            extra
                .iter()
                .any(|wanted| wanted.trim().eq_ignore_ascii_case(name.trim()))
                || mentions(text, name)
        })
        .collect()
}

fn mentions(text: &str, name: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(name.trim()));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn require_architecture(state: &ProjectState) -> FolioResult<&folio_core::Architecture> {
    state.architecture.as_ref().ok_or_else(|| {
        StageError::new(StageErrorKind::MissingArtifact("architecture".to_string())).into()
    })
}

fn push_guidance(sections: &mut Sections, guidance: Option<&str>) {
    if let Some(guidance) = guidance.filter(|g| !g.trim().is_empty()) {
        sections.push("Request guidance", guidance.trim());
    }
}

fn push_characters(sections: &mut Sections, characters: Vec<(&String, &CharacterProfile)>) {
    if characters.is_empty() {
        return;
    }
    let body = characters
        .iter()
        .map(|(name, profile)| format!("- {name}: {}", profile.describe()))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push_cuttable("Established characters", body, Cut::Characters, None);
}

fn push_threads(sections: &mut Sections, threads: &[&PlotThread]) {
    if threads.is_empty() {
        return;
    }
    let body = threads
        .iter()
        .map(|thread| format!("- [{}] {}", thread.id, thread.description))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push_cuttable("Open plot threads", body, Cut::Threads, None);
}

fn section(heading: &str, body: &str) -> String {
    format!("## {heading}\n{}\n\n", body.trim_end())
}

/// Share of the budget held back for retrieved passages, as a divisor.
const RETRIEVAL_SHARE: usize = 4;

const SHORTENED: &str = " [shortened]";

/// Optional sections, in the order they are cut when over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Cut {
    StorySoFar,
    Threads,
    Characters,
    PreviousChapter,
}

struct Section {
    heading: String,
    body: String,
    /// Shorter heading and body tried before cutting
    fallback: Option<(String, String)>,
    /// `None` for sections that are only ever shortened
    cut: Option<Cut>,
    /// Rendered after retrieved passages
    trailing: bool,
}

impl Section {
    fn chars(&self) -> usize {
        section(&self.heading, &self.body).chars().count()
    }
}

#[derive(Default)]
struct Fitted {
    summarised: usize,
    cut: usize,
    shortened: usize,
}

impl Fitted {
    fn reduced(&self) -> bool {
        self.summarised + self.cut + self.shortened > 0
    }
}

#[derive(Default)]
struct Sections(Vec<Section>);

impl Sections {
    fn push(&mut self, heading: &str, body: impl AsRef<str>) {
        self.insert(heading, body, None, None, false);
    }

    fn push_cuttable(
        &mut self,
        heading: &str,
        body: impl AsRef<str>,
        cut: Cut,
        fallback: Option<(String, String)>,
    ) {
        self.insert(heading, body, Some(cut), fallback, false);
    }

    fn push_trailing(&mut self, heading: &str, body: impl AsRef<str>) {
        self.insert(heading, body, None, None, true);
    }

    fn insert(
        &mut self,
        heading: &str,
        body: impl AsRef<str>,
        cut: Option<Cut>,
        fallback: Option<(String, String)>,
        trailing: bool,
    ) {
        self.0.push(Section {
            heading: heading.to_string(),
            body: body.as_ref().to_string(),
            fallback,
            cut,
            trailing,
        });
    }

    fn chars(&self) -> usize {
        self.0.iter().map(Section::chars).sum()
    }

    fn render(&self, trailing: bool) -> String {
        self.0
            .iter()
            .filter(|s| s.trailing == trailing)
            .map(|s| section(&s.heading, &s.body))
            .collect()
    }

    /// Reduce sections until they render in at most `available` chars.
    fn fit(&mut self, available: usize) -> Fitted {
        let mut fitted = Fitted::default();

        for index in 0..self.0.len() {
            if self.chars() <= available {
                return fitted;
            }
            if let Some((heading, body)) = self.0[index].fallback.take() {
                self.0[index].heading = heading;
                self.0[index].body = body;
                fitted.summarised += 1;
            }
        }

        while self.chars() > available {
            let next = self
                .0
                .iter()
                .enumerate()
                .filter_map(|(index, s)| s.cut.map(|cut| (cut, index)))
                .min();
            let Some((_, index)) = next else {
                break;
            };
            self.0.remove(index);
            fitted.cut += 1;
        }

        while self.chars() > available {
            let longest = self
                .0
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.body.is_empty())
                .max_by_key(|(index, s)| (s.body.chars().count(), std::cmp::Reverse(*index)))
                .map(|(index, _)| index);
            let Some(index) = longest else {
                break;
            };
            let over = self.chars() - available;
            let body = &mut self.0[index].body;
            let len = body.chars().count();
            let keep = len.saturating_sub(over + SHORTENED.chars().count());
            *body = if keep == 0 {
                String::new()
            } else {
                let kept: String = body.chars().take(keep).collect();
                format!("{}{SHORTENED}", kept.trim_end())
            };
            fitted.shortened += 1;
        }
        fitted
    }
}

struct FittedRetrieval {
    text: String,
    kept: usize,
    chars: usize,
}

/// Keep the longest prefix of `retrieved` whose rendering fits in `available` chars.
fn fit_retrieved(retrieved: &[ScoredRecord], available: usize) -> FittedRetrieval {
    const HEADING: &str = "## Related passages\n";
    let mut used = HEADING.len();
    let mut items = Vec::new();
    for hit in retrieved {
        let item = format!(
            "[{} #{}, similarity {:.3}]\n{}\n\n",
            hit.record.source,
            hit.record.chunk,
            hit.score,
            hit.record.text.trim_end()
        );
        let cost = item.chars().count();
        if used.saturating_add(cost) > available {
            break;
        }
        used += cost;
        items.push(item);
    }
    let kept = items.len();
    let text = if items.is_empty() {
        String::new()
    } else {
        format!("{HEADING}{}", items.concat())
    };
    let chars = text.chars().count();
    FittedRetrieval { text, kept, chars }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{RecordSource, VectorRecord};

    fn hit(id: u64, text: &str, score: f64) -> ScoredRecord {
        ScoredRecord {
            record: VectorRecord {
                id,
                source: RecordSource::Chapter(1),
                chunk: id as u32,
                text: text.to_string(),
                embedding: vec![1.0],
            },
            score,
        }
    }

    #[test]
    fn test_fit_keeps_most_similar_prefix() {
        let hits = vec![hit(0, "alpha", 0.9), hit(1, "beta", 0.5), hit(2, "gamma", 0.1)];
        let all = fit_retrieved(&hits, 10_000);
        assert_eq!(all.kept, 3);

        let one_item = "[chapter 1 #0, similarity 0.900]\nalpha\n\n".chars().count();
        let fitted = fit_retrieved(&hits, "## Related passages\n".len() + one_item);
        assert_eq!(fitted.kept, 1);
        assert!(fitted.text.contains("alpha"));
        assert!(!fitted.text.contains("beta"));
    }

    #[test]
    fn test_fit_with_no_room_renders_nothing() {
        let fitted = fit_retrieved(&[hit(0, "alpha", 0.9)], 5);
        assert_eq!(fitted.kept, 0);
        assert!(fitted.text.is_empty());
    }

    #[test]
    fn test_fit_prefers_fallback_then_cuts_then_shortens() {
        let mut sections = Sections::default();
        sections.push("Architecture", "a".repeat(100));
        sections.push_cuttable("Open plot threads", "t".repeat(50), Cut::Threads, None);
        sections.push_cuttable(
            "Chapter 1 (final text)",
            "f".repeat(200),
            Cut::PreviousChapter,
            Some(("Chapter 1 (summary)".to_string(), "s".repeat(20))),
        );
        sections.push_trailing("Instructions", "Write.");
        let full = sections.chars();

        let fitted = sections.fit(full - 150);
        assert_eq!(fitted.summarised, 1);
        assert_eq!(fitted.cut, 0);
        assert!(sections.render(false).contains("Chapter 1 (summary)"));

        let fitted = sections.fit(sections.chars() - 10);
        assert_eq!(fitted.cut, 1);
        assert!(!sections.render(false).contains("Open plot threads"));

        // Cutting the summary alone leaves 40 chars to shorten.
        let summary = section("Chapter 1 (summary)", &"s".repeat(20)).chars().count();
        let available = sections.chars() - summary - 40;
        let fitted = sections.fit(available);
        assert_eq!(fitted.cut, 1);
        assert_eq!(fitted.shortened, 1);
        assert!(sections.render(false).contains(&format!("{}{SHORTENED}", "a".repeat(48))));
        assert!(sections.chars() <= available);
        assert!(sections.render(false).contains(SHORTENED));
        assert_eq!(sections.render(true), "## Instructions\nWrite.\n\n");
    }

    #[test]
    fn test_mentions_matches_whole_words() {
        assert!(mentions("Later, mara climbed the tower.", "Mara"));
        assert!(!mentions("The Maradonna sailed.", "Mara"));
    }
}
