//! Append-only log of per-chapter summaries.

use serde::{Deserialize, Serialize};

/// Summary of one finalized chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// Chapter index
    pub chapter: u32,
    /// 1 for the first finalization, incremented on each re-finalization
    pub revision: u32,
    /// Summary text
    pub text: String,
}

/// Append-only summary log.
///
/// Entries are never edited or removed. A re-finalized chapter appends a new
/// revision; [`GlobalSummary::current`] exposes the latest revision of each
/// chapter in chapter order.
///
/// # Examples
///
/// ```
/// use folio_core::GlobalSummary;
///
/// let mut summary = GlobalSummary::default();
/// summary.append(2, "Two");
/// summary.append(1, "One");
/// summary.append(1, "One, revised");
///
/// let current: Vec<_> = summary.current().iter().map(|e| e.text.as_str()).collect();
/// assert_eq!(current, vec!["One, revised", "Two"]);
/// assert_eq!(summary.entries().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSummary {
    entries: Vec<SummaryEntry>,
}

impl GlobalSummary {
    /// Append a summary for `chapter`, returning its revision number.
    pub fn append(&mut self, chapter: u32, text: impl Into<String>) -> u32 {
        let revision = self
            .latest(chapter)
            .map(|entry| entry.revision + 1)
            .unwrap_or(1);
        self.entries.push(SummaryEntry {
            chapter,
            revision,
            text: text.into(),
        });
        revision
    }

    /// Every entry in append order.
    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }

    /// Latest revision for a chapter.
    pub fn latest(&self, chapter: u32) -> Option<&SummaryEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.chapter == chapter)
            .max_by_key(|entry| entry.revision)
    }

    /// Latest revision of each chapter, ordered by chapter index.
    pub fn current(&self) -> Vec<&SummaryEntry> {
        let mut chapters: Vec<u32> = self.entries.iter().map(|entry| entry.chapter).collect();
        chapters.sort_unstable();
        chapters.dedup();
        chapters
            .into_iter()
            .filter_map(|chapter| self.latest(chapter))
            .collect()
    }

    /// Whether no chapter has been summarised yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain-text rendering of the current summaries.
    pub fn render(&self) -> String {
        self.current()
            .iter()
            .map(|entry| format!("Chapter {}: {}", entry.chapter, entry.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
