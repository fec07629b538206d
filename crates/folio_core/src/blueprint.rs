//! Architecture document and chapter blueprint.

use serde::{Deserialize, Serialize};

/// World, character and plot-seed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    /// Document text
    pub text: String,
    /// Set when the document no longer reflects the project inputs
    #[serde(default)]
    pub stale: bool,
}

impl Architecture {
    /// Wrap freshly generated text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stale: false,
        }
    }
}

/// One chapter slot in the blueprint.
///
/// # Examples
///
/// ```
/// use folio_core::ChapterSpec;
///
/// let spec = ChapterSpec::new(1, "The Map", "Mara finds a map in the lamp room.");
/// assert_eq!(spec.retrieval_query(), "The Map\nMara finds a map in the lamp room.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSpec {
    /// Chapter index, 1-based
    pub index: u32,
    /// Chapter title
    pub title: String,
    /// One-line synopsis
    pub synopsis: String,
}

impl ChapterSpec {
    /// Create a chapter spec.
    pub fn new(index: u32, title: impl Into<String>, synopsis: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            synopsis: synopsis.into(),
        }
    }

    /// Text used to query vector memory when drafting this chapter.
    pub fn retrieval_query(&self) -> String {
        format!("{}\n{}", self.title, self.synopsis)
    }
}

/// Ordered chapter specifications covering indices `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    chapters: Vec<ChapterSpec>,
    /// Set when the architecture it was derived from was regenerated
    #[serde(default)]
    pub stale: bool,
}

impl Blueprint {
    /// Build a blueprint, requiring exactly `expected` chapters indexed `1..=expected`.
    ///
    /// Chapters are sorted by index before validation.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violation found.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_core::{Blueprint, ChapterSpec};
    ///
    /// let specs = vec![ChapterSpec::new(2, "B", "b"), ChapterSpec::new(1, "A", "a")];
    /// let blueprint = Blueprint::new(specs, 2).unwrap();
    /// assert_eq!(blueprint.chapters()[0].title, "A");
    ///
    /// let gap = vec![ChapterSpec::new(1, "A", "a"), ChapterSpec::new(3, "C", "c")];
    /// assert!(Blueprint::new(gap, 2).is_err());
    /// ```
    pub fn new(mut chapters: Vec<ChapterSpec>, expected: u32) -> Result<Self, String> {
        if chapters.len() != expected as usize {
            return Err(format!(
                "blueprint has {} chapters, expected {}",
                chapters.len(),
                expected
            ));
        }
        chapters.sort_by_key(|spec| spec.index);
        for (position, spec) in chapters.iter().enumerate() {
            let want = position as u32 + 1;
            if spec.index != want {
                return Err(format!(
                    "blueprint indices must be contiguous from 1; found {} where {} was expected",
                    spec.index, want
                ));
            }
            if spec.title.trim().is_empty() {
                return Err(format!("chapter {} has an empty title", spec.index));
            }
        }
        Ok(Self {
            chapters,
            stale: false,
        })
    }

    /// Chapter specs in index order.
    pub fn chapters(&self) -> &[ChapterSpec] {
        &self.chapters
    }

    /// Spec for one chapter.
    pub fn chapter(&self, index: u32) -> Option<&ChapterSpec> {
        self.chapters.iter().find(|spec| spec.index == index)
    }

    /// Number of chapters.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Whether the blueprint has no chapters.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
