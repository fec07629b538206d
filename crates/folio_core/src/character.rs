//! Character state with merge semantics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current knowledge about one character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Established facts, keyed by attribute name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Where the character stands in their arc
    #[serde(default)]
    pub arc_position: Option<String>,
    /// Last chapter whose finalization touched this character
    #[serde(default)]
    pub last_updated_chapter: Option<u32>,
}

impl CharacterProfile {
    /// Compact one-line rendering for prompts.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .attributes
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        if let Some(arc) = &self.arc_position {
            parts.push(format!("arc: {arc}"));
        }
        parts.join("; ")
    }
}

/// Changes to one character proposed by a finalized chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterUpdate {
    /// New or restated facts
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// New arc position
    #[serde(default)]
    pub arc_position: Option<String>,
}

/// A proposed attribute value that disagrees with an established one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    /// Character identifier
    pub character: String,
    /// Attribute name
    pub attribute: String,
    /// Value kept
    pub established: String,
    /// Value proposed by the chapter
    pub proposed: String,
    /// Chapter that proposed the change
    pub chapter: u32,
}

/// Mapping from character identifier to profile.
///
/// Updates merge into existing profiles. Established attributes are never
/// overwritten: a disagreeing value is reported as a [`MergeConflict`] and the
/// prior fact is kept. Arc positions are expected to move and are replaced.
///
/// # Examples
///
/// ```
/// use folio_core::{CharacterState, CharacterUpdate};
/// use std::collections::BTreeMap;
///
/// let mut state = CharacterState::default();
/// let mut first = BTreeMap::new();
/// first.insert(
///     "Mara".to_string(),
///     CharacterUpdate {
///         attributes: [("eyes".to_string(), "green".to_string())].into(),
///         arc_position: Some("reluctant".to_string()),
///     },
/// );
/// assert!(state.merge(1, &first).is_empty());
///
/// let mut second = BTreeMap::new();
/// second.insert(
///     "mara".to_string(),
///     CharacterUpdate {
///         attributes: [("eyes".to_string(), "brown".to_string())].into(),
///         arc_position: Some("committed".to_string()),
///     },
/// );
/// let conflicts = state.merge(2, &second);
/// assert_eq!(conflicts.len(), 1);
///
/// let mara = state.get("Mara").unwrap();
/// assert_eq!(mara.attributes["eyes"], "green");
/// assert_eq!(mara.arc_position.as_deref(), Some("committed"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    characters: BTreeMap<String, CharacterProfile>,
}

fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl CharacterState {
    /// Profile by identifier, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&CharacterProfile> {
        self.key_for(name).and_then(|key| self.characters.get(key))
    }

    fn key_for(&self, name: &str) -> Option<&String> {
        let wanted = normalize(name);
        self.characters.keys().find(|key| normalize(key) == wanted)
    }

    /// All characters in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CharacterProfile)> {
        self.characters.iter()
    }

    /// Number of known characters.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether no character is known.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Merge updates produced by finalizing `chapter`.
    pub fn merge(
        &mut self,
        chapter: u32,
        updates: &BTreeMap<String, CharacterUpdate>,
    ) -> Vec<MergeConflict> {
        let mut conflicts = Vec::new();
        for (name, update) in updates {
            if name.trim().is_empty() {
                continue;
            }
            let key = self.key_for(name).cloned().unwrap_or_else(|| name.trim().to_string());
            let profile = self.characters.entry(key.clone()).or_default();
            for (attribute, proposed) in &update.attributes {
                match profile.attributes.get(attribute) {
                    Some(established) if normalize(established) == normalize(proposed) => {}
                    Some(established) => {
                        tracing::debug!(
                            character = %key,
                            attribute = %attribute,
                            "Keeping established attribute over conflicting update"
                        );
                        conflicts.push(MergeConflict {
                            character: key.clone(),
                            attribute: attribute.clone(),
                            established: established.clone(),
                            proposed: proposed.clone(),
                            chapter,
                        });
                    }
                    None => {
                        profile.attributes.insert(attribute.clone(), proposed.clone());
                    }
                }
            }
            if let Some(arc) = update.arc_position.as_ref().filter(|arc| !arc.trim().is_empty()) {
                profile.arc_position = Some(arc.clone());
            }
            profile.last_updated_chapter = Some(chapter);
        }
        conflicts
    }
}
