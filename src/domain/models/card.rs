//! Card domain model.
//!
//! A card is the unit of narrative structure. Cards live in an ordered
//! list whose order reflects the narrative sequence. The JSON index is the
//! only representation that carries authoritative [`CardMeta`]; the outline
//! and narrative representations carry structural fields only.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Type assigned to cards synthesised from narrative paragraphs.
pub const SCENE_TYPE: &str = "scene";

/// Type assigned to cards that arrive without one.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Current time as milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Build the sequential id used for synthesised cards (`card_001`, ...).
pub fn sequential_id(position: usize) -> String {
    format!("card_{position:03}")
}

/// Versioning metadata owned by the JSON index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMeta {
    /// Starts at 1, bumped by exactly one on every accepted API write.
    #[serde(default = "initial_version")]
    pub version: u64,

    /// Milliseconds since the Unix epoch of the last accepted write.
    #[serde(rename = "updatedAt", default = "now_millis")]
    pub updated_at: i64,
}

const fn initial_version() -> u64 {
    1
}

impl CardMeta {
    /// Fresh metadata for a card that is being created at `updated_at`.
    pub const fn initial(updated_at: i64) -> Self {
        Self {
            version: initial_version(),
            updated_at,
        }
    }

    /// Metadata after one more accepted write at `updated_at`, or `None`
    /// once the version counter is exhausted.
    pub const fn bumped(&self, updated_at: i64) -> Option<Self> {
        match self.version.checked_add(1) {
            Some(version) => Some(Self {
                version,
                updated_at,
            }),
            None => None,
        }
    }
}

impl Default for CardMeta {
    fn default() -> Self {
        Self::initial(now_millis())
    }
}

/// A single narrative card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,

    /// Free-form classification ("scene", "character", "note", ...).
    #[serde(rename = "type", default)]
    pub card_type: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub meta: CardMeta,
}

impl Card {
    /// Create a card with empty tags and initial metadata stamped `now`.
    pub fn new(
        id: impl Into<String>,
        card_type: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            id: id.into(),
            card_type: card_type.into(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            meta: CardMeta::initial(now),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_meta(mut self, meta: CardMeta) -> Self {
        self.meta = meta;
        self
    }

    /// The example card seeded into empty stores.
    pub fn example(now: i64) -> Self {
        Self::new(
            sequential_id(1),
            SCENE_TYPE,
            "Example Opening",
            "This is a sample paragraph. Replace me.",
            now,
        )
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.id, self.card_type, self.title)
    }
}

/// Returns the first id that appears more than once, if any.
pub fn find_duplicate_id(cards: &[Card]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(cards.len());
    cards
        .iter()
        .find(|card| !seen.insert(card.id.as_str()))
        .map(|card| card.id.as_str())
}

/// One of the three serialisations of a card list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Delimited outline text (`story_outline.txt`).
    Outline,
    /// Structured JSON index (`index.json`), the system of record.
    Json,
    /// Flattened narrative text (`story.txt`).
    Narrative,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Json => "json",
            Self::Narrative => "narrative",
        }
    }

    /// Source label attached to embedding records produced by a change
    /// originating in this representation.
    pub fn change_source(&self) -> &'static str {
        match self {
            Self::Outline => "outline_change",
            Self::Json => "json_change",
            Self::Narrative => "story_txt_change",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_id_padding() {
        assert_eq!(sequential_id(1), "card_001");
        assert_eq!(sequential_id(42), "card_042");
        assert_eq!(sequential_id(1234), "card_1234");
    }

    #[test]
    fn test_card_json_field_names() {
        let card = Card::new("card_001", "scene", "Opening", "Text", 1000);
        let json = serde_json::to_value(&card).unwrap();

        assert_eq!(json["type"], "scene");
        assert_eq!(json["meta"]["version"], 1);
        assert_eq!(json["meta"]["updatedAt"], 1000);
        assert!(json.get("card_type").is_none());
    }

    #[test]
    fn test_card_deserialization_fills_defaults() {
        let card: Card = serde_json::from_str(r#"{"id": "card_009"}"#).unwrap();

        assert_eq!(card.id, "card_009");
        assert!(card.card_type.is_empty());
        assert!(card.title.is_empty());
        assert!(card.content.is_empty());
        assert!(card.tags.is_empty());
        assert_eq!(card.meta.version, 1);
        assert!(card.meta.updated_at > 0);
    }

    #[test]
    fn test_partial_meta_defaults_version() {
        let card: Card =
            serde_json::from_str(r#"{"id": "a", "meta": {"updatedAt": 77}}"#).unwrap();
        assert_eq!(card.meta, CardMeta { version: 1, updated_at: 77 });
    }

    #[test]
    fn test_meta_bumped() {
        let meta = CardMeta { version: 3, updated_at: 10 };
        assert_eq!(meta.bumped(20), Some(CardMeta { version: 4, updated_at: 20 }));

        let exhausted = CardMeta { version: u64::MAX, updated_at: 10 };
        assert_eq!(exhausted.bumped(20), None);
    }

    #[test]
    fn test_find_duplicate_id() {
        let cards = vec![
            Card::new("a", "", "", "", 0),
            Card::new("b", "", "", "", 0),
            Card::new("a", "", "", "", 0),
        ];
        assert_eq!(find_duplicate_id(&cards), Some("a"));
        assert_eq!(find_duplicate_id(&cards[..2]), None);
    }

    #[test]
    fn test_example_card() {
        let card = Card::example(5);
        assert_eq!(card.id, "card_001");
        assert_eq!(card.card_type, SCENE_TYPE);
        assert_eq!(card.meta.version, 1);
    }
}
