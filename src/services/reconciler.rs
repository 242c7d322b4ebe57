//! Id-keyed merges between a text representation and the JSON index.
//!
//! Both directions are set unions keyed by card id with field-level
//! precedence:
//!
//! | field                      | [`merge_from_secondary`]  | [`merge_from_json`]       |
//! |----------------------------|---------------------------|---------------------------|
//! | order                      | secondary, then JSON rest | JSON, then secondary rest |
//! | `type`, `title`, `content` | secondary if non-empty    | JSON if non-empty         |
//! | `tags`, `meta`             | JSON                      | JSON                      |
//!
//! Neither direction drops a card. Deletion only happens through a total
//! write of the JSON index. Repeated ids keep their first occurrence so the
//! result is always id-unique.

use std::collections::{HashMap, HashSet};

use crate::domain::models::{now_millis, Card, CardMeta, UNKNOWN_TYPE};

fn prefer(preferred: &str, fallback: &str) -> String {
    if preferred.is_empty() {
        fallback.to_string()
    } else {
        preferred.to_string()
    }
}

fn index_by_id(cards: &[Card]) -> HashMap<&str, &Card> {
    cards.iter().map(|card| (card.id.as_str(), card)).collect()
}

/// Merge cards parsed from the outline or narrative (`primary`) into the
/// JSON index.
///
/// `primary` fixes the order. Ids unknown to the index become new cards
/// with empty tags and fresh metadata. Index cards that `primary` does not
/// mention are appended unchanged.
pub fn merge_from_secondary(primary: &[Card], json_index: &[Card]) -> Vec<Card> {
    let now = now_millis();
    let mut remaining = index_by_id(json_index);
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len().max(json_index.len()));

    for card in primary {
        if !seen.insert(card.id.as_str()) {
            continue;
        }
        let card = match remaining.remove(card.id.as_str()) {
            Some(indexed) => Card {
                id: card.id.clone(),
                card_type: prefer(&card.card_type, &indexed.card_type),
                title: prefer(&card.title, &indexed.title),
                content: prefer(&card.content, &indexed.content),
                tags: indexed.tags.clone(),
                meta: indexed.meta.clone(),
            },
            None => Card {
                tags: Vec::new(),
                meta: CardMeta::initial(now),
                ..card.clone()
            },
        };
        merged.push(card);
    }

    merged.extend(
        json_index
            .iter()
            .filter(|card| remaining.remove(card.id.as_str()).is_some())
            .cloned(),
    );
    merged
}

/// Merge cards parsed from a text representation (`secondary`) under the
/// JSON index.
///
/// The index fixes the order and wins every non-empty field. Secondary-only
/// cards are appended, typed `unknown` if they carry no type.
pub fn merge_from_json(json_index: &[Card], secondary: &[Card]) -> Vec<Card> {
    let mut remaining = index_by_id(secondary);
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(json_index.len().max(secondary.len()));

    for card in json_index {
        if !seen.insert(card.id.as_str()) {
            continue;
        }
        let card = match remaining.remove(card.id.as_str()) {
            Some(other) => Card {
                id: card.id.clone(),
                card_type: prefer(&card.card_type, &other.card_type),
                title: prefer(&card.title, &other.title),
                content: prefer(&card.content, &other.content),
                tags: card.tags.clone(),
                meta: card.meta.clone(),
            },
            None => card.clone(),
        };
        merged.push(card);
    }

    merged.extend(
        secondary
            .iter()
            .filter(|card| remaining.remove(card.id.as_str()).is_some())
            .map(|card| Card {
                card_type: prefer(&card.card_type, UNKNOWN_TYPE),
                ..card.clone()
            }),
    );
    merged
}
