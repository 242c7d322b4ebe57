//! Text representations of a card list.
//!
//! Two grammars live here:
//!
//! - The **outline** grammar, one delimited block per card:
//!
//! ```text
//! --CARD_START id:card_001
//! Type: scene
//! Title: Example Opening
//! Content:
//! This is a sample paragraph. Replace me.
//! --CARD_END
//! ```
//!
//! - The **narrative** grammar: card contents separated by blank lines, with
//!   no ids or types at all.
//!
//! Neither grammar carries tags or version metadata. Cards parsed from text
//! get placeholder `meta` that the reconciler replaces from the JSON index.

use crate::domain::models::{now_millis, sequential_id, Card, SCENE_TYPE};

const START_MARKER: &str = "--CARD_START id:";
const END_MARKER: &str = "--CARD_END";
const TYPE_KEY: &str = "type:";
const TITLE_KEY: &str = "title:";
const CONTENT_KEY: &str = "content:";

/// Split into lines on `\n`, dropping a trailing `\r` from each.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Value after a case-insensitive `key` prefix, with leading whitespace removed.
fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let head = line.get(..key.len())?;
    if head.eq_ignore_ascii_case(key) {
        Some(line[key.len()..].trim_start())
    } else {
        None
    }
}

/// The id on a start-marker line, if `line` is one.
fn start_marker_id(line: &str) -> Option<&str> {
    let id = line.strip_prefix(START_MARKER)?.trim();
    (!id.is_empty()).then_some(id)
}

fn is_end_marker(line: &str) -> bool {
    line.trim_end() == END_MARKER
}

fn is_content_header(line: &str) -> bool {
    strip_key(line, CONTENT_KEY).is_some_and(str::is_empty)
}

/// Parse outline text into cards, in block order.
///
/// Lines outside a block are ignored. A block missing its end marker runs
/// to the end of the input. `Type:`/`Title:` keys are case-insensitive and
/// the first occurrence wins.
pub fn parse_outline(text: &str) -> Vec<Card> {
    let now = now_millis();
    let mut cards = Vec::new();
    let mut lines = lines(text).peekable();

    while let Some(line) = lines.next() {
        let Some(id) = start_marker_id(line) else {
            continue;
        };

        let mut card_type: Option<&str> = None;
        let mut title: Option<&str> = None;

        // Metadata section, up to the content header.
        while let Some(&line) = lines.peek() {
            if is_end_marker(line) {
                break;
            }
            lines.next();
            if is_content_header(line) {
                break;
            }
            if let Some(value) = strip_key(line, TYPE_KEY) {
                card_type.get_or_insert(value.trim());
            } else if let Some(value) = strip_key(line, TITLE_KEY) {
                title.get_or_insert(value.trim());
            }
        }

        let mut content_lines = Vec::new();
        for line in lines.by_ref() {
            if is_end_marker(line) {
                break;
            }
            content_lines.push(line);
        }

        cards.push(Card::new(
            id,
            card_type.unwrap_or_default(),
            title.unwrap_or_default(),
            content_lines.join("\n").trim(),
            now,
        ));
    }

    cards
}

/// Render cards as outline text, one block per card with a blank line
/// between blocks.
pub fn render_outline(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| {
            format!(
                "{START_MARKER}{}\nType: {}\nTitle: {}\nContent:\n{}\n{END_MARKER}\n",
                card.id, card.card_type, card.title, card.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split narrative text into scene cards, one per blank-line separated
/// paragraph.
///
/// Ids are sequential (`card_001`, ...) and titles are `Paragraph N`.
/// Whitespace-only paragraphs are dropped.
pub fn split_narrative(text: &str) -> Vec<Card> {
    let now = now_millis();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in lines(text) {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(index, paragraph)| {
            Card::new(
                sequential_id(index + 1),
                SCENE_TYPE,
                format!("Paragraph {}", index + 1),
                paragraph,
                now,
            )
        })
        .collect()
}

/// Render card contents in order, separated by a blank line.
pub fn render_narrative(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| card.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, card_type: &str, title: &str, content: &str) -> Card {
        Card::new(id, card_type, title, content, 0)
    }

    #[test]
    fn test_parse_single_block() {
        let text = "--CARD_START id:card_001\nType: scene\nTitle: Opening\nContent:\nLine one\nLine two\n--CARD_END\n";
        let cards = parse_outline(text);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "card_001");
        assert_eq!(cards[0].card_type, "scene");
        assert_eq!(cards[0].title, "Opening");
        assert_eq!(cards[0].content, "Line one\nLine two");
        assert!(cards[0].tags.is_empty());
        assert_eq!(cards[0].meta.version, 1);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_outline("").is_empty());
        assert!(parse_outline("\n\n  \n").is_empty());
    }

    #[test]
    fn test_parse_ignores_text_outside_blocks() {
        let text = "preamble\n--CARD_START id:a\nContent:\nbody\n--CARD_END\nstray line\n";
        let cards = parse_outline(text);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].content, "body");
    }

    #[test]
    fn test_parse_keys_case_insensitive_first_wins() {
        let text = "--CARD_START id:a\nTYPE: note\ntitle: First\nTitle: Second\ntype: scene\nCONTENT:\nx\n--CARD_END";
        let cards = parse_outline(text);

        assert_eq!(cards[0].card_type, "note");
        assert_eq!(cards[0].title, "First");
    }

    #[test]
    fn test_parse_missing_end_marker_runs_to_end() {
        let text = "--CARD_START id:a\nType: scene\nTitle: T\nContent:\nfirst\n\nsecond\n";
        let cards = parse_outline(text);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].content, "first\n\nsecond");
    }

    #[test]
    fn test_parse_block_without_content_header() {
        let text = "--CARD_START id:a\nType: scene\nTitle: T\n--CARD_END\n--CARD_START id:b\nContent:\nbody\n--CARD_END\n";
        let cards = parse_outline(text);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "T");
        assert!(cards[0].content.is_empty());
        assert_eq!(cards[1].content, "body");
    }

    #[test]
    fn test_parse_crlf_input() {
        let text = "--CARD_START id:a\r\nType: scene\r\nTitle: T\r\nContent:\r\nbody\r\n--CARD_END\r\n";
        let cards = parse_outline(text);

        assert_eq!(cards[0].id, "a");
        assert_eq!(cards[0].title, "T");
        assert_eq!(cards[0].content, "body");
    }

    #[test]
    fn test_parse_blank_start_id_is_not_a_block() {
        assert!(parse_outline("--CARD_START id:   \nContent:\nx\n--CARD_END").is_empty());
    }

    #[test]
    fn test_render_outline_layout() {
        let cards = vec![card("a", "scene", "One", "First"), card("b", "note", "Two", "")];
        let text = render_outline(&cards);

        assert_eq!(
            text,
            "--CARD_START id:a\nType: scene\nTitle: One\nContent:\nFirst\n--CARD_END\n\n\
             --CARD_START id:b\nType: note\nTitle: Two\nContent:\n\n--CARD_END\n"
        );
    }

    #[test]
    fn test_render_outline_empty() {
        assert_eq!(render_outline(&[]), "");
    }

    #[test]
    fn test_outline_round_trip() {
        let cards = vec![
            card("card_001", "scene", "Opening", "It was dark.\n\nThen light."),
            card("card_002", "character", "Mara", "Tall."),
        ];
        let parsed = parse_outline(&render_outline(&cards));

        assert_eq!(parsed.len(), cards.len());
        for (a, b) in parsed.iter().zip(&cards) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.card_type, b.card_type);
            assert_eq!(a.title, b.title);
            assert_eq!(a.content, b.content);
        }
    }

    #[test]
    fn test_split_narrative_two_paragraphs() {
        let cards = split_narrative("Alpha.\n\nBeta.");

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, "card_001");
        assert_eq!(cards[0].title, "Paragraph 1");
        assert_eq!(cards[0].content, "Alpha.");
        assert_eq!(cards[0].card_type, "scene");
        assert_eq!(cards[1].id, "card_002");
        assert_eq!(cards[1].title, "Paragraph 2");
        assert_eq!(cards[1].content, "Beta.");
    }

    #[test]
    fn test_split_narrative_collapses_blank_runs() {
        let cards = split_narrative("\n\n  One\nstill one  \n \n\n\t\nTwo\n\n");

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].content, "One\nstill one");
        assert_eq!(cards[1].content, "Two");
    }

    #[test]
    fn test_split_narrative_empty() {
        assert!(split_narrative("").is_empty());
        assert!(split_narrative(" \n\n \n").is_empty());
    }

    #[test]
    fn test_render_narrative() {
        let cards = vec![card("a", "", "", "Alpha."), card("b", "", "", "Beta.")];
        assert_eq!(render_narrative(&cards), "Alpha.\n\nBeta.");
        assert_eq!(render_narrative(&[]), "");
    }
}
