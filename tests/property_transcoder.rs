//! Property tests for the outline and narrative grammars.

use proptest::prelude::*;

use storysync::domain::models::Card;
use storysync::services::{parse_outline, render_narrative, render_outline, split_narrative};

fn single_line() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.!?']{0,24}".prop_map(|s| s.trim().to_string())
}

fn content() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Za-z0-9 ,.:!?']{0,32}", 0..5)
        .prop_map(|lines| lines.join("\n").trim().to_string())
}

fn card() -> impl Strategy<Value = Card> {
    ("[a-z0-9_]{1,12}", "[a-z]{0,8}", single_line(), content())
        .prop_map(|(id, card_type, title, content)| Card::new(id, card_type, title, content, 0))
}

proptest! {
    #[test]
    fn outline_round_trip_preserves_structural_fields(cards in prop::collection::vec(card(), 0..8)) {
        let parsed = parse_outline(&render_outline(&cards));

        prop_assert_eq!(parsed.len(), cards.len());
        for (original, parsed) in cards.iter().zip(&parsed) {
            prop_assert_eq!(&parsed.id, &original.id);
            prop_assert_eq!(&parsed.card_type, &original.card_type);
            prop_assert_eq!(&parsed.title, &original.title);
            prop_assert_eq!(&parsed.content, &original.content);
        }
    }

    #[test]
    fn narrative_split_is_stable_under_render(text in "[a-z .\n]{0,120}") {
        let first = split_narrative(&text);
        let second = split_narrative(&render_narrative(&first));

        let first_contents: Vec<_> = first.iter().map(|c| c.content.clone()).collect();
        let second_contents: Vec<_> = second.iter().map(|c| c.content.clone()).collect();
        prop_assert_eq!(first_contents, second_contents);
    }

    #[test]
    fn parse_outline_never_panics(text in "\\PC{0,200}") {
        let _ = parse_outline(&text);
    }
}
