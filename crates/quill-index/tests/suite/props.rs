use proptest::prelude::*;
use quill_index::{
    EditTranslation, EntryReference, IndexBuilder, Region, SourceIndex, TextEdit, TextRange,
    TextSize,
};

use super::support::{range, TestNode};

const PROPTEST_CASES: u32 = 128;

/// One identifier of the generated source, plus an optional new name.
#[derive(Clone, Debug)]
struct Word {
    text: String,
    separator: &'static str,
    rename: Option<String>,
}

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_$]{0,6}"
}

fn arb_word() -> impl Strategy<Value = Word> {
    (
        arb_ident(),
        prop::sample::select(vec![" ", "  ", ".", "\n", "(", " = "]),
        prop::option::weighted(0.4, arb_ident()),
    )
        .prop_map(|(text, separator, rename)| Word {
            text,
            separator,
            rename,
        })
}

/// Lay the words out after a leading space (offset 0 is never indexed) and
/// return the text together with each word's range.
fn layout(words: &[Word]) -> (String, Vec<TextRange>) {
    let mut text = String::from(" ");
    let mut ranges = Vec::with_capacity(words.len());
    for word in words {
        let start = text.len() as u32;
        text.push_str(&word.text);
        ranges.push(range(start, text.len() as u32));
        text.push_str(word.separator);
    }
    (text, ranges)
}

/// Even words declare entity `i`; odd words reference entity `i - 1` from
/// context `1000`.
fn build(text: &str, ranges: &[TextRange]) -> SourceIndex<u32> {
    let mut builder = IndexBuilder::new(text);
    for (i, word) in ranges.iter().enumerate() {
        let node = TestNode::ident(text, u32::from(word.start()) as usize, u32::from(word.len()) as usize);
        let i = i as u32;
        let recorded = if i % 2 == 0 {
            builder.record_declaration(&node, i)
        } else {
            builder.record_reference(&node, i - 1, 1000)
        };
        assert!(recorded.expect("valid region").is_some());
    }
    builder.finish()
}

fn snapshot(index: &SourceIndex<u32>) -> Vec<(TextRange, String, EntryReference<u32>)> {
    index
        .reference_tokens()
        .map(|token| {
            (
                token.range(),
                token.text().to_string(),
                index.reference_at(token).cloned().expect("indexed token"),
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn point_queries_hit_tokens_and_miss_gaps(words in prop::collection::vec(arb_word(), 1..24)) {
        let (text, ranges) = layout(&words);
        let index = build(&text, &ranges);
        prop_assert_eq!(index.len(), ranges.len());

        for offset in 0..=text.len() as u32 {
            let offset = TextSize::from(offset);
            let expected = ranges.iter().find(|r| r.contains(offset)).copied();
            prop_assert_eq!(index.token_at(offset).map(|t| t.range()), expected);
        }
        index.check_consistency().unwrap();
    }

    #[test]
    fn regions_convert_back_to_the_same_tokens(words in prop::collection::vec(arb_word(), 1..24)) {
        let (text, ranges) = layout(&words);
        let index = build(&text, &ranges);

        for token in index.reference_tokens() {
            let lines = index.line_index();
            let begin = lines.line_col(token.start());
            let end = lines.line_col(token.end());
            prop_assert_eq!(begin.line, index.line_of(token.start()));
            prop_assert_eq!(begin.col, index.column_of(token.start()));

            let region = Region { begin, end };
            let mut builder = IndexBuilder::<u32>::new(text.as_str());
            let again = builder
                .token_for(&TestNode::with_region(region))
                .unwrap()
                .expect("round-tripped region");
            prop_assert_eq!(again.range(), token.range());
            prop_assert_eq!(again.text(), token.text());
        }
    }

    #[test]
    fn resolution_is_idempotent(words in prop::collection::vec(arb_word(), 1..24)) {
        let (text, ranges) = layout(&words);
        // Collapse every entity onto the nearest multiple of four.
        let canonical = |reference: &EntryReference<u32>| EntryReference {
            entry: reference.entry - reference.entry % 4,
            ..reference.clone()
        };

        let once = build(&text, &ranges).resolve_references(&canonical);
        let twice = once.clone().resolve_references(&canonical);

        prop_assert_eq!(snapshot(&once), snapshot(&twice));
        once.check_consistency().unwrap();
        for token in once.reference_tokens() {
            let reference = once.reference_at(token).expect("indexed token");
            prop_assert_eq!(reference.entry % 4, 0);
            prop_assert!(once.tokens_for(reference).contains(token));
        }
    }

    #[test]
    fn remap_then_inverse_restores_the_index(words in prop::collection::vec(arb_word(), 1..24)) {
        let (text, ranges) = layout(&words);
        let index = build(&text, &ranges);

        let mut forward = Vec::new();
        let mut inverse = Vec::new();
        let mut delta = 0i64;
        for (word, old) in words.iter().zip(&ranges) {
            let Some(new_name) = &word.rename else {
                continue;
            };
            forward.push(TextEdit::new(*old, new_name.clone()));

            let new_start = (i64::from(u32::from(old.start())) + delta) as u32;
            let new_end = new_start + new_name.len() as u32;
            inverse.push(TextEdit::new(range(new_start, new_end), word.text.clone()));
            delta += new_name.len() as i64 - i64::from(u32::from(old.len()));
        }

        let renamed = index
            .remap_to(&EditTranslation::new(&text, &forward).unwrap())
            .unwrap();
        renamed.check_consistency().unwrap();
        for (word, token) in words.iter().zip(renamed.reference_tokens()) {
            let expected = word.rename.as_deref().unwrap_or(&word.text);
            prop_assert_eq!(token.text(), expected);
        }

        let restored = renamed
            .remap_to(&EditTranslation::new(renamed.source(), &inverse).unwrap())
            .unwrap();
        prop_assert_eq!(restored.source(), text.as_str());
        prop_assert_eq!(snapshot(&restored), snapshot(&index));
        for entity in index.declarations() {
            prop_assert_eq!(
                restored.declaration_token(entity).map(|t| t.range()),
                index.declaration_token(entity).map(|t| t.range())
            );
        }
    }
}
