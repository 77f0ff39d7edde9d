use quill_index::{
    EntryReference, EntryResolver, IndexBuilder, ResolutionStrategy, SourceIndex,
};

use super::support::{Entry, TestNode};

const SOURCE: &str = "class Base { void m() {} }\n\
class Sub extends Base { void m() {} void run() { m(); this.m(); } }\n";

fn run() -> Entry {
    Entry::Method("Sub", "run")
}

fn sub_m() -> Entry {
    Entry::Method("Sub", "m")
}

fn base_m() -> Entry {
    Entry::Method("Base", "m")
}

/// Index with `Sub.m` declared but not yet canonicalised: both calls in `run`
/// point at `Sub.m`.
fn unresolved_index() -> SourceIndex<Entry> {
    let mut builder = IndexBuilder::new(SOURCE);
    builder
        .record_declaration(&TestNode::find(SOURCE, "m", 0), base_m())
        .unwrap();
    builder
        .record_declaration(&TestNode::find(SOURCE, "m", 1), sub_m())
        .unwrap();
    builder
        .record_reference(&TestNode::find(SOURCE, "m", 2), sub_m(), run())
        .unwrap();
    builder
        .record_reference(&TestNode::find(SOURCE, "m", 3), sub_m(), run())
        .unwrap();
    builder.finish()
}

/// Resolves `Sub.m` to `Base.m`, the declaration it overrides.
struct Overrides;

impl EntryResolver<Entry> for Overrides {
    fn resolve_reference(
        &self,
        reference: &EntryReference<Entry>,
        _strategy: ResolutionStrategy,
    ) -> Vec<EntryReference<Entry>> {
        if reference.entry == sub_m() {
            vec![EntryReference {
                entry: base_m(),
                ..reference.clone()
            }]
        } else {
            Vec::new()
        }
    }
}

#[test]
fn overridden_method_references_move_to_the_base_declaration() {
    let index = unresolved_index();
    let naive = EntryReference::new(sub_m(), run(), "m");
    assert_eq!(index.tokens_for(&naive).len(), 2);

    let index = index.resolve_references(&Overrides);

    let canonical = EntryReference::new(base_m(), run(), "m");
    assert!(index.tokens_for(&naive).is_empty());
    let tokens = index.tokens_for(&canonical);
    assert_eq!(tokens.len(), 2);
    for token in tokens {
        assert_eq!(index.reference_at(token), Some(&canonical));
    }
    index.check_consistency().unwrap();
}

#[test]
fn declarations_are_not_rewritten() {
    let index = unresolved_index().resolve_references(&Overrides);

    let sub_decl = index.declaration_token(&sub_m()).expect("Sub.m declaration");
    let base_decl = index.declaration_token(&base_m()).expect("Base.m declaration");
    assert_ne!(sub_decl, base_decl);
    // The declaration site reference of `Sub.m` itself resolves to `Base.m`.
    assert_eq!(
        index.reference_at(sub_decl),
        Some(&EntryReference::declaration(base_m(), "m"))
    );
}

#[test]
fn merged_references_keep_every_token() {
    let index = unresolved_index().resolve_references(&Overrides);

    let declaration = EntryReference::declaration(base_m(), "m");
    assert_eq!(index.tokens_for(&declaration).len(), 2);
    assert_eq!(index.len(), 4);
}

#[test]
fn resolution_is_idempotent() {
    let once = unresolved_index().resolve_references(&Overrides);
    let twice = once.clone().resolve_references(&Overrides);

    let pairs = |index: &SourceIndex<Entry>| {
        index
            .reference_tokens()
            .map(|token| (token.range(), index.reference_at(token).cloned()))
            .collect::<Vec<_>>()
    };
    assert_eq!(pairs(&once), pairs(&twice));
    twice.check_consistency().unwrap();
}

#[test]
fn identity_resolver_changes_nothing() {
    let before = unresolved_index();
    let after = before
        .clone()
        .resolve_references(&|reference: &EntryReference<Entry>| reference.clone());

    let mut keys_before: Vec<_> = before.references().cloned().collect();
    let mut keys_after: Vec<_> = after.references().cloned().collect();
    keys_before.sort();
    keys_after.sort();
    assert_eq!(keys_before, keys_after);
}

#[test]
fn chained_rewrites_use_the_original_keys() {
    // Offset 0 is the "no position" sentinel, so start one column in.
    let source = " x x x";
    let a = Entry::Class("a");
    let b = Entry::Class("b");
    let c = Entry::Class("c");

    let mut builder = IndexBuilder::new(source);
    for (nth, entity) in [&a, &b, &c].into_iter().enumerate() {
        builder
            .record_reference(&TestNode::find(source, "x", nth), entity.clone(), a.clone())
            .unwrap();
    }
    let index = builder.finish();

    // a -> b, b -> c: only what was filed under `b` before the pass ends up
    // under `c`.
    let shift = |reference: &EntryReference<Entry>| {
        let entry = match &reference.entry {
            e if *e == a => b.clone(),
            e if *e == b => c.clone(),
            e => e.clone(),
        };
        EntryReference {
            entry,
            ..reference.clone()
        }
    };
    let index = index.resolve_references(&shift);

    let under = |entity: &Entry| {
        index
            .tokens_for(&EntryReference::new(entity.clone(), a.clone(), "x"))
            .iter()
            .map(|token| u32::from(token.start()))
            .collect::<Vec<_>>()
    };
    assert_eq!(under(&a), Vec::<u32>::new());
    assert_eq!(under(&b), vec![1]);
    assert_eq!(under(&c), vec![3, 5]);
    index.check_consistency().unwrap();
}

#[test]
fn resolved_lookup_collects_every_candidate() {
    let index = unresolved_index();

    struct Both;
    impl EntryResolver<Entry> for Both {
        fn resolve_reference(
            &self,
            reference: &EntryReference<Entry>,
            _strategy: ResolutionStrategy,
        ) -> Vec<EntryReference<Entry>> {
            vec![
                EntryReference::declaration(base_m(), reference.name.clone()),
                EntryReference::declaration(sub_m(), reference.name.clone()),
            ]
        }
    }

    let query = EntryReference::declaration(sub_m(), "m");
    let tokens = index.tokens_for_resolved(&query, &Both);
    assert_eq!(tokens.len(), 2);
    let starts: Vec<_> = tokens.iter().map(|t| t.start()).collect();
    assert!(starts.windows(2).all(|w| w[0] < w[1]));

    // No candidates: the reference is its own canonical form.
    let own = EntryReference::declaration(base_m(), "m");
    let tokens = index.tokens_for_resolved(&own, &Overrides);
    assert_eq!(tokens.len(), 1);
}
