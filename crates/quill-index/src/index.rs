use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use quill_core::{LineIndex, TextSize};

use crate::error::IndexError;
use crate::options::IndexOptions;
use crate::reference::{Entity, EntryReference};
use crate::token::Token;

/// Forward and reverse facets of the token/reference mapping.
///
/// Every mutation goes through this type so that `reverse[r]` is exactly the
/// set of forward keys whose value is `r`.
#[derive(Clone, Debug)]
pub(crate) struct TokenStore<E: Entity> {
    forward: BTreeMap<Token, EntryReference<E>>,
    reverse: HashMap<EntryReference<E>, BTreeSet<Token>>,
}

impl<E: Entity> TokenStore<E> {
    pub(crate) fn new() -> Self {
        Self {
            forward: BTreeMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// File `token` under `reference`, detaching it from whatever reference it
    /// was filed under before.
    pub(crate) fn insert(&mut self, token: Token, reference: EntryReference<E>) {
        // `BTreeMap::insert` keeps the old key, so remove first to store the
        // new token text.
        if let Some((old_token, old_reference)) = self.forward.remove_entry(&token) {
            self.detach(&old_reference, &old_token);
        }
        self.reverse
            .entry(reference.clone())
            .or_default()
            .insert(token.clone());
        self.forward.insert(token, reference);
    }

    fn detach(&mut self, reference: &EntryReference<E>, token: &Token) {
        if let Some(tokens) = self.reverse.get_mut(reference) {
            tokens.remove(token);
            if tokens.is_empty() {
                self.reverse.remove(reference);
            }
        }
    }

    /// Move every token of each `from` key to its `to` key.
    ///
    /// All sources are detached before anything is re-filed, so a plan that
    /// chains `A -> B` and `B -> C` moves only the tokens originally under `A`
    /// to `B`.
    pub(crate) fn rekey(&mut self, plan: Vec<(EntryReference<E>, EntryReference<E>)>) {
        let mut detached = Vec::with_capacity(plan.len());
        for (from, to) in plan {
            if let Some(tokens) = self.reverse.remove(&from) {
                detached.push((to, tokens));
            }
        }

        for (to, tokens) in detached {
            for token in &tokens {
                if let Some(slot) = self.forward.get_mut(token) {
                    *slot = to.clone();
                }
            }
            self.reverse.entry(to).or_default().extend(tokens);
        }
    }

    pub(crate) fn get(&self, token: &Token) -> Option<&EntryReference<E>> {
        self.forward.get(token)
    }

    pub(crate) fn contains_token(&self, token: &Token) -> bool {
        self.forward.contains_key(token)
    }

    pub(crate) fn tokens(&self, reference: &EntryReference<E>) -> Option<&BTreeSet<Token>> {
        self.reverse.get(reference)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Token, &EntryReference<E>)> + '_ {
        self.forward.iter()
    }

    pub(crate) fn references(&self) -> impl Iterator<Item = &EntryReference<E>> + '_ {
        self.reverse.keys()
    }

    pub(crate) fn len(&self) -> usize {
        self.forward.len()
    }

    /// Greatest token whose start is `<= offset`, preferring the longest one
    /// among tokens sharing that start.
    pub(crate) fn floor(&self, offset: TextSize) -> Option<&Token> {
        let probe = Token::probe(offset, TextSize::from(u32::MAX));
        self.forward.range(..=probe).next_back().map(|(token, _)| token)
    }

    /// Compare the maintained reverse facet with one rebuilt from the forward
    /// facet.
    pub(crate) fn check(&self) -> Result<(), IndexError> {
        let mut rebuilt: HashMap<&EntryReference<E>, BTreeSet<&Token>> = HashMap::new();
        for (token, reference) in &self.forward {
            rebuilt.entry(reference).or_default().insert(token);
        }

        if rebuilt.len() != self.reverse.len() {
            return Err(IndexError::Inconsistent(format!(
                "forward facet groups into {} references, reverse facet has {}",
                rebuilt.len(),
                self.reverse.len()
            )));
        }

        for (reference, tokens) in &self.reverse {
            let expected = rebuilt.get(reference);
            let matches = expected.is_some_and(|expected| {
                expected.len() == tokens.len() && tokens.iter().all(|t| expected.contains(t))
            });
            if !matches {
                return Err(IndexError::Inconsistent(format!(
                    "reverse facet for {reference:?} does not match the forward facet"
                )));
            }
        }

        Ok(())
    }
}

/// 1-based line and column span of a single-line token, for editor display.
///
/// `end_column` is exclusive. For a token spanning lines it is measured from
/// the start of the line the token starts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReadableToken {
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

/// Positional index of one source unit.
///
/// Built by [`crate::IndexBuilder`], then frozen: queries borrow, transforms
/// ([`SourceIndex::resolve_references`], [`SourceIndex::remap_to`]) return a
/// new index.
#[derive(Clone, Debug)]
pub struct SourceIndex<E: Entity> {
    pub(crate) source: Arc<str>,
    pub(crate) lines: LineIndex,
    pub(crate) options: IndexOptions,
    pub(crate) store: TokenStore<E>,
    pub(crate) declarations: HashMap<E, Token>,
}

impl<E: Entity> SourceIndex<E> {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    /// Number of indexed tokens.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// The indexed token covering `offset`, if any.
    ///
    /// Offsets between tokens (or past the last one) return `None`.
    pub fn token_at(&self, offset: TextSize) -> Option<&Token> {
        self.store.floor(offset).filter(|token| token.contains(offset))
    }

    pub fn reference_at(&self, token: &Token) -> Option<&EntryReference<E>> {
        self.store.get(token)
    }

    /// Every token filed under `reference`, in ascending order. Unknown
    /// references have no tokens.
    pub fn tokens_for(&self, reference: &EntryReference<E>) -> &BTreeSet<Token> {
        static EMPTY: BTreeSet<Token> = BTreeSet::new();
        self.store.tokens(reference).unwrap_or(&EMPTY)
    }

    /// Distinct references present in the index, in no particular order.
    pub fn references(&self) -> impl Iterator<Item = &EntryReference<E>> + '_ {
        self.store.references()
    }

    /// All indexed tokens in ascending order.
    pub fn reference_tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.store.entries().map(|(token, _)| token)
    }

    pub fn declaration_tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.declarations.values()
    }

    pub fn declarations(&self) -> impl Iterator<Item = &E> + '_ {
        self.declarations.keys()
    }

    pub fn declaration_token(&self, entity: &E) -> Option<&Token> {
        self.declarations.get(entity)
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        self.lines.line_of(offset)
    }

    /// 1-based column of `offset` within its line.
    pub fn column_of(&self, offset: TextSize) -> u32 {
        self.lines.column_of(offset)
    }

    pub fn readable_token(&self, token: &Token) -> ReadableToken {
        let start = self.lines.line_col(token.start());
        ReadableToken {
            line: start.line,
            start_column: start.col,
            end_column: start.col + u32::from(token.len()),
        }
    }

    /// Verify that the reverse facet mirrors the forward facet and that every
    /// declaration token is indexed.
    pub fn check_consistency(&self) -> Result<(), IndexError> {
        self.store.check()?;

        for (entity, token) in &self.declarations {
            if !self.store.contains_token(token) {
                return Err(IndexError::Inconsistent(format!(
                    "declaration token {token} of {entity:?} is not indexed"
                )));
            }
        }

        Ok(())
    }
}
