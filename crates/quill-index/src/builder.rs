use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quill_core::{LineCol, LineIndex, TextRange, TextSize};
use smol_str::SmolStr;

use crate::error::{BadTokenReason, IndexError};
use crate::index::{SourceIndex, TokenStore};
use crate::options::{IndexOptions, OriginPolicy};
use crate::reference::{Entity, EntryReference};
use crate::token::Token;
use crate::LOG_TARGET;

/// Source position of a syntax node as reported by the decompiler.
///
/// Lines and columns are 1-based and the end column is exclusive. A line of
/// `0` means the producer never assigned a position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub begin: LineCol,
    pub end: LineCol,
}

impl Region {
    pub const fn new(begin_line: u32, begin_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            begin: LineCol::new(begin_line, begin_col),
            end: LineCol::new(end_line, end_col),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.begin.line == 0 || self.end.line == 0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.begin.line, self.begin.col, self.end.line, self.end.col
        )
    }
}

/// The constructor declaration an identifier belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConstructorParent<'a> {
    /// Simple name of the type declaring the constructor, when the
    /// constructor's parent is a type declaration.
    pub declaring_type: Option<&'a str>,
}

/// A syntax node handed to the builder by an AST visitor.
pub trait IndexedNode {
    /// Node kind, used in diagnostics only.
    fn node_type(&self) -> &str;

    fn region(&self) -> Region;

    /// The identifier text when the node is an identifier.
    fn identifier(&self) -> Option<&str> {
        None
    }

    /// Set when the node's parent is a constructor declaration.
    fn constructor_parent(&self) -> Option<ConstructorParent<'_>> {
        None
    }
}

/// Whether `name` ends in `$` followed by one or more ASCII digits, the shape
/// compilers give anonymous classes (`Outer$1`).
pub fn is_anonymous_class_name(name: &str) -> bool {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    digits > 0 && name[..name.len() - digits].ends_with('$')
}

/// Narrow the token of a synthetic outer-class constructor name.
///
/// Decompilers name the constructor of an inner class after its binary name
/// (`Outer$Inner`) while the source text only spells the simple type name.
/// When `node` is such an identifier, the token is cut to the length of the
/// declaring type's name. Anonymous class names are left alone, as is any node
/// without a known declaring type.
pub fn adjust_synthetic_outer_ref<N: IndexedNode + ?Sized>(node: &N, raw: Token) -> Token {
    let Some(name) = node.identifier() else {
        return raw;
    };
    if !name.contains('$') || is_anonymous_class_name(name) {
        return raw;
    }
    let Some(declaring_type) = node.constructor_parent().and_then(|p| p.declaring_type) else {
        return raw;
    };

    match raw.truncated(TextSize::of(declaring_type)) {
        Some(token) => token,
        None => raw,
    }
}

/// Accumulates declarations and references for one source unit.
///
/// The visitor that walks the syntax tree decides what is a declaration and
/// what is a reference; the builder only turns node regions into tokens and
/// files them.
pub struct IndexBuilder<E: Entity> {
    source: Arc<str>,
    lines: LineIndex,
    options: IndexOptions,
    store: TokenStore<E>,
    declarations: HashMap<E, Token>,
    dropped: usize,
}

impl<E: Entity> IndexBuilder<E> {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self::with_options(source, IndexOptions::default())
    }

    pub fn with_options(source: impl Into<Arc<str>>, options: IndexOptions) -> Self {
        let source = source.into();
        let lines = LineIndex::new(&source);
        Self {
            source,
            lines,
            options,
            store: TokenStore::new(),
            declarations: HashMap::new(),
            dropped: 0,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    /// Number of nodes skipped because their region was unusable.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Derive the token for `node` without recording it.
    ///
    /// A bad region yields `Ok(None)` (and a warning) when bad tokens are
    /// ignored and an error otherwise.
    pub fn token_for<N: IndexedNode + ?Sized>(
        &mut self,
        node: &N,
    ) -> Result<Option<Token>, IndexError> {
        match self.derive(node) {
            Ok(token) => Ok(Some(adjust_synthetic_outer_ref(node, token))),
            Err(reason) => {
                let region = node.region();
                let name = node.identifier().unwrap_or_default();
                if !self.options.ignore_bad_tokens {
                    return Err(IndexError::BadToken {
                        node_type: node.node_type().to_string(),
                        name: name.to_string(),
                        region,
                        reason,
                    });
                }
                tracing::warn!(
                    target: LOG_TARGET,
                    node_type = node.node_type(),
                    name,
                    region = %region,
                    %reason,
                    "dropping node with invalid region"
                );
                self.dropped += 1;
                Ok(None)
            }
        }
    }

    fn derive<N: IndexedNode + ?Sized>(&self, node: &N) -> Result<Token, BadTokenReason> {
        let region = node.region();
        if region.is_unset() {
            return Err(BadTokenReason::UnsetRegion);
        }

        let start = self
            .lines
            .offset_of(region.begin)
            .ok_or(BadTokenReason::OutOfBounds)?;
        let end = self
            .lines
            .offset_of(region.end)
            .ok_or(BadTokenReason::OutOfBounds)?;
        if start > end {
            return Err(BadTokenReason::InvalidRange);
        }
        if self.options.origin == OriginPolicy::Sentinel && start == TextSize::from(0) {
            return Err(BadTokenReason::OriginSentinel);
        }

        Token::from_source(&self.source, TextRange::new(start, end))
            .ok_or(BadTokenReason::InvalidRange)
    }

    /// Record `node` as the declaration site of `entity`.
    ///
    /// Returns the recorded token, or `None` if the node was dropped.
    pub fn record_declaration<N: IndexedNode + ?Sized>(
        &mut self,
        node: &N,
        entity: E,
    ) -> Result<Option<Token>, IndexError> {
        let Some(token) = self.token_for(node)? else {
            return Ok(None);
        };

        let reference = EntryReference::declaration(entity.clone(), SmolStr::new(token.text()));
        tracing::trace!(target: LOG_TARGET, token = %token, ?entity, "declaration");
        self.store.insert(token.clone(), reference);
        self.declarations.insert(entity, token.clone());
        Ok(Some(token))
    }

    /// Record `node` as a use of `entity` inside `context`.
    pub fn record_reference<N: IndexedNode + ?Sized>(
        &mut self,
        node: &N,
        entity: E,
        context: E,
    ) -> Result<Option<Token>, IndexError> {
        let Some(token) = self.token_for(node)? else {
            return Ok(None);
        };

        tracing::trace!(target: LOG_TARGET, token = %token, ?entity, ?context, "reference");
        let reference = EntryReference::new(entity, context, SmolStr::new(token.text()));
        self.store.insert(token.clone(), reference);
        Ok(Some(token))
    }

    pub fn finish(self) -> SourceIndex<E> {
        if self.dropped > 0 {
            tracing::debug!(
                target: LOG_TARGET,
                dropped = self.dropped,
                tokens = self.store.len(),
                "finished index with dropped nodes"
            );
        }
        SourceIndex {
            source: self.source,
            lines: self.lines,
            options: self.options,
            store: self.store,
            declarations: self.declarations,
        }
    }
}
