use std::collections::HashMap;
use std::sync::Arc;

use quill_core::{apply_text_edits, LineIndex, OffsetMap, TextEdit, TextRange, TextSize};

use crate::error::RemapError;
use crate::index::{SourceIndex, TokenStore};
use crate::reference::Entity;
use crate::token::Token;
use crate::LOG_TARGET;

/// Maps the tokens of an old text onto a new text.
///
/// Implementations are produced by whatever rewrote the text (typically a
/// renamer) and must give every old token an image, or `None` when the token
/// no longer exists.
pub trait TokenTranslation {
    /// The new text.
    fn text(&self) -> &str;

    fn translate(&self, token: &Token) -> Option<TextRange>;
}

/// A [`TokenTranslation`] derived from a set of non-overlapping edits to the
/// old text.
#[derive(Clone, Debug)]
pub struct EditTranslation {
    text: String,
    offsets: OffsetMap,
}

impl EditTranslation {
    pub fn new(old_text: &str, edits: &[TextEdit]) -> Result<Self, RemapError> {
        let text = apply_text_edits(old_text, edits)?;
        let offsets = OffsetMap::new(old_text, edits)?;
        Ok(Self { text, offsets })
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl TokenTranslation for EditTranslation {
    fn text(&self) -> &str {
        &self.text
    }

    fn translate(&self, token: &Token) -> Option<TextRange> {
        self.offsets.map_range(token.range())
    }
}

impl<E: Entity> SourceIndex<E> {
    /// Re-express the index over the text produced by `translation`.
    ///
    /// The reference graph is carried over unchanged; only token positions and
    /// texts move. Fails rather than dropping or merging tokens.
    pub fn remap_to<T: TokenTranslation + ?Sized>(
        &self,
        translation: &T,
    ) -> Result<SourceIndex<E>, RemapError> {
        let text = translation.text();
        let len = TextSize::of(text);

        let mut images: HashMap<&Token, Token> = HashMap::with_capacity(self.store.len());
        let mut targets: HashMap<TextRange, &Token> = HashMap::with_capacity(self.store.len());
        let mut store = TokenStore::new();
        let mut moved = 0usize;

        for (token, reference) in self.store.entries() {
            let image = translate_token(translation, text, len, token)?;
            if let Some(first) = targets.insert(image.range(), token) {
                return Err(RemapError::Collision {
                    first: first.clone(),
                    second: token.clone(),
                    target: image.range(),
                });
            }
            if image.range() != token.range() {
                moved += 1;
            }
            store.insert(image.clone(), reference.clone());
            images.insert(token, image);
        }

        let mut declarations = HashMap::with_capacity(self.declarations.len());
        for (entity, token) in &self.declarations {
            let image = match images.get(token) {
                Some(image) => image.clone(),
                None => translate_token(translation, text, len, token)?,
            };
            declarations.insert(entity.clone(), image);
        }

        tracing::debug!(
            target: LOG_TARGET,
            tokens = store.len(),
            moved,
            old_len = u32::from(TextSize::of(&*self.source)),
            new_len = u32::from(len),
            "remapped source index"
        );

        let source: Arc<str> = Arc::from(text);
        Ok(SourceIndex {
            lines: LineIndex::new(&source),
            source,
            options: self.options,
            store,
            declarations,
        })
    }
}

fn translate_token<T: TokenTranslation + ?Sized>(
    translation: &T,
    text: &str,
    len: TextSize,
    token: &Token,
) -> Result<Token, RemapError> {
    let range = translation
        .translate(token)
        .ok_or_else(|| RemapError::Untranslatable {
            token: token.clone(),
        })?;
    if range.end() > len {
        return Err(RemapError::OutOfBounds {
            token: token.clone(),
            range,
            len,
        });
    }
    Token::from_source(text, range).ok_or_else(|| RemapError::OutOfBounds {
        token: token.clone(),
        range,
        len,
    })
}
