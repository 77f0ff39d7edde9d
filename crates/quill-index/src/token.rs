use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use quill_core::{TextRange, TextSize};
use smol_str::SmolStr;

/// A half-open `[start, end)` range of one source buffer plus the text it
/// covers.
///
/// Equality, hashing and ordering only look at the range: tokens order by
/// `start`, then by `end`, so several tokens may share a start offset and
/// still be distinct keys. The text is derived from the buffer and carried for
/// display; a probe token built with [`Token::probe`] has none.
#[derive(Clone)]
pub struct Token {
    range: TextRange,
    text: SmolStr,
}

impl Token {
    /// Slice `range` out of `source`.
    ///
    /// Returns `None` if the range runs past the end of `source` or does not
    /// fall on character boundaries.
    pub fn from_source(source: &str, range: TextRange) -> Option<Self> {
        let text = source.get(usize::from(range.start())..usize::from(range.end()))?;
        Some(Self {
            range,
            text: SmolStr::new(text),
        })
    }

    /// A token with no backing text, used as a lookup key.
    pub fn probe(start: TextSize, end: TextSize) -> Self {
        Self {
            range: TextRange::new(start, end),
            text: SmolStr::default(),
        }
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        self.range
    }

    #[inline]
    pub fn start(&self) -> TextSize {
        self.range.start()
    }

    #[inline]
    pub fn end(&self) -> TextSize {
        self.range.end()
    }

    #[inline]
    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `start <= offset < end`.
    #[inline]
    pub fn contains(&self, offset: TextSize) -> bool {
        self.range.contains(offset)
    }

    /// Shorten the token to at most `len` bytes, keeping its start.
    ///
    /// Returns `None` when the cut would split a character.
    pub fn truncated(&self, len: TextSize) -> Option<Self> {
        let len = len.min(self.len());
        let text = self.text.get(..usize::from(len))?;
        Some(Self {
            range: TextRange::at(self.start(), len),
            text: SmolStr::new(text),
        })
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.range.hash(state);
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start()
            .cmp(&other.start())
            .then_with(|| self.end().cmp(&other.end()))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token({}..{}, {:?})",
            u32::from(self.start()),
            u32::from(self.end()),
            self.text.as_str()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}) {:?}",
            u32::from(self.start()),
            u32::from(self.end()),
            self.text.as_str()
        )
    }
}
