//! Text model primitives: sizes, ranges, and line/column conversions.

pub use text_size::{TextRange, TextSize};

/// A 1-based line/column pair.
///
/// Decompiler regions are reported in this form; `0` is never a valid line or
/// column and is used by producers as the "unset" sentinel.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Line table of one source text, used to convert between byte offsets and
/// 1-based line/column positions.
///
/// Line starts are `0` plus the offset just after every `\n`. A lone `\r` is an
/// ordinary character. Offsets and columns are UTF-8 byte based.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let after_newlines = text
            .match_indices('\n')
            .map(|(at, _)| TextSize::from((at + 1) as u32));
        Self {
            line_starts: std::iter::once(TextSize::from(0))
                .chain(after_newlines)
                .collect(),
            text_len: TextSize::of(text),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Offset of the first character of the 1-based `line`.
    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        let idx = line.checked_sub(1)?;
        self.line_starts.get(idx as usize).copied()
    }

    /// Offset of the `\n` terminating the 1-based `line`, or the text length for
    /// the last line.
    pub fn line_end(&self, line: u32) -> Option<TextSize> {
        let idx = line.checked_sub(1)? as usize;
        if idx >= self.line_starts.len() {
            return None;
        }
        Some(match self.line_starts.get(idx + 1) {
            Some(next) => *next - TextSize::from(1),
            None => self.text_len,
        })
    }

    /// 1-based line containing `offset`: the number of line starts `<= offset`.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        // `line_starts[0] == 0`, so the count is always at least one.
        self.line_starts.partition_point(|start| *start <= offset) as u32
    }

    /// 1-based column of `offset` within its line.
    pub fn column_of(&self, offset: TextSize) -> u32 {
        let line = self.line_of(offset);
        let start = self.line_starts[(line - 1) as usize];
        u32::from(offset - start) + 1
    }

    pub fn line_col(&self, offset: TextSize) -> LineCol {
        LineCol {
            line: self.line_of(offset),
            col: self.column_of(offset),
        }
    }

    /// Convert a 1-based line/column pair back to an offset.
    ///
    /// Returns `None` if the line does not exist, the column is `0`, or the
    /// column runs past the end of its line.
    pub fn offset_of(&self, line_col: LineCol) -> Option<TextSize> {
        let start = self.line_start(line_col.line)?;
        let end = self.line_end(line_col.line)?;
        let col = line_col.col.checked_sub(1)?;
        let offset = u32::from(start).checked_add(col).map(TextSize::from)?;
        if offset > end {
            return None;
        }
        Some(offset)
    }
}
