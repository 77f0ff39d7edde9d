//! Text edit primitives and range translation across edits.

use crate::{TextRange, TextSize};

/// A single replacement of `range` by `replacement` in one text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::new(TextRange::new(offset, offset), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }

    fn replacement_len(&self) -> TextSize {
        TextSize::of(self.replacement.as_str())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EditError {
    RangeOutOfBounds {
        range: TextRange,
        text_len: TextSize,
    },
    InvalidUtf8Boundary {
        offset: TextSize,
    },
    OverlappingEdits {
        first: TextRange,
        second: TextRange,
    },
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::RangeOutOfBounds { range, text_len } => {
                write!(f, "edit {range:?} ends past the text end {text_len:?}")
            }
            EditError::InvalidUtf8Boundary { offset } => {
                write!(f, "edit boundary {offset:?} splits a character")
            }
            EditError::OverlappingEdits { first, second } => {
                write!(f, "edits {first:?} and {second:?} overlap")
            }
        }
    }
}

impl std::error::Error for EditError {}

/// Produce the text that results from applying `edits` to `text`.
///
/// Edits may be given in any order; they are validated against `text` and
/// spliced in ascending position order, so the result never depends on the
/// order of the input slice.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut edits = edits.to_vec();
    normalize_text_edits(text, &mut edits)?;

    let grown: usize = edits.iter().map(|edit| edit.replacement.len()).sum();
    let mut out = String::with_capacity(text.len() + grown);
    let mut copied = 0usize;
    for edit in &edits {
        let start = usize::from(edit.range.start());
        out.push_str(&text[copied..start]);
        out.push_str(&edit.replacement);
        copied = usize::from(edit.range.end());
    }
    out.push_str(&text[copied..]);
    Ok(out)
}

/// Put `edits` in position order after validating them against `text`, then
/// fuse every pair where one edit ends exactly where the next begins.
pub fn normalize_text_edits(text: &str, edits: &mut Vec<TextEdit>) -> Result<(), EditError> {
    sort_and_validate(text, edits)?;

    if edits.is_empty() {
        return Ok(());
    }
    let mut kept = 0usize;
    for next in 1..edits.len() {
        if edits[kept].range.end() == edits[next].range.start() {
            let tail = std::mem::take(&mut edits[next].replacement);
            let end = edits[next].range.end();
            let head = &mut edits[kept];
            head.range = head.range.cover_offset(end);
            head.replacement += &tail;
        } else {
            kept += 1;
            edits.swap(kept, next);
        }
    }
    edits.truncate(kept + 1);
    Ok(())
}

fn check_edit(text: &str, range: TextRange) -> Result<(), EditError> {
    let text_len = TextSize::of(text);
    if range.end() > text_len {
        return Err(EditError::RangeOutOfBounds { range, text_len });
    }
    match [range.start(), range.end()]
        .into_iter()
        .find(|offset| !text.is_char_boundary(usize::from(*offset)))
    {
        Some(offset) => Err(EditError::InvalidUtf8Boundary { offset }),
        None => Ok(()),
    }
}

/// Two inserts at one offset have no defined order, so they count as
/// overlapping just like intersecting ranges.
fn conflicts(left: TextRange, right: TextRange) -> bool {
    left.end() > right.start() || (left.is_empty() && right.is_empty() && left == right)
}

fn sort_and_validate(text: &str, edits: &mut [TextEdit]) -> Result<(), EditError> {
    edits.sort_by_key(|edit| (edit.range.start(), edit.range.end()));
    edits
        .iter()
        .try_for_each(|edit| check_edit(text, edit.range))?;

    match edits
        .windows(2)
        .find(|pair| conflicts(pair[0].range, pair[1].range))
    {
        Some(pair) => Err(EditError::OverlappingEdits {
            first: pair[0].range,
            second: pair[1].range,
        }),
        None => Ok(()),
    }
}

/// Translates ranges of an old text snapshot into the snapshot produced by
/// applying a set of non-overlapping edits.
///
/// For a range `[start, end)`:
/// - edits ending at or before `start` (including an insertion exactly at
///   `start`) shift it by their length delta;
/// - edits lying within `[start, end]` resize it, except an insertion exactly
///   at `end` of a non-empty range, which lands after it;
/// - an edit straddling either boundary makes the range untranslatable.
///
/// Edits are kept as given (sorted, never coalesced) so that an insertion next
/// to a range is not merged into a replacement of that range.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OffsetMap {
    edits: Vec<(TextRange, TextSize)>,
}

impl OffsetMap {
    pub fn new(text: &str, edits: &[TextEdit]) -> Result<Self, EditError> {
        let mut edits = edits.to_vec();
        sort_and_validate(text, &mut edits)?;
        Ok(Self {
            edits: edits
                .iter()
                .map(|edit| (edit.range, edit.replacement_len()))
                .collect(),
        })
    }

    pub fn is_identity(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn map_range(&self, range: TextRange) -> Option<TextRange> {
        let start = i64::from(u32::from(range.start()));
        let end = i64::from(u32::from(range.end()));
        let mut before = 0i64;
        let mut inside = 0i64;

        for (edit, new_len) in &self.edits {
            let edit_start = i64::from(u32::from(edit.start()));
            let edit_end = i64::from(u32::from(edit.end()));
            let delta = i64::from(u32::from(*new_len)) - (edit_end - edit_start);

            if edit_end <= start {
                before += delta;
            } else if edit_start >= end {
                // Sorted by start: nothing further can touch the range.
                break;
            } else if edit_start >= start && edit_end <= end {
                inside += delta;
            } else {
                return None;
            }
        }

        let new_start = u32::try_from(start + before).ok()?;
        let new_end = u32::try_from(end + before + inside).ok()?;
        if new_start > new_end {
            return None;
        }
        Some(TextRange::new(
            TextSize::from(new_start),
            TextSize::from(new_end),
        ))
    }
}
