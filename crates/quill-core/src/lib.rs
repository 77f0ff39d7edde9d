//! Core shared text types for Quill.
//!
//! This crate is intentionally small: it knows about offsets, lines and edits,
//! never about entities or indices.

mod edit;
mod text;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, OffsetMap, TextEdit};
pub use text::{LineCol, LineIndex, TextRange, TextSize};
