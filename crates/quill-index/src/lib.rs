//! Positional symbol index for decompiled source.
//!
//! A [`SourceIndex`] binds token ranges of one generated source unit to the
//! entities (classes, fields, methods, locals) they declare or reference.
//!
//! ```text
//! IndexBuilder::record_declaration / record_reference   (fed by an AST visitor)
//!        |
//!        v
//! IndexBuilder::finish -> SourceIndex
//!        |
//!        v
//! SourceIndex::resolve_references(resolver) -> SourceIndex   (canonical entries)
//!        |
//!        +--> token_at / reference_at / tokens_for / declaration_token
//!        |
//!        v
//! SourceIndex::remap_to(translation) -> SourceIndex          (after a rename)
//! ```
//!
//! Every transform produces a new index; a finished index is never mutated, so
//! it can be shared across threads behind an `Arc`.

mod builder;
mod error;
mod index;
mod options;
mod reference;
mod remap;
mod resolve;
mod token;

pub use crate::builder::{
    adjust_synthetic_outer_ref, is_anonymous_class_name, ConstructorParent, IndexBuilder,
    IndexedNode, Region,
};
pub use crate::error::{BadTokenReason, IndexError, RemapError};
pub use crate::index::{ReadableToken, SourceIndex};
pub use crate::options::{IndexOptions, OriginPolicy};
pub use crate::reference::{Entity, EntryReference};
pub use crate::remap::{EditTranslation, TokenTranslation};
pub use crate::resolve::{EntryResolver, ResolutionStrategy};
pub use crate::token::Token;

pub use quill_core::{LineCol, LineIndex, TextEdit, TextRange, TextSize};

/// Tracing target for index construction and transforms.
pub const LOG_TARGET: &str = "quill.index";
