use std::fmt;

use quill_core::{EditError, TextRange, TextSize};
use thiserror::Error;

use crate::builder::Region;
use crate::token::Token;

/// Why a node's region could not be turned into a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BadTokenReason {
    /// The begin or end line is `0`.
    UnsetRegion,
    /// A line/column pair does not address a position inside the text.
    OutOfBounds,
    /// The region ends before it starts or splits a character.
    InvalidRange,
    /// The region starts at the text origin, which is reserved as "no position".
    OriginSentinel,
}

impl fmt::Display for BadTokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BadTokenReason::UnsetRegion => "region is unset",
            BadTokenReason::OutOfBounds => "region is outside the source text",
            BadTokenReason::InvalidRange => "region does not form a valid range",
            BadTokenReason::OriginSentinel => "region starts at the text origin",
        })
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{node_type} {name:?} has an invalid region {region}: {reason}")]
    BadToken {
        node_type: String,
        name: String,
        region: Region,
        reason: BadTokenReason,
    },
    #[error("source index is inconsistent: {0}")]
    Inconsistent(String),
}

/// A token translation that would corrupt the remapped index.
#[derive(Debug, Error)]
pub enum RemapError {
    #[error("no translation for token {token}")]
    Untranslatable { token: Token },
    #[error("token {token} translates to {range:?}, outside the new text of length {len:?}")]
    OutOfBounds {
        token: Token,
        range: TextRange,
        len: TextSize,
    },
    #[error("tokens {first} and {second} both translate to {target:?}")]
    Collision {
        first: Token,
        second: Token,
        target: TextRange,
    },
    #[error(transparent)]
    Edit(#[from] EditError),
}
