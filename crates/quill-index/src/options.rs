use serde::{Deserialize, Serialize};

/// How a derived start offset of exactly `0` is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginPolicy {
    /// Offset `0` means "no position": decompilers report synthetic nodes there,
    /// so a token starting at the very first character is never indexed.
    #[default]
    Sentinel,
    /// Offset `0` is an ordinary position; only unset regions are rejected.
    Valid,
}

/// Index construction settings, loadable from the `[index]` table of
/// `quill.toml`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexOptions {
    /// Drop nodes whose region cannot be turned into a token (logging a
    /// warning) instead of failing the build.
    #[serde(default = "IndexOptions::default_ignore_bad_tokens")]
    pub ignore_bad_tokens: bool,

    #[serde(default)]
    pub origin: OriginPolicy,
}

impl IndexOptions {
    fn default_ignore_bad_tokens() -> bool {
        true
    }

    /// Options that turn every malformed region into an error.
    pub fn strict() -> Self {
        Self {
            ignore_bad_tokens: false,
            ..Self::default()
        }
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            ignore_bad_tokens: Self::default_ignore_bad_tokens(),
            origin: OriginPolicy::default(),
        }
    }
}
