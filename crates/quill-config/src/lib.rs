//! `quill.toml` loading and process-wide logging setup.
//!
//! ```toml
//! [index]
//! ignore_bad_tokens = true
//! origin = "sentinel"
//!
//! [logging]
//! level = "info,quill.index=debug"
//! json = false
//! ```

mod logging;

use std::io;
use std::path::{Path, PathBuf};

use quill_index::IndexOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use logging::{global_log_buffer, init_tracing, LogBuffer, LogCapture, LoggingConfig};

/// Tracing target for configuration loading and logging setup.
pub const LOG_TARGET: &str = "quill.config";

/// Top-level `quill.toml`. Every table is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuillConfig {
    pub index: IndexOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The TOML was malformed or named a key Quill does not know.
    #[error("invalid quill.toml: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `message()` omits the rendered source excerpt.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl QuillConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::load_from_str(&text)?;
        tracing::debug!(
            target: LOG_TARGET,
            path = %path.display(),
            ignore_bad_tokens = config.index.ignore_bad_tokens,
            origin = ?config.index.origin,
            "loaded config"
        );
        Ok(config)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::from)
    }
}
