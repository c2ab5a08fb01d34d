//! Error type shared by every export stage.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Everything that can abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The game directory has no bundle index, so nothing can be decoded.
    #[error("bundle index not found at {}", path.display())]
    MissingBundleIndex {
        /// Expected location of the index marker.
        path: PathBuf,
    },

    /// The decoder could not open or parse a table.
    #[error("failed to decode {table}: {message}")]
    Decode {
        /// Catalog path of the failing table.
        table: String,
        /// Decoder-provided reason.
        message: String,
    },

    /// Decoded records could not be turned into JSON.
    #[error("failed to serialize {table}")]
    Serialize {
        /// Catalog path of the failing table.
        table: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A request failed or returned a non-success status.
    #[error("request to {url} failed")]
    Http {
        /// URL that was requested.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    /// The tree description is not valid JSON of the expected shape.
    #[error("failed to parse skill tree description")]
    TreeParse(#[source] serde_json::Error),

    /// The tree description lists no zoom levels.
    #[error("skill tree description has no image zoom levels")]
    EmptyZoomLevels,

    /// No asset reference could be chosen for a sprite group.
    #[error("no usable asset for sprite group {group}")]
    UnresolvedSprite {
        /// Name of the sprite group.
        group: String,
    },

    /// An asset reference does not end in a usable file name.
    #[error("cannot derive an asset file name from '{raw}'")]
    InvalidAssetName {
        /// The filename field as published in the tree description.
        raw: String,
    },

    /// Filesystem failure while reading or writing `path`.
    #[error("i/o error at {}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded.
    #[error("invalid configuration")]
    Config(#[from] ::config::ConfigError),

    /// The worker pool could not be started.
    #[error("failed to start worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            table: table.into(),
            message: message.into(),
        }
    }
}
