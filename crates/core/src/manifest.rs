//! Export manifest stored alongside the exported data.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ExportError, Result},
    output::write_atomic,
    tables::TableSummary,
};

/// Summary of everything a run exported for one game version.
///
/// Carries no timestamps so that identical inputs produce an identical file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExportManifest {
    /// Game version the export was made for.
    pub game_version: String,
    /// Tree version the sprites were taken from, when the tree was exported.
    pub tree_version: Option<String>,
    /// Exported tables in catalog order.
    #[serde(default)]
    pub tables: Vec<TableSummary>,
    /// Sprite sheet file names under `tree/assets`.
    #[serde(default)]
    pub assets: Vec<String>,
}

impl ExportManifest {
    /// Load a manifest from the given path, returning `None` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read(path).map_err(|err| ExportError::io(path, err))?;
        let manifest = serde_json::from_slice(&contents).map_err(|err| {
            ExportError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })?;
        Ok(Some(manifest))
    }

    /// Persist the manifest, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut serialized =
            serde_json::to_vec_pretty(self).map_err(|source| ExportError::Serialize {
                table: "manifest".to_string(),
                source,
            })?;
        serialized.push(b'\n');
        write_atomic(path, &serialized)
    }
}
