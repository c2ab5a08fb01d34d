//! Export of bundled game tables to compressed JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    catalog::{table_base_name, table_file_name, BUNDLE_INDEX_MARKER},
    decoder::{BundleLoader, PrimaryKey, TableDecoder},
    error::{ExportError, Result},
    output::{DualWriter, OutputLayout},
    pool,
};

/// Outcome of exporting one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Catalog path, e.g. `Data/Stats.dat64`.
    pub table: String,
    /// Output stem relative to the version root, e.g. `raw/Stats.json`.
    pub file: String,
    /// Number of exported records.
    pub records: usize,
}

/// Sort records by primary key, keeping decoder order among equal keys.
pub fn sort_by_primary_key<R: PrimaryKey>(records: &mut [R]) {
    records.sort_by_key(PrimaryKey::primary_key);
}

/// Decodes catalog tables and writes them under `raw/`.
pub struct TableExporter<'a, D: TableDecoder> {
    decoder: &'a D,
    layout: &'a OutputLayout,
    writer: DualWriter,
    jobs: usize,
}

impl<'a, D: TableDecoder> TableExporter<'a, D> {
    /// Create an exporter writing into `layout`.
    pub fn new(decoder: &'a D, layout: &'a OutputLayout, writer: DualWriter) -> Self {
        Self {
            decoder,
            layout,
            writer,
            jobs: 1,
        }
    }

    /// Number of tables processed concurrently.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Export every table in `catalog` from the game installed at `game_root`.
    ///
    /// Fails before touching any table when the bundle index is missing.
    pub fn run(&self, game_root: &Path, catalog: &[&str]) -> Result<Vec<TableSummary>> {
        let marker = bundle_index_path(game_root);
        if !marker.is_file() {
            return Err(ExportError::MissingBundleIndex { path: marker });
        }

        let loader = self.decoder.bundle_loader(game_root)?;
        pool::map_bounded(self.jobs, catalog, |table| {
            self.export_table(loader.as_ref(), table)
        })
    }

    fn export_table(&self, loader: &dyn BundleLoader, table: &str) -> Result<TableSummary> {
        info!("Extracting {table}");

        let raw = loader.open(table)?;
        let mut records = self.decoder.parse(&raw, table_file_name(table))?;
        sort_by_primary_key(&mut records);

        let json = serde_json::to_vec(&records).map_err(|source| ExportError::Serialize {
            table: table.to_string(),
            source,
        })?;

        let base_name = table_base_name(table);
        self.writer.write(&self.layout.table_stem(base_name), &json)?;

        Ok(TableSummary {
            table: table.to_string(),
            file: format!("raw/{base_name}.json"),
            records: records.len(),
        })
    }
}

/// Where the bundle index is expected inside a game installation.
pub fn bundle_index_path(game_root: &Path) -> PathBuf {
    game_root.join(BUNDLE_INDEX_MARKER)
}
