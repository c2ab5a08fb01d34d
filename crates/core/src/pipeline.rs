//! Full export run: tables, then the skill tree.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::{
    catalog::{SPRITE_GROUPS, TABLE_CATALOG},
    config::AppConfig,
    decoder::TableDecoder,
    error::Result,
    fetch::Fetcher,
    manifest::ExportManifest,
    output::OutputLayout,
    tables::TableExporter,
    tree::TreeSync,
};

/// Inputs of one export run.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Game installation containing `Bundles2`.
    pub game_path: PathBuf,
    /// Published skill tree export version.
    pub tree_version: String,
    /// Game version used to namespace the output.
    pub game_version: String,
    /// Skip the table export.
    pub skip_tables: bool,
    /// Skip the tree download.
    pub skip_tree: bool,
}

impl ExportRequest {
    /// Request running both stages.
    pub fn new(
        game_path: impl Into<PathBuf>,
        tree_version: impl Into<String>,
        game_version: impl Into<String>,
    ) -> Self {
        Self {
            game_path: game_path.into(),
            tree_version: tree_version.into(),
            game_version: game_version.into(),
            skip_tables: false,
            skip_tree: false,
        }
    }
}

/// Wires configuration and collaborators into the two export stages.
pub struct Pipeline<'a, D: TableDecoder, F: Fetcher> {
    config: &'a AppConfig,
    decoder: &'a D,
    fetcher: &'a F,
    catalog: &'a [&'a str],
    sprite_groups: &'a [&'a str],
}

impl<'a, D: TableDecoder, F: Fetcher> Pipeline<'a, D, F> {
    /// Pipeline exporting the standard table catalog and sprite groups.
    pub fn new(config: &'a AppConfig, decoder: &'a D, fetcher: &'a F) -> Self {
        Self {
            config,
            decoder,
            fetcher,
            catalog: TABLE_CATALOG,
            sprite_groups: SPRITE_GROUPS,
        }
    }

    /// Replace the table catalog.
    pub fn with_catalog(mut self, catalog: &'a [&'a str]) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the sprite group list.
    pub fn with_sprite_groups(mut self, groups: &'a [&'a str]) -> Self {
        self.sprite_groups = groups;
        self
    }

    /// Run the requested stages and write the manifest.
    ///
    /// Stops at the first failure; files written before it stay on disk.
    pub fn run(&self, request: &ExportRequest) -> Result<ExportManifest> {
        let layout = OutputLayout::new(&self.config.output_root, &request.game_version);
        let writer = self.config.dual_writer();
        match ExportManifest::load(layout.manifest_path()) {
            Ok(Some(previous)) => info!(
                "replacing export of {} ({} tables, {} sprite sheets)",
                previous.game_version,
                previous.tables.len(),
                previous.assets.len()
            ),
            Ok(None) => {}
            Err(err) => warn!("ignoring unreadable manifest: {err}"),
        }

        let mut manifest = ExportManifest {
            game_version: request.game_version.clone(),
            ..ExportManifest::default()
        };

        if !request.skip_tables {
            manifest.tables = TableExporter::new(self.decoder, &layout, writer)
                .with_jobs(self.config.jobs)
                .run(&request.game_path, self.catalog)?;
            info!(
                "exported {} tables into {}",
                manifest.tables.len(),
                layout.raw_dir().display()
            );
        }

        if !request.skip_tree {
            let base_url = self.config.tree_base_url(&request.tree_version);
            let summary = TreeSync::new(self.fetcher, &layout, writer, base_url)
                .with_jobs(self.config.jobs)
                .run(self.sprite_groups)?;
            info!(
                "mirrored {} sprite sheets for {} groups into {}",
                summary.assets.len(),
                summary.groups,
                layout.assets_dir().display()
            );
            manifest.tree_version = Some(request.tree_version.clone());
            manifest.assets = summary.assets;
        }

        manifest.persist(layout.manifest_path())?;
        info!("export written to {}", layout.version_root().display());
        Ok(manifest)
    }
}
