//! Download of the tree description and its sprite sheets.

use std::collections::HashSet;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{PlannedAsset, SkillTreeDescription};
use crate::{
    error::Result,
    fetch::Fetcher,
    output::{write_atomic, DualWriter, OutputLayout},
    pool,
};

/// File names already fetched during this run.
#[derive(Debug, Default)]
pub struct DownloadedSet {
    names: Mutex<HashSet<String>>,
}

impl DownloadedSet {
    /// Record `name`, returning `false` when it was already claimed.
    pub fn claim(&self, name: &str) -> bool {
        self.names.lock().insert(name.to_string())
    }

    /// Claimed names in lexical order.
    pub fn into_sorted(self) -> Vec<String> {
        let mut names: Vec<_> = self.names.into_inner().into_iter().collect();
        names.sort();
        names
    }
}

/// Outcome of mirroring the tree description and its sprites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSummary {
    /// Number of sprite groups resolved.
    pub groups: usize,
    /// Unique sheet file names written under `tree/assets`.
    pub assets: Vec<String>,
}

/// Downloads the tree description for one version plus every sprite sheet it
/// references.
pub struct TreeSync<'a, F: Fetcher> {
    fetcher: &'a F,
    layout: &'a OutputLayout,
    writer: DualWriter,
    base_url: String,
    jobs: usize,
}

impl<'a, F: Fetcher> TreeSync<'a, F> {
    /// `base_url` is the version-specific export root, without trailing slash.
    pub fn new(
        fetcher: &'a F,
        layout: &'a OutputLayout,
        writer: DualWriter,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            layout,
            writer,
            base_url: base_url.into(),
            jobs: 1,
        }
    }

    /// Number of concurrent asset downloads.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// URL of the tree description document.
    pub fn document_url(&self) -> String {
        format!("{}/data.json", self.base_url)
    }

    /// URL of a sprite sheet.
    pub fn asset_url(&self, file_name: &str) -> String {
        format!("{}/assets/{file_name}", self.base_url)
    }

    /// Fetch and persist the description, then mirror one sheet per group.
    ///
    /// The description is written before it is parsed, so a malformed
    /// document is still kept for inspection.
    pub fn run(&self, groups: &[&str]) -> Result<TreeSummary> {
        let url = self.document_url();
        info!("Downloading {url}");
        let document = self.fetcher.get(&url)?;
        self.writer.write(&self.layout.tree_stem(), &document)?;

        let tree = SkillTreeDescription::from_slice(&document)?;
        let preferred = tree.preferred_resolution_key()?;
        let plan = tree.plan(groups)?;
        for asset in plan.iter().filter(|asset| asset.resolution != preferred) {
            warn!(
                "sprite group {} has no {preferred} sheet, using {}",
                asset.group, asset.resolution
            );
        }

        let downloaded = DownloadedSet::default();
        pool::map_bounded(self.jobs, &plan, |asset| self.fetch_asset(asset, &downloaded))?;

        Ok(TreeSummary {
            groups: plan.len(),
            assets: downloaded.into_sorted(),
        })
    }

    fn fetch_asset(&self, asset: &PlannedAsset, downloaded: &DownloadedSet) -> Result<()> {
        if !downloaded.claim(&asset.file_name) {
            debug!("{} already downloaded, skipping for {}", asset.file_name, asset.group);
            return Ok(());
        }

        info!("Downloading {}", asset.file_name);
        let bytes = self.fetcher.get(&self.asset_url(&asset.file_name))?;
        write_atomic(&self.layout.assets_dir().join(&asset.file_name), &bytes)
    }
}
