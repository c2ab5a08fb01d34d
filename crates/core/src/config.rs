//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `POBEXPORT_*` environment variables (`__` separates nested keys, e.g.
//! `POBEXPORT_DECODER__PROGRAM`). Command-line overrides are applied by the
//! caller on the loaded value.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{error::Result, output::DualWriter};

/// Directory name under the user config dir.
pub const CONFIG_DIR: &str = "pobexport";

/// Default base URL of the published skill tree export.
pub const DEFAULT_TREE_REPO_BASE: &str =
    "https://raw.githubusercontent.com/grindinggear/skilltree-export/{version}";

/// Settings for an export run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root under which `<game_version>/...` is written.
    pub output_root: PathBuf,
    /// Tree export base URL; `{version}` is replaced by the tree version.
    pub tree_repo_base: String,
    /// Worker count; `1` keeps everything sequential.
    pub jobs: usize,
    /// gzip level (0-9).
    pub gzip_level: u32,
    /// brotli quality (0-11).
    pub brotli_quality: u32,
    /// Per-request timeout; unset means requests never time out.
    pub http_timeout_secs: Option<u64>,
    /// User agent sent with every request.
    pub user_agent: String,
    /// External table decoder.
    pub decoder: DecoderConfig,
}

/// How to invoke the external bundle/table decoder.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Executable name or path.
    pub program: String,
    /// Arguments placed before the `open`/`parse` sub-command.
    pub args: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("data"),
            tree_repo_base: DEFAULT_TREE_REPO_BASE.to_string(),
            jobs: 1,
            gzip_level: 6,
            brotli_quality: 6,
            http_timeout_secs: None,
            user_agent: concat!("pobexport/", env!("CARGO_PKG_VERSION")).to_string(),
            decoder: DecoderConfig::default(),
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            program: "pob-dat-decoder".to_string(),
            args: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or from the default location when `None`.
    ///
    /// An explicitly given file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        match path {
            Some(path) => builder = builder.add_source(File::from(path).required(true)),
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix("POBEXPORT")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("decoder.args"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Base URL for a concrete tree version, without a trailing slash.
    pub fn tree_base_url(&self, tree_version: &str) -> String {
        self.tree_repo_base
            .replace("{version}", tree_version)
            .trim_end_matches('/')
            .to_string()
    }

    /// Request timeout, if any.
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    /// Writer configured with this config's codec levels.
    pub fn dual_writer(&self) -> DualWriter {
        DualWriter::new(self.gzip_level, self.brotli_quality)
    }
}

/// `<config dir>/pobexport/config.toml`, when a config dir is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join("config.toml"))
}
