//! Stand-ins for the decoder and the network used across unit tests.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use walkdir::WalkDir;

use crate::{
    catalog::table_file_name,
    decoder::{BundleLoader, PrimaryKey, TableDecoder},
    error::{ExportError, Result},
    fetch::Fetcher,
    tables::bundle_index_path,
};

/// Base URL the recording fetcher serves from.
pub(crate) const BASE: &str = "https://example.invalid/skilltree-export/3.22.0";

/// A record shaped like a generated table row.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Row {
    #[serde(rename = "Key")]
    pub key: i64,
    #[serde(rename = "Id")]
    pub id: String,
}

impl PrimaryKey for Row {
    fn primary_key(&self) -> i64 {
        self.key
    }
}

/// Decoder serving canned rows per table file name.
#[derive(Default)]
pub(crate) struct StubDecoder {
    pub tables: HashMap<String, Vec<Row>>,
    pub failing: Option<String>,
}

impl StubDecoder {
    pub(crate) fn with_table(mut self, file_name: &str, keys: &[i64]) -> Self {
        let rows = keys
            .iter()
            .enumerate()
            .map(|(index, key)| Row {
                key: *key,
                id: format!("{file_name}#{index}"),
            })
            .collect();
        self.tables.insert(file_name.to_string(), rows);
        self
    }

    pub(crate) fn failing_on(mut self, file_name: &str) -> Self {
        self.failing = Some(file_name.to_string());
        self
    }
}

struct StubLoader;

impl BundleLoader for StubLoader {
    fn open(&self, table_path: &str) -> Result<Vec<u8>> {
        Ok(table_file_name(table_path).as_bytes().to_vec())
    }
}

impl TableDecoder for StubDecoder {
    type Record = Row;

    fn bundle_loader(&self, _game_root: &Path) -> Result<Box<dyn BundleLoader>> {
        Ok(Box::new(StubLoader))
    }

    fn parse(&self, raw: &[u8], table_file_name: &str) -> Result<Vec<Row>> {
        assert_eq!(raw, table_file_name.as_bytes());
        if self.failing.as_deref() == Some(table_file_name) {
            return Err(ExportError::decode(table_file_name, "corrupt rows"));
        }
        Ok(self.tables.get(table_file_name).cloned().unwrap_or_default())
    }
}

/// Serves canned bodies and records every requested URL.
#[derive(Default)]
pub(crate) struct RecordingFetcher {
    pub bodies: HashMap<String, Vec<u8>>,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    /// Serve `body` at `<BASE>/<path>`.
    pub(crate) fn serve(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(format!("{BASE}/{path}"), body.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Fetcher for RecordingFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().push(url.to_string());
        self.bodies.get(url).cloned().ok_or_else(|| {
            ExportError::io(url, io::Error::new(io::ErrorKind::NotFound, "no canned response"))
        })
    }
}

/// Create a fake game installation with a bundle index under `dir`.
pub(crate) fn game_root(dir: &Path) -> io::Result<PathBuf> {
    let root = dir.join("game");
    fs::create_dir_all(root.join("Bundles2"))?;
    fs::write(bundle_index_path(&root), b"index")?;
    Ok(root)
}

/// A small tree description where `frame` and `jewel` share one sheet.
pub(crate) fn tree_document() -> Vec<u8> {
    json!({
        "tree": "Default",
        "imageZoomLevels": [0.1246, 0.2109, 0.2972, 0.3835],
        "sprites": {
            "background": {
                "0.1246": {"filename": "https://cdn.local/passive/background-0.png?8d1a"},
                "0.3835": {"filename": "https://cdn.local/passive/background-3.png?8d1a"}
            },
            "frame": {
                "0.3835": {"filename": "https://cdn.local/passive/ascendancy-frame.png?aa"}
            },
            "jewel": {
                "1": {"filename": "https://cdn.local/passive/ascendancy-frame.png?bb"}
            }
        }
    })
    .to_string()
    .into_bytes()
}

/// Sprite groups published by [`tree_document`].
pub(crate) const TREE_GROUPS: &[&str] = &["background", "frame", "jewel"];

/// Fetcher serving [`tree_document`] and its sheets.
pub(crate) fn tree_fetcher() -> RecordingFetcher {
    RecordingFetcher::default()
        .serve("data.json", tree_document())
        .serve("assets/background-3.png", b"bg".to_vec())
        .serve("assets/ascendancy-frame.png", b"frame".to_vec())
}

/// Regular files below `dir`, relative and sorted, with their contents.
pub(crate) fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path()).to_path_buf();
            let contents = fs::read(entry.path()).unwrap_or_default();
            (relative, contents)
        })
        .collect();
    files.sort();
    files
}
