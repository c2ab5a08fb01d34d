//! On-disk layout and the dual-compression writer.

use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use brotli::CompressorWriter;
use flate2::{write::GzEncoder, Compression};
use tempfile::NamedTempFile;

use crate::error::{ExportError, Result};

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_WINDOW_BITS: u32 = 22;

/// Compression codecs every JSON document is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// DEFLATE in a gzip container.
    Gzip,
    /// Brotli stream.
    Brotli,
}

impl Codec {
    /// All codecs, in the order files are written.
    pub const ALL: [Codec; 2] = [Codec::Gzip, Codec::Brotli];

    /// File extension appended to the output stem.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Brotli => "br",
        }
    }
}

/// Directory structure of one game version's export.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    version_root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `<output_root>/<game_version>`.
    pub fn new(output_root: impl AsRef<Path>, game_version: &str) -> Self {
        Self {
            version_root: output_root.as_ref().join(game_version),
        }
    }

    /// `<output_root>/<game_version>`.
    pub fn version_root(&self) -> &Path {
        &self.version_root
    }

    /// Directory holding the exported tables.
    pub fn raw_dir(&self) -> PathBuf {
        self.version_root.join("raw")
    }

    /// Directory holding the tree description.
    pub fn tree_dir(&self) -> PathBuf {
        self.version_root.join("tree")
    }

    /// Directory holding downloaded sprite sheets.
    pub fn assets_dir(&self) -> PathBuf {
        self.tree_dir().join("assets")
    }

    /// Output stem for a table, e.g. `raw/Stats.json`.
    pub fn table_stem(&self, base_name: &str) -> PathBuf {
        self.raw_dir().join(format!("{base_name}.json"))
    }

    /// Output stem for the tree description.
    pub fn tree_stem(&self) -> PathBuf {
        self.tree_dir().join("data.json")
    }

    /// Location of the export manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.version_root.join("manifest.json")
    }
}

/// Writes one payload under every [`Codec`].
#[derive(Debug, Clone, Copy)]
pub struct DualWriter {
    gzip_level: u32,
    brotli_quality: u32,
}

impl Default for DualWriter {
    fn default() -> Self {
        Self::new(6, 6)
    }
}

impl DualWriter {
    /// Create a writer with explicit codec levels.
    ///
    /// Levels above the codec maximum (9 for gzip, 11 for brotli) are clamped.
    pub fn new(gzip_level: u32, brotli_quality: u32) -> Self {
        Self {
            gzip_level: gzip_level.min(9),
            brotli_quality: brotli_quality.min(11),
        }
    }

    /// Path a codec's output lands at for the given stem.
    pub fn path_for(stem: &Path, codec: Codec) -> PathBuf {
        let mut name = OsString::from(stem.as_os_str());
        name.push(".");
        name.push(codec.extension());
        PathBuf::from(name)
    }

    /// Compress `payload` with a single codec.
    pub fn compress(&self, codec: Codec, payload: &[u8]) -> std::io::Result<Vec<u8>> {
        match codec {
            Codec::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::new(self.gzip_level));
                encoder.write_all(payload)?;
                encoder.finish()
            }
            Codec::Brotli => {
                let mut encoder = CompressorWriter::new(
                    Vec::new(),
                    BROTLI_BUFFER_SIZE,
                    self.brotli_quality,
                    BROTLI_WINDOW_BITS,
                );
                encoder.write_all(payload)?;
                Ok(encoder.into_inner())
            }
        }
    }

    /// Write `<stem>.gz` and `<stem>.br`, returning the written paths.
    pub fn write(&self, stem: &Path, payload: &[u8]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(Codec::ALL.len());
        for codec in Codec::ALL {
            let path = Self::path_for(stem, codec);
            let compressed = self
                .compress(codec, payload)
                .map_err(|err| ExportError::io(&path, err))?;
            write_atomic(&path, &compressed)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Replace `path` with `bytes`, creating parent directories as needed.
///
/// The data is staged in a temporary file next to the target and renamed into
/// place, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| ExportError::io(parent, err))?;

    let mut staged = NamedTempFile::new_in(parent).map_err(|err| ExportError::io(parent, err))?;
    staged
        .write_all(bytes)
        .map_err(|err| ExportError::io(staged.path(), err))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|err| ExportError::io(path, err))?;
    }

    staged
        .persist(path)
        .map_err(|err| ExportError::io(path, err.error))?;
    Ok(())
}
