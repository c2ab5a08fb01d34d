//! Table decoder that shells out to a separate decoding program.

use std::{
    ffi::OsStr,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
    thread,
};

use serde_json::{Map, Value};
use tracing::debug;

use super::{BundleLoader, TableDecoder, TableRecord};
use crate::{
    config::DecoderConfig,
    error::{ExportError, Result},
};

/// Decoder backed by an external program.
///
/// `<program> <args..> open <game_root> <table_path>` must print the raw table
/// bytes, and `<program> <args..> parse <table_file_name>` must read raw bytes
/// on stdin and print a JSON array of objects whose first field is the key.
#[derive(Debug, Clone)]
pub struct ExternalDecoder {
    command: Arc<DecoderCommand>,
}

#[derive(Debug)]
struct DecoderCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalDecoder {
    /// Initialise the decoder handle from configuration.
    pub fn init(config: &DecoderConfig) -> Result<Self> {
        let program = config.program.trim();
        if program.is_empty() {
            let reason = "decoder.program must not be empty".to_string();
            return Err(::config::ConfigError::Message(reason).into());
        }

        debug!("using table decoder {program}");
        Ok(Self {
            command: Arc::new(DecoderCommand {
                program: program.to_string(),
                args: config.args.clone(),
            }),
        })
    }
}

impl TableDecoder for ExternalDecoder {
    type Record = TableRecord;

    fn bundle_loader(&self, game_root: &Path) -> Result<Box<dyn BundleLoader>> {
        Ok(Box::new(ExternalBundle {
            command: Arc::clone(&self.command),
            game_root: game_root.to_path_buf(),
        }))
    }

    fn parse(&self, raw: &[u8], table_file_name: &str) -> Result<Vec<TableRecord>> {
        let stdout = self.command.run(
            table_file_name,
            &[OsStr::new("parse"), OsStr::new(table_file_name)],
            Some(raw),
        )?;

        let rows: Vec<Map<String, Value>> = serde_json::from_slice(&stdout).map_err(|err| {
            ExportError::decode(table_file_name, format!("invalid decoder output: {err}"))
        })?;

        rows.into_iter()
            .enumerate()
            .map(|(index, fields)| {
                TableRecord::from_fields(fields).map_err(|reason| {
                    ExportError::decode(table_file_name, format!("row {index}: {reason}"))
                })
            })
            .collect()
    }
}

struct ExternalBundle {
    command: Arc<DecoderCommand>,
    game_root: PathBuf,
}

impl BundleLoader for ExternalBundle {
    fn open(&self, table_path: &str) -> Result<Vec<u8>> {
        self.command.run(
            table_path,
            &[
                OsStr::new("open"),
                self.game_root.as_os_str(),
                OsStr::new(table_path),
            ],
            None,
        )
    }
}

impl DecoderCommand {
    fn run(&self, table: &str, extra: &[&OsStr], input: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(extra)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|err| {
            ExportError::decode(table, format!("failed to execute {}: {err}", self.program))
        })?;

        // stdin has to be fed while stdout/stderr are drained.
        let stdin = child.stdin.take();
        let (fed, output) = thread::scope(|scope| {
            let feeder = match (input, stdin) {
                (Some(bytes), Some(mut pipe)) => Some(scope.spawn(move || pipe.write_all(bytes))),
                _ => None,
            };
            let output = child.wait_with_output();
            let fed = feeder.map(|handle| handle.join());
            (fed, output)
        });

        let output = output.map_err(|err| {
            ExportError::decode(table, format!("failed to wait for {}: {err}", self.program))
        })?;

        if !output.status.success() {
            return Err(ExportError::decode(
                table,
                format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        match fed {
            Some(Ok(Err(err))) => {
                return Err(ExportError::decode(
                    table,
                    format!("failed to send table data to {}: {err}", self.program),
                ))
            }
            Some(Err(_)) => {
                return Err(ExportError::decode(table, "decoder input thread panicked"));
            }
            _ => {}
        }

        Ok(output.stdout)
    }
}
