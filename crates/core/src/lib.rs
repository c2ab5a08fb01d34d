#![warn(clippy::all, missing_docs)]

//! Export pipeline for Path of Exile game data.
//!
//! Decodes a fixed catalog of bundled tables into key-sorted JSON and mirrors
//! the published passive skill tree description together with its sprite
//! sheets. Every JSON document is written twice, gzip and brotli compressed.

pub mod catalog;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod tables;
pub mod tree;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use decoder::{ExternalDecoder, PrimaryKey, TableDecoder, TableRecord};
pub use error::{ExportError, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use manifest::ExportManifest;
pub use pipeline::{ExportRequest, Pipeline};
