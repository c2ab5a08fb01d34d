//! Seam between the exporter and whatever decodes bundled tables.
//!
//! The exporter never looks inside a record beyond its [`PrimaryKey`]; the
//! field layout is entirely the decoder's business.

mod external;

use std::path::Path;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::Result;

pub use external::ExternalDecoder;

/// Records that can be put into canonical order.
pub trait PrimaryKey {
    /// The record's first field, used as its sort key.
    fn primary_key(&self) -> i64;
}

/// Opens raw table files from a game's bundles.
pub trait BundleLoader: Send + Sync {
    /// Read the raw bytes of `table_path` (e.g. `Data/Stats.dat64`).
    fn open(&self, table_path: &str) -> Result<Vec<u8>>;
}

/// An initialised table decoder.
pub trait TableDecoder: Send + Sync {
    /// Record type produced for every table.
    type Record: PrimaryKey + Serialize + Send;

    /// Create a loader for the bundles under `game_root`.
    fn bundle_loader(&self, game_root: &Path) -> Result<Box<dyn BundleLoader>>;

    /// Decode raw table bytes; `table_file_name` is e.g. `Stats.dat64`.
    fn parse(&self, raw: &[u8], table_file_name: &str) -> Result<Vec<Self::Record>>;
}

/// A decoded row kept as an ordered JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    key: i64,
    fields: Map<String, Value>,
}

impl TableRecord {
    /// Wrap a decoded object. Its first field must be an `i64`.
    pub fn from_fields(fields: Map<String, Value>) -> std::result::Result<Self, String> {
        let (name, value) = fields
            .iter()
            .next()
            .ok_or_else(|| "record has no fields".to_string())?;
        let key = value
            .as_i64()
            .ok_or_else(|| format!("first field '{name}' is not an integer key: {value}"))?;
        Ok(Self { key, fields })
    }
}

impl PrimaryKey for TableRecord {
    fn primary_key(&self) -> i64 {
        self.key
    }
}

impl Serialize for TableRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn key_comes_from_first_field() {
        let record = TableRecord::from_fields(object(json!({"Key": 7, "Id": "life", "Hash": 99})))
            .expect("valid record");
        assert_eq!(record.primary_key(), 7);
        assert_eq!(
            serde_json::to_string(&record).expect("serializable"),
            r#"{"Key":7,"Id":"life","Hash":99}"#
        );
    }

    #[test]
    fn rejects_records_without_integer_key() {
        assert!(TableRecord::from_fields(Map::new()).is_err());
        let err = TableRecord::from_fields(object(json!({"Id": "life", "Key": 1})))
            .expect_err("string key");
        assert!(err.contains("'Id'"));
        assert!(TableRecord::from_fields(object(json!({"Key": 1.5}))).is_err());
    }
}
