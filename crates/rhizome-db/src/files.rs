//! File metadata records.
//!
//! A [`FileRecord`] describes one payload in the store's data tree: who owns
//! it, which record produced it, and where its bytes live. The metadata is
//! serialized directly to `files/<id>.json`; the payload itself is written
//! and read through the database's `file_*` operations.

use chrono::{DateTime, Utc};
use rhizome_types::Id;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Id,
    /// Id of the record that owns the payload, typically a farm.
    pub owner: Id,
    /// Kind of the producing source, e.g. `"scan"` or an analysis short name.
    pub source_name: String,
    /// Id of the producing record.
    pub source_id: Id,
    /// Role of the file for its source, e.g. `"results"` or `"values"`.
    pub short_name: String,
    pub date_created: DateTime<Utc>,
    /// Payload location, relative to the store's data tree.
    pub path: String,
    pub mimetype: String,
}

impl FileRecord {
    pub(crate) fn new(
        owner: &Id,
        source_name: &str,
        source_id: &Id,
        short_name: &str,
        path: &str,
        mimetype: &str,
    ) -> Self {
        Self {
            id: Id::generate(),
            owner: owner.clone(),
            source_name: source_name.to_string(),
            source_id: source_id.clone(),
            short_name: short_name.to_string(),
            date_created: Utc::now(),
            path: path.to_string(),
            mimetype: mimetype.to_string(),
        }
    }

    /// Whether this record matches the given filter. `None` matches anything.
    pub(crate) fn matches(
        &self,
        source_name: Option<&str>,
        source_id: Option<&Id>,
        short_name: Option<&str>,
    ) -> bool {
        source_name.map_or(true, |v| self.source_name == v)
            && source_id.map_or(true, |v| &self.source_id == v)
            && short_name.map_or(true, |v| self.short_name == v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FileRecord {
        FileRecord::new(
            &Id::parse("farm01").unwrap(),
            "scan",
            &Id::parse("scan01").unwrap(),
            "images",
            "scan01/img000.jpg",
            "image/jpeg",
        )
    }

    #[test]
    fn serde_roundtrip() {
        let file = record();
        let text = serde_json::to_string(&file).unwrap();
        let parsed: FileRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn matches_is_a_wildcard_when_unfiltered() {
        let file = record();
        assert!(file.matches(None, None, None));
        assert!(file.matches(Some("scan"), Some(&file.source_id), Some("images")));
        assert!(!file.matches(Some("analysis"), None, None));
        assert!(!file.matches(None, None, Some("results")));
    }
}
