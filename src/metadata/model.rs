use serde::Serialize;

use super::gps::GpsCoordinates;
use super::stats::FileStats;

/// One displayed field: a name and its formatted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    key: String,
    value: String,
}

impl MetadataEntry {
    /// Build an entry. The value is trimmed and carriage returns become `\n`.
    pub fn new(key: impl Into<String>, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().replace("\r\n", "\n").replace('\r', "\n");
        Self {
            key: key.into(),
            value: value.trim().to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Multi-line values carry nested or tabular content.
    pub fn is_multiline(&self) -> bool {
        self.value.contains('\n')
    }
}

/// A titled group of entries, sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataSection {
    title: String,
    entries: Vec<MetadataEntry>,
}

impl MetadataSection {
    /// Build a section; entries are sorted by key (byte order, case-sensitive).
    pub fn new(title: impl Into<String>, mut entries: Vec<MetadataEntry>) -> Self {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            title: title.into(),
            entries,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .binary_search_by(|e| e.key.as_str().cmp(key))
            .ok()
            .map(|i| self.entries[i].value.as_str())
    }
}

/// Everything one extraction produced for a file.
///
/// Extraction never fails outright: when the metadata cannot be read,
/// `sections` is empty and `error_message` says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataResult {
    pub file_stats: FileStats,
    pub sections: Vec<MetadataSection>,
    pub error_message: Option<String>,
    pub gps_coordinates: Option<GpsCoordinates>,
}

impl MetadataResult {
    pub fn section(&self, title: &str) -> Option<&MetadataSection> {
        self.sections.iter().find(|s| s.title == title)
    }
}
