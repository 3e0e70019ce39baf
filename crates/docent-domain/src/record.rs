//! Result rows produced by the executor

use crate::descriptor::Document;
use serde::Serialize;

/// One returned record: field name to value
pub type Record = Document;

/// Ordered, materialized rows from a single read
///
/// Produced once by the executor and consumed once by the synthesizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    /// Wrap materialized records
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no rows matched
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the rows in order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate over the rows in order
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Take ownership of the rows
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Compact JSON rendering of the first `max_rows` rows
    pub fn to_compact_json(&self, max_rows: usize) -> String {
        let shown = &self.records[..self.records.len().min(max_rows)];
        serde_json::to_string(shown).unwrap_or_else(|_| "[]".to_string())
    }
}

impl From<Vec<Record>> for ResultSet {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
