//! In-memory feeds for fixtures and tests.

use std::collections::HashMap;

use super::error::FeedError;
use super::fingerprint::FeedFingerprint;
use super::records::FeedRecord;
use super::source::{RowSource, ScanStats, read_table};
use super::table::Table;

/// A feed whose tables are held as CSV text.
///
/// Behaves like a zipped feed: rows are parsed on every scan and absent
/// tables are reported as missing.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    tables: HashMap<Table, String>,
}

impl MemoryFeed {
    /// Create a feed with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table.
    pub fn with_table(mut self, table: Table, csv: impl Into<String>) -> Self {
        self.tables.insert(table, csv.into());
        self
    }

    /// Remove a table, if present.
    pub fn without_table(mut self, table: Table) -> Self {
        self.tables.remove(&table);
        self
    }
}

impl RowSource for MemoryFeed {
    fn has_table(&self, table: Table) -> Result<bool, FeedError> {
        Ok(self.tables.contains_key(&table))
    }

    fn scan<R, F>(&self, visit: F) -> Result<ScanStats, FeedError>
    where
        R: FeedRecord,
        F: FnMut(R),
    {
        let text = self
            .tables
            .get(&R::TABLE)
            .ok_or(FeedError::MissingTable(R::TABLE))?;
        read_table(text.as_bytes(), visit)
    }

    fn fingerprint(&self) -> Result<FeedFingerprint, FeedError> {
        Ok(FeedFingerprint::from_entries(self.tables.iter().map(
            |(table, text)| (table.file_name(), crc_of(text), text.len() as u64),
        )))
    }
}

/// Cheap content checksum; only needs to change when the text changes.
fn crc_of(text: &str) -> u32 {
    text.bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193))
}
