//! The row-source contract and the shared CSV table reader.

use std::io::{BufRead, BufReader, Read};

use csv::{ErrorKind, ReaderBuilder, Trim};
use tracing::trace;

use super::error::FeedError;
use super::fingerprint::FeedFingerprint;
use super::records::FeedRecord;
use super::table::Table;

/// UTF-8 byte-order mark some feed producers prepend to every table.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Counters from one pass over a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Rows handed to the visitor.
    pub rows: u64,
    /// Rows that could not be mapped onto the record type and were skipped.
    pub malformed: u64,
}

/// A static feed that can be scanned table by table.
///
/// Each scan is a single forward pass that hands one typed record at a time
/// to the visitor; scanning again reopens the table from the start. Tables
/// are never materialized by the source itself.
pub trait RowSource: Send + Sync {
    /// Whether the feed contains `table`.
    fn has_table(&self, table: Table) -> Result<bool, FeedError>;

    /// Stream every row of `R::TABLE` through `visit`.
    ///
    /// Fails with [`FeedError::MissingTable`] if the table is absent.
    fn scan<R, F>(&self, visit: F) -> Result<ScanStats, FeedError>
    where
        R: FeedRecord,
        F: FnMut(R);

    /// Identifies the feed's content, to detect a replaced feed.
    fn fingerprint(&self) -> Result<FeedFingerprint, FeedError>;
}

/// Read a header-first delimited table from `reader`.
///
/// Strips a leading byte-order mark, trims every cell, and skips rows that
/// cannot be deserialized into `R`. I/O failures abort the scan.
pub fn read_table<R, F, T>(reader: T, mut visit: F) -> Result<ScanStats, FeedError>
where
    R: FeedRecord,
    F: FnMut(R),
    T: Read,
{
    let mut reader = BufReader::new(reader);
    skip_bom(&mut reader)?;

    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut stats = ScanStats::default();
    for result in csv_reader.deserialize::<R>() {
        match result {
            Ok(record) => {
                stats.rows += 1;
                visit(record);
            }
            Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                stats.malformed += 1;
                trace!(table = %R::TABLE, error = %e, "skipping malformed row");
            }
        }
    }

    Ok(stats)
}

/// Consume a UTF-8 byte-order mark if the stream starts with one.
fn skip_bom<B: BufRead>(reader: &mut B) -> std::io::Result<()> {
    let buf = reader.fill_buf()?;
    if buf.starts_with(UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}
