//! Zipped GTFS feeds read straight from the archive.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use super::error::FeedError;
use super::fingerprint::FeedFingerprint;
use super::records::FeedRecord;
use super::source::{RowSource, ScanStats, read_table};
use super::table::Table;

/// A GTFS feed stored as a zip archive on disk.
///
/// Tables are decompressed and parsed as they are scanned, never
/// extracted. Each scan opens its own handle on the archive, so one
/// `ZipFeed` can serve scans from several threads.
#[derive(Debug, Clone)]
pub struct ZipFeed {
    path: PathBuf,
}

impl ZipFeed {
    /// Open a feed, checking that the archive is readable and that all
    /// required tables are present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FeedError> {
        let feed = Self { path: path.into() };
        let archive = feed.archive()?;

        for table in Table::ALL.iter().filter(|t| !t.is_optional()) {
            if !has_entry(&archive, table) {
                return Err(FeedError::MissingTable(*table));
            }
        }

        Ok(feed)
    }

    /// Path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive(&self) -> Result<ZipArchive<BufReader<File>>, FeedError> {
        let file = File::open(&self.path).map_err(|source| FeedError::Open {
            path: self.path.clone(),
            source,
        })?;
        Ok(ZipArchive::new(BufReader::new(file))?)
    }
}

fn has_entry(archive: &ZipArchive<BufReader<File>>, table: &Table) -> bool {
    archive.file_names().any(|name| name == table.file_name())
}

impl RowSource for ZipFeed {
    fn has_table(&self, table: Table) -> Result<bool, FeedError> {
        Ok(has_entry(&self.archive()?, &table))
    }

    fn scan<R, F>(&self, visit: F) -> Result<ScanStats, FeedError>
    where
        R: FeedRecord,
        F: FnMut(R),
    {
        let mut archive = self.archive()?;
        let entry = match archive.by_name(R::TABLE.file_name()) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Err(FeedError::MissingTable(R::TABLE)),
            Err(e) => return Err(e.into()),
        };
        read_table(entry, visit)
    }

    fn fingerprint(&self) -> Result<FeedFingerprint, FeedError> {
        let mut archive = self.archive()?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            entries.push((entry.name().to_string(), entry.crc32(), entry.size()));
        }
        Ok(FeedFingerprint::from_entries(
            entries.iter().map(|(name, crc, size)| (name.as_str(), *crc, *size)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::records::{StopRecord, TripRecord};
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    fn minimal_tables() -> Vec<(&'static str, &'static [u8])> {
        vec![
            ("stops.txt", b"\xEF\xBB\xBFstop_id,stop_name,stop_lat,stop_lon\nS1,Mannheim,49.4,8.4\n" as &[u8]),
            ("trips.txt", b"trip_id,route_id,service_id\nT1,R1,WK\n" as &[u8]),
            ("routes.txt", b"route_id,route_short_name\nR1,RE 1\n" as &[u8]),
            ("stop_times.txt", b"trip_id,stop_id,departure_time,stop_sequence\nT1,S1,08:00:00,1\n" as &[u8]),
        ]
    }

    #[test]
    fn scans_tables_from_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        write_zip(&path, &minimal_tables());

        let feed = ZipFeed::open(&path).unwrap();
        let mut names = Vec::new();
        let stats = feed
            .scan(|r: StopRecord| names.push(r.stop_name.unwrap_or_default()))
            .unwrap();
        assert_eq!(stats.rows, 1);
        assert_eq!(names, vec!["Mannheim"]);

        // Scans are repeatable
        let mut trips = 0;
        feed.scan(|_: TripRecord| trips += 1).unwrap();
        feed.scan(|_: TripRecord| trips += 1).unwrap();
        assert_eq!(trips, 2);
    }

    #[test]
    fn optional_tables_are_reported_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        write_zip(&path, &minimal_tables());

        let feed = ZipFeed::open(&path).unwrap();
        assert!(feed.has_table(Table::Stops).unwrap());
        assert!(!feed.has_table(Table::CalendarDates).unwrap());
        let err = feed
            .scan(|_: crate::feed::records::CalendarDateRecord| {})
            .unwrap_err();
        assert!(matches!(err, FeedError::MissingTable(Table::CalendarDates)));
    }

    #[test]
    fn open_rejects_feed_without_required_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        let mut tables = minimal_tables();
        tables.retain(|(name, _)| *name != "stop_times.txt");
        write_zip(&path, &tables);

        let err = ZipFeed::open(&path).unwrap_err();
        assert!(matches!(err, FeedError::MissingTable(Table::StopTimes)));
    }

    #[test]
    fn open_rejects_missing_file() {
        let err = ZipFeed::open("/nonexistent/feed.zip").unwrap_err();
        assert!(matches!(err, FeedError::Open { .. }));
    }

    #[test]
    fn open_rejects_non_zip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(ZipFeed::open(&path).unwrap_err(), FeedError::Zip(_)));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.zip");
        let b = dir.path().join("b.zip");
        let c = dir.path().join("c.zip");
        write_zip(&a, &minimal_tables());
        write_zip(&b, &minimal_tables());
        let mut changed = minimal_tables();
        changed[3].1 = b"trip_id,stop_id,departure_time,stop_sequence\nT1,S1,09:00:00,1\n";
        write_zip(&c, &changed);

        let fp_a = ZipFeed::open(&a).unwrap().fingerprint().unwrap();
        let fp_b = ZipFeed::open(&b).unwrap().fingerprint().unwrap();
        let fp_c = ZipFeed::open(&c).unwrap().fingerprint().unwrap();
        assert_eq!(fp_a, fp_b);
        assert_ne!(fp_a, fp_c);
    }
}
