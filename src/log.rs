//! Table Log Module
//!
//! This module implements the **append-only** log file backing one table.
//! A log is a UTF-8 CSV file whose first line is the header (user columns
//! followed by `__deleted__`) and whose every subsequent line is one
//! encoded record. Records are never rewritten in place — updates and
//! deletes append new versions, and compaction replaces the whole file.
//!
//! # On-disk layout
//!
//! ```text
//! [HEADER_LINE]\n
//! [RECORD_LINE]\n      <- offsets (start, end) span the line AND its LF
//! [RECORD_LINE]\n
//! ...
//! ```
//!
//! # Offset discipline
//!
//! The append path captures `start` as the end-of-file position *before*
//! writing, writes exactly one encoded record terminated by a single LF,
//! and observes `end` from the same handle afterwards. Offsets are never
//! recomputed from a re-read of the file; the hash index stores exactly
//! the pairs this module returns.
//!
//! # Guarantees
//!
//! - **Durability:** every append is flushed to the OS file cache before
//!   returning, so an immediate reopen observes the record. No fsync.
//! - **Corruption detection:** a data line whose field count differs from
//!   the header arity fails the read with a [`RecordError`].

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, trace};

use crate::record::{self, DELETED_COLUMN, Record, RecordError, Row};

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by table log operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record codec failure (corruption on read, bad row on write).
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// The file has no header line.
    #[error("Missing header line in {0:?}")]
    MissingHeader(PathBuf),

    /// A byte range whose end precedes its start.
    #[error("Invalid byte range [{start}, {end})")]
    InvalidRange { start: u64, end: u64 },
}

// ------------------------------------------------------------------------------------------------
// Table Log
// ------------------------------------------------------------------------------------------------

/// Handle to the append-only CSV log backing one table.
///
/// The handle caches the decoded header; file handles themselves are
/// opened per operation and never held across statements.
#[derive(Debug, Clone)]
pub struct TableLog {
    /// Path to the backing CSV file.
    path: PathBuf,

    /// Full header: user columns plus the trailing `__deleted__` column.
    headers: Vec<String>,
}

impl TableLog {
    /// Creates (or truncates) a log at `path` with the given user columns.
    ///
    /// The `__deleted__` column is appended to the declared columns and a
    /// single header line is written.
    pub fn create<P: AsRef<Path>>(path: P, user_headers: &[String]) -> Result<Self, LogError> {
        let mut headers = user_headers.to_vec();
        headers.push(DELETED_COLUMN.to_string());

        let mut file = File::create(path.as_ref())?;
        file.write_all(&record::encode_header(&headers)?)?;
        file.flush()?;

        info!(
            "Created table log at {} with headers {:?}",
            path.as_ref().display(),
            headers
        );

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            headers,
        })
    }

    /// Opens an existing log, decoding its header line.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);

        let mut header_line = Vec::new();
        let n = reader.read_until(b'\n', &mut header_line)?;
        if n == 0 {
            return Err(LogError::MissingHeader(path.as_ref().to_path_buf()));
        }

        let headers = record::decode_header(&header_line)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            headers,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full header, including the trailing `__deleted__` column.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// User-declared columns, i.e. the header minus `__deleted__`.
    pub fn user_headers(&self) -> &[String] {
        &self.headers[..self.headers.len() - 1]
    }

    /// Appends one record and returns its `(start, end)` byte range.
    ///
    /// `start` is the end-of-file offset before the write; `end` is the
    /// stream position observed after writing the record and its LF. The
    /// write is flushed before the offsets are published, so a reader
    /// opening the file immediately afterwards sees the record.
    pub fn append(&self, row: &Row, deleted: bool) -> Result<(u64, u64), LogError> {
        let bytes = record::encode_record(&self.headers, row, deleted)?;

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        let start = file.seek(SeekFrom::End(0))?;
        file.write_all(&bytes)?;
        file.flush()?;
        let end = file.stream_position()?;

        trace!(
            "Appended record to {} at [{}, {}) deleted={}",
            self.path.display(),
            start,
            end,
            deleted
        );

        Ok((start, end))
    }

    /// Reads and decodes the record stored in `[start, end)`.
    ///
    /// The header line is skipped explicitly before seeking; the byte
    /// range must cover one full line including its terminating LF.
    pub fn read_range(&self, start: u64, end: u64) -> Result<Record, LogError> {
        let len = end
            .checked_sub(start)
            .ok_or(LogError::InvalidRange { start, end })? as usize;

        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        let mut header_line = Vec::new();
        if reader.read_until(b'\n', &mut header_line)? == 0 {
            return Err(LogError::MissingHeader(self.path.clone()));
        }

        reader.seek(SeekFrom::Start(start))?;
        let mut line = vec![0u8; len];
        reader.read_exact(&mut line)?;

        Ok(record::decode_record(&line, &self.headers)?)
    }

    /// Returns an iterator over every data record in the log, in file
    /// order, with the byte range of each.
    pub fn scan(&self) -> Result<LogScan, LogError> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        let mut header_line = Vec::new();
        let n = reader.read_until(b'\n', &mut header_line)?;
        if n == 0 {
            return Err(LogError::MissingHeader(self.path.clone()));
        }

        Ok(LogScan {
            reader,
            headers: self.headers.clone(),
            offset: n as u64,
        })
    }

    /// Replaces the log's contents with the header plus the given rows,
    /// all marked live. Used by compaction.
    pub fn rewrite(&self, rows: &[Row]) -> Result<(), LogError> {
        let mut file = File::create(&self.path)?;
        file.write_all(&record::encode_header(&self.headers)?)?;
        for row in rows {
            file.write_all(&record::encode_record(&self.headers, row, false)?)?;
        }
        file.flush()?;

        info!(
            "Rewrote table log {} with {} surviving rows",
            self.path.display(),
            rows.len()
        );
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// LogScan
// ------------------------------------------------------------------------------------------------

/// Streaming iterator over the data lines of a table log.
///
/// Yields `(start, end, record)` triples where `[start, end)` is the byte
/// range of the line including its LF — the same ranges [`TableLog::append`]
/// reported when the records were written.
pub struct LogScan {
    /// Buffered reader positioned after the header line.
    reader: BufReader<File>,

    /// Header cached for decoding.
    headers: Vec<String>,

    /// Byte offset of the next unread line.
    offset: u64,
}

impl Iterator for LogScan {
    type Item = Result<(u64, u64, Record), LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        let n = match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => return None,
            Ok(n) => n,
            Err(e) => return Some(Err(LogError::Io(e))),
        };

        let start = self.offset;
        let end = start + n as u64;
        self.offset = end;

        match record::decode_record(&line, &self.headers) {
            Ok(record) => Some(Ok((start, end, record))),
            Err(e) => Some(Err(LogError::Record(e))),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user_headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample_row(id: &str, name: &str) -> Row {
        Row::from_pairs([("id", id), ("name", name)])
    }

    #[test]
    fn test_create_writes_header_with_deleted_column() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");

        let log = TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();
        assert_eq!(log.headers(), ["id", "name", DELETED_COLUMN]);
        assert_eq!(log.user_headers(), ["id", "name"]);

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"id,name,__deleted__\n");
    }

    #[test]
    fn test_open_reads_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();

        let log = TableLog::open(&path).unwrap();
        assert_eq!(log.headers(), ["id", "name", DELETED_COLUMN]);
    }

    #[test]
    fn test_open_empty_file_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.csv");
        File::create(&path).unwrap();

        let err = TableLog::open(&path).unwrap_err();
        assert!(matches!(err, LogError::MissingHeader(_)));
    }

    #[test]
    fn test_append_returns_contiguous_offsets() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        let log = TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();

        let header_len = "id,name,__deleted__\n".len() as u64;
        let (s1, e1) = log.append(&sample_row("1", "John"), false).unwrap();
        let (s2, e2) = log.append(&sample_row("2", "Jane"), false).unwrap();

        assert_eq!(s1, header_len);
        assert_eq!(e1, s1 + "1,John,False\n".len() as u64);
        assert_eq!(s2, e1);
        assert_eq!(e2, s2 + "2,Jane,False\n".len() as u64);
    }

    #[test]
    fn test_read_range_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        let log = TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();

        let (start, end) = log.append(&sample_row("1", "Doe, John"), false).unwrap();
        let record = log.read_range(start, end).unwrap();

        assert_eq!(record.row, sample_row("1", "Doe, John"));
        assert!(!record.deleted);
    }

    #[test]
    fn test_read_range_rejects_inverted_range() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        let log = TableLog::create(&path, &user_headers(&["id"])).unwrap();

        let err = log.read_range(10, 5).unwrap_err();
        assert!(matches!(err, LogError::InvalidRange { start: 10, end: 5 }));
    }

    #[test]
    fn test_scan_yields_offsets_and_records() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        let log = TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();

        let r1 = log.append(&sample_row("1", "John"), false).unwrap();
        let r2 = log.append(&sample_row("1", "John"), true).unwrap();

        let scanned: Vec<_> = log.scan().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(scanned.len(), 2);

        assert_eq!((scanned[0].0, scanned[0].1), r1);
        assert!(!scanned[0].2.deleted);

        assert_eq!((scanned[1].0, scanned[1].1), r2);
        assert!(scanned[1].2.deleted);
    }

    #[test]
    fn test_scan_reports_arity_corruption() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        let log = TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();
        log.append(&sample_row("1", "John"), false).unwrap();

        // A truncated line: one field short of the header arity.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"2,False\n").unwrap();

        let results: Vec<_> = log.scan().unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(LogError::Record(RecordError::ArityMismatch { .. }))
        ));
    }

    #[test]
    fn test_append_visible_to_fresh_handle() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        let log = TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();
        let (start, end) = log.append(&sample_row("1", "John"), false).unwrap();

        // A brand-new handle must observe the just-written record.
        let reopened = TableLog::open(&path).unwrap();
        let record = reopened.read_range(start, end).unwrap();
        assert_eq!(record.row.get("name"), Some("John"));
    }

    #[test]
    fn test_rewrite_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.csv");
        let log = TableLog::create(&path, &user_headers(&["id", "name"])).unwrap();
        log.append(&sample_row("1", "John"), false).unwrap();
        log.append(&sample_row("1", "John"), true).unwrap();
        log.append(&sample_row("2", "Jane"), false).unwrap();

        log.rewrite(&[sample_row("2", "Jane")]).unwrap();

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"id,name,__deleted__\n2,Jane,False\n");
    }
}
