//! Record Codec Module
//!
//! This module defines the [`Row`] type and the codec between rows and the
//! on-disk CSV representation used by the table logs.
//!
//! # On-disk layout
//!
//! ```text
//! id,name,age,__deleted__\n          <- header line, written once
//! 1,John,20,False\n                  <- live record
//! 1,John,21,False\n                  <- a later version of the same key
//! 1,John,21,True\n                   <- tombstone: key 1 is deleted
//! ```
//!
//! Every data line carries the cells of the user-declared columns, in
//! header order, followed by one tombstone cell that is the literal `True`
//! or `False`. Values containing the separator, a quote, or a newline are
//! quoted RFC-4180 style. The line terminator is a single LF — byte-offset
//! arithmetic in the log layer depends on it.
//!
//! # Guarantees
//!
//! - **Header arity:** a decoded line whose field count differs from the
//!   header arity is reported as corruption, never silently padded.
//! - **Round trip:** `decode(encode(row))` reproduces the row and flag.

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::io;

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use thiserror::Error;

/// Name of the implicit trailing tombstone column.
pub const DELETED_COLUMN: &str = "__deleted__";

/// Cell value marking a record as a tombstone.
pub const TOMBSTONE: &str = "True";

/// Cell value marking a record as live.
pub const LIVE: &str = "False";

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by the record codec.
#[derive(Debug, Error)]
pub enum RecordError {
    /// CSV-level parse or write failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O error while flushing encoded bytes.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A data line's field count does not match the header arity.
    #[error("Field count mismatch: expected {expected}, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// The trailing tombstone cell is neither `True` nor `False`.
    #[error("Invalid tombstone flag: {0:?}")]
    InvalidTombstone(String),

    /// A declared column is absent from the row being encoded.
    #[error("Column {0:?} missing from row")]
    MissingColumn(String),
}

// ------------------------------------------------------------------------------------------------
// Row
// ------------------------------------------------------------------------------------------------

/// An ordered mapping from column name to cell value.
///
/// Cell values are always strings — the engine has no type system beyond
/// textual cells. Insertion order is preserved so that rows can be written
/// back in header order and result sets stay reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(column, value)` pairs, keeping their order.
    pub fn from_pairs<I, C, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<String>,
    {
        let cells = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .collect();
        Self { cells }
    }

    /// Returns the cell value for `column`, if present.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `column` to `value`, replacing an existing cell or appending a
    /// new one at the end.
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        match self.cells.iter_mut().find(|(c, _)| c == column) {
            Some((_, v)) => *v = value.into(),
            None => self.cells.push((column.to_string(), value.into())),
        }
    }

    /// Removes `column` from the row, returning its value if it existed.
    pub fn remove(&mut self, column: &str) -> Option<String> {
        let pos = self.cells.iter().position(|(c, _)| c == column)?;
        Some(self.cells.remove(pos).1)
    }

    /// Iterates over `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// Record
// ------------------------------------------------------------------------------------------------

/// A decoded log record: the user-visible row plus its tombstone flag.
///
/// The `__deleted__` column never appears inside [`Record::row`]; the flag
/// is lifted into [`Record::deleted`] during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The user-declared cells, in header order.
    pub row: Row,

    /// Whether this record tombstones its primary key.
    pub deleted: bool,
}

impl Record {
    /// Returns the cell for `column`, treating `__deleted__` as a regular
    /// column whose value is the encoded flag. Predicates evaluate against
    /// the full on-log shape of the record, flag included.
    pub fn cell(&self, column: &str) -> Option<&str> {
        if column == DELETED_COLUMN {
            Some(if self.deleted { TOMBSTONE } else { LIVE })
        } else {
            self.row.get(column)
        }
    }

    /// Wraps a user-visible row as a live record.
    pub fn live(row: Row) -> Self {
        Self {
            row,
            deleted: false,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Codec
// ------------------------------------------------------------------------------------------------

/// Encodes one header line (user columns followed by `__deleted__`).
pub fn encode_header(headers: &[String]) -> Result<Vec<u8>, RecordError> {
    write_line(headers.iter().map(String::as_str))
}

/// Decodes the header line of a table log.
pub fn decode_header(line: &[u8]) -> Result<Vec<String>, RecordError> {
    let fields = read_line(line)?;
    Ok(fields)
}

/// Encodes one data record.
///
/// Cells are emitted in header order; the final cell is the tombstone flag.
/// `headers` must be the full header including the trailing `__deleted__`
/// column. A user column missing from `row` is an error — partial records
/// would silently shift cells under the wrong headers.
pub fn encode_record(headers: &[String], row: &Row, deleted: bool) -> Result<Vec<u8>, RecordError> {
    let user_headers = &headers[..headers.len().saturating_sub(1)];

    let mut fields = Vec::with_capacity(headers.len());
    for header in user_headers {
        let value = row
            .get(header)
            .ok_or_else(|| RecordError::MissingColumn(header.clone()))?;
        fields.push(value);
    }
    fields.push(if deleted { TOMBSTONE } else { LIVE });

    write_line(fields.into_iter())
}

/// Decodes one data line against the table headers.
///
/// The trailing newline, if present, is ignored. The field count must
/// equal the header arity (user columns + tombstone column).
pub fn decode_record(line: &[u8], headers: &[String]) -> Result<Record, RecordError> {
    let fields = read_line(line)?;

    if fields.len() != headers.len() {
        return Err(RecordError::ArityMismatch {
            expected: headers.len(),
            found: fields.len(),
        });
    }

    let flag = &fields[fields.len() - 1];
    let deleted = match flag.as_str() {
        TOMBSTONE => true,
        LIVE => false,
        other => return Err(RecordError::InvalidTombstone(other.to_string())),
    };

    let row = Row::from_pairs(
        headers[..headers.len() - 1]
            .iter()
            .cloned()
            .zip(fields.into_iter().take(headers.len() - 1)),
    );

    Ok(Record { row, deleted })
}

/// Writes one CSV line with RFC-4180 quoting and a single LF terminator.
fn write_line<'a>(fields: impl Iterator<Item = &'a str>) -> Result<Vec<u8>, RecordError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(fields)?;
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| RecordError::Io(e.into_error()))
}

/// Reads the fields of one CSV line.
fn read_line(line: &[u8]) -> Result<Vec<String>, RecordError> {
    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(line);

    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Err(RecordError::ArityMismatch {
            expected: 1,
            found: 0,
        }),
    }
}

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------
