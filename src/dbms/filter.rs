//! WHERE-clause evaluation against decoded records.
//!
//! Comparison is purely textual: the row cell must string-equal the
//! literal after one level of surrounding single quotes is stripped from
//! the literal. There is no numeric coercion — `age = '20'` and
//! `age = 20` select the same rows only because both literals carry the
//! text `20`.
//!
//! Two evaluation modes exist:
//!
//! - [`matches`] — the scan-path form. A column missing from the record
//!   makes the condition false, never an error.
//! - [`matches_strict`] — the point-lookup form. The record was fully
//!   decoded against the table header, so a missing column can only mean
//!   corruption and is reported as such.

use crate::dbms::DbmsError;
use crate::parser::ast::{WhereClause, strip_single_quotes};
use crate::record::Record;

/// Evaluates `clause` against `record`, treating missing columns as a
/// non-match.
pub fn matches(clause: &WhereClause, record: &Record) -> bool {
    match clause {
        WhereClause::Equals { column, value } => match record.cell(column) {
            Some(cell) => cell == strip_single_quotes(value),
            None => false,
        },
        WhereClause::And { left, right } => matches(left, record) && matches(right, record),
    }
}

/// Evaluates `clause` against `record`, reporting missing columns as
/// [`DbmsError::CorruptRecord`].
pub fn matches_strict(clause: &WhereClause, record: &Record) -> Result<bool, DbmsError> {
    match clause {
        WhereClause::Equals { column, value } => {
            let cell = record
                .cell(column)
                .ok_or_else(|| DbmsError::CorruptRecord(column.clone()))?;
            Ok(cell == strip_single_quotes(value))
        }
        WhereClause::And { left, right } => {
            Ok(matches_strict(left, record)? && matches_strict(right, record)?)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------
