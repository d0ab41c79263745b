#![forbid(unsafe_code)]

use crate::types::ColumnType;
use std::fmt;
use thiserror::Error;

pub type ColumnarResult<T> = Result<T, ColumnarError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Row,
    Column,
    Sheet,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexKind::Row => "row",
            IndexKind::Column => "column",
            IndexKind::Sheet => "sheet",
        })
    }
}

/// Why a storage backend refused a value.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StorageRejection {
    #[error("non-integral value {0} cannot be stored in an integer column")]
    NonIntegral(f64),
    #[error("value {0} is outside the range of the column type")]
    OutOfRange(f64),
    #[error("value {0} collides with the reserved missing sentinel")]
    ReservedSentinel(i64),
    #[error("{actual} value cannot be stored in a {expected} column")]
    WrongKind {
        expected: ColumnType,
        actual: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ColumnarError {
    #[error("{column}: unable to parse {token:?} as {column_type}")]
    Parse {
        column: String,
        token: String,
        column_type: ColumnType,
    },

    #[error("{column}: incompatible type: {reason}")]
    IncompatibleType {
        column: String,
        reason: StorageRejection,
    },

    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: IndexKind,
        index: usize,
        len: usize,
    },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column {column} is {actual}, expected {expected}")]
    ColumnTypeMismatch {
        column: String,
        expected: &'static str,
        actual: ColumnType,
    },
}

impl ColumnarError {
    pub(crate) fn row_out_of_range(index: usize, len: usize) -> Self {
        ColumnarError::IndexOutOfRange {
            kind: IndexKind::Row,
            index,
            len,
        }
    }

    pub(crate) fn incompatible(column: &str, reason: StorageRejection) -> Self {
        ColumnarError::IncompatibleType {
            column: column.to_owned(),
            reason,
        }
    }
}
