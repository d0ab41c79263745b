#![forbid(unsafe_code)]

use tabula_columnar::ColumnarError;
use thiserror::Error;

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Columnar(#[from] ColumnarError),
    #[error("column type map does not name column {column:?}")]
    MissingColumnType { column: String },
    #[error("row {row} has {actual} values but the header has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("no reader registered for format {0:?}")]
    UnknownFormat(String),
    #[error("csv parse error at row {row}: {reason}")]
    Csv { row: u64, reason: String },
    #[error("input was empty")]
    EmptyInput,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
