//! Building typed tables from raw string rows.
//!
//! Format readers hand over a [`RawTable`] (header names plus rows of optional strings). The
//! builder resolves a [`tabula_columnar::ColumnType`] per column (explicit overrides first, then
//! detection over a sample of rows), parses every token and returns a populated
//! [`tabula_columnar::Table`].

#![forbid(unsafe_code)]

mod builder;
mod delimited;
mod error;
mod infer;
mod options;
mod registry;
mod source;

pub use crate::builder::{build_table, column_names, resolve_column_types, table_name};
pub use crate::delimited::{CsvOptions, CsvReader, CsvTextEncoding};
pub use crate::error::{ImportError, ImportResult};
pub use crate::infer::TypeDetector;
pub use crate::options::{ColumnTypeFn, ReadOptions, TypeOverrides};
pub use crate::registry::{read_all_sheets, read_sheet, ReaderRegistry, TableReader};
pub use crate::source::{GridSheet, RawTable};
