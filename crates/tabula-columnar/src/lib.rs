//! In-memory columnar tables.
//!
//! This crate focuses on:
//! - A catalog of column types, each with a storage width, a reserved missing sentinel and a
//!   locale-aware token parser.
//! - Numeric columns backed by either compact `i32` or full `f64` storage, fixed at creation.
//! - Row [`Selection`]s (compressed bitmaps) produced by predicates and consumed by `where_` and
//!   bulk `set` operations.
//! - A [`Table`] of equally sized, uniquely named columns.
//!
//! Missing values are encoded in-band: a row is missing iff it holds its type's sentinel.

#![forbid(unsafe_code)]

mod column;
mod error;
mod parse;
mod selection;
mod stats;
mod table;
mod types;

pub use crate::column::{
    BooleanColumn, BooleanKind, Column, CompactStorage, DateColumn, DateKind, DateTimeColumn,
    DateTimeKind, DateTimeOffsetColumn, DateTimeOffsetKind, FloatStorage, NumberColumn,
    NumericStorage, PackedColumn, PackedKind, Representation, TextColumn,
};
pub use crate::error::{ColumnarError, ColumnarResult, IndexKind, StorageRejection};
pub use crate::parse::{parse_bool, DateOrder, Locale, Parsers};
pub use crate::selection::Selection;
pub use crate::stats::ColumnStats;
pub use crate::table::Table;
pub use crate::types::{
    is_missing_f64, missing_f64, ColumnType, Sentinel, Value, MAX_EXACT_LONG, MISSING_BOOL,
    MISSING_F32_BITS, MISSING_F64_BITS, MISSING_I16, MISSING_I32, MISSING_I64,
};
