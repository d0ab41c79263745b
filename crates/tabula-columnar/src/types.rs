#![forbid(unsafe_code)]

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Raw bit pattern reserved for a missing `f64`.
///
/// This is a quiet NaN with a non-zero payload. Arithmetic and `"NaN".parse::<f64>()` produce the
/// canonical NaN (`0x7ff8_0000_0000_0000`), so legitimate data never carries this exact pattern.
pub const MISSING_F64_BITS: u64 = 0x7ff8_0000_7ab1_0001;

/// Raw bit pattern reserved for a missing `f32` (quiet NaN, non-zero payload).
pub const MISSING_F32_BITS: u32 = 0x7fc0_7ab1;

pub const MISSING_I16: i16 = i16::MIN;
pub const MISSING_I32: i32 = i32::MIN;
pub const MISSING_I64: i64 = i64::MIN;
pub const MISSING_BOOL: i8 = i8::MIN;

/// Largest magnitude a `LONG` value may have. Every integer in `[-2^53, 2^53]` survives the
/// round trip through the `f64` column interface; larger ones would not.
pub const MAX_EXACT_LONG: i64 = 1 << 53;

/// The missing indicator returned by numeric accessors.
#[inline]
pub fn missing_f64() -> f64 {
    f64::from_bits(MISSING_F64_BITS)
}

/// Returns `true` iff `value` is the reserved missing indicator.
///
/// This is a bit-pattern comparison, not a NaN test: a NaN produced by arithmetic is a real value.
#[inline]
pub fn is_missing_f64(value: f64) -> bool {
    value.to_bits() == MISSING_F64_BITS
}

/// Logical value kinds a column can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Date,
    DateTime,
    DateTimeOffset,
}

/// The reserved value a column type uses to encode "no value present".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sentinel {
    EmptyText,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32Bits(u32),
    F64Bits(u64),
    /// UTC instant + offset seconds; the instant half is reserved.
    I64WithOffset(i64, i32),
}

impl ColumnType {
    pub const ALL: [ColumnType; 10] = [
        ColumnType::Text,
        ColumnType::Short,
        ColumnType::Integer,
        ColumnType::Long,
        ColumnType::Float,
        ColumnType::Double,
        ColumnType::Boolean,
        ColumnType::Date,
        ColumnType::DateTime,
        ColumnType::DateTimeOffset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Short => "SHORT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Long => "LONG",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "DATE_TIME",
            ColumnType::DateTimeOffset => "DATE_TIME_OFFSET",
        }
    }

    /// Canonical per-value storage width in bytes.
    ///
    /// Text reports the width of an interned string handle index, matching how the column is
    /// accounted for in memory estimates rather than the string payload itself.
    pub fn byte_size(self) -> usize {
        match self {
            ColumnType::Text => 4,
            ColumnType::Short => 2,
            ColumnType::Integer => 4,
            ColumnType::Long => 8,
            ColumnType::Float => 4,
            ColumnType::Double => 8,
            ColumnType::Boolean => 1,
            ColumnType::Date => 4,
            ColumnType::DateTime => 8,
            ColumnType::DateTimeOffset => 12,
        }
    }

    pub fn sentinel(self) -> Sentinel {
        match self {
            ColumnType::Text => Sentinel::EmptyText,
            ColumnType::Short => Sentinel::I16(MISSING_I16),
            ColumnType::Integer => Sentinel::I32(MISSING_I32),
            ColumnType::Long => Sentinel::I64(MISSING_I64),
            ColumnType::Float => Sentinel::F32Bits(MISSING_F32_BITS),
            ColumnType::Double => Sentinel::F64Bits(MISSING_F64_BITS),
            ColumnType::Boolean => Sentinel::I8(MISSING_BOOL),
            ColumnType::Date => Sentinel::I32(MISSING_I32),
            ColumnType::DateTime => Sentinel::I64(MISSING_I64),
            ColumnType::DateTimeOffset => Sentinel::I64WithOffset(MISSING_I64, 0),
        }
    }

    /// Numeric types are stored in a [`crate::NumberColumn`].
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Short
                | ColumnType::Integer
                | ColumnType::Long
                | ColumnType::Float
                | ColumnType::Double
        )
    }

    /// Inclusive bounds of the storable values of an integer type, sentinel excluded.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            ColumnType::Short => Some((MISSING_I16 as i64 + 1, i16::MAX as i64)),
            ColumnType::Integer => Some((MISSING_I32 as i64 + 1, i32::MAX as i64)),
            ColumnType::Long => Some((-MAX_EXACT_LONG, MAX_EXACT_LONG)),
            _ => None,
        }
    }

    /// Types whose values always fit the compact `i32` representation.
    pub fn fits_compact(self) -> bool {
        matches!(self, ColumnType::Short | ColumnType::Integer)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single logical cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Missing,
    Text(Arc<str>),
    /// Exact integer, used for Short / Integer / Long parse results.
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Short description of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::DateTimeOffset(_) => "date-time-offset",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::DateTimeOffset(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_f64_is_not_the_canonical_nan() {
        assert!(is_missing_f64(missing_f64()));
        assert!(!is_missing_f64(f64::NAN));
        assert!(!is_missing_f64(0.0 / 0.0));
        assert!(!is_missing_f64("NaN".parse::<f64>().unwrap()));
        assert!(!is_missing_f64(f64::INFINITY));
    }

    #[test]
    fn catalog_widths_and_sentinels() {
        assert_eq!(ColumnType::Short.byte_size(), 2);
        assert_eq!(ColumnType::Long.byte_size(), 8);
        assert_eq!(ColumnType::Integer.sentinel(), Sentinel::I32(i32::MIN));
        assert_eq!(ColumnType::Text.sentinel(), Sentinel::EmptyText);
        assert!(ColumnType::ALL.iter().filter(|t| t.is_numeric()).count() == 5);
    }

    #[test]
    fn integer_ranges_exclude_sentinels() {
        assert_eq!(ColumnType::Short.integer_range(), Some((-32767, 32767)));
        assert_eq!(
            ColumnType::Integer.integer_range(),
            Some((i32::MIN as i64 + 1, i32::MAX as i64))
        );
        let (min, max) = ColumnType::Long.integer_range().unwrap();
        assert_eq!((min, max), (-MAX_EXACT_LONG, MAX_EXACT_LONG));
        assert_eq!(max as f64 as i64, max);
        assert_ne!((max + 1) as f64 as i64, max + 1);
        assert_eq!(ColumnType::Double.integer_range(), None);
    }

    #[test]
    fn column_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&ColumnType::DateTimeOffset).unwrap();
        assert_eq!(json, "\"date_time_offset\"");
        let back: ColumnType = serde_json::from_str("\"integer\"").unwrap();
        assert_eq!(back, ColumnType::Integer);
    }
}
