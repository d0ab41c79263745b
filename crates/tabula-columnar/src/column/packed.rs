#![forbid(unsafe_code)]

//! Columns whose values pack into a fixed-width primitive with one reserved raw pattern.

use crate::error::{ColumnarError, ColumnarResult, StorageRejection};
use crate::selection::Selection;
use crate::types::{ColumnType, Value, MISSING_BOOL, MISSING_I32, MISSING_I64};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Encoding of one logical value kind into a raw, fixed-width representation.
pub trait PackedKind: Debug + Send + Sync + 'static {
    type Raw: Copy + PartialEq + Debug + Send + Sync;
    type Item: Clone + Debug;

    const COLUMN_TYPE: ColumnType;
    const MISSING: Self::Raw;

    fn pack(item: &Self::Item) -> Self::Raw;

    /// `None` for raw values that do not decode (only reachable for the sentinel).
    fn unpack(raw: Self::Raw) -> Option<Self::Item>;

    fn to_value(item: Self::Item) -> Value;

    fn from_value(value: &Value) -> Option<Self::Item>;
}

#[derive(Debug)]
pub struct BooleanKind;

impl PackedKind for BooleanKind {
    type Raw = i8;
    type Item = bool;

    const COLUMN_TYPE: ColumnType = ColumnType::Boolean;
    const MISSING: i8 = MISSING_BOOL;

    fn pack(item: &bool) -> i8 {
        *item as i8
    }

    fn unpack(raw: i8) -> Option<bool> {
        match raw {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    fn to_value(item: bool) -> Value {
        Value::Boolean(item)
    }

    fn from_value(value: &Value) -> Option<bool> {
        match value {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Dates as days since 0001-01-01 (day 1).
#[derive(Debug)]
pub struct DateKind;

impl PackedKind for DateKind {
    type Raw = i32;
    type Item = NaiveDate;

    const COLUMN_TYPE: ColumnType = ColumnType::Date;
    const MISSING: i32 = MISSING_I32;

    fn pack(item: &NaiveDate) -> i32 {
        use chrono::Datelike;
        item.num_days_from_ce()
    }

    fn unpack(raw: i32) -> Option<NaiveDate> {
        if raw == MISSING_I32 {
            return None;
        }
        NaiveDate::from_num_days_from_ce_opt(raw)
    }

    fn to_value(item: NaiveDate) -> Value {
        Value::Date(item)
    }

    fn from_value(value: &Value) -> Option<NaiveDate> {
        match value {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Local date-times as microseconds since the Unix epoch.
#[derive(Debug)]
pub struct DateTimeKind;

impl PackedKind for DateTimeKind {
    type Raw = i64;
    type Item = NaiveDateTime;

    const COLUMN_TYPE: ColumnType = ColumnType::DateTime;
    const MISSING: i64 = MISSING_I64;

    fn pack(item: &NaiveDateTime) -> i64 {
        item.and_utc().timestamp_micros()
    }

    fn unpack(raw: i64) -> Option<NaiveDateTime> {
        if raw == MISSING_I64 {
            return None;
        }
        DateTime::<Utc>::from_timestamp_micros(raw).map(|dt| dt.naive_utc())
    }

    fn to_value(item: NaiveDateTime) -> Value {
        Value::DateTime(item)
    }

    fn from_value(value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Offset date-times as (UTC microseconds, offset seconds east).
#[derive(Debug)]
pub struct DateTimeOffsetKind;

impl PackedKind for DateTimeOffsetKind {
    type Raw = (i64, i32);
    type Item = DateTime<FixedOffset>;

    const COLUMN_TYPE: ColumnType = ColumnType::DateTimeOffset;
    const MISSING: (i64, i32) = (MISSING_I64, 0);

    fn pack(item: &DateTime<FixedOffset>) -> (i64, i32) {
        (item.timestamp_micros(), item.offset().local_minus_utc())
    }

    fn unpack((micros, offset): (i64, i32)) -> Option<DateTime<FixedOffset>> {
        if micros == MISSING_I64 {
            return None;
        }
        let offset = FixedOffset::east_opt(offset)?;
        DateTime::<Utc>::from_timestamp_micros(micros).map(|dt| dt.with_timezone(&offset))
    }

    fn to_value(item: DateTime<FixedOffset>) -> Value {
        Value::DateTimeOffset(item)
    }

    fn from_value(value: &Value) -> Option<DateTime<FixedOffset>> {
        match value {
            Value::DateTimeOffset(dt) => Some(*dt),
            _ => None,
        }
    }
}

pub type BooleanColumn = PackedColumn<BooleanKind>;
pub type DateColumn = PackedColumn<DateKind>;
pub type DateTimeColumn = PackedColumn<DateTimeKind>;
pub type DateTimeOffsetColumn = PackedColumn<DateTimeOffsetKind>;

#[derive(Debug)]
pub struct PackedColumn<K: PackedKind> {
    name: String,
    values: Vec<K::Raw>,
    _kind: PhantomData<K>,
}

impl<K: PackedKind> Clone for PackedColumn<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            values: self.values.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: PackedKind> PartialEq for PackedColumn<K> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values
    }
}

impl<K: PackedKind> PackedColumn<K> {
    pub fn create(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            values: Vec::with_capacity(capacity),
            _kind: PhantomData,
        }
    }

    pub fn from_values(name: impl Into<String>, values: &[Option<K::Item>]) -> Self {
        let mut column = Self::create(name, values.len());
        for v in values {
            match v {
                Some(item) => column.append(item),
                None => column.append_missing(),
            }
        }
        column
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn column_type(&self) -> ColumnType {
        K::COLUMN_TYPE
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn append(&mut self, item: &K::Item) {
        self.values.push(K::pack(item));
    }

    pub fn append_missing(&mut self) {
        self.values.push(K::MISSING);
    }

    pub fn append_value(&mut self, value: &Value) -> ColumnarResult<()> {
        if value.is_missing() {
            self.append_missing();
            return Ok(());
        }
        let item = K::from_value(value).ok_or_else(|| {
            ColumnarError::incompatible(
                &self.name,
                StorageRejection::WrongKind {
                    expected: K::COLUMN_TYPE,
                    actual: value.kind(),
                },
            )
        })?;
        self.append(&item);
        Ok(())
    }

    /// `None` when the row is missing. Panics if `row` is out of bounds.
    pub fn get(&self, row: usize) -> Option<K::Item> {
        K::unpack(self.values[row])
    }

    pub fn set(&mut self, row: usize, item: Option<&K::Item>) -> ColumnarResult<()> {
        let len = self.len();
        let slot = self
            .values
            .get_mut(row)
            .ok_or_else(|| ColumnarError::row_out_of_range(row, len))?;
        *slot = item.map(K::pack).unwrap_or(K::MISSING);
        Ok(())
    }

    pub fn value(&self, row: usize) -> Value {
        self.get(row).map(K::to_value).unwrap_or(Value::Missing)
    }

    pub fn is_missing(&self, row: usize) -> bool {
        self.values[row] == K::MISSING
    }

    pub fn count_missing(&self) -> usize {
        self.values.iter().filter(|v| **v == K::MISSING).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<K::Item>> + '_ {
        self.values.iter().map(|raw| K::unpack(*raw))
    }

    /// Rows whose present value satisfies `predicate`.
    pub fn eval(&self, predicate: impl Fn(&K::Item) -> bool) -> Selection {
        self.iter()
            .enumerate()
            .filter_map(|(row, v)| v.filter(|item| predicate(item)).map(|_| row))
            .collect()
    }

    pub fn where_(&self, selection: &Selection) -> Self {
        let mut out = self.empty_copy(selection.len());
        out.values.extend(selection.iter().map(|row| self.values[row]));
        out
    }

    pub fn empty_copy(&self, capacity: usize) -> Self {
        Self::create(self.name.clone(), capacity)
    }
}

impl PackedColumn<BooleanKind> {
    pub fn is_true(&self) -> Selection {
        self.eval(|b| *b)
    }

    pub fn is_false(&self) -> Selection {
        self.eval(|b| !*b)
    }
}
