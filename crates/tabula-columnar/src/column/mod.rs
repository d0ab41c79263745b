#![forbid(unsafe_code)]

mod number;
mod packed;
mod storage;
mod text;

pub use number::NumberColumn;
pub use packed::{
    BooleanColumn, BooleanKind, DateColumn, DateKind, DateTimeColumn, DateTimeKind,
    DateTimeOffsetColumn, DateTimeOffsetKind, PackedColumn, PackedKind,
};
pub use storage::{CompactStorage, FloatStorage, NumericStorage, Representation};
pub use text::TextColumn;

use crate::error::ColumnarResult;
use crate::selection::Selection;
use crate::types::{ColumnType, Value};

/// Any typed column a [`crate::Table`] can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Text(TextColumn),
    Number(NumberColumn),
    Boolean(BooleanColumn),
    Date(DateColumn),
    DateTime(DateTimeColumn),
    DateTimeOffset(DateTimeOffsetColumn),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            Column::Text($c) => $body,
            Column::Number($c) => $body,
            Column::Boolean($c) => $body,
            Column::Date($c) => $body,
            Column::DateTime($c) => $body,
            Column::DateTimeOffset($c) => $body,
        }
    };
}

impl Column {
    /// An empty column of `column_type`. Numeric types honour `compact`; other types ignore it.
    pub fn empty(
        name: impl Into<String>,
        column_type: ColumnType,
        compact: bool,
        capacity: usize,
    ) -> Self {
        let name = name.into();
        match column_type {
            ColumnType::Text => Column::Text(TextColumn::create(name, capacity)),
            ColumnType::Short
            | ColumnType::Integer
            | ColumnType::Long
            | ColumnType::Float
            | ColumnType::Double => {
                Column::Number(NumberColumn::with_type(name, column_type, compact, capacity))
            }
            ColumnType::Boolean => Column::Boolean(BooleanColumn::create(name, capacity)),
            ColumnType::Date => Column::Date(DateColumn::create(name, capacity)),
            ColumnType::DateTime => Column::DateTime(DateTimeColumn::create(name, capacity)),
            ColumnType::DateTimeOffset => {
                Column::DateTimeOffset(DateTimeOffsetColumn::create(name, capacity))
            }
        }
    }

    pub fn name(&self) -> &str {
        dispatch!(self, c => c.name())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        dispatch!(self, c => c.set_name(name))
    }

    pub fn column_type(&self) -> ColumnType {
        dispatch!(self, c => c.column_type())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, c => c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        dispatch!(self, c => c.is_missing(row))
    }

    pub fn count_missing(&self) -> usize {
        dispatch!(self, c => c.count_missing())
    }

    pub fn all_missing(&self) -> bool {
        self.count_missing() == self.len()
    }

    /// Panics if `row` is out of bounds.
    pub fn value(&self, row: usize) -> Value {
        dispatch!(self, c => c.value(row))
    }

    pub fn append_value(&mut self, value: &Value) -> ColumnarResult<()> {
        dispatch!(self, c => c.append_value(value))
    }

    pub fn append_missing(&mut self) {
        dispatch!(self, c => c.append_missing())
    }

    /// Rows whose value is present and satisfies `predicate`.
    pub fn eval(&self, predicate: impl Fn(&Value) -> bool) -> Selection {
        (0..self.len())
            .filter(|&row| !self.is_missing(row) && predicate(&self.value(row)))
            .collect()
    }

    pub fn where_(&self, selection: &Selection) -> Column {
        match self {
            Column::Text(c) => Column::Text(c.where_(selection)),
            Column::Number(c) => Column::Number(c.where_(selection)),
            Column::Boolean(c) => Column::Boolean(c.where_(selection)),
            Column::Date(c) => Column::Date(c.where_(selection)),
            Column::DateTime(c) => Column::DateTime(c.where_(selection)),
            Column::DateTimeOffset(c) => Column::DateTimeOffset(c.where_(selection)),
        }
    }

    pub fn empty_copy(&self) -> Column {
        match self {
            Column::Text(c) => Column::Text(c.empty_copy(0)),
            Column::Number(c) => Column::Number(c.empty_copy(0)),
            Column::Boolean(c) => Column::Boolean(c.empty_copy(0)),
            Column::Date(c) => Column::Date(c.empty_copy(0)),
            Column::DateTime(c) => Column::DateTime(c.empty_copy(0)),
            Column::DateTimeOffset(c) => Column::DateTimeOffset(c.empty_copy(0)),
        }
    }

    pub fn as_number(&self) -> Option<&NumberColumn> {
        match self {
            Column::Number(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_number_mut(&mut self) -> Option<&mut NumberColumn> {
        match self {
            Column::Number(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextColumn> {
        match self {
            Column::Text(c) => Some(c),
            _ => None,
        }
    }
}

impl From<NumberColumn> for Column {
    fn from(c: NumberColumn) -> Self {
        Column::Number(c)
    }
}

impl From<TextColumn> for Column {
    fn from(c: TextColumn) -> Self {
        Column::Text(c)
    }
}

impl From<BooleanColumn> for Column {
    fn from(c: BooleanColumn) -> Self {
        Column::Boolean(c)
    }
}

impl From<DateColumn> for Column {
    fn from(c: DateColumn) -> Self {
        Column::Date(c)
    }
}

impl From<DateTimeColumn> for Column {
    fn from(c: DateTimeColumn) -> Self {
        Column::DateTime(c)
    }
}

impl From<DateTimeOffsetColumn> for Column {
    fn from(c: DateTimeOffsetColumn) -> Self {
        Column::DateTimeOffset(c)
    }
}
