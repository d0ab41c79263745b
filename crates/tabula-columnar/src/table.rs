#![forbid(unsafe_code)]

use crate::column::{Column, NumberColumn};
use crate::error::{ColumnarError, ColumnarResult, IndexKind};
use crate::selection::Selection;
use crate::types::{ColumnType, Value};

/// An ordered list of equally sized, uniquely named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = Column>,
    ) -> ColumnarResult<Self> {
        let mut table = Self::new(name);
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append a column. Its name must be new and its length must match the existing row count
    /// (any length is accepted for the first column).
    pub fn add_column(&mut self, column: Column) -> ColumnarResult<()> {
        if self.position(column.name()).is_some() {
            return Err(ColumnarError::DuplicateColumn(column.name().to_owned()));
        }
        if let Some(first) = self.columns.first() {
            if column.len() != first.len() {
                return Err(ColumnarError::LengthMismatch {
                    column: column.name().to_owned(),
                    expected: first.len(),
                    actual: column.len(),
                });
            }
        }
        self.columns.push(column);
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> ColumnarResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ColumnarError::UnknownColumn(name.to_owned()))
    }

    pub fn column_mut(&mut self, name: &str) -> ColumnarResult<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| ColumnarError::UnknownColumn(name.to_owned()))
    }

    pub fn column_at(&self, index: usize) -> ColumnarResult<&Column> {
        self.columns
            .get(index)
            .ok_or(ColumnarError::IndexOutOfRange {
                kind: IndexKind::Column,
                index,
                len: self.columns.len(),
            })
    }

    pub fn number_column(&self, name: &str) -> ColumnarResult<&NumberColumn> {
        let column = self.column(name)?;
        column
            .as_number()
            .ok_or_else(|| ColumnarError::ColumnTypeMismatch {
                column: name.to_owned(),
                expected: "numeric",
                actual: column.column_type(),
            })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(Column::column_type).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn check_cell(&self, row: usize, col: usize) -> ColumnarResult<&Column> {
        let column = self.column_at(col)?;
        if row >= column.len() {
            return Err(ColumnarError::row_out_of_range(row, column.len()));
        }
        Ok(column)
    }

    pub fn is_missing(&self, row: usize, col: usize) -> ColumnarResult<bool> {
        Ok(self.check_cell(row, col)?.is_missing(row))
    }

    pub fn value(&self, row: usize, col: usize) -> ColumnarResult<Value> {
        Ok(self.check_cell(row, col)?.value(row))
    }

    /// A new table with only the selected rows, in ascending order.
    pub fn where_(&self, selection: &Selection) -> ColumnarResult<Table> {
        if let Some(max) = selection.max() {
            if max >= self.row_count() {
                return Err(ColumnarError::row_out_of_range(max, self.row_count()));
            }
        }
        Ok(Table {
            name: self.name.clone(),
            columns: self.columns.iter().map(|c| c.where_(selection)).collect(),
        })
    }

    pub fn remove_columns<S: AsRef<str>>(&mut self, names: &[S]) -> ColumnarResult<()> {
        for name in names {
            if self.position(name.as_ref()).is_none() {
                return Err(ColumnarError::UnknownColumn(name.as_ref().to_owned()));
            }
        }
        self.columns
            .retain(|c| !names.iter().any(|n| n.as_ref() == c.name()));
        Ok(())
    }

    /// Drop every column whose values are all missing and return the dropped names.
    pub fn remove_columns_with_all_missing(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        self.columns.retain(|c| {
            let drop = c.all_missing();
            if drop {
                removed.push(c.name().to_owned());
            }
            !drop
        });
        removed
    }
}
