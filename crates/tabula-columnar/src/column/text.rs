#![forbid(unsafe_code)]

use crate::error::{ColumnarError, ColumnarResult, StorageRejection};
use crate::selection::Selection;
use crate::stats::DistinctCounter;
use crate::types::{ColumnType, Value};
use ahash::AHashMap;
use std::sync::Arc;

/// Deduplicates repeated strings so equal cells share one allocation.
#[derive(Clone, Debug, Default)]
struct StringPool {
    set: AHashMap<Arc<str>, ()>,
}

impl StringPool {
    fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some((k, _)) = self.set.get_key_value(s) {
            return k.clone();
        }

        let arc: Arc<str> = Arc::<str>::from(s);
        self.set.insert(arc.clone(), ());
        arc
    }
}

/// A column of strings. The empty string is the missing value.
#[derive(Clone, Debug)]
pub struct TextColumn {
    name: String,
    values: Vec<Arc<str>>,
    pool: StringPool,
}

impl TextColumn {
    pub fn create(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            values: Vec::with_capacity(capacity),
            pool: StringPool::default(),
        }
    }

    pub fn from_values<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        let mut column = Self::create(name, values.len());
        for v in values {
            column.append(v.as_ref());
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
        ColumnType::Text
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn append(&mut self, value: &str) {
        let interned = self.pool.intern(value);
        self.values.push(interned);
    }

    pub fn append_missing(&mut self) {
        self.append("");
    }

    pub fn append_value(&mut self, value: &Value) -> ColumnarResult<()> {
        match value {
            Value::Missing => self.append_missing(),
            Value::Text(s) => self.append(s),
            other => {
                return Err(ColumnarError::incompatible(
                    &self.name,
                    StorageRejection::WrongKind {
                        expected: ColumnType::Text,
                        actual: other.kind(),
                    },
                ))
            }
        }
        Ok(())
    }

    /// Panics if `row` is out of bounds.
    pub fn get(&self, row: usize) -> &str {
        &self.values[row]
    }

    pub fn try_get(&self, row: usize) -> ColumnarResult<&str> {
        self.values
            .get(row)
            .map(|s| &**s)
            .ok_or_else(|| ColumnarError::row_out_of_range(row, self.len()))
    }

    pub fn set(&mut self, row: usize, value: &str) -> ColumnarResult<()> {
        if row >= self.len() {
            return Err(ColumnarError::row_out_of_range(row, self.len()));
        }
        self.values[row] = self.pool.intern(value);
        Ok(())
    }

    pub fn value(&self, row: usize) -> Value {
        let s = &self.values[row];
        if s.is_empty() {
            Value::Missing
        } else {
            Value::Text(s.clone())
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        self.values[row].is_empty()
    }

    pub fn count_missing(&self) -> usize {
        self.values.iter().filter(|s| s.is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|s| &**s)
    }

    /// Rows whose (present) value satisfies `predicate`.
    pub fn eval(&self, predicate: impl Fn(&str) -> bool) -> Selection {
        self.iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty() && predicate(*s))
            .map(|(row, _)| row)
            .collect()
    }

    pub fn is_in<S: AsRef<str>>(&self, values: &[S]) -> Selection {
        self.eval(|s| values.iter().any(|v| v.as_ref() == s))
    }

    /// Estimated count of distinct present values.
    pub fn count_unique(&self) -> u64 {
        let mut counter = DistinctCounter::new();
        for s in self.iter().filter(|s| !s.is_empty()) {
            counter.insert_str(s);
        }
        counter.estimate()
    }

    pub fn where_(&self, selection: &Selection) -> TextColumn {
        let mut out = self.empty_copy(selection.len());
        for row in selection.iter() {
            out.values.push(self.values[row].clone());
        }
        out
    }

    pub fn empty_copy(&self, capacity: usize) -> TextColumn {
        TextColumn {
            name: self.name.clone(),
            values: Vec::with_capacity(capacity),
            pool: self.pool.clone(),
        }
    }
}

impl PartialEq for TextColumn {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values
    }
}
