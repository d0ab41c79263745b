#![forbid(unsafe_code)]

use super::storage::{CompactStorage, FloatStorage, NumericStorage, Representation};
use crate::error::{ColumnarError, ColumnarResult, StorageRejection};
use crate::selection::Selection;
use crate::stats::{ColumnStats, StatsAccumulator};
use crate::types::{
    is_missing_f64, missing_f64, ColumnType, Value, MAX_EXACT_LONG, MISSING_I16, MISSING_I32,
};
use ahash::AHashSet;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A named column of numbers, read and written as `f64`.
///
/// The values live in one of two physical stores (see [`Representation`]), fixed when the column
/// is created. Missing entries are encoded as the store's reserved sentinel; [`Self::get`] maps
/// them to [`missing_f64`], and [`Self::is_missing`] is the single place that check happens.
#[derive(Clone, Debug)]
pub struct NumberColumn {
    name: String,
    column_type: ColumnType,
    storage: Box<dyn NumericStorage>,
}

impl NumberColumn {
    /// Empty float-backed `DOUBLE` column.
    pub fn create(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_type(name, ColumnType::Double, false, capacity)
    }

    /// Empty compact-integer-backed `INTEGER` column.
    pub fn create_compact(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_type(name, ColumnType::Integer, true, capacity)
    }

    /// Empty column of a numeric `column_type` with an explicit backing choice.
    pub fn with_type(
        name: impl Into<String>,
        column_type: ColumnType,
        compact: bool,
        capacity: usize,
    ) -> Self {
        debug_assert!(column_type.is_numeric(), "{column_type} is not numeric");
        let storage: Box<dyn NumericStorage> = if compact {
            Box::new(CompactStorage::with_capacity(capacity))
        } else {
            Box::new(FloatStorage::with_capacity(capacity))
        };
        Self {
            name: name.into(),
            column_type,
            storage,
        }
    }

    /// Float-backed column holding `values` verbatim.
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        let mut column = Self::create(name, values.len());
        for v in values {
            column.push_unchecked(*v);
        }
        column
    }

    /// `size` consecutive integers starting at `start`, compact-backed.
    pub fn index_column(name: impl Into<String>, size: usize, start: i32) -> ColumnarResult<Self> {
        let mut column = Self::create_compact(name, size);
        for i in 0..size {
            column.append_i64(start as i64 + i as i64)?;
        }
        Ok(column)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn representation(&self) -> Representation {
        self.storage.representation()
    }

    pub fn is_compact(&self) -> bool {
        self.representation() == Representation::CompactInt
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.storage.size_bytes()
    }

    fn reject(&self, reason: StorageRejection) -> ColumnarError {
        ColumnarError::incompatible(&self.name, reason)
    }

    fn check_row(&self, row: usize) -> ColumnarResult<()> {
        if row >= self.len() {
            return Err(ColumnarError::row_out_of_range(row, self.len()));
        }
        Ok(())
    }

    // Float-backed only; the float store accepts every value.
    fn push_unchecked(&mut self, value: f64) {
        let _ = self.storage.push_f64(value);
    }

    /// Whether `value` belongs to this column's logical type. Integer types take integral values
    /// within [`ColumnType::integer_range`]; `FLOAT` takes values within `f32` range.
    fn check_f64(&self, value: f64) -> Result<(), StorageRejection> {
        if is_missing_f64(value) {
            return Ok(());
        }
        match self.column_type.integer_range() {
            Some((min, max)) => {
                if !value.is_finite() || value.fract() != 0.0 {
                    Err(StorageRejection::NonIntegral(value))
                } else if value < min as f64 || value > max as f64 {
                    Err(StorageRejection::OutOfRange(value))
                } else {
                    Ok(())
                }
            }
            None if self.column_type == ColumnType::Float
                && value.is_finite()
                && value.abs() > f32::MAX as f64 =>
            {
                Err(StorageRejection::OutOfRange(value))
            }
            None => Ok(()),
        }
    }

    /// Integer counterpart of [`Self::check_f64`]. Float types take integers they hold exactly.
    fn check_i64(&self, value: i64) -> Result<(), StorageRejection> {
        let sentinel = match self.column_type {
            ColumnType::Short => Some(MISSING_I16 as i64),
            ColumnType::Integer => Some(MISSING_I32 as i64),
            _ => None,
        };
        if sentinel == Some(value) {
            return Err(StorageRejection::ReservedSentinel(value));
        }
        let (min, max) = match self.column_type.integer_range() {
            Some(range) => range,
            None if self.column_type == ColumnType::Float => (-(1 << 24), 1 << 24),
            None => (-MAX_EXACT_LONG, MAX_EXACT_LONG),
        };
        if value < min || value > max {
            return Err(StorageRejection::OutOfRange(value as f64));
        }
        Ok(())
    }

    /// Append a value. It must belong to the column's type (integral and in range for the
    /// integer types) or be the missing indicator; anything else fails with
    /// [`ColumnarError::IncompatibleType`] and leaves the column unchanged.
    pub fn append(&mut self, value: f64) -> ColumnarResult<()> {
        self.check_f64(value)
            .and_then(|()| self.storage.push_f64(value))
            .map_err(|r| self.reject(r))
    }

    pub fn append_i32(&mut self, value: i32) -> ColumnarResult<()> {
        self.append_i64(value as i64)
    }

    pub fn append_i64(&mut self, value: i64) -> ColumnarResult<()> {
        self.check_i64(value)
            .and_then(|()| self.storage.push_i64(value))
            .map_err(|r| self.reject(r))
    }

    pub fn append_missing(&mut self) {
        self.storage.push_missing();
    }

    /// Append a parsed cell value. `Missing` appends the sentinel; only numeric values are
    /// accepted.
    pub fn append_value(&mut self, value: &Value) -> ColumnarResult<()> {
        match value {
            Value::Missing => {
                self.append_missing();
                Ok(())
            }
            Value::Integer(v) => self.append_i64(*v),
            Value::Number(v) => self.append(*v),
            other => Err(self.reject(StorageRejection::WrongKind {
                expected: self.column_type,
                actual: other.kind(),
            })),
        }
    }

    /// Value at `row`, or the missing indicator.
    ///
    /// Panics if `row` is out of bounds; see [`Self::try_get`].
    pub fn get(&self, row: usize) -> f64 {
        self.storage.get(row)
    }

    pub fn try_get(&self, row: usize) -> ColumnarResult<f64> {
        self.check_row(row)?;
        Ok(self.storage.get(row))
    }

    pub fn value(&self, row: usize) -> Value {
        let v = self.get(row);
        if is_missing_f64(v) {
            Value::Missing
        } else {
            Value::Number(v)
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        is_missing_f64(self.get(row))
    }

    pub fn count_missing(&self) -> usize {
        (0..self.len()).filter(|&r| self.is_missing(r)).count()
    }

    pub fn first(&self) -> f64 {
        if self.is_empty() {
            missing_f64()
        } else {
            self.get(0)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |r| self.storage.get(r))
    }

    pub fn as_f64_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Replace the value at `row`, with the same compatibility rule as [`Self::append`].
    pub fn set(&mut self, row: usize, value: f64) -> ColumnarResult<()> {
        self.check_row(row)?;
        self.check_f64(value)
            .and_then(|()| self.storage.set_f64(row, value))
            .map_err(|r| self.reject(r))
    }

    pub fn set_missing(&mut self, row: usize) -> ColumnarResult<()> {
        self.set(row, missing_f64())
    }

    /// Set every selected row to `value`, in ascending row order.
    ///
    /// ```
    /// # use tabula_columnar::NumberColumn;
    /// let mut c = NumberColumn::from_values("x", &[1.0, tabula_columnar::missing_f64(), 3.0]);
    /// let missing = c.is_missing_selection();
    /// c.set_where(&missing, 0.0).unwrap();
    /// assert_eq!(c.as_f64_vec(), vec![1.0, 0.0, 3.0]);
    /// ```
    pub fn set_where(&mut self, selection: &Selection, value: f64) -> ColumnarResult<()> {
        for row in selection.iter() {
            self.set(row, value)?;
        }
        Ok(())
    }

    pub fn sort_ascending(&mut self) {
        self.storage.sort_ascending();
    }

    pub fn sort_descending(&mut self) {
        self.storage.sort_descending();
    }

    /// The largest `n` values, largest first.
    ///
    /// Missing entries are not filtered: on a float-backed column the missing pattern sorts
    /// above every real value, so it can appear here.
    pub fn top(&self, n: usize) -> Vec<f64> {
        let mut sorted = self.storage.sorted_copy(true);
        sorted.truncate(n);
        sorted
    }

    /// The smallest `n` values, smallest first.
    ///
    /// Missing entries are not filtered: on a compact column the sentinel (`i32::MIN`) sorts
    /// below every real value, so it can appear here.
    pub fn bottom(&self, n: usize) -> Vec<f64> {
        let mut sorted = self.storage.sorted_copy(false);
        sorted.truncate(n);
        sorted
    }

    /// Distinct present values, in no particular order, as a float-backed column.
    pub fn unique(&self) -> NumberColumn {
        let mut seen: AHashSet<u64> = AHashSet::new();
        let mut out = NumberColumn::with_type(
            format!("{} unique", self.name),
            self.column_type,
            false,
            0,
        );
        for v in self.iter().filter(|v| !is_missing_f64(*v)) {
            let key = if v == 0.0 { 0.0f64 } else { v };
            if seen.insert(key.to_bits()) {
                out.push_unchecked(v);
            }
        }
        out
    }

    pub fn count_unique(&self) -> usize {
        self.unique().len()
    }

    /// Rows for which `predicate` holds on the stored value (missing rows see the indicator).
    pub fn eval(&self, predicate: impl Fn(f64) -> bool) -> Selection {
        let mut selection = Selection::new();
        for (row, v) in self.iter().enumerate() {
            if predicate(v) {
                selection.add(row);
            }
        }
        selection
    }

    /// Rows for which `predicate(self[row], other[row])` holds.
    pub fn eval_column(
        &self,
        other: &NumberColumn,
        predicate: impl Fn(f64, f64) -> bool,
    ) -> ColumnarResult<Selection> {
        if other.len() != self.len() {
            return Err(ColumnarError::LengthMismatch {
                column: other.name.clone(),
                expected: self.len(),
                actual: other.len(),
            });
        }
        let mut selection = Selection::new();
        for (row, (a, b)) in self.iter().zip(other.iter()).enumerate() {
            if predicate(a, b) {
                selection.add(row);
            }
        }
        Ok(selection)
    }

    /// Rows for which `predicate(self[row], value)` holds.
    pub fn eval_scalar(&self, value: f64, predicate: impl Fn(f64, f64) -> bool) -> Selection {
        self.eval(|v| predicate(v, value))
    }

    /// Rows for which `predicate(self[row], start, end)` holds.
    pub fn eval_range(
        &self,
        start: f64,
        end: f64,
        predicate: impl Fn(f64, f64, f64) -> bool,
    ) -> Selection {
        self.eval(|v| predicate(v, start, end))
    }

    pub fn is_missing_selection(&self) -> Selection {
        self.eval(is_missing_f64)
    }

    pub fn is_not_missing_selection(&self) -> Selection {
        self.eval(|v| !is_missing_f64(v))
    }

    /// Rows whose value is in `values`.
    ///
    /// Present values are looked up in an ordered set where every NaN is one value and
    /// `-0.0 == 0.0`. Missing rows match only when `values` holds the missing indicator itself.
    pub fn is_in(&self, values: &[f64]) -> Selection {
        let lookup = Lookup::new(values);
        self.eval(|v| lookup.contains(v))
    }

    pub fn is_not_in(&self, values: &[f64]) -> Selection {
        let mut selection = Selection::with_range(0..self.len());
        selection.and_not_inplace(&self.is_in(values));
        selection
    }

    /// Whether any row holds `value`, under the same matching rule as [`Self::is_in`].
    pub fn contains(&self, value: f64) -> bool {
        let lookup = Lookup::new(&[value]);
        self.iter().any(|v| lookup.contains(v))
    }

    /// Shift values down by `n` rows (up for negative `n`), filling vacated rows with missing.
    /// The result keeps this column's type and representation.
    pub fn lag(&self, n: isize) -> NumberColumn {
        let len = self.len();
        let mut out = self.empty_copy(len);
        out.name = format!("{} lag({n})", self.name);
        for row in 0..len {
            let src = row as isize - n;
            if src >= 0 && (src as usize) < len {
                let v = self.storage.get(src as usize);
                // Values came out of a store of the same representation.
                let _ = out.storage.push_f64(v);
            } else {
                out.storage.push_missing();
            }
        }
        out
    }

    pub fn lead(&self, n: isize) -> NumberColumn {
        let mut out = self.lag(-n);
        out.name = format!("{} lead({n})", self.name);
        out
    }

    /// Overwrite rows in order with values from `source`; stops early when it runs dry.
    pub fn fill_with<I: IntoIterator<Item = f64>>(&mut self, source: I) -> ColumnarResult<()> {
        let mut source = source.into_iter();
        for row in 0..self.len() {
            let Some(v) = source.next() else {
                break;
            };
            self.set(row, v)?;
        }
        Ok(())
    }

    /// Overwrite every row, restarting `values` from the beginning whenever it is exhausted.
    /// An empty `values` leaves the column untouched.
    pub fn fill_with_cycle(&mut self, values: &[f64]) -> ColumnarResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.fill_with(values.iter().copied().cycle())
    }

    /// Overwrite rows in order with values produced by `supplier`. Filling halts at the first
    /// `Err`; rows already filled keep their new values.
    pub fn fill_with_fn<E>(
        &mut self,
        mut supplier: impl FnMut() -> Result<f64, E>,
    ) -> ColumnarResult<()> {
        for row in 0..self.len() {
            match supplier() {
                Ok(v) => self.set(row, v)?,
                Err(_) => break,
            }
        }
        Ok(())
    }

    /// Apply `f` to every present value; missing rows stay missing. The result is float-backed.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> NumberColumn {
        let mut out = NumberColumn::create(self.name.clone(), self.len());
        for v in self.iter() {
            out.push_unchecked(if is_missing_f64(v) { v } else { f(v) });
        }
        out
    }

    fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().filter(|v| !is_missing_f64(*v))
    }

    /// Fold over present values.
    pub fn fold<A>(&self, init: A, f: impl Fn(A, f64) -> A) -> A {
        self.present().fold(init, f)
    }

    /// Combine present values pairwise with `op`; `None` when nothing is present.
    pub fn reduce(&self, op: impl Fn(f64, f64) -> f64) -> Option<f64> {
        self.present().reduce(op)
    }

    /// Smallest present value under `compare`; the first one wins ties.
    pub fn min_by(&self, compare: impl Fn(&f64, &f64) -> Ordering) -> Option<f64> {
        self.present().reduce(|a, b| if compare(&b, &a).is_lt() { b } else { a })
    }

    /// Largest present value under `compare`; the first one wins ties.
    pub fn max_by(&self, compare: impl Fn(&f64, &f64) -> Ordering) -> Option<f64> {
        self.present().reduce(|a, b| if compare(&b, &a).is_gt() { b } else { a })
    }

    /// Number of rows satisfying `predicate` (missing rows see the indicator, as in
    /// [`Self::eval`]).
    pub fn count(&self, predicate: impl Fn(f64) -> bool) -> usize {
        self.count_at_most(predicate, usize::MAX)
    }

    /// Like [`Self::count`], but stops scanning once `max` matches are found.
    pub fn count_at_most(&self, predicate: impl Fn(f64) -> bool, max: usize) -> usize {
        self.iter().filter(|v| predicate(*v)).take(max).count()
    }

    pub fn all_match(&self, predicate: impl Fn(f64) -> bool) -> bool {
        self.count_at_most(|v| !predicate(v), 1) == 0
    }

    pub fn any_match(&self, predicate: impl Fn(f64) -> bool) -> bool {
        self.count_at_most(predicate, 1) > 0
    }

    pub fn none_match(&self, predicate: impl Fn(f64) -> bool) -> bool {
        !self.any_match(predicate)
    }

    /// The rows satisfying `predicate`, same type and representation.
    pub fn filter(&self, predicate: impl Fn(f64) -> bool) -> NumberColumn {
        self.where_(&self.eval(predicate))
    }

    /// Append every row of `other`. Each value must fit this column as in [`Self::append`]; on
    /// failure nothing is appended.
    pub fn append_column(&mut self, other: &NumberColumn) -> ColumnarResult<()> {
        let mut storage = self.storage.clone();
        for v in other.iter() {
            self.check_f64(v)
                .and_then(|()| storage.push_f64(v))
                .map_err(|r| self.reject(r))?;
        }
        self.storage = storage;
        Ok(())
    }

    /// A deep copy with the same name, type and representation.
    pub fn copy(&self) -> NumberColumn {
        self.clone()
    }

    /// Remove every row, keeping name, type and representation.
    pub fn clear(&mut self) {
        self.storage = self.storage.empty_like(0);
    }

    pub fn summary(&self) -> ColumnStats {
        let mut acc = StatsAccumulator::new(self.column_type);
        for v in self.iter() {
            if is_missing_f64(v) {
                acc.push_missing();
            } else {
                acc.push(v);
            }
        }
        acc.finish()
    }

    /// Column without its missing rows, same representation.
    pub fn remove_missing(&self) -> NumberColumn {
        self.where_(&self.is_not_missing_selection())
    }

    /// The selected rows, in ascending order, same type and representation.
    pub fn where_(&self, selection: &Selection) -> NumberColumn {
        let mut out = self.empty_copy(selection.len());
        for row in selection.iter() {
            let _ = out.storage.push_f64(self.storage.get(row));
        }
        out
    }

    pub fn empty_copy(&self, capacity: usize) -> NumberColumn {
        NumberColumn {
            name: self.name.clone(),
            column_type: self.column_type,
            storage: self.storage.empty_like(capacity),
        }
    }
}

/// Value set behind [`NumberColumn::is_in`] and [`NumberColumn::contains`].
struct Lookup {
    present: BTreeSet<OrderedFloat<f64>>,
    missing: bool,
}

impl Lookup {
    fn new(values: &[f64]) -> Self {
        let (missing, present): (Vec<f64>, Vec<f64>) =
            values.iter().copied().partition(|v| is_missing_f64(*v));
        Self {
            present: present.into_iter().map(OrderedFloat).collect(),
            missing: !missing.is_empty(),
        }
    }

    fn contains(&self, value: f64) -> bool {
        if is_missing_f64(value) {
            self.missing
        } else {
            self.present.contains(&OrderedFloat(value))
        }
    }
}

impl PartialEq for NumberColumn {
    /// Same name, type and values (compared bitwise so missing equals missing).
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.column_type == other.column_type
            && self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compact(values: &[i64]) -> NumberColumn {
        let mut c = NumberColumn::create_compact("c", values.len());
        for v in values {
            c.append_i64(*v).unwrap();
        }
        c
    }

    #[test]
    fn compact_append_rejects_fractional_values() {
        let mut c = NumberColumn::create_compact("ints", 4);
        c.append(3.0).unwrap();
        let err = c.append(3.5).unwrap_err();
        assert!(matches!(
            err,
            ColumnarError::IncompatibleType { ref column, reason: StorageRejection::NonIntegral(v) }
                if column == "ints" && v == 3.5
        ));
        c.append(missing_f64()).unwrap();
        assert_eq!(c.len(), 2);
        assert!(c.is_missing(1));
        assert_eq!(c.get(0), 3.0);
    }

    #[test]
    fn set_on_compact_checks_integrality_and_bounds() {
        let mut c = compact(&[1, 2]);
        assert!(c.set(0, 2.25).is_err());
        assert_eq!(
            c.set(5, 1.0),
            Err(ColumnarError::IndexOutOfRange {
                kind: crate::IndexKind::Row,
                index: 5,
                len: 2
            })
        );
        c.set(1, 10.0).unwrap();
        assert_eq!(c.as_f64_vec(), vec![1.0, 10.0]);
    }

    #[test]
    fn set_where_replaces_missing() {
        let mut c = compact(&[1, 2, 3]);
        c.set_missing(1).unwrap();
        let missing = c.is_missing_selection();
        assert_eq!(missing.to_vec(), vec![1]);
        c.set_where(&missing, 0.0).unwrap();
        assert_eq!(c.as_f64_vec(), vec![1.0, 0.0, 3.0]);
        assert_eq!(c.count_missing(), 0);
    }

    #[test]
    fn top_and_bottom_keep_missing_entries() {
        let mut f = NumberColumn::from_values("f", &[1.0, 5.0, 3.0]);
        f.append_missing();
        let top = f.top(2);
        assert!(is_missing_f64(top[0]), "missing sorts first in descending float order");
        assert_eq!(top[1], 5.0);
        let bottom = f.bottom(10);
        assert_eq!(&bottom[..3], &[1.0, 3.0, 5.0]);
        assert!(is_missing_f64(bottom[3]));

        let mut c = compact(&[4, 2]);
        c.append_missing();
        assert!(is_missing_f64(c.bottom(1)[0]), "compact sentinel sorts lowest");
        assert_eq!(c.top(5).len(), 3);
    }

    #[test]
    fn unique_skips_missing() {
        let mut c = NumberColumn::from_values("u", &[2.0, 1.0, 2.0, -0.0, 0.0]);
        c.append_missing();
        let mut values = c.unique().as_f64_vec();
        values.sort_by(f64::total_cmp);
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], -0.0);
        assert_eq!(&values[1..], &[1.0, 2.0]);
    }

    #[test]
    fn eval_family() {
        let a = NumberColumn::from_values("a", &[1.0, 4.0, 2.0, 8.0]);
        let b = NumberColumn::from_values("b", &[2.0, 3.0, 2.0, 9.0]);
        assert_eq!(a.eval(|v| v > 2.0).to_vec(), vec![1, 3]);
        assert_eq!(a.eval_scalar(2.0, |v, x| v == x).to_vec(), vec![2]);
        assert_eq!(
            a.eval_range(1.5, 4.0, |v, lo, hi| v >= lo && v <= hi).to_vec(),
            vec![1, 2]
        );
        assert_eq!(a.eval_column(&b, |x, y| x < y).unwrap().to_vec(), vec![0, 3]);

        let short = NumberColumn::from_values("s", &[1.0]);
        assert!(matches!(
            a.eval_column(&short, |x, y| x < y),
            Err(ColumnarError::LengthMismatch { expected: 4, actual: 1, .. })
        ));
    }

    #[test]
    fn membership() {
        let c = compact(&[1, 2, 3, 2]);
        assert_eq!(c.is_in(&[2.0, 7.0]).to_vec(), vec![1, 3]);
        assert_eq!(c.is_not_in(&[2.0, 7.0]).to_vec(), vec![0, 2]);
        assert!(c.contains(3.0));
        assert!(!c.contains(3.5));
    }

    #[test]
    fn nan_lookups_do_not_match_missing_rows() {
        let mut c = NumberColumn::from_values("n", &[1.0, f64::NAN]);
        c.append_missing();
        assert_eq!(c.is_in(&[f64::NAN]).to_vec(), vec![1]);
        assert_eq!(c.is_not_in(&[f64::NAN]).to_vec(), vec![0, 2]);
        assert_eq!(c.is_in(&[missing_f64()]).to_vec(), vec![2]);
        assert!(c.contains(missing_f64()));

        let plain = NumberColumn::from_values("p", &[1.0, missing_f64()]);
        assert!(plain.is_in(&[f64::NAN]).is_empty());
        assert!(!plain.contains(f64::NAN));
        assert!(NumberColumn::from_values("z", &[0.0]).contains(-0.0));
    }

    #[test]
    fn logical_type_bounds_every_write() {
        let mut long = NumberColumn::with_type("l", ColumnType::Long, false, 0);
        assert_eq!(
            long.append(2.5),
            Err(ColumnarError::IncompatibleType {
                column: "l".to_owned(),
                reason: StorageRejection::NonIntegral(2.5),
            })
        );
        long.append(4.0).unwrap();
        assert!(long.set(0, 4.5).is_err());
        assert!(long.append(f64::INFINITY).is_err());

        let mut short = NumberColumn::with_type("s", ColumnType::Short, true, 0);
        assert_eq!(
            short.append(100_000.0),
            Err(ColumnarError::IncompatibleType {
                column: "s".to_owned(),
                reason: StorageRejection::OutOfRange(100_000.0),
            })
        );
        assert!(short.append_i64(40_000).is_err());
        assert_eq!(
            short.append_i64(i16::MIN as i64),
            Err(ColumnarError::IncompatibleType {
                column: "s".to_owned(),
                reason: StorageRejection::ReservedSentinel(i16::MIN as i64),
            })
        );
        short.append_i64(-32_767).unwrap();

        let mut int = NumberColumn::with_type("i", ColumnType::Integer, false, 0);
        assert!(int.append(0.5).is_err());
        assert!(int.append(3e9).is_err());
        int.append(-3.0).unwrap();
        int.append_missing();

        let mut float = NumberColumn::with_type("f", ColumnType::Float, false, 0);
        assert!(float.append(1e300).is_err());
        float.append(0.25).unwrap();

        assert_eq!((long.len(), short.len(), int.len(), float.len()), (1, 1, 2, 1));
        assert_eq!(int.get(0), -3.0);
    }

    #[test]
    fn long_values_stay_exact() {
        let mut c = NumberColumn::with_type("id", ColumnType::Long, false, 0);
        c.append_i64(MAX_EXACT_LONG).unwrap();
        c.append_i64(-MAX_EXACT_LONG).unwrap();
        assert_eq!(c.get(0) as i64, MAX_EXACT_LONG);
        assert_eq!(c.get(1) as i64, -MAX_EXACT_LONG);
        assert_eq!(
            c.append_i64(MAX_EXACT_LONG + 1),
            Err(ColumnarError::IncompatibleType {
                column: "id".to_owned(),
                reason: StorageRejection::OutOfRange((MAX_EXACT_LONG + 1) as f64),
            })
        );
        assert!(c.append_i64(i64::MIN).is_err());
        assert!(c.append_value(&Value::Integer(i64::MAX)).is_err());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn predicates_and_reductions() {
        let mut c = NumberColumn::from_values("v", &[3.0, -1.0, 4.0, 1.0, 5.0]);
        c.append_missing();

        assert_eq!(c.count(|v| v > 0.0), 4);
        assert_eq!(c.count_at_most(|v| v > 0.0, 2), 2);
        assert_eq!(c.count(is_missing_f64), 1);
        assert!(c.any_match(|v| v == 4.0));
        assert!(c.none_match(|v| v > 10.0));
        assert!(!c.all_match(|v| v > 0.0));
        assert!(c.remove_missing().all_match(|v| v.abs() >= 1.0));

        let positive = c.filter(|v| v > 1.0);
        assert_eq!(positive.name(), "v");
        assert_eq!(positive.as_f64_vec(), vec![3.0, 4.0, 5.0]);

        assert_eq!(c.min_by(f64::total_cmp), Some(-1.0));
        assert_eq!(c.max_by(f64::total_cmp), Some(5.0));
        assert_eq!(c.max_by(|a, b| a.abs().total_cmp(&b.abs()).reverse()), Some(-1.0));
        assert_eq!(c.reduce(|a, b| a + b), Some(12.0));
        assert_eq!(c.reduce(f64::max), Some(5.0));

        let empty = NumberColumn::create("e", 0);
        assert_eq!(empty.reduce(|a, b| a + b), None);
        assert_eq!(empty.min_by(f64::total_cmp), None);
        assert!(empty.all_match(|_| false));
    }

    #[test]
    fn append_column_copy_and_clear() {
        let mut ints = compact(&[1, 2]);
        let mut more = NumberColumn::from_values("m", &[3.0, 4.0]);
        more.append_missing();
        ints.append_column(&more).unwrap();
        assert_eq!(ints.len(), 5);
        assert!(ints.is_compact());
        assert!(ints.is_missing(4));

        let fractional = NumberColumn::from_values("x", &[5.0, 5.5]);
        assert!(ints.append_column(&fractional).is_err());
        assert_eq!(ints.len(), 5);

        let copy = ints.copy();
        ints.clear();
        assert!(ints.is_empty());
        assert!(ints.is_compact());
        assert_eq!(copy.len(), 5);
        assert_eq!(copy.name(), "c");
    }

    #[test]
    fn lag_and_lead_fill_with_missing() {
        let c = compact(&[1, 2, 3, 4]);
        let lag = c.lag(1);
        assert_eq!(lag.name(), "c lag(1)");
        assert!(lag.is_compact());
        assert!(lag.is_missing(0));
        assert_eq!(&lag.as_f64_vec()[1..], &[1.0, 2.0, 3.0]);

        let lead = c.lead(2);
        assert_eq!(lead.name(), "c lead(2)");
        assert_eq!(&lead.as_f64_vec()[..2], &[3.0, 4.0]);
        assert!(lead.is_missing(2) && lead.is_missing(3));

        let all_gone = c.lag(10);
        assert_eq!(all_gone.count_missing(), 4);
    }

    #[test]
    fn fill_sources() {
        let mut c = NumberColumn::create("f", 5);
        for _ in 0..5 {
            c.append_missing();
        }

        c.fill_with([1.0, 2.0]).unwrap();
        assert_eq!(&c.as_f64_vec()[..2], &[1.0, 2.0]);
        assert!(c.is_missing(2));

        c.fill_with_cycle(&[7.0, 8.0]).unwrap();
        assert_eq!(c.as_f64_vec(), vec![7.0, 8.0, 7.0, 8.0, 7.0]);

        let mut calls = 0;
        c.fill_with_fn(|| {
            calls += 1;
            if calls <= 2 {
                Ok(calls as f64 * 100.0)
            } else {
                Err("exhausted")
            }
        })
        .unwrap();
        assert_eq!(c.as_f64_vec(), vec![100.0, 200.0, 7.0, 8.0, 7.0]);

        let mut ints = compact(&[0, 0]);
        assert!(ints.fill_with([1.0, 1.5]).is_err());
        assert_eq!(ints.get(0), 1.0);
    }

    #[test]
    fn map_reduce_and_summary() {
        let mut c = compact(&[1, 2, 3]);
        c.append_missing();
        let doubled = c.map(|v| v * 2.0);
        assert!(!doubled.is_compact());
        assert!(doubled.is_missing(3));
        assert_eq!(&doubled.as_f64_vec()[..3], &[2.0, 4.0, 6.0]);

        assert_eq!(c.fold(0.0, |acc, v| acc + v), 6.0);
        let stats = c.summary();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.missing_count, 1);
        assert_eq!(stats.mean, Some(2.0));
    }

    #[test]
    fn where_keeps_representation() {
        let c = compact(&[10, 20, 30, 40]);
        let sel: Selection = [0, 2].into_iter().collect();
        let sub = c.where_(&sel);
        assert!(sub.is_compact());
        assert_eq!(sub.as_f64_vec(), vec![10.0, 30.0]);
        assert_eq!(c.remove_missing(), c);
    }

    #[test]
    fn append_value_rejects_wrong_kind() {
        let mut c = NumberColumn::create("n", 1);
        let err = c.append_value(&Value::Boolean(true)).unwrap_err();
        assert!(matches!(
            err,
            ColumnarError::IncompatibleType {
                reason: StorageRejection::WrongKind { actual: "boolean", .. },
                ..
            }
        ));
    }

    #[test]
    fn index_column_counts_up() {
        let c = NumberColumn::index_column("id", 3, 5).unwrap();
        assert!(c.is_compact());
        assert_eq!(c.as_f64_vec(), vec![5.0, 6.0, 7.0]);
    }
}
