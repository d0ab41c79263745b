#![forbid(unsafe_code)]

//! Physical backings for [`super::NumberColumn`].
//!
//! A numeric column is backed by exactly one of two stores, chosen at construction:
//! - [`CompactStorage`]: `i32` values, `i32::MIN` reserved as the missing sentinel.
//! - [`FloatStorage`]: `f64` values, [`crate::MISSING_F64_BITS`] reserved as the missing sentinel.
//!
//! Both answer to the same `f64`-valued interface. A store only refuses what it physically cannot
//! hold; the logical type's range is checked by the owning column before a value gets here.

use crate::error::StorageRejection;
use crate::types::{is_missing_f64, missing_f64, MISSING_I32};
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    CompactInt,
    Float,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Representation::CompactInt => "compact-int",
            Representation::Float => "float",
        })
    }
}

pub trait NumericStorage: fmt::Debug + Send + Sync {
    fn representation(&self) -> Representation;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row` widened to `f64`; the reserved pattern maps to [`missing_f64`].
    ///
    /// Panics if `row` is out of bounds.
    fn get(&self, row: usize) -> f64;

    fn push_f64(&mut self, value: f64) -> Result<(), StorageRejection>;

    fn push_i64(&mut self, value: i64) -> Result<(), StorageRejection>;

    fn push_missing(&mut self);

    /// Panics if `row` is out of bounds.
    fn set_f64(&mut self, row: usize, value: f64) -> Result<(), StorageRejection>;

    fn sort_ascending(&mut self);

    fn sort_descending(&mut self);

    /// A sorted copy of the backing values, widened to `f64`. The backing array is untouched.
    fn sorted_copy(&self, descending: bool) -> Vec<f64>;

    /// Same representation, no values.
    fn empty_like(&self, capacity: usize) -> Box<dyn NumericStorage>;

    fn clone_box(&self) -> Box<dyn NumericStorage>;

    /// Approximate in-memory size of the values.
    fn size_bytes(&self) -> usize;
}

impl Clone for Box<dyn NumericStorage> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompactStorage {
    values: Vec<i32>,
}

impl CompactStorage {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    fn encode_f64(value: f64) -> Result<i32, StorageRejection> {
        if is_missing_f64(value) {
            return Ok(MISSING_I32);
        }
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(StorageRejection::NonIntegral(value));
        }
        if value <= MISSING_I32 as f64 || value > i32::MAX as f64 {
            return Err(StorageRejection::OutOfRange(value));
        }
        Ok(value as i32)
    }

    fn encode_i64(value: i64) -> Result<i32, StorageRejection> {
        if value == MISSING_I32 as i64 {
            return Err(StorageRejection::ReservedSentinel(value));
        }
        i32::try_from(value).map_err(|_| StorageRejection::OutOfRange(value as f64))
    }

    #[inline]
    fn widen(raw: i32) -> f64 {
        if raw == MISSING_I32 {
            missing_f64()
        } else {
            raw as f64
        }
    }
}

impl NumericStorage for CompactStorage {
    fn representation(&self) -> Representation {
        Representation::CompactInt
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn get(&self, row: usize) -> f64 {
        Self::widen(self.values[row])
    }

    fn push_f64(&mut self, value: f64) -> Result<(), StorageRejection> {
        self.values.push(Self::encode_f64(value)?);
        Ok(())
    }

    fn push_i64(&mut self, value: i64) -> Result<(), StorageRejection> {
        self.values.push(Self::encode_i64(value)?);
        Ok(())
    }

    fn push_missing(&mut self) {
        self.values.push(MISSING_I32);
    }

    fn set_f64(&mut self, row: usize, value: f64) -> Result<(), StorageRejection> {
        self.values[row] = Self::encode_f64(value)?;
        Ok(())
    }

    fn sort_ascending(&mut self) {
        sort_by(&mut self.values, |a, b| a.cmp(b));
    }

    fn sort_descending(&mut self) {
        sort_by(&mut self.values, |a, b| b.cmp(a));
    }

    fn sorted_copy(&self, descending: bool) -> Vec<f64> {
        let mut copy = self.values.clone();
        if descending {
            sort_by(&mut copy, |a, b| b.cmp(a));
        } else {
            sort_by(&mut copy, |a, b| a.cmp(b));
        }
        copy.into_iter().map(Self::widen).collect()
    }

    fn empty_like(&self, capacity: usize) -> Box<dyn NumericStorage> {
        Box::new(Self::with_capacity(capacity))
    }

    fn clone_box(&self) -> Box<dyn NumericStorage> {
        Box::new(self.clone())
    }

    fn size_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<i32>()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloatStorage {
    values: Vec<f64>,
}

impl FloatStorage {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }
}

impl NumericStorage for FloatStorage {
    fn representation(&self) -> Representation {
        Representation::Float
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn get(&self, row: usize) -> f64 {
        self.values[row]
    }

    fn push_f64(&mut self, value: f64) -> Result<(), StorageRejection> {
        self.values.push(value);
        Ok(())
    }

    fn push_i64(&mut self, value: i64) -> Result<(), StorageRejection> {
        self.values.push(value as f64);
        Ok(())
    }

    fn push_missing(&mut self) {
        self.values.push(missing_f64());
    }

    fn set_f64(&mut self, row: usize, value: f64) -> Result<(), StorageRejection> {
        self.values[row] = value;
        Ok(())
    }

    // IEEE total order: the missing pattern (a positive NaN) sorts after +inf.
    fn sort_ascending(&mut self) {
        sort_by(&mut self.values, |a, b| a.total_cmp(b));
    }

    fn sort_descending(&mut self) {
        sort_by(&mut self.values, |a, b| b.total_cmp(a));
    }

    fn sorted_copy(&self, descending: bool) -> Vec<f64> {
        let mut copy = self.values.clone();
        if descending {
            sort_by(&mut copy, |a, b| b.total_cmp(a));
        } else {
            sort_by(&mut copy, |a, b| a.total_cmp(b));
        }
        copy
    }

    fn empty_like(&self, capacity: usize) -> Box<dyn NumericStorage> {
        Box::new(Self::with_capacity(capacity))
    }

    fn clone_box(&self) -> Box<dyn NumericStorage> {
        Box::new(self.clone())
    }

    fn size_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
    }
}

/// Below this length the sequential sort wins over spinning up the parallel one.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
const PARALLEL_SORT_MIN_LEN: usize = 1 << 14;

fn sort_by<T, F>(values: &mut [T], compare: F)
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        if values.len() >= PARALLEL_SORT_MIN_LEN {
            use rayon::slice::ParallelSliceMut;
            values.par_sort_unstable_by(compare);
            return;
        }
    }

    values.sort_unstable_by(compare);
}
