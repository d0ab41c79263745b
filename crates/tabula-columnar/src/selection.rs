#![forbid(unsafe_code)]

use crate::error::{ColumnarError, ColumnarResult};
use roaring::RoaringBitmap;
use std::ops::{BitAnd, BitOr, Range, Sub};

/// An ordered, duplicate-free set of row indices.
///
/// Selections are produced by predicate evaluation and consumed by `where_` / conditional `set`
/// operations. Iteration always yields indices in ascending order, each exactly once.
///
/// Row indices are stored as `u32` in a compressed bitmap, which limits a selection (and hence a
/// table that is filtered through one) to indices up to `u32::MAX`. The infallible insertion
/// methods panic past that; [`Selection::try_add`] and [`Selection::try_add_range`] report it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    bitmap: RoaringBitmap,
}

fn try_row_key(index: usize) -> ColumnarResult<u32> {
    u32::try_from(index).map_err(|_| {
        ColumnarError::row_out_of_range(index, (u32::MAX as usize).saturating_add(1))
    })
}

#[inline]
fn row_key(index: usize) -> u32 {
    match u32::try_from(index) {
        Ok(key) => key,
        Err(_) => panic!("row index {index} exceeds selection capacity"),
    }
}

impl Selection {
    pub fn new() -> Self {
        Self {
            bitmap: RoaringBitmap::new(),
        }
    }

    /// Every index in `range`.
    pub fn with_range(range: Range<usize>) -> Self {
        let mut selection = Self::new();
        selection.add_range(range.start, range.end);
        selection
    }

    /// Panics if `index` exceeds `u32::MAX`.
    pub fn add(&mut self, index: usize) {
        self.bitmap.insert(row_key(index));
    }

    pub fn try_add(&mut self, index: usize) -> ColumnarResult<()> {
        self.bitmap.insert(try_row_key(index)?);
        Ok(())
    }

    /// Add every index in `[from, to)`.
    ///
    /// Panics if the range reaches past `u32::MAX`.
    pub fn add_range(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        self.bitmap.insert_range(row_key(from)..=row_key(to - 1));
    }

    pub fn try_add_range(&mut self, from: usize, to: usize) -> ColumnarResult<()> {
        if from >= to {
            return Ok(());
        }
        let range = try_row_key(from)?..=try_row_key(to - 1)?;
        self.bitmap.insert_range(range);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) {
        self.bitmap.remove(row_key(index));
    }

    pub fn contains(&self, index: usize) -> bool {
        index <= u32::MAX as usize && self.bitmap.contains(index as u32)
    }

    pub fn len(&self) -> usize {
        self.bitmap.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    pub fn clear(&mut self) {
        self.bitmap.clear();
    }

    /// Largest selected index, if any.
    pub fn max(&self) -> Option<usize> {
        self.bitmap.max().map(|v| v as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bitmap.iter().map(|v| v as usize)
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Intersection.
    pub fn and(&self, other: &Selection) -> Selection {
        Selection {
            bitmap: &self.bitmap & &other.bitmap,
        }
    }

    /// Union.
    pub fn or(&self, other: &Selection) -> Selection {
        Selection {
            bitmap: &self.bitmap | &other.bitmap,
        }
    }

    /// Difference: indices in `self` that are not in `other`.
    pub fn and_not(&self, other: &Selection) -> Selection {
        Selection {
            bitmap: &self.bitmap - &other.bitmap,
        }
    }

    pub fn and_inplace(&mut self, other: &Selection) {
        self.bitmap &= &other.bitmap;
    }

    pub fn or_inplace(&mut self, other: &Selection) {
        self.bitmap |= &other.bitmap;
    }

    pub fn and_not_inplace(&mut self, other: &Selection) {
        self.bitmap -= &other.bitmap;
    }

    /// Complement within `[0, row_count)`.
    pub fn complement(&self, row_count: usize) -> Selection {
        Selection::with_range(0..row_count).and_not(self)
    }
}

impl FromIterator<usize> for Selection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Selection {
            bitmap: iter.into_iter().map(row_key).collect(),
        }
    }
}

impl Extend<usize> for Selection {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        self.bitmap.extend(iter.into_iter().map(row_key));
    }
}

impl BitAnd for &Selection {
    type Output = Selection;

    fn bitand(self, rhs: &Selection) -> Selection {
        self.and(rhs)
    }
}

impl BitOr for &Selection {
    type Output = Selection;

    fn bitor(self, rhs: &Selection) -> Selection {
        self.or(rhs)
    }
}

impl Sub for &Selection {
    type Output = Selection;

    fn sub(self, rhs: &Selection) -> Selection {
        self.and_not(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn iterates_ascending_without_duplicates() {
        let mut s = Selection::new();
        for i in [9, 3, 3, 7, 0, 9] {
            s.add(i);
        }
        assert_eq!(s.to_vec(), vec![0, 3, 7, 9]);
        assert_eq!(s.len(), 4);
        assert_eq!(s.max(), Some(9));
    }

    #[test]
    fn add_range_is_half_open() {
        let mut s = Selection::new();
        s.add_range(2, 5);
        s.add_range(7, 7);
        assert_eq!(s.to_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn combinators() {
        let a: Selection = [1, 2, 3, 4].into_iter().collect();
        let b: Selection = [3, 4, 5].into_iter().collect();
        assert_eq!(a.and(&b).to_vec(), vec![3, 4]);
        assert_eq!(a.or(&b).to_vec(), vec![1, 2, 3, 4, 5]);
        assert_eq!(a.and_not(&b).to_vec(), vec![1, 2]);
        assert_eq!(&a - &b, a.and_not(&b));
        assert_eq!(a.complement(6).to_vec(), vec![0, 5]);

        let mut c = a.clone();
        c.and_not_inplace(&b);
        c.or_inplace(&Selection::with_range(10..12));
        assert_eq!(c.to_vec(), vec![1, 2, 10, 11]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn indices_past_u32_are_reported() {
        let past = u32::MAX as usize + 1;
        let mut s = Selection::new();
        assert_eq!(
            s.try_add(past),
            Err(ColumnarError::IndexOutOfRange {
                kind: crate::IndexKind::Row,
                index: past,
                len: past,
            })
        );
        assert!(s.try_add_range(past - 2, past + 1).is_err());
        assert!(s.is_empty());

        s.try_add(u32::MAX as usize).unwrap();
        s.try_add_range(0, 2).unwrap();
        assert_eq!(s.to_vec(), vec![0, 1, u32::MAX as usize]);
        assert!(!s.contains(past));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "exceeds selection capacity")]
    fn add_panics_past_u32() {
        Selection::new().add(u32::MAX as usize + 1);
    }

    fn arb_selection() -> impl Strategy<Value = Selection> {
        proptest::collection::vec(0usize..512, 0..64).prop_map(|v| v.into_iter().collect())
    }

    proptest! {
        #[test]
        fn absorption_holds(a in arb_selection(), b in arb_selection()) {
            prop_assert_eq!(a.or(&b).and(&a), a.clone());
            prop_assert_eq!(a.and(&b).or(&a), a);
        }

        #[test]
        fn self_difference_is_empty(a in arb_selection()) {
            prop_assert!(a.and_not(&a).is_empty());
        }

        #[test]
        fn iteration_is_strictly_increasing(a in arb_selection()) {
            let v = a.to_vec();
            prop_assert!(v.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
