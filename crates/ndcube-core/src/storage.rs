//! Dense N-dimensional storage.
//!
//! Cubes never touch raw buffers directly; they go through the
//! [`ArrayStorage`] trait, which only needs a shape query and per-axis
//! slicing. [`DenseArray`] is the row-major implementation used by the
//! bindings and the tests.

use std::ops::Range;

use crate::error::{CubeError, Result};

/// Anything with a storage shape (one extent per storage axis).
pub trait Dimensioned {
    fn shape(&self) -> &[usize];

    fn rank(&self) -> usize {
        self.shape().len()
    }
}

impl Dimensioned for Vec<usize> {
    fn shape(&self) -> &[usize] {
        self
    }
}

impl Dimensioned for [usize] {
    fn shape(&self) -> &[usize] {
        self
    }
}

/// Storage that can be sliced into a new, independent array of the same kind.
pub trait ArrayStorage: Dimensioned + Sized {
    /// Take one half-open range per axis.
    ///
    /// Ranges are clamped to the axis extent; a range whose end is not past
    /// its start yields zero extent along that axis.
    fn slice(&self, ranges: &[Range<usize>]) -> Result<Self>;

    /// Select a single position along `axis`, removing that axis.
    fn index_axis(&self, axis: usize, index: usize) -> Result<Self>;

    /// Reorder axes so that new axis `k` is old axis `order[k]`.
    fn permute_axes(&self, order: &[usize]) -> Result<Self>;
}

/// A row-major array of `T` with an explicit shape.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Clone> DenseArray<T> {
    /// Create an array from a shape and a row-major buffer.
    ///
    /// Fails with `ShapeMismatch` if the buffer length is not the product of
    /// the extents.
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(CubeError::ShapeMismatch {
                name: "data".to_string(),
                expected,
                found: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Create an array with every element set to `value`.
    pub fn filled(shape: Vec<usize>, value: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![value; len],
        }
    }

    /// Create an array by evaluating `f` at every multi-index, in row-major order.
    pub fn from_fn(shape: Vec<usize>, mut f: impl FnMut(&[usize]) -> T) -> Self {
        let full: Vec<Range<usize>> = shape.iter().map(|&n| 0..n).collect();
        let mut data = Vec::with_capacity(shape.iter().product());
        for_each_index(&full, |index| data.push(f(index)));
        Self { shape, data }
    }

    /// Row-major buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at a multi-index, if it is in bounds.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(&i, &n)| i >= n)
        {
            return None;
        }
        let flat: usize = index
            .iter()
            .zip(strides(&self.shape))
            .map(|(&i, stride)| i * stride)
            .sum();
        self.data.get(flat)
    }
}

impl<T> Dimensioned for DenseArray<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }
}

impl<T: Clone> ArrayStorage for DenseArray<T> {
    fn slice(&self, ranges: &[Range<usize>]) -> Result<Self> {
        if ranges.len() != self.shape.len() {
            return Err(CubeError::argument_count(self.shape.len(), ranges.len()));
        }
        let ranges = clamp_ranges(&self.shape, ranges);
        let shape = ranges.iter().map(|r| r.end - r.start).collect();
        let data = region_indices(&self.shape, &ranges)
            .into_iter()
            .map(|i| self.data[i].clone())
            .collect();
        Ok(Self { shape, data })
    }

    fn index_axis(&self, axis: usize, index: usize) -> Result<Self> {
        let extent = *self.shape.get(axis).ok_or(CubeError::AxisOutOfRange {
            axis,
            rank: self.shape.len(),
        })?;
        if index >= extent {
            return Err(CubeError::IndexOutOfBounds {
                axis,
                index,
                extent,
            });
        }
        let mut ranges: Vec<Range<usize>> = self.shape.iter().map(|&n| 0..n).collect();
        ranges[axis] = index..index + 1;
        let mut sliced = self.slice(&ranges)?;
        sliced.shape.remove(axis);
        Ok(sliced)
    }

    fn permute_axes(&self, order: &[usize]) -> Result<Self> {
        check_permutation(order, self.shape.len())?;
        let old_strides = strides(&self.shape);
        let shape: Vec<usize> = order.iter().map(|&axis| self.shape[axis]).collect();
        let moved: Vec<usize> = order.iter().map(|&axis| old_strides[axis]).collect();

        let full: Vec<Range<usize>> = shape.iter().map(|&n| 0..n).collect();
        let mut data = Vec::with_capacity(self.data.len());
        for_each_index(&full, |index| {
            let flat: usize = index.iter().zip(&moved).map(|(&i, s)| i * s).sum();
            data.push(self.data[flat].clone());
        });
        Ok(Self { shape, data })
    }
}

/// Check that `order` lists each of `0..rank` exactly once.
pub(crate) fn check_permutation(order: &[usize], rank: usize) -> Result<()> {
    let mut seen = vec![false; rank];
    let valid = order.len() == rank
        && order
            .iter()
            .all(|&axis| axis < rank && !std::mem::replace(&mut seen[axis], true));
    if !valid {
        return Err(CubeError::InvalidPermutation {
            order: order.to_vec(),
            rank,
        });
    }
    Ok(())
}

/// Clamp each range into `0..extent`, collapsing inverted ranges to empty.
pub(crate) fn clamp_ranges(shape: &[usize], ranges: &[Range<usize>]) -> Vec<Range<usize>> {
    shape
        .iter()
        .zip(ranges)
        .map(|(&extent, range)| {
            let end = range.end.min(extent);
            let start = range.start.min(end);
            start..end
        })
        .collect()
}

/// Full ranges over `shape` with `range` substituted on `axis`.
pub(crate) fn axis_ranges(
    shape: &[usize],
    axis: usize,
    range: Range<usize>,
) -> Result<Vec<Range<usize>>> {
    if axis >= shape.len() {
        return Err(CubeError::AxisOutOfRange {
            axis,
            rank: shape.len(),
        });
    }
    let mut ranges: Vec<Range<usize>> = shape.iter().map(|&n| 0..n).collect();
    ranges[axis] = range;
    Ok(ranges)
}

/// Flat row-major offsets of every element inside `ranges`, in row-major
/// order of the selected region. Ranges must already be in bounds.
pub(crate) fn region_indices(shape: &[usize], ranges: &[Range<usize>]) -> Vec<usize> {
    let strides = strides(shape);
    let mut out = Vec::with_capacity(ranges.iter().map(|r| r.len()).product());
    for_each_index(ranges, |index| {
        out.push(index.iter().zip(&strides).map(|(&i, s)| i * s).sum());
    });
    out
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Visit every multi-index inside `ranges` with the last axis varying fastest.
fn for_each_index(ranges: &[Range<usize>], mut visit: impl FnMut(&[usize])) {
    if ranges.iter().any(|r| r.is_empty()) {
        return;
    }
    let mut index: Vec<usize> = ranges.iter().map(|r| r.start).collect();
    loop {
        visit(&index);
        // Odometer increment from the last axis
        let mut axis = ranges.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < ranges[axis].end {
                break;
            }
            index[axis] = ranges[axis].start;
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: slicing yields the clamped range lengths as its shape.
        #[test]
        fn prop_slice_shape_matches_ranges(
            (rows, cols) in (1usize..=8, 1usize..=8),
            (r0, r1, c0, c1) in (0usize..10, 0usize..10, 0usize..10, 0usize..10),
        ) {
            let arr = DenseArray::filled(vec![rows, cols], 0u8);
            let sliced = arr.slice(&[r0..r1, c0..c1]).unwrap();

            let expect = |start: usize, end: usize, extent: usize| {
                end.min(extent).saturating_sub(start.min(end.min(extent)))
            };
            prop_assert_eq!(sliced.shape(), &[expect(r0, r1, rows), expect(c0, c1, cols)][..]);
            prop_assert_eq!(sliced.len(), sliced.shape().iter().product::<usize>());
        }

        /// Property: slicing the full extent reproduces the array.
        #[test]
        fn prop_full_slice_is_identity(shape in prop::collection::vec(1usize..=5, 1..=4)) {
            let mut n = 0;
            let arr = DenseArray::from_fn(shape.clone(), |_| { n += 1; n });
            let full: Vec<Range<usize>> = shape.iter().map(|&e| 0..e).collect();
            prop_assert_eq!(arr.slice(&full).unwrap(), arr);
        }

        /// Property: applying a permutation and then its inverse is the
        /// identity.
        #[test]
        fn prop_permute_inverse_is_identity(
            order in (1usize..=4).prop_flat_map(|rank| Just((0..rank).collect::<Vec<_>>()).prop_shuffle()),
        ) {
            let shape: Vec<usize> = (0..order.len()).map(|axis| axis + 2).collect();
            let mut n = 0;
            let arr = DenseArray::from_fn(shape, |_| { n += 1; n });

            let mut inverse = vec![0; order.len()];
            for (new, &old) in order.iter().enumerate() {
                inverse[old] = new;
            }
            let permuted = arr.permute_axes(&order).unwrap();
            prop_assert_eq!(permuted.permute_axes(&inverse).unwrap(), arr);
        }
    }
}
