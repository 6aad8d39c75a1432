//! Keyed collections of arrays or cubes with aligned axes.
//!
//! A [`Collection`] holds members under unique string keys, in insertion
//! order. When aligned axes are declared, indexing or slicing along an
//! aligned position applies to the matching axis of every member at once.

mod aligned;

pub use aligned::{normalize, update_aligned_axes, AlignedAxes, AlignedAxesInput, AlignedAxesSpec};

use std::collections::BTreeSet;
use std::ops::Range;

use tracing::{debug, info};

use crate::cube::Cube;
use crate::error::{CubeError, Result};
use crate::storage::{axis_ranges, ArrayStorage, DenseArray, Dimensioned};
use crate::wcs::WorldTransform;

/// A collection member that can be indexed or sliced along one axis.
pub trait AxisIndexable: Dimensioned + Sized {
    /// Select `index` along `axis` and remove that axis.
    fn index_axis(&self, axis: usize, index: usize) -> Result<Self>;

    /// Keep `range` along `axis`, leaving other axes whole.
    fn slice_axis(&self, axis: usize, range: Range<usize>) -> Result<Self>;
}

impl<T: Clone> AxisIndexable for DenseArray<T> {
    fn index_axis(&self, axis: usize, index: usize) -> Result<Self> {
        ArrayStorage::index_axis(self, axis, index)
    }

    fn slice_axis(&self, axis: usize, range: Range<usize>) -> Result<Self> {
        self.slice(&axis_ranges(self.shape(), axis, range)?)
    }
}

impl<S: ArrayStorage, W: WorldTransform + Clone> AxisIndexable for Cube<S, W> {
    fn index_axis(&self, axis: usize, index: usize) -> Result<Self> {
        Cube::index_axis(self, axis, index)
    }

    fn slice_axis(&self, axis: usize, range: Range<usize>) -> Result<Self> {
        Cube::slice_axis(self, axis, range)
    }
}

/// Members under unique keys with optional aligned axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    keys: Vec<String>,
    members: Vec<T>,
    aligned_axes: Option<AlignedAxes>,
}

impl<T: Dimensioned> Collection<T> {
    /// Build a collection from `(key, member)` pairs.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if a key repeats, or any error from [`normalize`] when
    /// `aligned_axes` is given.
    pub fn new(entries: Vec<(String, T)>, aligned_axes: Option<AlignedAxesSpec>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for (key, _) in &entries {
            if !seen.insert(key.as_str()) {
                return Err(CubeError::DuplicateKey(key.clone()));
            }
        }

        let (keys, members): (Vec<String>, Vec<T>) = entries.into_iter().unzip();
        let aligned_axes = aligned_axes
            .map(|spec| normalize(&members, &spec))
            .transpose()?;

        info!(
            members = members.len(),
            aligned = aligned_axes.as_ref().map_or(0, AlignedAxes::aligned_count),
            "Created collection"
        );

        Ok(Self {
            keys,
            members,
            aligned_axes,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.position(key).map(|i| &self.members[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.keys().zip(&self.members)
    }

    pub fn aligned_axes(&self) -> Option<&AlignedAxes> {
        self.aligned_axes.as_ref()
    }

    /// Aligned storage axes of the member under `key`.
    pub fn aligned_axes_of(&self, key: &str) -> Result<&[usize]> {
        let position = self
            .position(key)
            .ok_or_else(|| CubeError::UnknownKey(key.to_string()))?;
        let aligned = self.aligned_axes.as_ref().ok_or(CubeError::NotAligned)?;
        aligned.member(position).ok_or(CubeError::NotAligned)
    }

    /// Extent of each aligned position, shared by every member.
    pub fn aligned_dimensions(&self) -> Option<Vec<usize>> {
        let aligned = self.aligned_axes.as_ref()?;
        let first = self.members.first()?;
        let axes = aligned.member(0)?;
        Some(axes.iter().map(|&axis| first.shape()[axis]).collect())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    fn aligned_axis_per_member(&self, position: usize) -> Result<Vec<usize>> {
        let aligned = self.aligned_axes.as_ref().ok_or(CubeError::NotAligned)?;
        if position >= aligned.aligned_count() {
            return Err(CubeError::DropPositionOutOfRange {
                position,
                aligned: aligned.aligned_count(),
            });
        }
        Ok(aligned.iter().map(|axes| axes[position]).collect())
    }
}

impl<T: AxisIndexable> Collection<T> {
    /// Index every member at `index` along its axis at aligned `position`.
    ///
    /// The indexed axis disappears from every member, so the aligned
    /// position is dropped and the remaining aligned axes are renumbered.
    /// Indexing the last aligned position leaves the collection unaligned.
    pub fn index_aligned(&self, position: usize, index: usize) -> Result<Self> {
        let axes = self.aligned_axis_per_member(position)?;
        let members = self
            .members
            .iter()
            .zip(&axes)
            .map(|(member, &axis)| member.index_axis(axis, index))
            .collect::<Result<Vec<T>>>()?;

        let aligned_axes = match &self.aligned_axes {
            Some(aligned) => update_aligned_axes(aligned, &[position])?,
            None => None,
        };

        debug!(position, index, "Indexed collection along aligned axis");

        Ok(Self {
            keys: self.keys.clone(),
            members,
            aligned_axes,
        })
    }

    /// Slice every member along its axis at aligned `position`.
    ///
    /// Aligned extents are equal, so every member keeps the same extent
    /// along that axis and the alignment is unchanged.
    pub fn slice_aligned(&self, position: usize, range: Range<usize>) -> Result<Self> {
        let axes = self.aligned_axis_per_member(position)?;
        let members = self
            .members
            .iter()
            .zip(&axes)
            .map(|(member, &axis)| member.slice_axis(axis, range.clone()))
            .collect::<Result<Vec<T>>>()?;

        debug!(position, ?range, "Sliced collection along aligned axis");

        Ok(Self {
            keys: self.keys.clone(),
            members,
            aligned_axes: self.aligned_axes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{CubeOptions, WorldCoordinates};
    use crate::units::{NANOMETER, PIXEL, SECOND};
    use crate::wcs::{LinearAxis, LinearTransform, Origin};

    fn array(shape: &[usize]) -> DenseArray<u16> {
        let mut next = 0u16;
        DenseArray::from_fn(shape.to_vec(), |_| {
            next += 1;
            next - 1
        })
    }

    fn collection(aligned: Option<AlignedAxesSpec>) -> Collection<DenseArray<u16>> {
        Collection::new(
            vec![
                ("a".to_string(), array(&[3, 4, 5])),
                ("b".to_string(), array(&[4, 3, 5])),
            ],
            aligned,
        )
        .unwrap()
    }

    fn per_member(axes: &[&[usize]]) -> Option<AlignedAxesSpec> {
        Some(AlignedAxesSpec::PerMember(
            axes.iter().map(|a| a.to_vec()).collect(),
        ))
    }

    #[test]
    fn test_keys_and_lookup() {
        let c = collection(None);
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(c.len(), 2);
        assert!(!c.is_empty());
        assert_eq!(c.get("b").unwrap().shape(), &[4, 3, 5]);
        assert!(c.get("z").is_none());
        assert!(c.aligned_axes().is_none());
    }

    #[test]
    fn test_duplicate_key() {
        let err = Collection::new(
            vec![
                ("a".to_string(), array(&[2])),
                ("a".to_string(), array(&[2])),
            ],
            None,
        )
        .unwrap_err();
        assert_eq!(err, CubeError::DuplicateKey("a".to_string()));
    }

    #[test]
    fn test_aligned_axes_of() {
        let c = collection(per_member(&[&[0, 2], &[1, 2]]));
        assert_eq!(c.aligned_axes_of("b").unwrap(), &[1, 2]);
        assert_eq!(c.aligned_dimensions(), Some(vec![3, 5]));
        assert_eq!(
            c.aligned_axes_of("z").unwrap_err(),
            CubeError::UnknownKey("z".to_string())
        );
        assert_eq!(
            collection(None).aligned_axes_of("a").unwrap_err(),
            CubeError::NotAligned
        );
    }

    #[test]
    fn test_misaligned_extents_rejected() {
        let err = Collection::new(
            vec![
                ("a".to_string(), array(&[3, 4])),
                ("b".to_string(), array(&[4, 3])),
            ],
            Some(AlignedAxesSpec::Single(0)),
        )
        .unwrap_err();
        assert!(matches!(err, CubeError::AlignmentExtentMismatch { .. }));
    }

    #[test]
    fn test_index_aligned() {
        let c = collection(per_member(&[&[0, 2], &[1, 2]]));
        let indexed = c.index_aligned(0, 1).unwrap();

        assert_eq!(indexed.get("a").unwrap().shape(), &[4, 5]);
        assert_eq!(indexed.get("b").unwrap().shape(), &[4, 5]);
        // Member "a" lost axis 0, member "b" lost axis 1; axis 2 became 1
        assert_eq!(indexed.aligned_axes_of("a").unwrap(), &[1]);
        assert_eq!(indexed.aligned_axes_of("b").unwrap(), &[1]);

        // "a" at [1, 0, 0] is element 20
        assert_eq!(indexed.get("a").unwrap().as_slice()[0], 20);
    }

    #[test]
    fn test_index_last_aligned_position() {
        let c = collection(per_member(&[&[2], &[2]]));
        let indexed = c.index_aligned(0, 4).unwrap();
        assert!(indexed.aligned_axes().is_none());
        assert_eq!(indexed.get("a").unwrap().shape(), &[3, 4]);
    }

    #[test]
    fn test_index_aligned_errors() {
        assert_eq!(
            collection(None).index_aligned(0, 0).unwrap_err(),
            CubeError::NotAligned
        );
        let c = collection(per_member(&[&[2], &[2]]));
        assert_eq!(
            c.index_aligned(1, 0).unwrap_err(),
            CubeError::DropPositionOutOfRange {
                position: 1,
                aligned: 1
            }
        );
        assert!(matches!(
            c.index_aligned(0, 5),
            Err(CubeError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_slice_aligned() {
        let c = collection(per_member(&[&[0, 2], &[1, 2]]));
        let sliced = c.slice_aligned(1, 1..3).unwrap();
        assert_eq!(sliced.get("a").unwrap().shape(), &[3, 4, 2]);
        assert_eq!(sliced.get("b").unwrap().shape(), &[4, 3, 2]);
        assert_eq!(sliced.aligned_axes(), c.aligned_axes());
        assert_eq!(sliced.aligned_dimensions(), Some(vec![3, 2]));
    }

    #[test]
    fn test_cube_members() {
        // System axes (wave, time); storage order (time, wave)
        let provider = LinearTransform::new(vec![
            LinearAxis::new("WAVE", NANOMETER, 1.0, 656.0, 0.1),
            LinearAxis::new("TIME", SECOND, 1.0, 0.0, 10.0),
        ])
        .unwrap();
        let cube = |n: usize| {
            Cube::new(
                DenseArray::filled(vec![n, 6], 0.0f32),
                provider.clone(),
                CubeOptions::default(),
            )
            .unwrap()
        };
        let c = Collection::new(
            vec![("ha".to_string(), cube(4)), ("ha2".to_string(), cube(4))],
            Some(AlignedAxesSpec::Shared(vec![0, 1])),
        )
        .unwrap();

        let frame = c.index_aligned(0, 2).unwrap();
        let member = frame.get("ha").unwrap();
        assert_eq!(member.shape(), &[6]);
        assert_eq!(member.missing_axes(), &[false, true]);
        assert_eq!(frame.aligned_axes_of("ha2").unwrap(), &[0]);

        let world = member.pixel_to_world(&[3.0 * PIXEL], Origin::Zero).unwrap();
        assert!((world[0].value - 656.3).abs() < 1e-9);
    }
}
