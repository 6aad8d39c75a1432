//! Named coordinates attached to storage axes, independent of the transform.
//!
//! Coordinates are bound by storage axis on input and on output, but kept
//! internally in system axis numbering. System numbering does not change
//! when a storage axis is indexed away, so stored bindings stay valid across
//! reductions; only the storage numbering reported on read shifts.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{CubeError, Result};
use crate::storage::region_indices;
use crate::units::CoordinateValues;
use crate::wcs::AxisCorrespondence;

/// The storage axis or axes a coordinate is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisBinding {
    Single(usize),
    Multiple(Vec<usize>),
}

impl AxisBinding {
    pub fn as_slice(&self) -> &[usize] {
        match self {
            AxisBinding::Single(axis) => std::slice::from_ref(axis),
            AxisBinding::Multiple(axes) => axes,
        }
    }

    fn from_vec(mut axes: Vec<usize>) -> Self {
        if axes.len() == 1 {
            AxisBinding::Single(axes.remove(0))
        } else {
            AxisBinding::Multiple(axes)
        }
    }
}

impl From<usize> for AxisBinding {
    fn from(axis: usize) -> Self {
        AxisBinding::Single(axis)
    }
}

impl From<Vec<usize>> for AxisBinding {
    fn from(axes: Vec<usize>) -> Self {
        AxisBinding::Multiple(axes)
    }
}

/// A named coordinate: bound storage axes and values.
///
/// For a multi-axis binding the values are laid out row-major over the
/// bound axes, in the order the axes are listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraCoordinate {
    pub name: String,
    pub axes: AxisBinding,
    pub value: CoordinateValues,
}

impl ExtraCoordinate {
    pub fn new(
        name: impl Into<String>,
        axes: impl Into<AxisBinding>,
        value: impl Into<CoordinateValues>,
    ) -> Self {
        Self {
            name: name.into(),
            axes: axes.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StoredCoordinate {
    /// Bound axes in system numbering, in the caller's listed order.
    system_axes: Vec<usize>,
    value: CoordinateValues,
}

/// Extra coordinates of one cube, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraCoordinateStore {
    entries: BTreeMap<String, StoredCoordinate>,
}

impl ExtraCoordinateStore {
    /// Validate coordinates against a storage shape and store them.
    ///
    /// # Errors
    ///
    /// - `DuplicateExtraCoordinate` if two coordinates share a name
    /// - `InvalidAxisBinding` if a coordinate is bound to no axes or lists
    ///   an axis twice
    /// - `AxisOutOfRange` if a bound axis is not a storage axis
    /// - `ShapeMismatch` if the value count differs from the bound extent
    ///   (the product of extents for multi-axis bindings)
    pub fn new(
        coords: Vec<ExtraCoordinate>,
        axes: &AxisCorrespondence,
        shape: &[usize],
    ) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for coord in coords {
            if entries.contains_key(&coord.name) {
                return Err(CubeError::DuplicateExtraCoordinate(coord.name));
            }

            let bound = coord.axes.as_slice();
            let distinct: BTreeSet<usize> = bound.iter().copied().collect();
            if bound.is_empty() || distinct.len() != bound.len() {
                let bound = bound.to_vec();
                return Err(CubeError::InvalidAxisBinding {
                    name: coord.name,
                    axes: bound,
                });
            }

            let mut system_axes = Vec::with_capacity(bound.len());
            let mut expected = 1;
            for &axis in bound {
                let system = axes.system_axis(axis).ok_or(CubeError::AxisOutOfRange {
                    axis,
                    rank: axes.storage_rank(),
                })?;
                system_axes.push(system);
                expected *= shape[axis];
            }

            if coord.value.len() != expected {
                return Err(CubeError::ShapeMismatch {
                    name: coord.name,
                    expected,
                    found: coord.value.len(),
                });
            }

            entries.insert(
                coord.name,
                StoredCoordinate {
                    system_axes,
                    value: coord.value,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Read one coordinate with its binding in current storage numbering.
    pub fn get(&self, name: &str, axes: &AxisCorrespondence) -> Option<ExtraCoordinate> {
        let stored = self.entries.get(name)?;
        Some(ExtraCoordinate {
            name: name.to_string(),
            axes: storage_binding(&stored.system_axes, axes)?,
            value: stored.value.clone(),
        })
    }

    /// Read every coordinate, keyed by name.
    pub fn to_map(&self, axes: &AxisCorrespondence) -> BTreeMap<String, ExtraCoordinate> {
        self.entries
            .keys()
            .filter_map(|name| Some((name.clone(), self.get(name, axes)?)))
            .collect()
    }

    /// Coordinates restricted to a region of the storage array.
    ///
    /// `ranges` holds one in-bounds range per storage axis.
    pub(crate) fn sliced(
        &self,
        axes: &AxisCorrespondence,
        shape: &[usize],
        ranges: &[Range<usize>],
    ) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(name, stored)| {
                let storage: Vec<usize> = stored
                    .system_axes
                    .iter()
                    .filter_map(|&system| axes.storage_axis(system))
                    .collect();
                let value = restrict(&stored.value, &storage, shape, |axis| ranges[axis].clone());
                (
                    name.clone(),
                    StoredCoordinate {
                        system_axes: stored.system_axes.clone(),
                        value,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Coordinates after `axis` is indexed at `index` and removed.
    ///
    /// Coordinates bound only to that axis are dropped; multi-axis
    /// coordinates keep their values at `index` along it.
    pub(crate) fn indexed(
        &self,
        axes: &AxisCorrespondence,
        shape: &[usize],
        axis: usize,
        index: usize,
    ) -> Self {
        let Some(removed) = axes.system_axis(axis) else {
            return self.clone();
        };
        let entries = self
            .entries
            .iter()
            .filter_map(|(name, stored)| {
                if !stored.system_axes.contains(&removed) {
                    return Some((name.clone(), stored.clone()));
                }
                if stored.system_axes.len() == 1 {
                    return None;
                }
                let storage: Vec<usize> = stored
                    .system_axes
                    .iter()
                    .filter_map(|&system| axes.storage_axis(system))
                    .collect();
                let value = restrict(&stored.value, &storage, shape, |a| {
                    if a == axis {
                        index..index + 1
                    } else {
                        0..shape[a]
                    }
                });
                let system_axes = stored
                    .system_axes
                    .iter()
                    .copied()
                    .filter(|&system| system != removed)
                    .collect();
                Some((name.clone(), StoredCoordinate { system_axes, value }))
            })
            .collect();
        Self { entries }
    }
}

fn storage_binding(system_axes: &[usize], axes: &AxisCorrespondence) -> Option<AxisBinding> {
    let storage = system_axes
        .iter()
        .map(|&system| axes.storage_axis(system))
        .collect::<Option<Vec<usize>>>()?;
    Some(AxisBinding::from_vec(storage))
}

/// Select the values of a coordinate bound to `bound` storage axes that lie
/// inside the per-axis ranges given by `range_of`.
fn restrict(
    value: &CoordinateValues,
    bound: &[usize],
    shape: &[usize],
    range_of: impl Fn(usize) -> Range<usize>,
) -> CoordinateValues {
    if let [axis] = bound {
        return value.slice(range_of(*axis));
    }
    let local_shape: Vec<usize> = bound.iter().map(|&a| shape[a]).collect();
    let local_ranges: Vec<Range<usize>> = bound.iter().map(|&a| range_of(a)).collect();
    value.take(&region_indices(&local_shape, &local_ranges))
}
