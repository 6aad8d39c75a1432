//! N-dimensional data cubes addressable by pixel and world coordinate.
//!
//! A [`Cube`] pairs a storage array with a coordinate transform provider.
//! The provider may describe more axes than the array has; the surplus
//! axes are flagged as missing in [`CubeOptions::missing_axes`].
//!
//! # Operations
//!
//! - [`WorldCoordinates`]: pixel ↔ world conversion in storage order
//! - [`Cube::crop_by_coords`]: crop by a world-coordinate region
//! - [`Cube::slice`] / [`Cube::index_axis`]: pixel-based slicing and reduction
//! - [`Cube::extra_coords`]: named coordinates bound to storage axes
//! - [`Cube::new_ordered`]: construction with axes arranged by type
//!
//! All operations return new cubes; a cube is never modified after
//! construction.

mod crop;
mod extra_coords;
mod ordered;

pub use crop::crop_ranges;
pub use extra_coords::{AxisBinding, ExtraCoordinate, ExtraCoordinateStore};
pub use ordered::axis_priority;

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CubeError, Result};
use crate::storage::{axis_ranges, clamp_ranges, ArrayStorage, Dimensioned};
use crate::units::{Quantity, Unit};
use crate::wcs::{AxisCorrespondence, CoordinateTransform, Origin, WorldTransform};

/// Conversion between storage-order pixel and world coordinates.
pub trait WorldCoordinates {
    /// Convert one pixel coordinate per storage axis to world coordinates.
    fn pixel_to_world(&self, pixels: &[Quantity], origin: Origin) -> Result<Vec<Quantity>>;

    /// Convert one world coordinate per storage axis to pixel coordinates.
    fn world_to_pixel(&self, world: &[Quantity], origin: Origin) -> Result<Vec<Quantity>>;
}

/// Optional construction parameters for a [`Cube`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeOptions {
    /// One flag per transform axis, in transform order; `true` marks an
    /// axis with no storage counterpart. `None` means no missing axes.
    pub missing_axes: Option<Vec<bool>>,
    /// Named coordinates bound to storage axes.
    pub extra_coords: Vec<ExtraCoordinate>,
    /// Unit of the data values.
    pub unit: Option<Unit>,
    /// Free-form metadata.
    pub meta: BTreeMap<String, String>,
}

/// Storage shape with the axis type of each storage axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub shape: Vec<usize>,
    pub axis_types: Vec<String>,
}

/// A storage array with world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube<S, W> {
    data: S,
    transform: CoordinateTransform<W>,
    extra_coords: ExtraCoordinateStore,
    unit: Option<Unit>,
    meta: BTreeMap<String, String>,
}

impl<S: ArrayStorage, W: WorldTransform> Cube<S, W> {
    /// Create a cube from storage and a transform provider.
    ///
    /// # Errors
    ///
    /// - `MissingAxisCount` if `missing_axes` has the wrong length
    /// - `RankMismatch` if non-missing axes do not match the storage rank
    /// - Extra coordinate errors from [`ExtraCoordinateStore::new`]
    pub fn new(data: S, provider: W, options: CubeOptions) -> Result<Self> {
        let transform = CoordinateTransform::new(provider, data.rank(), options.missing_axes)?;
        let extra_coords =
            ExtraCoordinateStore::new(options.extra_coords, transform.axes(), data.shape())?;

        debug!(
            shape = ?data.shape(),
            extra_coords = extra_coords.len(),
            "Created cube"
        );

        Ok(Self {
            data,
            transform,
            extra_coords,
            unit: options.unit,
            meta: options.meta,
        })
    }

    pub fn data(&self) -> &S {
        &self.data
    }

    pub fn transform(&self) -> &CoordinateTransform<W> {
        &self.transform
    }

    pub fn provider(&self) -> &W {
        self.transform.provider()
    }

    pub fn axes(&self) -> &AxisCorrespondence {
        self.transform.axes()
    }

    /// Missing-axis flags in transform order.
    pub fn missing_axes(&self) -> &[bool] {
        self.transform.axes().missing_flags()
    }

    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    /// Storage shape and axis types, both in storage order.
    pub fn dimensions(&self) -> Dimensions {
        let axes = self.transform.axes();
        let axis_types = (0..axes.storage_rank())
            .filter_map(|storage| axes.system_axis(storage))
            .map(|system| self.provider().axis_type(system).to_string())
            .collect();
        Dimensions {
            shape: self.data.shape().to_vec(),
            axis_types,
        }
    }

    /// World unit of each storage axis, in storage order.
    pub fn world_units(&self) -> Vec<Unit> {
        let axes = self.transform.axes();
        (0..axes.storage_rank())
            .filter_map(|storage| axes.system_axis(storage))
            .map(|system| self.provider().unit(system))
            .collect()
    }

    /// Extra coordinates keyed by name, bound by current storage axis.
    pub fn extra_coords(&self) -> BTreeMap<String, ExtraCoordinate> {
        self.extra_coords.to_map(self.transform.axes())
    }

    /// One extra coordinate by name.
    pub fn extra_coord(&self, name: &str) -> Option<ExtraCoordinate> {
        self.extra_coords.get(name, self.transform.axes())
    }
}

impl<S: ArrayStorage, W: WorldTransform + Clone> Cube<S, W> {
    /// Take one half-open pixel range per storage axis.
    ///
    /// Ranges are clamped to the storage shape. The transform is shifted so
    /// that world coordinates of the remaining pixels are unchanged, and
    /// extra coordinates are sliced alongside the data.
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<Self> {
        let axes = self.transform.axes();
        if ranges.len() != axes.storage_rank() {
            return Err(CubeError::argument_count(axes.storage_rank(), ranges.len()));
        }
        let ranges = clamp_ranges(self.data.shape(), ranges);

        let data = self.data.slice(&ranges)?;
        let mut provider = self.provider().clone();
        for (storage, range) in ranges.iter().enumerate() {
            if range.start > 0 {
                if let Some(system) = axes.system_axis(storage) {
                    provider.shift_reference_pixel(system, -(range.start as f64));
                }
            }
        }
        let extra_coords = self.extra_coords.sliced(axes, self.data.shape(), &ranges);

        Ok(Self {
            data,
            transform: CoordinateTransform::from_parts(provider, axes.clone()),
            extra_coords,
            unit: self.unit,
            meta: self.meta.clone(),
        })
    }

    /// Slice a single storage axis, keeping the others whole.
    pub fn slice_axis(&self, axis: usize, range: Range<usize>) -> Result<Self> {
        let ranges = axis_ranges(self.data.shape(), axis, range)?;
        self.slice(&ranges)
    }

    /// Crop to the region spanning `lower_corner` to `lower_corner + widths`
    /// in world coordinates.
    ///
    /// # Arguments
    ///
    /// * `lower_corner` - World coordinate of the lower corner, one per storage axis
    /// * `widths` - World extent of the region, one per storage axis
    ///
    /// # Returns
    ///
    /// A new cube covering the region. Axes whose rounded upper boundary is
    /// not past the lower one have zero extent.
    pub fn crop_by_coords(&self, lower_corner: &[Quantity], widths: &[Quantity]) -> Result<Self> {
        let ranges = crop_ranges(&self.transform, lower_corner, widths)?;
        let cropped = self.slice(&ranges)?;

        info!(
            from = ?self.data.shape(),
            to = ?cropped.data.shape(),
            "Cropped cube by world coordinates"
        );

        Ok(cropped)
    }

    /// Select one position along a storage axis and remove that axis.
    ///
    /// The corresponding transform axis becomes missing, anchored at the
    /// selected pixel, so world coordinates of the remaining axes are
    /// unchanged. Extra coordinates bound only to the removed axis are
    /// dropped.
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Self> {
        let axes = self.transform.axes();
        let data = self.data.index_axis(axis, index)?;
        let system = axes.system_axis(axis).ok_or(CubeError::AxisOutOfRange {
            axis,
            rank: axes.storage_rank(),
        })?;

        let mut provider = self.provider().clone();
        provider.collapse_axis(system, index as f64)?;
        let reduced = axes.without_storage_axis(axis)?;
        let extra_coords = self
            .extra_coords
            .indexed(axes, self.data.shape(), axis, index);

        debug!(axis, index, system, "Indexed cube axis");

        Ok(Self {
            data,
            transform: CoordinateTransform::from_parts(provider, reduced),
            extra_coords,
            unit: self.unit,
            meta: self.meta.clone(),
        })
    }

    /// Consume the cube, returning its storage and transform provider.
    pub fn into_parts(self) -> (S, W) {
        let (provider, _) = self.transform.into_parts();
        (self.data, provider)
    }
}

impl<S: ArrayStorage, W: WorldTransform> WorldCoordinates for Cube<S, W> {
    fn pixel_to_world(&self, pixels: &[Quantity], origin: Origin) -> Result<Vec<Quantity>> {
        self.transform.pixel_to_world(pixels, origin)
    }

    fn world_to_pixel(&self, world: &[Quantity], origin: Origin) -> Result<Vec<Quantity>> {
        self.transform.world_to_pixel(world, origin)
    }
}

impl<S: Dimensioned, W> Dimensioned for Cube<S, W> {
    fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
