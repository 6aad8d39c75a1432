//! NDCube Core - N-dimensional data with world coordinates
//!
//! This crate lets dense arrays of measurements be addressed by storage
//! index and by physical world coordinate, including coordinate systems
//! with more axes than the array has dimensions. It also validates and
//! maintains aligned axes across collections of such arrays.

pub mod collection;
pub mod cube;
pub mod error;
pub mod storage;
pub mod units;
pub mod wcs;

pub use collection::{
    normalize, update_aligned_axes, AlignedAxes, AlignedAxesInput, AlignedAxesSpec,
    AxisIndexable, Collection,
};
pub use cube::{
    axis_priority, crop_ranges, AxisBinding, Cube, CubeOptions, Dimensions, ExtraCoordinate,
    ExtraCoordinateStore, WorldCoordinates,
};
pub use error::{CubeError, Result};
pub use storage::{ArrayStorage, DenseArray, Dimensioned};
pub use units::{CoordinateValues, Quantity, Unit, UnitError};
pub use wcs::{
    AxisCorrespondence, AxisSlot, CoordinateTransform, LinearAxis, LinearTransform, Origin,
    WorldTransform,
};
