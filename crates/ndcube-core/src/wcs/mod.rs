//! World coordinate handling: pixel ↔ world conversion with missing axes.
//!
//! A coordinate transform provider knows nothing about storage arrays; it
//! works on its own fixed set of "system" axes. A cube's storage array may
//! have fewer axes than the provider, in which case the surplus system axes
//! are flagged as missing and evaluated at a fixed anchor.
//!
//! # Axis Order
//!
//! - Storage axes are numbered in array order (slowest-varying first)
//! - System axes are the reverse: the last system axis is storage axis 0
//! - Reference pixels are 1-based, following the FITS convention
//!
//! # Pixel Origin
//!
//! Pixel values passed to and returned from conversions count from either 0
//! (array indices) or 1 (FITS header values), selected by [`Origin`].

mod axes;
mod convert;
mod linear;

pub use axes::{AxisCorrespondence, AxisSlot};
pub use convert::CoordinateTransform;
pub use linear::{LinearAxis, LinearTransform};

use crate::error::{CubeError, Result};
use crate::units::Unit;

/// Pixel counting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Array indices: the first pixel is 0.
    #[default]
    Zero,
    /// FITS convention: the first pixel is 1.
    One,
}

impl Origin {
    /// Offset of the first pixel.
    #[inline]
    pub fn offset(self) -> f64 {
        match self {
            Origin::Zero => 0.0,
            Origin::One => 1.0,
        }
    }
}

impl TryFrom<u8> for Origin {
    type Error = CubeError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Origin::Zero),
            1 => Ok(Origin::One),
            other => Err(CubeError::InvalidOrigin(other)),
        }
    }
}

/// A pixel ↔ world coordinate solver over a fixed set of system axes.
///
/// Implementations own the actual (possibly nonlinear) mapping. All
/// argument and result vectors have exactly [`axis_count`](Self::axis_count)
/// entries in system axis order.
pub trait WorldTransform {
    /// Number of system axes.
    fn axis_count(&self) -> usize;

    /// Declared unit of world values on a system axis.
    fn unit(&self, axis: usize) -> Unit;

    /// Axis type label, e.g. `WAVE` or `HPLT-TAN`.
    fn axis_type(&self, axis: usize) -> &str;

    /// Reference pixel of a system axis (1-based).
    fn reference_pixel(&self, axis: usize) -> f64;

    /// World value at the reference pixel, in [`unit`](Self::unit).
    fn reference_value(&self, axis: usize) -> f64;

    /// Convert pixel coordinates to world coordinates.
    fn forward(&self, pixels: &[f64], origin: Origin) -> Result<Vec<f64>>;

    /// Convert world coordinates to pixel coordinates.
    fn inverse(&self, world: &[f64], origin: Origin) -> Result<Vec<f64>>;

    /// Move the reference pixel of a system axis by `delta` pixels.
    ///
    /// Used after slicing so that pixel 0 of the slice keeps its world value.
    fn shift_reference_pixel(&mut self, axis: usize, delta: f64);

    /// Re-anchor a system axis at a 0-based pixel so that the axis can be
    /// evaluated at its reference point once it is missing.
    fn collapse_axis(&mut self, axis: usize, pixel: f64) -> Result<()>;

    /// The same transform with system axes reordered so that new axis `j`
    /// is old axis `order[j]`.
    fn reindex(&self, order: &[usize]) -> Result<Self>
    where
        Self: Sized;
}
