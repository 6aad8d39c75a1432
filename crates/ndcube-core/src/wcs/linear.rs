//! Separable linear world coordinate transform.
//!
//! Each system axis maps independently:
//!
//! ```text
//! world = reference_value + scale * (pixel - origin + 1 - reference_pixel)
//! pixel = (world - reference_value) / scale + reference_pixel - 1 + origin
//! ```

use serde::{Deserialize, Serialize};

use super::{Origin, WorldTransform};
use crate::error::{CubeError, Result};
use crate::storage::check_permutation;
use crate::units::Unit;

/// Linear description of one system axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearAxis {
    /// Axis type label (e.g. "WAVE", "HPLN-TAN", "TIME").
    pub axis_type: String,
    /// Unit of world values.
    pub unit: Unit,
    /// Reference pixel (1-based).
    pub reference_pixel: f64,
    /// World value at the reference pixel.
    pub reference_value: f64,
    /// World increment per pixel. Must be finite and non-zero.
    pub scale: f64,
}

impl LinearAxis {
    pub fn new(
        axis_type: impl Into<String>,
        unit: Unit,
        reference_pixel: f64,
        reference_value: f64,
        scale: f64,
    ) -> Self {
        Self {
            axis_type: axis_type.into(),
            unit,
            reference_pixel,
            reference_value,
            scale,
        }
    }

    #[inline]
    fn to_world(&self, pixel: f64, origin: Origin) -> f64 {
        self.reference_value + self.scale * (pixel - origin.offset() + 1.0 - self.reference_pixel)
    }

    #[inline]
    fn to_pixel(&self, world: f64, origin: Origin) -> f64 {
        (world - self.reference_value) / self.scale + self.reference_pixel - 1.0 + origin.offset()
    }
}

/// A transform whose system axes are independent linear maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearTransform {
    axes: Vec<LinearAxis>,
}

impl LinearTransform {
    /// Build a transform from per-axis descriptions in system order.
    ///
    /// Fails if any axis has a zero or non-finite scale, since such an axis
    /// cannot be inverted.
    pub fn new(axes: Vec<LinearAxis>) -> Result<Self> {
        let transform = Self { axes };
        transform.validate()?;
        Ok(transform)
    }

    /// Check every axis can be inverted.
    pub fn validate(&self) -> Result<()> {
        for (i, axis) in self.axes.iter().enumerate() {
            if axis.scale == 0.0 || !axis.scale.is_finite() {
                return Err(CubeError::transform(format!(
                    "axis {i} has degenerate scale {}",
                    axis.scale
                )));
            }
        }
        Ok(())
    }

    pub fn axes(&self) -> &[LinearAxis] {
        &self.axes
    }

    fn check_len(&self, found: usize) -> Result<()> {
        if found != self.axes.len() {
            return Err(CubeError::transform(format!(
                "expected {} system coordinates, got {found}",
                self.axes.len()
            )));
        }
        Ok(())
    }
}

impl WorldTransform for LinearTransform {
    fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn unit(&self, axis: usize) -> Unit {
        self.axes[axis].unit
    }

    fn axis_type(&self, axis: usize) -> &str {
        &self.axes[axis].axis_type
    }

    fn reference_pixel(&self, axis: usize) -> f64 {
        self.axes[axis].reference_pixel
    }

    fn reference_value(&self, axis: usize) -> f64 {
        self.axes[axis].reference_value
    }

    fn forward(&self, pixels: &[f64], origin: Origin) -> Result<Vec<f64>> {
        self.check_len(pixels.len())?;
        Ok(self
            .axes
            .iter()
            .zip(pixels)
            .map(|(axis, &p)| axis.to_world(p, origin))
            .collect())
    }

    fn inverse(&self, world: &[f64], origin: Origin) -> Result<Vec<f64>> {
        self.check_len(world.len())?;
        self.validate()?;
        Ok(self
            .axes
            .iter()
            .zip(world)
            .map(|(axis, &w)| axis.to_pixel(w, origin))
            .collect())
    }

    fn shift_reference_pixel(&mut self, axis: usize, delta: f64) {
        self.axes[axis].reference_pixel += delta;
    }

    fn collapse_axis(&mut self, axis: usize, pixel: f64) -> Result<()> {
        let count = self.axes.len();
        let linear = self
            .axes
            .get_mut(axis)
            .ok_or_else(|| CubeError::transform(format!("axis {axis} not in {count} axes")))?;
        linear.reference_value = linear.to_world(pixel, Origin::Zero);
        linear.reference_pixel = pixel + 1.0;
        Ok(())
    }

    fn reindex(&self, order: &[usize]) -> Result<Self> {
        check_permutation(order, self.axes.len())?;
        Ok(Self {
            axes: order.iter().map(|&axis| self.axes[axis].clone()).collect(),
        })
    }
}
