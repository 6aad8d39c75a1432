//! Pixel ↔ world conversion in storage order.

use tracing::debug;

use super::{AxisCorrespondence, AxisSlot, Origin, WorldTransform};
use crate::error::{CubeError, Result};
use crate::units::{Quantity, PIXEL};

/// A transform provider paired with the axis correspondence of one storage
/// array.
///
/// Conversions take and return exactly one value per storage axis, in
/// storage order. Missing system axes are filled in from the provider's
/// reference pixel (forward) or reference value (inverse).
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTransform<W> {
    provider: W,
    axes: AxisCorrespondence,
}

impl<W: WorldTransform> CoordinateTransform<W> {
    /// Pair `provider` with a storage array of rank `storage_rank`.
    ///
    /// `missing` defaults to no missing axes. Fails with `MissingAxisCount`
    /// if the flags do not cover the provider's axes and with `RankMismatch`
    /// if the non-missing axes do not match the storage rank.
    pub fn new(provider: W, storage_rank: usize, missing: Option<Vec<bool>>) -> Result<Self> {
        let system_axes = provider.axis_count();
        let missing = missing.unwrap_or_else(|| vec![false; system_axes]);
        if missing.len() != system_axes {
            return Err(CubeError::MissingAxisCount {
                expected: system_axes,
                found: missing.len(),
            });
        }
        let axes = AxisCorrespondence::new(storage_rank, missing)?;

        debug!(
            storage_rank,
            system_axes,
            missing = axes.missing_count(),
            "Derived axis correspondence"
        );

        Ok(Self { provider, axes })
    }

    pub(crate) fn from_parts(provider: W, axes: AxisCorrespondence) -> Self {
        Self { provider, axes }
    }

    pub fn provider(&self) -> &W {
        &self.provider
    }

    pub fn axes(&self) -> &AxisCorrespondence {
        &self.axes
    }

    pub(crate) fn into_parts(self) -> (W, AxisCorrespondence) {
        (self.provider, self.axes)
    }

    /// Convert pixel coordinates (one per storage axis) to world coordinates.
    ///
    /// Inputs must be expressed in pixels. Outputs carry each axis's declared
    /// unit.
    pub fn pixel_to_world(&self, pixels: &[Quantity], origin: Origin) -> Result<Vec<Quantity>> {
        self.check_arity(pixels.len())?;

        let mut args = vec![0.0; self.axes.system_axis_count()];
        for slot in self.axes.slots() {
            match slot {
                AxisSlot::Missing { system } => {
                    // Reference pixel is 1-based; express it in the caller's origin
                    args[system] = self.provider.reference_pixel(system) - 1.0 + origin.offset();
                }
                AxisSlot::Present { system, storage } => {
                    args[system] = pixels[storage].value_in(&PIXEL)?;
                }
            }
        }

        let world = self.provider.forward(&args, origin)?;
        self.collect_present(&world, |system, value| {
            Quantity::new(value, self.provider.unit(system))
        })
    }

    /// Convert world coordinates (one per storage axis) to pixel coordinates.
    ///
    /// Each input is converted to its axis's declared unit first; outputs
    /// are in pixels.
    pub fn world_to_pixel(&self, world: &[Quantity], origin: Origin) -> Result<Vec<Quantity>> {
        self.check_arity(world.len())?;

        let mut args = vec![0.0; self.axes.system_axis_count()];
        for slot in self.axes.slots() {
            match slot {
                AxisSlot::Missing { system } => {
                    args[system] = self.provider.reference_value(system);
                }
                AxisSlot::Present { system, storage } => {
                    args[system] = world[storage].value_in(&self.provider.unit(system))?;
                }
            }
        }

        let pixels = self.provider.inverse(&args, origin)?;
        self.collect_present(&pixels, |_, value| Quantity::new(value, PIXEL))
    }

    fn check_arity(&self, found: usize) -> Result<()> {
        let expected = self.axes.storage_rank();
        if found != expected {
            return Err(CubeError::argument_count(expected, found));
        }
        Ok(())
    }

    /// Keep the non-missing entries of a system-order result, in storage order.
    fn collect_present(
        &self,
        values: &[f64],
        tag: impl Fn(usize, f64) -> Quantity,
    ) -> Result<Vec<Quantity>> {
        if values.len() != self.axes.system_axis_count() {
            return Err(CubeError::transform(format!(
                "provider returned {} values for {} axes",
                values.len(),
                self.axes.system_axis_count()
            )));
        }
        Ok((0..self.axes.storage_rank())
            .filter_map(|storage| self.axes.system_axis(storage))
            .map(|system| tag(system, values[system]))
            .collect())
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::units::{DEGREE, NANOMETER, SECOND};
    use crate::wcs::{LinearAxis, LinearTransform};
    use proptest::prelude::*;

    fn transform() -> LinearTransform {
        LinearTransform::new(vec![
            LinearAxis::new("TIME", SECOND, 5.0, 12.0, 1.5),
            LinearAxis::new("HPLN-TAN", DEGREE, 1.0, -3.0, 0.01),
            LinearAxis::new("HPLT-TAN", DEGREE, 20.0, 4.0, -0.02),
            LinearAxis::new("WAVE", NANOMETER, 2.0, 393.0, 0.05),
        ])
        .unwrap()
    }

    proptest! {
        /// Property: world_to_pixel inverts pixel_to_world when no axis is missing.
        #[test]
        fn prop_round_trip(pixels in prop::collection::vec(-50.0f64..500.0, 4)) {
            let t = CoordinateTransform::new(transform(), 4, None).unwrap();
            let input: Vec<Quantity> = pixels.iter().map(|&p| p * PIXEL).collect();

            let world = t.pixel_to_world(&input, Origin::Zero).unwrap();
            let back = t.world_to_pixel(&world, Origin::Zero).unwrap();

            for (a, b) in input.iter().zip(&back) {
                prop_assert!((a.value - b.value).abs() < 1e-6, "{} vs {}", a, b);
            }
        }

        /// Property: both conversions return one value per storage axis.
        #[test]
        fn prop_output_arity(
            missing in prop::collection::vec(any::<bool>(), 4),
            seed in 0.0f64..100.0,
        ) {
            let rank = missing.iter().filter(|&&m| !m).count();
            let t = CoordinateTransform::new(transform(), rank, Some(missing)).unwrap();
            let input: Vec<Quantity> = (0..rank).map(|i| (seed + i as f64) * PIXEL).collect();

            let world = t.pixel_to_world(&input, Origin::Zero).unwrap();
            prop_assert_eq!(world.len(), rank);
            let pixels = t.world_to_pixel(&world, Origin::Zero).unwrap();
            prop_assert_eq!(pixels.len(), rank);
        }
    }
}
