//! Cropping by world coordinates.
//!
//! A crop region is given as a lower corner and a width per storage axis,
//! both in world units. The corner and the far corner are converted to
//! pixels, rounded, and turned into one half-open index range per axis.
//!
//! # Rounding
//!
//! Both boundaries round half away from zero (`f64::round`), so a boundary
//! that lands exactly between two pixels resolves the same way whether it is
//! a lower or an upper edge.
//!
//! # Degenerate Regions
//!
//! - A width of zero gives a zero-extent range along that axis
//! - An upper boundary at or below the lower one also gives zero extent
//! - Boundaries before pixel 0 clamp to 0; slicing clamps to the extent

use std::ops::Range;

use tracing::debug;

use crate::error::{CubeError, Result};
use crate::units::Quantity;
use crate::wcs::{CoordinateTransform, Origin, WorldTransform};

/// Compute the storage index ranges covered by a world-coordinate region.
///
/// # Arguments
///
/// * `transform` - Coordinate transform of the cube being cropped
/// * `lower_corner` - World coordinate of the lower corner, per storage axis
/// * `widths` - World extent of the region, per storage axis
///
/// # Errors
///
/// `ArgumentCount` if either list does not have one entry per storage axis,
/// or any conversion error raised by the transform.
pub fn crop_ranges<W: WorldTransform>(
    transform: &CoordinateTransform<W>,
    lower_corner: &[Quantity],
    widths: &[Quantity],
) -> Result<Vec<Range<usize>>> {
    let rank = transform.axes().storage_rank();
    for found in [lower_corner.len(), widths.len()] {
        if found != rank {
            return Err(CubeError::argument_count(rank, found));
        }
    }

    let upper_corner = lower_corner
        .iter()
        .zip(widths)
        .map(|(corner, width)| corner.try_add(width))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let lower_pixels = transform.world_to_pixel(lower_corner, Origin::Zero)?;
    let upper_pixels = transform.world_to_pixel(&upper_corner, Origin::Zero)?;

    let ranges: Vec<Range<usize>> = lower_pixels
        .iter()
        .zip(&upper_pixels)
        .map(|(lo, hi)| round_boundary(lo.value)..round_boundary(hi.value))
        .collect();

    debug!(?ranges, "Computed crop ranges");

    Ok(ranges)
}

/// Round a pixel boundary half away from zero, clamping negatives to 0.
#[inline]
fn round_boundary(pixel: f64) -> usize {
    let rounded = pixel.round();
    if rounded <= 0.0 || rounded.is_nan() {
        0
    } else {
        rounded as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{DEGREE, NANOMETER, SECOND};
    use crate::wcs::{LinearAxis, LinearTransform};

    /// Storage axes (wave, lat): 10 nm and 0.5 deg per pixel, pixel 0 at
    /// 500 nm and 0 deg.
    fn transform() -> CoordinateTransform<LinearTransform> {
        let provider = LinearTransform::new(vec![
            LinearAxis::new("HPLT-TAN", DEGREE, 1.0, 0.0, 0.5),
            LinearAxis::new("WAVE", NANOMETER, 1.0, 500.0, 10.0),
        ])
        .unwrap();
        CoordinateTransform::new(provider, 2, None).unwrap()
    }

    #[test]
    fn test_full_region() {
        let ranges = crop_ranges(
            &transform(),
            &[500.0 * NANOMETER, 0.0 * DEGREE],
            &[100.0 * NANOMETER, 5.0 * DEGREE],
        )
        .unwrap();
        assert_eq!(ranges, vec![0..10, 0..10]);
    }

    #[test]
    fn test_center_region() {
        let ranges = crop_ranges(
            &transform(),
            &[520.0 * NANOMETER, 1.0 * DEGREE],
            &[30.0 * NANOMETER, 1.5 * DEGREE],
        )
        .unwrap();
        assert_eq!(ranges, vec![2..5, 2..5]);
    }

    #[test]
    fn test_zero_width_is_empty() {
        let ranges = crop_ranges(
            &transform(),
            &[520.0 * NANOMETER, 1.0 * DEGREE],
            &[0.0 * NANOMETER, 1.5 * DEGREE],
        )
        .unwrap();
        assert!(ranges[0].is_empty());
        assert!(!ranges[1].is_empty());
    }

    #[test]
    fn test_half_pixel_rounds_away_from_zero() {
        // 525 nm is pixel 2.5, 545 nm is pixel 4.5
        let ranges = crop_ranges(
            &transform(),
            &[525.0 * NANOMETER, 0.0 * DEGREE],
            &[20.0 * NANOMETER, 1.0 * DEGREE],
        )
        .unwrap();
        assert_eq!(ranges[0], 3..5);
    }

    #[test]
    fn test_negative_boundaries_clamp() {
        let ranges = crop_ranges(
            &transform(),
            &[400.0 * NANOMETER, -2.0 * DEGREE],
            &[150.0 * NANOMETER, 3.0 * DEGREE],
        )
        .unwrap();
        assert_eq!(ranges, vec![0..5, 0..2]);
    }

    #[test]
    fn test_argument_count() {
        let t = transform();
        assert_eq!(
            crop_ranges(&t, &[500.0 * NANOMETER], &[1.0 * NANOMETER, 1.0 * DEGREE]).unwrap_err(),
            CubeError::argument_count(2, 1)
        );
        assert_eq!(
            crop_ranges(&t, &[500.0 * NANOMETER, 0.0 * DEGREE], &[]).unwrap_err(),
            CubeError::argument_count(2, 0)
        );
    }

    #[test]
    fn test_incompatible_width_unit() {
        let err = crop_ranges(
            &transform(),
            &[500.0 * NANOMETER, 0.0 * DEGREE],
            &[1.0 * SECOND, 1.0 * DEGREE],
        )
        .unwrap_err();
        assert!(matches!(err, CubeError::Unit(_)));
    }

    #[test]
    fn test_round_boundary() {
        assert_eq!(round_boundary(2.5), 3);
        assert_eq!(round_boundary(2.49), 2);
        assert_eq!(round_boundary(-0.5), 0);
        assert_eq!(round_boundary(-3.0), 0);
        assert_eq!(round_boundary(f64::NAN), 0);
    }
}
