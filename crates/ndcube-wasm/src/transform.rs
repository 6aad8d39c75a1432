//! WASM bindings for coordinate conversion, cropping and indexing.
//!
//! Coordinates cross the boundary as plain numbers, one per storage axis in
//! storage order. World values are expressed in each axis's own unit (see
//! `JsCube.world_units`); pixel values are in pixels.

use crate::types::{to_js_error, CoreCube, JsCube};
use ndcube_core::units::PIXEL;
use ndcube_core::{CubeError, Origin, Quantity, WorldCoordinates};
use wasm_bindgen::prelude::*;

/// Convert pixel coordinates to world coordinates.
///
/// # Arguments
///
/// * `cube` - Cube whose transform is used
/// * `pixels` - One pixel coordinate per storage axis
/// * `origin` - 0 for zero-based pixel numbering, 1 for one-based; any
///   other value is an error
///
/// # Returns
///
/// One world value per storage axis, in that axis's unit.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const [wave, lat] = pixel_to_world(cube, new Float64Array([12, 40]), 0);
/// ```
#[wasm_bindgen]
pub fn pixel_to_world(cube: &JsCube, pixels: Vec<f64>, origin: u8) -> Result<Vec<f64>, JsValue> {
    pixel_values_to_world(cube.inner(), &pixels, origin).map_err(to_js_error)
}

/// Convert world coordinates to pixel coordinates.
///
/// # Arguments
///
/// * `cube` - Cube whose transform is used
/// * `world` - One world value per storage axis, in that axis's unit
/// * `origin` - 0 for zero-based pixel numbering, 1 for one-based; any
///   other value is an error
#[wasm_bindgen]
pub fn world_to_pixel(cube: &JsCube, world: Vec<f64>, origin: u8) -> Result<Vec<f64>, JsValue> {
    world_values_to_pixel(cube.inner(), &world, origin).map_err(to_js_error)
}

/// Crop a cube to a world-coordinate region.
///
/// # Arguments
///
/// * `cube` - Source cube
/// * `lower_corner` - World coordinate of the lower corner per storage axis
/// * `widths` - Region width per storage axis, in the same units
///
/// # Returns
///
/// New `JsCube` covering the region, with its transform and extra
/// coordinates adjusted to match.
///
/// # Example (TypeScript)
///
/// ```typescript
/// // 2 Angstrom around 2796 Angstrom, 10 arcsec along the slit
/// const cropped = crop_by_coords(cube, [2795, -5], [2, 10]);
/// ```
#[wasm_bindgen]
pub fn crop_by_coords(
    cube: &JsCube,
    lower_corner: Vec<f64>,
    widths: Vec<f64>,
) -> Result<JsCube, JsValue> {
    crop_cube(cube.inner(), &lower_corner, &widths)
        .map(JsCube::from_cube)
        .map_err(to_js_error)
}

/// Select one position along a storage axis and remove that axis.
///
/// The removed axis stays in the transform as a missing axis, so the
/// returned cube still reports its world value.
#[wasm_bindgen]
pub fn index_axis(cube: &JsCube, axis: u32, index: u32) -> Result<JsCube, JsValue> {
    cube.inner()
        .index_axis(axis as usize, index as usize)
        .map(JsCube::from_cube)
        .map_err(to_js_error)
}

fn pixel_values_to_world(
    cube: &CoreCube,
    pixels: &[f64],
    origin: u8,
) -> Result<Vec<f64>, CubeError> {
    let origin = Origin::try_from(origin)?;
    let pixels: Vec<Quantity> = pixels.iter().map(|&p| p * PIXEL).collect();
    let world = cube.pixel_to_world(&pixels, origin)?;
    Ok(world.iter().map(|q| q.value).collect())
}

fn world_values_to_pixel(
    cube: &CoreCube,
    world: &[f64],
    origin: u8,
) -> Result<Vec<f64>, CubeError> {
    let origin = Origin::try_from(origin)?;
    let world = tag_world_values(cube, world)?;
    let pixels = cube.world_to_pixel(&world, origin)?;
    Ok(pixels.iter().map(|q| q.value).collect())
}

fn crop_cube(cube: &CoreCube, lower_corner: &[f64], widths: &[f64]) -> Result<CoreCube, CubeError> {
    let lower_corner = tag_world_values(cube, lower_corner)?;
    let widths = tag_world_values(cube, widths)?;
    cube.crop_by_coords(&lower_corner, &widths)
}

/// Attach each storage axis's world unit to plain values.
fn tag_world_values(cube: &CoreCube, values: &[f64]) -> Result<Vec<Quantity>, CubeError> {
    let units = cube.world_units();
    if values.len() != units.len() {
        return Err(CubeError::argument_count(units.len(), values.len()));
    }
    Ok(values
        .iter()
        .zip(units)
        .map(|(&value, unit)| Quantity::new(value, unit))
        .collect())
}
