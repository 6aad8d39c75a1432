//! WASM bindings for aligned axis declarations.
//!
//! These work on plain shapes, so JavaScript callers can validate
//! alignment for any collection of arrays without building cubes first.

use crate::types::to_js_error;
use ndcube_core::{
    normalize, update_aligned_axes as core_update, AlignedAxes, AlignedAxesInput, AlignedAxesSpec,
    CubeError,
};
use wasm_bindgen::prelude::*;

/// Normalize an aligned axes declaration against member shapes.
///
/// # Arguments
///
/// * `shapes` - Array of member shapes, e.g. `[[4, 10], [3, 10]]`
/// * `aligned_axes` - An int, an array of ints, or one array of ints per member
///
/// # Returns
///
/// One array of axis indices per member.
///
/// # Example (TypeScript)
///
/// ```typescript
/// sanitize_aligned_axes([[4, 10], [3, 10]], 1); // [[1], [1]]
/// ```
#[wasm_bindgen]
pub fn sanitize_aligned_axes(shapes: JsValue, aligned_axes: JsValue) -> Result<JsValue, JsValue> {
    let shapes: Vec<Vec<usize>> = serde_wasm_bindgen::from_value(shapes)
        .map_err(|e| JsValue::from_str(&format!("Invalid shapes: {}", e)))?;
    let input: AlignedAxesInput = serde_wasm_bindgen::from_value(aligned_axes)
        .map_err(|e| JsValue::from_str(&format!("Invalid aligned axes: {}", e)))?;

    let aligned = sanitize(&shapes, input).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&aligned).map_err(to_js_error)
}

/// Rebuild aligned axes after dropping aligned positions.
///
/// # Arguments
///
/// * `aligned_axes` - Canonical aligned axes, one array per member
/// * `drop` - Aligned positions whose axes were removed from every member
///
/// # Returns
///
/// The renumbered aligned axes, or `null` when every position was dropped.
#[wasm_bindgen]
pub fn update_aligned_axes(aligned_axes: JsValue, drop: Vec<u32>) -> Result<JsValue, JsValue> {
    let per_member: Vec<Vec<usize>> = serde_wasm_bindgen::from_value(aligned_axes)
        .map_err(|e| JsValue::from_str(&format!("Invalid aligned axes: {}", e)))?;

    match update(per_member, &drop).map_err(to_js_error)? {
        Some(aligned) => serde_wasm_bindgen::to_value(&aligned).map_err(to_js_error),
        None => Ok(JsValue::NULL),
    }
}

fn sanitize(shapes: &[Vec<usize>], input: AlignedAxesInput) -> Result<AlignedAxes, CubeError> {
    let spec = AlignedAxesSpec::try_from(input)?;
    normalize(shapes, &spec)
}

fn update(per_member: Vec<Vec<usize>>, drop: &[u32]) -> Result<Option<AlignedAxes>, CubeError> {
    let aligned = AlignedAxes::new(per_member)?;
    let drop: Vec<usize> = drop.iter().map(|&p| p as usize).collect();
    core_update(&aligned, &drop)
}
