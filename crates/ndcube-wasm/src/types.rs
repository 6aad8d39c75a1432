//! WASM-compatible wrapper types for cubes.
//!
//! This module provides a JavaScript-friendly cube type wrapping the core
//! `Cube`, handling conversion between Rust and JavaScript representations.

use std::fmt::Display;

use ndcube_core::{Cube, CubeError, CubeOptions, DenseArray, Dimensioned, LinearTransform, Unit};
use wasm_bindgen::prelude::*;

/// The cube type exposed to JavaScript: `f64` values with a linear transform.
pub(crate) type CoreCube = Cube<DenseArray<f64>, LinearTransform>;

/// Helper struct for deserializing the JS cube descriptor via serde.
#[derive(serde::Deserialize)]
struct CubeDescriptor {
    transform: LinearTransform,
    #[serde(default)]
    options: CubeOptions,
}

/// A data cube wrapper for JavaScript.
///
/// Values are stored row-major in WASM memory. Storage axes are listed in
/// storage order everywhere: `shape`, `axis_types`, and the coordinate
/// arrays taken by the transform functions.
#[wasm_bindgen]
pub struct JsCube {
    inner: CoreCube,
}

#[wasm_bindgen]
impl JsCube {
    /// Create a cube from its shape, row-major data and a descriptor.
    ///
    /// # Arguments
    /// * `shape` - Extent of each storage axis
    /// * `data` - Row-major values; length must be the product of `shape`
    /// * `descriptor` - `{ transform, options? }` where `transform` is an
    ///   array of `{ axis_type, unit, reference_pixel, reference_value, scale }`
    ///   in transform order and `options` may hold `missing_axes`,
    ///   `extra_coords`, `unit` and `meta`
    ///
    /// # Errors
    /// Returns error if the descriptor cannot be deserialized or the cube
    /// fails validation
    #[wasm_bindgen(constructor)]
    pub fn new(shape: Vec<u32>, data: Vec<f64>, descriptor: JsValue) -> Result<JsCube, JsValue> {
        let descriptor: CubeDescriptor = serde_wasm_bindgen::from_value(descriptor)
            .map_err(|e| JsValue::from_str(&format!("Invalid cube descriptor: {}", e)))?;
        let shape = shape.into_iter().map(|n| n as usize).collect();
        Self::from_parts(shape, data, descriptor.transform, descriptor.options).map_err(to_js_error)
    }

    /// Extent of each storage axis.
    #[wasm_bindgen(getter)]
    pub fn shape(&self) -> Vec<u32> {
        self.inner.data().shape().iter().map(|&n| n as u32).collect()
    }

    /// Axis type label of each storage axis.
    #[wasm_bindgen(getter)]
    pub fn axis_types(&self) -> js_sys::Array {
        self.axis_type_labels()
            .into_iter()
            .map(|label| JsValue::from_str(&label))
            .collect()
    }

    /// World unit symbol of each storage axis.
    #[wasm_bindgen(getter)]
    pub fn world_units(&self) -> js_sys::Array {
        self.unit_symbols()
            .into_iter()
            .map(JsValue::from_str)
            .collect()
    }

    /// One flag per transform axis; 1 marks an axis with no storage axis.
    #[wasm_bindgen(getter)]
    pub fn missing_axes(&self) -> Vec<u8> {
        self.inner
            .missing_axes()
            .iter()
            .map(|&missing| u8::from(missing))
            .collect()
    }

    /// Returns the values as Float64Array.
    ///
    /// Note: This creates a copy of the data.
    pub fn data(&self) -> Vec<f64> {
        self.inner.data().as_slice().to_vec()
    }

    /// Extra coordinates as `{ name: { name, axes, value } }`.
    pub fn extra_coords(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.extra_coords()).map_err(to_js_error)
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {}
}

impl JsCube {
    /// Build a cube from already-decoded parts.
    pub(crate) fn from_parts(
        shape: Vec<usize>,
        data: Vec<f64>,
        transform: LinearTransform,
        options: CubeOptions,
    ) -> Result<Self, CubeError> {
        transform.validate()?;
        let data = DenseArray::new(shape, data)?;
        let inner = Cube::new(data, transform, options)?;
        Ok(Self { inner })
    }

    pub(crate) fn from_cube(inner: CoreCube) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &CoreCube {
        &self.inner
    }

    pub(crate) fn axis_type_labels(&self) -> Vec<String> {
        self.inner.dimensions().axis_types
    }

    pub(crate) fn unit_symbols(&self) -> Vec<&'static str> {
        self.inner.world_units().iter().map(Unit::symbol).collect()
    }
}

/// Convert a core error into a JS error string.
pub(crate) fn to_js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndcube_core::units::{ARCSEC, SECOND};
    use ndcube_core::LinearAxis;

    fn test_transform() -> LinearTransform {
        LinearTransform::new(vec![
            LinearAxis::new("HPLN-TAN", ARCSEC, 1.0, 0.0, 2.0),
            LinearAxis::new("TIME", SECOND, 1.0, 0.0, 60.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_js_cube_creation() {
        let options = CubeOptions::default();
        let cube = JsCube::from_parts(vec![3, 4], vec![0.0; 12], test_transform(), options).unwrap();
        assert_eq!(cube.shape(), vec![3, 4]);
        assert_eq!(cube.axis_type_labels(), vec!["TIME", "HPLN-TAN"]);
        assert_eq!(cube.unit_symbols(), vec!["s", "arcsec"]);
        assert_eq!(cube.missing_axes(), vec![0, 0]);
        assert_eq!(cube.data().len(), 12);
    }

    #[test]
    fn test_js_cube_rejects_bad_data_length() {
        let options = CubeOptions::default();
        let err = JsCube::from_parts(vec![3, 4], vec![0.0; 10], test_transform(), options)
            .err()
            .unwrap();
        assert!(matches!(err, CubeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_js_cube_missing_axis() {
        let options = CubeOptions {
            missing_axes: Some(vec![false, true]),
            ..Default::default()
        };
        let cube = JsCube::from_parts(vec![5], vec![1.0; 5], test_transform(), options).unwrap();
        assert_eq!(cube.missing_axes(), vec![0, 1]);
        assert_eq!(cube.axis_type_labels(), vec!["HPLN-TAN"]);
    }
}

/// WASM-specific tests that require JsValue.
///
/// These tests use the `JsCube::new` constructor which takes a `JsValue`
/// parameter and can only run on wasm32 targets. Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde::Serialize;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Serialize)]
    struct TestAxis {
        axis_type: &'static str,
        unit: &'static str,
        reference_pixel: f64,
        reference_value: f64,
        scale: f64,
    }

    #[derive(Serialize)]
    struct TestDescriptor {
        transform: Vec<TestAxis>,
    }

    fn descriptor() -> JsValue {
        let descriptor = TestDescriptor {
            transform: vec![
                TestAxis {
                    axis_type: "WAVE",
                    unit: "nm",
                    reference_pixel: 1.0,
                    reference_value: 393.0,
                    scale: 0.01,
                },
                TestAxis {
                    axis_type: "TIME",
                    unit: "s",
                    reference_pixel: 1.0,
                    reference_value: 0.0,
                    scale: 4.0,
                },
            ],
        };
        serde_wasm_bindgen::to_value(&descriptor).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_construct_from_descriptor() {
        let cube = JsCube::new(vec![3, 5], vec![0.0; 15], descriptor()).unwrap();
        assert_eq!(cube.shape(), vec![3, 5]);
        assert_eq!(cube.axis_types().length(), 2);
        assert_eq!(cube.axis_types().get(0).as_string().unwrap(), "TIME");
    }

    #[wasm_bindgen_test]
    fn test_invalid_descriptor() {
        let invalid = serde_wasm_bindgen::to_value(&42).unwrap();
        assert!(JsCube::new(vec![3], vec![0.0; 3], invalid).is_err());
    }

    #[wasm_bindgen_test]
    fn test_rank_mismatch_is_error() {
        assert!(JsCube::new(vec![15], vec![0.0; 15], descriptor()).is_err());
    }
}
