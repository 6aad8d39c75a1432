//! Cubes with storage axes arranged by physical axis type.
//!
//! In storage order, time axes come first, then spectral, then celestial,
//! then any other axis. Axes of equal priority keep their relative order.

use tracing::debug;

use super::{AxisBinding, Cube, CubeOptions};
use crate::error::Result;
use crate::storage::ArrayStorage;
use crate::wcs::{CoordinateTransform, WorldTransform};

/// Storage-order priority of an axis type label; lower sorts first.
pub fn axis_priority(axis_type: &str) -> u8 {
    let prefix = axis_type.split('-').next().unwrap_or_default();
    match prefix {
        "TIME" | "UTC" => 0,
        "WAVE" | "AWAV" | "FREQ" | "ENER" | "WAVN" | "VRAD" | "VOPT" | "ZOPT" | "VELO"
        | "BETA" => 1,
        "HPLN" | "HPLT" | "HGLN" | "HGLT" | "CRLN" | "CRLT" | "SOLX" | "SOLY" | "RA" | "DEC"
        | "GLON" | "GLAT" | "ELON" | "ELAT" => 2,
        _ => 3,
    }
}

impl<S: ArrayStorage, W: WorldTransform> Cube<S, W> {
    /// Create a cube with its axes arranged by type: time, spectral,
    /// celestial, then the rest.
    ///
    /// Arguments are given in their own axis order, exactly as for
    /// [`Cube::new`]. The storage array is transposed and the provider's
    /// system axes reordered to match, and missing-axis flags and extra
    /// coordinate bindings follow their axes into the new order.
    ///
    /// # Errors
    ///
    /// Anything [`Cube::new`] rejects.
    pub fn new_ordered(data: S, provider: W, mut options: CubeOptions) -> Result<Self> {
        let transform =
            CoordinateTransform::new(provider, data.rank(), options.missing_axes.take())?;
        let axes = transform.axes();

        // System axes as they appear in storage order, sorted stably
        let mut storage_order: Vec<usize> = (0..axes.system_axis_count()).rev().collect();
        storage_order.sort_by_key(|&system| axis_priority(transform.provider().axis_type(system)));

        let system_order: Vec<usize> = storage_order.iter().rev().copied().collect();
        let missing: Vec<bool> = system_order
            .iter()
            .map(|&system| axes.is_missing(system))
            .collect();
        let data_order: Vec<usize> = storage_order
            .iter()
            .filter_map(|&system| axes.storage_axis(system))
            .collect();

        let mut new_position = vec![0; data_order.len()];
        for (new, &old) in data_order.iter().enumerate() {
            new_position[old] = new;
        }
        // Out-of-range axes are left for Cube::new to report
        let renumber = |axis: usize| new_position.get(axis).copied().unwrap_or(axis);
        for coord in &mut options.extra_coords {
            coord.axes = match &coord.axes {
                AxisBinding::Single(axis) => AxisBinding::Single(renumber(*axis)),
                AxisBinding::Multiple(bound) => {
                    AxisBinding::Multiple(bound.iter().map(|&axis| renumber(axis)).collect())
                }
            };
        }

        debug!(?data_order, ?system_order, "Arranged cube axes by type");

        let (provider, _) = transform.into_parts();
        let provider = provider.reindex(&system_order)?;
        let data = data.permute_axes(&data_order)?;
        options.missing_axes = Some(missing);
        Cube::new(data, provider, options)
    }
}
