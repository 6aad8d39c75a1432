//! NDCube WASM - WebAssembly bindings for ndcube
//!
//! This crate provides WASM bindings to expose the ndcube-core functionality
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible cube wrapper
//! - `transform` - Pixel/world conversion, cropping and axis indexing
//! - `alignment` - Aligned axes normalization and updates
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCube, pixel_to_world } from '@ndcube/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const cube = new JsCube([40, 100], data, { transform: axes });
//! const world = pixel_to_world(cube, [12, 40], 0);
//! ```

use wasm_bindgen::prelude::*;

mod alignment;
mod transform;
mod types;

// Re-export public types
pub use alignment::{sanitize_aligned_axes, update_aligned_axes};
pub use transform::{crop_by_coords, index_axis, pixel_to_world, world_to_pixel};
pub use types::JsCube;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
