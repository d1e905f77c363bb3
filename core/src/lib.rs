//! # lazy-gltf core
//!
//! glTF 2.0 / GLB parsing with lazy, cached resolution of buffers,
//! accessors and images. See [`gltf`].

pub mod gltf;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
