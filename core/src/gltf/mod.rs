//! Lazy glTF 2.0 loading.
//!
//! [`GltfLoader`] reads a `.gltf` or `.glb` document and returns a
//! [`GltfAsset`]. Nothing else is fetched up front: buffers, buffer views,
//! accessors and images are resolved on demand, each buffer and image at most
//! once per asset, through the [`lazy_gltf_vfs::Vfs`] the loader was built
//! with.
//!
//! # Where bytes come from
//!
//! A buffer is either the binary chunk of a `.glb` container (buffer 0
//! without a `uri`), a `data:` URI decoded in place, or a URL resolved
//! against the asset's base path and fetched through the VFS. Buffer views
//! are zero-copy sub-views of their buffer. Accessors apply `byteOffset`,
//! `byteStride` and the sparse overlay on top of a buffer view. Images are
//! fetched (or wrapped in a transient `blob:` URL when embedded in a buffer
//! view) and decoded by an [`ImageDecoder`].
//!
//! # Example
//!
//! ```ignore
//! use lazy_gltf_core::gltf::GltfLoader;
//! use lazy_gltf_vfs::{FileSystemProvider, Vfs};
//!
//! let mut vfs = Vfs::new();
//! vfs.mount("file", FileSystemProvider::new("./assets"));
//! vfs.set_default("file");
//!
//! let asset = pollster::block_on(GltfLoader::new(vfs).load("ToyCar.glb", None))?;
//! let indices = pollster::block_on(asset.accessor_data(0))?.to_u32_vec()?;
//! println!("{} triangles", indices.len() / 3);
//! ```

mod accessor;
mod asset;
mod buffer;
mod cache;
mod error;
pub mod glb;
mod image;
mod loader;
#[cfg(test)]
mod tests;
pub mod types;

pub use accessor::{AccessorData, AccessorType, ComponentType};
pub use asset::{Dependency, GltfAsset, Resolved};
pub use buffer::BufferData;
pub use error::{ErrorKind, GltfError};
pub use glb::{GlbContainer, decode_glb, is_glb};
#[cfg(feature = "image-decode")]
pub use self::image::RgbaImageDecoder;
pub use self::image::{DecodedImage, ImageDecoder};
pub use loader::{GltfLoader, GltfSource};
pub use types::Document;
