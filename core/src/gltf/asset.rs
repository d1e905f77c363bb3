//! The loaded asset and its lazy data accessors.

use std::sync::Arc;

use futures::future::join_all;
use lazy_gltf_vfs::FileLoader;

use super::accessor::{AccessorData, AccessorLayout, apply_sparse, extract_elements};
use super::buffer::{BufferData, BufferResolver};
use super::error::GltfError;
use super::image::{DecodedImage, ImageDecoder, ImageResolver};
use super::types::Document;

/// A piece of data an asset can resolve on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    Buffer(usize),
    BufferView(usize),
    Accessor(usize),
    Image(usize),
}

/// The result of resolving a [`Dependency`].
#[derive(Debug, Clone)]
pub enum Resolved {
    Buffer(BufferData),
    BufferView(BufferData),
    Accessor(AccessorData),
    Image(Arc<DecodedImage>),
}

pub(crate) struct AssetInner {
    pub document: Document,
    pub binary_chunk: Option<BufferData>,
    pub base_path: String,
    pub loader: FileLoader,
    pub buffers: BufferResolver,
    pub images: ImageResolver,
}

impl AssetInner {
    pub async fn buffer_data(&self, index: usize) -> Result<BufferData, GltfError> {
        self.buffers
            .get(&self.document, self.binary_chunk.as_ref(), index)
            .await
    }

    pub async fn buffer_view_data(&self, index: usize) -> Result<BufferData, GltfError> {
        let views = self
            .document
            .buffer_views
            .as_deref()
            .ok_or_else(|| GltfError::structural("document has no bufferViews"))?;
        let view = views.get(index).ok_or_else(|| {
            GltfError::structural(format!(
                "bufferView {index} out of range ({} bufferViews)",
                views.len()
            ))
        })?;

        let buffer = self.buffer_data(view.buffer).await?;
        let offset = view.byte_offset.unwrap_or(0);
        let len = view.byte_length.unwrap_or(0);
        buffer.slice(offset, len).ok_or_else(|| {
            GltfError::structural(format!(
                "bufferView {index} ({len} bytes at {offset}) exceeds buffer {} ({} bytes)",
                view.buffer,
                buffer.len()
            ))
        })
    }

    pub async fn accessor_data(&self, index: usize) -> Result<AccessorData, GltfError> {
        let accessors = self
            .document
            .accessors
            .as_deref()
            .ok_or_else(|| GltfError::structural("document has no accessors"))?;
        let accessor = accessors.get(index).ok_or_else(|| {
            GltfError::structural(format!(
                "accessor {index} out of range ({} accessors)",
                accessors.len()
            ))
        })?;
        let layout = AccessorLayout::from_accessor(index, accessor)?;

        let base = match accessor.buffer_view {
            Some(view_index) => {
                let view = self.buffer_view_data(view_index).await?;
                let stride = self
                    .document
                    .buffer_views
                    .as_deref()
                    .and_then(|views| views.get(view_index))
                    .and_then(|view| view.byte_stride);
                extract_elements(
                    index,
                    &layout,
                    &view,
                    accessor.byte_offset.unwrap_or(0),
                    stride,
                )?
            }
            None => {
                let len = layout.byte_len()?;
                BufferData::zeroed(len).ok_or_else(|| {
                    GltfError::structural(format!("accessor {index}: cannot allocate {len} bytes"))
                })?
            }
        };

        let data = match &accessor.sparse {
            None => base,
            Some(sparse) => {
                let (indices, values) = futures::join!(
                    self.buffer_view_data(sparse.indices.buffer_view),
                    self.buffer_view_data(sparse.values.buffer_view),
                );
                apply_sparse(index, &layout, &base, sparse, &indices?, &values?)?
            }
        };
        Ok(AccessorData::new(layout, data))
    }
}

/// A parsed glTF asset.
///
/// Holds the JSON document and, for `.glb` input, the binary chunk. Buffers
/// and images are fetched the first time they are asked for and cached per
/// index; concurrent requests for the same index share one fetch. Clones
/// share the caches.
#[derive(Clone)]
pub struct GltfAsset {
    inner: Arc<AssetInner>,
}

impl GltfAsset {
    pub(crate) fn new(
        document: Document,
        binary_chunk: Option<BufferData>,
        base_path: String,
        loader: FileLoader,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Self {
        let buffers = BufferResolver::new(base_path.clone(), loader.clone());
        Self {
            inner: Arc::new(AssetInner {
                document,
                binary_chunk,
                base_path,
                loader,
                buffers,
                images: ImageResolver::new(decoder),
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// The GLB binary chunk, including any alignment padding.
    pub fn binary_chunk(&self) -> Option<&BufferData> {
        self.inner.binary_chunk.as_ref()
    }

    /// Prefix relative URIs are resolved against.
    pub fn base_path(&self) -> &str {
        &self.inner.base_path
    }

    /// Bytes of `buffers[index]`.
    pub async fn buffer_data(&self, index: usize) -> Result<BufferData, GltfError> {
        self.inner.buffer_data(index).await
    }

    /// Bytes of `bufferViews[index]`, sharing storage with the owning buffer.
    pub async fn buffer_view_data(&self, index: usize) -> Result<BufferData, GltfError> {
        self.inner.buffer_view_data(index).await
    }

    /// Data of `accessors[index]` with `byteOffset`, `byteStride` and any
    /// sparse overlay applied.
    ///
    /// Accessors are not cached themselves; the buffers behind them are.
    pub async fn accessor_data(&self, index: usize) -> Result<AccessorData, GltfError> {
        self.inner.accessor_data(index).await
    }

    /// Decoded pixels of `images[index]`.
    pub async fn image_data(&self, index: usize) -> Result<Arc<DecodedImage>, GltfError> {
        self.inner.images.get(&self.inner, index).await
    }

    pub async fn resolve(&self, dependency: Dependency) -> Result<Resolved, GltfError> {
        Ok(match dependency {
            Dependency::Buffer(i) => Resolved::Buffer(self.buffer_data(i).await?),
            Dependency::BufferView(i) => Resolved::BufferView(self.buffer_view_data(i).await?),
            Dependency::Accessor(i) => Resolved::Accessor(self.accessor_data(i).await?),
            Dependency::Image(i) => Resolved::Image(self.image_data(i).await?),
        })
    }

    /// Resolve every declared buffer.
    ///
    /// Every load runs to completion even when one fails; the error returned
    /// is the one with the lowest index.
    pub async fn prefetch_buffers(&self) -> Result<Vec<BufferData>, GltfError> {
        let count = self.document().buffers.as_ref().map_or(0, Vec::len);
        let buffers = join_all((0..count).map(|i| self.buffer_data(i)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "prefetched {count} buffer(s), {} bytes",
            buffers.iter().map(BufferData::len).sum::<usize>()
        );
        Ok(buffers)
    }

    /// Resolve every declared image, with the same error rule as
    /// [`prefetch_buffers`](Self::prefetch_buffers).
    pub async fn prefetch_images(&self) -> Result<Vec<Arc<DecodedImage>>, GltfError> {
        let count = self.document().images.as_ref().map_or(0, Vec::len);
        let images = join_all((0..count).map(|i| self.image_data(i)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("prefetched {count} image(s)");
        Ok(images)
    }

    /// [`prefetch_buffers`](Self::prefetch_buffers) and
    /// [`prefetch_images`](Self::prefetch_images) together.
    pub async fn prefetch_all(&self) -> Result<(), GltfError> {
        let (buffers, images) = futures::join!(self.prefetch_buffers(), self.prefetch_images());
        buffers?;
        images?;
        Ok(())
    }

    /// `buffers[index]` if it has already been resolved.
    pub fn cached_buffer(&self, index: usize) -> Option<BufferData> {
        self.inner.buffers.cached(index)
    }

    /// `images[index]` if it has already been decoded.
    pub fn cached_image(&self, index: usize) -> Option<Arc<DecodedImage>> {
        self.inner.images.cached(index)
    }

    /// The fetcher this asset resolves through.
    pub fn loader(&self) -> &FileLoader {
        &self.inner.loader
    }
}

impl std::fmt::Debug for GltfAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GltfAsset")
            .field("base_path", &self.inner.base_path)
            .field("binary_chunk", &self.inner.binary_chunk)
            .finish_non_exhaustive()
    }
}
