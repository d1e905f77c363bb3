//! Buffer bytes and the buffer resolver.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use lazy_gltf_vfs::FileLoader;
use lazy_gltf_vfs::url::resolve_url;

use super::cache::ResolverCache;
use super::error::GltfError;
use super::types::Document;

/// A cheaply clonable view into shared bytes.
///
/// Views created by slicing share the storage of their parent and keep their
/// offset relative to the start of that storage. For a GLB asset the storage
/// is the whole container, so every buffer view of the binary chunk points
/// into the same allocation.
#[derive(Clone)]
pub struct BufferData {
    storage: Arc<[u8]>,
    offset: usize,
    len: usize,
}

impl BufferData {
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len = data.len();
        Self {
            storage: data.into(),
            offset: 0,
            len,
        }
    }

    /// A view of `len` bytes starting at `offset` into `storage`.
    ///
    /// Returns `None` if the range does not fit.
    pub fn from_shared(storage: Arc<[u8]>, offset: usize, len: usize) -> Option<Self> {
        let end = offset.checked_add(len)?;
        (end <= storage.len()).then_some(Self {
            storage,
            offset,
            len,
        })
    }

    /// `len` zero bytes in fresh storage, or `None` if that much memory
    /// cannot be allocated.
    pub fn zeroed(len: usize) -> Option<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).ok()?;
        bytes.resize(len, 0);
        Some(Self::from_vec(bytes))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    /// Offset of this view from the start of the underlying storage.
    pub fn storage_offset(&self) -> usize {
        self.offset
    }

    /// Whether both views point into the same allocation.
    pub fn shares_storage_with(&self, other: &BufferData) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// A sub-view sharing this view's storage, or `None` if out of range.
    pub fn slice(&self, offset: usize, len: usize) -> Option<Self> {
        let end = offset.checked_add(len)?;
        (end <= self.len).then(|| Self {
            storage: self.storage.clone(),
            offset: self.offset + offset,
            len,
        })
    }
}

impl Deref for BufferData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for BufferData {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for BufferData {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for BufferData {}

impl From<Vec<u8>> for BufferData {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl fmt::Debug for BufferData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferData")
            .field("len", &self.len)
            .field("storage_offset", &self.offset)
            .finish()
    }
}

/// Where the bytes of `buffers[i]` come from.
enum BufferSource {
    /// The GLB binary chunk, already in memory.
    Embedded(BufferData),
    /// A URI to fetch (external, relative or `data:`).
    Uri { uri: String, byte_length: usize },
}

fn buffer_source(
    document: &Document,
    binary_chunk: Option<&BufferData>,
    index: usize,
) -> Result<BufferSource, GltfError> {
    let buffers = document
        .buffers
        .as_deref()
        .ok_or_else(|| GltfError::structural("document has no buffers"))?;
    let buffer = buffers.get(index).ok_or_else(|| {
        GltfError::structural(format!(
            "buffer {index} out of range ({} buffers)",
            buffers.len()
        ))
    })?;

    match &buffer.uri {
        Some(uri) => Ok(BufferSource::Uri {
            uri: uri.clone(),
            byte_length: buffer.byte_length,
        }),
        None if index != 0 => Err(GltfError::structural(format!(
            "buffer {index} has no uri; only buffer 0 may refer to the GLB binary chunk"
        ))),
        None => {
            let chunk = binary_chunk.ok_or_else(|| {
                GltfError::structural("buffer 0 has no uri and the asset has no GLB binary chunk")
            })?;
            // The chunk may carry up to 3 bytes of alignment padding.
            chunk
                .slice(0, buffer.byte_length)
                .map(BufferSource::Embedded)
                .ok_or_else(|| {
                    GltfError::structural(format!(
                        "GLB binary chunk holds {} bytes but buffer 0 declares {}",
                        chunk.len(),
                        buffer.byte_length
                    ))
                })
        }
    }
}

/// Resolves `buffers[i]` to bytes, fetching each index at most once.
pub(crate) struct BufferResolver {
    base_path: String,
    loader: FileLoader,
    cache: ResolverCache<BufferData>,
}

impl BufferResolver {
    pub fn new(base_path: String, loader: FileLoader) -> Self {
        Self {
            base_path,
            loader,
            cache: ResolverCache::new("buffer"),
        }
    }

    pub async fn get(
        &self,
        document: &Document,
        binary_chunk: Option<&BufferData>,
        index: usize,
    ) -> Result<BufferData, GltfError> {
        self.cache
            .get_or_load(index, || self.load(document, binary_chunk, index))
            .await
    }

    pub fn cached(&self, index: usize) -> Option<BufferData> {
        self.cache.cached(index)
    }

    fn load(
        &self,
        document: &Document,
        binary_chunk: Option<&BufferData>,
        index: usize,
    ) -> BoxFuture<'static, Result<BufferData, GltfError>> {
        let source = buffer_source(document, binary_chunk, index);
        let loader = self.loader.clone();
        let base_path = self.base_path.clone();
        async move {
            match source? {
                BufferSource::Embedded(data) => Ok(data),
                BufferSource::Uri { uri, byte_length } => {
                    let url = resolve_url(&uri, &base_path);
                    let bytes = loader.load(&url, None).await?;
                    if bytes.len() < byte_length {
                        return Err(GltfError::structural(format!(
                            "buffer {index} ({url}) holds {} bytes but declares {byte_length}",
                            bytes.len()
                        )));
                    }
                    Ok(BufferData::from_vec(bytes))
                }
            }
        }
        .boxed()
    }
}
