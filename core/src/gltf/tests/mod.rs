//! Scenario tests for loading assets and resolving their data.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use lazy_gltf_vfs::{MemoryProvider, ProgressFn, Vfs, VfsFuture, VfsProvider};
use parking_lot::Mutex;

use crate::gltf::glb::{CHUNK_BIN, CHUNK_JSON, GLB_MAGIC};
use crate::gltf::{DecodedImage, GltfLoader, ImageDecoder};

mod glb_test;

/// A future that is pending on its first poll and ready on the second.
pub(crate) struct YieldOnce(bool);

pub(crate) fn yield_once() -> YieldOnce {
    YieldOnce(false)
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Assemble a GLB container: JSON padded with spaces, BIN with zeros.
pub(crate) fn build_glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let json_pad = (4 - (json.len() % 4)) % 4;
    let json_chunk_len = json.len() + json_pad;

    let bin_pad = (4 - (bin.len() % 4)) % 4;
    let bin_chunk_len = bin.len() + bin_pad;

    let has_bin = !bin.is_empty();
    let total_length = 12 + 8 + json_chunk_len + if has_bin { 8 + bin_chunk_len } else { 0 };

    let mut glb = Vec::with_capacity(total_length);

    // Header
    glb.extend_from_slice(&GLB_MAGIC);
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk
    glb.extend_from_slice(&(json_chunk_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json.as_bytes());
    glb.extend(std::iter::repeat_n(b' ', json_pad));

    // BIN chunk
    if has_bin {
        glb.extend_from_slice(&(bin_chunk_len as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(bin);
        glb.extend(std::iter::repeat_n(0u8, bin_pad));
    }

    glb
}

pub(crate) fn f32_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

/// In-memory files that count reads and suspend once per read, so that
/// concurrent callers really overlap.
#[derive(Clone, Default)]
pub(crate) struct CountingProvider {
    files: MemoryProvider,
    reads: Arc<Mutex<HashMap<String, usize>>>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, data: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url, data.into());
        self
    }

    pub fn insert(&self, url: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(url, data.into());
    }

    pub fn reads(&self, url: &str) -> usize {
        self.reads.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().values().sum()
    }
}

impl VfsProvider for CountingProvider {
    fn read(&self, url: &str, progress: Option<ProgressFn>) -> VfsFuture<Vec<u8>> {
        *self.reads.lock().entry(url.to_owned()).or_default() += 1;
        let read = self.files.read(url, progress);
        Box::pin(async move {
            yield_once().await;
            read.await
        })
    }
}

/// Records every decode. "Decodes" any bytes into a `len x 1` image, except
/// bytes starting with `bad`.
#[derive(Clone, Default)]
pub(crate) struct CountingDecoder {
    calls: Arc<Mutex<Vec<Option<String>>>>,
}

impl CountingDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decodes(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn mime_types(&self) -> Vec<Option<String>> {
        self.calls.lock().clone()
    }
}

impl ImageDecoder for CountingDecoder {
    fn decode(&self, bytes: &[u8], mime_type: Option<&str>) -> Result<DecodedImage, String> {
        self.calls.lock().push(mime_type.map(str::to_owned));
        if bytes.starts_with(b"bad") {
            return Err("corrupt image data".into());
        }
        Ok(DecodedImage {
            width: bytes.len() as u32,
            height: 1,
            data: bytes.to_vec(),
        })
    }
}

/// A VFS whose relative and `https` URLs go to `files`.
pub(crate) fn vfs_with(files: &CountingProvider) -> Vfs {
    let mut vfs = Vfs::new();
    vfs.mount("mem", files.clone());
    vfs.mount("https", files.clone());
    vfs.set_default("mem");
    vfs
}

pub(crate) fn loader_with(files: &CountingProvider, decoder: &CountingDecoder) -> GltfLoader {
    GltfLoader::new(vfs_with(files)).with_image_decoder(decoder.clone())
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
