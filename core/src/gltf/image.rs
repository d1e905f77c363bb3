//! Image decoding and the image resolver.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use lazy_gltf_vfs::url::resolve_url;
use lazy_gltf_vfs::{BlobStore, FileLoader};

use super::asset::AssetInner;
use super::buffer::BufferData;
use super::cache::ResolverCache;
use super::error::GltfError;

/// Decoded RGBA8 image data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, row-major.
    pub data: Vec<u8>,
}

/// Turns encoded image bytes into pixels.
///
/// `mime_type` is the declared type when the document provides one.
pub trait ImageDecoder: Send + Sync + 'static {
    fn decode(&self, bytes: &[u8], mime_type: Option<&str>) -> Result<DecodedImage, String>;
}

/// Decodes PNG, JPEG and WebP with the `image` crate.
#[cfg(feature = "image-decode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbaImageDecoder;

#[cfg(feature = "image-decode")]
impl ImageDecoder for RgbaImageDecoder {
    fn decode(&self, bytes: &[u8], mime_type: Option<&str>) -> Result<DecodedImage, String> {
        let format = match mime_type {
            Some("image/png") => Some(image::ImageFormat::Png),
            Some("image/jpeg") => Some(image::ImageFormat::Jpeg),
            Some("image/webp") => Some(image::ImageFormat::WebP),
            _ => None,
        };
        let img = match format {
            Some(format) => image::load_from_memory_with_format(bytes, format),
            None => image::load_from_memory(bytes),
        }
        .map_err(|e| e.to_string())?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(DecodedImage {
            width,
            height,
            data: rgba.into_raw(),
        })
    }
}

/// Stand-in used when the `image-decode` feature is off and no decoder was
/// supplied.
#[cfg(not(feature = "image-decode"))]
struct NoImageDecoder;

#[cfg(not(feature = "image-decode"))]
impl ImageDecoder for NoImageDecoder {
    fn decode(&self, _bytes: &[u8], _mime_type: Option<&str>) -> Result<DecodedImage, String> {
        Err("no image decoder configured".into())
    }
}

pub(crate) fn default_decoder() -> Arc<dyn ImageDecoder> {
    #[cfg(feature = "image-decode")]
    {
        Arc::new(RgbaImageDecoder)
    }
    #[cfg(not(feature = "image-decode"))]
    {
        Arc::new(NoImageDecoder)
    }
}

/// Resolves `images[i]` to decoded pixels, decoding each index at most once.
pub(crate) struct ImageResolver {
    decoder: Arc<dyn ImageDecoder>,
    cache: ResolverCache<Arc<DecodedImage>>,
}

impl ImageResolver {
    pub fn new(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            decoder,
            cache: ResolverCache::new("image"),
        }
    }

    /// The shared load only captures the fetcher, the decoder and the
    /// image's bytes or URL, never the asset that owns this cache.
    pub async fn get(&self, asset: &AssetInner, index: usize) -> Result<Arc<DecodedImage>, GltfError> {
        if let Some(image) = self.cache.cached(index) {
            return Ok(image);
        }
        let source = image_source(asset, index).await?;
        let loader = asset.loader.clone();
        let decoder = self.decoder.clone();
        self.cache
            .get_or_load(index, move || load(loader, decoder, source))
            .await
    }

    pub fn cached(&self, index: usize) -> Option<Arc<DecodedImage>> {
        self.cache.cached(index)
    }
}

enum ImageSource {
    /// Bytes of a buffer view, served through a transient `blob:` URL.
    Embedded {
        view: usize,
        bytes: BufferData,
        mime_type: String,
    },
    Uri {
        url: String,
        mime_type: Option<String>,
    },
}

async fn image_source(asset: &AssetInner, index: usize) -> Result<ImageSource, GltfError> {
    let images = asset
        .document
        .images
        .as_deref()
        .ok_or_else(|| GltfError::structural("document has no images"))?;
    let image = images.get(index).ok_or_else(|| {
        GltfError::structural(format!("image {index} out of range ({} images)", images.len()))
    })?;

    match (&image.uri, image.buffer_view) {
        (Some(_), Some(_)) => Err(GltfError::structural(format!(
            "image {index} has both a uri and a bufferView"
        ))),
        (None, None) => Err(GltfError::structural(format!(
            "image {index} has neither a uri nor a bufferView"
        ))),
        (None, Some(view)) => {
            let mime_type = image.mime_type.clone().ok_or_else(|| {
                GltfError::structural(format!(
                    "image {index} uses bufferView {view} but declares no mimeType"
                ))
            })?;
            let bytes = asset.buffer_view_data(view).await?;
            Ok(ImageSource::Embedded {
                view,
                bytes,
                mime_type,
            })
        }
        (Some(uri), None) => Ok(ImageSource::Uri {
            url: asset
                .loader
                .manager()
                .resolve_url(&resolve_url(uri, &asset.base_path)),
            mime_type: image.mime_type.clone(),
        }),
    }
}

/// A `blob:` URL revoked when dropped.
struct TransientBlob {
    blobs: BlobStore,
    url: String,
}

impl Drop for TransientBlob {
    fn drop(&mut self) {
        self.blobs.revoke_object_url(&self.url);
    }
}

fn load(
    loader: FileLoader,
    decoder: Arc<dyn ImageDecoder>,
    source: ImageSource,
) -> BoxFuture<'static, Result<Arc<DecodedImage>, GltfError>> {
    async move {
        let (url, label, mime_type, _blob) = match source {
            ImageSource::Embedded {
                view,
                bytes,
                mime_type,
            } => {
                let blobs = loader.vfs().blobs().clone();
                let url = blobs.create_object_url(bytes.as_slice(), Some(&mime_type));
                let blob = TransientBlob {
                    blobs,
                    url: url.clone(),
                };
                (url, format!("bufferView {view}"), Some(mime_type), Some(blob))
            }
            ImageSource::Uri { url, mime_type } => (url.clone(), url, mime_type, None),
        };
        fetch_and_decode(&loader, decoder.as_ref(), &url, &label, mime_type.as_deref())
            .await
            .map(Arc::new)
    }
    .boxed()
}

/// Fetch and decode as a single manager item: it ends only once the pixels
/// are ready, and reports an error if either step fails.
async fn fetch_and_decode(
    loader: &FileLoader,
    decoder: &dyn ImageDecoder,
    url: &str,
    label: &str,
    mime_type: Option<&str>,
) -> Result<DecodedImage, GltfError> {
    let item = loader.manager().begin(url);
    let bytes = match loader.vfs().read(url, None).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("failed to fetch {label}: {e}");
            drop(item);
            return Err(e.into());
        }
    };
    match decoder.decode(&bytes, mime_type) {
        Ok(image) => {
            log::debug!("decoded {label}: {}x{}", image.width, image.height);
            item.succeed();
            Ok(image)
        }
        Err(message) => {
            log::warn!("failed to decode {label}: {message}");
            drop(item);
            Err(GltfError::Image {
                url: label.to_owned(),
                message,
            })
        }
    }
}
