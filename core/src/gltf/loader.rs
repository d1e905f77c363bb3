//! Entry point: turns a URL, in-memory bytes or a set of dropped files into a
//! [`GltfAsset`].

use std::collections::HashMap;
use std::sync::Arc;

use lazy_gltf_vfs::url::extract_url_base;
use lazy_gltf_vfs::{FileLoader, LoadingManager, ProgressFn, Vfs};

use super::asset::GltfAsset;
use super::error::GltfError;
use super::glb::{decode_glb, is_glb};
use super::image::{ImageDecoder, default_decoder};
use super::types::Document;

/// Input accepted by [`GltfLoader::parse`].
#[derive(Debug, Clone)]
pub enum GltfSource {
    /// JSON text of a `.gltf` document.
    Text(String),
    /// Raw file contents: a `.glb` container or UTF-8 JSON.
    Bytes(Arc<[u8]>),
}

impl From<String> for GltfSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for GltfSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for GltfSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<Arc<[u8]>> for GltfSource {
    fn from(bytes: Arc<[u8]>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Loads glTF 2.0 assets.
///
/// Only the document is read up front. Buffers and images are fetched
/// through the same [`Vfs`] and [`LoadingManager`] when the returned
/// [`GltfAsset`] is asked for them.
///
/// # Example
///
/// ```ignore
/// let mut vfs = Vfs::new();
/// vfs.mount("file", FileSystemProvider::new("./assets"));
/// vfs.set_default("file");
///
/// let asset = GltfLoader::new(vfs).load("models/box.gltf", None).await?;
/// let positions = asset.accessor_data(0).await?.read::<[f32; 3]>()?;
/// ```
pub struct GltfLoader {
    vfs: Vfs,
    manager: Arc<LoadingManager>,
    path: Option<String>,
    decoder: Arc<dyn ImageDecoder>,
}

impl GltfLoader {
    pub fn new(vfs: Vfs) -> Self {
        Self {
            vfs,
            manager: Arc::new(LoadingManager::new()),
            path: None,
            decoder: default_decoder(),
        }
    }

    pub fn with_manager(mut self, manager: Arc<LoadingManager>) -> Self {
        self.manager = manager;
        self
    }

    /// Resolve relative URIs against `path` instead of the directory of the
    /// loaded URL.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_image_decoder(mut self, decoder: impl ImageDecoder) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn manager(&self) -> &Arc<LoadingManager> {
        &self.manager
    }

    /// Fetch `url` and parse it.
    pub async fn load(&self, url: &str, progress: Option<ProgressFn>) -> Result<GltfAsset, GltfError> {
        let path = self.path.clone().unwrap_or_else(|| extract_url_base(url));
        let bytes = self.file_loader().load(url, progress).await?;
        let asset = self.parse(bytes, &path)?;
        log::info!("loaded {url}");
        Ok(asset)
    }

    /// Parse a document already in memory.
    ///
    /// `path` is the prefix relative URIs are resolved against; a path set
    /// with [`with_path`](Self::with_path) takes precedence.
    pub fn parse(&self, source: impl Into<GltfSource>, path: &str) -> Result<GltfAsset, GltfError> {
        let (text, binary_chunk) = match source.into() {
            GltfSource::Text(text) => (text, None),
            GltfSource::Bytes(bytes) if is_glb(&bytes) => {
                let container = decode_glb(bytes)?;
                (container.json, container.bin)
            }
            GltfSource::Bytes(bytes) => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| GltfError::Json(format!("document is not UTF-8: {e}")))?;
                (text, None)
            }
        };

        let document: Document = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
        check_version(&document)?;

        let base_path = self.path.clone().unwrap_or_else(|| path.to_owned());
        log::debug!(
            "parsed glTF document (base path {base_path:?}, binary chunk: {})",
            binary_chunk.is_some()
        );
        Ok(GltfAsset::new(
            document,
            binary_chunk,
            base_path,
            self.file_loader(),
            self.decoder.clone(),
        ))
    }

    /// Load an asset from a set of `(name, bytes)` files, such as the
    /// contents of a drag-and-drop.
    ///
    /// The first file named `*.gltf` or `*.glb` is the document. Every other
    /// file is registered as a `blob:` URL and the manager's URL modifier is
    /// replaced so that relative URIs in the document resolve to those blobs.
    /// The blobs stay alive for the life of the process since the asset
    /// fetches lazily.
    pub async fn load_from_files(
        &self,
        files: impl IntoIterator<Item = (String, Vec<u8>)>,
    ) -> Result<GltfAsset, GltfError> {
        let mut files: Vec<(String, Vec<u8>)> = files.into_iter().collect();
        let root = files
            .iter()
            .position(|(name, _)| is_document_name(name))
            .ok_or(GltfError::NoRootFile(files.len()))?;
        let (root_name, root_bytes) = files.swap_remove(root);
        let path = self.path.clone().unwrap_or_else(|| extract_url_base(&root_name));
        let base = path.clone();

        let mut blobs = HashMap::new();
        for (name, bytes) in files {
            let url = self.vfs.blobs().create_object_url(bytes, None);
            log::debug!("{name} -> {url}");
            blobs.entry(file_name(&name).to_owned()).or_insert_with(|| url.clone());
            blobs.insert(name, url);
        }

        self.manager.set_url_modifier(Some(Box::new(move |url: &str| {
            let relative = url.strip_prefix(base.as_str()).unwrap_or(url);
            let relative = relative.strip_prefix("./").unwrap_or(relative);
            [url, relative, file_name(relative)]
                .into_iter()
                .find_map(|key| blobs.get(key))
                .cloned()
                .unwrap_or_else(|| url.to_owned())
        })));

        let asset = self.parse(root_bytes, &path)?;
        log::info!("loaded {root_name} from dropped files");
        Ok(asset)
    }

    fn file_loader(&self) -> FileLoader {
        FileLoader::new(self.vfs.clone(), self.manager.clone())
    }
}

fn is_document_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".gltf") || lower.ends_with(".glb")
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Only glTF 2.x documents whose `minVersion` (if any) is at most 2.0 load.
fn check_version(document: &Document) -> Result<(), GltfError> {
    let asset = document
        .asset
        .as_ref()
        .ok_or_else(|| GltfError::Version("missing asset metadata".into()))?;
    let (major, _) = parse_version(&asset.version)
        .ok_or_else(|| GltfError::Version(format!("malformed version {:?}", asset.version)))?;
    if major != 2 {
        return Err(GltfError::Version(format!(
            "glTF {} is not supported, only 2.x",
            asset.version
        )));
    }
    if let Some(min_version) = &asset.min_version {
        let required = parse_version(min_version)
            .ok_or_else(|| GltfError::Version(format!("malformed minVersion {min_version:?}")))?;
        if required > (2, 0) {
            return Err(GltfError::Version(format!(
                "asset requires glTF {min_version}, only 2.0 is supported"
            )));
        }
    }
    Ok(())
}
