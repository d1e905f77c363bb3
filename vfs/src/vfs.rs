use std::collections::HashMap;
use std::sync::Arc;

use crate::blob::BlobStore;
use crate::data_uri::DataUriProvider;
use crate::error::FetchError;
use crate::provider::{ProgressFn, VfsFuture, VfsProvider};
use crate::url::split_scheme;

/// Virtual file system that routes URLs to providers by scheme.
///
/// `https://host/a.bin` goes to the provider mounted as `"https"`,
/// protocol-relative `//host/a.bin` is treated as `https`, and scheme-less
/// (relative) URLs go to the default source. `data:` and `blob:` are always
/// mounted; the [`BlobStore`] is reachable through [`blobs()`](Self::blobs).
///
/// `Clone` is cheap (Arc internals). Thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// let mut vfs = Vfs::new();
/// vfs.mount("file", FileSystemProvider::new("./assets"));
/// vfs.mount("https", MyHttpProvider::new());
/// vfs.set_default("file");
///
/// let bytes = vfs.read("models/box.bin", None).await?;
/// ```
#[derive(Clone)]
pub struct Vfs {
    inner: Arc<VfsInner>,
}

struct VfsInner {
    sources: HashMap<String, Box<dyn VfsProvider>>,
    default_source: Option<String>,
    blobs: BlobStore,
}

impl Vfs {
    /// Create a VFS with only the `data` and `blob` schemes mounted.
    pub fn new() -> Self {
        let blobs = BlobStore::new();
        let mut sources: HashMap<String, Box<dyn VfsProvider>> = HashMap::new();
        sources.insert("data".to_owned(), Box::new(DataUriProvider));
        sources.insert("blob".to_owned(), Box::new(blobs.clone()));
        Self {
            inner: Arc::new(VfsInner {
                sources,
                default_source: None,
                blobs,
            }),
        }
    }

    /// Mount a provider under the given scheme.
    ///
    /// Replaces any previously mounted provider for the same scheme.
    ///
    /// # Panics
    ///
    /// Panics if the `Vfs` has already been cloned. All mounting must
    /// happen during the configuration phase before sharing the `Vfs`.
    pub fn mount(&mut self, scheme: impl Into<String>, provider: impl VfsProvider) {
        let inner = Arc::get_mut(&mut self.inner).expect("cannot mount after Vfs has been cloned");
        inner
            .sources
            .insert(scheme.into().to_ascii_lowercase(), Box::new(provider));
    }

    /// Set the source used for scheme-less (relative) URLs.
    ///
    /// # Panics
    ///
    /// Panics if the `Vfs` has already been cloned.
    pub fn set_default(&mut self, scheme: impl Into<String>) {
        let inner =
            Arc::get_mut(&mut self.inner).expect("cannot set default after Vfs has been cloned");
        inner.default_source = Some(scheme.into().to_ascii_lowercase());
    }

    /// The store backing `blob:` URLs.
    pub fn blobs(&self) -> &BlobStore {
        &self.inner.blobs
    }

    /// Read the entire resource at `url`.
    pub fn read(&self, url: &str, progress: Option<ProgressFn>) -> VfsFuture<Vec<u8>> {
        match self.resolve(url) {
            Ok(provider) => provider.read(url, progress),
            Err(e) => Box::pin(async move { Err(e) }),
        }
    }

    /// Find the provider responsible for `url`.
    fn resolve(&self, url: &str) -> Result<&dyn VfsProvider, FetchError> {
        if url.is_empty() {
            return Err(FetchError::InvalidUrl(String::new()));
        }

        let scheme = if url.starts_with("//") {
            Some("https".to_owned())
        } else {
            split_scheme(url).0
        };

        match scheme {
            Some(scheme) => self
                .inner
                .sources
                .get(&scheme)
                .map(|provider| provider.as_ref())
                .ok_or(FetchError::NoSuchSource(scheme)),
            None => self
                .inner
                .default_source
                .as_ref()
                .and_then(|name| self.inner.sources.get(name))
                .map(|provider| provider.as_ref())
                .ok_or_else(|| FetchError::NoSuchSource(String::new())),
        }
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}
