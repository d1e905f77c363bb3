use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::FetchError;
use crate::provider::{ProgressFn, VfsFuture, VfsProvider, report_complete};

const BLOB_PREFIX: &str = "blob:lazy-gltf/";

struct BlobEntry {
    data: Arc<[u8]>,
    mime_type: Option<String>,
}

#[derive(Default)]
struct BlobTable {
    next_id: u64,
    entries: HashMap<String, BlobEntry>,
}

/// Store for transient in-memory objects addressed by synthetic `blob:` URLs.
///
/// Used for image bytes embedded in buffer views and for dropped files: the
/// bytes are registered, handed around as a URL, and revoked once consumed.
/// Mounted under the `blob` scheme of every [`Vfs`](crate::Vfs).
#[derive(Clone, Default)]
pub struct BlobStore {
    table: Arc<Mutex<BlobTable>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return a fresh `blob:` URL for it.
    pub fn create_object_url(&self, data: impl Into<Arc<[u8]>>, mime_type: Option<&str>) -> String {
        let mut table = self.table.lock();
        let url = format!("{BLOB_PREFIX}{}", table.next_id);
        table.next_id += 1;
        table.entries.insert(
            url.clone(),
            BlobEntry {
                data: data.into(),
                mime_type: mime_type.map(str::to_owned),
            },
        );
        log::trace!("created {url}");
        url
    }

    /// Release a URL created by [`create_object_url`](Self::create_object_url).
    ///
    /// Returns `false` if the URL was unknown or already revoked.
    pub fn revoke_object_url(&self, url: &str) -> bool {
        let removed = self.table.lock().entries.remove(url).is_some();
        if removed {
            log::trace!("revoked {url}");
        }
        removed
    }

    /// Number of URLs created and not yet revoked.
    pub fn open_handles(&self) -> usize {
        self.table.lock().entries.len()
    }

    /// MIME type recorded for a live blob URL.
    pub fn mime_type(&self, url: &str) -> Option<String> {
        self.table
            .lock()
            .entries
            .get(url)
            .and_then(|entry| entry.mime_type.clone())
    }
}

impl VfsProvider for BlobStore {
    fn read(&self, url: &str, progress: Option<ProgressFn>) -> VfsFuture<Vec<u8>> {
        let data = self
            .table
            .lock()
            .entries
            .get(url)
            .map(|entry| entry.data.clone());
        let url = url.to_owned();
        Box::pin(async move {
            let data = data.ok_or_else(|| FetchError::not_found(url))?;
            report_complete(progress.as_ref(), data.len());
            Ok(data.to_vec())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll_now;

    #[test]
    fn create_read_revoke() {
        let blobs = BlobStore::new();
        let url = blobs.create_object_url(vec![1u8, 2, 3], Some("image/png"));
        assert!(url.starts_with("blob:"));
        assert_eq!(blobs.open_handles(), 1);
        assert_eq!(blobs.mime_type(&url).as_deref(), Some("image/png"));

        assert_eq!(poll_now(blobs.read(&url, None)).unwrap(), vec![1, 2, 3]);

        assert!(blobs.revoke_object_url(&url));
        assert!(!blobs.revoke_object_url(&url));
        assert_eq!(blobs.open_handles(), 0);
    }

    #[test]
    fn revoked_url_is_404() {
        let blobs = BlobStore::new();
        let url = blobs.create_object_url(vec![0u8], None);
        blobs.revoke_object_url(&url);
        let err = poll_now(blobs.read(&url, None)).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn urls_are_unique() {
        let blobs = BlobStore::new();
        let a = blobs.create_object_url(vec![0u8], None);
        let b = blobs.create_object_url(vec![0u8], None);
        assert_ne!(a, b);
    }
}
