use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::FetchError;
use crate::provider::{ProgressFn, VfsFuture, VfsProvider, report_complete};

/// In-memory provider for tests, embedded assets and dropped files.
///
/// Thread-safe and mutable even after being mounted in a [`Vfs`](crate::Vfs).
/// Entries are keyed by the exact URL string they are requested with.
///
/// # Example
///
/// ```ignore
/// let mem = MemoryProvider::new();
/// mem.insert("models/box.bin", bin_bytes);
///
/// let mut vfs = Vfs::new();
/// vfs.mount("mem", mem.clone());
/// vfs.set_default("mem");
/// ```
#[derive(Clone, Default)]
pub struct MemoryProvider {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryProvider {
    /// Create an empty in-memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file under the given URL, replacing any existing entry.
    pub fn insert(&self, url: impl Into<String>, data: Vec<u8>) {
        self.files.write().insert(url.into(), data);
    }

    /// Remove a file, returning its data if it existed.
    pub fn remove(&self, url: &str) -> Option<Vec<u8>> {
        self.files.write().remove(url)
    }

    /// Whether an entry exists for `url`.
    pub fn contains(&self, url: &str) -> bool {
        self.files.read().contains_key(url)
    }
}

impl VfsProvider for MemoryProvider {
    fn read(&self, url: &str, progress: Option<ProgressFn>) -> VfsFuture<Vec<u8>> {
        let files = self.files.clone();
        let url = url.to_owned();
        Box::pin(async move {
            let data = files
                .read()
                .get(&url)
                .cloned()
                .ok_or_else(|| FetchError::not_found(&url))?;
            report_complete(progress.as_ref(), data.len());
            Ok(data)
        })
    }
}
