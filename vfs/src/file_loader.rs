use std::sync::Arc;

use crate::error::FetchError;
use crate::manager::LoadingManager;
use crate::provider::ProgressFn;
use crate::vfs::Vfs;

/// Fetches bytes through a [`Vfs`] while keeping a [`LoadingManager`] informed.
///
/// `Clone` is cheap: both halves are shared.
#[derive(Clone)]
pub struct FileLoader {
    vfs: Vfs,
    manager: Arc<LoadingManager>,
}

impl FileLoader {
    pub fn new(vfs: Vfs, manager: Arc<LoadingManager>) -> Self {
        Self { vfs, manager }
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn manager(&self) -> &Arc<LoadingManager> {
        &self.manager
    }

    /// Apply the manager's URL modifier to `url`, then [`fetch`](Self::fetch) it.
    pub async fn load(&self, url: &str, progress: Option<ProgressFn>) -> Result<Vec<u8>, FetchError> {
        let url = self.manager.resolve_url(url);
        self.fetch(&url, progress).await
    }

    /// Fetch `url` as given, tracked as one manager item.
    ///
    /// The item also settles (as an error) if this future is dropped before
    /// the read completes.
    pub async fn fetch(&self, url: &str, progress: Option<ProgressFn>) -> Result<Vec<u8>, FetchError> {
        let item = self.manager.begin(url);
        let result = self.vfs.read(url, progress).await;
        match &result {
            Ok(bytes) => {
                log::debug!("fetched {url} ({} bytes)", bytes.len());
                item.succeed();
            }
            Err(e) => {
                log::warn!("fetch failed: {e}");
                drop(item);
            }
        }
        result
    }
}
