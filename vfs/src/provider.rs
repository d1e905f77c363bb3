use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::FetchError;

/// A boxed, `Send` future returning a `Result`.
///
/// All [`VfsProvider`] methods return this type. The futures are `Send + 'static`
/// so they can be stored, shared between waiters, or spawned on any runtime.
pub type VfsFuture<T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send>>;

/// A progress tick reported while a fetch is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes received so far.
    pub loaded: u64,
    /// Total size, when the transport knows it.
    pub total: Option<u64>,
}

/// Side-channel callback receiving [`Progress`] ticks.
pub type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Trait for byte-fetching backends.
///
/// Providers turn a URL into bytes. The returned futures do NOT drive
/// themselves: the caller awaits them on whatever executor it runs.
///
/// # URL Contract
///
/// The full URL is passed through unchanged (scheme included), so a provider
/// mounted for several schemes can tell them apart. Relative URLs arrive
/// exactly as the glTF resolver built them (`base + reference`); any `..`
/// handling is up to the provider.
///
/// # Status Contract
///
/// Non-success outcomes must be reported as [`FetchError::Status`] carrying
/// the URL, status and status text. Transports without a status (local
/// files, in-memory stores) treat a completed read as success.
pub trait VfsProvider: Send + Sync + 'static {
    /// Read the entire resource at `url`, reporting progress if requested.
    fn read(&self, url: &str, progress: Option<ProgressFn>) -> VfsFuture<Vec<u8>>;
}

/// Report a single "everything arrived" tick for providers that read in one go.
pub(crate) fn report_complete(progress: Option<&ProgressFn>, len: usize) {
    if let Some(progress) = progress {
        progress(Progress {
            loaded: len as u64,
            total: Some(len as u64),
        });
    }
}
