//! Byte fetching layer for lazy-gltf.
//!
//! Provides a unified, asynchronous way to turn the URLs found in glTF
//! documents into bytes through the [`VfsProvider`] trait and the [`Vfs`]
//! scheme router, plus the [`LoadingManager`] bookkeeping that reports
//! start / progress / load / error across every request.
//!
//! # Architecture
//!
//! The VFS returns boxed futures (`Pin<Box<dyn Future + Send>>`) from all
//! operations. These futures are not self-driving; they must be awaited on
//! an executor. Blocking providers complete on the first poll, so
//! synchronous callers can use [`poll_now`].
//!
//! # Providers
//!
//! - [`DataUriProvider`]: decodes `data:` URIs in place (always mounted)
//! - [`BlobStore`]: transient `blob:` URLs for in-memory bytes (always mounted)
//! - [`MemoryProvider`]: named in-memory files for tests and embedded assets
//! - [`FileSystemProvider`]: native filesystem access (native only)
//!
//! Network transports are not part of this crate: implement [`VfsProvider`]
//! for your HTTP client and mount it under `http` / `https`.

mod blob;
mod data_uri;
mod error;
mod file_loader;
#[cfg(all(feature = "filesystem", not(target_arch = "wasm32")))]
mod filesystem;
mod manager;
mod memory;
mod poll;
mod provider;
pub mod url;
mod vfs;

pub use blob::BlobStore;
pub use data_uri::{DataUri, DataUriProvider};
pub use error::FetchError;
pub use file_loader::FileLoader;
#[cfg(all(feature = "filesystem", not(target_arch = "wasm32")))]
pub use filesystem::FileSystemProvider;
pub use manager::{ItemHook, LoadItem, LoadingManager, UrlModifier};
pub use memory::MemoryProvider;
pub use poll::poll_now;
pub use provider::{Progress, ProgressFn, VfsFuture, VfsProvider};
pub use vfs::Vfs;
