use std::path::{Path, PathBuf};

use crate::FetchError;
use crate::provider::{ProgressFn, VfsFuture, VfsProvider, report_complete};

/// File system provider for reading assets from disk.
///
/// Relative URLs are joined onto the root directory; `file://` URLs are
/// stripped of their scheme and read as given (absolute paths stay absolute).
/// All I/O is blocking (`std::fs`) inside the returned futures.
///
/// A local read has no status line, so any completed read is a success;
/// a missing file is reported as `404 Not Found`.
///
/// # Example
///
/// ```ignore
/// let mut vfs = Vfs::new();
/// vfs.mount("file", FileSystemProvider::new("./assets"));
/// vfs.set_default("file");
///
/// // Reads ./assets/models/box.bin
/// let bytes = vfs.read("models/box.bin", None).await;
/// ```
pub struct FileSystemProvider {
    root: PathBuf,
}

impl FileSystemProvider {
    /// Create a provider rooted at the given directory.
    ///
    /// The directory does not need to exist yet; it is only checked at read time.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory relative URLs are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a URL to a full filesystem path.
    fn resolve(&self, url: &str) -> PathBuf {
        let path = url
            .get(..7)
            .filter(|scheme| scheme.eq_ignore_ascii_case("file://"))
            .map_or(url, |_| &url[7..]);
        self.root.join(path)
    }
}

impl VfsProvider for FileSystemProvider {
    fn read(&self, url: &str, progress: Option<ProgressFn>) -> VfsFuture<Vec<u8>> {
        let full_path = self.resolve(url);
        let url = url.to_owned();
        Box::pin(async move {
            let data = std::fs::read(&full_path).map_err(|e| FetchError::from_io(url, e))?;
            report_complete(progress.as_ref(), data.len());
            Ok(data)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll_now;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lazy_gltf_vfs_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn read_existing_file() {
        let dir = temp_dir("read");
        std::fs::write(dir.join("box.bin"), b"hello").unwrap();

        let provider = FileSystemProvider::new(&dir);
        let data = poll_now(provider.read("box.bin", None)).unwrap();
        assert_eq!(data, b"hello");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_nested_relative() {
        let dir = temp_dir("nested");
        std::fs::create_dir_all(dir.join("models")).unwrap();
        std::fs::write(dir.join("models/a.bin"), b"a").unwrap();

        let provider = FileSystemProvider::new(&dir);
        assert_eq!(poll_now(provider.read("models/a.bin", None)).unwrap(), b"a");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_file_url() {
        let dir = temp_dir("file_url");
        let file = dir.join("abs.bin");
        std::fs::write(&file, b"abs").unwrap();

        let provider = FileSystemProvider::new("/nonexistent-root");
        let url = format!("file://{}", file.display());
        assert_eq!(poll_now(provider.read(&url, None)).unwrap(), b"abs");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_missing_file() {
        let dir = temp_dir("read_missing");
        let provider = FileSystemProvider::new(&dir);
        let err = poll_now(provider.read("nope.bin", None)).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.url(), Some("nope.bin"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
