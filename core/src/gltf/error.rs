//! Error types for glTF loading and resolution.

use lazy_gltf_vfs::FetchError;
use thiserror::Error;

/// Broad failure classes callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed binary container.
    Format,
    /// Unsupported asset version.
    Version,
    /// The document references something missing or inconsistent.
    Structural,
    /// Fetching or decoding external data failed.
    Transport,
}

/// Errors that can occur while loading a glTF asset or resolving its data.
///
/// `Clone` so a single failed resolution can be reported to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum GltfError {
    /// The glTF-Binary container is malformed.
    #[error("invalid glTF-Binary container: {0}")]
    Format(String),
    /// The document declares a version this loader cannot read.
    #[error("unsupported asset: {0}")]
    Version(String),
    /// The document is not valid glTF JSON.
    #[error("invalid glTF JSON: {0}")]
    Json(String),
    /// The document references a missing or inconsistent index or field.
    #[error("invalid glTF: {0}")]
    Structural(String),
    /// Fetching external bytes failed.
    #[error("fetch failed: {0}")]
    Transport(#[from] FetchError),
    /// An image could not be loaded or decoded.
    #[error("failed to load image {url}: {message}")]
    Image {
        /// The source the image was loaded from.
        url: String,
        message: String,
    },
    /// None of the supplied files is a `.gltf` or `.glb` document.
    #[error("no .gltf or .glb file found among {0} file(s)")]
    NoRootFile(usize),
}

impl GltfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) | Self::Json(_) | Self::NoRootFile(_) => ErrorKind::Format,
            Self::Version(_) => ErrorKind::Version,
            Self::Structural(_) => ErrorKind::Structural,
            Self::Transport(_) | Self::Image { .. } => ErrorKind::Transport,
        }
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }
}

impl From<serde_json::Error> for GltfError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
