use thiserror::Error;

/// Errors that can occur while fetching bytes through the virtual file system.
///
/// `Clone` so that one failed fetch can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The provider answered with a non-success, HTTP-like status.
    #[error("{url}: {status} {status_text}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
    },
    /// An IO error occurred while reading from a provider.
    #[error("IO error reading {url}: {message}")]
    Io { url: String, message: String },
    /// The URL is empty or cannot be routed.
    #[error("invalid URL: {0:?}")]
    InvalidUrl(String),
    /// A `data:` URI is malformed or its payload cannot be decoded.
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),
    /// No provider is mounted for the URL's scheme.
    #[error("no provider mounted for scheme {0:?}")]
    NoSuchSource(String),
}

impl FetchError {
    /// Builds the `404 Not Found` answer used by providers for missing entries.
    pub fn not_found(url: impl Into<String>) -> Self {
        FetchError::Status {
            url: url.into(),
            status: 404,
            status_text: "Not Found".to_owned(),
        }
    }

    /// The URL that failed, when the error carries one.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Status { url, .. } | FetchError::Io { url, .. } => Some(url),
            FetchError::InvalidUrl(url) => Some(url),
            FetchError::InvalidDataUri(_) | FetchError::NoSuchSource(_) => None,
        }
    }

    /// The HTTP-like status code, for [`FetchError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_io(url: impl Into<String>, err: std::io::Error) -> Self {
        let url = url.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            FetchError::not_found(url)
        } else {
            FetchError::Io {
                url,
                message: err.to_string(),
            }
        }
    }
}
