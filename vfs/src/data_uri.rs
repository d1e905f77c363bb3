use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::FetchError;
use crate::provider::{ProgressFn, VfsFuture, VfsProvider, report_complete};

/// Standard alphabet, padding optional. Exporters disagree on trailing `=`.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A parsed `data:[<mime>][;param]*[;base64],<payload>` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    /// Declared media type, empty when omitted.
    pub mime_type: &'a str,
    /// Whether the payload is base64 (otherwise percent-encoded).
    pub base64: bool,
    /// The raw payload after the first comma.
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Parse a data URI without decoding its payload.
    pub fn parse(uri: &'a str) -> Result<Self, FetchError> {
        let rest = uri
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("data:"))
            .map(|_| &uri[5..])
            .ok_or_else(|| FetchError::InvalidDataUri("missing `data:` prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| FetchError::InvalidDataUri("missing `,` before payload".into()))?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default();
        let base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        Ok(Self {
            mime_type,
            base64,
            payload,
        })
    }

    /// Decode the payload into bytes.
    pub fn decode(&self) -> Result<Vec<u8>, FetchError> {
        if self.base64 {
            let compact: String = self
                .payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            BASE64
                .decode(compact)
                .map_err(|e| FetchError::InvalidDataUri(format!("bad base64 payload: {e}")))
        } else {
            Ok(percent_encoding::percent_decode_str(self.payload).collect())
        }
    }
}

/// Provider for `data:` URIs. Mounted by default in every [`Vfs`](crate::Vfs).
///
/// Nothing is fetched: the payload is decoded in place, but through the same
/// asynchronous interface as every other provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriProvider;

impl VfsProvider for DataUriProvider {
    fn read(&self, url: &str, progress: Option<ProgressFn>) -> VfsFuture<Vec<u8>> {
        let result = DataUri::parse(url).and_then(|uri| uri.decode());
        Box::pin(async move {
            let bytes = result?;
            report_complete(progress.as_ref(), bytes.len());
            Ok(bytes)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll_now;

    #[test]
    fn parse_base64_header() {
        let uri = DataUri::parse("data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(uri.mime_type, "application/octet-stream");
        assert!(uri.base64);
        assert_eq!(uri.payload, "AQID");
        assert_eq!(uri.decode().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn base64_without_padding() {
        let uri = DataUri::parse("data:;base64,SGVsbG8gV29ybGQ").unwrap();
        assert_eq!(uri.decode().unwrap(), b"Hello World");
    }

    #[test]
    fn base64_with_padding_and_newlines() {
        let uri = DataUri::parse("data:text/plain;base64,SGVsbG8g\nV29ybGQ=").unwrap();
        assert_eq!(uri.decode().unwrap(), b"Hello World");
    }

    #[test]
    fn percent_encoded_payload() {
        let uri = DataUri::parse("data:text/plain,a%20b%00").unwrap();
        assert!(!uri.base64);
        assert_eq!(uri.decode().unwrap(), b"a b\0");
    }

    #[test]
    fn reject_non_data() {
        assert!(DataUri::parse("https://example.com").is_err());
        assert!(DataUri::parse("data:no-comma").is_err());
    }

    #[test]
    fn reject_bad_base64() {
        let uri = DataUri::parse("data:;base64,!!!!").unwrap();
        assert!(matches!(uri.decode(), Err(FetchError::InvalidDataUri(_))));
    }

    #[test]
    fn provider_reports_progress() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU64, Ordering};

        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |p| sink.store(p.loaded, Ordering::SeqCst));

        let bytes = poll_now(DataUriProvider.read("data:;base64,AQID", Some(progress))).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
