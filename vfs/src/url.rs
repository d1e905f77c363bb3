//! Reference classification and resolution.
//!
//! glTF documents reference their external data with URI strings that may be
//! absolute (`https://`, `//host`), embedded (`data:`), transient (`blob:`),
//! or relative to the document. [`resolve_url`] turns any of them into the
//! string handed to the [`Vfs`](crate::Vfs); no `.`/`..` normalization is
//! performed here.

/// Classification of a reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// Empty reference, treated as invalid downstream.
    Empty,
    /// `http://`, `https://` or protocol-relative `//`.
    Absolute,
    /// `data:<mime>,<payload>`.
    Data,
    /// `blob:...`.
    Blob,
    /// Anything else, resolved against the base path.
    Relative,
}

/// Classify a reference string.
pub fn classify(reference: &str) -> UrlKind {
    if reference.is_empty() {
        UrlKind::Empty
    } else if reference.starts_with("//")
        || starts_with_ignore_case(reference, "http://")
        || starts_with_ignore_case(reference, "https://")
    {
        UrlKind::Absolute
    } else if starts_with_ignore_case(reference, "data:") && reference.contains(',') {
        UrlKind::Data
    } else if starts_with_ignore_case(reference, "blob:") {
        UrlKind::Blob
    } else {
        UrlKind::Relative
    }
}

/// Resolve `reference` against `base`.
///
/// `base` is expected to end with a `/` or be empty. Absolute, data and blob
/// references are returned unchanged; an empty reference resolves to an
/// empty string.
pub fn resolve_url(reference: &str, base: &str) -> String {
    match classify(reference) {
        UrlKind::Empty => String::new(),
        UrlKind::Absolute | UrlKind::Data | UrlKind::Blob => reference.to_owned(),
        UrlKind::Relative => format!("{base}{reference}"),
    }
}

/// Everything up to and including the last `/` of `url`.
///
/// A URL without any `/` yields `"./"`.
pub fn extract_url_base(url: &str) -> String {
    match url.rfind('/') {
        Some(pos) => url[..=pos].to_owned(),
        None => "./".to_owned(),
    }
}

/// Split the scheme off a URL.
///
/// Returns `(Some(scheme), rest)` for `scheme:rest`, where the scheme is
/// lowercased. Single-letter schemes are treated as Windows drive letters and
/// yield `None`, as do scheme-less references.
pub fn split_scheme(url: &str) -> (Option<String>, &str) {
    let Some(colon) = url.find(':') else {
        return (None, url);
    };
    let scheme = &url[..colon];
    let valid = scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        (Some(scheme.to_ascii_lowercase()), &url[colon + 1..])
    } else {
        (None, url)
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}
