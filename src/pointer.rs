//! `$ref` strings and RFC 6901 JSON pointers.

use crate::error::Error;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// A `$ref` split into the document it names and the pointer inside that document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    /// Document part before `#`, `None` when the reference stays in the current document
    pub document: Option<String>,
    /// Unescaped pointer segments, empty for a whole-document reference
    pub segments: Vec<String>,
}

impl ParsedReference {
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.document.is_none()
    }
}

/// Escapes `~` as `~0` and `/` as `~1`
#[must_use]
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Reverses [`escape_segment`].
///
/// # Errors
///
/// Returns a description of the problem when a `~` is not followed by `0` or `1`.
pub fn unescape_segment(segment: &str) -> Result<String, String> {
    if !segment.contains('~') {
        return Ok(segment.to_string());
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            Some(other) => {
                return Err(format!(
                    "segment '{segment}' contains an unescaped '~' (found '~{other}', write '~0' for a literal '~')"
                ))
            }
            None => {
                return Err(format!(
                    "segment '{segment}' ends with an unescaped '~' (write '~0' for a literal '~')"
                ))
            }
        }
    }
    Ok(out)
}

/// Joins unescaped segments into a pointer, `""` for the document root
#[must_use]
pub fn pointer_from_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let mut pointer = String::new();
    for segment in segments {
        pointer.push('/');
        pointer.push_str(&escape_segment(segment.as_ref()));
    }
    pointer
}

/// Splits a `$ref` string into document and pointer segments.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::Pointer`] errors for an empty reference, a URI
/// with a missing or invalid scheme, a fragment that is not a JSON pointer, bad
/// percent-encoding and unescaped `~` characters.
pub fn parse_reference(raw: &str) -> Result<ParsedReference, Error> {
    if raw.trim().is_empty() {
        return Err(Error::invalid_pointer(raw, "reference is empty"));
    }
    if raw.starts_with("://") {
        return Err(Error::invalid_pointer(raw, "URI is missing a scheme"));
    }

    let (document, fragment) = match raw.split_once('#') {
        Some((document, fragment)) => (document, Some(fragment)),
        None => (raw, None),
    };

    let document = if document.is_empty() {
        None
    } else {
        if has_scheme(document) {
            Url::parse(document)
                .map_err(|e| Error::invalid_pointer(raw, format!("invalid URI: {e}")))?;
        }
        Some(document.to_string())
    };

    let segments = match fragment {
        None | Some("") => Vec::new(),
        Some(fragment) => parse_fragment(raw, fragment)?,
    };

    Ok(ParsedReference { document, segments })
}

fn parse_fragment(raw: &str, fragment: &str) -> Result<Vec<String>, Error> {
    let decoded = percent_decode_str(fragment)
        .decode_utf8()
        .map_err(|e| Error::invalid_pointer(raw, format!("invalid percent-encoding: {e}")))?;
    let Some(rest) = decoded.strip_prefix('/') else {
        return Err(Error::invalid_pointer(
            raw,
            "fragment must be a JSON pointer starting with '/'",
        ));
    };
    rest.split('/')
        .map(|segment| unescape_segment(segment).map_err(|reason| Error::invalid_pointer(raw, reason)))
        .collect()
}

/// `scheme://` prefix with a scheme longer than one character, so `C:/x` stays a path
pub(crate) fn has_scheme(location: &str) -> bool {
    location.split_once("://").is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Canonical form of a document location: URLs are parsed and re-serialized, file
/// paths are lexically normalized.
#[must_use]
pub fn normalize_location(location: &str) -> String {
    if has_scheme(location) {
        if let Ok(url) = Url::parse(location) {
            return url.to_string();
        }
    }
    normalize_path(Path::new(location)).to_string_lossy().into_owned()
}

/// Location of `reference` relative to the document at `base`.
///
/// # Errors
///
/// Returns a pointer error when a URL join fails.
pub fn join_location(base: &str, reference: &str) -> Result<String, Error> {
    if has_scheme(reference) {
        return Url::parse(reference)
            .map(String::from)
            .map_err(|e| Error::invalid_pointer(reference, format!("invalid URI: {e}")));
    }
    if has_scheme(base) {
        let base_url = Url::parse(base)
            .map_err(|e| Error::invalid_pointer(base, format!("invalid URI: {e}")))?;
        return base_url
            .join(reference)
            .map(String::from)
            .map_err(|e| Error::invalid_pointer(reference, format!("cannot join with '{base}': {e}")));
    }
    let reference_path = Path::new(reference);
    if reference_path.is_absolute() {
        return Ok(normalize_path(reference_path).to_string_lossy().into_owned());
    }
    let joined = Path::new(base)
        .parent()
        .map_or_else(|| reference_path.to_path_buf(), |dir| dir.join(reference_path));
    Ok(normalize_path(&joined).to_string_lossy().into_owned())
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `document#/escaped/pointer`
#[must_use]
pub fn absolute_location<S: AsRef<str>>(document: &str, segments: &[S]) -> String {
    format!("{document}#{}", pointer_from_segments(segments))
}

/// Follows unescaped pointer segments through a JSON value
#[must_use]
pub fn lookup<'v, S: AsRef<str>>(value: &'v Value, segments: &[S]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(value, |current, segment| step(current, segment.as_ref()))
}

fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => {
            if segment.len() > 1 && segment.starts_with('0') {
                return None;
            }
            segment.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

/// Explains why [`lookup`] failed when the likely cause is a key containing an unescaped
/// `/`, e.g. `#/paths//pets/get` written for the `/pets` path.
#[must_use]
pub fn explain_lookup_failure<S: AsRef<str>>(value: &Value, segments: &[S]) -> Option<String> {
    let mut current = value;
    for (i, segment) in segments.iter().enumerate() {
        if let Some(next) = step(current, segment.as_ref()) {
            current = next;
            continue;
        }
        let Value::Object(map) = current else {
            return None;
        };
        for end in (i + 1)..segments.len() {
            let candidate = segments[i..=end]
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join("/");
            if map.contains_key(&candidate) {
                return Some(format!(
                    "key '{candidate}' contains '/', which must be escaped as '~1' (write '{}')",
                    escape_segment(&candidate)
                ));
            }
        }
        return None;
    }
    None
}
