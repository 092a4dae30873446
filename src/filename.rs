//! Filename derivation and sanitization for downloads.
//!
//! Suggested names come from the `Content-Disposition` response header when
//! present, otherwise from the last path segment of the locator.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::transport::ResponseHeaders;

/// Name used when neither the header nor the locator yields one.
pub const FALLBACK_FILENAME: &str = "download";

/// Matches the quoted `filename="..."` parameter (not `filename*`).
#[allow(clippy::expect_used)]
static QUOTED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bfilename="([^"]+)""#).expect("filename regex is valid") // Static pattern, safe to panic
});

/// Derives the save-as filename for a response.
///
/// Order:
/// 1. `Content-Disposition` (header name matched case-insensitively)
/// 2. last path segment of `locator`
/// 3. [`FALLBACK_FILENAME`]
#[must_use]
pub fn suggested_filename(headers: &ResponseHeaders, locator: &str) -> String {
    if let Some(name) = headers
        .get("content-disposition")
        .and_then(parse_content_disposition)
        .filter(|name| !name.is_empty())
    {
        return name;
    }
    filename_from_locator(locator)
}

/// Parses a Content-Disposition header value to extract the filename.
///
/// Handles:
/// - `attachment; filename*=UTF-8''example%20file.pdf` (RFC 5987, preferred)
/// - `attachment; filename="example file.pdf"`
/// - `attachment; filename=example.pdf`
///
/// `filename` values are URL-decoded with `+` read as a space.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.to_ascii_lowercase().find("filename*=") {
        let value = header[pos + 10..].trim();
        // Format: charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded = encoded[..end].trim().trim_matches('"');
            if let Ok(decoded) = urlencoding::decode(encoded) {
                return Some(decoded.into_owned());
            }
        }
    }

    if let Some(captures) = QUOTED_FILENAME.captures(header) {
        return Some(decode_filename(&captures[1]));
    }

    let pos = header.to_ascii_lowercase().find("filename=")?;
    let value = header[pos + 9..].trim();
    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| decode_filename(filename))
}

/// URL-decodes a `filename` parameter, treating `+` as a space.
///
/// Values that are not valid percent-encoding are returned with only the
/// `+` replacement applied.
#[must_use]
pub fn decode_filename(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!(filename = %raw, error = %e, "filename decoding failed, using raw value");
            spaced
        }
    }
}

/// Last path segment of a locator, percent-decoded.
///
/// The segment ends at the first `?` or `#`, so
/// `https://host/files/archive.zip?x=1` yields `archive.zip`. Relative
/// locators are handled the same way. An empty segment (`https://host/`)
/// yields [`FALLBACK_FILENAME`].
#[must_use]
pub fn filename_from_locator(locator: &str) -> String {
    let segment = match Url::parse(locator) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => {
            let path = locator.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next().map(str::to_string)
        }
    };

    match segment.filter(|s| !s.is_empty()) {
        Some(segment) => urlencoding::decode(&segment)
            .map(|decoded| decoded.into_owned())
            .unwrap_or(segment),
        None => FALLBACK_FILENAME.to_string(),
    }
}

/// Guesses a file extension from a Content-Type value.
pub(crate) fn extension_from_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "text/html" => ".html",
        "text/plain" => ".txt",
        "text/csv" => ".csv",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "application/pdf" => ".pdf",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "application/zip" => ".zip",
        "application/gzip" => ".gz",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        _ => ".bin",
    }
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

/// Creates a new file inside `dir` under a unique name, adding `_N` before
/// the extension when the name is taken.
///
/// Each candidate is opened with `create_new`, so two concurrent saves of
/// the same name never share (or truncate) one file.
pub(crate) fn create_unique_file(dir: &Path, filename: &str) -> io::Result<(PathBuf, File)> {
    let filename = {
        let sanitized = sanitize_filename(filename);
        if sanitized.trim_matches('_').is_empty() {
            format!("{FALLBACK_FILENAME}.bin")
        } else {
            sanitized
        }
    };
    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename.as_str(), ""),
    };

    let mut path = dir.join(&filename);
    let mut suffix = 0u64;
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                suffix += 1;
                path = dir.join(format!("{stem}_{suffix}{ext}"));
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
