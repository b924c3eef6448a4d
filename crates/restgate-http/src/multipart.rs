//! Multipart form-data splitting.
//!
//! The parser works on the already-collected body. The boundary is taken from
//! the body itself: the literal first line, up to the first `\r\n`. Parts that
//! cannot be understood are skipped with a warning instead of failing the
//! whole body.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Matches `type; name="X"` with an optional `; filename="Y"`.
static CONTENT_DISPOSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([^;\s]+); name="([^"]*)"(?:; filename="([^"]*)")?"#)
        .expect("content-disposition pattern is valid")
});

/// One decoded multipart section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part<'a> {
    /// The `name` from `Content-Disposition`.
    pub name: String,
    /// The `filename` from `Content-Disposition`, if any.
    pub filename: Option<String>,
    /// Part headers, names lower-cased.
    pub headers: HashMap<String, String>,
    /// Part content with its trailing line terminator removed.
    pub content: &'a [u8],
}

/// Return the boundary line when `body` looks like a multipart payload.
///
/// A content-type hint carrying `boundary=` is honored when the body starts
/// with that boundary; otherwise the first line is used if it starts with `--`.
///
/// # Examples
///
/// ```
/// use restgate_http::multipart::detect_boundary;
///
/// let body = b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--xyz--\r\n";
/// assert_eq!(detect_boundary(body, None), Some(&b"--xyz"[..]));
/// assert_eq!(detect_boundary(b"a=1&b=2", None), None);
/// ```
#[must_use]
pub fn detect_boundary<'a>(body: &'a [u8], content_type: Option<&str>) -> Option<&'a [u8]> {
    if let Some(hint) = content_type.and_then(boundary_from_content_type) {
        let delimiter = format!("--{hint}");
        if body.starts_with(delimiter.as_bytes()) {
            return Some(&body[..delimiter.len()]);
        }
    }

    let line_end = find_bytes(body, b"\r\n")?;
    let line = &body[..line_end];
    let valid = line.len() > 2
        && line.starts_with(b"--")
        && !line.iter().any(u8::is_ascii_whitespace);
    valid.then_some(line)
}

/// Extract the `boundary` parameter from a `multipart/form-data` content type.
fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/")
    {
        return None;
    }
    content_type
        .split(';')
        .find_map(|param| param.trim().strip_prefix("boundary="))
        .map(|b| b.trim_matches('"'))
        .filter(|b| !b.is_empty())
}

/// Split a multipart body on `boundary` and decode every well-formed part.
#[must_use]
pub fn parse_parts<'a>(body: &'a [u8], boundary: &[u8]) -> Vec<Part<'a>> {
    split_on(body, boundary)
        .into_iter()
        .skip(1)
        .filter(|section| !section.starts_with(b"--"))
        .filter_map(parse_part)
        .collect()
}

/// Decode one section between two boundaries.
fn parse_part(section: &[u8]) -> Option<Part<'_>> {
    let section = skip_crlf(section);

    let Some(separator) = find_bytes(section, b"\r\n\r\n") else {
        warn!(len = section.len(), "skipping multipart part without header block");
        return None;
    };
    let headers = parse_headers(&section[..separator]);
    let content = strip_trailing_crlf(&section[separator + 4..]);

    let disposition = headers.get("content-disposition").map_or("", String::as_str);
    let Some(captures) = CONTENT_DISPOSITION.captures(disposition) else {
        warn!(disposition, "skipping multipart part with unrecognized content-disposition");
        return None;
    };

    Some(Part {
        name: captures[2].to_owned(),
        filename: captures.get(3).map(|m| m.as_str().to_owned()),
        headers,
        content,
    })
}

/// Parse `Name: value` lines into a lower-cased name map.
fn parse_headers(block: &[u8]) -> HashMap<String, String> {
    String::from_utf8_lossy(block)
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_owned()))
        .collect()
}

/// Split `haystack` on every occurrence of `needle`.
fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    let mut remaining = haystack;
    while let Some(pos) = find_bytes(remaining, needle) {
        pieces.push(&remaining[..pos]);
        remaining = &remaining[pos + needle.len()..];
    }
    pieces.push(remaining);
    pieces
}

/// Find the position of a needle in a haystack.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Skip leading \r\n.
fn skip_crlf(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n").unwrap_or(data)
}

/// Strip trailing \r\n.
fn strip_trailing_crlf(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n").unwrap_or(data)
}
