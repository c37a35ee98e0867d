//! `multipart/form-data` bodies.
//!
//! [`parse_multipart`] walks the body as bytes, so uploaded content is
//! kept exactly as sent. Parts with a `filename` become [`UploadedFile`]s;
//! every other part is an ordinary control value.

use formbind_core::{FormError, FormResult};

use crate::querydict::QueryDict;

/// Largest single upload accepted by [`Submission::from_multipart`](crate::Submission::from_multipart).
pub const MAX_UPLOAD_SIZE: usize = 2_621_440;

/// A file posted through an `<input type="file">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name as the browser reported it.
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Uploaded files keyed by control name.
pub type FileDict = QueryDict<UploadedFile>;

/// Control values and files of one multipart body.
#[derive(Debug, Clone, Default)]
pub struct MultipartData {
    pub data: QueryDict,
    pub files: FileDict,
}

/// The `boundary` parameter of a `multipart/form-data` content type.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("boundary="))
        .map(|boundary| boundary.trim_matches('"'))
        .find(|boundary| !boundary.is_empty())
}

/// Splits a multipart body into values and files.
///
/// Parts without a `name` are skipped, as is a file input the user left
/// empty. A file larger than `max_file_size` bytes fails the whole body.
pub fn parse_multipart(body: &[u8], boundary: &str, max_file_size: usize) -> FormResult<MultipartData> {
    let delimiter = format!("--{boundary}").into_bytes();
    let mut parsed = MultipartData::default();

    for raw in split_parts(body, &delimiter) {
        let Some((head, content)) = split_head(raw) else {
            continue;
        };
        let disposition = PartHead::parse(&String::from_utf8_lossy(head));
        let Some(name) = disposition.name else {
            continue;
        };

        match disposition.filename {
            None => parsed
                .data
                .push(name, String::from_utf8_lossy(content).into_owned()),
            Some(filename) if filename.is_empty() && content.is_empty() => {}
            Some(filename) => {
                if content.len() > max_file_size {
                    return Err(FormError::MalformedSubmission(format!(
                        "upload '{filename}' is larger than {max_file_size} bytes"
                    )));
                }
                let content_type = disposition
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".into());
                parsed
                    .files
                    .push(name, UploadedFile::new(filename, content_type, content));
            }
        }
    }

    Ok(parsed)
}

/// The headers of one part that matter for form data.
#[derive(Debug, Default)]
struct PartHead {
    name: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
}

impl PartHead {
    fn parse(head: &str) -> Self {
        let mut part = Self::default();
        for (header, value) in head.lines().filter_map(|line| line.split_once(':')) {
            let value = value.trim();
            if header.trim().eq_ignore_ascii_case("content-disposition") {
                part.name = header_param(value, "name");
                part.filename = header_param(value, "filename");
            } else if header.trim().eq_ignore_ascii_case("content-type") {
                part.content_type = Some(value.to_string());
            }
        }
        part
    }
}

/// The bytes between consecutive delimiters, up to the closing `--`.
/// After the first, a delimiter only counts at the start of a line, so
/// content may contain the boundary text. Each part keeps the line break
/// that precedes the next delimiter.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let Some(mut start) = find(body, delimiter, 0) else {
        return parts;
    };
    let line_delimiter = [b"\n".as_slice(), delimiter].concat();
    loop {
        let from = start + delimiter.len();
        if body[from..].starts_with(b"--") {
            break;
        }
        match find(body, &line_delimiter, from) {
            Some(at) => {
                parts.push(&body[from..=at]);
                start = at + 1;
            }
            None => {
                parts.push(&body[from..]);
                break;
            }
        }
    }
    parts
}

/// Separates headers from content. The line break after the delimiter and
/// the one before the next delimiter belong to neither.
fn split_head(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let part = strip_line_break(part, true);
    let (head, content) = [b"\r\n\r\n".as_slice(), b"\n\n".as_slice()]
        .iter()
        .filter_map(|sep| find(part, sep, 0).map(|at| (&part[..at], &part[at + sep.len()..])))
        .min_by_key(|(head, _)| head.len())?;
    Some((head, strip_line_break(content, false)))
}

fn strip_line_break(bytes: &[u8], leading: bool) -> &[u8] {
    let stripped = if leading {
        bytes.strip_prefix(b"\r\n").or_else(|| bytes.strip_prefix(b"\n"))
    } else {
        bytes.strip_suffix(b"\r\n").or_else(|| bytes.strip_suffix(b"\n"))
    };
    stripped.unwrap_or(bytes)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}

/// `filename` out of `form-data; name="cv"; filename="cv.txt"`.
fn header_param(value: &str, param: &str) -> Option<String> {
    value
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == param)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
}
