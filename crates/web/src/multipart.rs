//! Minimal `multipart/form-data` decoding.
//!
//! Just enough of RFC 7578 for file uploads: split the body on the declared
//! boundary, read each part's headers, keep the bytes. Streaming is not
//! needed here: the transport has already buffered the body, and size limits
//! are enforced by the upload policy before anything is persisted.

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("content type is not multipart/form-data")]
    NotMultipart,

    #[error("multipart content type has no boundary")]
    MissingBoundary,

    #[error("malformed multipart body: {reason}")]
    Malformed { reason: &'static str },
}

impl MultipartError {
    fn malformed(reason: &'static str) -> Self {
        Self::Malformed { reason }
    }
}

/// One decoded part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    /// Present only for file parts.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Metadata of a persisted upload, attached to the request context by the
/// `UploadFile` middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub stored_path: String,
    pub original_name: String,
    pub size: u64,
    pub mime: String,
}

/// Decodes a multipart body using the boundary declared in `content_type`.
pub fn parse(content_type: &str, body: &[u8]) -> Result<Vec<Part>, MultipartError> {
    let mime: mime::Mime = content_type.parse().map_err(|_| MultipartError::NotMultipart)?;
    if mime.type_() != mime::MULTIPART || mime.subtype() != mime::FORM_DATA {
        return Err(MultipartError::NotMultipart);
    }
    let boundary = mime
        .get_param(mime::BOUNDARY)
        .ok_or(MultipartError::MissingBoundary)?
        .as_str()
        .to_owned();

    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut rest = body;

    // skip the preamble up to and including the first delimiter line
    rest = skip_to_delimiter(rest, delimiter.as_bytes())?;

    loop {
        // after a delimiter: either "--" (close) or CRLF then part headers
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        rest = rest.strip_prefix(CRLF).ok_or_else(|| MultipartError::malformed("missing line break after boundary"))?;

        let header_end = find(rest, HEADER_END).ok_or_else(|| MultipartError::malformed("part headers not terminated"))?;
        let (header_block, tail) = rest.split_at(header_end);
        let body_start = &tail[HEADER_END.len()..];

        let headers =
            std::str::from_utf8(header_block).map_err(|_| MultipartError::malformed("part headers are not utf-8"))?;
        let (name, filename) = content_disposition(headers)?;
        let content_type = header_value(headers, "content-type").map(str::to_owned);

        // part data runs to the CRLF preceding the next delimiter
        let next = find(body_start, delimiter.as_bytes())
            .ok_or_else(|| MultipartError::malformed("part not closed by boundary"))?;
        if next < CRLF.len() {
            return Err(MultipartError::malformed("part data not terminated"));
        }
        let data = &body_start[..next - CRLF.len()];

        parts.push(Part {
            name,
            filename,
            content_type,
            data: Bytes::copy_from_slice(data),
        });

        rest = &body_start[next + delimiter.len()..];
    }
}

fn skip_to_delimiter<'a>(body: &'a [u8], delimiter: &[u8]) -> Result<&'a [u8], MultipartError> {
    let at = find(body, delimiter).ok_or_else(|| MultipartError::malformed("opening boundary not found"))?;
    Ok(&body[at + delimiter.len()..])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn header_value<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

fn content_disposition(headers: &str) -> Result<(String, Option<String>), MultipartError> {
    let value = header_value(headers, "content-disposition")
        .ok_or_else(|| MultipartError::malformed("part without content-disposition"))?;

    let mut name = None;
    let mut filename = None;
    for segment in value.split(';').skip(1) {
        let Some((key, raw)) = segment.split_once('=') else { continue };
        let unquoted = raw.trim().trim_matches('"').to_owned();
        match key.trim() {
            "name" => name = Some(unquoted),
            "filename" => filename = Some(unquoted),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| MultipartError::malformed("part without a field name"))?;
    Ok((name, filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPE: &str = "multipart/form-data; boundary=xYzZY";

    fn body(parts: &str) -> Vec<u8> {
        parts.replace('\n', "\r\n").into_bytes()
    }

    #[test]
    fn decodes_a_file_part() {
        let raw = body(
            "--xYzZY\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"keks.png\"\n\
             Content-Type: image/png\n\
             \n\
             PNGDATA\n\
             --xYzZY--\n",
        );
        let parts = parse(CONTENT_TYPE, &raw).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "avatar");
        assert_eq!(parts[0].filename.as_deref(), Some("keks.png"));
        assert_eq!(parts[0].content_type.as_deref(), Some("image/png"));
        assert_eq!(&parts[0].data[..], b"PNGDATA");
    }

    #[test]
    fn decodes_mixed_field_and_file_parts() {
        let raw = body(
            "--xYzZY\n\
             Content-Disposition: form-data; name=\"comment\"\n\
             \n\
             hello\n\
             --xYzZY\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"a.jpg\"\n\
             Content-Type: image/jpeg\n\
             \n\
             JPG\n\
             --xYzZY--\n",
        );
        let parts = parse(CONTENT_TYPE, &raw).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "comment");
        assert_eq!(parts[0].filename, None);
        assert_eq!(parts[1].filename.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn binary_data_with_line_breaks_survives() {
        let raw = body(
            "--xYzZY\n\
             Content-Disposition: form-data; name=\"avatar\"; filename=\"b.bin\"\n\
             \n\
             line one\n\
             line two\n\
             --xYzZY--\n",
        );
        let parts = parse(CONTENT_TYPE, &raw).unwrap();
        assert_eq!(&parts[0].data[..], b"line one\r\nline two");
    }

    #[test]
    fn rejects_non_multipart_content_type() {
        assert!(matches!(parse("application/json", b"{}"), Err(MultipartError::NotMultipart)));
    }

    #[test]
    fn rejects_missing_boundary() {
        assert!(matches!(parse("multipart/form-data", b""), Err(MultipartError::MissingBoundary)));
    }

    #[test]
    fn rejects_unterminated_part() {
        let raw = body(
            "--xYzZY\n\
             Content-Disposition: form-data; name=\"avatar\"\n\
             \n\
             data without closing boundary",
        );
        assert!(matches!(parse(CONTENT_TYPE, &raw), Err(MultipartError::Malformed { .. })));
    }
}
