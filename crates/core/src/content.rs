//! Content streaming.
//!
//! [`ContentService::open`] resolves a relative path under the base directory, classifies the
//! file by extension and plans at most one byte range. The returned [`Content`] owns the open
//! file handle, positioned at the first byte to send, and can be streamed into any
//! [`std::io::Write`] sink or handed to an async body as a `(File, length)` pair.
//!
//! Range handling follows the single-range subset of RFC 7233:
//!
//! - `bytes=<start>-`, `bytes=<start>-<end>` and `bytes=-<suffix>` are served as partial content,
//!   with an end past EOF clamped to the last byte
//! - several ranges, or a range starting at or after EOF, are not satisfiable
//! - a header that does not parse is ignored and the whole file is served
//!
//! `Content-Length` always describes the bytes actually sent.

use crate::constants::{CONTENT_TYPES, OCTET_STREAM};
use crate::paths::RelativePath;
use crate::{CoreConfig, CoreError, CoreResult};
use http_range::{HttpRange, HttpRangeParseError};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

/// Inclusive byte interval of a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Value of the `Content-Range` header sent with a 416 response.
pub fn unsatisfied_content_range(size: u64) -> String {
    format!("bytes */{}", size)
}

/// MIME type for `path`, chosen from the fixed extension table.
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };
    let ext = ext.to_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Plan the byte range for a `Range` header against a file of `size` bytes.
///
/// Returns `Ok(None)` when the whole file should be served.
///
/// # Errors
///
/// Returns `CoreError::RangeNotSatisfiable` for multi-range requests and ranges that do not
/// overlap the file.
pub fn parse_range_header(header: &str, size: u64) -> CoreResult<Option<ByteRange>> {
    if size == 0 {
        return Ok(None);
    }

    match HttpRange::parse(header, size) {
        Ok(ranges) => match ranges.as_slice() {
            [] => Ok(None),
            [range] if range.length > 0 => Ok(Some(ByteRange {
                start: range.start,
                end: range.start + range.length - 1,
            })),
            _ => Err(CoreError::RangeNotSatisfiable { size }),
        },
        Err(HttpRangeParseError::NoOverlap) => Err(CoreError::RangeNotSatisfiable { size }),
        Err(_) => {
            tracing::debug!("ignoring malformed range header: {}", header);
            Ok(None)
        }
    }
}

/// An open file ready to be streamed.
#[derive(Debug)]
pub struct Content {
    file: File,
    content_type: &'static str,
    total_size: u64,
    range: Option<ByteRange>,
}

impl Content {
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Size of the whole file in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// Whether this is a partial (206) response.
    pub fn is_partial(&self) -> bool {
        self.range.is_some()
    }

    /// Number of bytes that will be sent.
    pub fn content_length(&self) -> u64 {
        self.range
            .map(|r| r.length())
            .unwrap_or(self.total_size)
    }

    /// `Content-Range` header value for partial responses.
    pub fn content_range(&self) -> Option<String> {
        self.range.map(|r| r.content_range(self.total_size))
    }

    /// Copy the planned bytes into `sink`.
    ///
    /// # Errors
    ///
    /// Propagates read and write failures. If the file shrank since it was opened the copy ends
    /// early and `UnexpectedEof` is returned rather than reporting a short body as success.
    pub fn stream_to<W: Write + ?Sized>(self, sink: &mut W) -> io::Result<u64> {
        let expected = self.content_length();
        let copied = io::copy(&mut self.file.take(expected), sink)?;
        if copied != expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("content ended after {copied} of {expected} bytes"),
            ));
        }
        Ok(copied)
    }

    /// Split into the positioned file handle and the number of bytes to read from it.
    pub fn into_parts(self) -> (File, u64) {
        let length = self.content_length();
        (self.file, length)
    }
}

/// Resolves and opens content under the base directory.
#[derive(Clone, Debug)]
pub struct ContentService {
    cfg: Arc<CoreConfig>,
}

impl ContentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Open `relative` for streaming, honouring an optional `Range` header.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPath` if `relative` tries to leave the base directory,
    /// `CoreError::NotFound` if it is missing, unreadable or not a regular file,
    /// `CoreError::RangeNotSatisfiable` for unsatisfiable ranges, and `CoreError::Open` if the
    /// opened file cannot be inspected or positioned.
    pub fn open(&self, relative: &str, range_header: Option<&str>) -> CoreResult<Content> {
        let relative = RelativePath::parse(relative)?;
        if relative.is_root() {
            return Err(CoreError::NotFound("no content path given".into()));
        }

        let full_path = relative.to_fs_path(self.cfg.base_path());
        let mut file = File::open(&full_path).map_err(|e| {
            tracing::debug!("failed to open {}: {}", full_path.display(), e);
            CoreError::NotFound(relative.to_string())
        })?;

        let metadata = file.metadata().map_err(CoreError::Open)?;
        if !metadata.is_file() {
            return Err(CoreError::NotFound(relative.to_string()));
        }
        let total_size = metadata.len();

        let range = match range_header {
            Some(header) => parse_range_header(header, total_size)?,
            None => None,
        };

        if let Some(range) = range {
            file.seek(SeekFrom::Start(range.start))
                .map_err(CoreError::Open)?;
        }

        Ok(Content {
            file,
            content_type: content_type_for(&full_path),
            total_size,
            range,
        })
    }
}
