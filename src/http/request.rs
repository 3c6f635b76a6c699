//! Request parsing and serialization.
//!
//! # Responsibilities
//! - Parse a raw request-line-and-header buffer into a structured [`Request`]
//! - Validate the absolute-form target (`scheme://host[:port][/path]`)
//! - Re-serialize the request line and headers byte-exactly for forwarding
//!
//! # Design Decisions
//! - `parse` is a constructor: a `Request` only exists fully populated, so a
//!   buffer can never be parsed twice into the same object
//! - The original raw bytes are retained on the `Request`; the worker uses
//!   them as the cache key

use crate::http::headers::HeaderStore;
use crate::http::HttpError;

/// Smallest accepted request buffer (`\r\n\r\n` alone).
pub const MIN_REQUEST_LEN: usize = 4;
/// Largest accepted request buffer.
pub const MAX_REQUEST_LEN: usize = 65535;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// A parsed GET request in absolute form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    protocol: String,
    host: String,
    port: Option<String>,
    path: String,
    version: String,
    headers: HeaderStore,
    raw: Vec<u8>,
}

/// Find the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

impl Request {
    /// Parse a raw request buffer terminated by `\r\n\r\n`.
    ///
    /// Only absolute-form GET requests are accepted. On any failure no
    /// partially populated request escapes; header state accumulated before
    /// the failing line is discarded with the parse attempt.
    pub fn parse(buf: &[u8]) -> Result<Self, HttpError> {
        if buf.len() < MIN_REQUEST_LEN || buf.len() > MAX_REQUEST_LEN {
            return Err(HttpError::MalformedRequest);
        }

        let head_end = find(buf, HEADER_TERMINATOR).ok_or(HttpError::MalformedRequest)?;
        let line_end = find(buf, b"\r\n").ok_or(HttpError::MalformedRequest)?;
        let line =
            std::str::from_utf8(&buf[..line_end]).map_err(|_| HttpError::MalformedRequest)?;

        // Request line: METHOD SP TARGET SP VERSION, runs of spaces tolerated.
        let mut tokens = line.split(' ').filter(|t| !t.is_empty());
        let method = tokens.next().ok_or(HttpError::MalformedRequest)?;
        if method != "GET" {
            return Err(HttpError::UnsupportedMethod);
        }
        let target = tokens.next().ok_or(HttpError::MalformedRequest)?;
        let version = tokens.next().ok_or(HttpError::MalformedRequest)?;
        if !version.starts_with("HTTP/") {
            return Err(HttpError::MalformedRequest);
        }

        let (protocol, remainder) = target
            .split_once("://")
            .ok_or(HttpError::MalformedRequest)?;

        // The authority must be followed by a path separator; a bare
        // `scheme://host` target is rejected.
        let (host_port, path_seg) = remainder
            .split_once('/')
            .ok_or(HttpError::MalformedRequest)?;
        if path_seg.starts_with('/') {
            // Decoded path would begin with two slashes.
            return Err(HttpError::MalformedRequest);
        }
        let path = if path_seg.is_empty() {
            "/".to_owned()
        } else {
            format!("/{path_seg}")
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        };
        if host.is_empty() {
            return Err(HttpError::MalformedRequest);
        }
        if let Some(port) = port {
            // Must be numeric and fit a TCP port.
            if port.is_empty() || port.parse::<u16>().is_err() {
                return Err(HttpError::MalformedRequest);
            }
        }

        // Header lines occupy the region between the request line and the
        // blank terminator line, each ending in \r\n.
        let mut headers = HeaderStore::new();
        let mut region = &buf[line_end + 2..head_end + 2];
        while !region.is_empty() {
            let eol = find(region, b"\r\n").ok_or(HttpError::MalformedRequest)?;
            let line = &region[..eol];
            let colon = line
                .iter()
                .position(|&b| b == b':')
                .ok_or(HttpError::MalformedRequest)?;
            let key =
                std::str::from_utf8(&line[..colon]).map_err(|_| HttpError::MalformedRequest)?;
            // Value starts two bytes past the colon, skipping ": ".
            let value_start = (colon + 2).min(line.len());
            let value = std::str::from_utf8(&line[value_start..])
                .map_err(|_| HttpError::MalformedRequest)?;
            headers.set(key, value)?;
            region = &region[eol + 2..];
        }

        Ok(Self {
            method: method.to_owned(),
            protocol: protocol.to_owned(),
            host: host.to_owned(),
            port: port.map(str::to_owned),
            path,
            version: version.to_owned(),
            headers,
            raw: buf.to_vec(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port exactly as written in the target, if any.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Port as a number, defaulting to 80 only when absent.
    ///
    /// A present port always converts: `parse` rejected anything that does
    /// not fit a `u16`.
    pub fn port_or_default(&self) -> u16 {
        self.port
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or(80)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderStore {
        &mut self.headers
    }

    /// The raw bytes this request was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Only HTTP/1.0 and HTTP/1.1 requests are forwarded.
    pub fn require_supported_version(&self) -> Result<(), HttpError> {
        match self.version.as_str() {
            "HTTP/1.0" | "HTTP/1.1" => Ok(()),
            _ => Err(HttpError::UnsupportedVersion),
        }
    }

    /// Length of `METHOD PROTO://HOST[:PORT]PATH VERSION\r\n`.
    pub fn request_line_len(&self) -> usize {
        let mut len = self.method.len()
            + 1
            + self.protocol.len()
            + 3
            + self.host.len()
            + self.path.len()
            + 1
            + self.version.len()
            + 2;
        if let Some(port) = &self.port {
            len += 1 + port.len();
        }
        len
    }

    /// Write the request line with byte-exact spacing.
    ///
    /// Fails `BufferTooSmall` before writing anything if `buf` is undersized.
    /// Returns the number of bytes written.
    pub fn write_request_line(&self, buf: &mut [u8]) -> Result<usize, HttpError> {
        let total = self.request_line_len();
        if buf.len() < total {
            return Err(HttpError::BufferTooSmall);
        }

        let mut at = 0;
        let mut put = |part: &[u8], buf: &mut [u8]| {
            buf[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        };
        put(self.method.as_bytes(), buf);
        put(b" ", buf);
        put(self.protocol.as_bytes(), buf);
        put(b"://", buf);
        put(self.host.as_bytes(), buf);
        if let Some(port) = &self.port {
            put(b":", buf);
            put(port.as_bytes(), buf);
        }
        put(self.path.as_bytes(), buf);
        put(b" ", buf);
        put(self.version.as_bytes(), buf);
        put(b"\r\n", buf);
        Ok(total)
    }

    /// Total serialized length: request line plus header block.
    pub fn serialized_len(&self) -> usize {
        self.request_line_len() + self.headers.serialized_len()
    }

    /// Rebuild the full outbound request: request line followed by headers.
    pub fn serialize(&self) -> Result<Vec<u8>, HttpError> {
        let total = self.serialized_len();
        let mut out = Vec::new();
        out.try_reserve_exact(total)
            .map_err(|_| HttpError::OutOfMemory)?;
        out.resize(total, 0);
        let line_len = self.write_request_line(&mut out)?;
        self.headers.serialize_into(&mut out[line_len..])?;
        Ok(out)
    }
}
