//! Ordered header collection.
//!
//! # Responsibilities
//! - Store `key: value` pairs in insertion order during parsing
//! - Support the rewrites the worker applies before forwarding
//!   (`Connection: close`, default `Host`)
//! - Serialize the header block byte-exactly for the outbound request
//!
//! # Design Decisions
//! - Keys match case-sensitively; `set` on an existing key removes the old
//!   entry and re-appends at the end, so iteration order is insertion order
//! - `remove` deletes for real; the store never grows from set/remove cycles

use crate::http::HttpError;

/// A single `key: value` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    key: String,
    value: String,
}

impl HeaderEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Serialized length of this line: `key: value\r\n`.
    pub fn line_len(&self) -> usize {
        self.key.len() + self.value.len() + 4
    }
}

/// Insertion-ordered header store owned by a single [`Request`].
///
/// [`Request`]: crate::http::Request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderStore {
    entries: Vec<HeaderEntry>,
}

impl HeaderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any existing entry with the same key.
    ///
    /// The new entry always lands at the end of the collection.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), HttpError> {
        self.remove(key);
        self.entries
            .try_reserve(1)
            .map_err(|_| HttpError::OutOfMemory)?;
        self.entries.push(HeaderEntry {
            key: key.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    /// Look up a header value by exact key match.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Delete a header. Returns `false` if no entry matched.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.iter().position(|e| e.key == key) {
            Some(at) => {
                self.entries.remove(at);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.entries.iter()
    }

    /// Total serialized length of the header block, including the
    /// terminating blank-line CRLF.
    pub fn serialized_len(&self) -> usize {
        self.entries.iter().map(HeaderEntry::line_len).sum::<usize>() + 2
    }

    /// Write `key: value\r\n` per entry in collection order, then `\r\n`.
    ///
    /// The length check happens before any byte is written; a partial
    /// header block is never produced. Returns the number of bytes written.
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize, HttpError> {
        let total = self.serialized_len();
        if buf.len() < total {
            return Err(HttpError::BufferTooSmall);
        }

        let mut at = 0;
        for entry in &self.entries {
            for part in [entry.key.as_bytes(), b": ", entry.value.as_bytes(), b"\r\n"] {
                buf[at..at + part.len()].copy_from_slice(part);
                at += part.len();
            }
        }
        buf[at..at + 2].copy_from_slice(b"\r\n");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_value() {
        let mut headers = HeaderStore::new();
        headers.set("Host", "example.com").unwrap();
        assert_eq!(headers.get("Host"), Some("example.com"));
    }

    #[test]
    fn get_is_case_sensitive() {
        let mut headers = HeaderStore::new();
        headers.set("Host", "example.com").unwrap();
        assert_eq!(headers.get("host"), None);
    }

    #[test]
    fn remove_then_get_is_not_found() {
        let mut headers = HeaderStore::new();
        headers.set("Accept", "*/*").unwrap();
        assert!(headers.remove("Accept"));
        assert_eq!(headers.get("Accept"), None);
        assert!(!headers.remove("Accept"));
    }

    #[test]
    fn set_after_remove_reappends_at_end() {
        let mut headers = HeaderStore::new();
        headers.set("Host", "example.com").unwrap();
        headers.set("Accept", "*/*").unwrap();
        headers.remove("Host");
        headers.set("Host", "other.example").unwrap();

        let keys: Vec<&str> = headers.iter().map(HeaderEntry::key).collect();
        assert_eq!(keys, ["Accept", "Host"]);
        assert_eq!(headers.get("Host"), Some("other.example"));
    }

    #[test]
    fn set_replaces_existing_key_at_end() {
        let mut headers = HeaderStore::new();
        headers.set("Connection", "keep-alive").unwrap();
        headers.set("Host", "example.com").unwrap();
        headers.set("Connection", "close").unwrap();

        assert_eq!(headers.len(), 2);
        let keys: Vec<&str> = headers.iter().map(HeaderEntry::key).collect();
        assert_eq!(keys, ["Host", "Connection"]);
        assert_eq!(headers.get("Connection"), Some("close"));
    }

    #[test]
    fn line_len_counts_separator_and_crlf() {
        let mut headers = HeaderStore::new();
        headers.set("Host", "example.com").unwrap();
        let entry = headers.iter().next().unwrap();
        // "Host: example.com\r\n"
        assert_eq!(entry.line_len(), 4 + 11 + 4);
    }

    #[test]
    fn serialize_writes_entries_in_order() {
        let mut headers = HeaderStore::new();
        headers.set("Host", "example.com").unwrap();
        headers.set("Connection", "close").unwrap();

        let mut buf = vec![0u8; headers.serialized_len()];
        let written = headers.serialize_into(&mut buf).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(&buf, b"Host: example.com\r\nConnection: close\r\n\r\n");
    }

    #[test]
    fn serialize_empty_store_is_blank_line() {
        let headers = HeaderStore::new();
        let mut buf = [0u8; 2];
        headers.serialize_into(&mut buf).unwrap();
        assert_eq!(&buf, b"\r\n");
    }

    #[test]
    fn serialize_rejects_undersized_buffer_without_writing() {
        let mut headers = HeaderStore::new();
        headers.set("Host", "example.com").unwrap();

        let mut buf = vec![0xAAu8; headers.serialized_len() - 1];
        let err = headers.serialize_into(&mut buf).unwrap_err();
        assert_eq!(err, HttpError::BufferTooSmall);
        assert!(buf.iter().all(|&b| b == 0xAA), "no partial write allowed");
    }
}
