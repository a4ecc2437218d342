//! Rendering of requests into ammo records.
//!
//! An ammo record is a header line `<length> <tag>\n` followed by exactly `<length>` bytes of a
//! raw HTTP/1.1 request:
//!
//! ```text
//! 57 put
//! PUT /v0/entity?id=1 HTTP/1.1
//! Content-Length: 4
//!
//! ....
//! ```
//!
//! Every line of the request is terminated by `\r\n`, and the request ends with an additional
//! `\r\n`. The length covers the request through that final `\r\n`, but not the header line.

use std::fmt;
use std::io::{self, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::key::Key;

/// Path of the entity endpoint on the target store.
pub const ENTITY_PATH: &str = "/v0/entity";

const CRLF: &[u8] = b"\r\n";

/// The tag naming the kind of request in a record header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Tag {
    /// An upsert of an entity.
    Put,
    /// A lookup of an entity.
    Get,
}

impl Tag {
    /// The tag as written into the record header.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Put => "put",
            Tag::Get => "get",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against the entity endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Store `value` under `key`.
    Put {
        /// The entity to write.
        key: Key,
        /// The raw body of the request.
        value: Bytes,
    },
    /// Read the entity stored under `key`.
    Get {
        /// The entity to read.
        key: Key,
    },
}

impl Request {
    /// The record tag for this request.
    pub fn tag(&self) -> Tag {
        match self {
            Request::Put { .. } => Tag::Put,
            Request::Get { .. } => Tag::Get,
        }
    }

    /// The key addressed by this request.
    pub fn key(&self) -> Key {
        match self {
            Request::Put { key, .. } | Request::Get { key } => *key,
        }
    }

    /// Renders the request and wraps it into an ammo record.
    pub fn encode(&self) -> AmmoRecord {
        let mut payload = BytesMut::new();

        match self {
            Request::Put { key, value } => {
                payload.put_slice(format!("PUT {ENTITY_PATH}?id={key} HTTP/1.1\r\n").as_bytes());
                payload.put_slice(format!("Content-Length: {}\r\n", value.len()).as_bytes());
                payload.put_slice(CRLF);
                payload.put_slice(value);
            }
            Request::Get { key } => {
                payload.put_slice(format!("GET {ENTITY_PATH}?id={key} HTTP/1.1\r\n").as_bytes());
                payload.put_slice(CRLF);
            }
        }
        payload.put_slice(CRLF);

        AmmoRecord::new(self.tag(), payload.freeze())
    }
}

/// A length-prefixed, tagged request as it appears in an ammo file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AmmoRecord {
    tag: Tag,
    payload: Bytes,
}

impl AmmoRecord {
    /// Wraps an already rendered request.
    pub fn new(tag: Tag, payload: Bytes) -> Self {
        Self { tag, payload }
    }

    /// The tag written into the header line.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The raw request bytes following the header line.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The length announced in the header line.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The header line, including its terminating `\n`.
    pub fn header(&self) -> String {
        format!("{} {}\n", self.payload.len(), self.tag)
    }

    /// Size of the record on disk, header line included.
    pub fn encoded_len(&self) -> usize {
        self.header().len() + self.payload.len()
    }

    /// Writes the header line and the payload to `sink`.
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(self.header().as_bytes())?;
        sink.write_all(&self.payload)
    }

    /// The complete record as a single buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_slice(self.header().as_bytes());
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_put() {
        let request = Request::Put {
            key: Key(42),
            value: Bytes::from_static(b"abcd"),
        };
        let record = request.encode();

        let payload = b"PUT /v0/entity?id=42 HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd\r\n";
        assert_eq!(record.tag(), Tag::Put);
        assert_eq!(record.payload().as_ref(), payload);

        let mut expected = format!("{} put\n", payload.len()).into_bytes();
        expected.extend_from_slice(payload);
        assert_eq!(record.to_bytes().as_ref(), expected.as_slice());
    }

    #[test]
    fn encodes_get() {
        let record = Request::Get { key: Key(7) }.encode();

        assert_eq!(
            record.to_bytes().as_ref(),
            b"34 get\nGET /v0/entity?id=7 HTTP/1.1\r\n\r\n\r\n"
        );
    }

    #[test]
    fn length_excludes_header_line() {
        let record = Request::Get { key: Key(123456) }.encode();

        assert_eq!(record.len(), record.payload().len());
        assert_eq!(record.header(), format!("{} get\n", record.len()));
        assert_eq!(record.encoded_len(), record.to_bytes().len());
    }

    #[test]
    fn binary_values_are_written_verbatim() {
        let value = Bytes::from_static(b"\r\n\0\xff");
        let record = Request::Put {
            key: Key(0),
            value: value.clone(),
        }
        .encode();

        let payload = record.payload();
        let body = &payload[payload.len() - value.len() - 2..payload.len() - 2];
        assert_eq!(body, value.as_ref());
        assert!(payload.ends_with(b"\r\n"));
    }

    #[test]
    fn write_to_matches_to_bytes() {
        let record = Request::Put {
            key: Key(u64::MAX),
            value: Bytes::from_static(b"x"),
        }
        .encode();

        let mut sink = Vec::new();
        record.write_to(&mut sink).unwrap();
        assert_eq!(sink.as_slice(), record.to_bytes().as_ref());
    }

    #[test]
    fn request_accessors() {
        let request = Request::Get { key: Key(5) };
        assert_eq!(request.tag(), Tag::Get);
        assert_eq!(request.key(), Key(5));
        assert_eq!(Tag::Put.to_string(), "put");
    }
}
