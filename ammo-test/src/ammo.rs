//! Reading ammo files back for assertions.

use std::path::Path;

use anyhow::{Context, Result, bail};

/// A record read back from an ammo file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedRecord {
    /// The tag from the header line.
    pub tag: String,
    /// Exactly as many bytes as the header line announced.
    pub payload: Vec<u8>,
}

impl ParsedRecord {
    /// The request line without its terminating `\r\n`.
    pub fn request_line(&self) -> Result<&str> {
        let end = find(&self.payload, b"\r\n").context("request line is not terminated")?;
        Ok(std::str::from_utf8(&self.payload[..end])?)
    }

    /// The HTTP method of the request.
    pub fn method(&self) -> Result<&str> {
        let line = self.request_line()?;
        line.split(' ').next().context("empty request line")
    }

    /// The `id` query parameter of the request target.
    pub fn key(&self) -> Result<u64> {
        let line = self.request_line()?;
        let target = line.split(' ').nth(1).context("missing request target")?;
        let id = target
            .strip_prefix("/v0/entity?id=")
            .with_context(|| format!("unexpected request target {target:?}"))?;
        Ok(id.parse()?)
    }

    /// The header lines between the request line and the blank line.
    pub fn headers(&self) -> Result<Vec<(&str, &str)>> {
        let end = find(&self.payload, b"\r\n\r\n").context("headers are not terminated")?;
        let head = std::str::from_utf8(&self.payload[..end])?;

        head.split("\r\n")
            .skip(1)
            .map(|line| line.split_once(": ").context("malformed header line"))
            .collect()
    }

    /// The value of the `Content-Length` header, if present.
    pub fn content_length(&self) -> Result<Option<usize>> {
        for (name, value) in self.headers()? {
            if name.eq_ignore_ascii_case("content-length") {
                return Ok(Some(value.parse()?));
            }
        }
        Ok(None)
    }

    /// The bytes between the blank line and the trailing `\r\n`.
    pub fn body(&self) -> Result<&[u8]> {
        let start = find(&self.payload, b"\r\n\r\n").context("headers are not terminated")? + 4;
        let Some(end) = self.payload.len().checked_sub(2) else {
            bail!("payload is too short");
        };
        if start > end || !self.payload.ends_with(b"\r\n") {
            bail!("payload does not end with a trailing CRLF");
        }
        Ok(&self.payload[start..end])
    }
}

/// Splits the contents of an ammo file into records.
///
/// Fails if a header line is malformed or a payload is shorter than announced.
pub fn read_records(mut data: &[u8]) -> Result<Vec<ParsedRecord>> {
    let mut records = Vec::new();

    while !data.is_empty() {
        let newline = data
            .iter()
            .position(|b| *b == b'\n')
            .context("header line is not terminated")?;
        let header = std::str::from_utf8(&data[..newline])?;
        let (len, tag) = header
            .split_once(' ')
            .with_context(|| format!("malformed header line {header:?}"))?;
        let len: usize = len.parse()?;

        let rest = &data[newline + 1..];
        if rest.len() < len {
            bail!("record announces {len} bytes but only {} remain", rest.len());
        }

        records.push(ParsedRecord {
            tag: tag.to_owned(),
            payload: rest[..len].to_vec(),
        });
        data = &rest[len..];
    }

    Ok(records)
}

/// Reads and splits the ammo file at `path`.
pub fn read_file(path: &Path) -> Result<Vec<ParsedRecord>> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {path:?}"))?;
    read_records(&data)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
