//! MIME message structure and handling.

use crate::address::{Mailbox, parse_address_list};
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable, decode_rfc2047};
use crate::error::Result;
use crate::header::Headers;
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A node of the MIME tree.
///
/// Leaves keep their body exactly as transmitted; decoding happens on
/// demand. Multipart nodes additionally hold their children in order.
#[derive(Debug, Clone)]
pub struct Part {
    headers: Headers,
    body: Vec<u8>,
    parts: Vec<Part>,
    in_digest: bool,
}

impl Part {
    /// Parses a part (headers, blank line, body) and its children.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self::parse_node(raw, false)
    }

    fn parse_node(raw: &[u8], in_digest: bool) -> Self {
        let (header_bytes, body) = split_header_block(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(header_bytes));

        let mut part = Self {
            headers,
            body: body.to_vec(),
            parts: Vec::new(),
            in_digest,
        };

        // An unparseable content type leaves the part a leaf; the error
        // surfaces when a caller asks for the content type.
        if let Ok(content_type) = part.content_type() {
            if let Some(boundary) = content_type.boundary().filter(|_| content_type.is_multipart()) {
                let digest = content_type.sub_type == "digest";
                part.parts = split_multipart(body, boundary)
                    .into_iter()
                    .map(|child| Self::parse_node(child, digest))
                    .collect();
            }
        }

        part
    }

    /// Part headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Gets the first value of a part header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Child parts, in order. Empty for leaves.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Body as transmitted (still transfer-encoded).
    #[must_use]
    pub fn raw_body(&self) -> &[u8] {
        &self.body
    }

    /// Gets the content type, applying the RFC 2046 defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers.get("content-type").map_or_else(
            || {
                Ok(if self.in_digest {
                    ContentType::message_rfc822()
                } else {
                    ContentType::text_plain()
                })
            },
            ContentType::parse,
        )
    }

    /// Checks the content type against a `type/subtype` pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn is_mime_type(&self, pattern: &str) -> Result<bool> {
        Ok(self.content_type()?.matches(pattern))
    }

    /// Gets the content disposition, if declared.
    #[must_use]
    pub fn disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Gets the file name from the disposition `filename` parameter, falling
    /// back to the content type `name` parameter. RFC 2047 words are decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the name falls back to an invalid content type.
    pub fn filename(&self) -> Result<Option<String>> {
        let from_disposition = self
            .disposition()
            .and_then(|cd| cd.filename().map(str::to_string));
        let raw = match from_disposition {
            Some(name) => Some(name),
            None => self.content_type()?.name().map(str::to_string),
        };

        Ok(raw
            .map(|name| decode_rfc2047(name.trim()))
            .filter(|name| !name.is_empty()))
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the decoded body as text, honoring the charset parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is invalid or decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let content_type = self.content_type()?;
        let decoded = self.decode_body()?;
        Ok(decode_charset(&decoded, content_type.charset()))
    }
}

/// MIME message: the root part plus envelope accessors.
#[derive(Debug, Clone)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    ///
    /// Parsing is lenient and never fails on its own; problems with
    /// individual headers or parts are reported by the accessors.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self {
            root: Part::parse(raw),
        }
    }

    /// The root part, whose headers are the message headers.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Message headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Gets the first value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.root.headers.get(name)
    }

    /// Gets all values of a header.
    #[must_use]
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.root.headers.get_all(name)
    }

    /// Gets the decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.root.headers.get_decoded("subject")
    }

    /// Gets the raw Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.header("message-id")
    }

    /// Gets the From addresses.
    #[must_use]
    pub fn from(&self) -> Vec<Mailbox> {
        self.addresses("from")
    }

    /// Gets the Sender address, if any.
    #[must_use]
    pub fn sender(&self) -> Option<Mailbox> {
        self.addresses("sender").into_iter().next()
    }

    /// Gets the To addresses.
    #[must_use]
    pub fn to(&self) -> Vec<Mailbox> {
        self.addresses("to")
    }

    /// Gets the Cc addresses.
    #[must_use]
    pub fn cc(&self) -> Vec<Mailbox> {
        self.addresses("cc")
    }

    /// Gets the Bcc addresses.
    #[must_use]
    pub fn bcc(&self) -> Vec<Mailbox> {
        self.addresses("bcc")
    }

    /// All mailboxes of every occurrence of `name`, in header order.
    fn addresses(&self, name: &str) -> Vec<Mailbox> {
        self.header_all(name)
            .into_iter()
            .flat_map(parse_address_list)
            .collect()
    }

    /// Gets the Date header. Unparseable dates are reported as absent.
    #[must_use]
    pub fn sent_date(&self) -> Option<DateTime<FixedOffset>> {
        self.header("date").and_then(parse_date)
    }

    /// Gets the date stamped by the most recent `Received` header.
    #[must_use]
    pub fn received_date(&self) -> Option<DateTime<FixedOffset>> {
        self.header("received")
            .and_then(|value| value.rsplit_once(';'))
            .and_then(|(_, date)| parse_date(date))
    }
}

/// Parses an RFC 5322 date, ignoring a trailing comment such as `(CET)`.
fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    let value = match value.rfind('(') {
        Some(index) if value.ends_with(')') => value[..index].trim_end(),
        _ => value,
    };
    DateTime::parse_from_rfc2822(value).ok()
}

/// Splits raw bytes at the first empty line.
fn split_header_block(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    while offset < raw.len() {
        let line_end = next_line_end(raw, offset);
        if trim_newline(&raw[offset..line_end]).is_empty() {
            return (&raw[..offset], &raw[line_end..]);
        }
        offset = line_end;
    }
    (raw, &[])
}

/// Splits a multipart body into the raw bytes of each child part.
///
/// The line break preceding a delimiter belongs to the delimiter. A
/// missing close delimiter keeps the last part open to the end.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut offset = 0;

    while offset < body.len() {
        let line_end = next_line_end(body, offset);
        let line = trim_newline(&body[offset..line_end]);

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let closing = rest.starts_with(b"--");
            if closing || rest.iter().all(u8::is_ascii_whitespace) {
                if let Some(start) = current.take() {
                    parts.push(trim_newline(&body[start..offset]));
                }
                if closing {
                    return parts;
                }
                current = Some(line_end);
            }
        }
        offset = line_end;
    }

    if let Some(start) = current {
        parts.push(&body[start..]);
    }
    parts
}

/// Offset just past the next `\n`, or the end of the buffer.
fn next_line_end(data: &[u8], offset: usize) -> usize {
    data[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(data.len(), |p| offset + p + 1)
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
