//! Attachment models.

use serde::{Serialize, Serializer};

/// A file carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// File name, unique within the owning [`crate::Mail`].
    pub name: String,
    /// Decoded payload.
    #[serde(serialize_with = "serialize_base64")]
    pub content: Vec<u8>,
    /// Declared MIME type (`type/subtype`), if any.
    pub mime_type: Option<String>,
    /// `Content-ID` without angle brackets.
    pub content_id: Option<String>,
    /// `X-Attachment-Id` as sent by the transport.
    pub transport_attachment_id: Option<String>,
    /// True when the part was marked `inline`.
    pub inline: bool,
}

impl Attachment {
    /// Creates an attachment with just a name and payload.
    #[must_use]
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
            mime_type: None,
            content_id: None,
            transport_attachment_id: None,
            inline: false,
        }
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// A claimed `postacert.eml` or `daticert.xml` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedArtifact {
    /// File name as found in the envelope.
    pub name: String,
    /// Decoded payload.
    #[serde(serialize_with = "serialize_base64")]
    pub content: Vec<u8>,
}

impl EmbeddedArtifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

fn serialize_base64<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&certmail_mime::encoding::encode_base64(bytes))
}

/// Returns `name`, or `stem(n).ext` with the first free `n` starting at 1
/// when `name` is already taken.
pub(crate) fn unique_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    (1..)
        .map(|n| format!("{stem}({n}){ext}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names<'a>(existing: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
        move |candidate| existing.iter().any(|name| *name == candidate)
    }

    #[test]
    fn test_unique_name_free() {
        assert_eq!(unique_name("report.pdf", names(&[])), "report.pdf");
    }

    #[test]
    fn test_unique_name_collisions() {
        assert_eq!(unique_name("report.pdf", names(&["report.pdf"])), "report(1).pdf");
        assert_eq!(
            unique_name("report.pdf", names(&["report.pdf", "report(1).pdf"])),
            "report(2).pdf"
        );
    }

    #[test]
    fn test_unique_name_without_extension() {
        let existing = ["unnamed", ".profile"];
        assert_eq!(unique_name("unnamed", names(&existing)), "unnamed(1)");
        assert_eq!(unique_name(".profile", names(&existing)), ".profile(1)");
    }

    #[test]
    fn test_attachment_serializes_base64() {
        let attachment = Attachment::new("a.txt", b"Hello".to_vec());
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["content"], "SGVsbG8=");
        assert_eq!(json["inline"], false);
    }
}
