//! MIME content type and content disposition handling.

use crate::encoding::{decode_charset, hex_value};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx), keys lowercased.
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// Creates a text/plain content type, the RFC 2045 default.
    ///
    /// No charset is recorded, so body text decodes as UTF-8 (a superset of
    /// the nominal us-ascii default).
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }

    /// Creates a message/rfc822 content type, the default inside multipart/digest.
    #[must_use]
    pub fn message_rfc822() -> Self {
        Self::new("message", "rfc822")
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns the name parameter if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameters.get("name").map(String::as_str)
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks the type against a `type/subtype` pattern, where the subtype
    /// may be `*`. Comparison is case-insensitive.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        let (main, sub) = pattern.split_once('/').unwrap_or((pattern, "*"));
        self.main_type.eq_ignore_ascii_case(main)
            && (sub == "*" || self.sub_type.eq_ignore_ascii_case(sub))
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let (type_str, params) = s.split_once(';').unwrap_or((s, ""));

        let (main_type, sub_type) = type_str
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {s:?}")))?;

        let main_type = main_type.trim().to_lowercase();
        let sub_type = sub_type.trim().to_lowercase();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(format!("Empty type in {s:?}")));
        }

        Ok(Self {
            main_type,
            sub_type,
            parameters: parse_parameters(params),
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)
    }
}

/// Disposition type of a body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispositionKind {
    /// Displayed automatically.
    Inline,
    /// Offered as a separate file.
    Attachment,
    /// Any other token, lowercased.
    Other(String),
}

/// Parsed `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type.
    pub kind: DispositionKind,
    /// Parameters, keys lowercased.
    pub parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses a content disposition value. Never fails; an empty type is
    /// reported as `Other("")`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (kind, params) = s.split_once(';').unwrap_or((s, ""));
        let kind = match kind.trim().to_lowercase().as_str() {
            "inline" => DispositionKind::Inline,
            "attachment" => DispositionKind::Attachment,
            other => DispositionKind::Other(other.to_string()),
        };

        Self {
            kind,
            parameters: parse_parameters(params),
        }
    }

    /// Returns the filename parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }

    /// True for `attachment` dispositions.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind == DispositionKind::Attachment
    }

    /// True for `inline` dispositions.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.kind == DispositionKind::Inline
    }
}

/// Splits a parameter list on semicolons outside quoted strings.
fn split_parameters(s: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                result.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    result.push(&s[start..]);
    result
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let mut out = String::with_capacity(value.len());
        let mut chars = value[1..value.len() - 1].chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        out
    } else {
        value.to_string()
    }
}

/// Parses `key=value` parameters, folding RFC 2231 continuations
/// (`name*0`, `name*1*`) and extended values (`name*=charset''%xx`).
fn parse_parameters(params: &str) -> HashMap<String, String> {
    let mut plain = HashMap::new();
    // base name -> (section index, encoded flag, raw value)
    let mut extended: HashMap<String, Vec<(u32, bool, String)>> = HashMap::new();

    for param in split_parameters(params) {
        let Some((key, value)) = param.trim().split_once('=') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = unquote(value);

        if let Some((base, section)) = key.split_once('*') {
            let encoded = section.ends_with('*') || section.is_empty();
            let index = section.trim_end_matches('*').parse().unwrap_or(0);
            extended
                .entry(base.to_string())
                .or_default()
                .push((index, encoded, value));
        } else {
            plain.insert(key, value);
        }
    }

    for (name, mut sections) in extended {
        sections.sort_by_key(|(index, _, _)| *index);
        let mut charset = None;
        let mut bytes = Vec::new();

        for (position, (_, encoded, value)) in sections.iter().enumerate() {
            if *encoded {
                let mut raw = value.as_str();
                if position == 0 {
                    let mut fields = value.splitn(3, '\'');
                    if let (Some(cs), Some(_lang), Some(rest)) =
                        (fields.next(), fields.next(), fields.next())
                    {
                        charset = Some(cs.to_string()).filter(|cs| !cs.is_empty());
                        raw = rest;
                    }
                }
                bytes.extend(percent_decode(raw));
            } else {
                bytes.extend_from_slice(value.as_bytes());
            }
        }

        // Extended values take precedence over plain ones.
        plain.insert(name, decode_charset(&bytes, charset.as_deref()));
    }

    plain
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
