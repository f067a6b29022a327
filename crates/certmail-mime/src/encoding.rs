//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, charset conversion and RFC 2047
//! encoded words in header values.

use crate::error::Result;
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use encoding_rs::{Encoding, UTF_8};

/// Base64 engine that tolerates missing padding and stray trailing bits,
/// both common in mail produced by older clients.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    LENIENT_BASE64.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed. Malformed escape sequences are kept
/// literally rather than rejected.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        match data.get(i + 1..i + 3) {
            Some([b'\r', b'\n']) => i += 3,
            Some([b'\n', _]) => i += 2,
            None if data.get(i + 1) == Some(&b'\n') => i += 2,
            Some(&[hi, lo]) => match (hex_value(hi), hex_value(lo)) {
                (Some(hi), Some(lo)) => {
                    result.push(hi << 4 | lo);
                    i += 3;
                }
                _ => {
                    result.push(b'=');
                    i += 1;
                }
            },
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

pub(crate) const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Converts bytes in the given charset to a string.
///
/// Unknown or missing charsets fall back to UTF-8; undecodable sequences
/// become U+FFFD.
#[must_use]
pub fn decode_charset(data: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(data);
    text.into_owned()
}

/// Decodes RFC 2047 encoded words inside a header value.
///
/// Format of each word: `=?charset?encoding?encoded-text?=`. Whitespace
/// between two adjacent encoded words is dropped. Text that only looks like
/// an encoded word, or a word with an unknown encoding letter or an
/// undecodable payload, is kept as is (RFC 2047 section 6.3).
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut last_was_encoded = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = parse_encoded_word(candidate) {
            if !(last_was_encoded && before.chars().all(char::is_whitespace)) {
                result.push_str(before);
            }
            result.push_str(&decoded);
            rest = &candidate[consumed..];
            last_was_encoded = true;
        } else {
            result.push_str(before);
            result.push_str("=?");
            rest = &candidate[2..];
            last_was_encoded = false;
        }
    }

    result.push_str(rest);
    result
}

/// Parses one encoded word at the start of `s`, returning the decoded text
/// and the number of bytes consumed. `None` when `s` does not start with a
/// decodable word.
fn parse_encoded_word(s: &str) -> Option<(String, usize)> {
    let inner = &s[2..];
    let q1 = inner.find('?')?;
    let charset = &inner[..q1];
    let after_charset = &inner[q1 + 1..];
    let q2 = after_charset.find('?')?;
    let encoding = &after_charset[..q2];
    let after_encoding = &after_charset[q2 + 1..];
    let end = after_encoding.find("?=")?;
    let encoded = &after_encoding[..end];

    if charset.is_empty()
        || encoding.len() != 1
        || charset.contains(char::is_whitespace)
        || encoded.contains(char::is_whitespace)
    {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded).ok()?,
        "Q" | "q" => decode_q(encoded.as_bytes()),
        _ => return None,
    };

    // RFC 2231 allows a language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);
    let consumed = 2 + q1 + 1 + q2 + 1 + end + 2;
    Some((decode_charset(&bytes, Some(charset)), consumed))
}

/// Q encoding: Quoted-Printable with underscore for space.
fn decode_q(data: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = data
        .iter()
        .map(|&b| if b == b'_' { b' ' } else { b })
        .collect();
    decode_quoted_printable(&spaced)
}
