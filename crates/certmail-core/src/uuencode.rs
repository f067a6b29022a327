//! Legacy uuencoded attachments embedded in plain-text bodies.
//!
//! A block looks like:
//!
//! ```text
//! begin 644 notes.txt
//! %:&5L;&\`
//! `
//! end
//! ```
//!
//! The header line must carry a three digit octal mode and a file name.
//! Candidates that fail validation are ordinary text and are skipped.

use crate::error::{Error, Result};
use crate::model::unique_name;
use tracing::debug;

const BEGIN: &str = "begin ";
const END: &str = "end";
const FALLBACK_NAME: &str = "unnamed";

/// A file recovered from a uuencoded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFile {
    /// File name from the `begin` line.
    pub name: String,
    /// Decoded bytes.
    pub content: Vec<u8>,
}

/// A validated block: where it starts, its name and its payload lines.
struct Block<'a> {
    start: usize,
    name: &'a str,
    payload: Vec<&'a str>,
}

/// True if `text` contains at least one valid uuencoded block.
#[must_use]
pub fn detect(text: &str) -> bool {
    find_block_start(text).is_some()
}

/// Byte offset of the first valid block's `begin` line.
#[must_use]
pub fn find_block_start(text: &str) -> Option<usize> {
    blocks(text).first().map(|block| block.start)
}

/// Decodes every valid block in `text`, in order.
///
/// # Errors
///
/// Returns [`Error::Codec`] if a validated block contains a character
/// outside the uuencode alphabet.
pub fn decode(text: &str) -> Result<Vec<DecodedFile>> {
    let mut files: Vec<DecodedFile> = Vec::new();

    for block in blocks(text) {
        let mut content = Vec::new();
        for line in &block.payload {
            decode_line(line, &mut content)
                .map_err(|reason| Error::Codec(format!("{}: {reason}", block.name)))?;
        }

        let name = if block.name.is_empty() {
            FALLBACK_NAME
        } else {
            block.name
        };
        let name = unique_name(name, |candidate| files.iter().any(|f| f.name == candidate));
        debug!("Decoded uuencoded file {} ({} bytes)", name, content.len());
        files.push(DecodedFile { name, content });
    }

    Ok(files)
}

/// Lines with their byte offsets, line terminators removed.
fn lines(text: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|raw| {
            let start = offset;
            offset += raw.len();
            (start, raw.trim_end_matches(['\r', '\n']))
        })
        .collect()
}

/// Finds all valid blocks. A rejected candidate only skips its own
/// `begin` line, so a later block that overlaps it is still found.
fn blocks(text: &str) -> Vec<Block<'_>> {
    let lines = lines(text);
    let mut blocks = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let (start, line) = lines[index];
        let Some(name) = parse_begin_line(line) else {
            index += 1;
            continue;
        };
        let Some(end) = lines[index + 1..]
            .iter()
            .position(|(_, l)| l.starts_with(END))
            .map(|p| index + 1 + p)
        else {
            // No end line follows, so no later candidate can close either.
            debug!("Ignoring uuencode candidate without end line: {}", line);
            break;
        };

        blocks.push(Block {
            start,
            name,
            payload: lines[index + 1..end].iter().map(|(_, l)| *l).collect(),
        });
        index = end + 1;
    }

    blocks
}

/// Validates `begin <mode> <name>` and returns the trimmed name.
fn parse_begin_line(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(BEGIN)?;
    let mode = rest.get(..3)?;
    if !mode.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return None;
    }
    let name = rest[3..].trim();
    (!name.is_empty()).then_some(name)
}

/// Decodes one payload line: a length character followed by groups of four
/// characters, each group carrying three bytes.
fn decode_line(line: &str, out: &mut Vec<u8>) -> std::result::Result<(), String> {
    let Some((&length, data)) = line.as_bytes().split_first() else {
        return Ok(());
    };
    let length = usize::from(sixbit(length)?);
    if length == 0 {
        return Ok(());
    }

    let mut decoded = Vec::with_capacity(length + 2);
    for chunk in data.chunks(4) {
        if decoded.len() >= length {
            break;
        }
        let mut quad = [0u8; 4];
        for (slot, &c) in quad.iter_mut().zip(chunk) {
            *slot = sixbit(c)?;
        }
        decoded.push((quad[0] << 2) | (quad[1] >> 4));
        decoded.push((quad[1] << 4) | (quad[2] >> 2));
        decoded.push((quad[2] << 6) | quad[3]);
    }

    // Trailing spaces encode zero bits and are often stripped in transit.
    decoded.resize(length, 0);
    out.extend_from_slice(&decoded);
    Ok(())
}

const fn sixbit_value(c: u8) -> Option<u8> {
    match c {
        b' '..=b'`' => Some((c - b' ') & 0x3F),
        _ => None,
    }
}

fn sixbit(c: u8) -> std::result::Result<u8, String> {
    sixbit_value(c).ok_or_else(|| format!("invalid character {:?}", char::from(c)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Classic uuencode, 45 bytes per line.
    fn encode(name: &str, data: &[u8]) -> String {
        let enc = |v: u8| if v == 0 { '`' } else { char::from(v + b' ') };
        let mut out = format!("begin 644 {name}\n");
        for line in data.chunks(45) {
            out.push(enc(u8::try_from(line.len()).unwrap()));
            for group in line.chunks(3) {
                let b = [
                    group[0],
                    group.get(1).copied().unwrap_or(0),
                    group.get(2).copied().unwrap_or(0),
                ];
                out.push(enc(b[0] >> 2));
                out.push(enc(((b[0] << 4) | (b[1] >> 4)) & 0x3F));
                out.push(enc(((b[1] << 2) | (b[2] >> 6)) & 0x3F));
                out.push(enc(b[2] & 0x3F));
            }
            out.push('\n');
        }
        out.push_str("`\nend\n");
        out
    }

    #[test]
    fn test_decode_known_block() {
        let text = "begin 644 cat.txt\n#0V%T\n`\nend\n";
        let files = decode(text).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "cat.txt");
        assert_eq!(files[0].content, b"Cat");
    }

    #[test]
    fn test_find_block_start_after_text() {
        let text = format!("Hi there\r\n\r\n{}", encode("a.bin", b"payload"));
        let start = find_block_start(&text).unwrap();
        assert_eq!(&text[..start], "Hi there\r\n\r\n");
        assert!(detect(&text));
    }

    #[test]
    fn test_begin_without_end_is_text() {
        let text = "Let us begin foo and see\nbegin foo\nnothing";
        assert!(!detect(text));
        assert!(decode(text).unwrap().is_empty());
    }

    #[test]
    fn test_many_unclosed_candidates_scan_once() {
        let text = "begin 644 f.bin\n#0V%T\n".repeat(50_000);
        assert!(!detect(&text));
        assert!(find_block_start(&text).is_none());
        assert!(decode(&text).unwrap().is_empty());
    }

    #[test]
    fn test_non_octal_mode_is_text() {
        let text = "begin 649 x\n#0V%T\nend\n";
        assert!(!detect(text));
        assert!(find_block_start(text).is_none());
    }

    #[test]
    fn test_blank_name_is_text() {
        assert!(!detect("begin 644   \n#0V%T\nend\n"));
    }

    #[test]
    fn test_rejected_candidate_does_not_hide_later_block() {
        let text = format!("begin 999 bogus\n{}", encode("real.txt", b"data"));
        let files = decode(&text).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "real.txt");
        assert_eq!(find_block_start(&text), Some("begin 999 bogus\n".len()));
    }

    #[test]
    fn test_multiple_blocks_with_same_name() {
        let text = format!("{}{}", encode("a.txt", b"one"), encode("a.txt", b"two"));
        let files = decode(&text).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "a(1).txt"]);
        assert_eq!(files[1].content, b"two");
    }

    #[test]
    fn test_invalid_character_in_block() {
        let text = "begin 644 x.txt\n#0V~T\nend\n";
        let err = decode(text).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
        // Detection only validates the frame.
        assert!(detect(text));
    }

    #[test]
    fn test_stripped_trailing_spaces() {
        // "\0\0\0" encodes as "#    "; editors often drop the spaces.
        let files = decode("begin 600 z\n#\nend\n").unwrap();
        assert_eq!(files[0].content, vec![0, 0, 0]);
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            data in proptest::collection::vec(any::<u8>(), 0..300),
            name in "[a-z]{1,8}\\.[a-z]{3}",
        ) {
            let text = format!("Body text\n{}", encode(&name, &data));
            let files = decode(&text).unwrap();
            prop_assert_eq!(files.len(), 1);
            prop_assert_eq!(&files[0].name, &name);
            prop_assert_eq!(&files[0].content, &data);
        }

        #[test]
        fn prop_plain_text_never_detected(text in "[a-zA-Z ,.\n]{0,200}") {
            // Without digits no begin line can validate.
            prop_assert!(!detect(&text));
        }
    }
}
