//! Message identity resolution.

use certmail_mime::Message;
use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

const SEPARATOR: &str = "_";
const MINUTE_FORMAT: &str = "%Y%m%d%H%M";

/// Returns the message identifier.
///
/// The `Message-ID` header is used when present, without angle brackets.
/// Otherwise an identifier is derived from the sender, the sorted
/// recipients and the sent and received dates (minute precision, UTC),
/// joined with `_` and hashed with SHA-256. Without any date the result is
/// random and differs between calls.
#[must_use]
pub fn resolve_message_id(message: &Message) -> String {
    if let Some(id) = message
        .message_id()
        .map(strip_angle_brackets)
        .filter(|id| !id.is_empty())
    {
        return id;
    }

    let mut components: Vec<String> = Vec::new();

    let sender = message
        .sender()
        .or_else(|| message.from().into_iter().next());
    if let Some(sender) = sender {
        components.push(sender.email);
    }

    let mut recipients: Vec<String> = [message.to(), message.cc(), message.bcc()]
        .into_iter()
        .flatten()
        .map(|mailbox| mailbox.email)
        .collect();
    recipients.sort();
    components.extend(recipients);

    let dates: Vec<String> = [message.sent_date(), message.received_date()]
        .into_iter()
        .flatten()
        .map(format_minute)
        .collect();
    if dates.is_empty() {
        warn!("Message has no Message-ID and no dates, using a random identifier");
        return random_id();
    }
    components.extend(dates);

    let seed = components.join(SEPARATOR);
    debug!("Deriving message id from {}", seed);
    hex_digest(seed.as_bytes())
}

/// Removes every `<` and `>`.
pub(crate) fn strip_angle_brackets(value: &str) -> String {
    value.trim().replace(['<', '>'], "")
}

fn format_minute(date: DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc).format(MINUTE_FORMAT).to_string()
}

fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn random_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let random: u64 = rand::thread_rng().r#gen();
    format!("{millis:x}-{random:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_message_id() {
        let message = Message::parse(b"Message-ID: <abc.123@example.it>\r\n\r\nbody");
        assert_eq!(resolve_message_id(&message), "abc.123@example.it");
    }

    #[test]
    fn test_blank_message_id_falls_back() {
        let message = Message::parse(b"Message-ID: <>\r\nDate: Mon, 1 Jan 2024 10:00:00 +0000\r\n\r\n");
        let id = resolve_message_id(&message);
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn test_derived_id_is_sha256_of_components() {
        let raw = concat!(
            "From: Mario <mario@example.it>\r\n",
            "To: zeta@example.it, alfa@example.it\r\n",
            "Cc: beta@example.it\r\n",
            "Date: Mon, 1 Jan 2024 11:30:45 +0100\r\n",
            "\r\n",
            "body"
        );
        let message = Message::parse(raw.as_bytes());
        let expected = hex_digest(
            b"mario@example.it_alfa@example.it_beta@example.it_zeta@example.it_202401011030",
        );
        assert_eq!(resolve_message_id(&message), expected);
        // Deterministic.
        assert_eq!(resolve_message_id(&message), expected);
    }

    #[test]
    fn test_sender_header_preferred_over_from() {
        let with_sender = Message::parse(
            b"Sender: relay@example.it\r\nFrom: a@example.it\r\nDate: Mon, 1 Jan 2024 10:00:00 +0000\r\n\r\n",
        );
        assert_eq!(
            resolve_message_id(&with_sender),
            hex_digest(b"relay@example.it_202401011000")
        );
    }

    #[test]
    fn test_received_date_component() {
        let message = Message::parse(
            b"Received: from a by b; Tue, 2 Jan 2024 08:15:00 +0000\r\n\r\n",
        );
        assert_eq!(resolve_message_id(&message), hex_digest(b"202401020815"));
    }

    #[test]
    fn test_random_fallback_without_dates() {
        let message = Message::parse(b"From: a@example.it\r\n\r\nbody");
        let first = resolve_message_id(&message);
        let second = resolve_message_id(&message);
        assert!(first.contains('-'));
        assert_ne!(first, second);
    }

    #[test]
    fn test_strip_angle_brackets() {
        assert_eq!(strip_angle_brackets(" <a@b> "), "a@b");
        assert_eq!(strip_angle_brackets("a@b"), "a@b");
    }
}
