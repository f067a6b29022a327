//! Address list parsing (RFC 5322 `From`, `To`, `Cc`, ...).

use crate::encoding::decode_rfc2047;

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, RFC 2047 decoded.
    pub name: Option<String>,
    /// Email address as written, without angle brackets.
    pub email: String,
}

impl Mailbox {
    /// Creates a mailbox with just an address.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }
}

/// Parses a comma separated address list.
///
/// Group syntax (`team: a@x, b@y;`) is flattened into its members; empty
/// groups such as `undisclosed-recipients:;` contribute nothing. Items
/// without an address are skipped.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<Mailbox> {
    split_items(value)
        .iter()
        .filter_map(|item| parse_mailbox(item))
        .collect()
}

/// Splits at top-level commas and group delimiters, dropping group names.
fn split_items(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut comment_depth = 0usize;
    let mut escaped = false;

    for c in value.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes || comment_depth > 0 => {
                current.push(c);
                escaped = true;
            }
            '"' if comment_depth == 0 => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '(' if !in_quotes => {
                comment_depth += 1;
                current.push(c);
            }
            ')' if !in_quotes && comment_depth > 0 => {
                comment_depth -= 1;
                current.push(c);
            }
            '<' if !in_quotes && comment_depth == 0 => {
                in_angle = true;
                current.push(c);
            }
            '>' if !in_quotes && comment_depth == 0 => {
                in_angle = false;
                current.push(c);
            }
            ':' if !in_quotes && !in_angle && comment_depth == 0 => current.clear(),
            ',' | ';' if !in_quotes && !in_angle && comment_depth == 0 => {
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_mailbox(item: &str) -> Option<Mailbox> {
    if let (Some(open), Some(close)) = (item.find('<'), item.rfind('>')) {
        if open < close {
            let email = item[open + 1..close].trim().to_string();
            if email.is_empty() {
                return None;
            }
            let name = display_name(strip_comments(&item[..open]).trim());
            return Some(Mailbox { name, email });
        }
    }

    // Bare address, optionally followed by a legacy "(Name)" comment.
    let email = strip_comments(item).trim().to_string();
    if email.is_empty() {
        return None;
    }
    let name = match (item.find('('), item.rfind(')')) {
        (Some(open), Some(close)) if open < close => display_name(item[open + 1..close].trim()),
        _ => None,
    };
    Some(Mailbox { name, email })
}

fn display_name(raw: &str) -> Option<String> {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map_or_else(|| raw.to_string(), |s| s.replace("\\\"", "\"").replace("\\\\", "\\"));
    Some(decode_rfc2047(unquoted.trim())).filter(|name| !name.is_empty())
}

fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    let mut in_quotes = false;
    for c in s.chars() {
        match c {
            '"' if depth == 0 => {
                in_quotes = !in_quotes;
                out.push(c);
            }
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes && depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_list() {
        let list = parse_address_list("alice@example.com, Bob <bob@example.com>");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], Mailbox::new("alice@example.com"));
        assert_eq!(list[1].name.as_deref(), Some("Bob"));
        assert_eq!(list[1].email, "bob@example.com");
    }

    #[test]
    fn test_parse_quoted_name_with_comma() {
        let list = parse_address_list("\"Rossi, Mario\" <mario@pec.it>");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name.as_deref(), Some("Rossi, Mario"));
        assert_eq!(list[0].email, "mario@pec.it");
    }

    #[test]
    fn test_parse_encoded_name() {
        let list = parse_address_list("=?utf-8?Q?Jos=C3=A9?= <jose@example.com>");
        assert_eq!(list[0].name.as_deref(), Some("José"));
    }

    #[test]
    fn test_parse_groups() {
        let list = parse_address_list("team: a@x.it, b@y.it;, c@z.it");
        let emails: Vec<&str> = list.iter().map(|m| m.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.it", "b@y.it", "c@z.it"]);

        assert!(parse_address_list("undisclosed-recipients:;").is_empty());
    }

    #[test]
    fn test_parse_legacy_comment_name() {
        let list = parse_address_list("per-conto-di@pec.it (Mario Rossi)");
        assert_eq!(list[0].email, "per-conto-di@pec.it");
        assert_eq!(list[0].name.as_deref(), Some("Mario Rossi"));
    }

    #[test]
    fn test_parse_malformed_encoded_name() {
        let list = parse_address_list("=?utf-8?B?@@@@?= <bad@example.com>");
        assert_eq!(list[0].name.as_deref(), Some("=?utf-8?B?@@@@?="));
        assert_eq!(list[0].email, "bad@example.com");
    }
}
