//! Address and raw header models.

use serde::Serialize;

/// A sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    /// Email address.
    pub email: String,
    /// Display name, if any.
    pub display_name: Option<String>,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }
}

impl From<certmail_mime::Mailbox> for Address {
    fn from(mailbox: certmail_mime::Mailbox) -> Self {
        Self {
            email: mailbox.email,
            display_name: mailbox.name,
        }
    }
}

/// A raw header entry, as it appears in the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Header name with its original spelling.
    pub name: String,
    /// Unfolded, undecoded value.
    pub value: String,
}
