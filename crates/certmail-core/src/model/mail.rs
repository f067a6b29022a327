//! Plain message entity.

use super::address::{Address, Header};
use super::attachment::{Attachment, unique_name};
use super::delivery_status::DeliveryStatus;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// An ordinary email message, or the envelope of a PEC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mail {
    /// Message identifier without angle brackets, or a derived one.
    pub message_id: String,
    /// Decoded subject.
    pub subject: Option<String>,
    /// `From` addresses.
    pub from: Vec<Address>,
    /// `To` addresses.
    pub to: Vec<Address>,
    /// `Cc` addresses.
    pub cc: Vec<Address>,
    /// `Bcc` addresses.
    pub bcc: Vec<Address>,
    /// `Date` header.
    pub sent_date: Option<DateTime<FixedOffset>>,
    /// Date stamped by the most recent `Received` header.
    pub received_date: Option<DateTime<FixedOffset>>,
    /// First plain-text body, without trailing uuencoded blocks.
    pub body_txt: Option<String>,
    /// Concatenation of all HTML bodies in tree order.
    pub body_html: Option<String>,
    /// Attachments in tree order.
    pub attachments: Vec<Attachment>,
    /// `In-Reply-To` without angle brackets.
    pub reply_to_message_id: Option<String>,
    /// `References` identifiers, oldest first.
    pub references: Vec<String>,
    /// Parsed `message/delivery-status` part, if the message is a report.
    pub delivery_status: Option<DeliveryStatus>,
    /// All raw headers, when extraction was enabled.
    pub headers: Option<Vec<Header>>,
}

impl Mail {
    /// Creates an empty mail with the given identifier.
    #[must_use]
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            ..Self::default()
        }
    }

    /// True if a delivery-status report was found.
    #[must_use]
    pub const fn has_delivery_status(&self) -> bool {
        self.delivery_status.is_some()
    }

    /// Appends an attachment, renaming it if its name is already taken.
    pub fn add_attachment(&mut self, mut attachment: Attachment) {
        attachment.name = unique_name(&attachment.name, |candidate| {
            self.attachments.iter().any(|a| a.name == candidate)
        });
        self.attachments.push(attachment);
    }

    /// Looks up an attachment by exact name.
    #[must_use]
    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.name == name)
    }

    /// Appends to the HTML body.
    pub(crate) fn append_html(&mut self, html: &str) {
        match &mut self.body_html {
            Some(body) => body.push_str(html),
            None => self.body_html = Some(html.to_string()),
        }
    }
}
