//! Top-level parse result.

use super::mail::Mail;
use super::pec::{Pec, PecReceipt};
use serde::Serialize;

/// Shape of a parse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Ordinary message.
    Mail,
    /// PEC transport envelope.
    Pec,
    /// PEC notification.
    Receipt,
}

impl EntityType {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "mail",
            Self::Pec => "pec",
            Self::Receipt => "receipt",
        }
    }
}

/// A classified message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "entity", rename_all = "snake_case")]
pub enum ParsedEntity {
    /// Ordinary message.
    Mail(Mail),
    /// PEC transport envelope.
    Pec(Box<Pec>),
    /// PEC notification.
    Receipt(Box<PecReceipt>),
}

impl ParsedEntity {
    /// Shape of this result.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Mail(_) => EntityType::Mail,
            Self::Pec(_) => EntityType::Pec,
            Self::Receipt(_) => EntityType::Receipt,
        }
    }

    /// The outermost message, i.e. the envelope for PEC variants.
    #[must_use]
    pub fn envelope(&self) -> &Mail {
        match self {
            Self::Mail(mail) => mail,
            Self::Pec(pec) => pec.envelope(),
            Self::Receipt(receipt) => &receipt.envelope,
        }
    }

    /// Identifier of the outermost message.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.envelope().message_id
    }

    /// Returns the mail, if this is a plain message.
    #[must_use]
    pub const fn as_mail(&self) -> Option<&Mail> {
        match self {
            Self::Mail(mail) => Some(mail),
            _ => None,
        }
    }

    /// Returns the PEC, if this is a transport envelope.
    #[must_use]
    pub fn as_pec(&self) -> Option<&Pec> {
        match self {
            Self::Pec(pec) => Some(pec.as_ref()),
            _ => None,
        }
    }

    /// Returns the receipt, if this is a notification.
    #[must_use]
    pub fn as_receipt(&self) -> Option<&PecReceipt> {
        match self {
            Self::Receipt(receipt) => Some(receipt.as_ref()),
            _ => None,
        }
    }
}
