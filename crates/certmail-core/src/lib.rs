//! # certmail-core
//!
//! Parsing of e-mail messages and Italian certified e-mail (PEC).
//!
//! This crate provides:
//! - Classification of a message as plain mail, PEC or PEC receipt
//! - Envelope extraction (identity, addresses, dates, threading)
//! - Body, attachment and uuencoded content extraction
//! - Delivery status (bounce) reports
//! - Binding of the `daticert.xml` certification document
//!
//! ```
//! use certmail_core::{MailParser, ParserConfig};
//!
//! let parser = MailParser::new(ParserConfig::builder().extract_all_headers(true).build());
//! let entity = parser.parse(b"Subject: Hi\r\n\r\nBody").unwrap();
//! assert_eq!(entity.envelope().subject.as_deref(), Some("Hi"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod certification;
pub mod config;
mod delivery_status;
mod error;
pub mod identity;
pub mod model;
mod parser;
pub mod uuencode;
mod walker;
mod xml;

pub use config::{ParserConfig, ParserConfigBuilder};
pub use error::{Artifact, BindingError, Error, ErrorKind, Result};
pub use identity::resolve_message_id;
pub use model::{
    Address, Attachment, CertificationData, CertificationDate, CertificationType, DeliveryAction,
    DeliveryStatus, EmbeddedArtifact, EntityType, Header, Mail, ParsedEntity, Pec, PecError,
    PecReceipt, ReceiptType, Recipient, RecipientRole, StatusClass, TransportHeaders,
    TransportType, TypedValue,
};
pub use parser::MailParser;
