//! # certmail-mime
//!
//! MIME message tree parsing for email.
//!
//! ## Features
//!
//! - **Message tree**: lenient parsing of RFC 5322 messages into a tree of
//!   [`Part`]s, including nested multiparts and `multipart/digest` defaults
//! - **Decoding**: Base64, Quoted-Printable, charsets and RFC 2047/2231
//!   header parameters
//! - **Envelope**: address lists, subject, sent and received dates
//!
//! ## Quick Start
//!
//! ```
//! use certmail_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             To: recipient@example.com\r\n\
//!             Subject: Test\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw);
//! assert_eq!(message.subject().as_deref(), Some("Test"));
//! assert_eq!(message.root().body_text().unwrap(), "Hello, World!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{Mailbox, parse_address_list};
pub use content_type::{ContentDisposition, ContentType, DispositionKind};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
