//! Result entities produced by the parser.

mod address;
mod attachment;
mod certification;
mod delivery_status;
mod entity;
mod mail;
mod pec;

pub use address::{Address, Header};
pub use attachment::{Attachment, EmbeddedArtifact};
pub use certification::{
    CertificationData, CertificationDate, CertificationType, PecError, ReceiptType, Recipient,
    RecipientRole,
};
pub use delivery_status::{DeliveryAction, DeliveryStatus, StatusClass, TypedValue};
pub use entity::{EntityType, ParsedEntity};
pub use mail::Mail;
pub use pec::{Pec, PecReceipt, TransportHeaders, TransportType};

pub(crate) use attachment::unique_name;
