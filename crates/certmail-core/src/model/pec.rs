//! PEC transport envelope and receipt entities.

use super::attachment::EmbeddedArtifact;
use super::certification::{CertificationData, CertificationType};
use super::mail::Mail;
use certmail_mime::Headers;
use serde::Serialize;

/// `X-Trasporto` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportType {
    /// Certified message transport.
    PostaCertificata,
    /// Transport error notification.
    Errore,
    /// Any other value.
    Unknown,
}

impl TransportType {
    /// Maps a wire value; unmapped values become [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "posta-certificata" => Self::PostaCertificata,
            "errore" => Self::Errore,
            _ => Self::Unknown,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PostaCertificata => "posta-certificata",
            Self::Errore => "errore",
            Self::Unknown => "unknown",
        }
    }
}

/// Raw values of the transport headers that drove classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransportHeaders {
    /// `X-Trasporto`.
    pub transport: Option<String>,
    /// `X-Ricevuta`.
    pub receipt: Option<String>,
    /// `X-TipoRicevuta`.
    pub receipt_type: Option<String>,
    /// `X-VerificaSicurezza`.
    pub security_check: Option<String>,
    /// `X-Riferimento-Message-ID`.
    pub reference_message_id: Option<String>,
}

impl TransportHeaders {
    /// Header carrying the transport type.
    pub const TRANSPORT: &'static str = "X-Trasporto";
    /// Header carrying the receipt kind.
    pub const RECEIPT: &'static str = "X-Ricevuta";
    /// Header carrying the receipt detail level.
    pub const RECEIPT_TYPE: &'static str = "X-TipoRicevuta";
    /// Header carrying the provider security check result.
    pub const SECURITY_CHECK: &'static str = "X-VerificaSicurezza";
    /// Header referencing the original message.
    pub const REFERENCE: &'static str = "X-Riferimento-Message-ID";

    /// Reads the transport headers.
    #[must_use]
    pub fn from_headers(headers: &Headers) -> Self {
        let read = |name: &str| headers.get(name).map(|value| value.trim().to_string());
        Self {
            transport: read(Self::TRANSPORT),
            receipt: read(Self::RECEIPT),
            receipt_type: read(Self::RECEIPT_TYPE),
            security_check: read(Self::SECURITY_CHECK),
            reference_message_id: read(Self::REFERENCE),
        }
    }

    /// Typed `X-Trasporto`.
    #[must_use]
    pub fn transport_type(&self) -> Option<TransportType> {
        self.transport.as_deref().map(TransportType::from_wire)
    }

    /// Typed `X-Ricevuta`.
    #[must_use]
    pub fn receipt_kind(&self) -> Option<CertificationType> {
        self.receipt.as_deref().map(CertificationType::from_wire)
    }
}

/// A PEC transport envelope.
///
/// A PEC always carries its original message; the only constructor takes
/// the `postacert.eml` artifact it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pec {
    envelope: Mail,
    original_message: Mail,
    certification_data: Option<CertificationData>,
    transport: TransportHeaders,
    postacert: EmbeddedArtifact,
    daticert: Option<EmbeddedArtifact>,
}

impl Pec {
    /// Creates a PEC without certification data.
    #[must_use]
    pub const fn new(
        envelope: Mail,
        original_message: Mail,
        transport: TransportHeaders,
        postacert: EmbeddedArtifact,
    ) -> Self {
        Self {
            envelope,
            original_message,
            certification_data: None,
            transport,
            postacert,
            daticert: None,
        }
    }

    /// Attaches certification data.
    #[must_use]
    pub fn with_certification_data(mut self, data: Option<CertificationData>) -> Self {
        self.certification_data = data;
        self
    }

    /// Attaches the raw `daticert.xml` artifact.
    #[must_use]
    pub fn with_daticert(mut self, daticert: Option<EmbeddedArtifact>) -> Self {
        self.daticert = daticert;
        self
    }

    /// The transport envelope.
    #[must_use]
    pub const fn envelope(&self) -> &Mail {
        &self.envelope
    }

    /// The certified original message.
    #[must_use]
    pub const fn original_message(&self) -> &Mail {
        &self.original_message
    }

    /// Certification data, when the transport is certified.
    #[must_use]
    pub const fn certification_data(&self) -> Option<&CertificationData> {
        self.certification_data.as_ref()
    }

    /// Transport header values.
    #[must_use]
    pub const fn transport(&self) -> &TransportHeaders {
        &self.transport
    }

    /// Raw `postacert.eml`.
    #[must_use]
    pub const fn postacert(&self) -> &EmbeddedArtifact {
        &self.postacert
    }

    /// Raw `daticert.xml`, if present.
    #[must_use]
    pub const fn daticert(&self) -> Option<&EmbeddedArtifact> {
        self.daticert.as_ref()
    }
}

/// A PEC notification (acceptance, delivery, error, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PecReceipt {
    /// The receipt's own envelope.
    pub envelope: Mail,
    /// Certification data of the notified event.
    pub certification_data: CertificationData,
    /// Transport header values.
    pub transport: TransportHeaders,
    /// The receipt reclassified as a PEC, when it embeds `postacert.eml`.
    pub pec: Option<Pec>,
}
