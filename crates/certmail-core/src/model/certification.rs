//! Certification data carried by `daticert.xml`.

use serde::Serialize;

/// Kind of certified-mail event (`/postacert@tipo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificationType {
    /// Submission accepted.
    Accettazione,
    /// Submission refused.
    NonAccettazione,
    /// Taken in charge by the recipient's provider.
    PresaInCarico,
    /// Delivered to the recipient mailbox.
    AvvenutaConsegna,
    /// The certified transport itself.
    PostaCertificata,
    /// Transport error.
    Errore,
    /// Delivery error.
    ErroreConsegna,
    /// Delivery error warning.
    PreavvisoErroreConsegna,
    /// Virus detected.
    RilevazioneVirus,
    /// Any other value.
    Unknown,
}

impl CertificationType {
    /// Maps a wire value; unmapped values become [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "accettazione" => Self::Accettazione,
            "non-accettazione" => Self::NonAccettazione,
            "presa-in-carico" => Self::PresaInCarico,
            "avvenuta-consegna" => Self::AvvenutaConsegna,
            "posta-certificata" => Self::PostaCertificata,
            "errore" => Self::Errore,
            "errore-consegna" => Self::ErroreConsegna,
            "preavviso-errore-consegna" => Self::PreavvisoErroreConsegna,
            "rilevazione-virus" => Self::RilevazioneVirus,
            _ => Self::Unknown,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accettazione => "accettazione",
            Self::NonAccettazione => "non-accettazione",
            Self::PresaInCarico => "presa-in-carico",
            Self::AvvenutaConsegna => "avvenuta-consegna",
            Self::PostaCertificata => "posta-certificata",
            Self::Errore => "errore",
            Self::ErroreConsegna => "errore-consegna",
            Self::PreavvisoErroreConsegna => "preavviso-errore-consegna",
            Self::RilevazioneVirus => "rilevazione-virus",
            Self::Unknown => "unknown",
        }
    }
}

/// Error code of the event (`/postacert@errore`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PecError {
    /// No error.
    Nessuno,
    /// Unknown recipient.
    NoDest,
    /// Unknown domain.
    NoDominio,
    /// Virus found.
    Virus,
    /// Other error.
    Altro,
    /// Any other value.
    Unknown,
}

impl PecError {
    /// Maps a wire value; unmapped values become [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "nessuno" => Self::Nessuno,
            "no-dest" => Self::NoDest,
            "no-dominio" => Self::NoDominio,
            "virus" => Self::Virus,
            "altro" => Self::Altro,
            _ => Self::Unknown,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nessuno => "nessuno",
            Self::NoDest => "no-dest",
            Self::NoDominio => "no-dominio",
            Self::Virus => "virus",
            Self::Altro => "altro",
            Self::Unknown => "unknown",
        }
    }
}

/// Role of a recipient (`destinatari@tipo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecipientRole {
    /// Ordinary mailbox outside the certified network.
    Esterno,
    /// Certified mailbox.
    Certificato,
    /// Any other value, or no role given.
    Unknown,
}

impl RecipientRole {
    /// Maps a wire value; unmapped values become [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "esterno" => Self::Esterno,
            "certificato" => Self::Certificato,
            _ => Self::Unknown,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Esterno => "esterno",
            Self::Certificato => "certificato",
            Self::Unknown => "unknown",
        }
    }

    /// True for certified mailboxes.
    #[must_use]
    pub const fn is_certified(&self) -> bool {
        matches!(self, Self::Certificato)
    }
}

/// Receipt detail level (`/postacert/dati/ricevuta@tipo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiptType {
    /// Receipt embeds the full original message.
    Completa,
    /// Receipt embeds digests of the original parts.
    Breve,
    /// Receipt carries certification data only.
    Sintetica,
    /// Any other value.
    Unknown,
}

impl ReceiptType {
    /// Maps a wire value; unmapped values become [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "completa" => Self::Completa,
            "breve" => Self::Breve,
            "sintetica" => Self::Sintetica,
            _ => Self::Unknown,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completa => "completa",
            Self::Breve => "breve",
            Self::Sintetica => "sintetica",
            Self::Unknown => "unknown",
        }
    }
}

/// A recipient listed in the certification data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// Recipient address.
    pub address: String,
    /// Recipient role.
    pub role: RecipientRole,
}

/// Date triple as stored in `daticert.xml`, kept verbatim.
///
/// Use [`CertificationDate::timestamp`] to obtain an absolute instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificationDate {
    /// UTC offset, e.g. `+0200`.
    pub zone: String,
    /// Day as `dd/MM/yyyy`.
    pub day: String,
    /// Time as `HH:mm:ss`.
    pub hour: String,
}

/// Typed projection of `daticert.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificationData {
    /// Event kind.
    pub certification_type: CertificationType,
    /// Sender address.
    pub sender: String,
    /// Recipients in document order.
    pub recipients: Vec<Recipient>,
    /// Message-ID of the original message.
    pub message_id: Option<String>,
    /// Provider-assigned transport identifier.
    pub id: Option<String>,
    /// Error code.
    pub error: PecError,
    /// Reply-to address.
    pub answers: String,
    /// Subject of the original message.
    pub subject: Option<String>,
    /// Issuing provider.
    pub issuer: String,
    /// Address the message was delivered to.
    pub delivery: Option<String>,
    /// Address the message was received at.
    pub receiving: Option<String>,
    /// Free-text error description.
    pub extended_error: Option<String>,
    /// Event date.
    pub date: CertificationDate,
    /// Receipt detail level.
    pub receipt_type: Option<ReceiptType>,
}
