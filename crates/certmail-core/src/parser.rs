//! Message classification and entity assembly.

use crate::config::ParserConfig;
use crate::error::{Artifact, Error, Result};
use crate::identity::{resolve_message_id, strip_angle_brackets};
use crate::model::{
    Address, CertificationData, EmbeddedArtifact, Header, Mail, ParsedEntity, Pec, PecReceipt,
    TransportHeaders,
};
use crate::walker::{PecArtifacts, walk};
use certmail_mime::{Mailbox, Message};
use std::path::Path;
use tracing::{debug, info};

/// Parses messages into [`ParsedEntity`] values.
///
/// Classification uses the `X-Trasporto` and `X-Ricevuta` headers:
///
/// | `X-Trasporto` | `X-Ricevuta` | Result |
/// |---------------|--------------|--------|
/// | absent        | absent       | [`ParsedEntity::Mail`] |
/// | present       | any          | [`ParsedEntity::Pec`] |
/// | absent        | present      | [`ParsedEntity::Receipt`] |
///
/// A parser holds only its configuration and can be shared across threads.
///
/// # Example
///
/// ```
/// use certmail_core::{MailParser, ParsedEntity};
///
/// let raw = b"From: a@example.it\r\nMessage-ID: <1@example.it>\r\n\r\nHello";
/// let entity = MailParser::default().parse(raw).unwrap();
///
/// let ParsedEntity::Mail(mail) = entity else { panic!("not a mail") };
/// assert_eq!(mail.message_id, "1@example.it");
/// assert_eq!(mail.body_txt.as_deref(), Some("Hello"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MailParser {
    config: ParserConfig,
}

impl MailParser {
    /// Creates a parser with the given configuration.
    #[must_use]
    pub const fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// The parser configuration.
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a raw RFC 5322 message.
    ///
    /// # Errors
    ///
    /// See [`MailParser::parse_message`].
    pub fn parse(&self, raw: &[u8]) -> Result<ParsedEntity> {
        self.parse_message(&Message::parse(raw))
    }

    /// Reads and parses an `.eml` file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise see
    /// [`MailParser::parse_message`].
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedEntity> {
        let path = path.as_ref();
        debug!("Reading {}", path.display());
        let raw = std::fs::read(path)?;
        self.parse(&raw)
    }

    /// Classifies an already parsed message and assembles the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if a header or content node is unreadable, a PEC
    /// lacks `postacert.eml`, a receipt lacks `daticert.xml`, certification
    /// data cannot be bound or a uuencoded block is corrupt.
    pub fn parse_message(&self, message: &Message) -> Result<ParsedEntity> {
        let transport = TransportHeaders::from_headers(message.headers());

        let entity = match (&transport.transport, &transport.receipt) {
            (None, None) => ParsedEntity::Mail(self.extract_mail(message)?),
            (Some(_), _) => ParsedEntity::Pec(Box::new(self.extract_pec(message, transport)?)),
            (None, Some(_)) => {
                ParsedEntity::Receipt(Box::new(self.extract_receipt(message, transport)?))
            }
        };

        info!(
            "Parsed {} {}",
            entity.entity_type().as_str(),
            entity.message_id()
        );
        Ok(entity)
    }

    /// Envelope and content of a message, outside PEC mode.
    fn extract_mail(&self, message: &Message) -> Result<Mail> {
        let mut mail = self.envelope(message);
        walk(message.root(), &mut mail, None)?;
        Ok(mail)
    }

    /// Envelope and content of a message, claiming PEC artifacts.
    fn extract_pec_parts(&self, message: &Message) -> Result<(Mail, PecArtifacts)> {
        let mut mail = self.envelope(message);
        let mut artifacts = PecArtifacts::default();
        walk(message.root(), &mut mail, Some(&mut artifacts))?;
        Ok((mail, artifacts))
    }

    /// The embedded original message, always parsed as plain mail.
    fn original_message(&self, postacert: &EmbeddedArtifact) -> Result<Mail> {
        self.extract_mail(&Message::parse(&postacert.content))
    }

    fn extract_pec(&self, message: &Message, transport: TransportHeaders) -> Result<Pec> {
        let (envelope, artifacts) = self.extract_pec_parts(message)?;
        let postacert = artifacts
            .postacert
            .ok_or(Error::MissingArtifact(Artifact::Postacert))?;
        let original = self.original_message(&postacert)?;

        let certified = transport
            .transport_type()
            .is_some_and(|t| self.config.is_certified(t));
        let certification_data = match (&artifacts.daticert, certified) {
            (Some(daticert), true) => Some(CertificationData::from_xml(&daticert.content)?),
            (None, true) => {
                debug!("Certified transport without {}", Artifact::Daticert);
                None
            }
            (_, false) => None,
        };

        Ok(Pec::new(envelope, original, transport, postacert)
            .with_certification_data(certification_data)
            .with_daticert(artifacts.daticert))
    }

    fn extract_receipt(&self, message: &Message, transport: TransportHeaders) -> Result<PecReceipt> {
        let (envelope, artifacts) = self.extract_pec_parts(message)?;
        let daticert = artifacts
            .daticert
            .ok_or(Error::MissingArtifact(Artifact::Daticert))?;
        let certification_data = CertificationData::from_xml(&daticert.content)?;

        let pec = match artifacts.postacert {
            Some(postacert) => {
                let original = self.original_message(&postacert)?;
                Some(
                    Pec::new(envelope.clone(), original, transport.clone(), postacert)
                        .with_certification_data(Some(certification_data.clone()))
                        .with_daticert(Some(daticert)),
                )
            }
            None => None,
        };

        Ok(PecReceipt {
            envelope,
            certification_data,
            transport,
            pec,
        })
    }

    /// Header-derived fields of a message.
    fn envelope(&self, message: &Message) -> Mail {
        let addresses =
            |list: Vec<Mailbox>| list.into_iter().map(Address::from).collect::<Vec<_>>();

        let references = message
            .header("References")
            .map(|value| {
                value
                    .split_whitespace()
                    .map(strip_angle_brackets)
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let headers = self.config.extract_all_headers.then(|| {
            message
                .headers()
                .iter()
                .map(|(name, value)| Header {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect()
        });

        Mail {
            message_id: resolve_message_id(message),
            subject: message.subject(),
            from: addresses(message.from()),
            to: addresses(message.to()),
            cc: addresses(message.cc()),
            bcc: addresses(message.bcc()),
            sent_date: message.sent_date(),
            received_date: message.received_date(),
            reply_to_message_id: message
                .header("In-Reply-To")
                .map(strip_angle_brackets)
                .filter(|id| !id.is_empty()),
            references,
            headers,
            ..Mail::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{CertificationType, EntityType, TransportType};

    const DATICERT: &str = concat!(
        "<?xml version=\"1.0\"?>\n",
        "<postacert tipo=\"avvenuta-consegna\" errore=\"nessuno\">\n",
        "<intestazione><mittente>a@pec.it</mittente>",
        "<destinatari tipo=\"certificato\">b@pec.it</destinatari>",
        "<risposte>a@pec.it</risposte></intestazione>\n",
        "<dati><gestore-emittente>Gestore</gestore-emittente>",
        "<data zona=\"+0100\"><giorno>02/01/2024</giorno><ora>09:00:00</ora></data>",
        "<consegna>b@pec.it</consegna></dati>\n",
        "</postacert>\n",
    );

    fn receipt(with_daticert: bool, with_postacert: bool) -> String {
        let mut raw = String::from(concat!(
            "Message-ID: <ricevuta-1@pec.it>\r\n",
            "X-Ricevuta: avvenuta-consegna\r\n",
            "X-Riferimento-Message-ID: <orig@pec.it>\r\n",
            "Content-Type: multipart/mixed; boundary=r\r\n\r\n",
            "--r\r\n\r\nRicevuta di avvenuta consegna\r\n",
        ));
        if with_daticert {
            raw.push_str("--r\r\nContent-Type: application/xml; name=daticert.xml\r\n\r\n");
            raw.push_str(DATICERT);
        }
        if with_postacert {
            raw.push_str("--r\r\nContent-Type: message/rfc822; name=postacert.eml\r\n\r\n");
            raw.push_str("Message-ID: <orig@pec.it>\r\n\r\nCiao\r\n");
        }
        raw.push_str("--r--\r\n");
        raw
    }

    #[test]
    fn test_plain_mail_envelope() {
        let raw = concat!(
            "Message-ID: <m1@example.it>\r\n",
            "From: \"Mario Rossi\" <mario@example.it>\r\n",
            "To: a@example.it\r\n",
            "Bcc: b@example.it\r\n",
            "Subject: Ciao\r\n",
            "In-Reply-To: <m0@example.it>\r\n",
            "References: <r1@example.it>\r\n <m0@example.it>\r\n",
            "Date: Tue, 2 Jan 2024 09:00:00 +0100\r\n",
            "\r\n",
            "Hello",
        );
        let entity = MailParser::default().parse(raw.as_bytes()).unwrap();
        let mail = entity.as_mail().unwrap();

        assert_eq!(mail.message_id, "m1@example.it");
        assert_eq!(mail.from[0].display_name.as_deref(), Some("Mario Rossi"));
        assert_eq!(mail.to[0].email, "a@example.it");
        assert_eq!(mail.bcc[0].email, "b@example.it");
        assert_eq!(mail.subject.as_deref(), Some("Ciao"));
        assert_eq!(mail.reply_to_message_id.as_deref(), Some("m0@example.it"));
        assert_eq!(mail.references, vec!["r1@example.it", "m0@example.it"]);
        assert!(mail.sent_date.is_some());
        assert!(mail.headers.is_none());
        assert_eq!(mail.body_txt.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_extract_all_headers() {
        let parser = MailParser::new(ParserConfig::builder().extract_all_headers(true).build());
        let entity = parser.parse(b"X-One: 1\r\nx-two: 2\r\n\r\nbody").unwrap();
        let headers = entity.as_mail().unwrap().headers.clone().unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[1].name, "x-two");
        assert_eq!(headers[1].value, "2");
    }

    #[test]
    fn test_malformed_encoded_words_kept_verbatim() {
        let raw = concat!(
            "From: =?utf-8?X?bad?= <a@b.it>\r\n",
            "Subject: =?utf-8?B?@@@@?= report\r\n",
            "\r\n",
            "body",
        );
        let entity = MailParser::default().parse(raw.as_bytes()).unwrap();
        let mail = entity.as_mail().unwrap();

        assert_eq!(mail.subject.as_deref(), Some("=?utf-8?B?@@@@?= report"));
        assert_eq!(mail.from[0].email, "a@b.it");
        assert_eq!(mail.from[0].display_name.as_deref(), Some("=?utf-8?X?bad?="));
        assert_eq!(mail.body_txt.as_deref(), Some("body"));
    }

    #[test]
    fn test_malformed_encoded_filename_kept_verbatim() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=m\r\n\r\n",
            "--m\r\n\r\nbody\r\n",
            "--m\r\n",
            "Content-Type: application/pdf; name=\"=?utf-8?B?@@@?=\"\r\n\r\n",
            "data\r\n",
            "--m--\r\n",
        );
        let entity = MailParser::default().parse(raw.as_bytes()).unwrap();
        let mail = entity.as_mail().unwrap();

        assert_eq!(mail.attachments.len(), 1);
        assert_eq!(mail.attachments[0].name, "=?utf-8?B?@@@?=");
        assert_eq!(mail.attachments[0].content, b"data");
    }

    #[test]
    fn test_pec_without_postacert_fails() {
        let raw = "X-Trasporto: posta-certificata\r\nMessage-ID: <x@pec.it>\r\n\r\nno artifacts";
        let err = MailParser::default().parse(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingArtifact(Artifact::Postacert)));
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArtifact);
    }

    #[test]
    fn test_receipt_without_daticert_fails() {
        let err = MailParser::default()
            .parse(receipt(false, false).as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::MissingArtifact(Artifact::Daticert)));
    }

    #[test]
    fn test_receipt() {
        let entity = MailParser::default()
            .parse(receipt(true, false).as_bytes())
            .unwrap();
        assert_eq!(entity.entity_type(), EntityType::Receipt);

        let receipt = entity.as_receipt().unwrap();
        assert_eq!(receipt.envelope.message_id, "ricevuta-1@pec.it");
        assert_eq!(
            receipt.certification_data.certification_type,
            CertificationType::AvvenutaConsegna
        );
        assert_eq!(receipt.certification_data.delivery.as_deref(), Some("b@pec.it"));
        assert_eq!(
            receipt.transport.receipt_kind(),
            Some(CertificationType::AvvenutaConsegna)
        );
        assert!(receipt.pec.is_none());
        assert!(receipt.envelope.attachments.is_empty());
    }

    #[test]
    fn test_receipt_with_postacert_carries_pec() {
        let entity = MailParser::default()
            .parse(receipt(true, true).as_bytes())
            .unwrap();
        let receipt = entity.as_receipt().unwrap();
        let pec = receipt.pec.as_ref().unwrap();

        assert_eq!(pec.envelope(), &receipt.envelope);
        assert_eq!(pec.original_message().message_id, "orig@pec.it");
        assert_eq!(pec.original_message().body_txt.as_deref(), Some("Ciao"));
        assert_eq!(pec.certification_data(), Some(&receipt.certification_data));
        assert!(pec.daticert().is_some());
    }

    #[test]
    fn test_uncertified_transport_has_no_certification_data() {
        let raw = concat!(
            "X-Trasporto: errore\r\n",
            "Content-Type: multipart/mixed; boundary=e\r\n\r\n",
            "--e\r\nContent-Type: message/rfc822; name=postacert.eml\r\n\r\n",
            "Subject: x\r\n\r\nbody\r\n",
            "--e\r\nContent-Type: application/xml; name=daticert.xml\r\n\r\n",
            "<not-even-valid\r\n",
            "--e--\r\n",
        );
        let entity = MailParser::default().parse(raw.as_bytes()).unwrap();
        let pec = entity.as_pec().unwrap();
        assert_eq!(pec.transport().transport_type(), Some(TransportType::Errore));
        assert!(pec.certification_data().is_none());
        assert!(pec.daticert().is_some());

        // Certifying the error transport binds (and here rejects) the XML.
        let parser = MailParser::new(
            ParserConfig::builder()
                .certify_transport(TransportType::Errore)
                .build(),
        );
        let err = parser.parse(raw.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BindingFailure);
    }

    #[test]
    fn test_parse_file_missing() {
        let err = MailParser::default()
            .parse_file("/nonexistent/certmail/message.eml")
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_parser_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MailParser>();
    }
}
