//! Binding of `daticert.xml` to [`CertificationData`].
//!
//! The element paths below are fixed by the certified-mail schema.
//! Required fields must resolve to exactly one node; optional fields are
//! left unset when absent or repeated.

use crate::error::BindingError;
use crate::model::{
    CertificationData, CertificationDate, CertificationType, PecError, ReceiptType, Recipient,
    RecipientRole,
};
use crate::xml::{attribute, select, text_content};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};
use roxmltree::{Document, Node, ParsingOptions};
use tracing::warn;

const POSTACERT_PATH: &str = "/postacert";
const SENDER_PATH: &str = "/postacert/intestazione/mittente";
const RECIPIENTS_PATH: &str = "/postacert/intestazione/destinatari";
const ANSWERS_PATH: &str = "/postacert/intestazione/risposte";
const SUBJECT_PATH: &str = "/postacert/intestazione/oggetto";
const ISSUER_PATH: &str = "/postacert/dati/gestore-emittente";
const DATE_PATH: &str = "/postacert/dati/data";
const DAY_PATH: &str = "/postacert/dati/data/giorno";
const HOUR_PATH: &str = "/postacert/dati/data/ora";
const RECEIPT_PATH: &str = "/postacert/dati/ricevuta";
const EXTENDED_ERROR_PATH: &str = "/postacert/dati/errore-esteso";
const DELIVERY_PATH: &str = "/postacert/dati/consegna";
const RECEIVING_PATH: &str = "/postacert/dati/ricezione";
const MESSAGE_ID_PATH: &str = "/postacert/dati/msgid";
const IDENTIFIER_PATH: &str = "/postacert/dati/identificativo";

const TYPE_ATTRIBUTE: &str = "tipo";
const ERROR_ATTRIBUTE: &str = "errore";
const ZONE_ATTRIBUTE: &str = "zona";

const DAY_FORMAT: &str = "%d/%m/%Y";
const HOUR_FORMAT: &str = "%H:%M:%S";

impl CertificationData {
    /// Parses a `daticert.xml` document.
    ///
    /// The declared encoding is honored; UTF-8 is assumed otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Xml`] for malformed documents,
    /// [`BindingError::Missing`] when a required field is absent and
    /// [`BindingError::Ambiguous`] when it is repeated.
    pub fn from_xml(bytes: &[u8]) -> Result<Self, BindingError> {
        let text = decode_document(bytes);
        let mut options = ParsingOptions::default();
        options.allow_dtd = true;
        let document = Document::parse_with_options(&text, options)?;
        let doc = &document;

        Ok(Self {
            certification_type: CertificationType::from_wire(&required_attribute(
                doc,
                POSTACERT_PATH,
                TYPE_ATTRIBUTE,
            )?),
            sender: required_text(doc, SENDER_PATH)?,
            recipients: recipients(doc)?,
            message_id: optional_text(doc, MESSAGE_ID_PATH),
            id: optional_text(doc, IDENTIFIER_PATH),
            error: PecError::from_wire(&required_attribute(doc, POSTACERT_PATH, ERROR_ATTRIBUTE)?),
            answers: required_text(doc, ANSWERS_PATH)?,
            subject: optional_text(doc, SUBJECT_PATH),
            issuer: required_text(doc, ISSUER_PATH)?,
            delivery: optional_text(doc, DELIVERY_PATH),
            receiving: optional_text(doc, RECEIVING_PATH),
            extended_error: optional_text(doc, EXTENDED_ERROR_PATH),
            date: CertificationDate {
                zone: required_attribute(doc, DATE_PATH, ZONE_ATTRIBUTE)?,
                day: required_text(doc, DAY_PATH)?,
                hour: required_text(doc, HOUR_PATH)?,
            },
            receipt_type: optional_attribute(doc, RECEIPT_PATH, TYPE_ATTRIBUTE)
                .map(|value| ReceiptType::from_wire(&value)),
        })
    }
}

impl CertificationDate {
    /// Absolute instant of the event.
    ///
    /// `day` is `dd/MM/yyyy`; `hour` is `HH:mm:ss`, or blank for midnight.
    /// `zone` is a UTC offset (`Z`, `+hh`, `+hhmm`, `+hh:mm`); when blank the
    /// local zone applies.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::InvalidDate`] if any component is malformed.
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>, BindingError> {
        let invalid = |value: &str, reason: &str| BindingError::InvalidDate {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let day = NaiveDate::parse_from_str(self.day.trim(), DAY_FORMAT)
            .map_err(|e| invalid(&self.day, &e.to_string()))?;
        let time = if self.hour.trim().is_empty() {
            NaiveTime::MIN
        } else {
            NaiveTime::parse_from_str(self.hour.trim(), HOUR_FORMAT)
                .map_err(|e| invalid(&self.hour, &e.to_string()))?
        };
        let naive = day.and_time(time);

        if self.zone.trim().is_empty() {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.fixed_offset())
                .ok_or_else(|| invalid(&naive.to_string(), "not a valid local time"));
        }

        let offset =
            parse_offset(&self.zone).ok_or_else(|| invalid(&self.zone, "not a UTC offset"))?;
        offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| invalid(&naive.to_string(), "out of range"))
    }
}

/// Parses `Z`, `+h`, `+hh`, `+hhmm` and `+hh:mm` (or `-`).
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    if zone.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let sign = match zone.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = zone[1..].replacen(':', "", 1);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes): (i32, i32) = match digits.len() {
        1 | 2 => (digits.parse().ok()?, 0),
        4 => (digits[..2].parse().ok()?, digits[2..].parse().ok()?),
        _ => return None,
    };
    if hours > 18 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Decodes the document using the charset named in its XML declaration.
fn decode_document(bytes: &[u8]) -> String {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(200)]);
    let declared = head
        .strip_prefix('\u{feff}')
        .unwrap_or(&*head)
        .strip_prefix("<?xml")
        .and_then(|decl| decl.split("?>").next())
        .and_then(|decl| decl.split_once("encoding"))
        .and_then(|(_, rest)| {
            let rest = rest.trim_start().strip_prefix('=')?.trim_start();
            let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
            rest[1..].split(quote).next().map(str::to_string)
        });

    certmail_mime::encoding::decode_charset(bytes, declared.as_deref())
}

fn single<'a, 'input>(
    document: &'a Document<'input>,
    path: &str,
) -> Result<Node<'a, 'input>, BindingError> {
    let nodes = select(document, path);
    match nodes.as_slice() {
        [] => Err(BindingError::Missing {
            path: path.to_string(),
        }),
        [node] => Ok(*node),
        _ => Err(BindingError::Ambiguous {
            path: path.to_string(),
            count: nodes.len(),
        }),
    }
}

fn required_text(document: &Document<'_>, path: &str) -> Result<String, BindingError> {
    single(document, path).map(text_content)
}

fn required_attribute(
    document: &Document<'_>,
    path: &str,
    name: &str,
) -> Result<String, BindingError> {
    let node = single(document, path)?;
    attribute(node, name)
        .map(str::to_string)
        .ok_or_else(|| BindingError::Missing {
            path: format!("{path}@{name}"),
        })
}

fn optional_node<'a, 'input>(document: &'a Document<'input>, path: &str) -> Option<Node<'a, 'input>> {
    let nodes = select(document, path);
    match nodes.as_slice() {
        [] => None,
        [node] => Some(*node),
        _ => {
            warn!("Ignoring {} repeated {} times", path, nodes.len());
            None
        }
    }
}

fn optional_text(document: &Document<'_>, path: &str) -> Option<String> {
    optional_node(document, path).map(text_content)
}

fn optional_attribute(document: &Document<'_>, path: &str, name: &str) -> Option<String> {
    optional_node(document, path).and_then(|node| attribute(node, name).map(str::to_string))
}

fn recipients(document: &Document<'_>) -> Result<Vec<Recipient>, BindingError> {
    let nodes = select(document, RECIPIENTS_PATH);
    if nodes.is_empty() {
        return Err(BindingError::Missing {
            path: RECIPIENTS_PATH.to_string(),
        });
    }

    Ok(nodes
        .into_iter()
        .map(|node| Recipient {
            address: text_content(node),
            role: attribute(node, TYPE_ATTRIBUTE).map_or(RecipientRole::Unknown, RecipientRole::from_wire),
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const DATICERT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE postacert SYSTEM "Daticert.dtd">
<postacert tipo="posta-certificata" errore="nessuno">
  <intestazione>
    <mittente>mittente@pec.example.it</mittente>
    <destinatari tipo="certificato">dest@pec.example.it</destinatari>
    <destinatari tipo="esterno">other@example.com</destinatari>
    <risposte>mittente@pec.example.it</risposte>
    <oggetto>Fattura 42</oggetto>
  </intestazione>
  <dati>
    <gestore-emittente>Example PEC S.p.A.</gestore-emittente>
    <data zona="+0200">
      <giorno>15/05/2023</giorno>
      <ora>10:30:15</ora>
    </data>
    <identificativo>opec123.20230515103015.00001@pec.example.it</identificativo>
    <msgid>&lt;orig-1@example.it&gt;</msgid>
  </dati>
</postacert>"#;

    fn date(zone: &str, day: &str, hour: &str) -> CertificationDate {
        CertificationDate {
            zone: zone.into(),
            day: day.into(),
            hour: hour.into(),
        }
    }

    #[test]
    fn test_from_xml() {
        let data = CertificationData::from_xml(DATICERT.as_bytes()).unwrap();

        assert_eq!(data.certification_type, CertificationType::PostaCertificata);
        assert_eq!(data.error, PecError::Nessuno);
        assert_eq!(data.sender, "mittente@pec.example.it");
        assert_eq!(data.answers, "mittente@pec.example.it");
        assert_eq!(data.issuer, "Example PEC S.p.A.");
        assert_eq!(data.subject.as_deref(), Some("Fattura 42"));
        assert_eq!(data.message_id.as_deref(), Some("<orig-1@example.it>"));
        assert_eq!(data.recipients.len(), 2);
        assert_eq!(data.recipients[0].role, RecipientRole::Certificato);
        assert_eq!(data.recipients[1].address, "other@example.com");
        assert_eq!(data.date, date("+0200", "15/05/2023", "10:30:15"));
        assert!(data.receipt_type.is_none());
        assert!(data.delivery.is_none());
    }

    #[test]
    fn test_missing_sender_fails() {
        let xml = DATICERT.replace("<mittente>mittente@pec.example.it</mittente>", "");
        let err = CertificationData::from_xml(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, BindingError::Missing { ref path } if path == SENDER_PATH));
    }

    #[test]
    fn test_missing_subject_is_optional() {
        let xml = DATICERT.replace("<oggetto>Fattura 42</oggetto>", "");
        let data = CertificationData::from_xml(xml.as_bytes()).unwrap();
        assert!(data.subject.is_none());
    }

    #[test]
    fn test_repeated_required_field_is_ambiguous() {
        let xml = DATICERT.replace(
            "<risposte>mittente@pec.example.it</risposte>",
            "<risposte>a@pec.it</risposte><risposte>b@pec.it</risposte>",
        );
        let err = CertificationData::from_xml(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, BindingError::Ambiguous { count: 2, .. }));
    }

    #[test]
    fn test_repeated_optional_field_is_unset() {
        let xml = DATICERT.replace(
            "<oggetto>Fattura 42</oggetto>",
            "<oggetto>one</oggetto><oggetto>two</oggetto>",
        );
        let data = CertificationData::from_xml(xml.as_bytes()).unwrap();
        assert!(data.subject.is_none());
    }

    #[test]
    fn test_missing_attribute() {
        let xml = DATICERT.replace(" errore=\"nessuno\"", "");
        let err = CertificationData::from_xml(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, BindingError::Missing { ref path } if path == "/postacert@errore"));
    }

    #[test]
    fn test_attribute_names_case_insensitive_and_unknown_values() {
        let xml = DATICERT
            .replace("tipo=\"posta-certificata\"", "TIPO=\"novita\"")
            .replace("<destinatari tipo=\"esterno\">", "<destinatari>");
        let data = CertificationData::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(data.certification_type, CertificationType::Unknown);
        assert_eq!(data.recipients[1].role, RecipientRole::Unknown);
    }

    #[test]
    fn test_receipt_type() {
        let xml = DATICERT.replace("</dati>", "<ricevuta tipo=\"breve\"/></dati>");
        let data = CertificationData::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(data.receipt_type, Some(ReceiptType::Breve));
    }

    #[test]
    fn test_declared_latin1_encoding() {
        let mut bytes = DATICERT
            .replace("encoding=\"UTF-8\"", "encoding=\"ISO-8859-1\"")
            .replace("Fattura 42", "Caff_")
            .into_bytes();
        let pos = bytes.iter().position(|&b| b == b'_').unwrap();
        bytes[pos] = 0xE8;
        let data = CertificationData::from_xml(&bytes).unwrap();
        assert_eq!(data.subject.as_deref(), Some("Caffè"));
    }

    #[test]
    fn test_malformed_xml() {
        let err = CertificationData::from_xml(b"<postacert>").unwrap_err();
        assert!(matches!(err, BindingError::Xml(_)));
    }

    #[test]
    fn test_timestamp_with_offsets() {
        let expected = "2023-05-15T10:30:15+02:00";
        for zone in ["+0200", "+02", "+02:00", "+2"] {
            let ts = date(zone, "15/05/2023", "10:30:15").timestamp().unwrap();
            assert_eq!(ts.to_rfc3339(), expected, "zone {zone}");
        }
        let utc = date("Z", "15/05/2023", "10:30:15").timestamp().unwrap();
        assert_eq!(utc.to_rfc3339(), "2023-05-15T10:30:15+00:00");
        let west = date("-0330", "15/05/2023", "10:30:15").timestamp().unwrap();
        assert_eq!(west.offset().local_minus_utc(), -(3 * 3600 + 30 * 60));
    }

    #[test]
    fn test_timestamp_day_only_and_local_zone() {
        let midnight = date("+0100", "01/02/2024", "").timestamp().unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-02-01T00:00:00+01:00");

        let local = date("", "01/02/2024", "12:00:00").timestamp().unwrap();
        assert_eq!(local.hour(), 12);
    }

    #[test]
    fn test_timestamp_invalid() {
        assert!(date("+0200", "2023-05-15", "").timestamp().is_err());
        assert!(date("CET", "15/05/2023", "").timestamp().is_err());
        assert!(date("+0200", "15/05/2023", "25:00:00").timestamp().is_err());
    }
}
