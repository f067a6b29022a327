//! Depth-first walk over a message's content tree.
//!
//! Each node is classified once into a [`NodeKind`]; the walk then fills
//! the owning [`Mail`] (bodies, attachments, delivery status) and, for PEC
//! envelopes, claims the two reserved artifacts into [`PecArtifacts`].

use crate::error::{Artifact, Error, Result};
use crate::identity::strip_angle_brackets;
use crate::model::{Attachment, DeliveryStatus, EmbeddedArtifact, Mail};
use crate::uuencode;
use certmail_mime::{ContentType, Part};
use tracing::{debug, warn};

const FALLBACK_NAME: &str = "unnamed";

/// What a content node contributes to the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// Non-attachment `text/plain`.
    TextPlain,
    /// Non-attachment `text/html`.
    TextHtml,
    /// `multipart/*` container.
    Multipart,
    /// `message/delivery-status` report.
    DeliveryStatus,
    /// Anything else: a candidate attachment or PEC artifact.
    Other,
}

/// Classifies a node from its content type and disposition.
pub(crate) fn classify(part: &Part) -> Result<NodeKind> {
    let content_type = content_type(part)?;
    let is_attachment = part.disposition().is_some_and(|d| d.is_attachment());

    let kind = if content_type.matches("text/plain") && !is_attachment {
        NodeKind::TextPlain
    } else if content_type.matches("text/html") && !is_attachment {
        NodeKind::TextHtml
    } else if content_type.is_multipart() {
        NodeKind::Multipart
    } else if content_type.matches("message/delivery-status") {
        NodeKind::DeliveryStatus
    } else {
        NodeKind::Other
    };
    Ok(kind)
}

/// The `postacert.eml` and `daticert.xml` slots, filled at most once each.
#[derive(Debug, Default)]
pub(crate) struct PecArtifacts {
    pub(crate) postacert: Option<EmbeddedArtifact>,
    pub(crate) daticert: Option<EmbeddedArtifact>,
}

impl PecArtifacts {
    /// True once both slots are filled; nothing more is claimed after that.
    pub(crate) const fn is_complete(&self) -> bool {
        self.postacert.is_some() && self.daticert.is_some()
    }

    /// Returns the empty slot this node would fill, if any.
    fn claimable(&self, name: Option<&str>, content_type: &ContentType) -> Option<Artifact> {
        let name = name?;
        if self.postacert.is_none()
            && name.eq_ignore_ascii_case(Artifact::Postacert.file_name())
            && content_type.matches("message/rfc822")
        {
            Some(Artifact::Postacert)
        } else if self.daticert.is_none()
            && name.eq_ignore_ascii_case(Artifact::Daticert.file_name())
            && (content_type.matches("application/xml") || content_type.matches("text/xml"))
        {
            Some(Artifact::Daticert)
        } else {
            None
        }
    }

    fn fill(&mut self, artifact: Artifact, value: EmbeddedArtifact) {
        match artifact {
            Artifact::Postacert => self.postacert = Some(value),
            Artifact::Daticert => self.daticert = Some(value),
        }
    }
}

/// Walks `part` and its descendants in pre-order.
///
/// `artifacts` is `Some` in PEC mode. Any unreadable node aborts the walk.
pub(crate) fn walk(
    part: &Part,
    mail: &mut Mail,
    mut artifacts: Option<&mut PecArtifacts>,
) -> Result<()> {
    match classify(part)? {
        NodeKind::TextPlain if mail.body_txt.is_none() => capture_text(part, mail),
        NodeKind::TextHtml => {
            let html = body_text(part, "html body")?;
            mail.append_html(&html);
            Ok(())
        }
        NodeKind::Multipart => {
            for child in part.parts() {
                walk(child, mail, artifacts.as_deref_mut())?;
            }
            Ok(())
        }
        NodeKind::DeliveryStatus => {
            let text = body_text(part, "delivery status")?;
            mail.delivery_status = Some(DeliveryStatus::parse(&text));
            Ok(())
        }
        NodeKind::TextPlain | NodeKind::Other => handle_leaf(part, mail, artifacts),
    }
}

/// Captures the first plain-text body, splitting off uuencoded files.
fn capture_text(part: &Part, mail: &mut Mail) -> Result<()> {
    let text = body_text(part, "text body")?;

    match uuencode::find_block_start(&text) {
        Some(start) => {
            for file in uuencode::decode(&text)? {
                debug!("Extracted uuencoded attachment {}", file.name);
                mail.add_attachment(Attachment::new(file.name, file.content));
            }
            mail.body_txt = Some(text[..start].to_string());
        }
        None => mail.body_txt = Some(text),
    }
    Ok(())
}

fn handle_leaf(part: &Part, mail: &mut Mail, artifacts: Option<&mut PecArtifacts>) -> Result<()> {
    let content_type = content_type(part)?;
    let name = part
        .filename()
        .map_err(|e| Error::content("attachment file name", e))?;

    if let Some(artifacts) = artifacts.filter(|a| !a.is_complete()) {
        if let Some(artifact) = artifacts.claimable(name.as_deref(), &content_type) {
            let content = decode_body(part, artifact.file_name())?;
            debug!("Claimed {} ({} bytes)", artifact, content.len());
            let name = name.unwrap_or_else(|| artifact.file_name().to_string());
            artifacts.fill(artifact, EmbeddedArtifact::new(name, content));
            return Ok(());
        }
    }

    let name = name.unwrap_or_else(|| FALLBACK_NAME.to_string());
    let content = decode_body(part, &name)?;
    let content_id = part
        .header("content-id")
        .map(strip_angle_brackets)
        .filter(|id| !id.is_empty());
    let transport_attachment_id = part
        .header("x-attachment-id")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    mail.add_attachment(Attachment {
        name,
        content,
        mime_type: Some(content_type.essence()),
        content_id,
        transport_attachment_id,
        inline: part.disposition().is_some_and(|d| d.is_inline()),
    });
    Ok(())
}

fn content_type(part: &Part) -> Result<ContentType> {
    part.content_type().map_err(|e| {
        warn!("Unreadable content type: {}", e);
        Error::content("content type", e)
    })
}

fn body_text(part: &Part, context: &str) -> Result<String> {
    part.body_text().map_err(|e| Error::content(context, e))
}

fn decode_body(part: &Part, context: &str) -> Result<Vec<u8>> {
    part.decode_body()
        .map_err(|e| Error::content(format!("payload of {context}"), e))
}
