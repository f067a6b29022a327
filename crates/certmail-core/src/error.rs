//! Error types for the extraction engine.

use std::fmt;
use thiserror::Error;

/// One of the two embedded documents a PEC transport carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// `postacert.eml`, the original message.
    Postacert,
    /// `daticert.xml`, the certification data.
    Daticert,
}

impl Artifact {
    /// Reserved file name of the artifact.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Postacert => "postacert.eml",
            Self::Daticert => "daticert.xml",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Errors raised while binding `daticert.xml` to typed certification data.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The document is not well-formed XML.
    #[error("Malformed certification document: {0}")]
    Xml(#[from] roxmltree::Error),

    /// A required node or attribute is absent.
    #[error("Required field {path} is missing")]
    Missing {
        /// Path of the missing node, `@attr` suffixed for attributes.
        path: String,
    },

    /// A required single-valued path matched more than one node.
    #[error("Required field {path} matched {count} nodes")]
    Ambiguous {
        /// Path that matched.
        path: String,
        /// Number of matching nodes.
        count: usize,
    },

    /// The certification date cannot be turned into a timestamp.
    #[error("Invalid certification date {value:?}: {reason}")]
    InvalidDate {
        /// Offending value.
        value: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Broad failure category, stable across error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A transport header or envelope field could not be read.
    HeaderReadFailure,
    /// A content node could not be read or decoded.
    ContentReadFailure,
    /// A PEC lacks `postacert.eml`, or a receipt lacks `daticert.xml`.
    MissingRequiredArtifact,
    /// Certification data is missing a required field or is ambiguous.
    BindingFailure,
    /// A validated uuencoded block failed to decode.
    CodecFailure,
}

/// Errors that can occur while parsing a message.
#[derive(Debug, Error)]
pub enum Error {
    /// A header could not be read. The lenient MIME reader keeps
    /// malformed encoded words verbatim, so envelope fields do not raise it.
    #[error("Failed to read header {name}")]
    HeaderRead {
        /// Header name.
        name: String,
        /// Underlying MIME error.
        #[source]
        source: certmail_mime::Error,
    },

    /// A content node could not be read.
    #[error("Failed to read content: {context}")]
    ContentRead {
        /// Which node or operation failed.
        context: String,
        /// Underlying MIME error.
        #[source]
        source: certmail_mime::Error,
    },

    /// A required embedded artifact is absent.
    #[error("Missing required artifact {0}")]
    MissingArtifact(Artifact),

    /// Certification data could not be bound.
    #[error("Certification data error")]
    Binding(#[from] BindingError),

    /// A uuencoded block could not be decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// I/O error while loading a message.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::HeaderRead { .. } => ErrorKind::HeaderReadFailure,
            Self::ContentRead { .. } | Self::Io(_) => ErrorKind::ContentReadFailure,
            Self::MissingArtifact(_) => ErrorKind::MissingRequiredArtifact,
            Self::Binding(_) => ErrorKind::BindingFailure,
            Self::Codec(_) => ErrorKind::CodecFailure,
        }
    }

    pub(crate) fn content(context: impl Into<String>, source: certmail_mime::Error) -> Self {
        Self::ContentRead {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
