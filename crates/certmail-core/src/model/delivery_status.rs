//! Delivery status notification model (RFC 3464).

use serde::Serialize;

/// `Action` field of a delivery status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryAction {
    /// Delivery failed.
    Failed,
    /// Delivery failed (non-standard spelling).
    Failure,
    /// Delivery delayed.
    Delayed,
    /// Delivered.
    Delivered,
    /// Relayed to a non-DSN environment.
    Relayed,
    /// Expanded to multiple recipients.
    Expanded,
    /// Explicit `unknown`, or any unmapped value.
    Unknown,
}

impl DeliveryAction {
    /// Maps a wire value; unmapped values become [`Self::Unknown`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s.trim() {
            "failed" => Self::Failed,
            "failure" => Self::Failure,
            "delayed" => Self::Delayed,
            "delivered" => Self::Delivered,
            "relayed" => Self::Relayed,
            "expanded" => Self::Expanded,
            _ => Self::Unknown,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Failure => "failure",
            Self::Delayed => "delayed",
            Self::Delivered => "delivered",
            Self::Relayed => "relayed",
            Self::Expanded => "expanded",
            Self::Unknown => "unknown",
        }
    }
}

/// Class of an enhanced status code (RFC 3463), from its first digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    /// `2.x.x`
    Info,
    /// `4.x.x`
    TemporaryFailure,
    /// `5.x.x`
    PermanentFailure,
}

impl StatusClass {
    /// Maps the leading digit of a status code.
    #[must_use]
    pub const fn from_digit(digit: u32) -> Option<Self> {
        match digit {
            2 => Some(Self::Info),
            4 => Some(Self::TemporaryFailure),
            5 => Some(Self::PermanentFailure),
            _ => None,
        }
    }

    /// Numeric prefix of the class.
    #[must_use]
    pub const fn digit(&self) -> u32 {
        match self {
            Self::Info => 2,
            Self::TemporaryFailure => 4,
            Self::PermanentFailure => 5,
        }
    }
}

/// A `type; value` field such as `rfc822; user@example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedValue {
    /// Part before the first `;`, when present.
    #[serde(rename = "type")]
    pub value_type: Option<String>,
    /// Address, name or description.
    pub value: String,
}

/// Parsed body of a `message/delivery-status` part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryStatus {
    /// `Action`.
    pub action: Option<DeliveryAction>,
    /// `Status`, e.g. `5.7.0`.
    pub status: Option<String>,
    /// Class derived from `status`.
    pub status_class: Option<StatusClass>,
    /// `Diagnostic-Code` (type and description).
    pub diagnostic_code: Option<TypedValue>,
    /// `Reporting-MTA` (type and address).
    pub reporting_mta: Option<TypedValue>,
    /// `Remote-MTA` (type and address).
    pub remote_mta: Option<TypedValue>,
    /// `Received-From-MTA` (type and name).
    pub received_from_mta: Option<TypedValue>,
    /// `Final-Recipient` (type and address).
    pub final_recipient: Option<TypedValue>,
}

impl DeliveryStatus {
    /// True when the report describes a permanent failure.
    #[must_use]
    pub fn is_permanent_failure(&self) -> bool {
        self.status_class == Some(StatusClass::PermanentFailure)
    }
}
