//! Parsing of `message/delivery-status` bodies.

use crate::model::{DeliveryAction, DeliveryStatus, StatusClass, TypedValue};

impl DeliveryStatus {
    /// Parses the fields of a delivery status report.
    ///
    /// Field names are matched case-insensitively; folded lines are joined
    /// to the field they continue. When a field repeats (one block per
    /// recipient), the last occurrence wins. Never fails: unrecognized
    /// lines are ignored and absent fields stay unset.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut status = Self::default();

        for line in unfold(text) {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "action" => status.action = Some(DeliveryAction::from_wire(value)),
                "status" => {
                    status.status_class = value
                        .chars()
                        .next()
                        .and_then(|c| c.to_digit(10))
                        .and_then(StatusClass::from_digit);
                    status.status = Some(value.to_string());
                }
                "diagnostic-code" => status.diagnostic_code = Some(typed_value(value)),
                "remote-mta" => status.remote_mta = Some(typed_value(value)),
                "reporting-mta" => status.reporting_mta = Some(typed_value(value)),
                "received-from-mta" => status.received_from_mta = Some(typed_value(value)),
                "final-recipient" => status.final_recipient = Some(typed_value(value)),
                _ => {}
            }
        }

        status
    }
}

/// Splits `type; value` at the first semicolon.
fn typed_value(raw: &str) -> TypedValue {
    match raw.split_once(';') {
        Some((value_type, value)) => TypedValue {
            value_type: Some(value_type.trim().to_string()),
            value: value.trim().to_string(),
        },
        None => TypedValue {
            value_type: None,
            value: raw.trim().to_string(),
        },
    }
}

/// Joins continuation lines (leading whitespace) to the line before.
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        match lines.last_mut() {
            Some(previous) if line.starts_with([' ', '\t']) && !line.trim().is_empty() => {
                previous.push(' ');
                previous.push_str(line.trim());
            }
            _ => lines.push(line.to_string()),
        }
    }
    lines
}
