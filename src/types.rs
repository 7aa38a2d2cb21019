//! Shared identifier aliases and the payment method enum.

use serde::{Deserialize, Serialize};

/// Chat user identifier, as delivered by the messaging transport.
pub type UserId = i64;

/// Chat identifier. For private chats this usually equals the [`UserId`],
/// but the two are kept distinct so group operator chats work unchanged.
pub type ChatId = i64;

/// Transport-assigned message identifier.
pub type MessageId = i32;

/// Payment method selected at the final checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Qr,
    Online,
}

impl PaymentMethod {
    /// Wire label used in selection callbacks (`pay:cash`, `pay:qr`, `pay:online`).
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Qr => "qr",
            PaymentMethod::Online => "online",
        }
    }

    /// Parse a selection callback payload, with or without the `pay:` prefix.
    pub fn parse(data: &str) -> Option<Self> {
        let label = data.strip_prefix("pay:").unwrap_or(data);
        match label {
            "cash" => Some(PaymentMethod::Cash),
            "qr" => Some(PaymentMethod::Qr),
            "online" => Some(PaymentMethod::Online),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
