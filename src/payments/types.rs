use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Success,
    Failed,
    Cancelled,
    Reversed,
    Unknown,
}

impl PaymentState {
    pub fn from_provider_status(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "success" => PaymentState::Success,
            "pending" | "ongoing" | "processing" | "queued" => PaymentState::Pending,
            "failed" => PaymentState::Failed,
            "abandoned" => PaymentState::Cancelled,
            "reversed" => PaymentState::Reversed,
            _ => PaymentState::Unknown,
        }
    }
}

/// Result of asking the payment gateway about a reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifiedPayment {
    /// True only when the gateway reports the charge as successful.
    pub verified: bool,
    pub status: PaymentState,
    pub reference: String,
    /// Major units (naira).
    pub amount: Decimal,
    pub currency: String,
    pub customer_email: Option<String>,
    pub paid_at: Option<String>,
    pub gateway_response: Option<String>,
    /// Recharge details attached at checkout.
    pub metadata: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookVerificationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event_type: String,
    pub reference: Option<String>,
    pub status: Option<PaymentState>,
    pub payload: JsonValue,
    pub received_at: String,
}
