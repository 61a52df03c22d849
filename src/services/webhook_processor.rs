use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::payments::provider::PaymentVerifier;
use crate::payments::types::WebhookEvent;
use crate::recharge::types::Transaction;
use crate::services::payment_bridge::{BridgeError, PaymentBridge, PaymentMetadata};

#[derive(Debug, Error)]
pub enum WebhookProcessorError {
    #[error("Missing signature")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

/// What a webhook led to.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// `charge.success` fed into the bridge.
    Fulfilled(Box<Transaction>),
    /// Event acknowledged and logged only.
    Acknowledged { event_type: String },
}

pub struct WebhookProcessor {
    verifier: Arc<dyn PaymentVerifier>,
    bridge: PaymentBridge,
}

impl WebhookProcessor {
    pub fn new(verifier: Arc<dyn PaymentVerifier>, bridge: PaymentBridge) -> Self {
        Self { verifier, bridge }
    }

    /// Authenticate the raw body against its signature, then dispatch.
    pub async fn process_webhook(
        &self,
        signature: Option<&str>,
        payload: &[u8],
    ) -> Result<WebhookOutcome, WebhookProcessorError> {
        let signature = signature.ok_or(WebhookProcessorError::MissingSignature)?;

        let verification = self
            .verifier
            .verify_webhook(payload, signature)
            .map_err(|e| WebhookProcessorError::ProcessingError(e.to_string()))?;
        if !verification.valid {
            error!(provider = self.verifier.name(), "Invalid webhook signature");
            return Err(WebhookProcessorError::InvalidSignature);
        }

        let event = self
            .verifier
            .parse_webhook_event(payload)
            .map_err(|e| WebhookProcessorError::InvalidPayload(e.to_string()))?;

        self.process_event(&event).await
    }

    async fn process_event(
        &self,
        event: &WebhookEvent,
    ) -> Result<WebhookOutcome, WebhookProcessorError> {
        let reference = event.reference.as_deref().unwrap_or_default();
        info!(event_type = %event.event_type, reference = reference, "Webhook received");

        match event.event_type.as_str() {
            "charge.success" => {
                let metadata = charge_metadata(&event.payload)?;
                let transaction = self
                    .bridge
                    .on_payment_verified(metadata)
                    .await
                    .map_err(|e: BridgeError| WebhookProcessorError::ProcessingError(e.to_string()))?;
                Ok(WebhookOutcome::Fulfilled(Box::new(transaction)))
            }
            "charge.failed" => {
                warn!(reference = reference, "Payment failed");
                Ok(self.acknowledge(event))
            }
            "transfer.success" => {
                info!(reference = reference, "Transfer successful");
                Ok(self.acknowledge(event))
            }
            "transfer.failed" => {
                warn!(reference = reference, "Transfer failed");
                Ok(self.acknowledge(event))
            }
            _ => {
                warn!(event_type = %event.event_type, "Unhandled webhook event type");
                Ok(self.acknowledge(event))
            }
        }
    }

    fn acknowledge(&self, event: &WebhookEvent) -> WebhookOutcome {
        WebhookOutcome::Acknowledged {
            event_type: event.event_type.clone(),
        }
    }
}

/// Bridge input from a signed `charge.success` body. The signature stands in
/// for a separate verification call.
fn charge_metadata(payload: &JsonValue) -> Result<PaymentMetadata, WebhookProcessorError> {
    let data = payload
        .get("data")
        .ok_or_else(|| WebhookProcessorError::InvalidPayload("missing data".to_string()))?;

    let reference = data
        .get("reference")
        .and_then(|v| v.as_str())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| WebhookProcessorError::InvalidPayload("missing reference".to_string()))?;

    let kobo = data
        .get("amount")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| WebhookProcessorError::InvalidPayload("missing amount".to_string()))?;

    let fields = match data.get("metadata").cloned().unwrap_or(JsonValue::Null) {
        JsonValue::String(raw) => serde_json::from_str(&raw).unwrap_or(JsonValue::Null),
        other => other,
    };

    Ok(PaymentMetadata {
        reference: reference.to_string(),
        amount: Decimal::from(kobo) / Decimal::from(100),
        fields,
    })
}
