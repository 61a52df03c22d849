use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use super::AppState;
use crate::services::webhook_processor::{WebhookOutcome, WebhookProcessorError};

pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

/// POST /api/webhook/paystack
///
/// The signature covers the raw body, so the body is taken as bytes.
/// Processing failures answer 500 so Paystack redelivers; redelivery is safe
/// because fulfilment is keyed by the payment reference.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(PAYSTACK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.webhooks.process_webhook(signature, &body).await {
        Ok(WebhookOutcome::Fulfilled(transaction)) => {
            info!(
                reference = %transaction.reference,
                status = %transaction.status,
                "Webhook processed successfully"
            );
            ok()
        }
        Ok(WebhookOutcome::Acknowledged { event_type }) => {
            info!(event_type = %event_type, "Webhook acknowledged");
            ok()
        }
        Err(e @ (WebhookProcessorError::MissingSignature
        | WebhookProcessorError::InvalidSignature)) => {
            warn!(error = %e, "Rejected webhook");
            (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
        Err(WebhookProcessorError::InvalidPayload(reason)) => {
            warn!(reason = %reason, "Invalid webhook payload");
            (StatusCode::BAD_REQUEST, "Invalid payload").into_response()
        }
        Err(e @ WebhookProcessorError::ProcessingError(_)) => {
            error!(error = %e, "Webhook processing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Processing failed").into_response()
        }
    }
}

fn ok() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "success" }))).into_response()
}
