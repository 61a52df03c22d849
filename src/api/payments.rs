use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::recharge::attach;
use super::AppState;
use crate::error::{AppError, AppErrorKind, ValidationError};
use crate::middleware::error::{get_request_id_from_headers, success_response};

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub reference: Option<String>,
}

/// POST /api/verify-payment
///
/// Client callback after checkout. Verifies the payment with Paystack and
/// fulfils it; a repeat call for the same reference returns the first result.
pub async fn verify_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request_id = get_request_id_from_headers(&headers);

    let reference = payload
        .ok()
        .and_then(|Json(body)| body.reference)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            attach(
                AppError::new(AppErrorKind::Validation(ValidationError::MissingField {
                    field: "reference".to_string(),
                })),
                &request_id,
            )
        })?;

    info!(reference = %reference, "Payment verification requested");

    let receipt = state
        .bridge
        .verify_and_fulfil(&reference)
        .await
        .map_err(|e| attach(e.into(), &request_id))?;

    let message = receipt.transaction.message.clone();
    Ok(success_response(message, receipt))
}
