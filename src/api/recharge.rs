use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Response,
    Json,
};

use super::AppState;
use crate::error::{AppError, AppErrorKind, ValidationError};
use crate::middleware::error::{get_request_id_from_headers, success_response};
use crate::recharge::types::RechargeSubmission;

/// POST /api/recharge
///
/// Body: `{type, network, phoneNumber, amount, dataSize?, reference?}`.
/// A manual fallback is still a success; the transaction says it needs staff.
pub async fn submit_recharge(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RechargeSubmission>, JsonRejection>,
) -> Result<Response, AppError> {
    let request_id = get_request_id_from_headers(&headers);

    let Json(submission) = payload.map_err(|e| {
        let err = AppError::new(AppErrorKind::Validation(ValidationError::InvalidField {
            field: "body".to_string(),
            reason: e.body_text(),
        }));
        attach(err, &request_id)
    })?;

    let transaction = state
        .recharge
        .submit_recharge(&submission)
        .await
        .map_err(|e| attach(e.into(), &request_id))?;

    let message = transaction.message.clone();
    Ok(success_response(message, transaction))
}

pub(crate) fn attach(err: AppError, request_id: &Option<String>) -> AppError {
    match request_id {
        Some(id) => err.with_request_id(id.clone()),
        None => err,
    }
}
