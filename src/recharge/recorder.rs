use chrono::Utc;
use uuid::Uuid;

use super::types::{
    ProviderOutcome, RechargeDetails, RechargeRequest, ServiceType, Transaction,
    TransactionStatus, NO_PROVIDER,
};

const CONFIRMATION_CODE_LEN: usize = 8;
const REFERENCE_SUFFIX_LEN: usize = 6;

fn random_upper(len: usize) -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(len)
        .collect::<String>()
        .to_uppercase()
}

/// `AIRTIME_MTN_1718000000000_4F9A2C`: service, network, epoch millis and a
/// random suffix.
pub fn mint_reference(request: &RechargeRequest) -> String {
    format!(
        "{}_{}_{}_{}",
        request.service_type.code(),
        request.network.code(),
        Utc::now().timestamp_millis(),
        random_upper(REFERENCE_SUFFIX_LEN)
    )
}

/// Short upper-case code shown to the customer.
pub fn mint_confirmation_code() -> String {
    random_upper(CONFIRMATION_CODE_LEN)
}

/// Turns the winning outcome into the durable [`Transaction`].
#[derive(Debug, Clone, Default)]
pub struct TransactionRecorder;

impl TransactionRecorder {
    pub fn new() -> Self {
        Self
    }

    /// The caller's reference when one was supplied, else a minted one.
    pub fn resolve_reference(&self, request: &RechargeRequest) -> String {
        request
            .supplied_reference()
            .map(str::to_string)
            .unwrap_or_else(|| mint_reference(request))
    }

    pub fn record(
        &self,
        request: &RechargeRequest,
        reference: &str,
        outcome: &ProviderOutcome,
    ) -> Transaction {
        if !outcome.succeeded {
            // orchestrated outcomes always succeed; keep a paid request visible anyway
            let reason = outcome
                .failure_reason
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "provider did not deliver".to_string());
            return self.record_failure(RechargeDetails::from(request), reference, reason);
        }

        let manual = outcome.is_manual();
        let status = if manual {
            TransactionStatus::ManualPending
        } else {
            TransactionStatus::Completed
        };

        let confirmation_code = if outcome.confirmation_code.trim().is_empty() {
            mint_confirmation_code()
        } else {
            outcome.confirmation_code.clone()
        };

        let message = if manual {
            "Payment confirmed. Recharge is being processed manually and will be completed shortly"
                .to_string()
        } else {
            match request.service_type {
                ServiceType::Airtime => "Airtime recharge processed successfully".to_string(),
                ServiceType::Data => "Data recharge processed successfully".to_string(),
            }
        };

        Transaction {
            reference: reference.to_string(),
            request: RechargeDetails::from(request),
            status,
            provider: outcome.provider_name.clone(),
            confirmation_code,
            external_transaction_id: outcome.external_transaction_id.clone(),
            processed_at: Utc::now(),
            manual_processing_required: manual,
            message,
            failure_reason: None,
        }
    }

    /// A paid request that could not even reach the providers.
    pub fn record_failure(
        &self,
        details: RechargeDetails,
        reference: &str,
        reason: impl Into<String>,
    ) -> Transaction {
        let reason = reason.into();
        Transaction {
            reference: reference.to_string(),
            request: details,
            status: TransactionStatus::Failed,
            provider: NO_PROVIDER.to_string(),
            confirmation_code: mint_confirmation_code(),
            external_transaction_id: String::new(),
            processed_at: Utc::now(),
            manual_processing_required: false,
            message: format!(
                "Payment received but the recharge could not be started: {}",
                reason
            ),
            failure_reason: Some(reason),
        }
    }
}
