//! Payment-to-recharge bridge.
//!
//! A verified payment carries the recharge details in its metadata. The
//! bridge turns that metadata into a recharge, using the payment reference as
//! the recharge idempotency key, so a webhook and a client callback for the
//! same payment deliver only once. A paid request whose metadata is unusable
//! is still recorded, as a `Failed` transaction for reconciliation.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::logging::mask_phone;
use crate::payments::error::PaymentError;
use crate::payments::provider::PaymentVerifier;
use crate::payments::types::{PaymentState, VerifiedPayment};
use crate::recharge::store::StoreError;
use crate::recharge::types::{RechargeDetails, RechargeSubmission, Transaction};
use crate::recharge::{RechargeError, RechargeService};

const SERVICE_TYPE_KEYS: &[&str] = &["type", "service_type", "serviceType"];
const NETWORK_KEYS: &[&str] = &["network"];
const PHONE_KEYS: &[&str] = &["phone_number", "phoneNumber", "phone"];
const PLAN_KEYS: &[&str] = &["plan_id", "data_size", "plan_code", "dataSize", "planId"];

/// Verified metadata is missing something a recharge cannot do without.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeExtractionError {
    #[error("payment metadata is missing '{0}'")]
    MissingField(&'static str),

    #[error("payment metadata is not an object")]
    NotAnObject,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("payment {reference} is not verified (status: {status:?})")]
    PaymentNotVerified {
        reference: String,
        status: PaymentState,
    },

    #[error(transparent)]
    Verification(#[from] PaymentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the bridge needs from a verified payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMetadata {
    pub reference: String,
    /// Amount actually paid, in naira.
    pub amount: Decimal,
    pub fields: JsonValue,
}

impl From<&VerifiedPayment> for PaymentMetadata {
    fn from(payment: &VerifiedPayment) -> Self {
        Self {
            reference: payment.reference.clone(),
            amount: payment.amount,
            fields: payment.metadata.clone(),
        }
    }
}

impl PaymentMetadata {
    fn field(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(|value| match value {
                JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Recharge details as a raw submission. The recharge amount is what was
    /// paid, not what the metadata claims.
    pub fn to_submission(&self) -> Result<RechargeSubmission, BridgeExtractionError> {
        if !self.fields.is_object() {
            return Err(BridgeExtractionError::NotAnObject);
        }

        let service_type = self
            .field(SERVICE_TYPE_KEYS)
            .ok_or(BridgeExtractionError::MissingField("type"))?;
        let network = self
            .field(NETWORK_KEYS)
            .ok_or(BridgeExtractionError::MissingField("network"))?;
        let phone_number = self
            .field(PHONE_KEYS)
            .ok_or(BridgeExtractionError::MissingField("phone_number"))?;

        Ok(RechargeSubmission {
            service_type: Some(service_type),
            network: Some(network),
            phone_number: Some(phone_number),
            amount: Some(self.amount),
            data_plan_code: self.field(PLAN_KEYS),
            reference: Some(self.reference.clone()),
        })
    }

    /// Best-effort snapshot for a transaction that cannot be processed.
    fn details(&self) -> RechargeDetails {
        RechargeDetails {
            service_type: self.field(SERVICE_TYPE_KEYS).unwrap_or_default(),
            network: self.field(NETWORK_KEYS).unwrap_or_default(),
            phone_number: self.field(PHONE_KEYS).unwrap_or_default(),
            amount: Some(self.amount),
            data_plan_code: self.field(PLAN_KEYS),
        }
    }
}

/// Confirmation of a verified payment together with its recharge.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub customer_email: Option<String>,
    pub transaction: Transaction,
}

#[derive(Clone)]
pub struct PaymentBridge {
    recharge: RechargeService,
    verifier: Arc<dyn PaymentVerifier>,
}

impl PaymentBridge {
    pub fn new(recharge: RechargeService, verifier: Arc<dyn PaymentVerifier>) -> Self {
        Self { recharge, verifier }
    }

    pub fn verifier(&self) -> &Arc<dyn PaymentVerifier> {
        &self.verifier
    }

    /// Verify a payment with the gateway and fulfil it once verified.
    pub async fn verify_and_fulfil(&self, reference: &str) -> Result<PaymentReceipt, BridgeError> {
        let payment = self.verifier.verify(reference).await?;
        if !payment.verified {
            warn!(
                reference = %payment.reference,
                status = ?payment.status,
                gateway_response = payment.gateway_response.as_deref().unwrap_or_default(),
                "Payment not verified, no recharge will be attempted"
            );
            return Err(BridgeError::PaymentNotVerified {
                reference: payment.reference,
                status: payment.status,
            });
        }

        let transaction = self.on_payment_verified(PaymentMetadata::from(&payment)).await?;

        Ok(PaymentReceipt {
            payment_reference: payment.reference,
            amount: payment.amount,
            currency: payment.currency,
            customer_email: payment.customer_email,
            transaction,
        })
    }

    /// Run a verified payment through validation, failover and recording.
    /// Never drops a paid request: bad metadata becomes a `Failed` record.
    pub async fn on_payment_verified(
        &self,
        metadata: PaymentMetadata,
    ) -> Result<Transaction, BridgeError> {
        let submission = match metadata.to_submission() {
            Ok(submission) => submission,
            Err(e) => {
                error!(
                    reference = %metadata.reference,
                    error = %e,
                    "Paid recharge has unusable metadata"
                );
                return Ok(self.record_undeliverable(&metadata, metadata.details(), e.to_string()).await);
            }
        };

        info!(
            reference = %metadata.reference,
            phone = %mask_phone(submission.phone_number.as_deref().unwrap_or_default()),
            amount = %metadata.amount,
            "Fulfilling verified payment"
        );

        match self.recharge.submit_recharge(&submission).await {
            Ok(transaction) => Ok(transaction),
            Err(RechargeError::Validation(e)) => Ok(self
                .record_undeliverable(&metadata, RechargeDetails::from(&submission), e.to_string())
                .await),
            Err(RechargeError::Store(e)) => Err(BridgeError::Store(e)),
        }
    }

    async fn record_undeliverable(
        &self,
        metadata: &PaymentMetadata,
        details: RechargeDetails,
        reason: String,
    ) -> Transaction {
        let transaction =
            self.recharge
                .recorder()
                .record_failure(details, &metadata.reference, reason);
        self.recharge.persist(transaction).await
    }
}
