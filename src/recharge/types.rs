use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validator::ValidationError;

/// Provider name recorded when every adapter was skipped or failed and the
/// recharge is handed over to operations staff.
pub const MANUAL_PROVIDER: &str = "manual";

/// Provider name recorded on transactions that never reached the orchestrator.
pub const NO_PROVIDER: &str = "none";

// ---------------------------------------------------------------------------
// Service Type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Airtime,
    Data,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Airtime => "airtime",
            ServiceType::Data => "data",
        }
    }

    /// Upper-case form used inside minted references.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceType::Airtime => "AIRTIME",
            ServiceType::Data => "DATA",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "airtime" => Ok(ServiceType::Airtime),
            "data" => Ok(ServiceType::Data),
            _ => Err(ValidationError::InvalidServiceType(value.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    #[serde(rename = "mtn")]
    Mtn,
    #[serde(rename = "airtel")]
    Airtel,
    #[serde(rename = "glo")]
    Glo,
    #[serde(rename = "9mobile")]
    NineMobile,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Mtn,
        Network::Airtel,
        Network::Glo,
        Network::NineMobile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mtn => "mtn",
            Network::Airtel => "airtel",
            Network::Glo => "glo",
            Network::NineMobile => "9mobile",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Network::Mtn => "MTN",
            Network::Airtel => "AIRTEL",
            Network::Glo => "GLO",
            Network::NineMobile => "9MOBILE",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Network {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "mtn" => Ok(Network::Mtn),
            "airtel" => Ok(Network::Airtel),
            "glo" => Ok(Network::Glo),
            // 9mobile still answers to its former brand on several provider APIs
            "9mobile" | "etisalat" => Ok(Network::NineMobile),
            _ => Err(ValidationError::UnsupportedNetwork(value.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Untrusted recharge input as it arrives from a caller or from payment
/// metadata. Turned into a [`RechargeRequest`] by the validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeSubmission {
    #[serde(rename = "type", alias = "serviceType")]
    pub service_type: Option<String>,
    pub network: Option<String>,
    #[serde(alias = "phone_number")]
    pub phone_number: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(alias = "dataSize", alias = "data_size", alias = "planId")]
    pub data_plan_code: Option<String>,
    pub reference: Option<String>,
}

/// A validated recharge ask. Only the validator builds these from untrusted
/// input; once built it is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeRequest {
    pub service_type: ServiceType,
    pub network: Network,
    pub phone_number: String,
    pub amount: Decimal,
    /// Canonical upper-case plan code such as `2GB`. Always `Some` for data.
    pub data_plan_code: Option<String>,
    pub reference: Option<String>,
}

impl RechargeRequest {
    pub fn airtime(network: Network, phone_number: impl Into<String>, amount: Decimal) -> Self {
        Self {
            service_type: ServiceType::Airtime,
            network,
            phone_number: phone_number.into(),
            amount,
            data_plan_code: None,
            reference: None,
        }
    }

    pub fn data(
        network: Network,
        phone_number: impl Into<String>,
        amount: Decimal,
        data_plan_code: impl Into<String>,
    ) -> Self {
        Self {
            service_type: ServiceType::Data,
            network,
            phone_number: phone_number.into(),
            amount,
            data_plan_code: Some(data_plan_code.into()),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Caller-supplied reference, ignoring blank values.
    pub fn supplied_reference(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Provider Outcome
// ---------------------------------------------------------------------------

/// Why a single adapter attempt did not deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "category", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("provider credentials are not configured")]
    Unconfigured,
    #[error("not supported by provider: {0}")]
    NetworkUnsupported(String),
    #[error("upstream error: {0}")]
    UpstreamError(String),
    #[error("request timed out: {0}")]
    Timeout(String),
}

impl FailureReason {
    pub fn category(&self) -> &'static str {
        match self {
            FailureReason::Unconfigured => "unconfigured",
            FailureReason::NetworkUnsupported(_) => "network_unsupported",
            FailureReason::UpstreamError(_) => "upstream_error",
            FailureReason::Timeout(_) => "timeout",
        }
    }
}

/// Result of one adapter attempt. Built per attempt and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutcome {
    pub provider_name: String,
    pub succeeded: bool,
    pub external_transaction_id: String,
    pub confirmation_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

impl ProviderOutcome {
    pub fn success(
        provider_name: impl Into<String>,
        external_transaction_id: impl Into<String>,
        confirmation_code: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            succeeded: true,
            external_transaction_id: external_transaction_id.into(),
            confirmation_code: confirmation_code.into(),
            failure_reason: None,
        }
    }

    pub fn failure(provider_name: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            provider_name: provider_name.into(),
            succeeded: false,
            external_transaction_id: String::new(),
            confirmation_code: String::new(),
            failure_reason: Some(reason),
        }
    }

    pub fn is_manual(&self) -> bool {
        self.provider_name == MANUAL_PROVIDER
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    ManualPending,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::ManualPending => "manual_pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the recharge fields a transaction was created for. Kept as
/// plain strings so that paid-but-malformed requests can still be recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeDetails {
    pub service_type: String,
    pub network: String,
    pub phone_number: String,
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_plan_code: Option<String>,
}

impl From<&RechargeRequest> for RechargeDetails {
    fn from(request: &RechargeRequest) -> Self {
        Self {
            service_type: request.service_type.as_str().to_string(),
            network: request.network.as_str().to_string(),
            phone_number: request.phone_number.clone(),
            amount: Some(request.amount),
            data_plan_code: request.data_plan_code.clone(),
        }
    }
}

impl From<&RechargeSubmission> for RechargeDetails {
    fn from(submission: &RechargeSubmission) -> Self {
        Self {
            service_type: submission.service_type.clone().unwrap_or_default(),
            network: submission.network.clone().unwrap_or_default(),
            phone_number: submission.phone_number.clone().unwrap_or_default(),
            amount: submission.amount,
            data_plan_code: submission.data_plan_code.clone(),
        }
    }
}

/// The durable record of one recharge. Created exactly once per reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub reference: String,
    pub request: RechargeDetails,
    pub status: TransactionStatus,
    pub provider: String,
    pub confirmation_code: String,
    pub external_transaction_id: String,
    pub processed_at: DateTime<Utc>,
    pub manual_processing_required: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Transaction {
    /// Whether operations staff need to look at this transaction.
    pub fn needs_attention(&self) -> bool {
        self.manual_processing_required || self.status == TransactionStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_parsing_is_case_insensitive() {
        assert_eq!("MTN".parse::<Network>().unwrap(), Network::Mtn);
        assert_eq!(" Airtel ".parse::<Network>().unwrap(), Network::Airtel);
        assert_eq!("9Mobile".parse::<Network>().unwrap(), Network::NineMobile);
        assert_eq!("etisalat".parse::<Network>().unwrap(), Network::NineMobile);
        assert!(matches!(
            "unknownnet".parse::<Network>(),
            Err(ValidationError::UnsupportedNetwork(_))
        ));
    }

    #[test]
    fn service_type_parsing() {
        assert_eq!("Data".parse::<ServiceType>().unwrap(), ServiceType::Data);
        assert!("electricity".parse::<ServiceType>().is_err());
    }

    #[test]
    fn failure_reason_categories() {
        assert_eq!(FailureReason::Unconfigured.category(), "unconfigured");
        assert_eq!(
            FailureReason::Timeout("10s".to_string()).category(),
            "timeout"
        );
    }

    #[test]
    fn failure_outcome_carries_reason() {
        let outcome = ProviderOutcome::failure("vtpass", FailureReason::Unconfigured);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.failure_reason, Some(FailureReason::Unconfigured));

        let outcome = ProviderOutcome::success("vtpass", "123", "ABC");
        assert!(outcome.succeeded);
        assert!(outcome.failure_reason.is_none());
    }

    #[test]
    fn submission_accepts_legacy_field_names() {
        let submission: RechargeSubmission = serde_json::from_value(serde_json::json!({
            "type": "data",
            "network": "glo",
            "phoneNumber": "08051234567",
            "amount": 1500,
            "dataSize": "2GB"
        }))
        .unwrap();

        assert_eq!(submission.service_type.as_deref(), Some("data"));
        assert_eq!(submission.data_plan_code.as_deref(), Some("2GB"));
        assert_eq!(submission.amount, Some(Decimal::from(1500)));
    }

    #[test]
    fn transaction_status_serializes_snake_case() {
        let json = serde_json::to_value(TransactionStatus::ManualPending).unwrap();
        assert_eq!(json, "manual_pending");
    }
}
