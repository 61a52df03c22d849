use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::types::{FailureReason, ProviderOutcome, RechargeRequest};
use crate::payments::error::PaymentError;

// ---------------------------------------------------------------------------
// Provider Trait
// ---------------------------------------------------------------------------

/// One external recharge API.
///
/// Implementations own their network and plan mappings and their own success
/// predicate. `deliver` never returns an error: every failure is folded into a
/// [`ProviderOutcome`] with `succeeded == false`.
#[async_trait]
pub trait RechargeProvider: Send + Sync {
    /// Stable identifier recorded on transactions.
    fn name(&self) -> &str;

    /// True iff the credentials this provider needs are present.
    fn is_configured(&self) -> bool;

    /// Attempt delivery. At most one outbound HTTP call per invocation.
    async fn deliver(&self, request: &RechargeRequest, reference: &str) -> ProviderOutcome;
}

/// What a provider hands back on a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub external_transaction_id: String,
    pub confirmation_code: String,
}

impl Delivery {
    pub fn new(external_transaction_id: impl Into<String>, confirmation_code: impl Into<String>) -> Self {
        Self {
            external_transaction_id: external_transaction_id.into(),
            confirmation_code: confirmation_code.into(),
        }
    }
}

/// Fold an adapter's purchase result into the canonical outcome shape.
pub fn into_outcome(provider: &str, result: Result<Delivery, FailureReason>) -> ProviderOutcome {
    match result {
        Ok(delivery) => ProviderOutcome::success(
            provider,
            delivery.external_transaction_id,
            delivery.confirmation_code,
        ),
        Err(reason) => ProviderOutcome::failure(provider, reason),
    }
}

impl From<PaymentError> for FailureReason {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::TimeoutError { timeout_secs } => {
                FailureReason::Timeout(format!("no response within {}s", timeout_secs))
            }
            other => FailureReason::UpstreamError(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider Names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    HustleSim,
    TopupMama,
    Reloadly,
    VtPass,
    Flutterwave,
    Paystack,
}

impl ProviderName {
    /// Default priority order: cheapest and most reliable first.
    pub const DEFAULT_ORDER: [ProviderName; 6] = [
        ProviderName::HustleSim,
        ProviderName::TopupMama,
        ProviderName::Reloadly,
        ProviderName::VtPass,
        ProviderName::Flutterwave,
        ProviderName::Paystack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::HustleSim => "hustlesim",
            ProviderName::TopupMama => "topupmama",
            ProviderName::Reloadly => "reloadly",
            ProviderName::VtPass => "vtpass",
            ProviderName::Flutterwave => "flutterwave",
            ProviderName::Paystack => "paystack",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recharge provider '{0}'")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderName {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "hustlesim" => Ok(ProviderName::HustleSim),
            "topupmama" => Ok(ProviderName::TopupMama),
            "reloadly" => Ok(ProviderName::Reloadly),
            "vtpass" => Ok(ProviderName::VtPass),
            "flutterwave" => Ok(ProviderName::Flutterwave),
            "paystack" | "paystack_bills" => Ok(ProviderName::Paystack),
            _ => Err(UnknownProvider(value.to_string())),
        }
    }
}

/// Parse a comma separated priority list such as `hustlesim,vtpass`.
pub fn parse_provider_order(raw: &str) -> Result<Vec<ProviderName>, UnknownProvider> {
    let mut order = Vec::new();
    for part in raw.split(',') {
        let value = part.trim();
        if value.is_empty() {
            continue;
        }
        let name = ProviderName::from_str(value)?;
        if !order.contains(&name) {
            order.push(name);
        }
    }
    Ok(order)
}
