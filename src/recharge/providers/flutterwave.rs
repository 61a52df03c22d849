use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use super::{env_or, env_secret, naira_amount, opaque_id};
use crate::logging::mask_phone;
use crate::payments::utils::PaymentHttpClient;
use crate::recharge::provider::{into_outcome, Delivery, ProviderName, RechargeProvider};
use crate::recharge::types::{FailureReason, ProviderOutcome, RechargeRequest, ServiceType};

pub const DEFAULT_BASE_URL: &str = "https://api.flutterwave.com";

#[derive(Debug, Clone)]
pub struct FlutterwaveConfig {
    pub secret_key: Option<String>,
    pub base_url: String,
}

impl Default for FlutterwaveConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl FlutterwaveConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env_secret("FLUTTERWAVE_SECRET_KEY"),
            base_url: env_or("FLUTTERWAVE_BASE_URL", DEFAULT_BASE_URL),
        }
    }
}

/// Flutterwave bills API, airtime biller only.
pub struct FlutterwaveRecharge {
    config: FlutterwaveConfig,
    http: PaymentHttpClient,
}

impl FlutterwaveRecharge {
    pub fn new(config: FlutterwaveConfig, http: PaymentHttpClient) -> Self {
        Self { config, http }
    }

    fn build_payload(request: &RechargeRequest, reference: &str) -> Result<JsonValue, FailureReason> {
        if request.service_type != ServiceType::Airtime {
            return Err(FailureReason::NetworkUnsupported(
                "flutterwave bills are only used for airtime".to_string(),
            ));
        }

        // Flutterwave resolves the operator from the number itself
        Ok(json!({
            "country": "NG",
            "customer": request.phone_number,
            "amount": naira_amount(request.amount)?,
            "recurrence": "ONCE",
            "type": "AIRTIME",
            "reference": reference,
        }))
    }

    async fn purchase(
        &self,
        secret_key: &str,
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<Delivery, FailureReason> {
        let payload = Self::build_payload(request, reference)?;
        let url = format!("{}/v3/bills", self.config.base_url);

        debug!(
            provider = "flutterwave",
            reference = reference,
            phone = %mask_phone(&request.phone_number),
            "Processing bill payment"
        );

        let response: FlutterwaveEnvelope = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                Some(secret_key),
                Some(&payload),
                &[],
            )
            .await?;

        if response.status != "success" {
            return Err(FailureReason::UpstreamError(
                response
                    .message
                    .unwrap_or_else(|| format!("flutterwave status {}", response.status)),
            ));
        }

        let data = response.data.unwrap_or_default();
        let external_id = opaque_id(data.flw_ref.as_ref())
            .or_else(|| opaque_id(data.reference.as_ref()))
            .unwrap_or_else(|| reference.to_string());

        Ok(Delivery::new(external_id, String::new()))
    }
}

#[async_trait]
impl RechargeProvider for FlutterwaveRecharge {
    fn name(&self) -> &str {
        ProviderName::Flutterwave.as_str()
    }

    fn is_configured(&self) -> bool {
        self.config.secret_key.is_some()
    }

    async fn deliver(&self, request: &RechargeRequest, reference: &str) -> ProviderOutcome {
        let Some(secret_key) = self.config.secret_key.as_deref() else {
            return ProviderOutcome::failure(self.name(), FailureReason::Unconfigured);
        };
        into_outcome(self.name(), self.purchase(secret_key, request, reference).await)
    }
}

#[derive(Debug, Deserialize)]
struct FlutterwaveEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<FlutterwaveBillData>,
}

#[derive(Debug, Default, Deserialize)]
struct FlutterwaveBillData {
    #[serde(default)]
    flw_ref: Option<JsonValue>,
    #[serde(default)]
    reference: Option<JsonValue>,
}
