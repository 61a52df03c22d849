use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use super::{env_or, env_secret, international_msisdn, naira_amount, opaque_id};
use crate::logging::mask_phone;
use crate::payments::utils::PaymentHttpClient;
use crate::recharge::provider::{into_outcome, Delivery, ProviderName, RechargeProvider};
use crate::recharge::types::{FailureReason, Network, ProviderOutcome, RechargeRequest, ServiceType};

pub const DEFAULT_BASE_URL: &str = "https://topups.reloadly.com";

const TOPUPS_ACCEPT: &str = "application/com.reloadly.topups-v1+json";

#[derive(Debug, Clone)]
pub struct ReloadlyConfig {
    pub access_token: Option<String>,
    pub base_url: String,
}

impl Default for ReloadlyConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ReloadlyConfig {
    pub fn from_env() -> Self {
        Self {
            access_token: env_secret("RELOADLY_ACCESS_TOKEN"),
            base_url: env_or("RELOADLY_BASE_URL", DEFAULT_BASE_URL),
        }
    }
}

/// Reloadly international top-ups. Airtime only.
pub struct ReloadlyRecharge {
    config: ReloadlyConfig,
    http: PaymentHttpClient,
}

impl ReloadlyRecharge {
    pub fn new(config: ReloadlyConfig, http: PaymentHttpClient) -> Self {
        Self { config, http }
    }

    /// Reloadly operator ids for Nigerian networks.
    fn operator_id(network: Network) -> u32 {
        match network {
            Network::Mtn => 341,
            Network::Airtel => 342,
            Network::NineMobile => 343,
            Network::Glo => 344,
        }
    }

    fn build_payload(request: &RechargeRequest, reference: &str) -> Result<JsonValue, FailureReason> {
        if request.service_type == ServiceType::Data {
            return Err(FailureReason::NetworkUnsupported(
                "reloadly does not sell data bundles".to_string(),
            ));
        }

        Ok(json!({
            "operatorId": Self::operator_id(request.network),
            "amount": naira_amount(request.amount)?,
            "useLocalAmount": true,
            "customIdentifier": reference,
            "recipientPhone": {
                "countryCode": "NG",
                "number": international_msisdn(&request.phone_number),
            },
        }))
    }

    async fn purchase(
        &self,
        token: &str,
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<Delivery, FailureReason> {
        let payload = Self::build_payload(request, reference)?;
        let url = format!("{}/topups", self.config.base_url);

        debug!(
            provider = "reloadly",
            reference = reference,
            network = %request.network,
            phone = %mask_phone(&request.phone_number),
            "Sending top-up request"
        );

        let response: ReloadlyTopupResponse = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                Some(token),
                Some(&payload),
                &[("Accept", TOPUPS_ACCEPT)],
            )
            .await?;

        let transaction_id = opaque_id(response.transaction_id.as_ref())
            .filter(|id| id != "0")
            .ok_or_else(|| {
                FailureReason::UpstreamError(
                    response
                        .message
                        .clone()
                        .unwrap_or_else(|| "reloadly returned no transactionId".to_string()),
                )
            })?;

        let confirmation = response.operator_transaction_id.unwrap_or_default();
        Ok(Delivery::new(transaction_id, confirmation))
    }
}

#[async_trait]
impl RechargeProvider for ReloadlyRecharge {
    fn name(&self) -> &str {
        ProviderName::Reloadly.as_str()
    }

    fn is_configured(&self) -> bool {
        self.config.access_token.is_some()
    }

    async fn deliver(&self, request: &RechargeRequest, reference: &str) -> ProviderOutcome {
        let Some(token) = self.config.access_token.as_deref() else {
            return ProviderOutcome::failure(self.name(), FailureReason::Unconfigured);
        };
        into_outcome(self.name(), self.purchase(token, request, reference).await)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReloadlyTopupResponse {
    #[serde(default)]
    transaction_id: Option<JsonValue>,
    #[serde(default)]
    operator_transaction_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
