use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use super::{env_or, env_secret, naira_amount, opaque_id};
use crate::logging::mask_phone;
use crate::payments::utils::PaymentHttpClient;
use crate::recharge::provider::{into_outcome, Delivery, ProviderName, RechargeProvider};
use crate::recharge::types::{FailureReason, Network, ProviderOutcome, RechargeRequest, ServiceType};

pub const DEFAULT_BASE_URL: &str = "https://api.topupmama.com";

#[derive(Debug, Clone)]
pub struct TopupMamaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for TopupMamaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl TopupMamaConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_secret("TOPUPMAMA_API_KEY"),
            base_url: env_or("TOPUPMAMA_BASE_URL", DEFAULT_BASE_URL),
        }
    }
}

/// TopupMama airtime top-ups. Data bundles are not sold through this API.
pub struct TopupMamaRecharge {
    config: TopupMamaConfig,
    http: PaymentHttpClient,
}

impl TopupMamaRecharge {
    pub fn new(config: TopupMamaConfig, http: PaymentHttpClient) -> Self {
        Self { config, http }
    }

    fn network_code(network: Network) -> &'static str {
        match network {
            Network::Mtn => "mtn",
            Network::Airtel => "airtel",
            Network::Glo => "glo",
            Network::NineMobile => "9mobile",
        }
    }

    fn build_payload(request: &RechargeRequest) -> Result<JsonValue, FailureReason> {
        if request.service_type == ServiceType::Data {
            return Err(FailureReason::NetworkUnsupported(
                "topupmama sells airtime only".to_string(),
            ));
        }
        Ok(json!({
            "network": Self::network_code(request.network),
            "phone": request.phone_number,
            "amount": naira_amount(request.amount)?,
        }))
    }

    async fn purchase(
        &self,
        api_key: &str,
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<Delivery, FailureReason> {
        let payload = Self::build_payload(request)?;
        let url = format!("{}/api/topup", self.config.base_url);
        let authorization = format!("Bearer {}", api_key);

        debug!(
            provider = "topupmama",
            reference = reference,
            network = %request.network,
            phone = %mask_phone(&request.phone_number),
            "Sending recharge request"
        );

        let response: TopupMamaResponse = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                None,
                Some(&payload),
                &[("Authorization", authorization.as_str())],
            )
            .await?;

        if !response.success {
            return Err(FailureReason::UpstreamError(
                response
                    .message
                    .unwrap_or_else(|| "topupmama rejected the recharge".to_string()),
            ));
        }

        let external_id =
            opaque_id(response.reference.as_ref()).unwrap_or_else(|| reference.to_string());
        Ok(Delivery::new(external_id, String::new()))
    }
}

#[async_trait]
impl RechargeProvider for TopupMamaRecharge {
    fn name(&self) -> &str {
        ProviderName::TopupMama.as_str()
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn deliver(&self, request: &RechargeRequest, reference: &str) -> ProviderOutcome {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return ProviderOutcome::failure(self.name(), FailureReason::Unconfigured);
        };
        into_outcome(self.name(), self.purchase(api_key, request, reference).await)
    }
}

#[derive(Debug, Deserialize)]
struct TopupMamaResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    reference: Option<JsonValue>,
    #[serde(default)]
    message: Option<String>,
}
