use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use super::{env_or, env_secret, naira_amount, opaque_id};
use crate::logging::mask_phone;
use crate::payments::utils::PaymentHttpClient;
use crate::recharge::provider::{into_outcome, Delivery, ProviderName, RechargeProvider};
use crate::recharge::types::{FailureReason, Network, ProviderOutcome, RechargeRequest, ServiceType};

pub const DEFAULT_BASE_URL: &str = "https://api.hustlesim.com";

/// Canonical plan code -> HustleSim bundle size in MB.
const DATA_PLANS: &[(&str, &str)] = &[
    ("500MB", "500"),
    ("1GB", "1000"),
    ("2GB", "2000"),
    ("3GB", "3000"),
    ("5GB", "5000"),
    ("10GB", "10000"),
];

#[derive(Debug, Clone)]
pub struct HustleSimConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for HustleSimConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl HustleSimConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_secret("HUSTLESIM_API_KEY"),
            base_url: env_or("HUSTLESIM_BASE_URL", DEFAULT_BASE_URL),
        }
    }
}

/// HustleSIM airtime and data vending API.
pub struct HustleSimRecharge {
    config: HustleSimConfig,
    http: PaymentHttpClient,
}

impl HustleSimRecharge {
    pub fn new(config: HustleSimConfig, http: PaymentHttpClient) -> Self {
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

    fn data_plan(network: Network, plan: &str) -> Option<&'static str> {
        // no 9mobile bundles on this provider
        if network == Network::NineMobile {
            return None;
        }
        DATA_PLANS
            .iter()
            .find(|(code, _)| *code == plan)
            .map(|(_, size)| *size)
    }

    fn build_payload(
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<(&'static str, JsonValue), FailureReason> {
        let network = Self::network_code(request.network);
        match request.service_type {
            ServiceType::Airtime => Ok((
                "/airtime",
                json!({
                    "network": network,
                    "phone": request.phone_number,
                    "amount": naira_amount(request.amount)?,
                    "bypass": false,
                    "request_id": reference,
                }),
            )),
            ServiceType::Data => {
                let plan = request.data_plan_code.as_deref().unwrap_or_default();
                let data_plan = Self::data_plan(request.network, plan).ok_or_else(|| {
                    FailureReason::NetworkUnsupported(format!(
                        "{} data plan {} is not offered by hustlesim",
                        request.network, plan
                    ))
                })?;
                Ok((
                    "/data",
                    json!({
                        "network": network,
                        "phone": request.phone_number,
                        "data_plan": data_plan,
                        "bypass": false,
                        "request_id": reference,
                    }),
                ))
            }
        }
    }

    async fn purchase(
        &self,
        api_key: &str,
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<Delivery, FailureReason> {
        let (path, payload) = Self::build_payload(request, reference)?;
        let url = format!("{}{}", self.config.base_url, path);
        let authorization = format!("Token {}", api_key);

        debug!(
            provider = "hustlesim",
            reference = reference,
            network = %request.network,
            phone = %mask_phone(&request.phone_number),
            "Sending recharge request"
        );

        let response: HustleSimResponse = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                None,
                Some(&payload),
                &[("Authorization", authorization.as_str())],
            )
            .await?;

        if !response.is_success() {
            return Err(FailureReason::UpstreamError(
                response
                    .message
                    .unwrap_or_else(|| "hustlesim rejected the recharge".to_string()),
            ));
        }

        let external_id = opaque_id(response.ident.as_ref())
            .or_else(|| opaque_id(response.transaction_id.as_ref()))
            .unwrap_or_else(|| reference.to_string());

        Ok(Delivery::new(external_id, String::new()))
    }
}

#[async_trait]
impl RechargeProvider for HustleSimRecharge {
    fn name(&self) -> &str {
        ProviderName::HustleSim.as_str()
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

/// Older accounts answer with `Status: successful`, newer ones with
/// `status: success`. Either counts.
#[derive(Debug, Deserialize)]
struct HustleSimResponse {
    #[serde(rename = "Status", default)]
    legacy_status: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    ident: Option<JsonValue>,
    #[serde(default)]
    transaction_id: Option<JsonValue>,
    #[serde(default)]
    message: Option<String>,
}

impl HustleSimResponse {
    fn is_success(&self) -> bool {
        self.legacy_status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("successful"))
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("success"))
    }
}
