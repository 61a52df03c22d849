use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use super::{env_or, env_secret, naira_amount, opaque_id};
use crate::logging::mask_phone;
use crate::payments::utils::PaymentHttpClient;
use crate::recharge::provider::{into_outcome, Delivery, ProviderName, RechargeProvider};
use crate::recharge::types::{FailureReason, Network, ProviderOutcome, RechargeRequest, ServiceType};

pub const DEFAULT_BASE_URL: &str = "https://vtpass.com";

const SUCCESS_CODE: &str = "000";

/// (network, canonical plan) -> VTpass variation code.
const VARIATIONS: &[(Network, &str, &str)] = &[
    (Network::Mtn, "500MB", "mtn-500mb-150"),
    (Network::Mtn, "1GB", "mtn-1gb-300"),
    (Network::Mtn, "2GB", "mtn-2gb-600"),
    (Network::Mtn, "5GB", "mtn-5gb-1500"),
    (Network::Mtn, "10GB", "mtn-10gb-3000"),
    (Network::Airtel, "1GB", "airt-1gb-300"),
    (Network::Airtel, "2GB", "airt-2gb-600"),
    (Network::Airtel, "5GB", "airt-5gb-1500"),
    (Network::Glo, "1GB", "glo-1gb-300"),
    (Network::Glo, "2GB", "glo-2gb-600"),
    (Network::Glo, "5GB", "glo-5gb-1500"),
    (Network::NineMobile, "1GB", "eti-1gb-300"),
    (Network::NineMobile, "2GB", "eti-2gb-600"),
];

#[derive(Debug, Clone)]
pub struct VtPassConfig {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: String,
}

impl Default for VtPassConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            secret_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl VtPassConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_secret("VTPASS_API_KEY"),
            secret_key: env_secret("VTPASS_SECRET_KEY"),
            base_url: env_or("VTPASS_BASE_URL", DEFAULT_BASE_URL),
        }
    }
}

pub struct VtPassRecharge {
    config: VtPassConfig,
    http: PaymentHttpClient,
}

impl VtPassRecharge {
    pub fn new(config: VtPassConfig, http: PaymentHttpClient) -> Self {
        Self { config, http }
    }

    fn service_id(network: Network, service_type: ServiceType) -> String {
        let base = match network {
            Network::Mtn => "mtn",
            Network::Airtel => "airtel",
            Network::Glo => "glo",
            Network::NineMobile => "etisalat",
        };
        match service_type {
            ServiceType::Airtime => base.to_string(),
            ServiceType::Data => format!("{}-data", base),
        }
    }

    fn variation_code(network: Network, plan: &str) -> Option<&'static str> {
        VARIATIONS
            .iter()
            .find(|(n, p, _)| *n == network && *p == plan)
            .map(|(_, _, code)| *code)
    }

    fn build_payload(request: &RechargeRequest, reference: &str) -> Result<JsonValue, FailureReason> {
        let service_id = Self::service_id(request.network, request.service_type);
        let mut payload = json!({
            "request_id": reference,
            "serviceID": service_id,
            "amount": naira_amount(request.amount)?,
            "phone": request.phone_number,
        });

        if request.service_type == ServiceType::Data {
            let plan = request.data_plan_code.as_deref().unwrap_or_default();
            let variation = Self::variation_code(request.network, plan).ok_or_else(|| {
                FailureReason::NetworkUnsupported(format!(
                    "vtpass has no {} variation for {}",
                    request.network, plan
                ))
            })?;
            payload["billersCode"] = json!(request.phone_number);
            payload["variation_code"] = json!(variation);
        }

        Ok(payload)
    }

    async fn purchase(
        &self,
        api_key: &str,
        secret_key: &str,
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<Delivery, FailureReason> {
        let payload = Self::build_payload(request, reference)?;
        let url = format!("{}/api/pay", self.config.base_url);

        debug!(
            provider = "vtpass",
            reference = reference,
            service_type = %request.service_type,
            phone = %mask_phone(&request.phone_number),
            "Processing recharge"
        );

        let response: VtPassPayResponse = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                None,
                Some(&payload),
                &[("api-key", api_key), ("secret-key", secret_key)],
            )
            .await?;

        if !response.is_success() {
            return Err(FailureReason::UpstreamError(format!(
                "vtpass code {}: {}",
                response.code,
                response
                    .response_description
                    .unwrap_or_else(|| "transaction failed".to_string())
            )));
        }

        let external_id = response
            .transaction()
            .and_then(|t| opaque_id(t.transaction_id.as_ref()))
            .or_else(|| response.request_id.clone())
            .unwrap_or_else(|| reference.to_string());

        Ok(Delivery::new(
            external_id,
            response.purchased_code.unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl RechargeProvider for VtPassRecharge {
    fn name(&self) -> &str {
        ProviderName::VtPass.as_str()
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some() && self.config.secret_key.is_some()
    }

    async fn deliver(&self, request: &RechargeRequest, reference: &str) -> ProviderOutcome {
        let (Some(api_key), Some(secret_key)) = (
            self.config.api_key.as_deref(),
            self.config.secret_key.as_deref(),
        ) else {
            return ProviderOutcome::failure(self.name(), FailureReason::Unconfigured);
        };
        into_outcome(
            self.name(),
            self.purchase(api_key, secret_key, request, reference).await,
        )
    }
}

#[derive(Debug, Deserialize)]
struct VtPassPayResponse {
    code: String,
    #[serde(default)]
    response_description: Option<String>,
    #[serde(default, rename = "requestId")]
    request_id: Option<String>,
    #[serde(default)]
    content: Option<VtPassContent>,
    #[serde(default)]
    purchased_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VtPassContent {
    #[serde(default)]
    transactions: Option<VtPassTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VtPassTransaction {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transaction_id: Option<JsonValue>,
}

impl VtPassPayResponse {
    fn transaction(&self) -> Option<&VtPassTransaction> {
        self.content.as_ref()?.transactions.as_ref()
    }

    /// `000` means accepted; a transaction explicitly marked failed still is not.
    fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
            && !self
                .transaction()
                .and_then(|t| t.status.as_deref())
                .is_some_and(|s| s.eq_ignore_ascii_case("failed"))
    }
}
