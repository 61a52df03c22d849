use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use super::{env_or, env_secret, kobo_amount, opaque_id};
use crate::logging::mask_phone;
use crate::payments::utils::PaymentHttpClient;
use crate::recharge::provider::{into_outcome, Delivery, ProviderName, RechargeProvider};
use crate::recharge::types::{FailureReason, Network, ProviderOutcome, RechargeRequest, ServiceType};

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

/// Test keys can collect payments but cannot vend bills.
const TEST_KEY_PREFIX: &str = "sk_test_";

const DATA_PLANS: &[&str] = &["1GB", "2GB", "5GB", "10GB"];

#[derive(Debug, Clone)]
pub struct PaystackBillsConfig {
    pub secret_key: Option<String>,
    pub base_url: String,
}

impl Default for PaystackBillsConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl PaystackBillsConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: env_secret("PAYSTACK_SECRET_KEY"),
            base_url: env_or("PAYSTACK_BASE_URL", DEFAULT_BASE_URL),
        }
    }

    fn live_key(&self) -> Option<&str> {
        self.secret_key
            .as_deref()
            .filter(|key| !key.starts_with(TEST_KEY_PREFIX))
    }
}

/// Paystack bill payments, last in the default order.
pub struct PaystackBillsRecharge {
    config: PaystackBillsConfig,
    http: PaymentHttpClient,
}

impl PaystackBillsRecharge {
    pub fn new(config: PaystackBillsConfig, http: PaymentHttpClient) -> Self {
        Self { config, http }
    }

    fn biller(network: Network) -> &'static str {
        match network {
            Network::Mtn => "mtn",
            Network::Airtel => "airtel",
            Network::Glo => "glo",
            Network::NineMobile => "9mobile",
        }
    }

    fn build_payload(request: &RechargeRequest, reference: &str) -> Result<JsonValue, FailureReason> {
        let biller = Self::biller(request.network);
        let mut payload = json!({
            "amount": kobo_amount(request.amount)?,
            "phone": request.phone_number,
            "reference": reference,
        });

        match request.service_type {
            ServiceType::Airtime => {
                payload["type"] = json!(format!("{}-airtime", biller));
            }
            ServiceType::Data => {
                let plan = request.data_plan_code.as_deref().unwrap_or_default();
                if !DATA_PLANS.contains(&plan) {
                    return Err(FailureReason::NetworkUnsupported(format!(
                        "paystack has no {} bundle",
                        plan
                    )));
                }
                payload["type"] = json!(format!("{}-data", biller));
                payload["plan_code"] = json!(format!("{}-{}", biller, plan.to_lowercase()));
            }
        }

        Ok(payload)
    }

    async fn purchase(
        &self,
        secret_key: &str,
        request: &RechargeRequest,
        reference: &str,
    ) -> Result<Delivery, FailureReason> {
        let payload = Self::build_payload(request, reference)?;
        let url = format!("{}/bill", self.config.base_url);

        debug!(
            provider = "paystack",
            reference = reference,
            network = %request.network,
            phone = %mask_phone(&request.phone_number),
            "Submitting bill payment"
        );

        let response: PaystackBillEnvelope = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                Some(secret_key),
                Some(&payload),
                &[],
            )
            .await?;

        if !response.is_success() {
            return Err(FailureReason::UpstreamError(
                response
                    .message
                    .unwrap_or_else(|| "paystack bill payment failed".to_string()),
            ));
        }

        let data = response.data.unwrap_or_default();
        let external_id = opaque_id(data.reference.as_ref())
            .or_else(|| opaque_id(data.id.as_ref()))
            .unwrap_or_else(|| reference.to_string());

        Ok(Delivery::new(
            external_id,
            data.verification_reference.unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl RechargeProvider for PaystackBillsRecharge {
    fn name(&self) -> &str {
        ProviderName::Paystack.as_str()
    }

    fn is_configured(&self) -> bool {
        self.config.live_key().is_some()
    }

    async fn deliver(&self, request: &RechargeRequest, reference: &str) -> ProviderOutcome {
        let Some(secret_key) = self.config.live_key() else {
            return ProviderOutcome::failure(self.name(), FailureReason::Unconfigured);
        };
        into_outcome(self.name(), self.purchase(secret_key, request, reference).await)
    }
}

#[derive(Debug, Deserialize)]
struct PaystackBillEnvelope {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<PaystackBillData>,
}

#[derive(Debug, Default, Deserialize)]
struct PaystackBillData {
    #[serde(default)]
    id: Option<JsonValue>,
    #[serde(default)]
    reference: Option<JsonValue>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    verification_reference: Option<String>,
}

impl PaystackBillEnvelope {
    fn is_success(&self) -> bool {
        self.status
            || self
                .data
                .as_ref()
                .and_then(|d| d.status.as_deref())
                .is_some_and(|s| s.eq_ignore_ascii_case("success"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn adapter(key: Option<&str>) -> PaystackBillsRecharge {
        let http = PaymentHttpClient::new(std::time::Duration::from_secs(1), 0).unwrap();
        PaystackBillsRecharge::new(
            PaystackBillsConfig {
                secret_key: key.map(str::to_string),
                ..PaystackBillsConfig::default()
            },
            http,
        )
    }

    #[test]
    fn test_keys_do_not_count_as_configured() {
        assert!(!adapter(Some("sk_test_abc")).is_configured());
        assert!(adapter(Some("sk_live_abc")).is_configured());
        assert!(!adapter(None).is_configured());
    }

    #[test]
    fn airtime_amount_is_in_kobo() {
        let request = RechargeRequest::airtime(Network::Mtn, "08031234567", Decimal::from(200));
        let payload = PaystackBillsRecharge::build_payload(&request, "REF4").unwrap();
        assert_eq!(payload["type"], "mtn-airtime");
        assert_eq!(payload["amount"], 20_000);
    }

    #[test]
    fn data_plan_code() {
        let request = RechargeRequest::data(Network::Glo, "08051234567", Decimal::from(3000), "10GB");
        let payload = PaystackBillsRecharge::build_payload(&request, "REF4").unwrap();
        assert_eq!(payload["type"], "glo-data");
        assert_eq!(payload["plan_code"], "glo-10gb");

        let request = RechargeRequest::data(Network::Glo, "08051234567", Decimal::from(150), "500MB");
        assert!(PaystackBillsRecharge::build_payload(&request, "REF4").is_err());
    }

    #[test]
    fn success_predicate() {
        let top_level: PaystackBillEnvelope =
            serde_json::from_value(json!({"status": true, "message": "ok"})).unwrap();
        assert!(top_level.is_success());

        let nested: PaystackBillEnvelope = serde_json::from_value(json!({
            "status": false,
            "data": {"status": "success", "verification_reference": "VR-1"}
        }))
        .unwrap();
        assert!(nested.is_success());

        let failed: PaystackBillEnvelope =
            serde_json::from_value(json!({"status": false, "message": "Insufficient balance"}))
                .unwrap();
        assert!(!failed.is_success());
    }
}
