use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentVerifier;
use crate::payments::types::{
    PaymentState, VerifiedPayment, WebhookEvent, WebhookVerificationResult,
};
use crate::payments::utils::{verify_hmac_sha512_hex, PaymentHttpClient};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: Option<String>,
    /// Paystack signs webhooks with the secret key unless a separate one is set.
    pub webhook_secret: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl PaystackConfig {
    pub fn from_env() -> Self {
        let non_blank = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            secret_key: non_blank("PAYSTACK_SECRET_KEY"),
            webhook_secret: non_blank("PAYSTACK_WEBHOOK_SECRET"),
            base_url: non_blank("PAYSTACK_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: non_blank("PAYSTACK_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            max_retries: non_blank("PAYSTACK_MAX_RETRIES")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(2),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    pub fn is_test_mode(&self) -> bool {
        self.secret_key
            .as_deref()
            .is_some_and(|key| key.starts_with("sk_test_"))
    }

    fn signing_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .or(self.secret_key.as_deref())
    }
}

pub struct PaystackVerifier {
    config: PaystackConfig,
    http: PaymentHttpClient,
}

impl PaystackVerifier {
    pub fn new(config: PaystackConfig) -> PaymentResult<Self> {
        let http =
            PaymentHttpClient::new(Duration::from_secs(config.timeout_secs), config.max_retries)?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> PaymentResult<Self> {
        Self::new(PaystackConfig::from_env())
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn secret_key(&self) -> PaymentResult<&str> {
        self.config
            .secret_key
            .as_deref()
            .ok_or_else(|| PaymentError::ValidationError {
                message: "PAYSTACK_SECRET_KEY is not configured".to_string(),
                field: Some("PAYSTACK_SECRET_KEY".to_string()),
            })
    }
}

/// Metadata sometimes arrives JSON-encoded inside a string.
fn normalize_metadata(metadata: JsonValue) -> JsonValue {
    match metadata {
        JsonValue::String(raw) => {
            serde_json::from_str::<JsonValue>(&raw).unwrap_or(JsonValue::Null)
        }
        other => other,
    }
}

/// References are interpolated into the verify URL path, so only plain
/// segment characters are accepted.
fn is_safe_reference(reference: &str) -> bool {
    reference
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && !reference.chars().all(|c| c == '.')
}

fn kobo_to_naira(kobo: u64) -> Decimal {
    Decimal::from(kobo) / Decimal::from(100)
}

#[async_trait]
impl PaymentVerifier for PaystackVerifier {
    async fn verify(&self, reference: &str) -> PaymentResult<VerifiedPayment> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(PaymentError::ValidationError {
                message: "Payment reference is required".to_string(),
                field: Some("reference".to_string()),
            });
        }
        if !is_safe_reference(reference) {
            return Err(PaymentError::ValidationError {
                message: format!("Payment reference '{}' contains invalid characters", reference),
                field: Some("reference".to_string()),
            });
        }

        let raw: PaystackEnvelope<Option<PaystackVerifyData>> = self
            .http
            .request_json(
                reqwest::Method::GET,
                &self.endpoint(&format!("/transaction/verify/{}", reference)),
                Some(self.secret_key()?),
                None,
                &[],
            )
            .await?;

        let Some(data) = raw.data.filter(|_| raw.status) else {
            return Err(PaymentError::ProviderError {
                provider: "paystack".to_string(),
                message: raw.message,
                provider_code: None,
                retryable: false,
            });
        };

        let status = PaymentState::from_provider_status(&data.status);
        let verified = status == PaymentState::Success;
        info!(
            reference = reference,
            status = %data.status,
            verified = verified,
            "paystack payment verified"
        );

        Ok(VerifiedPayment {
            verified,
            status,
            reference: data.reference.unwrap_or_else(|| reference.to_string()),
            amount: kobo_to_naira(data.amount),
            currency: data.currency,
            customer_email: data.customer.and_then(|c| c.email),
            paid_at: data.paid_at,
            gateway_response: data.gateway_response,
            metadata: normalize_metadata(data.metadata),
        })
    }

    fn name(&self) -> &'static str {
        "paystack"
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookVerificationResult> {
        let secret = self
            .config
            .signing_secret()
            .ok_or_else(|| PaymentError::WebhookVerificationError {
                message: "missing paystack webhook secret".to_string(),
            })?;

        let valid = verify_hmac_sha512_hex(payload, secret, signature);
        Ok(WebhookVerificationResult {
            valid,
            reason: if valid {
                None
            } else {
                Some("invalid paystack signature".to_string())
            },
        })
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let parsed: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookVerificationError {
                message: format!("invalid webhook JSON payload: {}", e),
            }
        })?;

        let event_type = parsed
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let reference = parsed
            .get("data")
            .and_then(|v| v.get("reference"))
            .and_then(|v| v.as_str())
            .map(|v| v.to_string());
        let status = parsed
            .get("data")
            .and_then(|v| v.get("status"))
            .and_then(|v| v.as_str())
            .map(PaymentState::from_provider_status);

        Ok(WebhookEvent {
            event_type,
            reference,
            status,
            payload: parsed,
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: T,
}

#[derive(Debug, Deserialize)]
struct PaystackVerifyData {
    amount: u64,
    #[serde(default = "default_currency")]
    currency: String,
    status: String,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    gateway_response: Option<String>,
    #[serde(default)]
    customer: Option<PaystackCustomer>,
    #[serde(default)]
    metadata: JsonValue,
}

#[derive(Debug, Deserialize)]
struct PaystackCustomer {
    #[serde(default)]
    email: Option<String>,
}

fn default_currency() -> String {
    "NGN".to_string()
}
