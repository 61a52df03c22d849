//! Concrete recharge provider adapters.

pub mod flutterwave;
pub mod hustlesim;
pub mod paystack;
pub mod reloadly;
pub mod topupmama;
pub mod vtpass;

pub use flutterwave::{FlutterwaveConfig, FlutterwaveRecharge};
pub use hustlesim::{HustleSimConfig, HustleSimRecharge};
pub use paystack::{PaystackBillsConfig, PaystackBillsRecharge};
pub use reloadly::{ReloadlyConfig, ReloadlyRecharge};
pub use topupmama::{TopupMamaConfig, TopupMamaRecharge};
pub use vtpass::{VtPassConfig, VtPassRecharge};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};

use super::types::FailureReason;

/// Read a credential from the environment, treating blank values as absent.
pub(crate) fn env_secret(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Provider ids arrive as strings on some APIs and numbers on others.
pub(crate) fn opaque_id(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Amount in naira as a JSON number: integral amounts stay integers.
pub(crate) fn naira_amount(amount: Decimal) -> Result<JsonValue, FailureReason> {
    let normalized = amount.normalize();
    let value = if normalized.scale() == 0 {
        normalized.to_i64().map(|v| json!(v))
    } else {
        normalized.to_f64().map(|v| json!(v))
    };
    value.ok_or_else(|| FailureReason::UpstreamError(format!("amount {} not representable", amount)))
}

/// Amount in kobo, the minor unit Paystack expects.
pub(crate) fn kobo_amount(amount: Decimal) -> Result<i64, FailureReason> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| FailureReason::UpstreamError(format!("amount {} not representable", amount)))
}

/// International form of a national number: `08031234567` -> `+2348031234567`.
pub(crate) fn international_msisdn(phone: &str) -> String {
    if let Some(rest) = phone.strip_prefix('0') {
        format!("+234{}", rest)
    } else if phone.starts_with('+') {
        phone.to_string()
    } else {
        format!("+234{}", phone)
    }
}
