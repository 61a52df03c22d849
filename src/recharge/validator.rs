use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use tracing::warn;

use super::types::{Network, RechargeRequest, RechargeSubmission, ServiceType};
use crate::logging::mask_phone;

/// Rejection raised before any provider is contacted. Fatal to the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("Valid recharge type is required (airtime or data), got '{0}'")]
    InvalidServiceType(String),
    #[error("Unsupported network '{0}': expected one of MTN, Airtel, Glo, 9mobile")]
    UnsupportedNetwork(String),
    #[error("'{0}' is not a valid Nigerian mobile number")]
    InvalidPhoneNumber(String),
    #[error("Amount must be between ₦{min} and ₦{max}, got ₦{amount}")]
    AmountOutOfRange {
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("Data plan is required for data purchases")]
    MissingDataPlan,
}

impl ValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::InvalidServiceType(_) => "type",
            ValidationError::UnsupportedNetwork(_) => "network",
            ValidationError::InvalidPhoneNumber(_) => "phoneNumber",
            ValidationError::AmountOutOfRange { .. } => "amount",
            ValidationError::MissingDataPlan => "dataPlanCode",
        }
    }
}

/// 11-digit national format on the 070/071/080/081/090/091 operator ranges.
fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0[789][01]\d{8}$").expect("phone pattern is valid"))
}

pub fn is_valid_nigerian_phone(phone: &str) -> bool {
    phone_pattern().is_match(phone)
}

/// Canonical form of a data plan code: trimmed, upper-case.
pub fn normalize_plan_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Enforces the recharge domain rules. First failing rule wins:
/// service type, network, phone number, amount bounds, data plan.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    min_amount: Decimal,
    max_amount: Decimal,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(Decimal::from(50), Decimal::from(50_000))
    }
}

impl RequestValidator {
    pub fn new(min_amount: Decimal, max_amount: Decimal) -> Self {
        Self {
            min_amount,
            max_amount,
        }
    }

    pub fn min_amount(&self) -> Decimal {
        self.min_amount
    }

    pub fn max_amount(&self) -> Decimal {
        self.max_amount
    }

    /// Parse and validate untrusted input into a [`RechargeRequest`].
    pub fn validate(
        &self,
        submission: &RechargeSubmission,
    ) -> Result<RechargeRequest, ValidationError> {
        let result = self.build(submission);
        if let Err(e) = &result {
            warn!(
                field = e.field(),
                phone = %mask_phone(submission.phone_number.as_deref().unwrap_or_default()),
                error = %e,
                "Recharge request rejected"
            );
        }
        result
    }

    fn build(&self, submission: &RechargeSubmission) -> Result<RechargeRequest, ValidationError> {
        let service_type: ServiceType = submission
            .service_type
            .as_deref()
            .ok_or(ValidationError::MissingField("type"))?
            .parse()?;

        let network: Network = submission
            .network
            .as_deref()
            .ok_or(ValidationError::MissingField("network"))?
            .parse()?;

        let phone_number = submission
            .phone_number
            .as_deref()
            .ok_or(ValidationError::MissingField("phoneNumber"))?
            .trim()
            .to_string();
        self.check_phone(&phone_number)?;

        let amount = submission
            .amount
            .ok_or(ValidationError::MissingField("amount"))?;

        let data_plan_code = match service_type {
            ServiceType::Data => submission
                .data_plan_code
                .as_deref()
                .map(normalize_plan_code)
                .filter(|code| !code.is_empty()),
            ServiceType::Airtime => None,
        };

        let request = RechargeRequest {
            service_type,
            network,
            phone_number,
            amount,
            data_plan_code,
            reference: submission
                .reference
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        };

        self.check(&request)?;
        Ok(request)
    }

    /// Rules three to five on an already-typed request.
    pub fn check(&self, request: &RechargeRequest) -> Result<(), ValidationError> {
        self.check_phone(&request.phone_number)?;

        if request.amount < self.min_amount || request.amount > self.max_amount {
            return Err(ValidationError::AmountOutOfRange {
                amount: request.amount,
                min: self.min_amount,
                max: self.max_amount,
            });
        }

        if request.service_type == ServiceType::Data
            && request
                .data_plan_code
                .as_deref()
                .map_or(true, |code| code.trim().is_empty())
        {
            return Err(ValidationError::MissingDataPlan);
        }

        Ok(())
    }

    fn check_phone(&self, phone: &str) -> Result<(), ValidationError> {
        if is_valid_nigerian_phone(phone) {
            Ok(())
        } else {
            Err(ValidationError::InvalidPhoneNumber(phone.to_string()))
        }
    }
}
